//! Host side of the serial protocol.

pub mod web;

pub use web::{RelyingParty, WebError};

use sha1::{Digest, Sha1};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::crypto::{PUBLIC_KEY_SIZE, PublicKey, SIGNATURE_SIZE, Signature};
use crate::protocol::Status;
use crate::protocol::types::{
    CMD_GET_ASSERTION, CMD_LIST_CREDENTIALS, CMD_MAKE_CREDENTIAL, CMD_RESET, ClientData,
};
use crate::store::{APPLICATION_ID_SIZE, ApplicationId, CREDENTIAL_ID_SIZE, CredentialId};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("device returned {0:?}")]
    Device(Status),
    #[error("device returned unknown status {0:#04x}")]
    UnknownStatus(u8),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

/// SHA-1 of the application name, as sent on the wire.
pub fn application_id(app: &str) -> ApplicationId {
    Sha1::digest(app.as_bytes()).into()
}

pub fn client_data_hash(challenge: &str, app: &str) -> ClientData {
    Sha1::digest(format!("challenge={challenge}&app_id={app}").as_bytes()).into()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MadeCredential {
    pub credential_id: CredentialId,
    pub public_key: PublicKey,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Assertion {
    pub credential_id: CredentialId,
    pub signature: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListedCredential {
    pub credential_id: CredentialId,
    pub application_id: ApplicationId,
}

pub struct Client<T> {
    io: T,
}

impl<T: AsyncRead + AsyncWrite + Unpin> Client<T> {
    pub fn new(io: T) -> Self {
        Self { io }
    }

    async fn request(&mut self, frame: &[u8]) -> Result<(), ClientError> {
        self.io.write_all(frame).await?;
        self.io.flush().await?;
        let status = self.io.read_u8().await?;
        match Status::try_from(status) {
            Ok(Status::Ok) => Ok(()),
            Ok(status) => Err(ClientError::Device(status)),
            Err(byte) => Err(ClientError::UnknownStatus(byte)),
        }
    }

    async fn read_array<const N: usize>(&mut self) -> Result<[u8; N], ClientError> {
        let mut buf = [0u8; N];
        self.io.read_exact(&mut buf).await?;
        Ok(buf)
    }

    pub async fn reset(&mut self) -> Result<(), ClientError> {
        self.request(&[CMD_RESET]).await
    }

    pub async fn make_credential(
        &mut self,
        application_id: &ApplicationId,
    ) -> Result<MadeCredential, ClientError> {
        let mut frame = Vec::with_capacity(1 + APPLICATION_ID_SIZE);
        frame.push(CMD_MAKE_CREDENTIAL);
        frame.extend_from_slice(application_id);
        self.request(&frame).await?;

        let credential_id = self.read_array::<CREDENTIAL_ID_SIZE>().await?;
        let public_key = PublicKey(self.read_array::<PUBLIC_KEY_SIZE>().await?);
        Ok(MadeCredential {
            credential_id,
            public_key,
        })
    }

    pub async fn get_assertion(
        &mut self,
        application_id: &ApplicationId,
        client_data: &ClientData,
    ) -> Result<Assertion, ClientError> {
        let mut frame = Vec::with_capacity(1 + APPLICATION_ID_SIZE + client_data.len());
        frame.push(CMD_GET_ASSERTION);
        frame.extend_from_slice(application_id);
        frame.extend_from_slice(client_data);
        self.request(&frame).await?;

        let credential_id = self.read_array::<CREDENTIAL_ID_SIZE>().await?;
        let signature = Signature(self.read_array::<SIGNATURE_SIZE>().await?);
        Ok(Assertion {
            credential_id,
            signature,
        })
    }

    pub async fn list_credentials(&mut self) -> Result<Vec<ListedCredential>, ClientError> {
        self.request(&[CMD_LIST_CREDENTIALS]).await?;
        let count = self.io.read_u8().await?;
        let mut listed = Vec::with_capacity(count as usize);
        for _ in 0..count {
            let credential_id = self.read_array::<CREDENTIAL_ID_SIZE>().await?;
            let application_id = self.read_array::<APPLICATION_ID_SIZE>().await?;
            listed.push(ListedCredential {
                credential_id,
                application_id,
            });
        }
        Ok(listed)
    }
}
