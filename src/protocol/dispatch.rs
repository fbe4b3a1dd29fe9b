use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::channel::{ByteChannel, ChannelError};
use crate::crypto::{KeyGen, Signer};
use crate::presence::UserPresence;
use crate::store::{CredentialStore, Storage};
use super::{
    CommandError,
    frame::{encode_error, encode_response, read_request},
    get_assertion::handle_get_assertion,
    list_credentials::handle_list_credentials,
    make_credential::handle_make_credential,
    reset::handle_reset,
    types::{Command, Request},
};

/// The command processor: one command at a time, each run to completion.
pub struct Authenticator<S, P, K> {
    store: CredentialStore<S>,
    presence: P,
    crypto: K,
    rng: StdRng,
}

impl<S, P, K> Authenticator<S, P, K>
where
    S: Storage,
    P: UserPresence,
    K: KeyGen + Signer,
{
    pub fn new(store: CredentialStore<S>, presence: P, crypto: K) -> Self {
        Self {
            store,
            presence,
            crypto,
            rng: StdRng::from_entropy(),
        }
    }

    /// Replace the credential-id source.
    pub fn with_rng(mut self, rng: StdRng) -> Self {
        self.rng = rng;
        self
    }

    pub fn store(&self) -> &CredentialStore<S> {
        &self.store
    }

    /// Serve commands until the channel closes.
    pub async fn run<C: ByteChannel>(&mut self, channel: &mut C) -> Result<(), ChannelError> {
        tracing::info!("Command loop running");
        loop {
            match self.process_command(channel).await {
                Ok(()) => {}
                Err(ChannelError::Closed) => {
                    tracing::info!("Command loop exiting (channel closed)");
                    return Ok(());
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Idle -> read opcode -> read arguments -> handle -> respond.
    pub async fn process_command<C: ByteChannel>(
        &mut self,
        channel: &mut C,
    ) -> Result<(), ChannelError> {
        let opcode = channel.recv_byte().await?;

        let Some(command) = Command::from_opcode(opcode) else {
            tracing::warn!(opcode, "Unknown command");
            return respond(channel, Err(CommandError::Unknown(opcode))).await;
        };

        let request = match read_request(channel, command).await {
            Ok(request) => request,
            Err(ChannelError::Underrun) => {
                tracing::warn!(?command, "Truncated argument frame");
                return respond(channel, Err(CommandError::BadParameter)).await;
            }
            Err(e) => return Err(e),
        };

        tracing::debug!(?command, "Dispatching");
        let result = self.handle(request).await;
        if let Err(e) = &result {
            tracing::warn!(?command, "Command failed: {e}");
        }
        respond(channel, result).await
    }

    async fn handle(&mut self, request: Request) -> Result<Vec<u8>, CommandError> {
        match request {
            Request::ListCredentials => Ok(handle_list_credentials(&self.store)),
            Request::MakeCredential { application_id } => {
                handle_make_credential(
                    &mut self.store,
                    &mut self.presence,
                    &mut self.crypto,
                    &mut self.rng,
                    application_id,
                )
                .await
            }
            Request::GetAssertion {
                application_id,
                client_data,
            } => {
                handle_get_assertion(
                    &self.store,
                    &mut self.presence,
                    &mut self.crypto,
                    application_id,
                    client_data,
                )
                .await
            }
            Request::Reset => handle_reset(&mut self.store, &mut self.presence).await,
        }
    }
}

async fn respond<C: ByteChannel>(
    channel: &mut C,
    result: Result<Vec<u8>, CommandError>,
) -> Result<(), ChannelError> {
    let response = match result {
        Ok(payload) => encode_response(&payload),
        Err(e) => encode_error(e.status()),
    };
    channel.send(&response).await?;
    channel.flush().await
}
