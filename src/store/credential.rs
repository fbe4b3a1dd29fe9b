use crate::crypto::{PRIVATE_KEY_SIZE, PrivateKey};

pub const APPLICATION_ID_SIZE: usize = 20;
pub const CREDENTIAL_ID_SIZE: usize = 16;
pub const RECORD_SIZE: usize = APPLICATION_ID_SIZE + CREDENTIAL_ID_SIZE + PRIVATE_KEY_SIZE;

pub type ApplicationId = [u8; APPLICATION_ID_SIZE];
pub type CredentialId = [u8; CREDENTIAL_ID_SIZE];

const CREDENTIAL_ID_OFFSET: usize = APPLICATION_ID_SIZE;
const PRIVATE_KEY_OFFSET: usize = CREDENTIAL_ID_OFFSET + CREDENTIAL_ID_SIZE;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credential {
    pub application_id: ApplicationId,
    pub credential_id:  CredentialId,
    pub private_key:    PrivateKey,
}

impl Credential {
    /// On-medium layout: `application_id | credential_id | private_key`.
    pub fn to_bytes(&self) -> [u8; RECORD_SIZE] {
        let mut out = [0u8; RECORD_SIZE];
        out[..CREDENTIAL_ID_OFFSET].copy_from_slice(&self.application_id);
        out[CREDENTIAL_ID_OFFSET..PRIVATE_KEY_OFFSET].copy_from_slice(&self.credential_id);
        out[PRIVATE_KEY_OFFSET..].copy_from_slice(&self.private_key.0);
        out
    }

    pub fn from_bytes(bytes: &[u8; RECORD_SIZE]) -> Self {
        let mut application_id = [0u8; APPLICATION_ID_SIZE];
        let mut credential_id = [0u8; CREDENTIAL_ID_SIZE];
        let mut private_key = [0u8; PRIVATE_KEY_SIZE];
        application_id.copy_from_slice(&bytes[..CREDENTIAL_ID_OFFSET]);
        credential_id.copy_from_slice(&bytes[CREDENTIAL_ID_OFFSET..PRIVATE_KEY_OFFSET]);
        private_key.copy_from_slice(&bytes[PRIVATE_KEY_OFFSET..]);
        Self {
            application_id,
            credential_id,
            private_key: PrivateKey(private_key),
        }
    }
}
