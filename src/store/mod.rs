pub mod credential;
pub mod index;
pub mod medium;

pub use credential::{
    APPLICATION_ID_SIZE, ApplicationId, CREDENTIAL_ID_SIZE, Credential, CredentialId, RECORD_SIZE,
};
pub use index::CredentialStore;
pub use medium::{FileStorage, MemoryStorage, Storage};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
    #[error("access out of bounds: {len} bytes at {address:#06x}")]
    OutOfBounds { address: usize, len: usize },
    #[error("medium of {0} bytes cannot hold a single record")]
    TooSmall(usize),
    #[error("storage full")]
    Full,
    #[error("power lost during write")]
    PowerLoss,
}
