#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Channel: {0}")]
    Channel(#[from] crate::channel::ChannelError),
    #[error("Command: {0}")]
    Command(#[from] crate::protocol::CommandError),
    #[error("Crypto: {0}")]
    Crypto(#[from] crate::crypto::CryptoError),
    #[error("Store: {0}")]
    Store(#[from] crate::store::StoreError),
    #[error("Client: {0}")]
    Client(#[from] crate::client::ClientError),
    #[error("Relying party: {0}")]
    Web(#[from] crate::client::WebError),
    #[error("I/O: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
