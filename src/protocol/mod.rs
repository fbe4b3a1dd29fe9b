pub mod dispatch;
pub mod frame;
pub mod types;

pub(crate) mod get_assertion;
pub(crate) mod list_credentials;
pub(crate) mod make_credential;
pub(crate) mod reset;

pub use dispatch::Authenticator;
pub use types::{Command, Request, Status};

use crate::crypto::CryptoError;
use crate::store::StoreError;

/// Why a command did not produce an OK response.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("unknown command {0:#04x}")]
    Unknown(u8),
    #[error("truncated argument frame")]
    BadParameter,
    #[error("user presence not confirmed")]
    Approval,
    #[error("no credential for application")]
    NotFound,
    #[error("crypto: {0}")]
    Crypto(#[from] CryptoError),
    #[error("store: {0}")]
    Store(#[from] StoreError),
}

impl CommandError {
    pub fn status(&self) -> Status {
        match self {
            Self::Unknown(_)   => Status::CommandUnknown,
            Self::BadParameter => Status::BadParameter,
            Self::Approval     => Status::Approval,
            Self::NotFound     => Status::NotFound,
            Self::Crypto(_)    => Status::CryptoFailed,
            // The wire has no I/O status; a medium that refuses writes is full
            // as far as the host can tell.
            Self::Store(_)     => Status::StorageFull,
        }
    }
}
