pub mod secp160r1;

pub use secp160r1::Secp160r1;

pub const PRIVATE_KEY_SIZE: usize = 21;
pub const PUBLIC_KEY_SIZE: usize = 40;
pub const SIGNATURE_SIZE: usize = 40;

#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    #[error("key generation failed: {0}")]
    KeyGen(String),
    #[error("signing failed: {0}")]
    Sign(String),
    #[error("invalid private key")]
    InvalidKey,
}

/// Secret scalar. Never leaves the device except into a `Signer` call.
#[derive(Clone, PartialEq, Eq)]
pub struct PrivateKey(pub [u8; PRIVATE_KEY_SIZE]);

impl std::fmt::Debug for PrivateKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("PrivateKey(<redacted>)")
    }
}

/// Uncompressed point without the SEC1 prefix: `x || y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicKey(pub [u8; PUBLIC_KEY_SIZE]);

/// Raw `r || s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Signature(pub [u8; SIGNATURE_SIZE]);

pub trait KeyGen {
    fn generate_keypair(&mut self) -> Result<(PublicKey, PrivateKey), CryptoError>;
}

pub trait Signer {
    fn sign(&mut self, key: &PrivateKey, message: &[u8]) -> Result<Signature, CryptoError>;
}
