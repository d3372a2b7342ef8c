use thiserror::Error;

#[derive(Error, Debug)]
pub enum BLSError {
    #[error("invalid hex string")]
    InvalidHexString,

    #[error("expected {expected} bytes, got {got}")]
    InvalidByteLength { expected: usize, got: usize },

    #[error("malformed public key")]
    InvalidPublicKey,

    #[error("malformed signature")]
    InvalidSignature,

    #[error("backend failure: {0}")]
    Backend(String),
}
