pub mod errors;
pub mod mock_verifier;
pub mod pubkey;
pub mod signature;
pub mod traits;

pub use errors::BLSError;
pub use pubkey::PubKey;
pub use signature::BLSSignature;
