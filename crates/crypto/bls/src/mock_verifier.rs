use crate::{BLSError, BLSSignature, PubKey, traits::BlsVerifier};

/// Verifier that returns a fixed verdict for every signature.
#[derive(Debug, Clone, Copy)]
pub struct MockVerifier {
    pub valid: bool,
}

impl Default for MockVerifier {
    fn default() -> Self {
        Self { valid: true }
    }
}

impl BlsVerifier for MockVerifier {
    fn verify(
        &self,
        _pubkey: &PubKey,
        _message: &[u8],
        _signature: &BLSSignature,
    ) -> Result<bool, BLSError> {
        Ok(self.valid)
    }
}
