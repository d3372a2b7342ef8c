use crate::{BLSError, BLSSignature, PubKey};

/// Signature verification seam. The state-transition core only ever verifies;
/// a real pairing backend (or a mock) is plugged in by the caller.
pub trait BlsVerifier {
    /// Verify `signature` over `message` against `pubkey`.
    ///
    /// `Ok(false)` means the signature is well-formed but does not verify;
    /// `Err` means the inputs could not be interpreted at all.
    fn verify(
        &self,
        pubkey: &PubKey,
        message: &[u8],
        signature: &BLSSignature,
    ) -> Result<bool, BLSError>;
}
