use alloy_primitives::Address;

/// Per-transition inputs handed down from the consensus driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct Context {
    /// Address the consensus engine announced as the block proposer.
    pub proposer_address: Address,
    /// Skip the final state-root comparison, e.g. while building a block
    /// whose state root is not known yet.
    pub skip_validate_result: bool,
    /// Skip RANDAO reveal signature verification, e.g. when replaying
    /// already-finalized blocks.
    pub skip_validate_randao: bool,
}
