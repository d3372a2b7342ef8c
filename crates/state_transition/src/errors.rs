use alloy_primitives::{Address, B256};
use berith_bls::BLSError;
use thiserror::Error;

use crate::accessor::StateAccessError;

/// Terminal rejection of a block against a state. Nothing here is recovered
/// internally; callers discard the partially mutated state.
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error(transparent)]
    StateAccess(#[from] StateAccessError),

    #[error("bls: {0}")]
    Bls(#[from] BLSError),

    #[error("block slot mismatch: expected {expected}, got {got}")]
    SlotMismatch { expected: u64, got: u64 },

    #[error("block slot too low: expected greater than {latest}, got {got}")]
    BlockSlotTooLow { latest: u64, got: u64 },

    #[error("proposer mismatch: store key {state_address}, consensus key {consensus_address}")]
    ProposerMismatch {
        state_address: Address,
        consensus_address: Address,
    },

    #[error("slashed proposer: index {index}")]
    SlashedProposer { index: u64 },

    #[error("parent root mismatch: expected {expected}, got {got}")]
    ParentRootMismatch { expected: B256, got: B256 },

    #[error("state root mismatch: expected {expected}, got {got}")]
    StateRootMismatch { expected: B256, got: B256 },

    #[error("execution payload rejected: {reason}")]
    ExecutionPayloadRejected { reason: String },

    #[error("invalid withdrawal: {reason}")]
    InvalidWithdrawal { reason: String },

    #[error("invalid randao reveal from proposer {proposer_index}")]
    InvalidRandaoReveal { proposer_index: u64 },

    #[error("invalid operation: {reason}")]
    InvalidOperation { reason: String },
}
