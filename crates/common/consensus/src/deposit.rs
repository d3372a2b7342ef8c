use alloy_primitives::B256;
use berith_bls::{BLSSignature, PubKey};
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

/// One deposit-contract log entry. Deposits arrive pre-proven by the deposit
/// indexer, so the record carries the contract's running index instead of a
/// Merkle branch.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Deposit {
    pub pubkey: PubKey,
    pub credentials: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub amount: u64,
    pub signature: BLSSignature,
    #[serde(with = "serde_utils::quoted_u64")]
    pub index: u64,
}
