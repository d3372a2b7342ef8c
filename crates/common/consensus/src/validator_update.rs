use berith_bls::PubKey;
use serde::{Deserialize, Serialize};

/// One entry of the validator-set diff handed back to the consensus driver.
/// An ``effective_balance`` of zero removes the validator from the set.
#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct ValidatorUpdate {
    pub pubkey: PubKey,
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
}

pub type ValidatorUpdates = Vec<ValidatorUpdate>;
