use alloy_primitives::B256;
use berith_bls::PubKey;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use tree_hash_derive::TreeHash;

use crate::{
    chain_spec::ChainSpec,
    constants::{ETH1_ADDRESS_WITHDRAWAL_PREFIX, FAR_FUTURE_EPOCH},
    misc::compute_effective_balance,
};

#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct Validator {
    pub pubkey: PubKey,

    /// Commitment to the key that may receive withdrawals
    pub withdrawal_credentials: B256,

    /// Balance at stake, quantized to the spec increment
    #[serde(with = "serde_utils::quoted_u64")]
    pub effective_balance: u64,
    pub slashed: bool,

    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_eligibility_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub activation_epoch: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub exit_epoch: u64,

    /// When the validator can withdraw funds
    #[serde(with = "serde_utils::quoted_u64")]
    pub withdrawable_epoch: u64,
}

impl Validator {
    /// Registry entry for a deposit first seen at ``epoch``. Fresh entries
    /// activate at the following epoch; there is no activation queue.
    pub fn from_deposit(
        pubkey: PubKey,
        withdrawal_credentials: B256,
        amount: u64,
        epoch: u64,
        spec: &ChainSpec,
    ) -> Self {
        Self {
            pubkey,
            withdrawal_credentials,
            effective_balance: compute_effective_balance(
                amount,
                spec.effective_balance_increment,
                spec.max_effective_balance,
            ),
            slashed: false,
            activation_eligibility_epoch: epoch,
            activation_epoch: epoch + 1,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        }
    }

    pub fn is_active_validator(&self, epoch: u64) -> bool {
        self.activation_epoch <= epoch && epoch < self.exit_epoch
    }

    pub fn is_slashable_validator(&self, epoch: u64) -> bool {
        !self.slashed && self.activation_epoch <= epoch && epoch < self.withdrawable_epoch
    }

    /// Check for an 0x01 prefixed "eth1" withdrawal credential.
    pub fn has_eth1_withdrawal_credential(&self) -> bool {
        &self.withdrawal_credentials[..1] == ETH1_ADDRESS_WITHDRAWAL_PREFIX
    }

    pub fn is_fully_withdrawable_validator(&self, balance: u64, epoch: u64) -> bool {
        self.has_eth1_withdrawal_credential() && self.withdrawable_epoch <= epoch && balance > 0
    }

    pub fn is_partially_withdrawable_validator(&self, balance: u64, max_effective_balance: u64) -> bool {
        self.has_eth1_withdrawal_credential()
            && self.effective_balance == max_effective_balance
            && balance > max_effective_balance
    }
}
