use alloy_primitives::{aliases::B32, fixed_bytes};
use serde::{Deserialize, Serialize};

/// Eth1 chain id of the main network.
pub const MAINNET_ETH1_CHAIN_ID: u64 = 4801;
/// Eth1 chain id of the onyx testnet, the first public network. Onyx never
/// activated the fork that removed the legacy rewards/penalties pass.
pub const ONYX_ETH1_CHAIN_ID: u64 = 48101;
/// Eth1 chain id of the garnet testnet.
pub const GARNET_ETH1_CHAIN_ID: u64 = 48201;

/// Garnet slot at which the stored eth1 deposit index was off by one and is
/// corrected during slot catch-up.
pub const GARNET_FORK2_HEIGHT: u64 = 1_236_940;
/// Garnet slot from which the legacy rewards/penalties pass is no longer run.
pub const GARNET_FORK3_HEIGHT: u64 = 1_823_700;

/// Runtime chain parameters read by the state transition. One instance per
/// network; everything here is immutable after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainSpec {
    pub slots_per_epoch: u64,
    pub slots_per_historical_root: u64,
    pub epochs_per_historical_vector: u64,
    pub epochs_per_slashings_vector: u64,

    /*
     * Gwei values and hysteresis
     */
    pub effective_balance_increment: u64,
    pub max_effective_balance: u64,
    pub hysteresis_quotient: u64,
    pub hysteresis_downward_multiplier: u64,
    pub hysteresis_upward_multiplier: u64,

    /*
     * Block limits
     */
    pub max_deposits_per_block: u64,
    pub max_withdrawals_per_payload: u64,
    pub max_validators_per_withdrawals_sweep: u64,

    /*
     * Validator lifecycle
     */
    pub min_validator_withdrawability_delay: u64,
    pub min_slashing_penalty_quotient: u64,

    pub deposit_eth1_chain_id: u64,
    pub genesis_fork_version: B32,
}

impl ChainSpec {
    pub fn mainnet() -> Self {
        Self {
            slots_per_epoch: 32,
            slots_per_historical_root: 8192,
            epochs_per_historical_vector: 65536,
            epochs_per_slashings_vector: 8192,
            effective_balance_increment: 1_000_000_000,
            max_effective_balance: 32_000_000_000,
            hysteresis_quotient: 4,
            hysteresis_downward_multiplier: 1,
            hysteresis_upward_multiplier: 5,
            max_deposits_per_block: 16,
            max_withdrawals_per_payload: 16,
            max_validators_per_withdrawals_sweep: 16384,
            min_validator_withdrawability_delay: 256,
            min_slashing_penalty_quotient: 32,
            deposit_eth1_chain_id: MAINNET_ETH1_CHAIN_ID,
            genesis_fork_version: fixed_bytes!("0x04000000"),
        }
    }

    pub fn onyx() -> Self {
        Self {
            deposit_eth1_chain_id: ONYX_ETH1_CHAIN_ID,
            genesis_fork_version: fixed_bytes!("0x04000001"),
            ..Self::mainnet()
        }
    }

    pub fn garnet() -> Self {
        Self {
            deposit_eth1_chain_id: GARNET_ETH1_CHAIN_ID,
            genesis_fork_version: fixed_bytes!("0x04000002"),
            ..Self::mainnet()
        }
    }

    /// Small rings for tests: eight-slot epochs and eight-entry history.
    pub fn minimal() -> Self {
        Self {
            slots_per_epoch: 8,
            slots_per_historical_root: 8,
            epochs_per_historical_vector: 8,
            epochs_per_slashings_vector: 8,
            max_validators_per_withdrawals_sweep: 16,
            ..Self::mainnet()
        }
    }

    pub fn slot_to_epoch(&self, slot: u64) -> u64 {
        slot / self.slots_per_epoch
    }

    pub fn epoch_start_slot(&self, epoch: u64) -> u64 {
        epoch * self.slots_per_epoch
    }

    /// True when `slot` is the last slot of its epoch, i.e. epoch processing
    /// runs after the slot's roots are recorded and before the slot advances.
    pub fn is_epoch_boundary(&self, slot: u64) -> bool {
        (slot + 1) % self.slots_per_epoch == 0
    }

    pub fn hysteresis_downward_threshold(&self) -> u64 {
        self.effective_balance_increment / self.hysteresis_quotient
            * self.hysteresis_downward_multiplier
    }

    pub fn hysteresis_upward_threshold(&self) -> u64 {
        self.effective_balance_increment / self.hysteresis_quotient
            * self.hysteresis_upward_multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slot_to_epoch_rounds_down() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.slot_to_epoch(0), 0);
        assert_eq!(spec.slot_to_epoch(31), 0);
        assert_eq!(spec.slot_to_epoch(32), 1);
        assert_eq!(spec.epoch_start_slot(2), 64);
    }

    #[test]
    fn epoch_boundary_is_last_slot_of_epoch() {
        let spec = ChainSpec::minimal();
        assert!(spec.is_epoch_boundary(7));
        assert!(spec.is_epoch_boundary(15));
        assert!(!spec.is_epoch_boundary(8));
    }

    #[test]
    fn mainnet_hysteresis_thresholds() {
        let spec = ChainSpec::mainnet();
        assert_eq!(spec.hysteresis_downward_threshold(), 250_000_000);
        assert_eq!(spec.hysteresis_upward_threshold(), 1_250_000_000);
    }
}
