use alloy_primitives::B256;
use serde::{Deserialize, Serialize};
use ssz_derive::{Decode, Encode};
use ssz_types::{
    VariableList,
    serde_utils::quoted_u64_var_list,
    typenum::{U8192, U65536, U1099511627776},
};
use tree_hash_derive::TreeHash;

use crate::{
    beacon_block_header::BeaconBlockHeader,
    chain_spec::ChainSpec,
    constants::{GENESIS_EPOCH, GENESIS_SLOT},
    eth_1_data::Eth1Data,
    execution_payload_header::ExecutionPayloadHeader,
    fork::Fork,
    validator::Validator,
};

/// The full consensus state of the chain. Ring buffers are sized at genesis
/// from the chain spec; the type-level bounds are SSZ capacity limits only.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize, Encode, Decode, TreeHash)]
pub struct BeaconState {
    // Versioning
    pub genesis_validators_root: B256,
    #[serde(with = "serde_utils::quoted_u64")]
    pub slot: u64,
    pub fork: Fork,

    // History
    pub latest_block_header: BeaconBlockHeader,
    pub block_roots: VariableList<B256, U8192>,
    pub state_roots: VariableList<B256, U8192>,

    // Eth1
    pub eth1_data: Eth1Data,
    #[serde(with = "serde_utils::quoted_u64")]
    pub eth1_deposit_index: u64,
    pub latest_execution_payload_header: ExecutionPayloadHeader,

    // Registry
    pub validators: VariableList<Validator, U1099511627776>,
    #[serde(with = "quoted_u64_var_list")]
    pub balances: VariableList<u64, U1099511627776>,

    // Randomness
    pub randao_mixes: VariableList<B256, U65536>,

    // Withdrawals
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_withdrawal_index: u64,
    #[serde(with = "serde_utils::quoted_u64")]
    pub next_withdrawal_validator_index: u64,

    // Slashings
    #[serde(with = "quoted_u64_var_list")]
    pub slashings: VariableList<u64, U8192>,
    #[serde(with = "serde_utils::quoted_u64")]
    pub total_slashing: u64,
}

impl BeaconState {
    /// An empty genesis state with ring buffers sized from ``spec``. Actual
    /// genesis construction (initial deposits, execution payload header of
    /// the genesis execution block) happens outside the transition core.
    pub fn default_genesis(spec: &ChainSpec) -> Self {
        Self {
            genesis_validators_root: B256::ZERO,
            slot: GENESIS_SLOT,
            fork: Fork {
                previous_version: spec.genesis_fork_version,
                current_version: spec.genesis_fork_version,
                epoch: GENESIS_EPOCH,
            },
            latest_block_header: BeaconBlockHeader::default(),
            block_roots: vec![B256::ZERO; spec.slots_per_historical_root as usize].into(),
            state_roots: vec![B256::ZERO; spec.slots_per_historical_root as usize].into(),
            eth1_data: Eth1Data::default(),
            eth1_deposit_index: 0,
            latest_execution_payload_header: ExecutionPayloadHeader::default(),
            validators: VariableList::default(),
            balances: VariableList::default(),
            randao_mixes: vec![B256::ZERO; spec.epochs_per_historical_vector as usize].into(),
            next_withdrawal_index: 0,
            next_withdrawal_validator_index: 0,
            slashings: vec![0; spec.epochs_per_slashings_vector as usize].into(),
            total_slashing: 0,
        }
    }
}
