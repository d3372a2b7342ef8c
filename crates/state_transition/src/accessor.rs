use alloy_primitives::B256;
use berith_bls::PubKey;
use berith_consensus::{
    beacon_block_header::BeaconBlockHeader, beacon_state::BeaconState,
    execution_payload_header::ExecutionPayloadHeader, fork::Fork, validator::Validator,
};
use thiserror::Error;
use tree_hash::TreeHash;

#[derive(Debug, Error)]
pub enum StateAccessError {
    #[error("validator index {index} out of bounds for registry of {total}")]
    ValidatorIndexOutOfBounds { index: u64, total: u64 },

    #[error("no balance at index {index}")]
    BalanceIndexOutOfBounds { index: u64 },

    #[error("no validator registered for pubkey {pubkey}")]
    UnknownValidatorPubkey { pubkey: PubKey },

    #[error("index {index} out of bounds for {ring} ring of {len}")]
    RingIndexOutOfBounds {
        ring: &'static str,
        index: u64,
        len: u64,
    },

    #[error("{list} is at capacity")]
    CapacityExceeded { list: &'static str },

    #[error("store: {0}")]
    Store(#[from] anyhow::Error),
}

/// Typed view over the beacon state. This is the only surface through which
/// the transition pipelines read or mutate state; implementations may sit on
/// a plain in-memory record or write through to a persistent store.
pub trait StateAccessor {
    fn get_slot(&self) -> Result<u64, StateAccessError>;
    fn set_slot(&mut self, slot: u64) -> Result<(), StateAccessError>;

    fn get_fork(&self) -> Result<Fork, StateAccessError>;
    fn get_genesis_validators_root(&self) -> Result<B256, StateAccessError>;

    fn get_latest_block_header(&self) -> Result<BeaconBlockHeader, StateAccessError>;
    fn set_latest_block_header(
        &mut self,
        header: BeaconBlockHeader,
    ) -> Result<(), StateAccessError>;

    fn update_block_root_at_index(
        &mut self,
        index: u64,
        root: B256,
    ) -> Result<(), StateAccessError>;
    fn update_state_root_at_index(
        &mut self,
        index: u64,
        root: B256,
    ) -> Result<(), StateAccessError>;

    fn validator_by_index(&self, index: u64) -> Result<Validator, StateAccessError>;
    fn validator_index_by_pubkey(&self, pubkey: &PubKey) -> Result<u64, StateAccessError>;
    fn update_validator_at_index(
        &mut self,
        index: u64,
        validator: Validator,
    ) -> Result<(), StateAccessError>;
    /// Append a registry entry together with its starting balance, keeping
    /// the validator and balance lists parallel.
    fn add_validator(&mut self, validator: Validator, balance: u64)
    -> Result<(), StateAccessError>;
    fn get_validators(&self) -> Result<Vec<Validator>, StateAccessError>;
    fn get_total_validators(&self) -> Result<u64, StateAccessError>;

    fn get_balance(&self, index: u64) -> Result<u64, StateAccessError>;
    fn increase_balance(&mut self, index: u64, delta: u64) -> Result<(), StateAccessError>;
    /// Decrease with underflow protection.
    fn decrease_balance(&mut self, index: u64, delta: u64) -> Result<(), StateAccessError>;

    fn get_eth1_deposit_index(&self) -> Result<u64, StateAccessError>;
    fn set_eth1_deposit_index(&mut self, index: u64) -> Result<(), StateAccessError>;

    fn get_randao_mix_at_index(&self, index: u64) -> Result<B256, StateAccessError>;
    fn update_randao_mix_at_index(&mut self, index: u64, mix: B256)
    -> Result<(), StateAccessError>;

    fn get_slashing_at_index(&self, index: u64) -> Result<u64, StateAccessError>;
    fn update_slashing_at_index(&mut self, index: u64, value: u64)
    -> Result<(), StateAccessError>;
    fn get_total_slashing(&self) -> Result<u64, StateAccessError>;
    fn set_total_slashing(&mut self, total: u64) -> Result<(), StateAccessError>;

    fn get_latest_execution_payload_header(
        &self,
    ) -> Result<ExecutionPayloadHeader, StateAccessError>;
    fn set_latest_execution_payload_header(
        &mut self,
        header: ExecutionPayloadHeader,
    ) -> Result<(), StateAccessError>;

    fn get_next_withdrawal_index(&self) -> Result<u64, StateAccessError>;
    fn set_next_withdrawal_index(&mut self, index: u64) -> Result<(), StateAccessError>;
    fn get_next_withdrawal_validator_index(&self) -> Result<u64, StateAccessError>;
    fn set_next_withdrawal_validator_index(&mut self, index: u64)
    -> Result<(), StateAccessError>;

    /// Merkleization of the full logical state.
    fn hash_tree_root(&self) -> Result<B256, StateAccessError>;
}

impl StateAccessor for BeaconState {
    fn get_slot(&self) -> Result<u64, StateAccessError> {
        Ok(self.slot)
    }

    fn set_slot(&mut self, slot: u64) -> Result<(), StateAccessError> {
        self.slot = slot;
        Ok(())
    }

    fn get_fork(&self) -> Result<Fork, StateAccessError> {
        Ok(self.fork)
    }

    fn get_genesis_validators_root(&self) -> Result<B256, StateAccessError> {
        Ok(self.genesis_validators_root)
    }

    fn get_latest_block_header(&self) -> Result<BeaconBlockHeader, StateAccessError> {
        Ok(self.latest_block_header.clone())
    }

    fn set_latest_block_header(
        &mut self,
        header: BeaconBlockHeader,
    ) -> Result<(), StateAccessError> {
        self.latest_block_header = header;
        Ok(())
    }

    fn update_block_root_at_index(
        &mut self,
        index: u64,
        root: B256,
    ) -> Result<(), StateAccessError> {
        let len = self.block_roots.len() as u64;
        if index >= len {
            return Err(StateAccessError::RingIndexOutOfBounds {
                ring: "block_roots",
                index,
                len,
            });
        }
        self.block_roots[index as usize] = root;
        Ok(())
    }

    fn update_state_root_at_index(
        &mut self,
        index: u64,
        root: B256,
    ) -> Result<(), StateAccessError> {
        let len = self.state_roots.len() as u64;
        if index >= len {
            return Err(StateAccessError::RingIndexOutOfBounds {
                ring: "state_roots",
                index,
                len,
            });
        }
        self.state_roots[index as usize] = root;
        Ok(())
    }

    fn validator_by_index(&self, index: u64) -> Result<Validator, StateAccessError> {
        self.validators
            .get(index as usize)
            .cloned()
            .ok_or(StateAccessError::ValidatorIndexOutOfBounds {
                index,
                total: self.validators.len() as u64,
            })
    }

    fn validator_index_by_pubkey(&self, pubkey: &PubKey) -> Result<u64, StateAccessError> {
        self.validators
            .iter()
            .position(|validator| &validator.pubkey == pubkey)
            .map(|index| index as u64)
            .ok_or_else(|| StateAccessError::UnknownValidatorPubkey {
                pubkey: pubkey.clone(),
            })
    }

    fn update_validator_at_index(
        &mut self,
        index: u64,
        validator: Validator,
    ) -> Result<(), StateAccessError> {
        let total = self.validators.len() as u64;
        match self.validators.get_mut(index as usize) {
            Some(entry) => {
                *entry = validator;
                Ok(())
            }
            None => Err(StateAccessError::ValidatorIndexOutOfBounds { index, total }),
        }
    }

    fn add_validator(
        &mut self,
        validator: Validator,
        balance: u64,
    ) -> Result<(), StateAccessError> {
        self.validators
            .push(validator)
            .map_err(|_| StateAccessError::CapacityExceeded { list: "validators" })?;
        self.balances
            .push(balance)
            .map_err(|_| StateAccessError::CapacityExceeded { list: "balances" })?;
        Ok(())
    }

    fn get_validators(&self) -> Result<Vec<Validator>, StateAccessError> {
        Ok(self.validators.to_vec())
    }

    fn get_total_validators(&self) -> Result<u64, StateAccessError> {
        Ok(self.validators.len() as u64)
    }

    fn get_balance(&self, index: u64) -> Result<u64, StateAccessError> {
        self.balances
            .get(index as usize)
            .copied()
            .ok_or(StateAccessError::BalanceIndexOutOfBounds { index })
    }

    fn increase_balance(&mut self, index: u64, delta: u64) -> Result<(), StateAccessError> {
        match self.balances.get_mut(index as usize) {
            Some(balance) => {
                *balance = balance.saturating_add(delta);
                Ok(())
            }
            None => Err(StateAccessError::BalanceIndexOutOfBounds { index }),
        }
    }

    fn decrease_balance(&mut self, index: u64, delta: u64) -> Result<(), StateAccessError> {
        match self.balances.get_mut(index as usize) {
            Some(balance) => {
                *balance = balance.saturating_sub(delta);
                Ok(())
            }
            None => Err(StateAccessError::BalanceIndexOutOfBounds { index }),
        }
    }

    fn get_eth1_deposit_index(&self) -> Result<u64, StateAccessError> {
        Ok(self.eth1_deposit_index)
    }

    fn set_eth1_deposit_index(&mut self, index: u64) -> Result<(), StateAccessError> {
        self.eth1_deposit_index = index;
        Ok(())
    }

    fn get_randao_mix_at_index(&self, index: u64) -> Result<B256, StateAccessError> {
        self.randao_mixes.get(index as usize).copied().ok_or(
            StateAccessError::RingIndexOutOfBounds {
                ring: "randao_mixes",
                index,
                len: self.randao_mixes.len() as u64,
            },
        )
    }

    fn update_randao_mix_at_index(
        &mut self,
        index: u64,
        mix: B256,
    ) -> Result<(), StateAccessError> {
        let len = self.randao_mixes.len() as u64;
        if index >= len {
            return Err(StateAccessError::RingIndexOutOfBounds {
                ring: "randao_mixes",
                index,
                len,
            });
        }
        self.randao_mixes[index as usize] = mix;
        Ok(())
    }

    fn get_slashing_at_index(&self, index: u64) -> Result<u64, StateAccessError> {
        self.slashings.get(index as usize).copied().ok_or(
            StateAccessError::RingIndexOutOfBounds {
                ring: "slashings",
                index,
                len: self.slashings.len() as u64,
            },
        )
    }

    fn update_slashing_at_index(
        &mut self,
        index: u64,
        value: u64,
    ) -> Result<(), StateAccessError> {
        let len = self.slashings.len() as u64;
        if index >= len {
            return Err(StateAccessError::RingIndexOutOfBounds {
                ring: "slashings",
                index,
                len,
            });
        }
        self.slashings[index as usize] = value;
        Ok(())
    }

    fn get_total_slashing(&self) -> Result<u64, StateAccessError> {
        Ok(self.total_slashing)
    }

    fn set_total_slashing(&mut self, total: u64) -> Result<(), StateAccessError> {
        self.total_slashing = total;
        Ok(())
    }

    fn get_latest_execution_payload_header(
        &self,
    ) -> Result<ExecutionPayloadHeader, StateAccessError> {
        Ok(self.latest_execution_payload_header.clone())
    }

    fn set_latest_execution_payload_header(
        &mut self,
        header: ExecutionPayloadHeader,
    ) -> Result<(), StateAccessError> {
        self.latest_execution_payload_header = header;
        Ok(())
    }

    fn get_next_withdrawal_index(&self) -> Result<u64, StateAccessError> {
        Ok(self.next_withdrawal_index)
    }

    fn set_next_withdrawal_index(&mut self, index: u64) -> Result<(), StateAccessError> {
        self.next_withdrawal_index = index;
        Ok(())
    }

    fn get_next_withdrawal_validator_index(&self) -> Result<u64, StateAccessError> {
        Ok(self.next_withdrawal_validator_index)
    }

    fn set_next_withdrawal_validator_index(
        &mut self,
        index: u64,
    ) -> Result<(), StateAccessError> {
        self.next_withdrawal_validator_index = index;
        Ok(())
    }

    fn hash_tree_root(&self) -> Result<B256, StateAccessError> {
        Ok(self.tree_hash_root())
    }
}
