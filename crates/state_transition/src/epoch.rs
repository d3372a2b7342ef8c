use std::collections::{HashMap, HashSet};

use berith_bls::PubKey;
use berith_consensus::{
    chain_spec::{GARNET_ETH1_CHAIN_ID, GARNET_FORK3_HEIGHT, ONYX_ETH1_CHAIN_ID},
    constants::GENESIS_EPOCH,
    misc::compute_effective_balance,
    validator::Validator,
    validator_update::{ValidatorUpdate, ValidatorUpdates},
};

use crate::{accessor::StateAccessor, errors::StateTransitionError, processor::StateProcessor};

impl<E, D, V> StateProcessor<E, D, V> {
    /// Epoch boundary pipeline. Runs with the slot counter still on the last
    /// slot of the closing epoch.
    pub(crate) fn process_epoch<S: StateAccessor>(
        &self,
        st: &mut S,
    ) -> Result<ValidatorUpdates, StateTransitionError> {
        let slot = st.get_slot()?;

        match self.spec.deposit_eth1_chain_id {
            ONYX_ETH1_CHAIN_ID => self.hollow_process_rewards_and_penalties(st)?,
            // The app hash commits to the sequence of balance operations, so
            // the no-op pass keeps running until the fork that removed it.
            GARNET_ETH1_CHAIN_ID if slot < GARNET_FORK3_HEIGHT => {
                self.hollow_process_rewards_and_penalties(st)?
            }
            _ => {}
        }

        self.process_effective_balance_updates(st)?;
        self.process_slashings_reset(st)?;
        self.process_randao_mixes_reset(st)?;
        let updates = self.process_validators_set_updates(st)?;

        self.metrics.epoch_processed();
        Ok(updates)
    }

    /// Rewards and penalties are always zero at this stage of the protocol;
    /// legacy chains still observe one increase/decrease pair per validator.
    fn hollow_process_rewards_and_penalties<S: StateAccessor>(
        &self,
        st: &mut S,
    ) -> Result<(), StateTransitionError> {
        let slot = st.get_slot()?;
        if self.spec.slot_to_epoch(slot) == GENESIS_EPOCH {
            return Ok(());
        }

        let total = st.get_total_validators()?;
        for index in 0..total {
            st.increase_balance(index, 0)?;
            st.decrease_balance(index, 0)?;
        }

        Ok(())
    }

    /// Update effective balances with hysteresis. Thresholds are strict:
    /// exact equality leaves the validator untouched.
    fn process_effective_balance_updates<S: StateAccessor>(
        &self,
        st: &mut S,
    ) -> Result<(), StateTransitionError> {
        let downward_threshold = self.spec.hysteresis_downward_threshold();
        let upward_threshold = self.spec.hysteresis_upward_threshold();

        let total = st.get_total_validators()?;
        for index in 0..total {
            let mut validator = st.validator_by_index(index)?;
            let balance = st.get_balance(index)?;

            if balance + downward_threshold < validator.effective_balance
                || validator.effective_balance + upward_threshold < balance
            {
                validator.effective_balance = compute_effective_balance(
                    balance,
                    self.spec.effective_balance_increment,
                    self.spec.max_effective_balance,
                );
                st.update_validator_at_index(index, validator)?;
            }
        }

        Ok(())
    }

    fn process_slashings_reset<S: StateAccessor>(
        &self,
        st: &mut S,
    ) -> Result<(), StateTransitionError> {
        let next_epoch = self.spec.slot_to_epoch(st.get_slot()?) + 1;
        st.update_slashing_at_index(next_epoch % self.spec.epochs_per_slashings_vector, 0)?;
        Ok(())
    }

    /// Carry the closing epoch's mix forward as the seed of the next epoch.
    fn process_randao_mixes_reset<S: StateAccessor>(
        &self,
        st: &mut S,
    ) -> Result<(), StateTransitionError> {
        let epoch = self.spec.slot_to_epoch(st.get_slot()?);
        let vector = self.spec.epochs_per_historical_vector;

        let mix = st.get_randao_mix_at_index(epoch % vector)?;
        st.update_randao_mix_at_index((epoch + 1) % vector, mix)?;
        Ok(())
    }

    /// Diff the active validator set against the previous epoch's snapshot
    /// and install the new snapshot. The snapshot is built under a read
    /// borrow of the state; the write lock is held only for the map update.
    pub(crate) fn process_validators_set_updates<S: StateAccessor>(
        &self,
        st: &mut S,
    ) -> Result<ValidatorUpdates, StateTransitionError> {
        let epoch = self.spec.slot_to_epoch(st.get_slot()?);

        let current: Vec<Validator> = st
            .get_validators()?
            .into_iter()
            .filter(|validator| validator.is_active_validator(epoch))
            .collect();

        let previous = match epoch.checked_sub(1) {
            Some(prev_epoch) => self
                .val_set_by_epoch
                .read()
                .get(&prev_epoch)
                .cloned()
                .unwrap_or_default(),
            None => Vec::new(),
        };

        let updates = diff_validator_sets(&previous, &current);

        let mut sets = self.val_set_by_epoch.write();
        sets.insert(epoch, current);
        sets.retain(|&cached, _| cached + 1 >= epoch);

        Ok(updates)
    }
}

/// One update per validator that joined, left, or changed voting weight.
/// Departures are encoded as a zero effective balance.
fn diff_validator_sets(previous: &[Validator], current: &[Validator]) -> ValidatorUpdates {
    let mut updates = ValidatorUpdates::new();

    let previous_weights: HashMap<&PubKey, u64> = previous
        .iter()
        .map(|validator| (&validator.pubkey, validator.effective_balance))
        .collect();

    for validator in current {
        match previous_weights.get(&validator.pubkey) {
            Some(&weight) if weight == validator.effective_balance => {}
            _ => updates.push(ValidatorUpdate {
                pubkey: validator.pubkey.clone(),
                effective_balance: validator.effective_balance,
            }),
        }
    }

    let current_keys: HashSet<&PubKey> = current
        .iter()
        .map(|validator| &validator.pubkey)
        .collect();
    for validator in previous {
        if !current_keys.contains(&validator.pubkey) {
            updates.push(ValidatorUpdate {
                pubkey: validator.pubkey.clone(),
                effective_balance: 0,
            });
        }
    }

    updates
}
