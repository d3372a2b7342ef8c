use alloy_primitives::{Address, B256};
use berith_bls::traits::BlsVerifier;
use berith_consensus::{
    beacon_block::BeaconBlock,
    beacon_block_header::BeaconBlockHeader,
    constants::{DOMAIN_RANDAO, FAR_FUTURE_EPOCH},
    deposit::Deposit,
    execution_engine::{engine_trait::ExecutionApi, new_payload_request::NewPayloadRequest},
    execution_payload::ExecutionPayload,
    misc::{compute_domain, compute_signing_root, xor},
    proposer_slashing::ProposerSlashing,
    validator::Validator,
    voluntary_exit::SignedVoluntaryExit,
    withdrawal::Withdrawal,
};
use ethereum_hashing::hash;
use tree_hash::TreeHash;

use crate::{
    accessor::{StateAccessError, StateAccessor},
    context::Context,
    deposit_store::DepositStore,
    errors::StateTransitionError,
    processor::StateProcessor,
};

impl<E, D, V> StateProcessor<E, D, V>
where
    E: ExecutionApi,
    D: DepositStore,
    V: BlsVerifier,
{
    /// Apply ``block`` to a state already caught up to the block's slot.
    /// Sub-stages run in a fixed order; the first failure aborts.
    pub(crate) async fn process_block<S: StateAccessor>(
        &self,
        ctx: &Context,
        st: &mut S,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        self.process_block_header(ctx, st, block)?;
        self.process_execution_payload(st, block).await?;
        self.process_withdrawals(st, &block.body.execution_payload)?;
        self.process_randao_reveal(ctx, st, block)?;
        self.process_operations(st, block)?;

        if ctx.skip_validate_result {
            return Ok(());
        }

        let state_root = st.hash_tree_root()?;
        if block.state_root != state_root {
            return Err(StateTransitionError::StateRootMismatch {
                expected: state_root,
                got: block.state_root,
            });
        }

        Ok(())
    }

    fn process_block_header<S: StateAccessor>(
        &self,
        ctx: &Context,
        st: &mut S,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let slot = st.get_slot()?;
        if block.slot != slot {
            return Err(StateTransitionError::SlotMismatch {
                expected: slot,
                got: block.slot,
            });
        }

        let latest_block_header = st.get_latest_block_header()?;
        if block.slot <= latest_block_header.slot {
            return Err(StateTransitionError::BlockSlotTooLow {
                latest: latest_block_header.slot,
                got: block.slot,
            });
        }

        let proposer = st.validator_by_index(block.proposer_index)?;
        let state_address = (self.address_from_pubkey)(&proposer.pubkey)?;
        if state_address != ctx.proposer_address {
            return Err(StateTransitionError::ProposerMismatch {
                state_address,
                consensus_address: ctx.proposer_address,
            });
        }

        let parent_block_root = latest_block_header.tree_hash_root();
        if parent_block_root != block.parent_block_root {
            return Err(StateTransitionError::ParentRootMismatch {
                expected: parent_block_root,
                got: block.parent_block_root,
            });
        }

        if proposer.slashed {
            return Err(StateTransitionError::SlashedProposer {
                index: block.proposer_index,
            });
        }

        // Cache the block as the new latest header. The state root stays
        // zeroed until the next process_slot back-fills it.
        st.set_latest_block_header(BeaconBlockHeader {
            slot: block.slot,
            proposer_index: block.proposer_index,
            parent_block_root: block.parent_block_root,
            state_root: B256::ZERO,
            body_root: block.body.tree_hash_root(),
        })?;

        Ok(())
    }

    async fn process_execution_payload<S: StateAccessor>(
        &self,
        st: &mut S,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let payload = &block.body.execution_payload;

        let latest_header = st.get_latest_execution_payload_header()?;
        if payload.parent_hash != latest_header.block_hash {
            return Err(StateTransitionError::ExecutionPayloadRejected {
                reason: format!(
                    "parent hash {} does not extend execution head {}",
                    payload.parent_hash, latest_header.block_hash
                ),
            });
        }

        let epoch = self.spec.slot_to_epoch(st.get_slot()?);
        let mix = st.get_randao_mix_at_index(epoch % self.spec.epochs_per_historical_vector)?;
        if payload.prev_randao != mix {
            return Err(StateTransitionError::ExecutionPayloadRejected {
                reason: format!(
                    "prev randao {} does not match mix {mix}",
                    payload.prev_randao
                ),
            });
        }

        let accepted = self
            .execution_engine
            .verify_and_notify_new_payload(NewPayloadRequest {
                execution_payload: payload.clone(),
                parent_beacon_block_root: block.parent_block_root,
            })
            .await
            .map_err(|err| StateTransitionError::ExecutionPayloadRejected {
                reason: err.to_string(),
            })?;
        if !accepted {
            return Err(StateTransitionError::ExecutionPayloadRejected {
                reason: "engine rejected payload".to_string(),
            });
        }

        st.set_latest_execution_payload_header(payload.to_execution_payload_header())?;
        Ok(())
    }

    /// The payload must carry exactly the withdrawals the sweep expects.
    fn process_withdrawals<S: StateAccessor>(
        &self,
        st: &mut S,
        payload: &ExecutionPayload,
    ) -> Result<(), StateTransitionError> {
        let expected = self.expected_withdrawals(st)?;
        if payload.withdrawals.len() != expected.len()
            || payload
                .withdrawals
                .iter()
                .zip(&expected)
                .any(|(carried, wanted)| carried != wanted)
        {
            return Err(StateTransitionError::InvalidWithdrawal {
                reason: format!(
                    "payload carries {} withdrawals, sweep expects {}",
                    payload.withdrawals.len(),
                    expected.len()
                ),
            });
        }

        for withdrawal in &expected {
            st.decrease_balance(withdrawal.validator_index, withdrawal.amount)?;
        }

        let total = st.get_total_validators()?;
        if total == 0 {
            return Ok(());
        }

        if let Some(latest) = expected.last() {
            st.set_next_withdrawal_index(latest.index + 1)?;
        }

        let next_validator_index =
            if expected.len() == self.spec.max_withdrawals_per_payload as usize {
                // Sweep saturated; resume right after the last paid validator.
                let latest = &expected[expected.len() - 1];
                (latest.validator_index + 1) % total
            } else {
                let sweep = self.spec.max_validators_per_withdrawals_sweep.min(total);
                (st.get_next_withdrawal_validator_index()? + sweep) % total
            };
        st.set_next_withdrawal_validator_index(next_validator_index)?;

        Ok(())
    }

    /// The withdrawals the next payload built on ``st`` must carry. Exposed
    /// for block builders.
    pub fn expected_withdrawals<S: StateAccessor>(
        &self,
        st: &S,
    ) -> Result<Vec<Withdrawal>, StateTransitionError> {
        let total = st.get_total_validators()?;
        if total == 0 {
            return Ok(Vec::new());
        }

        let epoch = self.spec.slot_to_epoch(st.get_slot()?);
        let mut withdrawal_index = st.get_next_withdrawal_index()?;
        let mut validator_index = st.get_next_withdrawal_validator_index()?;
        let mut withdrawals: Vec<Withdrawal> = Vec::new();

        let bound = total.min(self.spec.max_validators_per_withdrawals_sweep);
        for _ in 0..bound {
            let validator = st.validator_by_index(validator_index)?;
            let balance = st.get_balance(validator_index)?;

            if validator.is_fully_withdrawable_validator(balance, epoch) {
                withdrawals.push(Withdrawal {
                    index: withdrawal_index,
                    validator_index,
                    address: Address::from_slice(&validator.withdrawal_credentials[12..]),
                    amount: balance,
                });
                withdrawal_index += 1;
            } else if validator
                .is_partially_withdrawable_validator(balance, self.spec.max_effective_balance)
            {
                withdrawals.push(Withdrawal {
                    index: withdrawal_index,
                    validator_index,
                    address: Address::from_slice(&validator.withdrawal_credentials[12..]),
                    amount: balance - self.spec.max_effective_balance,
                });
                withdrawal_index += 1;
            }

            if withdrawals.len() == self.spec.max_withdrawals_per_payload as usize {
                break;
            }
            validator_index = (validator_index + 1) % total;
        }

        Ok(withdrawals)
    }

    fn process_randao_reveal<S: StateAccessor>(
        &self,
        ctx: &Context,
        st: &mut S,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let epoch = self.spec.slot_to_epoch(st.get_slot()?);

        if !ctx.skip_validate_randao {
            let proposer = st.validator_by_index(block.proposer_index)?;
            let fork = st.get_fork()?;
            let domain = compute_domain(
                DOMAIN_RANDAO,
                fork.current_version,
                st.get_genesis_validators_root()?,
            );
            let signing_root = compute_signing_root(&epoch, domain);

            let valid = self.signer.verify(
                &proposer.pubkey,
                signing_root.as_ref(),
                &block.body.randao_reveal,
            )?;
            if !valid {
                return Err(StateTransitionError::InvalidRandaoReveal {
                    proposer_index: block.proposer_index,
                });
            }
        }

        let index = epoch % self.spec.epochs_per_historical_vector;
        let mix = xor(
            st.get_randao_mix_at_index(index)?.as_slice(),
            hash(block.body.randao_reveal.to_bytes()).as_slice(),
        );
        st.update_randao_mix_at_index(index, mix)?;

        Ok(())
    }

    /// Operations arrive pre-validated from the outer queues; the core only
    /// applies their state effects through the accessor.
    fn process_operations<S: StateAccessor>(
        &self,
        st: &mut S,
        block: &BeaconBlock,
    ) -> Result<(), StateTransitionError> {
        let body = &block.body;

        if body.deposits.len() as u64 > self.spec.max_deposits_per_block {
            return Err(StateTransitionError::InvalidOperation {
                reason: format!(
                    "{} deposits exceed the per-block maximum of {}",
                    body.deposits.len(),
                    self.spec.max_deposits_per_block
                ),
            });
        }

        if !body.deposits.is_empty() {
            self.validate_deposits_against_store(st, &body.deposits)?;
        }
        for deposit in body.deposits.iter() {
            self.process_deposit(st, deposit)?;
        }

        for exit in body.voluntary_exits.iter() {
            self.process_voluntary_exit(st, exit)?;
        }

        for slashing in body.proposer_slashings.iter() {
            self.process_proposer_slashing(st, slashing)?;
        }

        Ok(())
    }

    /// Block deposits must replay the indexed contract log verbatim.
    fn validate_deposits_against_store<S: StateAccessor>(
        &self,
        st: &S,
        deposits: &[Deposit],
    ) -> Result<(), StateTransitionError> {
        let start = st.get_eth1_deposit_index()?;
        let local = self
            .deposit_store
            .range(start, deposits.len() as u64)
            .map_err(|err| StateTransitionError::InvalidOperation {
                reason: format!("deposit store: {err}"),
            })?;

        if local.len() != deposits.len() {
            return Err(StateTransitionError::InvalidOperation {
                reason: format!(
                    "deposit store holds {} deposits from index {start}, block carries {}",
                    local.len(),
                    deposits.len()
                ),
            });
        }
        for (stored, carried) in local.iter().zip(deposits) {
            if stored != carried {
                return Err(StateTransitionError::InvalidOperation {
                    reason: format!(
                        "deposit {} does not match the indexed contract log",
                        carried.index
                    ),
                });
            }
        }

        Ok(())
    }

    fn process_deposit<S: StateAccessor>(
        &self,
        st: &mut S,
        deposit: &Deposit,
    ) -> Result<(), StateTransitionError> {
        let index = st.get_eth1_deposit_index()?;
        st.set_eth1_deposit_index(index + 1)?;

        self.apply_deposit(st, deposit)
    }

    /// Top up a known validator, or append a fresh registry entry.
    fn apply_deposit<S: StateAccessor>(
        &self,
        st: &mut S,
        deposit: &Deposit,
    ) -> Result<(), StateTransitionError> {
        match st.validator_index_by_pubkey(&deposit.pubkey) {
            Ok(index) => st.increase_balance(index, deposit.amount)?,
            Err(StateAccessError::UnknownValidatorPubkey { .. }) => {
                let epoch = self.spec.slot_to_epoch(st.get_slot()?);
                let validator = Validator::from_deposit(
                    deposit.pubkey.clone(),
                    deposit.credentials,
                    deposit.amount,
                    epoch,
                    &self.spec,
                );
                st.add_validator(validator, deposit.amount)?;
            }
            Err(err) => return Err(err.into()),
        }

        Ok(())
    }

    fn process_voluntary_exit<S: StateAccessor>(
        &self,
        st: &mut S,
        signed_exit: &SignedVoluntaryExit,
    ) -> Result<(), StateTransitionError> {
        let exit = &signed_exit.message;
        let mut validator = st.validator_by_index(exit.validator_index)?;
        let epoch = self.spec.slot_to_epoch(st.get_slot()?);

        if !validator.is_active_validator(epoch) {
            return Err(StateTransitionError::InvalidOperation {
                reason: format!("exit for inactive validator {}", exit.validator_index),
            });
        }
        if validator.exit_epoch != FAR_FUTURE_EPOCH {
            return Err(StateTransitionError::InvalidOperation {
                reason: format!("validator {} is already exiting", exit.validator_index),
            });
        }
        // Exits name the epoch from which they are valid.
        if epoch < exit.epoch {
            return Err(StateTransitionError::InvalidOperation {
                reason: format!(
                    "exit of validator {} is not due until epoch {}",
                    exit.validator_index, exit.epoch
                ),
            });
        }

        validator.exit_epoch = epoch + 1;
        validator.withdrawable_epoch =
            validator.exit_epoch + self.spec.min_validator_withdrawability_delay;
        st.update_validator_at_index(exit.validator_index, validator)?;

        Ok(())
    }

    fn process_proposer_slashing<S: StateAccessor>(
        &self,
        st: &mut S,
        slashing: &ProposerSlashing,
    ) -> Result<(), StateTransitionError> {
        let header_1 = &slashing.signed_header_1.message;
        let header_2 = &slashing.signed_header_2.message;

        if header_1.slot != header_2.slot {
            return Err(StateTransitionError::InvalidOperation {
                reason: "slashing headers are for different slots".to_string(),
            });
        }
        if header_1.proposer_index != header_2.proposer_index {
            return Err(StateTransitionError::InvalidOperation {
                reason: "slashing headers are by different proposers".to_string(),
            });
        }
        if header_1 == header_2 {
            return Err(StateTransitionError::InvalidOperation {
                reason: "slashing headers are identical".to_string(),
            });
        }

        let proposer_index = header_1.proposer_index;
        let proposer = st.validator_by_index(proposer_index)?;
        let epoch = self.spec.slot_to_epoch(st.get_slot()?);
        if !proposer.is_slashable_validator(epoch) {
            return Err(StateTransitionError::InvalidOperation {
                reason: format!("validator {proposer_index} is not slashable"),
            });
        }

        self.slash_validator(st, proposer_index)
    }

    fn slash_validator<S: StateAccessor>(
        &self,
        st: &mut S,
        index: u64,
    ) -> Result<(), StateTransitionError> {
        let epoch = self.spec.slot_to_epoch(st.get_slot()?);
        let mut validator = st.validator_by_index(index)?;

        validator.slashed = true;
        if validator.exit_epoch == FAR_FUTURE_EPOCH {
            validator.exit_epoch = epoch + 1;
            validator.withdrawable_epoch =
                validator.exit_epoch + self.spec.min_validator_withdrawability_delay;
        }
        validator.withdrawable_epoch = validator
            .withdrawable_epoch
            .max(epoch + self.spec.epochs_per_slashings_vector);
        let effective_balance = validator.effective_balance;
        st.update_validator_at_index(index, validator)?;

        let ring_index = epoch % self.spec.epochs_per_slashings_vector;
        let accumulated = st.get_slashing_at_index(ring_index)?;
        st.update_slashing_at_index(ring_index, accumulated + effective_balance)?;
        let total_slashing = st.get_total_slashing()?;
        st.set_total_slashing(total_slashing + effective_balance)?;

        st.decrease_balance(index, effective_balance / self.spec.min_slashing_penalty_quotient)?;

        Ok(())
    }
}
