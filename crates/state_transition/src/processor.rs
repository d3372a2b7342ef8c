use std::{collections::HashMap, sync::Arc, time::Instant};

use alloy_primitives::{Address, B256};
use berith_bls::{BLSError, PubKey, traits::BlsVerifier};
use berith_consensus::{
    beacon_block::BeaconBlock,
    chain_spec::{ChainSpec, GARNET_ETH1_CHAIN_ID, GARNET_FORK2_HEIGHT},
    execution_engine::engine_trait::ExecutionApi,
    validator::Validator,
    validator_update::ValidatorUpdates,
};
use parking_lot::RwLock;
use tracing::info;
use tree_hash::TreeHash;

use crate::{
    accessor::StateAccessor,
    context::Context,
    deposit_store::DepositStore,
    errors::StateTransitionError,
    metrics::{StateProcessorMetrics, TelemetrySink},
};

/// Pure function mapping a validator pubkey to the address the consensus
/// engine knows the proposer by. Injected to simplify testing.
pub type AddressFromPubkey = fn(&PubKey) -> Result<Address, BLSError>;

/// Drives the state transition for a single chain: slot catch-up, epoch
/// bookkeeping and block application over a [`StateAccessor`].
///
/// One processor serves many states. Transitions on different state
/// instances may run concurrently (speculative application on non-final
/// branches); the per-epoch validator-set snapshots are the only shared
/// resource and sit behind a reader/writer lock.
pub struct StateProcessor<E, D, V> {
    pub(crate) spec: Arc<ChainSpec>,
    pub(crate) execution_engine: E,
    pub(crate) deposit_store: D,
    pub(crate) signer: V,
    pub(crate) address_from_pubkey: AddressFromPubkey,
    pub(crate) metrics: StateProcessorMetrics,

    /// Active validator set per epoch, kept for the current and previous
    /// epoch only. Entries written while applying blocks on losing branches
    /// are benign: the last writer for an epoch wins once the branch
    /// finalizes.
    pub(crate) val_set_by_epoch: RwLock<HashMap<u64, Vec<Validator>>>,
}

impl<E, D, V> StateProcessor<E, D, V> {
    pub fn new(
        spec: Arc<ChainSpec>,
        execution_engine: E,
        deposit_store: D,
        signer: V,
        address_from_pubkey: AddressFromPubkey,
        telemetry: Arc<dyn TelemetrySink>,
    ) -> Self {
        Self {
            spec,
            execution_engine,
            deposit_store,
            signer,
            address_from_pubkey,
            metrics: StateProcessorMetrics::new(telemetry),
            val_set_by_epoch: RwLock::new(HashMap::new()),
        }
    }

    pub fn spec(&self) -> &ChainSpec {
        &self.spec
    }

    /// Epochs for which a validator-set snapshot is currently cached.
    pub fn cached_epochs(&self) -> Vec<u64> {
        let mut epochs: Vec<u64> = self.val_set_by_epoch.read().keys().copied().collect();
        epochs.sort_unstable();
        epochs
    }

    /// Advance the state to ``slot``, one slot at a time, running epoch
    /// processing at each epoch boundary crossed on the way.
    pub fn process_slots<S: StateAccessor>(
        &self,
        st: &mut S,
        slot: u64,
    ) -> Result<ValidatorUpdates, StateTransitionError> {
        let mut updates = ValidatorUpdates::new();

        let mut state_slot = st.get_slot()?;
        while state_slot < slot {
            self.process_slot(st)?;

            // One-off deposit index correction baked into garnet's history;
            // replaying it identically keeps historical app hashes intact.
            if self.spec.deposit_eth1_chain_id == GARNET_ETH1_CHAIN_ID
                && slot == GARNET_FORK2_HEIGHT
            {
                let index = st.get_eth1_deposit_index()?;
                let fixed = index.saturating_sub(1);
                st.set_eth1_deposit_index(fixed)?;
                info!(previous = index, fixed, "corrected eth1 deposit index");
            }

            if self.spec.is_epoch_boundary(state_slot) {
                updates.extend(self.process_epoch(st)?);
            }

            // Processors within the slot observe the pre-increment value, so
            // the slot advances only after the epoch work above has run.
            state_slot += 1;
            st.set_slot(state_slot)?;
        }

        Ok(updates)
    }

    /// Record the roots of the slot being left behind. Does not advance the
    /// slot counter.
    fn process_slot<S: StateAccessor>(&self, st: &mut S) -> Result<(), StateTransitionError> {
        let slot = st.get_slot()?;
        let ring_index = slot % self.spec.slots_per_historical_root;

        let prev_state_root = st.hash_tree_root()?;
        st.update_state_root_at_index(ring_index, prev_state_root)?;

        // A zero state root marks the header stored by the last block; its
        // post-state root is only known now.
        let mut latest_header = st.get_latest_block_header()?;
        if latest_header.state_root == B256::ZERO {
            latest_header.state_root = prev_state_root;
            st.set_latest_block_header(latest_header.clone())?;
        }

        st.update_block_root_at_index(ring_index, latest_header.tree_hash_root())?;
        Ok(())
    }
}

impl<E, D, V> StateProcessor<E, D, V>
where
    E: ExecutionApi,
    D: DepositStore,
    V: BlsVerifier,
{
    /// Apply ``block`` to ``st``, catching the state up to the block's slot
    /// first. A nil block leaves the state untouched. Returns the validator
    /// set updates accumulated at the epoch boundaries crossed.
    pub async fn transition<S: StateAccessor>(
        &self,
        ctx: &Context,
        st: &mut S,
        block: Option<&BeaconBlock>,
    ) -> Result<ValidatorUpdates, StateTransitionError> {
        let Some(block) = block else {
            return Ok(ValidatorUpdates::new());
        };

        let started = Instant::now();
        let result = self.apply(ctx, st, block).await;
        match &result {
            Ok(_) => self.metrics.transition_applied(started.elapsed()),
            Err(_) => self.metrics.transition_rejected(),
        }
        result
    }

    async fn apply<S: StateAccessor>(
        &self,
        ctx: &Context,
        st: &mut S,
        block: &BeaconBlock,
    ) -> Result<ValidatorUpdates, StateTransitionError> {
        let updates = self.process_slots(st, block.slot)?;
        self.process_block(ctx, st, block).await?;
        Ok(updates)
    }
}
