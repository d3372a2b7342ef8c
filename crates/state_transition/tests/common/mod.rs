#![allow(dead_code)]

use std::sync::Arc;

use alloy_primitives::{Address, B256};
use berith_bls::{BLSError, PubKey, mock_verifier::MockVerifier};
use berith_consensus::{
    beacon_block::{BeaconBlock, BeaconBlockBody},
    beacon_state::BeaconState,
    chain_spec::ChainSpec,
    constants::FAR_FUTURE_EPOCH,
    deposit::Deposit,
    execution_engine::mock_engine::MockExecutionEngine,
    execution_payload::ExecutionPayload,
    validator::Validator,
};
use berith_state_transition::{
    Context, InMemoryDepositStore, NoopTelemetry, StateAccessor, StateProcessor,
};
use tree_hash::TreeHash;

pub type TestProcessor = StateProcessor<MockExecutionEngine, InMemoryDepositStore, MockVerifier>;

pub fn address_from_pubkey(pubkey: &PubKey) -> Result<Address, BLSError> {
    Ok(Address::from_slice(&pubkey.to_bytes()[..20]))
}

pub fn pubkey(tag: u8) -> PubKey {
    PubKey::from_bytes(&[tag; 48]).expect("48 bytes")
}

pub fn processor(spec: ChainSpec) -> TestProcessor {
    processor_with_deposits(spec, Vec::new())
}

pub fn processor_with_deposits(spec: ChainSpec, deposits: Vec<Deposit>) -> TestProcessor {
    StateProcessor::new(
        Arc::new(spec),
        MockExecutionEngine::default(),
        InMemoryDepositStore::new(deposits),
        MockVerifier::default(),
        address_from_pubkey,
        Arc::new(NoopTelemetry),
    )
}

/// Genesis state with ``validator_count`` active validators at the maximum
/// effective balance. Withdrawal credentials carry the 0x00 prefix, so no
/// validator is withdrawable unless a test says otherwise.
pub fn genesis_state(spec: &ChainSpec, validator_count: usize) -> BeaconState {
    let mut state = BeaconState::default_genesis(spec);
    for tag in 0..validator_count {
        let validator = Validator {
            pubkey: pubkey(tag as u8 + 1),
            withdrawal_credentials: B256::ZERO,
            effective_balance: spec.max_effective_balance,
            slashed: false,
            activation_eligibility_epoch: 0,
            activation_epoch: 0,
            exit_epoch: FAR_FUTURE_EPOCH,
            withdrawable_epoch: FAR_FUTURE_EPOCH,
        };
        state
            .add_validator(validator, spec.max_effective_balance)
            .expect("registry has capacity");
    }
    state
}

/// Credentials paying out to ``address`` via the 0x01 prefix.
pub fn eth1_credentials(address: Address) -> B256 {
    let mut credentials = [0u8; 32];
    credentials[0] = 0x01;
    credentials[12..].copy_from_slice(address.as_slice());
    B256::from(credentials)
}

/// A block for ``slot`` linking onto ``state``, with an empty body and a
/// payload consistent with the caught-up state. The state root is sealed via
/// a trial application.
pub async fn build_block(
    processor: &TestProcessor,
    state: &BeaconState,
    slot: u64,
    proposer_index: u64,
) -> (BeaconBlock, Context) {
    let spec = processor.spec().clone();

    let mut scratch = state.clone();
    processor
        .process_slots(&mut scratch, slot)
        .expect("slot catch-up");
    let parent_block_root = scratch.latest_block_header.tree_hash_root();

    let epoch = spec.slot_to_epoch(slot);
    let prev_randao =
        scratch.randao_mixes[(epoch % spec.epochs_per_historical_vector) as usize];

    let payload = ExecutionPayload {
        parent_hash: scratch.latest_execution_payload_header.block_hash,
        prev_randao,
        block_number: scratch.latest_execution_payload_header.block_number + 1,
        block_hash: B256::repeat_byte(0xbb),
        withdrawals: processor
            .expected_withdrawals(&scratch)
            .expect("withdrawal sweep")
            .into(),
        ..Default::default()
    };

    let proposer = scratch.validators[proposer_index as usize].clone();
    let ctx = Context {
        proposer_address: address_from_pubkey(&proposer.pubkey).expect("proposer address"),
        skip_validate_result: false,
        skip_validate_randao: false,
    };

    let mut block = BeaconBlock {
        slot,
        proposer_index,
        parent_block_root,
        state_root: B256::ZERO,
        body: BeaconBlockBody {
            eth1_data: scratch.eth1_data.clone(),
            execution_payload: payload,
            ..Default::default()
        },
    };
    seal_block(processor, state, &mut block, &ctx).await;

    (block, ctx)
}

/// Recompute ``block.state_root`` from a trial application on a copy of
/// ``state``. Call again after editing the block body.
pub async fn seal_block(
    processor: &TestProcessor,
    state: &BeaconState,
    block: &mut BeaconBlock,
    ctx: &Context,
) {
    let mut trial = state.clone();
    let build_ctx = Context {
        skip_validate_result: true,
        ..*ctx
    };
    processor
        .transition(&build_ctx, &mut trial, Some(block))
        .await
        .expect("trial application");
    block.state_root = trial.tree_hash_root();
}
