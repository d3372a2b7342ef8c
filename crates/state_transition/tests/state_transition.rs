mod common;

use alloy_primitives::B256;
use berith_consensus::chain_spec::{ChainSpec, GARNET_FORK2_HEIGHT};
use berith_state_transition::{Context, StateAccessor, StateTransitionError};
use common::{build_block, genesis_state, processor};
use tree_hash::TreeHash;

#[tokio::test]
async fn nil_block_transition_is_a_noop() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 2);
    let pre_root = state.tree_hash_root();

    let updates = sp
        .transition(&Context::default(), &mut state, None)
        .await
        .expect("nil block");

    assert!(updates.is_empty());
    assert_eq!(state.tree_hash_root(), pre_root);
}

#[test]
fn single_slot_advance_records_roots() {
    let spec = ChainSpec::mainnet();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);
    state.slot = 4;

    let pre_root = state.tree_hash_root();
    let mut expected_header = state.latest_block_header.clone();

    sp.process_slots(&mut state, 5).expect("advance");

    assert_eq!(state.slot, 5);
    assert_eq!(state.state_roots[4], pre_root);

    // The header left behind by the previous block is back-filled with the
    // state root that was computed for its post-state.
    expected_header.state_root = pre_root;
    assert_eq!(state.latest_block_header, expected_header);
    assert_eq!(state.block_roots[4], expected_header.tree_hash_root());
}

#[test]
fn historical_ring_wraps_around() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 2);

    sp.process_slots(&mut state, 8).expect("first lap");
    let root_at_slot_8 = state.tree_hash_root();

    sp.process_slots(&mut state, 16).expect("second lap");

    // Slot 8 maps back onto ring index 0 and overwrites the slot-0 entry.
    assert_eq!(state.state_roots[0], root_at_slot_8);
}

#[test]
fn state_roots_are_stable_across_clones() {
    let spec = ChainSpec::minimal();
    let state = genesis_state(&spec, 3);

    assert_eq!(state.tree_hash_root(), state.clone().tree_hash_root());
}

#[tokio::test]
async fn full_block_round_trip() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);

    let (block, ctx) = build_block(&sp, &state, 1, 0).await;
    let updates = sp
        .transition(&ctx, &mut state, Some(&block))
        .await
        .expect("valid block");

    assert!(updates.is_empty());
    assert_eq!(state.slot, 1);
    assert_eq!(
        state.latest_block_header.body_root,
        block.body.tree_hash_root()
    );
    // The new header's state root stays zeroed until the next slot is
    // processed.
    assert_eq!(state.latest_block_header.state_root, B256::ZERO);
    assert_eq!(state.tree_hash_root(), block.state_root);
}

#[tokio::test]
async fn boundary_block_triggers_one_epoch_pass_before_application() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 2);

    let (block, ctx) = build_block(&sp, &state, 8, 0).await;
    let updates = sp
        .transition(&ctx, &mut state, Some(&block))
        .await
        .expect("boundary block");

    // The boundary crossed on the way to slot 8 emits the first
    // validator-set snapshot before the block itself is applied.
    assert_eq!(state.slot, 8);
    assert_eq!(updates.len(), 2);
    assert_eq!(state.tree_hash_root(), block.state_root);
}

#[tokio::test]
async fn state_root_mismatch_is_rejected_unless_suppressed() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let state = genesis_state(&spec, 4);

    let (mut block, ctx) = build_block(&sp, &state, 1, 0).await;
    block.state_root = B256::with_last_byte(0x01);

    let mut strict_state = state.clone();
    let err = sp
        .transition(&ctx, &mut strict_state, Some(&block))
        .await
        .expect_err("tampered state root");
    assert!(matches!(
        err,
        StateTransitionError::StateRootMismatch { .. }
    ));

    let mut lenient_state = state.clone();
    let lenient_ctx = Context {
        skip_validate_result: true,
        ..ctx
    };
    sp.transition(&lenient_ctx, &mut lenient_state, Some(&block))
        .await
        .expect("suppressed validation");
}

#[tokio::test]
async fn proposer_mismatch_is_rejected() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);

    let (block, ctx) = build_block(&sp, &state, 1, 0).await;
    let wrong_ctx = Context {
        proposer_address: alloy_primitives::Address::repeat_byte(0x77),
        ..ctx
    };

    let err = sp
        .transition(&wrong_ctx, &mut state, Some(&block))
        .await
        .expect_err("wrong proposer address");
    assert!(matches!(err, StateTransitionError::ProposerMismatch { .. }));
}

#[tokio::test]
async fn slashed_proposer_is_rejected() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);
    state.validators[0].slashed = true;

    let (block, ctx) = build_block(&sp, &state, 1, 0).await;
    let err = sp
        .transition(&ctx, &mut state, Some(&block))
        .await
        .expect_err("slashed proposer");
    assert!(matches!(err, StateTransitionError::SlashedProposer { index: 0 }));
}

#[tokio::test]
async fn parent_root_mismatch_is_rejected() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);

    let (mut block, ctx) = build_block(&sp, &state, 1, 0).await;
    block.parent_block_root = B256::repeat_byte(0x42);

    let err = sp
        .transition(&ctx, &mut state, Some(&block))
        .await
        .expect_err("broken linkage");
    assert!(matches!(
        err,
        StateTransitionError::ParentRootMismatch { .. }
    ));
}

#[tokio::test]
async fn block_at_latest_header_slot_is_too_low() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);

    let (block, ctx) = build_block(&sp, &state, 1, 0).await;
    sp.transition(&ctx, &mut state, Some(&block))
        .await
        .expect("first application");

    // A second block for the same slot never advances past the header check.
    let replay = berith_consensus::beacon_block::BeaconBlock {
        slot: 1,
        ..block
    };
    let err = sp
        .transition(&ctx, &mut state, Some(&replay))
        .await
        .expect_err("replayed slot");
    assert!(matches!(
        err,
        StateTransitionError::BlockSlotTooLow { latest: 1, got: 1 }
    ));
}

#[tokio::test]
async fn stale_block_slot_is_a_mismatch() {
    let spec = ChainSpec::minimal();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 4);

    let (block, ctx) = build_block(&sp, &state, 3, 0).await;
    sp.process_slots(&mut state, 5).expect("overtake the block");

    let err = sp
        .transition(&ctx, &mut state, Some(&block))
        .await
        .expect_err("stale block");
    assert!(matches!(
        err,
        StateTransitionError::SlotMismatch {
            expected: 5,
            got: 3
        }
    ));
}

#[test]
fn garnet_deposit_index_correction_applies_at_fork_height() {
    let spec = ChainSpec::garnet();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 2);
    state.slot = GARNET_FORK2_HEIGHT - 1;
    state.eth1_deposit_index = 7;

    sp.process_slots(&mut state, GARNET_FORK2_HEIGHT)
        .expect("catch up to the fork height");

    assert_eq!(state.get_eth1_deposit_index().unwrap(), 6);
}

#[test]
fn deposit_index_is_untouched_off_garnet() {
    let spec = ChainSpec::mainnet();
    let sp = processor(spec.clone());
    let mut state = genesis_state(&spec, 2);
    state.slot = GARNET_FORK2_HEIGHT - 1;
    state.eth1_deposit_index = 7;

    sp.process_slots(&mut state, GARNET_FORK2_HEIGHT)
        .expect("catch up");

    assert_eq!(state.eth1_deposit_index, 7);
}
