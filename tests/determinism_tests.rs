//! Replay and serialization determinism.

mod common;

use common::{apply, skirmish_def};
use turnwise::core::{state_digest, SeatId};
use turnwise::trace::TraceCollector;
use turnwise::{Engine, GameState, Move};

/// Drive a fixed script and collect the hash after every step.
fn replay_hashes(seed: u64) -> Vec<u64> {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(seed, 2).unwrap();
    let mut hashes = vec![state.hash];

    let seat0 = SeatId::new(0);
    let seat1 = SeatId::new(1);

    state = apply(&engine, &state, &Move::new(seat0, "gather"));
    hashes.push(state.hash);
    state = apply(&engine, &state, &Move::new(seat0, "raid"));
    hashes.push(state.hash);

    state = engine
        .advance_phase(&state, &mut TraceCollector::disabled())
        .unwrap();
    hashes.push(state.hash);

    state = apply(&engine, &state, &Move::new(seat1, "raid"));
    hashes.push(state.hash);
    state = apply(&engine, &state, &Move::new(seat1, "recruit"));
    hashes.push(state.hash);

    hashes
}

#[test]
fn test_same_seed_same_hashes() {
    assert_eq!(replay_hashes(42), replay_hashes(42));
}

#[test]
fn test_different_seed_diverges() {
    // The seed feeds the digest through the RNG position, so the very
    // first hash already differs.
    let a = replay_hashes(1);
    let b = replay_hashes(2);
    assert_ne!(a[0], b[0]);
}

#[test]
fn test_apply_does_not_mutate_input() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(7, 2).unwrap();
    let before = state.clone();

    let _next = apply(&engine, &state, &Move::new(SeatId::new(0), "gather"));
    assert_eq!(state, before);
}

#[test]
fn test_trace_collection_does_not_change_hash() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(11, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "raid");

    let quiet = apply(&engine, &state, &mv);
    let mut trace = TraceCollector::enabled();
    let traced = engine.apply_move(&state, &mv, &mut trace).unwrap();

    assert!(!trace.entries().is_empty());
    assert_eq!(quiet.hash, traced.hash);
}

#[test]
fn test_json_round_trip_preserves_state() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(23, 2).unwrap();
    state = apply(&engine, &state, &Move::new(SeatId::new(0), "raid"));

    let json = serde_json::to_string(&state).unwrap();
    let restored: GameState = serde_json::from_str(&json).unwrap();

    assert_eq!(state, restored);
    assert_eq!(restored.hash, state_digest(&restored));
}

#[test]
fn test_snapshot_round_trip_resumes_replay() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(23, 2).unwrap();
    state = apply(&engine, &state, &Move::new(SeatId::new(0), "raid"));

    let bytes = state.to_snapshot().unwrap();
    let restored = GameState::from_snapshot(&bytes).unwrap();
    assert_eq!(state, restored);

    // The RNG stream resumes exactly: the next draw matches.
    let mv = Move::new(SeatId::new(0), "raid");
    assert_eq!(apply(&engine, &state, &mv).hash, apply(&engine, &restored, &mv).hash);
}

#[test]
fn test_snapshot_rejects_garbage() {
    assert!(GameState::from_snapshot(&[0xff, 0x01, 0x02]).is_err());
}

mod properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        // Keep the case count low; each case replays a full script.
        #![proptest_config(ProptestConfig::with_cases(16))]

        #[test]
        fn prop_replay_is_seed_deterministic(seed in any::<u64>()) {
            prop_assert_eq!(replay_hashes(seed), replay_hashes(seed));
        }

        #[test]
        fn prop_snapshot_round_trips_any_seed(seed in any::<u64>()) {
            let def = skirmish_def();
            let engine = Engine::new(&def).unwrap();
            let state = engine.initial_state(seed, 2).unwrap();
            let restored = GameState::from_snapshot(&state.to_snapshot().unwrap()).unwrap();
            prop_assert_eq!(state, restored);
        }
    }
}
