//! Round-robin, fixed-order, and simultaneous policies, plus terminal
//! evaluation.

mod common;

use common::{apply, simultaneous_def, skirmish_def};
use turnwise::core::{EngineError, IllegalMoveReason, SeatId};
use turnwise::def::TurnOrderDef;
use turnwise::trace::TraceCollector;
use turnwise::{Engine, GameResult, Move};

fn seat(i: u8) -> SeatId {
    SeatId::new(i)
}

#[test]
fn test_round_robin_rotation() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(9, 3).unwrap();
    let mut trace = TraceCollector::disabled();

    assert_eq!(state.active_seat, seat(0));
    for expected in [1, 2, 0, 1] {
        state = engine.advance_phase(&state, &mut trace).unwrap();
        assert_eq!(state.active_seat, seat(expected));
    }
    assert_eq!(state.turn, 4);
}

#[test]
fn test_turn_boundary_resets_action_limits() {
    let mut def = skirmish_def();
    if let Some(action) = def.actions.iter_mut().find(|a| a.name == "gather") {
        action.limit_per_turn = Some(1);
    }
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(9, 2).unwrap();
    let mut trace = TraceCollector::disabled();

    state = apply(&engine, &state, &Move::new(seat(0), "gather"));
    assert_eq!(
        engine
            .apply_move(&state, &Move::new(seat(0), "gather"), &mut trace)
            .expect_err("limit reached"),
        EngineError::IllegalMove(IllegalMoveReason::ActionLimitExceeded {
            action: "gather".into(),
            limit: 1,
        })
    );

    // Two boundaries bring seat 0 back around with a fresh limit. The
    // game-scoped counter keeps counting across them.
    state = engine.advance_phase(&state, &mut trace).unwrap();
    state = engine.advance_phase(&state, &mut trace).unwrap();
    assert_eq!(state.active_seat, seat(0));
    assert_eq!(state.uses_this_turn("gather"), 0);
    assert_eq!(state.uses_this_phase("gather"), 0);
    assert_eq!(state.uses_this_game("gather"), 1);
    let state = apply(&engine, &state, &Move::new(seat(0), "gather"));
    assert_eq!(state.uses_this_game("gather"), 2);
}

#[test]
fn test_fixed_order_sequence() {
    let mut def = skirmish_def();
    def.turn_order = TurnOrderDef::FixedOrder(vec![seat(0), seat(1), seat(1)]);
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(9, 2).unwrap();
    let mut trace = TraceCollector::disabled();

    assert_eq!(state.active_seat, seat(0));
    for expected in [1, 1, 0, 1] {
        state = engine.advance_phase(&state, &mut trace).unwrap();
        assert_eq!(state.active_seat, seat(expected));
    }
}

#[test]
fn test_fixed_order_rejects_unmapped_seat() {
    let mut def = skirmish_def();
    def.turn_order = TurnOrderDef::FixedOrder(vec![seat(0), seat(5)]);
    let engine = Engine::new(&def).unwrap();

    assert_eq!(
        engine.initial_state(9, 2).expect_err("seat 5 has no seat table entry"),
        EngineError::UnmappedSeat { seat: seat(5) }
    );
}

#[test]
fn test_simultaneous_buffering_and_resolution() {
    let def = simultaneous_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(9, 2).unwrap();
    let mut trace = TraceCollector::disabled();

    // Either seat may submit first.
    let state = apply(&engine, &state, &Move::new(seat(1), "gather"));
    // Nothing resolves until everyone is in.
    assert_eq!(state.seat_var(seat(1), "resources").unwrap(), 5);

    // Double submission is rejected.
    assert_eq!(
        engine
            .apply_move(&state, &Move::new(seat(1), "gather"), &mut trace)
            .expect_err("already submitted"),
        EngineError::IllegalMove(IllegalMoveReason::NotActiveSeat { seat: seat(1) })
    );

    // The last submission resolves the whole batch in seat order.
    let state = apply(&engine, &state, &Move::new(seat(0), "recruit"));
    assert_eq!(state.seat_var(seat(0), "resources").unwrap(), 2);
    assert_eq!(state.seat_var(seat(1), "resources").unwrap(), 7);
    assert_eq!(state.zones.count("field").unwrap(), 1);
}

#[test]
fn test_simultaneous_enumerates_all_unsubmitted_seats() {
    let def = simultaneous_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(9, 2).unwrap();

    let moves = engine.legal_moves(&state).unwrap();
    assert!(moves.iter().any(|m| m.seat == seat(0)));
    assert!(moves.iter().any(|m| m.seat == seat(1)));

    let state = apply(&engine, &state, &Move::new(seat(0), "gather"));
    let moves = engine.legal_moves(&state).unwrap();
    assert!(moves.iter().all(|m| m.seat == seat(1)));
}

#[test]
fn test_terminal_winner_by_var() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(9, 2).unwrap();

    assert_eq!(engine.terminal_result(&state).unwrap(), None);

    state = apply(&engine, &state, &Move::new(seat(0), "gather"));
    state.globals.insert("pool".into(), 0);
    state.refresh_hash();
    assert_eq!(
        engine.terminal_result(&state).unwrap(),
        Some(GameResult::Winner(seat(0)))
    );
}

#[test]
fn test_terminal_tie_is_a_draw() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(9, 2).unwrap();

    state.globals.insert("pool".into(), 0);
    state.refresh_hash();
    assert_eq!(
        engine.terminal_result(&state).unwrap(),
        Some(GameResult::Draw)
    );
}

#[test]
fn test_terminal_missing_scoring_config() {
    let mut def = skirmish_def();
    def.terminal.clear();
    def.terminal.push(turnwise::def::TerminalRule {
        condition: turnwise::effects::Condition::Always,
        result: turnwise::def::ResultSpec::WinnerByVar {
            var: "fame".into(),
            highest: true,
        },
    });
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(9, 2).unwrap();

    match engine.terminal_result(&state).expect_err("undeclared scoring variable") {
        EngineError::MissingScoringConfig { what } => assert!(what.contains("fame")),
        other => panic!("expected missing scoring config, got {other:?}"),
    }
}

#[test]
fn test_advance_to_decision_point_is_idempotent_when_actionable() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(9, 2).unwrap();

    let advanced = engine.advance_to_decision_point(&state).unwrap();
    assert_eq!(advanced.hash, state.hash);
}
