//! Agreement between the three legality surfaces.

mod common;

use common::{apply, simultaneous_def, skirmish_def};
use turnwise::core::{EngineError, IllegalMoveReason, ParamValue, SeatId};
use turnwise::effects::Decision;
use turnwise::trace::TraceCollector;
use turnwise::{Engine, Move, MoveProbe};

fn apply_err(engine: &Engine, state: &turnwise::GameState, mv: &Move) -> EngineError {
    engine
        .apply_move(state, mv, &mut TraceCollector::disabled())
        .expect_err("move should be rejected")
}

#[test]
fn test_enumerated_moves_all_probe_complete() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();

    let moves = engine.legal_moves(&state).unwrap();
    assert!(!moves.is_empty());
    for mv in &moves {
        assert_eq!(
            engine.legal_choices(&state, mv).unwrap(),
            MoveProbe::Complete,
            "enumerated move {mv:?} must probe complete"
        );
        // And every enumerated move actually applies.
        let _ = apply(&engine, &state, mv);
    }
}

#[test]
fn test_choice_expansion_covers_the_domain() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();

    let picks: Vec<Move> = engine
        .legal_moves(&state)
        .unwrap()
        .into_iter()
        .filter(|m| m.action == "pick")
        .collect();
    // One fully-decided move per option in the 1..=3 range.
    assert_eq!(picks.len(), 3);
    for mv in &picks {
        assert_eq!(mv.decisions.len(), 1);
    }
}

#[test]
fn test_wrong_seat_reason_matches_apply_error() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(1), "gather");

    let probed = engine.legal_choices(&state, &mv).unwrap();
    let expected = IllegalMoveReason::NotActiveSeat {
        seat: SeatId::new(1),
    };
    assert_eq!(probed, MoveProbe::Illegal(expected.clone()));
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );
}

#[test]
fn test_unknown_action_parity() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "conjure");

    let expected = IllegalMoveReason::UnknownAction {
        action: "conjure".into(),
    };
    assert_eq!(
        engine.legal_choices(&state, &mv).unwrap(),
        MoveProbe::Illegal(expected.clone())
    );
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );
}

#[test]
fn test_pending_choice_reports_domain() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick");

    match engine.legal_choices(&state, &mv).unwrap() {
        MoveProbe::Pending(pending) => {
            assert_eq!(pending.choice, "bonus");
            assert_eq!(pending.chooser, SeatId::new(0));
            assert_eq!(
                pending.options,
                vec![
                    ParamValue::Scalar(1),
                    ParamValue::Scalar(2),
                    ParamValue::Scalar(3)
                ]
            );
            assert_eq!(pending.count, 1);
        }
        other => panic!("expected pending choice, got {other:?}"),
    }
}

#[test]
fn test_undecided_apply_is_not_an_illegal_move() {
    // A pending choice is "incomplete", not "illegal": apply reports it
    // as a choice validation error, never as an illegal-move reason.
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick");

    match apply_err(&engine, &state, &mv) {
        EngineError::ChoiceValidation { choice, .. } => assert_eq!(choice, "bonus"),
        other => panic!("expected choice validation, got {other:?}"),
    }
}

#[test]
fn test_foreign_decision_rejected_on_both_surfaces() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick").with_decision(Decision::new(
        "bonus",
        ParamValue::Scalar(2),
        SeatId::new(1),
    ));

    let expected = IllegalMoveReason::ChoiceAuthorityMismatch {
        choice: "bonus".into(),
        expected: SeatId::new(0),
    };
    assert_eq!(
        engine.legal_choices(&state, &mv).unwrap(),
        MoveProbe::Illegal(expected.clone())
    );
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );
}

#[test]
fn test_probe_authority_mismatch_is_distinguished() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick").with_decision(Decision::new(
        "bonus",
        ParamValue::Scalar(2),
        SeatId::new(1),
    ));

    match engine.legal_choices_probe(&state, &mv) {
        Err(EngineError::ChoiceProbeAuthorityMismatch { choice, expected }) => {
            assert_eq!(choice, "bonus");
            assert_eq!(expected, SeatId::new(0));
        }
        other => panic!("expected probe authority mismatch, got {other:?}"),
    }
}

#[test]
fn test_out_of_domain_selection_parity() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick").with_decision(Decision::new(
        "bonus",
        ParamValue::Scalar(7),
        SeatId::new(0),
    ));

    let expected = IllegalMoveReason::OutsideOptionsDomain {
        choice: "bonus".into(),
    };
    assert_eq!(
        engine.legal_choices(&state, &mv).unwrap(),
        MoveProbe::Illegal(expected.clone())
    );
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );
}

#[test]
fn test_simultaneous_out_of_domain_rejected_at_submission() {
    // Parity holds at submission time too: a bad decision never enters
    // the buffer, so the other seat's legal submission still resolves.
    let def = simultaneous_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick").with_decision(Decision::new(
        "bonus",
        ParamValue::Scalar(99),
        SeatId::new(0),
    ));

    let expected = IllegalMoveReason::OutsideOptionsDomain {
        choice: "bonus".into(),
    };
    assert_eq!(
        engine.legal_choices(&state, &mv).unwrap(),
        MoveProbe::Illegal(expected.clone())
    );
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );

    // Seat 0 is not locked out and can submit a corrected move; seat
    // 1's gather then resolves the batch cleanly.
    let state = apply(
        &engine,
        &state,
        &Move::new(SeatId::new(0), "pick").with_decision(Decision::new(
            "bonus",
            ParamValue::Scalar(2),
            SeatId::new(0),
        )),
    );
    let state = apply(&engine, &state, &Move::new(SeatId::new(1), "gather"));
    assert_eq!(state.seat_var(SeatId::new(0), "resources").unwrap(), 7);
    assert_eq!(state.seat_var(SeatId::new(1), "resources").unwrap(), 7);
}

#[test]
fn test_simultaneous_foreign_decision_rejected_at_submission() {
    let def = simultaneous_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick").with_decision(Decision::new(
        "bonus",
        ParamValue::Scalar(2),
        SeatId::new(1),
    ));

    let expected = IllegalMoveReason::ChoiceAuthorityMismatch {
        choice: "bonus".into(),
        expected: SeatId::new(0),
    };
    assert_eq!(
        engine.legal_choices(&state, &mv).unwrap(),
        MoveProbe::Illegal(expected.clone())
    );
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );
}

#[test]
fn test_simultaneous_undecided_submission_is_choice_validation() {
    let def = simultaneous_def();
    let engine = Engine::new(&def).unwrap();
    let state = engine.initial_state(3, 2).unwrap();
    let mv = Move::new(SeatId::new(0), "pick");

    match apply_err(&engine, &state, &mv) {
        EngineError::ChoiceValidation { choice, .. } => assert_eq!(choice, "bonus"),
        other => panic!("expected choice validation, got {other:?}"),
    }
}

#[test]
fn test_cost_validation_parity() {
    let def = skirmish_def();
    let engine = Engine::new(&def).unwrap();
    let mut state = engine.initial_state(3, 2).unwrap();

    // First recruit spends 3 of the starting 5.
    state = apply(&engine, &state, &Move::new(SeatId::new(0), "recruit"));
    let mv = Move::new(SeatId::new(0), "recruit");

    let expected = IllegalMoveReason::ProfileCostValidationFailed {
        action: "recruit".into(),
        var: "resources".into(),
        required: 3,
        available: 2,
    };
    assert_eq!(
        engine.legal_choices(&state, &mv).unwrap(),
        MoveProbe::Illegal(expected.clone())
    );
    assert_eq!(
        apply_err(&engine, &state, &mv),
        EngineError::IllegalMove(expected)
    );
}
