//! Policy-generic turn-flow logic.
//!
//! Answers "whose move is expected", "is this class admissible", and
//! "what happens to the flow after a move", dispatching on the active
//! policy. Card-boundary mechanics live in [`super::card_driven`].

use crate::core::{EngineError, EngineResult, GameState, IllegalMoveReason, SeatId};
use crate::def::{ActionClass, CardDrivenDef, GameDef, TurnOrderDef};
use crate::trace::{TraceCollector, TraceEntry};

use super::card_driven::advance_card_boundary;
use super::TurnFlowState;

/// The seat whose move is currently expected, or `None` when no seat
/// may act until the flow advances (exhausted card, finished turn).
pub fn expected_actor(def: &GameDef, state: &GameState) -> Option<SeatId> {
    match (&def.turn_order, &state.flow) {
        (TurnOrderDef::RoundRobin, TurnFlowState::RoundRobin) => Some(state.active_seat),
        (TurnOrderDef::FixedOrder(order), TurnFlowState::FixedOrder { index }) => {
            order.get(index % order.len()).copied()
        }
        (TurnOrderDef::Simultaneous, TurnFlowState::Simultaneous { submitted }) => submitted
            .iter()
            .position(Option::is_none)
            .map(|i| SeatId::new(i as u8)),
        (TurnOrderDef::CardDriven(card_def), TurnFlowState::CardDriven(card)) => {
            if card.non_pass_count >= 2 {
                return None;
            }
            card_def
                .seat_order
                .iter()
                .copied()
                .find(|&seat| card.eligible[seat] && !card.acted[seat] && !card.passed[seat])
        }
        // Definition and runtime disagree on the policy; unreachable
        // for states built by this engine.
        _ => None,
    }
}

/// Gate a seat's right to move now. A free action bypasses activation
/// order but requires a pending grant.
pub fn seat_may_act(
    def: &GameDef,
    state: &GameState,
    seat: SeatId,
    free_action: bool,
) -> Result<(), IllegalMoveReason> {
    if free_action {
        return match &state.flow {
            TurnFlowState::CardDriven(card) if card.has_free_grant(seat) => Ok(()),
            _ => Err(IllegalMoveReason::FreeActionNotGranted { seat }),
        };
    }
    // Simultaneous submission is open to every seat that has not
    // submitted yet, not just the lowest.
    if let TurnFlowState::Simultaneous { submitted } = &state.flow {
        return match submitted.get(seat.index()) {
            Some(None) => Ok(()),
            Some(Some(_)) | None => Err(IllegalMoveReason::NotActiveSeat { seat }),
        };
    }
    match expected_actor(def, state) {
        Some(expected) if expected == seat => Ok(()),
        _ => Err(IllegalMoveReason::NotActiveSeat { seat }),
    }
}

/// The classes currently open to the acting seat, or `None` when the
/// policy places no class constraint.
///
/// Only the card-driven second actor is constrained: the option matrix
/// row keyed by the first actor's class limits what the second may
/// choose, with pass always available.
pub fn admissible_second_classes(def: &GameDef, state: &GameState) -> Option<Vec<ActionClass>> {
    let (card_def, card) = match (&def.turn_order, &state.flow) {
        (TurnOrderDef::CardDriven(d), TurnFlowState::CardDriven(c)) => (d, c),
        _ => return None,
    };
    let first_class = card.first_class?;
    let row = card_def.matrix_row(first_class)?;
    Some(row.second.clone())
}

/// Check a move's class against the current option-matrix constraint.
pub fn class_allowed(def: &GameDef, state: &GameState, class: ActionClass) -> bool {
    let (card_def, card) = match (&def.turn_order, &state.flow) {
        (TurnOrderDef::CardDriven(d), TurnFlowState::CardDriven(c)) => (d, c),
        _ => return true,
    };
    let Some(first_class) = card.first_class else {
        return true;
    };
    match card_def.matrix_row(first_class) {
        Some(row) => row.allows(class),
        None => true,
    }
}

/// Update the flow after a successfully applied move. Advances the
/// card boundary when the card is exhausted.
pub fn after_move(
    def: &GameDef,
    state: &mut GameState,
    seat: SeatId,
    action: &str,
    class: ActionClass,
    free_action: bool,
    trace: &mut TraceCollector,
) -> EngineResult<()> {
    let card_def = match &def.turn_order {
        TurnOrderDef::CardDriven(card_def) => card_def,
        TurnOrderDef::RoundRobin | TurnOrderDef::FixedOrder(_) | TurnOrderDef::Simultaneous => {
            return Ok(())
        }
    };

    let seat_passed = {
        let card = match &mut state.flow {
            TurnFlowState::CardDriven(card) => card,
            other => {
                return Err(EngineError::InternalInvariant(format!(
                    "card-driven definition with {other:?} flow state"
                )))
            }
        };

        if free_action {
            // One-shot grant, outside the activation sequence.
            card.take_free_grant(seat);
            return Ok(());
        }

        if class == ActionClass::Pivotal {
            card.last_pivotal = Some(action.to_string());
        }

        if class == ActionClass::Pass {
            card.passed[seat] = true;
            true
        } else {
            card.acted[seat] = true;
            card.non_pass_count += 1;
            if card.first_actor.is_none() {
                card.first_actor = Some(seat);
                card.first_class = Some(class);
            }
            false
        }
    };

    if seat_passed {
        credit_pass_rewards(def, card_def, state, seat, trace)?;
    }

    if card_exhausted(card_def, state) {
        advance_card_boundary(def, card_def, state, trace)?;
    }
    Ok(())
}

fn card_exhausted(card_def: &CardDrivenDef, state: &GameState) -> bool {
    let card = match &state.flow {
        TurnFlowState::CardDriven(card) => card,
        _ => return false,
    };
    if card.non_pass_count >= 2 {
        return true;
    }
    card_def
        .seat_order
        .iter()
        .all(|&seat| !card.eligible[seat] || card.acted[seat] || card.passed[seat])
}

fn credit_pass_rewards(
    def: &GameDef,
    card_def: &CardDrivenDef,
    state: &mut GameState,
    seat: SeatId,
    trace: &mut TraceCollector,
) -> EngineResult<()> {
    for reward in &card_def.pass_rewards {
        if !reward.applies_to(seat) {
            continue;
        }
        let current = state.seat_var(seat, &reward.var)?;
        // Clamp at the declared ceiling instead of failing; a pass
        // reward is never an illegal move.
        let max = def
            .seat_var(&reward.var)
            .map_or(i64::MAX, |v| v.bounds().1);
        let new = current.saturating_add(reward.amount).min(max);
        state.seat_vars[seat].insert(reward.var.clone(), new);
        trace.record(TraceEntry::PassRewarded {
            seat,
            var: reward.var.clone(),
            amount: new - current,
        });
    }
    Ok(())
}

/// Reset per-turn counters at a turn start.
pub fn on_turn_start(state: &mut GameState) {
    state.action_uses.clear();
}

/// Rotate the active seat at a turn boundary.
pub fn flow_turn_boundary(def: &GameDef, state: &mut GameState) -> EngineResult<()> {
    match (&def.turn_order, &mut state.flow) {
        (TurnOrderDef::RoundRobin, TurnFlowState::RoundRobin) => {
            let next = (state.active_seat.index() + 1) % state.seat_count;
            state.active_seat = SeatId::new(next as u8);
            Ok(())
        }
        (TurnOrderDef::FixedOrder(order), TurnFlowState::FixedOrder { index }) => {
            *index = (*index + 1) % order.len();
            let seat = order[*index];
            if seat.index() >= state.seat_count {
                return Err(EngineError::UnmappedSeat { seat });
            }
            state.active_seat = seat;
            Ok(())
        }
        (TurnOrderDef::Simultaneous, TurnFlowState::Simultaneous { submitted }) => {
            let next = submitted.iter().position(Option::is_none).unwrap_or(0);
            state.active_seat = SeatId::new(next as u8);
            Ok(())
        }
        (TurnOrderDef::CardDriven(_), TurnFlowState::CardDriven(_)) => {
            if let Some(seat) = expected_actor(def, state) {
                state.active_seat = seat;
            }
            Ok(())
        }
        (_, flow) => Err(EngineError::InternalInvariant(format!(
            "turn order definition does not match {flow:?} flow state"
        ))),
    }
}
