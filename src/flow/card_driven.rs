//! Card-boundary advancement for the card-driven policy.
//!
//! A card is done once both actors have acted or every eligible seat
//! has acted or passed. Advancing past it runs the lifecycle slot
//! rotation and recomputes eligibility for the next card.
//!
//! Lifecycle steps run in a fixed order — coup routing, coup handoff,
//! lookahead promotion, lookahead reveal — and each silently no-ops
//! when a zone it needs is absent from the state. Every step that does
//! run is traced individually so replay tooling can observe the exact
//! rotation.

use tracing::debug;

use crate::core::{EngineError, EngineResult, GameState};
use crate::def::{CardDrivenDef, EligibilityWindow, GameDef, ZoneOrdering};
use crate::trace::{LifecycleStep, TraceCollector, TraceEntry};

use super::{CardFlowState, TurnFlowState};

/// Advance past the current card: rotate lifecycle slots, expire and
/// apply eligibility overrides, and reset per-card state.
pub fn advance_card_boundary(
    def: &GameDef,
    card_def: &CardDrivenDef,
    state: &mut GameState,
    trace: &mut TraceCollector,
) -> EngineResult<()> {
    let coup_handoff = run_lifecycle(def, card_def, state, trace)?;
    let cycle_ended = deck_empty(card_def, state);
    debug!(coup_handoff, cycle_ended, "card boundary");

    let card = match &mut state.flow {
        TurnFlowState::CardDriven(card) => card,
        other => {
            return Err(EngineError::InternalInvariant(format!(
                "card boundary on {other:?} flow state"
            )))
        }
    };

    // Seats that took a non-pass action sit out the next card; passers
    // and idle seats come back in.
    let next_eligible: Vec<(crate::core::SeatId, bool)> =
        card.acted.iter().map(|(seat, &acted)| (seat, !acted)).collect();
    for (seat, eligible) in next_eligible {
        card.eligible[seat] = eligible;
    }

    if coup_handoff {
        card.round += 1;
        card.overrides
            .retain(|o| o.window != EligibilityWindow::ThisRound);
    }
    if cycle_ended {
        card.cycle += 1;
        card.overrides
            .retain(|o| o.window != EligibilityWindow::ThisCycle);
    }

    // Card-window expiry: this-card overrides end here, and next-card
    // overrides that already had their card end too. Pending next-card
    // overrides come due now.
    card.overrides.retain(|o| {
        !(o.window == EligibilityWindow::ThisCard
            || (o.window == EligibilityWindow::NextCard && !o.pending))
    });
    for over in &mut card.overrides {
        if over.window == EligibilityWindow::NextCard {
            over.pending = false;
        }
    }

    // Surviving overrides reassert themselves over the recomputed
    // baseline, in queue order.
    for over in &card.overrides {
        if !over.pending {
            card.eligible[over.seat] = over.make_eligible;
        }
    }

    reset_card(card);

    if let Some(seat) = super::runtime::expected_actor(def, state) {
        state.active_seat = seat;
    }
    Ok(())
}

fn reset_card(card: &mut CardFlowState) {
    for seat in card.acted.seat_ids().collect::<Vec<_>>() {
        card.acted[seat] = false;
        card.passed[seat] = false;
    }
    card.first_actor = None;
    card.first_class = None;
    card.non_pass_count = 0;
    card.last_pivotal = None;
}

/// Run the lifecycle slot rotation. Returns true if a coup handoff
/// occurred (a round boundary).
fn run_lifecycle(
    def: &GameDef,
    card_def: &CardDrivenDef,
    state: &mut GameState,
    trace: &mut TraceCollector,
) -> EngineResult<bool> {
    let slots = &card_def.lifecycle;
    let mut coup_handoff = false;

    // Coup routing: a coup-typed card at the front of the played slot
    // moves to the leader slot and leadership hands off.
    if state.zones.has_zone(&slots.played) && state.zones.has_zone(&slots.leader) {
        if let Some(front) = state.zones.front(&slots.played)? {
            if state.zones.token(front)?.token_type == slots.coup_type {
                state
                    .zones
                    .move_token(front, &slots.leader, ordering(def, &slots.leader))?;
                trace.record(TraceEntry::Lifecycle(LifecycleStep::CoupToLeader));
                trace.record(TraceEntry::Lifecycle(LifecycleStep::CoupHandoff));
                coup_handoff = true;
            }
        }
    }

    // Promote lookahead into the now-vacant played slot.
    if state.zones.has_zone(&slots.lookahead) && state.zones.has_zone(&slots.played) {
        if let Some(front) = state.zones.front(&slots.lookahead)? {
            state
                .zones
                .move_token(front, &slots.played, ordering(def, &slots.played))?;
            trace.record(TraceEntry::Lifecycle(LifecycleStep::PromoteLookaheadToPlayed));
        }
    }

    // Reveal the next deck card into lookahead.
    if state.zones.has_zone(&slots.deck) && state.zones.has_zone(&slots.lookahead) {
        if let Some(front) = state.zones.front(&slots.deck)? {
            state
                .zones
                .move_token(front, &slots.lookahead, ordering(def, &slots.lookahead))?;
            trace.record(TraceEntry::Lifecycle(LifecycleStep::RevealLookahead));
        }
    }

    Ok(coup_handoff)
}

fn deck_empty(card_def: &CardDrivenDef, state: &GameState) -> bool {
    state.zones.has_zone(&card_def.lifecycle.deck)
        && state
            .zones
            .count(&card_def.lifecycle.deck)
            .is_ok_and(|n| n == 0)
}

fn ordering(def: &GameDef, zone: &str) -> ZoneOrdering {
    def.zone(zone).map_or(ZoneOrdering::Queue, |z| z.ordering)
}
