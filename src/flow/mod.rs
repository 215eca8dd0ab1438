//! Turn-order runtime state.
//!
//! One [`TurnFlowState`] variant per declared policy, carried inside
//! `GameState` and mutated only by the flow runtime
//! ([`runtime`]/[`card_driven`]). The variants are plain data so the
//! whole flow serializes with the state and feeds the canonical digest.

mod card_driven;
mod runtime;

pub use card_driven::advance_card_boundary;
pub use runtime::{
    admissible_second_classes, after_move, class_allowed, expected_actor, flow_turn_boundary,
    on_turn_start, seat_may_act,
};

use serde::{Deserialize, Serialize};

use crate::core::{Move, SeatId, SeatMap};
use crate::def::{ActionClass, EligibilityWindow};

/// Runtime state of the active turn-order policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TurnFlowState {
    /// Active seat advances by one each turn boundary.
    RoundRobin,
    /// Position in the declared seat sequence.
    FixedOrder { index: usize },
    /// Buffered submissions, one slot per seat; resolution happens in
    /// seat order once every slot is filled.
    Simultaneous { submitted: Vec<Option<Move>> },
    /// Card-driven first/second-eligible activation.
    CardDriven(CardFlowState),
}

/// A queued make-eligible / make-ineligible override.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EligibilityOverride {
    /// The affected seat.
    pub seat: SeatId,
    /// True to make eligible, false to make ineligible.
    pub make_eligible: bool,
    /// When the override applies and expires.
    pub window: EligibilityWindow,
    /// True while a `NextCard` override waits for its card boundary.
    pub pending: bool,
}

/// Per-card runtime of the card-driven policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardFlowState {
    /// Current eligibility per seat.
    pub eligible: SeatMap<bool>,
    /// Seats that have acted on the current card.
    pub acted: SeatMap<bool>,
    /// Seats that have passed on the current card.
    pub passed: SeatMap<bool>,
    /// The seat that acted first on the current card, once one has.
    pub first_actor: Option<SeatId>,
    /// The first actor's action class, keying the option matrix.
    pub first_class: Option<ActionClass>,
    /// Non-pass moves taken on the current card (a card supports at
    /// most two).
    pub non_pass_count: u32,
    /// Queued eligibility overrides, in queue order.
    pub overrides: Vec<EligibilityOverride>,
    /// Seats holding a one-shot free-operation grant.
    pub free_grants: Vec<SeatId>,
    /// The most recent pivotal action played on this card, for
    /// interrupt precedence.
    pub last_pivotal: Option<String>,
    /// 0-based round counter; a round ends at a coup handoff.
    pub round: u32,
    /// 0-based cycle counter; a cycle ends when the deck runs empty.
    pub cycle: u32,
}

impl CardFlowState {
    /// Fresh per-card state with every seat eligible.
    #[must_use]
    pub fn new(seat_count: usize) -> Self {
        Self {
            eligible: SeatMap::with_value(seat_count, true),
            acted: SeatMap::with_value(seat_count, false),
            passed: SeatMap::with_value(seat_count, false),
            first_actor: None,
            first_class: None,
            non_pass_count: 0,
            overrides: Vec::new(),
            free_grants: Vec::new(),
            last_pivotal: None,
            round: 0,
            cycle: 0,
        }
    }

    /// True if a free-operation grant is pending for the seat.
    #[must_use]
    pub fn has_free_grant(&self, seat: SeatId) -> bool {
        self.free_grants.contains(&seat)
    }

    /// Consume one free-operation grant for the seat. Returns false if
    /// none was pending.
    pub fn take_free_grant(&mut self, seat: SeatId) -> bool {
        match self.free_grants.iter().position(|&s| s == seat) {
            Some(pos) => {
                self.free_grants.remove(pos);
                true
            }
            None => false,
        }
    }
}

impl TurnFlowState {
    /// Initial flow state for a policy and seat count.
    #[must_use]
    pub fn initial(turn_order: &crate::def::TurnOrderDef, seat_count: usize) -> Self {
        match turn_order {
            crate::def::TurnOrderDef::RoundRobin => TurnFlowState::RoundRobin,
            crate::def::TurnOrderDef::FixedOrder(_) => TurnFlowState::FixedOrder { index: 0 },
            crate::def::TurnOrderDef::Simultaneous => TurnFlowState::Simultaneous {
                submitted: vec![None; seat_count],
            },
            crate::def::TurnOrderDef::CardDriven(_) => {
                TurnFlowState::CardDriven(CardFlowState::new(seat_count))
            }
        }
    }
}
