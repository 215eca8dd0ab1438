//! Turn-order policy definitions.
//!
//! The four policies are mutually exclusive runtime variants. The
//! card-driven variant models "first eligible acts, second eligible may
//! act, then eligibility reshuffles" sequencing: an option matrix
//! constrains the second actor's action class by the first actor's,
//! eligibility overrides queue with expiry windows, and card-lifecycle
//! slots rotate at card boundaries.

use serde::{Deserialize, Serialize};

use crate::core::{Scalar, SeatId};

use super::action::ActionClass;

/// Which turn-order policy the game runs under.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TurnOrderDef {
    /// Active seat advances by one at each turn boundary.
    RoundRobin,
    /// Explicit seat sequence, repeated.
    FixedOrder(Vec<SeatId>),
    /// All seats submit independently; moves buffer until every seat
    /// has submitted, then resolve in seat order.
    Simultaneous,
    /// Card-driven first/second-eligible activation.
    CardDriven(CardDrivenDef),
}

/// One row of the option matrix: after a first actor of class `first`,
/// the second actor may only choose classes in `second` (plus pass,
/// which is always available).
///
/// `LimitedOperation` never appears in a row; it folds to `Operation`
/// on both sides of the lookup.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionMatrixRow {
    /// The first actor's class.
    pub first: ActionClass,
    /// Classes open to the second actor.
    pub second: Vec<ActionClass>,
}

impl OptionMatrixRow {
    /// Create a row.
    #[must_use]
    pub fn new(first: ActionClass, second: Vec<ActionClass>) -> Self {
        Self { first, second }
    }

    /// True if the row admits `class` for the second actor.
    #[must_use]
    pub fn allows(&self, class: ActionClass) -> bool {
        let class = class.matrix_class();
        class == ActionClass::Pass || self.second.iter().any(|c| c.matrix_class() == class)
    }
}

/// Expiry window for a queued eligibility override.
///
/// Boundaries, from innermost to outermost: a **card** ends when the
/// flow advances past a card (both actors done or everyone passed); a
/// **round** ends when a coup card is handed off to the leader slot; a
/// **cycle** ends when the deck slot runs empty.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EligibilityWindow {
    /// Applies immediately, expires at the next card boundary.
    ThisCard,
    /// Takes effect at the next card boundary, expires at the one
    /// after.
    NextCard,
    /// Applies immediately, expires at the next coup handoff.
    ThisRound,
    /// Applies immediately, expires when the deck runs empty.
    ThisCycle,
}

/// A fixed resource bump credited to a seat that passes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PassReward {
    /// Seats the reward applies to; empty means every seat.
    pub seats: Vec<SeatId>,
    /// The per-seat variable credited.
    pub var: String,
    /// Amount credited.
    pub amount: Scalar,
}

impl PassReward {
    /// A reward credited to every passing seat.
    pub fn for_all(var: impl Into<String>, amount: Scalar) -> Self {
        Self {
            seats: Vec::new(),
            var: var.into(),
            amount,
        }
    }

    /// True if the reward applies to `seat`.
    #[must_use]
    pub fn applies_to(&self, seat: SeatId) -> bool {
        self.seats.is_empty() || self.seats.contains(&seat)
    }
}

/// A per-round cap on a scalar action parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamCap {
    /// The capped action.
    pub action: String,
    /// The capped scalar parameter.
    pub param: String,
    /// Inclusive maximum while the restriction is active.
    pub max: Scalar,
}

/// Monsoon-style round restrictions, active while a declared marker is
/// in a declared state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonsoonDef {
    /// The marker that gates the restriction.
    pub marker: String,
    /// The marker state in which the restriction is active.
    pub state: String,
    /// Actions forbidden outright while active.
    pub forbidden_actions: Vec<String>,
    /// Scalar-parameter caps while active.
    pub param_caps: Vec<ParamCap>,
    /// If true, pivotal actions are blocked while active unless the
    /// override variable is nonzero.
    pub block_pivotal: bool,
    /// Global variable acting as the pivotal override token.
    pub override_var: Option<String>,
}

/// Zone names of the card-lifecycle slots.
///
/// Every slot is optional at runtime: a lifecycle step whose zone is
/// absent from the state silently no-ops.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardLifecycleDef {
    /// Face-down draw pile.
    pub deck: String,
    /// The revealed upcoming card.
    pub lookahead: String,
    /// The card currently in play.
    pub played: String,
    /// Slot a coup card is routed to on handoff.
    pub leader: String,
    /// Token type tag identifying coup cards.
    pub coup_type: String,
}

/// The card-driven turn-order policy.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CardDrivenDef {
    /// Baseline seat precedence for "first eligible acts".
    pub seat_order: Vec<SeatId>,
    /// Rows keyed by the first actor's class. A missing row leaves the
    /// second actor unconstrained.
    pub option_matrix: Vec<OptionMatrixRow>,
    /// Rewards credited when a seat passes.
    pub pass_rewards: Vec<PassReward>,
    /// Card-lifecycle slot names.
    pub lifecycle: CardLifecycleDef,
    /// Optional monsoon restrictions.
    pub monsoon: Option<MonsoonDef>,
}

impl CardDrivenDef {
    /// The matrix row for a first-actor class, if declared.
    #[must_use]
    pub fn matrix_row(&self, first: ActionClass) -> Option<&OptionMatrixRow> {
        let first = first.matrix_class();
        self.option_matrix
            .iter()
            .find(|row| row.first.matrix_class() == first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_row_allows_pass() {
        let row = OptionMatrixRow::new(ActionClass::Event, vec![ActionClass::Operation]);
        assert!(row.allows(ActionClass::Pass));
        assert!(row.allows(ActionClass::Operation));
        assert!(!row.allows(ActionClass::Event));
    }

    #[test]
    fn test_matrix_folds_limited_operation() {
        let row = OptionMatrixRow::new(
            ActionClass::Event,
            vec![
                ActionClass::Operation,
                ActionClass::OperationPlusSpecialActivity,
            ],
        );
        assert!(row.allows(ActionClass::LimitedOperation));
        assert!(row.allows(ActionClass::OperationPlusSpecialActivity));
    }

    #[test]
    fn test_matrix_lookup_folds_first_class() {
        let def = CardDrivenDef {
            seat_order: vec![SeatId::new(0), SeatId::new(1)],
            option_matrix: vec![OptionMatrixRow::new(
                ActionClass::Operation,
                vec![ActionClass::LimitedOperation],
            )],
            pass_rewards: Vec::new(),
            lifecycle: CardLifecycleDef {
                deck: "deck".into(),
                lookahead: "lookahead".into(),
                played: "played".into(),
                leader: "leader".into(),
                coup_type: "coup".into(),
            },
            monsoon: None,
        };
        assert!(def.matrix_row(ActionClass::LimitedOperation).is_some());
    }

    #[test]
    fn test_pass_reward_seat_filter() {
        let all = PassReward::for_all("resources", 3);
        assert!(all.applies_to(SeatId::new(0)));
        assert!(all.applies_to(SeatId::new(3)));

        let some = PassReward {
            seats: vec![SeatId::new(1)],
            var: "resources".into(),
            amount: 1,
        };
        assert!(some.applies_to(SeatId::new(1)));
        assert!(!some.applies_to(SeatId::new(0)));
    }
}
