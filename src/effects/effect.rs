//! Effect grammar.
//!
//! Effects are the atomic state mutations and control-flow constructs
//! of the rules engine. They compose into trees; evaluation is always
//! depth-first, left-to-right, under the interpreter's operation
//! budget.
//!
//! ## State mutation effects
//!
//! - `SetVar` / `AddVar`: variable writes, range-validated before any
//!   mutation
//! - `TransferVar`: bounded resource transfer, clamped by the declared
//!   ranges of both endpoints (the one write that clamps instead of
//!   rejecting; the clamp is reported in the trace)
//! - `MoveToken` / `CreateToken` / `DestroyToken` / `SetTokenProp`
//! - `SetMarker` / `ShiftMarker`: named marker state changes
//! - `Roll`: a deterministic RNG draw bound for the body
//! - `EmitEvent`: queue a custom event for trigger dispatch
//!
//! ## Control flow
//!
//! - `If`, `Repeat` (bounded), `ForEachTokenIn`, `RemoveByPriority`,
//!   `Let`, `ChooseOne`, `ChooseN`
//!
//! Bindings introduced by `Let`, loop iterators, rolls, and choices are
//! visible only inside that construct's body and never leak to sibling
//! effects.

use serde::{Deserialize, Serialize};

use crate::core::Scalar;

use super::condition::Condition;
use super::value::{SeatRef, TokenRef, ValueExpr, ZoneRef};

/// Which variable table a variable effect targets.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum VarScope {
    /// Global variable table.
    Global,
    /// A seat's variable table.
    Seat(SeatRef),
    /// A zone instance's variable table.
    Zone(ZoneRef),
}

/// Option domain for a choice effect, computed freshly from current
/// state when the choice is evaluated.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceOptions {
    /// An explicit list of scalar expressions.
    Scalars(Vec<ValueExpr>),
    /// All scalars in an inclusive range.
    Range { min: ValueExpr, max: ValueExpr },
    /// All tokens currently in a zone.
    TokensIn(ZoneRef),
    /// A set of declared zones (acting seat's instances if per-seat).
    Zones(Vec<String>),
    /// All seats in the game.
    Seats,
}

/// One atomic state mutation or control-flow node.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Effect {
    // === Variables ===
    /// Set a variable, validating against its declared range first.
    SetVar {
        scope: VarScope,
        var: String,
        value: ValueExpr,
    },

    /// Add a delta to a variable, validating the result first.
    AddVar {
        scope: VarScope,
        var: String,
        delta: ValueExpr,
    },

    /// Move up to `amount` between two variables, clamping by both
    /// endpoints' declared ranges. The trace reports requested vs.
    /// actual and the headroom that caused any clamping.
    TransferVar {
        from_scope: VarScope,
        from_var: String,
        to_scope: VarScope,
        to_var: String,
        amount: ValueExpr,
    },

    // === Tokens ===
    /// Move a token to a zone (removal + insertion, never a copy).
    MoveToken { token: TokenRef, to: ZoneRef },

    /// Create a token of a declared type in a zone. The new token is
    /// bound for the body only.
    CreateToken {
        token_type: String,
        zone: ZoneRef,
        bind: Option<String>,
        body: Vec<Effect>,
    },

    /// Destroy a token, removing it from play entirely.
    DestroyToken { token: TokenRef },

    /// Set a token property.
    SetTokenProp {
        token: TokenRef,
        prop: String,
        value: ValueExpr,
    },

    // === Markers ===
    /// Set a marker to a declared state.
    SetMarker { marker: String, state: String },

    /// Shift a marker along its declared state list, clamped at the
    /// ends.
    ShiftMarker { marker: String, offset: Scalar },

    // === Randomness ===
    /// Draw a scalar uniformly from an inclusive range and bind it for
    /// the body.
    Roll {
        bind: String,
        min: ValueExpr,
        max: ValueExpr,
        body: Vec<Effect>,
    },

    // === Control flow ===
    /// Execute one branch depending on a condition.
    If {
        condition: Condition,
        then: Vec<Effect>,
        otherwise: Vec<Effect>,
    },

    /// Execute the body a bounded number of times. The optional
    /// binding holds the 0-based iteration index.
    Repeat {
        times: ValueExpr,
        bind: Option<String>,
        body: Vec<Effect>,
    },

    /// Execute the body once per token in a zone (snapshot of the
    /// zone's contents taken before the first iteration).
    ForEachTokenIn {
        zone: ZoneRef,
        bind: String,
        body: Vec<Effect>,
    },

    /// Remove up to `count` tokens from a zone, preferring earlier
    /// entries of the `priority` type list.
    RemoveByPriority {
        zone: ZoneRef,
        count: ValueExpr,
        priority: Vec<String>,
    },

    /// Bind a value for the body.
    Let {
        bind: String,
        value: ValueExpr,
        body: Vec<Effect>,
    },

    // === Choices ===
    /// A single decision by `chooser`, bound for the body. Governed by
    /// the choice-authority protocol.
    ChooseOne {
        choice: String,
        chooser: SeatRef,
        options: ChoiceOptions,
        bind: String,
        body: Vec<Effect>,
    },

    /// `count` distinct decisions by `chooser`, bound as a list for
    /// the body.
    ChooseN {
        choice: String,
        chooser: SeatRef,
        options: ChoiceOptions,
        count: ValueExpr,
        bind: String,
        body: Vec<Effect>,
    },

    // === Card-driven flow ===
    /// Queue an eligibility override for the card-driven policy. All
    /// windows except `NextCard` also apply immediately; expiry happens
    /// at the boundary the window names.
    SetEligibility {
        seat: SeatRef,
        eligible: bool,
        window: crate::def::EligibilityWindow,
    },

    /// Grant a seat a one-shot free operation, spendable outside its
    /// normal activation.
    GrantFreeOperation { seat: SeatRef },

    // === Events ===
    /// Queue a custom event; dispatched recursively after the current
    /// effect sequence completes.
    EmitEvent { name: String, payload: Vec<ValueExpr> },
}

impl Effect {
    /// Short tag naming the effect kind, carried by budget-exceeded
    /// errors and trace entries.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Effect::SetVar { .. } => "setVar",
            Effect::AddVar { .. } => "addVar",
            Effect::TransferVar { .. } => "transferVar",
            Effect::MoveToken { .. } => "moveToken",
            Effect::CreateToken { .. } => "createToken",
            Effect::DestroyToken { .. } => "destroyToken",
            Effect::SetTokenProp { .. } => "setTokenProp",
            Effect::SetMarker { .. } => "setMarker",
            Effect::ShiftMarker { .. } => "shiftMarker",
            Effect::Roll { .. } => "roll",
            Effect::If { .. } => "if",
            Effect::Repeat { .. } => "repeat",
            Effect::ForEachTokenIn { .. } => "forEachTokenIn",
            Effect::RemoveByPriority { .. } => "removeByPriority",
            Effect::Let { .. } => "let",
            Effect::ChooseOne { .. } => "chooseOne",
            Effect::ChooseN { .. } => "chooseN",
            Effect::SetEligibility { .. } => "setEligibility",
            Effect::GrantFreeOperation { .. } => "grantFreeOperation",
            Effect::EmitEvent { .. } => "emitEvent",
        }
    }

    /// Set a global variable (shorthand).
    pub fn set_global(var: impl Into<String>, value: Scalar) -> Self {
        Effect::SetVar {
            scope: VarScope::Global,
            var: var.into(),
            value: ValueExpr::Const(value),
        }
    }

    /// Add to a global variable (shorthand).
    pub fn add_global(var: impl Into<String>, delta: Scalar) -> Self {
        Effect::AddVar {
            scope: VarScope::Global,
            var: var.into(),
            delta: ValueExpr::Const(delta),
        }
    }

    /// Add to the acting seat's variable (shorthand).
    pub fn add_seat_var(var: impl Into<String>, delta: Scalar) -> Self {
        Effect::AddVar {
            scope: VarScope::Seat(SeatRef::Active),
            var: var.into(),
            delta: ValueExpr::Const(delta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(Effect::set_global("x", 1).kind(), "setVar");
        assert_eq!(
            Effect::Repeat {
                times: ValueExpr::Const(3),
                bind: None,
                body: vec![],
            }
            .kind(),
            "repeat"
        );
    }

    #[test]
    fn test_shorthands() {
        match Effect::add_seat_var("resources", 2) {
            Effect::AddVar { scope, var, delta } => {
                assert_eq!(scope, VarScope::Seat(SeatRef::Active));
                assert_eq!(var, "resources");
                assert_eq!(delta, ValueExpr::Const(2));
            }
            _ => panic!("Expected AddVar"),
        }
    }

    #[test]
    fn test_serialization() {
        let effect = Effect::If {
            condition: Condition::var_at_least("support", 5),
            then: vec![Effect::add_global("support", -5)],
            otherwise: vec![],
        };
        let json = serde_json::to_string(&effect).unwrap();
        let deserialized: Effect = serde_json::from_str(&json).unwrap();
        assert_eq!(effect, deserialized);
    }
}
