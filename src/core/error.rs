//! Closed error categories with structured context.
//!
//! Every failure the engine can report belongs to one of the named
//! categories below; there is no free-text-only error. Callers are
//! expected to match on variants:
//!
//! - `EngineError::IllegalMove` and the effect-runtime variants are
//!   recoverable by the caller (a legality prober or replay harness
//!   catches them and reacts).
//! - `EngineError::InternalInvariant` marks a malformed call the engine
//!   refuses to evaluate (e.g. execution mode combined with probe
//!   authority); treat it as a bug in the caller, not a game outcome.
//! - Budget and trigger-depth exhaustion are deliberately fatal to the
//!   enclosing move application so looping definitions fail loudly and
//!   deterministically instead of hanging.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::def::ActionClass;

use super::entity::SeatId;
use super::value::Scalar;

/// Why a move is illegal.
///
/// This is the closed reason set shared by `legal_choices` (which
/// reports it as data) and `apply_move` (which raises it inside
/// `EngineError::IllegalMove`). The two surfaces must agree for
/// identical inputs.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum IllegalMoveReason {
    /// The action id is not declared in the definition.
    #[error("unknown action `{action}`")]
    UnknownAction { action: String },

    /// The action is restricted to a phase the game is not in.
    #[error("action `{action}` not legal in phase `{phase}`")]
    PhaseMismatch { action: String, phase: String },

    /// The acting seat is not the seat the turn-flow expects.
    #[error("{seat} cannot act now")]
    NotActiveSeat { seat: SeatId },

    /// The per-turn usage limit for the action is exhausted.
    #[error("action `{action}` already used {limit} time(s) this turn")]
    ActionLimitExceeded { action: String, limit: u32 },

    /// The move's action class is outside the option-matrix constraint.
    #[error("action class {class:?} not allowed by the current option matrix")]
    ClassNotAllowed { class: ActionClass },

    /// A monsoon-style restriction forbids the action (or caps a
    /// parameter below the supplied value) for this round.
    #[error("action `{action}` restricted this round")]
    ActionForbiddenThisRound { action: String },

    /// A pivotal action is blocked: no override token and/or its
    /// declared pre-action window is not open.
    #[error("pivotal action `{action}` is blocked")]
    PivotalBlocked { action: String },

    /// A pivotal action was cancelled by a higher-precedence interrupt.
    #[error("action `{action}` was cancelled by `{by}`")]
    CancelledByInterrupt { action: String, by: String },

    /// The move was flagged as a granted free action but no grant is
    /// pending for the seat.
    #[error("no free-operation grant pending for {seat}")]
    FreeActionNotGranted { seat: SeatId },

    /// No operation profile's applicability condition holds.
    #[error("no applicable operation profile for `{action}`")]
    ProfileNotApplicable { action: String },

    /// The selected profile's legality condition fails.
    #[error("operation profile legality failed for `{action}`")]
    ProfileLegalityFailed { action: String },

    /// The selected profile's cost cannot be paid.
    #[error("cost validation failed for `{action}`: needs {required} of `{var}`, has {available}")]
    ProfileCostValidationFailed {
        action: String,
        var: String,
        required: Scalar,
        available: Scalar,
    },

    /// A supplied decision was produced by the wrong authority.
    #[error("choice `{choice}` must be decided by {expected}")]
    ChoiceAuthorityMismatch { choice: String, expected: SeatId },

    /// A supplied decision value has the wrong shape for the choice.
    #[error("invalid selection for choice `{choice}`: got {got}")]
    InvalidSelection { choice: String, got: String },

    /// A supplied decision value is outside the choice's option domain.
    #[error("selection for choice `{choice}` is outside the options domain")]
    OutsideOptionsDomain { choice: String },
}

/// How a choice decision failed strict validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceFailure {
    /// The decision was supplied by a different authority than the
    /// seat allowed to decide.
    AuthorityMismatch { expected: SeatId },
    /// No decision was supplied where execution mode requires one.
    Undecided,
    /// The supplied value has the wrong shape for the choice.
    InvalidSelection { got: String },
    /// The supplied value is well-shaped but not among the options
    /// computed from current state.
    OutsideOptionsDomain,
}

impl std::fmt::Display for ChoiceFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChoiceFailure::AuthorityMismatch { expected } => {
                write!(f, "must be decided by {expected}")
            }
            ChoiceFailure::Undecided => write!(f, "no decision supplied"),
            ChoiceFailure::InvalidSelection { got } => {
                write!(f, "invalid selection (got {got})")
            }
            ChoiceFailure::OutsideOptionsDomain => write!(f, "outside options domain"),
        }
    }
}

/// Engine failure.
///
/// All variants except `InternalInvariant` are typed, recoverable-by-
/// the-caller failures.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum EngineError {
    /// A move was rejected; the reason matches what `legal_choices`
    /// reports for the same input.
    #[error("illegal move: {0}")]
    IllegalMove(IllegalMoveReason),

    /// A variable write was rejected before mutation because the new
    /// value is outside the variable's declared range.
    #[error("variable `{var}` validation failed: {value} outside [{min}, {max}]")]
    VariableValidation {
        var: String,
        value: Scalar,
        min: Scalar,
        max: Scalar,
    },

    /// A binding was referenced outside the scope that introduced it.
    #[error("missing binding `{name}`")]
    MissingBinding { name: String },

    /// Choice runtime validation failed under strict ownership
    /// enforcement (wrong authority, missing decision in execution,
    /// bad value).
    #[error("choice `{choice}` runtime validation failed: {failure}")]
    ChoiceValidation {
        choice: String,
        failure: ChoiceFailure,
    },

    /// Probe-mode authority mismatch during discovery. Distinguished
    /// from `ChoiceValidation` so discovery tooling can tell "not yet
    /// decided" from "decided by someone else".
    #[error("choice `{choice}` probe authority mismatch (expected {expected})")]
    ChoiceProbeAuthorityMismatch { choice: String, expected: SeatId },

    /// The per-call operation budget was exhausted.
    #[error("effect budget exceeded at `{effect_kind}` (max {max_ops} operations)")]
    BudgetExceeded {
        effect_kind: String,
        max_ops: u32,
    },

    /// Recursive trigger dispatch exceeded the configured depth.
    #[error("max trigger depth exceeded (max {max_depth})")]
    TriggerDepthExceeded { max_depth: u32 },

    /// A turn-flow policy referenced a seat outside the seat table.
    #[error("{seat} is not mapped by the turn-order policy")]
    UnmappedSeat { seat: SeatId },

    /// A terminal rule needs scoring configuration the definition
    /// does not provide.
    #[error("missing scoring configuration: {what}")]
    MissingScoringConfig { what: String },

    /// A state snapshot failed to encode or decode.
    #[error("snapshot serialization failed: {0}")]
    Serialization(String),

    /// The game definition failed engine-side validation.
    #[error("definition validation failed: {0}")]
    Validation(String),

    /// Malformed call the engine refuses to evaluate. A bug in the
    /// caller, not a recoverable game condition.
    #[error("internal invariant violation: {0}")]
    InternalInvariant(String),
}

impl EngineError {
    /// Map an effect-runtime failure to the illegal-move reason that
    /// `legal_choices` reports for the same input.
    ///
    /// `apply_move` and `legal_choices` both route interpreter errors
    /// through this, which is what makes their reason codes agree.
    #[must_use]
    pub fn as_illegal_reason(&self) -> Option<IllegalMoveReason> {
        match self {
            EngineError::IllegalMove(reason) => Some(reason.clone()),
            EngineError::ChoiceValidation { choice, failure } => match failure {
                ChoiceFailure::AuthorityMismatch { expected } => {
                    Some(IllegalMoveReason::ChoiceAuthorityMismatch {
                        choice: choice.clone(),
                        expected: *expected,
                    })
                }
                ChoiceFailure::InvalidSelection { got } => {
                    Some(IllegalMoveReason::InvalidSelection {
                        choice: choice.clone(),
                        got: got.clone(),
                    })
                }
                ChoiceFailure::OutsideOptionsDomain => {
                    Some(IllegalMoveReason::OutsideOptionsDomain {
                        choice: choice.clone(),
                    })
                }
                ChoiceFailure::Undecided => None,
            },
            _ => None,
        }
    }

    /// True if this failure marks a caller bug rather than a game
    /// condition.
    #[must_use]
    pub fn is_internal(&self) -> bool {
        matches!(self, EngineError::InternalInvariant(_))
    }
}

/// Convenience alias used throughout the crate.
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_illegal_reason_round_trip() {
        let reason = IllegalMoveReason::PhaseMismatch {
            action: "rally".into(),
            phase: "combat".into(),
        };
        let err = EngineError::IllegalMove(reason.clone());
        assert_eq!(err.as_illegal_reason(), Some(reason));
    }

    #[test]
    fn test_choice_failures_map_to_reasons() {
        let err = EngineError::ChoiceValidation {
            choice: "target".into(),
            failure: ChoiceFailure::AuthorityMismatch {
                expected: SeatId::new(2),
            },
        };
        assert_eq!(
            err.as_illegal_reason(),
            Some(IllegalMoveReason::ChoiceAuthorityMismatch {
                choice: "target".into(),
                expected: SeatId::new(2),
            })
        );

        let err = EngineError::ChoiceValidation {
            choice: "target".into(),
            failure: ChoiceFailure::OutsideOptionsDomain,
        };
        assert_eq!(
            err.as_illegal_reason(),
            Some(IllegalMoveReason::OutsideOptionsDomain {
                choice: "target".into(),
            })
        );

        // An undecided choice is "pending", not an illegal reason.
        let err = EngineError::ChoiceValidation {
            choice: "target".into(),
            failure: ChoiceFailure::Undecided,
        };
        assert_eq!(err.as_illegal_reason(), None);
    }

    #[test]
    fn test_budget_error_has_no_illegal_mapping() {
        let err = EngineError::BudgetExceeded {
            effect_kind: "repeat".into(),
            max_ops: 256,
        };
        assert_eq!(err.as_illegal_reason(), None);
        assert!(!err.is_internal());
    }

    #[test]
    fn test_internal_invariant_flag() {
        let err = EngineError::InternalInvariant("execution mode with probe authority".into());
        assert!(err.is_internal());
    }

    #[test]
    fn test_error_display() {
        let err = EngineError::BudgetExceeded {
            effect_kind: "forEach".into(),
            max_ops: 128,
        };
        assert_eq!(
            format!("{}", err),
            "effect budget exceeded at `forEach` (max 128 operations)"
        );
    }

    #[test]
    fn test_error_serialization() {
        let err = EngineError::TriggerDepthExceeded { max_depth: 8 };
        let json = serde_json::to_string(&err).unwrap();
        let deserialized: EngineError = serde_json::from_str(&json).unwrap();
        assert_eq!(err, deserialized);
    }
}
