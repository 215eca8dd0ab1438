//! Choice-authority protocol types.
//!
//! Two independent axes govern how a `ChooseOne`/`ChooseN` effect is
//! evaluated:
//!
//! - **Mode**: `Discovery` enumerates pending choices for an incomplete
//!   move; `Execution` commits a move for real.
//! - **Authority check**: `Strict` requires the supplied decision to
//!   have been produced by the seat allowed to decide; `Probe` is used
//!   internally to ask whether a choice *would* be legal without
//!   asserting who supplied it.
//!
//! The four combinations yield distinct outcomes:
//!
//! | mode      | check  | authority mismatch result                  |
//! |-----------|--------|--------------------------------------------|
//! | Execution | Strict | `ChoiceValidation` error                   |
//! | Discovery | Strict | `ChoiceValidation` error                   |
//! | Discovery | Probe  | `ChoiceProbeAuthorityMismatch` error       |
//! | Execution | Probe  | rejected at entry: `InternalInvariant`     |
//!
//! The last row must never be constructed by any caller; the
//! interpreter refuses it before evaluating anything.

use serde::{Deserialize, Serialize};

use crate::core::{ParamValue, SeatId};

/// Evaluation mode for choice effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChoiceMode {
    /// Enumerating pending choices for an incomplete move; running out
    /// of supplied decisions halts with a pending outcome.
    Discovery,
    /// Committing a move; every choice must have a decision.
    Execution,
}

/// Ownership-enforcement axis for choice effects.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthorityCheck {
    /// The decision must come from the seat allowed to decide.
    Strict,
    /// Internal legality probing; mismatches are reported with the
    /// distinguished probe error so tooling can tell "not yet decided"
    /// from "decided by someone else".
    Probe,
}

/// A decision value supplied with a move, consumed in order by the
/// choice effects the move's effect tree evaluates.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// The choice id this decision answers.
    pub choice: String,
    /// The selected value (a `List` for `ChooseN`).
    pub value: ParamValue,
    /// The authority that produced the decision.
    pub decided_by: SeatId,
}

impl Decision {
    /// Create a decision.
    pub fn new(choice: impl Into<String>, value: ParamValue, decided_by: SeatId) -> Self {
        Self {
            choice: choice.into(),
            value,
            decided_by,
        }
    }
}

/// A choice the interpreter stopped at during discovery.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingChoice {
    /// The choice id.
    pub choice: String,
    /// The seat allowed to decide.
    pub chooser: SeatId,
    /// The option domain, computed freshly from current state.
    pub options: Vec<ParamValue>,
    /// How many distinct options must be selected (1 for `ChooseOne`).
    pub count: usize,
}

/// Result of running an effect sequence.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EffectOutcome {
    /// The sequence ran to completion.
    Done,
    /// Discovery mode ran out of supplied decisions at this choice.
    /// The state produced alongside this outcome is a partial
    /// evaluation and must be discarded by the caller.
    Pending(PendingChoice),
}

impl EffectOutcome {
    /// True if the sequence completed.
    #[must_use]
    pub fn is_done(&self) -> bool {
        matches!(self, EffectOutcome::Done)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decision() {
        let d = Decision::new("target", ParamValue::Scalar(2), SeatId::new(1));
        assert_eq!(d.choice, "target");
        assert_eq!(d.decided_by, SeatId::new(1));
    }

    #[test]
    fn test_outcome() {
        assert!(EffectOutcome::Done.is_done());
        let pending = EffectOutcome::Pending(PendingChoice {
            choice: "target".into(),
            chooser: SeatId::new(0),
            options: vec![ParamValue::Scalar(1)],
            count: 1,
        });
        assert!(!pending.is_done());
    }

    #[test]
    fn test_serialization() {
        let pending = PendingChoice {
            choice: "zone".into(),
            chooser: SeatId::new(2),
            options: vec![ParamValue::Zone("delta".into())],
            count: 1,
        };
        let json = serde_json::to_string(&pending).unwrap();
        let deserialized: PendingChoice = serde_json::from_str(&json).unwrap();
        assert_eq!(pending, deserialized);
    }
}
