//! Condition grammar.
//!
//! Closed boolean-expression tree evaluated against live state by the
//! interpreter. Used by conditional effects, operation profile
//! applicability/legality, trigger guards, and terminal rules.

use serde::{Deserialize, Serialize};

use super::value::{ValueExpr, ZoneRef};

/// Comparison operator for scalar conditions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl CmpOp {
    /// Apply the operator to two scalars.
    #[must_use]
    pub fn apply(self, left: i64, right: i64) -> bool {
        match self {
            CmpOp::Eq => left == right,
            CmpOp::Ne => left != right,
            CmpOp::Lt => left < right,
            CmpOp::Le => left <= right,
            CmpOp::Gt => left > right,
            CmpOp::Ge => left >= right,
        }
    }
}

/// A boolean condition over game state.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Condition {
    /// Always true.
    Always,
    /// Always false.
    Never,
    /// Scalar comparison.
    Compare {
        op: CmpOp,
        left: ValueExpr,
        right: ValueExpr,
    },
    /// A marker is in a given state.
    MarkerIs { marker: String, state: String },
    /// The game is in a given phase.
    InPhase(String),
    /// Two zones are adjacent in the spatial graph.
    Adjacent { a: ZoneRef, b: ZoneRef },
    /// Two zones are connected (any path) in the spatial graph.
    Connected { a: ZoneRef, b: ZoneRef },
    /// All sub-conditions hold.
    All(Vec<Condition>),
    /// At least one sub-condition holds.
    Any(Vec<Condition>),
    /// The sub-condition does not hold.
    Not(Box<Condition>),
}

impl Condition {
    /// `left op right` shorthand.
    #[must_use]
    pub fn cmp(op: CmpOp, left: ValueExpr, right: ValueExpr) -> Self {
        Condition::Compare { op, left, right }
    }

    /// `var >= n` shorthand for a global variable.
    pub fn var_at_least(var: impl Into<String>, n: i64) -> Self {
        Condition::Compare {
            op: CmpOp::Ge,
            left: ValueExpr::Var(var.into()),
            right: ValueExpr::Const(n),
        }
    }

    /// Negation shorthand.
    #[must_use]
    pub fn not(self) -> Self {
        Condition::Not(Box::new(self))
    }
}
