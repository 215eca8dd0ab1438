//! Value expression grammar.
//!
//! `ValueExpr` is the closed tree of scalar-producing expressions the
//! interpreter evaluates against live state. Alongside it live the
//! reference forms (`SeatRef`, `ZoneRef`, `TokenRef`) that name the
//! seat/zone/token an effect operates on, resolvable through move
//! parameters and scoped bindings.
//!
//! The grammar is a closed tagged union; every dispatch site matches
//! exhaustively so adding a variant forces every site to be revisited.

use serde::{Deserialize, Serialize};

use crate::core::{Scalar, SeatId};

/// Names a seat in an effect or condition.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeatRef {
    /// The seat whose move is being applied.
    Active,
    /// A fixed seat.
    Seat(SeatId),
    /// A seat bound by an enclosing `Let`/loop/choice.
    Binding(String),
    /// A seat supplied as a move parameter.
    Param(String),
}

/// Names a zone instance in an effect or condition.
///
/// `Named` refers to a shared zone by its declared name, or to the
/// acting seat's instance of a per-seat zone. `OwnedBy` selects a
/// specific seat's instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneRef {
    /// Declared zone name (acting seat's instance if per-seat).
    Named(String),
    /// A specific seat's instance of a per-seat zone.
    OwnedBy { zone: String, seat: SeatRef },
    /// A zone bound by an enclosing construct.
    Binding(String),
    /// A zone supplied as a move parameter.
    Param(String),
}

/// Names a token in an effect.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TokenRef {
    /// A token bound by an enclosing construct.
    Binding(String),
    /// A token supplied as a move parameter.
    Param(String),
}

/// A scalar-producing expression.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValueExpr {
    /// Literal scalar.
    Const(Scalar),
    /// A global variable.
    Var(String),
    /// A per-seat variable.
    SeatVar { seat: SeatRef, var: String },
    /// A zone-scoped variable.
    ZoneVar { zone: ZoneRef, var: String },
    /// A binding introduced by `Let`, a loop iterator, or a choice.
    /// Fails with a missing-binding error if the binding is a
    /// non-scalar value.
    Binding(String),
    /// A scalar move parameter.
    Param(String),
    /// Number of tokens in a zone.
    ZoneCount(ZoneRef),
    /// A token property.
    TokenProp { token: TokenRef, prop: String },
    /// Sum of two expressions.
    Add(Box<ValueExpr>, Box<ValueExpr>),
    /// Difference of two expressions.
    Sub(Box<ValueExpr>, Box<ValueExpr>),
    /// Product of two expressions.
    Mul(Box<ValueExpr>, Box<ValueExpr>),
    /// Smaller of two expressions.
    Min(Box<ValueExpr>, Box<ValueExpr>),
    /// Larger of two expressions.
    Max(Box<ValueExpr>, Box<ValueExpr>),
}

impl ValueExpr {
    /// Literal shorthand.
    #[must_use]
    pub fn lit(v: Scalar) -> Self {
        ValueExpr::Const(v)
    }

    /// Global variable shorthand.
    pub fn var(name: impl Into<String>) -> Self {
        ValueExpr::Var(name.into())
    }

    /// Active seat variable shorthand.
    pub fn seat_var(name: impl Into<String>) -> Self {
        ValueExpr::SeatVar {
            seat: SeatRef::Active,
            var: name.into(),
        }
    }

    /// `self + other` shorthand.
    #[must_use]
    pub fn plus(self, other: ValueExpr) -> Self {
        ValueExpr::Add(Box::new(self), Box::new(other))
    }

    /// `self - other` shorthand.
    #[must_use]
    pub fn minus(self, other: ValueExpr) -> Self {
        ValueExpr::Sub(Box::new(self), Box::new(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shorthands() {
        let expr = ValueExpr::var("aid").plus(ValueExpr::lit(3));
        match expr {
            ValueExpr::Add(left, right) => {
                assert_eq!(*left, ValueExpr::Var("aid".into()));
                assert_eq!(*right, ValueExpr::Const(3));
            }
            _ => panic!("Expected Add"),
        }
    }

    #[test]
    fn test_serialization() {
        let expr = ValueExpr::Min(
            Box::new(ValueExpr::seat_var("resources")),
            Box::new(ValueExpr::ZoneCount(ZoneRef::Named("available".into()))),
        );
        let json = serde_json::to_string(&expr).unwrap();
        let deserialized: ValueExpr = serde_json::from_str(&json).unwrap();
        assert_eq!(expr, deserialized);
    }
}
