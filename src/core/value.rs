//! Scalar values and move parameter values.
//!
//! All variable state uses `i64` scalars. Booleans are 0/1, enum-like
//! values use small integers; definitions give meaning to keys.
//!
//! Move parameters are richer: a parameter can name a token, a zone
//! instance, a seat, a scalar, or a list of any of those. `ParamValue`
//! is the closed union covering that domain; it is also the type of
//! values bound by scoped `Let`/loop/choice constructs in the effect
//! interpreter.

use serde::{Deserialize, Serialize};

use super::entity::{SeatId, TokenId};

/// Scalar state value. All variables hold i64.
pub type Scalar = i64;

/// A resolved move parameter or binding value.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParamValue {
    /// A plain scalar.
    Scalar(Scalar),
    /// A token reference.
    Token(TokenId),
    /// A zone instance id (e.g. `"map:delta"` or `"hand/2"`).
    Zone(String),
    /// A seat reference.
    Seat(SeatId),
    /// A homogeneous or mixed list (chooseN results, multi-target params).
    List(Vec<ParamValue>),
}

impl ParamValue {
    /// Get the scalar value, if this is a scalar.
    #[must_use]
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            ParamValue::Scalar(v) => Some(*v),
            _ => None,
        }
    }

    /// Get the token id, if this is a token.
    #[must_use]
    pub fn as_token(&self) -> Option<TokenId> {
        match self {
            ParamValue::Token(t) => Some(*t),
            _ => None,
        }
    }

    /// Get the zone instance id, if this is a zone.
    #[must_use]
    pub fn as_zone(&self) -> Option<&str> {
        match self {
            ParamValue::Zone(z) => Some(z),
            _ => None,
        }
    }

    /// Get the seat, if this is a seat.
    #[must_use]
    pub fn as_seat(&self) -> Option<SeatId> {
        match self {
            ParamValue::Seat(s) => Some(*s),
            _ => None,
        }
    }

    /// Get the list elements, if this is a list.
    #[must_use]
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// Short tag naming the value's shape, for error messages.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Scalar(_) => "scalar",
            ParamValue::Token(_) => "token",
            ParamValue::Zone(_) => "zone",
            ParamValue::Seat(_) => "seat",
            ParamValue::List(_) => "list",
        }
    }
}

impl From<Scalar> for ParamValue {
    fn from(v: Scalar) -> Self {
        ParamValue::Scalar(v)
    }
}

impl From<TokenId> for ParamValue {
    fn from(t: TokenId) -> Self {
        ParamValue::Token(t)
    }
}

impl From<SeatId> for ParamValue {
    fn from(s: SeatId) -> Self {
        ParamValue::Seat(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accessors() {
        assert_eq!(ParamValue::Scalar(5).as_scalar(), Some(5));
        assert_eq!(ParamValue::Scalar(5).as_token(), None);
        assert_eq!(ParamValue::Token(TokenId(3)).as_token(), Some(TokenId(3)));
        assert_eq!(ParamValue::Zone("map:a".into()).as_zone(), Some("map:a"));
        assert_eq!(ParamValue::Seat(SeatId(1)).as_seat(), Some(SeatId(1)));
    }

    #[test]
    fn test_kind() {
        assert_eq!(ParamValue::Scalar(0).kind(), "scalar");
        assert_eq!(ParamValue::List(vec![]).kind(), "list");
    }

    #[test]
    fn test_serialization() {
        let value = ParamValue::List(vec![
            ParamValue::Scalar(1),
            ParamValue::Token(TokenId(9)),
            ParamValue::Zone("reserve".into()),
        ]);
        let json = serde_json::to_string(&value).unwrap();
        let deserialized: ParamValue = serde_json::from_str(&json).unwrap();
        assert_eq!(value, deserialized);
    }
}
