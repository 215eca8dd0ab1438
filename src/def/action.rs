//! Action definitions and operation profiles.

use serde::{Deserialize, Serialize};

use crate::core::Scalar;
use crate::effects::{Condition, Effect, VarScope};

/// The class of an action, consumed by card-driven option matrices.
///
/// `LimitedOperation` is an `Operation` with extra constraints (e.g. a
/// capped parameter); anywhere an option matrix allows operations, a
/// limited operation qualifies too.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionClass {
    /// A full operation.
    Operation,
    /// A constrained operation; folds to `Operation` for matrix lookup.
    LimitedOperation,
    /// An operation combined with a special activity.
    OperationPlusSpecialActivity,
    /// An explicit pass.
    Pass,
    /// An event action (playing the current card for its event).
    Event,
    /// A pivotal interrupt played outside the normal sequence.
    Pivotal,
}

impl ActionClass {
    /// The class used for option-matrix lookup.
    #[must_use]
    pub fn matrix_class(self) -> ActionClass {
        match self {
            ActionClass::LimitedOperation => ActionClass::Operation,
            other => other,
        }
    }
}

/// The kind of value an action parameter carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ParamKind {
    /// A scalar.
    Scalar,
    /// A token id.
    Token,
    /// A zone instance id.
    Zone,
    /// A seat id.
    Seat,
}

/// A declared action parameter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamDef {
    /// Parameter name.
    pub name: String,
    /// Value kind.
    pub kind: ParamKind,
}

impl ParamDef {
    /// Create a parameter.
    pub fn new(name: impl Into<String>, kind: ParamKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// A declared cost: a variable that must hold at least `amount` before
/// the profile executes, debited as part of validation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostSpec {
    /// The variable table holding the cost pool.
    pub scope: VarScope,
    /// The pool variable.
    pub var: String,
    /// Required amount, evaluated against live state.
    pub amount: crate::effects::ValueExpr,
}

/// One way an action can execute.
///
/// An action with several profiles must declare `applicability` on all
/// of them; the unique profile whose applicability holds is selected.
/// `legality` then gates the move, `cost` is validated and debited, and
/// `effects` run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OperationProfile {
    /// Selects this profile (required when an action has several).
    pub applicability: Option<Condition>,
    /// Must hold for the move to be legal.
    pub legality: Option<Condition>,
    /// Resource cost validated and debited before effects run.
    pub cost: Option<CostSpec>,
    /// The effect sequence.
    pub effects: Vec<Effect>,
    /// If true, running out of affordable sub-steps mid-sequence is
    /// permitted; otherwise the whole profile must be affordable up
    /// front.
    pub partial_execution: bool,
}

impl OperationProfile {
    /// Create an empty profile.
    #[must_use]
    pub fn new() -> Self {
        Self {
            applicability: None,
            legality: None,
            cost: None,
            effects: Vec::new(),
            partial_execution: false,
        }
    }

    /// Set the applicability condition (builder pattern).
    #[must_use]
    pub fn with_applicability(mut self, condition: Condition) -> Self {
        self.applicability = Some(condition);
        self
    }

    /// Set the legality condition (builder pattern).
    #[must_use]
    pub fn with_legality(mut self, condition: Condition) -> Self {
        self.legality = Some(condition);
        self
    }

    /// Set the cost (builder pattern).
    #[must_use]
    pub fn with_cost(mut self, cost: CostSpec) -> Self {
        self.cost = Some(cost);
        self
    }

    /// Add an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

impl Default for OperationProfile {
    fn default() -> Self {
        Self::new()
    }
}

/// Declaration of pivotal behavior for a `Pivotal`-class action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PivotalDef {
    /// Precondition that opens the pivotal window (checked in addition
    /// to the profile's own legality).
    pub precondition: Condition,
    /// Pivotal actions that cancel this one when played in response,
    /// in precedence order.
    pub cancelled_by: Vec<String>,
}

/// A declared action.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ActionDef {
    /// Action name.
    pub name: String,
    /// Class, consumed by option matrices and pivotal gating.
    pub class: ActionClass,
    /// Declared parameters, in supply order.
    pub params: Vec<ParamDef>,
    /// Phase restriction (`None` = any phase).
    pub phase: Option<String>,
    /// Per-turn usage limit (`None` = unlimited).
    pub limit_per_turn: Option<u32>,
    /// Pivotal declaration (required iff `class` is `Pivotal`).
    pub pivotal: Option<PivotalDef>,
    /// Cap on a named scalar parameter when the action is taken as a
    /// limited operation.
    pub limited_param_cap: Option<(String, Scalar)>,
    /// Execution profiles. An empty list means the action has no
    /// effects (a bare pass).
    pub profiles: Vec<OperationProfile>,
}

impl ActionDef {
    /// Create an action with no parameters and no profiles.
    pub fn new(name: impl Into<String>, class: ActionClass) -> Self {
        Self {
            name: name.into(),
            class,
            params: Vec::new(),
            phase: None,
            limit_per_turn: None,
            pivotal: None,
            limited_param_cap: None,
            profiles: Vec::new(),
        }
    }

    /// Add a parameter (builder pattern).
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, kind: ParamKind) -> Self {
        self.params.push(ParamDef::new(name, kind));
        self
    }

    /// Restrict to a phase (builder pattern).
    #[must_use]
    pub fn in_phase(mut self, phase: impl Into<String>) -> Self {
        self.phase = Some(phase.into());
        self
    }

    /// Set the per-turn limit (builder pattern).
    #[must_use]
    pub fn with_limit(mut self, limit: u32) -> Self {
        self.limit_per_turn = Some(limit);
        self
    }

    /// Add a profile (builder pattern).
    #[must_use]
    pub fn with_profile(mut self, profile: OperationProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Look up a declared parameter.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamDef> {
        self.params.iter().find(|p| p.name == name)
    }
}
