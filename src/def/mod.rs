//! Validated game definition.
//!
//! The definition is produced by an external compiler/validator that
//! lowers a declarative authoring document. The engine assumes
//! structural validity (declared zones/variables/actions exist, ids are
//! unique, action params are well-formed) and performs only the
//! *runtime* validation that depends on live state, plus the handful of
//! engine-owned checks in [`GameDef::validate`].
//!
//! Definitions are plain data with builder-style constructors so tests
//! and harnesses can assemble them directly.

mod action;
mod turn_order;

pub use action::{
    ActionClass, ActionDef, CostSpec, OperationProfile, ParamDef, ParamKind, PivotalDef,
};
pub use turn_order::{
    CardDrivenDef, CardLifecycleDef, EligibilityWindow, MonsoonDef, OptionMatrixRow, ParamCap,
    PassReward, TurnOrderDef,
};

use serde::{Deserialize, Serialize};

use crate::core::{EngineError, EngineResult, Scalar, SeatId};
use crate::effects::{Condition, Effect};

/// A declared scalar variable with an optional numeric range.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VarDef {
    /// Variable name.
    pub name: String,
    /// Initial value.
    pub default: Scalar,
    /// Inclusive lower bound, if any.
    pub min: Option<Scalar>,
    /// Inclusive upper bound, if any.
    pub max: Option<Scalar>,
}

impl VarDef {
    /// Create an unbounded variable.
    pub fn new(name: impl Into<String>, default: Scalar) -> Self {
        Self {
            name: name.into(),
            default,
            min: None,
            max: None,
        }
    }

    /// Set the inclusive range (builder pattern).
    #[must_use]
    pub fn with_range(mut self, min: Scalar, max: Scalar) -> Self {
        self.min = Some(min);
        self.max = Some(max);
        self
    }

    /// Check a value against the declared range.
    #[must_use]
    pub fn in_range(&self, value: Scalar) -> bool {
        self.min.map_or(true, |m| value >= m) && self.max.map_or(true, |m| value <= m)
    }

    /// Effective bounds for clamping transfers.
    #[must_use]
    pub fn bounds(&self) -> (Scalar, Scalar) {
        (
            self.min.unwrap_or(Scalar::MIN),
            self.max.unwrap_or(Scalar::MAX),
        )
    }
}

/// Who owns a zone's instances.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneOwnership {
    /// One shared instance.
    None,
    /// One instance per seat.
    PerSeat,
}

/// Zone visibility rules.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneVisibility {
    /// Contents visible to all seats.
    Public,
    /// Contents visible only to the owning seat.
    OwnerOnly,
    /// Contents hidden from everyone (face-down deck).
    Hidden,
}

/// Ordering discipline of a zone, determining where newly created or
/// moved tokens are inserted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneOrdering {
    /// Last in, first out: inserts at the front.
    Stack,
    /// First in, first out: inserts at the back.
    Queue,
    /// Order-free: kept sorted by token ordinal for canonical layout.
    Set,
}

/// A declared zone.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneDef {
    /// Zone name.
    pub name: String,
    /// Ownership mode.
    pub owner: ZoneOwnership,
    /// Visibility mode.
    pub visibility: ZoneVisibility,
    /// Insert/remove discipline.
    pub ordering: ZoneOrdering,
}

impl ZoneDef {
    /// Create a shared, public, set-ordered zone.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            owner: ZoneOwnership::None,
            visibility: ZoneVisibility::Public,
            ordering: ZoneOrdering::Set,
        }
    }

    /// Make the zone per-seat (builder pattern).
    #[must_use]
    pub fn per_seat(mut self) -> Self {
        self.owner = ZoneOwnership::PerSeat;
        self
    }

    /// Set visibility to owner-only (builder pattern).
    #[must_use]
    pub fn owner_only(mut self) -> Self {
        self.visibility = ZoneVisibility::OwnerOnly;
        self
    }

    /// Set visibility to hidden (builder pattern).
    #[must_use]
    pub fn hidden(mut self) -> Self {
        self.visibility = ZoneVisibility::Hidden;
        self
    }

    /// Use stack ordering (builder pattern).
    #[must_use]
    pub fn stack(mut self) -> Self {
        self.ordering = ZoneOrdering::Stack;
        self
    }

    /// Use queue ordering (builder pattern).
    #[must_use]
    pub fn queue(mut self) -> Self {
        self.ordering = ZoneOrdering::Queue;
        self
    }
}

/// A declared marker: a name plus an ordered list of state labels.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerDef {
    /// Marker name.
    pub name: String,
    /// Ordered state labels (`ShiftMarker` moves along this list).
    pub states: Vec<String>,
    /// Initial state label.
    pub initial: String,
}

impl MarkerDef {
    /// Create a marker.
    pub fn new(
        name: impl Into<String>,
        states: impl IntoIterator<Item = impl Into<String>>,
        initial: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            states: states.into_iter().map(Into::into).collect(),
            initial: initial.into(),
        }
    }
}

/// A declared token type with default properties.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenTypeDef {
    /// Type tag.
    pub name: String,
    /// Default property bag for new tokens of this type.
    pub props: Vec<(String, Scalar)>,
}

impl TokenTypeDef {
    /// Create a token type with no default properties.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            props: Vec::new(),
        }
    }

    /// Add a default property (builder pattern).
    #[must_use]
    pub fn with_prop(mut self, prop: impl Into<String>, value: Scalar) -> Self {
        self.props.push((prop.into(), value));
        self
    }
}

/// A declared phase. Phases cycle in declaration order; a full cycle is
/// one turn.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhaseDef {
    /// Phase name.
    pub name: String,
}

impl PhaseDef {
    /// Create a phase.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

/// Structural event pattern a trigger matches.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventPattern {
    /// A turn is starting.
    TurnStart,
    /// A turn is ending.
    TurnEnd,
    /// A phase is being entered (`None` matches any phase).
    PhaseEnter(Option<String>),
    /// A phase is being exited (`None` matches any phase).
    PhaseExit(Option<String>),
    /// A custom event by name.
    Custom(String),
}

/// A declared trigger: an event pattern plus an effect sequence.
///
/// Triggers fire in declaration order; each fires once per matching
/// event occurrence per dispatch pass.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerDef {
    /// Trigger id (for traces).
    pub id: String,
    /// The event pattern to match.
    pub on: EventPattern,
    /// Optional guard evaluated against the state the trigger sees.
    pub guard: Option<Condition>,
    /// Effects to execute when fired.
    pub effects: Vec<Effect>,
}

impl TriggerDef {
    /// Create a trigger.
    pub fn new(id: impl Into<String>, on: EventPattern) -> Self {
        Self {
            id: id.into(),
            on,
            guard: None,
            effects: Vec::new(),
        }
    }

    /// Set the guard condition (builder pattern).
    #[must_use]
    pub fn with_guard(mut self, guard: Condition) -> Self {
        self.guard = Some(guard);
        self
    }

    /// Add an effect (builder pattern).
    #[must_use]
    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// What a satisfied terminal rule yields.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResultSpec {
    /// A fixed winning seat.
    Winner(SeatId),
    /// The seat with the highest (or lowest) value of a declared
    /// per-seat variable wins; ties are a draw.
    WinnerByVar { var: String, highest: bool },
    /// A draw.
    Draw,
}

/// A terminal condition: when `condition` holds, the game is over with
/// `result`. Rules are checked in declaration order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TerminalRule {
    /// The condition to check.
    pub condition: Condition,
    /// The result when the condition holds.
    pub result: ResultSpec,
}

/// Engine resource ceilings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineLimits {
    /// Operation budget per top-level interpreter call.
    pub max_ops: u32,
    /// Maximum recursive trigger dispatch depth.
    pub max_trigger_depth: u32,
}

impl Default for EngineLimits {
    fn default() -> Self {
        Self {
            max_ops: 256,
            max_trigger_depth: 8,
        }
    }
}

/// A complete, validated game definition.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameDef {
    /// Game name (diagnostics only).
    pub name: String,
    /// Global variables.
    pub globals: Vec<VarDef>,
    /// Per-seat variables.
    pub seat_vars: Vec<VarDef>,
    /// Zone-scoped variables (declared for every zone instance).
    pub zone_vars: Vec<VarDef>,
    /// Zones.
    pub zones: Vec<ZoneDef>,
    /// Adjacency declarations between shared zones (symmetric).
    pub adjacency: Vec<(String, String)>,
    /// Markers.
    pub markers: Vec<MarkerDef>,
    /// Token types.
    pub token_types: Vec<TokenTypeDef>,
    /// Actions.
    pub actions: Vec<ActionDef>,
    /// Triggers, in declaration (= firing) order.
    pub triggers: Vec<TriggerDef>,
    /// Phases, in cycle order. Must be non-empty.
    pub phases: Vec<PhaseDef>,
    /// Turn-order policy.
    pub turn_order: TurnOrderDef,
    /// Terminal rules, in check order.
    pub terminal: Vec<TerminalRule>,
    /// Setup effects run once by `initial_state`.
    pub setup: Vec<Effect>,
    /// Resource ceilings.
    pub limits: EngineLimits,
}

impl GameDef {
    /// Create an empty definition with one phase and round-robin turn
    /// order.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            globals: Vec::new(),
            seat_vars: Vec::new(),
            zone_vars: Vec::new(),
            zones: Vec::new(),
            adjacency: Vec::new(),
            markers: Vec::new(),
            token_types: Vec::new(),
            actions: Vec::new(),
            triggers: Vec::new(),
            phases: vec![PhaseDef::new("main")],
            turn_order: TurnOrderDef::RoundRobin,
            terminal: Vec::new(),
            setup: Vec::new(),
            limits: EngineLimits::default(),
        }
    }

    /// Look up a global variable definition.
    #[must_use]
    pub fn global_var(&self, name: &str) -> Option<&VarDef> {
        self.globals.iter().find(|v| v.name == name)
    }

    /// Look up a per-seat variable definition.
    #[must_use]
    pub fn seat_var(&self, name: &str) -> Option<&VarDef> {
        self.seat_vars.iter().find(|v| v.name == name)
    }

    /// Look up a zone-scoped variable definition.
    #[must_use]
    pub fn zone_var(&self, name: &str) -> Option<&VarDef> {
        self.zone_vars.iter().find(|v| v.name == name)
    }

    /// Look up a zone definition.
    #[must_use]
    pub fn zone(&self, name: &str) -> Option<&ZoneDef> {
        self.zones.iter().find(|z| z.name == name)
    }

    /// Look up a marker definition.
    #[must_use]
    pub fn marker(&self, name: &str) -> Option<&MarkerDef> {
        self.markers.iter().find(|m| m.name == name)
    }

    /// Look up a token type definition.
    #[must_use]
    pub fn token_type(&self, name: &str) -> Option<&TokenTypeDef> {
        self.token_types.iter().find(|t| t.name == name)
    }

    /// Look up an action definition.
    #[must_use]
    pub fn action(&self, name: &str) -> Option<&ActionDef> {
        self.actions.iter().find(|a| a.name == name)
    }

    /// The zone instance id for a declared zone and (for per-seat
    /// zones) its owning seat.
    #[must_use]
    pub fn zone_instance(zone: &str, seat: Option<SeatId>) -> String {
        match seat {
            Some(s) => format!("{zone}/{}", s.index()),
            None => zone.to_string(),
        }
    }

    /// Engine-owned definition checks.
    ///
    /// Structural document validation belongs to the external
    /// compiler; this catches only what the engine itself refuses to
    /// run with:
    ///
    /// - several operation profiles on one action without an
    ///   `applicability` condition on every profile (ambiguous
    ///   dispatch is a hard error, not a runtime resolution order)
    /// - an empty phase list or fixed seat order
    /// - a marker whose initial state is not among its states
    pub fn validate(&self) -> EngineResult<()> {
        if self.phases.is_empty() {
            return Err(EngineError::Validation("phase list is empty".into()));
        }

        for action in &self.actions {
            if action.profiles.len() > 1
                && action.profiles.iter().any(|p| p.applicability.is_none())
            {
                return Err(EngineError::Validation(format!(
                    "action `{}` has {} operation profiles but not every profile declares \
                     an applicability condition",
                    action.name,
                    action.profiles.len()
                )));
            }
        }

        for action in &self.actions {
            if (action.class == ActionClass::Pivotal) != action.pivotal.is_some() {
                return Err(EngineError::Validation(format!(
                    "action `{}` must declare pivotal behavior iff its class is pivotal",
                    action.name
                )));
            }
        }

        for marker in &self.markers {
            if !marker.states.contains(&marker.initial) {
                return Err(EngineError::Validation(format!(
                    "marker `{}` initial state `{}` is not a declared state",
                    marker.name, marker.initial
                )));
            }
        }

        if let TurnOrderDef::FixedOrder(order) = &self.turn_order {
            if order.is_empty() {
                return Err(EngineError::Validation(
                    "fixed turn order has no seats".into(),
                ));
            }
        }

        if let TurnOrderDef::CardDriven(card) = &self.turn_order {
            if card.seat_order.is_empty() {
                return Err(EngineError::Validation(
                    "card-driven turn order has no seats".into(),
                ));
            }
        }

        Ok(())
    }
}
