//! The complete, serializable game state.
//!
//! GameState is created once from a validated definition and a seed,
//! then threaded through pure transformations: every transformation
//! consumes one state and produces exactly one successor. Zone contents
//! use persistent structures so the clone at each step is cheap.
//!
//! The `hash` field is the canonical digest of everything else in the
//! state; the engine recomputes it after every mutating entry point.
//! It is excluded from its own computation, so serialization round
//! trips reproduce it exactly.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::effects::Decision;
use crate::flow::TurnFlowState;
use crate::zones::ZoneStore;

use super::entity::{SeatId, SeatMap};
use super::error::{EngineError, EngineResult};
use super::rng::GameRng;
use super::value::{ParamValue, Scalar};

/// A fully- or partially-specified move.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Move {
    /// The seat making the move.
    pub seat: SeatId,
    /// The action name.
    pub action: String,
    /// Resolved parameter values, by declared parameter name.
    pub params: Vec<(String, ParamValue)>,
    /// Decisions for the choice effects the move's profile evaluates,
    /// in evaluation order. May be incomplete for discovery.
    pub decisions: Vec<Decision>,
    /// True if the move spends a pending free-operation grant instead
    /// of the seat's normal activation.
    pub free_action: bool,
}

impl Move {
    /// A parameterless move.
    pub fn new(seat: SeatId, action: impl Into<String>) -> Self {
        Self {
            seat,
            action: action.into(),
            params: Vec::new(),
            decisions: Vec::new(),
            free_action: false,
        }
    }

    /// Add a parameter (builder pattern).
    #[must_use]
    pub fn with_param(mut self, name: impl Into<String>, value: ParamValue) -> Self {
        self.params.push((name.into(), value));
        self
    }

    /// Add a decision (builder pattern).
    #[must_use]
    pub fn with_decision(mut self, decision: Decision) -> Self {
        self.decisions.push(decision);
        self
    }

    /// Mark as a free action (builder pattern).
    #[must_use]
    pub fn free(mut self) -> Self {
        self.free_action = true;
        self
    }

    /// Look up a parameter value.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }
}

/// Complete state of one game in progress.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Number of seats.
    pub seat_count: usize,
    /// Global variable table.
    pub globals: FxHashMap<String, Scalar>,
    /// Per-seat variable tables.
    pub seat_vars: SeatMap<FxHashMap<String, Scalar>>,
    /// Zone-scoped variable tables, by zone instance id.
    pub zone_vars: FxHashMap<String, FxHashMap<String, Scalar>>,
    /// Tokens and zone contents.
    pub zones: ZoneStore,
    /// Marker states, by marker name.
    pub markers: FxHashMap<String, String>,
    /// Deterministic RNG stream.
    pub rng: GameRng,
    /// Index into the definition's phase list.
    pub phase_index: usize,
    /// 0-based turn counter; a turn is one full phase cycle.
    pub turn: u32,
    /// The seat whose move is expected (for simultaneous order, the
    /// lowest seat that has not yet submitted).
    pub active_seat: SeatId,
    /// Turn-order policy runtime.
    pub flow: TurnFlowState,
    /// Per-action usage counts for the current turn.
    pub action_uses: FxHashMap<String, u32>,
    /// Per-action usage counts for the current phase.
    pub action_uses_phase: FxHashMap<String, u32>,
    /// Per-action usage counts for the whole game.
    pub action_uses_game: FxHashMap<String, u32>,
    /// Canonical digest of every other field.
    pub hash: u64,
}

impl GameState {
    /// Read a global variable.
    pub fn global(&self, var: &str) -> EngineResult<Scalar> {
        self.globals
            .get(var)
            .copied()
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown global `{var}`")))
    }

    /// Read a seat variable.
    pub fn seat_var(&self, seat: SeatId, var: &str) -> EngineResult<Scalar> {
        if seat.index() >= self.seat_count {
            return Err(EngineError::UnmappedSeat { seat });
        }
        self.seat_vars[seat]
            .get(var)
            .copied()
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown seat var `{var}`")))
    }

    /// Read a zone-scoped variable.
    pub fn zone_var(&self, zone: &str, var: &str) -> EngineResult<Scalar> {
        self.zone_vars
            .get(zone)
            .and_then(|vars| vars.get(var))
            .copied()
            .ok_or_else(|| {
                EngineError::InternalInvariant(format!("unknown zone var `{zone}`.`{var}`"))
            })
    }

    /// Read a marker state.
    pub fn marker(&self, marker: &str) -> EngineResult<&str> {
        self.markers
            .get(marker)
            .map(String::as_str)
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown marker `{marker}`")))
    }

    /// Usage count of an action this turn.
    #[must_use]
    pub fn uses_this_turn(&self, action: &str) -> u32 {
        self.action_uses.get(action).copied().unwrap_or(0)
    }

    /// Usage count of an action this phase.
    #[must_use]
    pub fn uses_this_phase(&self, action: &str) -> u32 {
        self.action_uses_phase.get(action).copied().unwrap_or(0)
    }

    /// Usage count of an action over the whole game.
    #[must_use]
    pub fn uses_this_game(&self, action: &str) -> u32 {
        self.action_uses_game.get(action).copied().unwrap_or(0)
    }

    /// The current phase name, from the definition's phase list.
    #[must_use]
    pub fn phase<'d>(&self, phases: &'d [crate::def::PhaseDef]) -> &'d str {
        &phases[self.phase_index].name
    }

    /// Recompute and store the canonical digest. Every mutating entry
    /// point calls this before returning the successor state.
    pub fn refresh_hash(&mut self) {
        self.hash = super::hash::state_digest(self);
    }

    /// Encode the state as a compact binary snapshot.
    pub fn to_snapshot(&self) -> EngineResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| EngineError::Serialization(e.to_string()))
    }

    /// Decode a snapshot produced by [`GameState::to_snapshot`]. The
    /// stored digest survives the round trip unchanged.
    pub fn from_snapshot(bytes: &[u8]) -> EngineResult<Self> {
        bincode::deserialize(bytes).map_err(|e| EngineError::Serialization(e.to_string()))
    }
}
