//! Structurally typed execution traces.
//!
//! Trace collection is optional and must never change the resulting
//! state or its hash; the engine records into a [`TraceCollector`]
//! which discards entries when disabled. Replay and debug tooling
//! consume the entries; nothing in the engine reads them back.

use serde::{Deserialize, Serialize};

use crate::core::{Scalar, SeatId, TokenId};

/// A discrete card-lifecycle transition, observable in order at card
/// boundaries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LifecycleStep {
    /// The coup card in the played slot moved to the leader slot.
    CoupToLeader,
    /// Leadership handed off after a coup.
    CoupHandoff,
    /// The lookahead card moved into the played slot.
    PromoteLookaheadToPlayed,
    /// The next deck card was revealed into the lookahead slot.
    RevealLookahead,
}

/// One meaningful sub-operation of a move application or phase advance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEntry {
    /// A variable changed value. `scope` is `"global"`, `"seat/N"`, or
    /// a zone instance id.
    VarChanged {
        scope: String,
        var: String,
        old: Scalar,
        new: Scalar,
    },

    /// A bounded transfer ran; `actual` may be below `requested`, with
    /// `headroom` naming the capacity that caused the clamp.
    TransferApplied {
        from_scope: String,
        from_var: String,
        to_scope: String,
        to_var: String,
        requested: Scalar,
        actual: Scalar,
        headroom: Scalar,
    },

    /// A token moved between zones.
    TokenMoved {
        token: TokenId,
        from: String,
        to: String,
    },

    /// A token was created.
    TokenCreated {
        token: TokenId,
        token_type: String,
        zone: String,
    },

    /// A token was destroyed.
    TokenDestroyed { token: TokenId, zone: String },

    /// A marker changed state.
    MarkerSet {
        marker: String,
        old: String,
        new: String,
    },

    /// A random draw resolved.
    Rolled {
        bind: String,
        min: Scalar,
        max: Scalar,
        value: Scalar,
    },

    /// A loop construct finished; `count` is the number of body
    /// executions.
    LoopFinished { kind: &'static str, count: usize },

    /// A trigger fired at the given dispatch depth.
    TriggerFired { trigger: String, depth: u32 },

    /// A custom event was emitted.
    EventEmitted { name: String },

    /// A seat was credited a pass reward.
    PassRewarded {
        seat: SeatId,
        var: String,
        amount: Scalar,
    },

    /// A card-lifecycle step executed at a card boundary.
    Lifecycle(LifecycleStep),

    /// A phase boundary was crossed.
    PhaseEntered { phase: String },
}

/// Accumulates trace entries; a disabled collector drops everything.
#[derive(Clone, Debug, Default)]
pub struct TraceCollector {
    enabled: bool,
    entries: Vec<TraceEntry>,
}

impl TraceCollector {
    /// A collector that records.
    #[must_use]
    pub fn enabled() -> Self {
        Self {
            enabled: true,
            entries: Vec::new(),
        }
    }

    /// A collector that drops every entry.
    #[must_use]
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            entries: Vec::new(),
        }
    }

    /// Record an entry (no-op when disabled).
    pub fn record(&mut self, entry: TraceEntry) {
        if self.enabled {
            self.entries.push(entry);
        }
    }

    /// Recorded entries, in execution order.
    #[must_use]
    pub fn entries(&self) -> &[TraceEntry] {
        &self.entries
    }

    /// Consume the collector, yielding its entries.
    #[must_use]
    pub fn into_entries(self) -> Vec<TraceEntry> {
        self.entries
    }

    /// Only the lifecycle steps, in order.
    #[must_use]
    pub fn lifecycle_steps(&self) -> Vec<LifecycleStep> {
        self.entries
            .iter()
            .filter_map(|e| match e {
                TraceEntry::Lifecycle(step) => Some(*step),
                _ => None,
            })
            .collect()
    }
}
