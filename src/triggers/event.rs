//! Structural events.

use serde::{Deserialize, Serialize};

use crate::core::Scalar;
use crate::def::EventPattern;

/// One event occurrence fed to trigger dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum EngineEvent {
    /// A turn is starting.
    TurnStart,
    /// A turn is ending.
    TurnEnd,
    /// A phase was entered.
    PhaseEnter(String),
    /// A phase was exited.
    PhaseExit(String),
    /// A custom event emitted by an effect.
    Custom { name: String, payload: Vec<Scalar> },
}

impl EngineEvent {
    /// True if a trigger pattern matches this occurrence.
    #[must_use]
    pub fn matches(&self, pattern: &EventPattern) -> bool {
        match (self, pattern) {
            (EngineEvent::TurnStart, EventPattern::TurnStart) => true,
            (EngineEvent::TurnEnd, EventPattern::TurnEnd) => true,
            (EngineEvent::PhaseEnter(phase), EventPattern::PhaseEnter(wanted)) => {
                wanted.as_ref().is_none() || wanted.as_deref() == Some(phase.as_str())
            }
            (EngineEvent::PhaseExit(phase), EventPattern::PhaseExit(wanted)) => {
                wanted.as_ref().is_none() || wanted.as_deref() == Some(phase.as_str())
            }
            (EngineEvent::Custom { name, .. }, EventPattern::Custom(wanted)) => name == wanted,
            _ => false,
        }
    }
}
