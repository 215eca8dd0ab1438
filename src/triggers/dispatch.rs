//! Trigger dispatch.
//!
//! On every structural event, all triggers whose pattern matches fire
//! in declaration order, each executing its full effect sequence
//! against the state left by the previous one. Effects may emit custom
//! events, which dispatch recursively after the emitting sequence
//! completes; the depth counter is the only protection against
//! definitional trigger cycles, so exceeding it is fatal to the
//! enclosing operation.
//!
//! Each trigger's effect sequence is a top-level interpreter call and
//! gets a fresh operation budget.

use crate::core::{EngineError, EngineResult, GameState, ParamValue, Scalar};
use crate::def::GameDef;
use crate::effects::{AuthorityCheck, ChoiceMode, Interpreter};
use crate::spatial::AdjacencyGraph;
use crate::trace::{TraceCollector, TraceEntry};

use tracing::debug;

use super::event::EngineEvent;

/// Dispatch one event at depth 0.
pub fn dispatch(
    def: &GameDef,
    graph: &AdjacencyGraph,
    state: &mut GameState,
    event: &EngineEvent,
    trace: &mut TraceCollector,
) -> EngineResult<()> {
    dispatch_at(def, graph, state, event, 0, trace)
}

/// Dispatch a batch of custom events emitted by an interpreter run, in
/// emission order, at the given depth.
pub fn dispatch_emitted(
    def: &GameDef,
    graph: &AdjacencyGraph,
    state: &mut GameState,
    emitted: Vec<(String, Vec<Scalar>)>,
    depth: u32,
    trace: &mut TraceCollector,
) -> EngineResult<()> {
    for (name, payload) in emitted {
        let event = EngineEvent::Custom { name, payload };
        dispatch_at(def, graph, state, &event, depth, trace)?;
    }
    Ok(())
}

fn dispatch_at(
    def: &GameDef,
    graph: &AdjacencyGraph,
    state: &mut GameState,
    event: &EngineEvent,
    depth: u32,
    trace: &mut TraceCollector,
) -> EngineResult<()> {
    if depth >= def.limits.max_trigger_depth {
        return Err(EngineError::TriggerDepthExceeded {
            max_depth: def.limits.max_trigger_depth,
        });
    }

    // Matching set is snapshotted against the definition, so a trigger
    // fires once per occurrence even if earlier triggers mutate state.
    let matching: Vec<usize> = def
        .triggers
        .iter()
        .enumerate()
        .filter(|(_, t)| event.matches(&t.on))
        .map(|(i, _)| i)
        .collect();

    let params = event_params(event);

    for index in matching {
        let trigger = &def.triggers[index];
        let mut interp = Interpreter::new(
            def,
            graph,
            state.active_seat,
            ChoiceMode::Execution,
            AuthorityCheck::Strict,
            &params,
            &[],
        )?;

        if let Some(guard) = &trigger.guard {
            if !interp.eval_condition(state, guard)? {
                continue;
            }
        }

        debug!(trigger = %trigger.id, depth, "trigger fired");
        trace.record(TraceEntry::TriggerFired {
            trigger: trigger.id.clone(),
            depth,
        });
        interp.run(state, &trigger.effects, trace)?;
        let emitted = interp.take_emitted();
        dispatch_emitted(def, graph, state, emitted, depth + 1, trace)?;
    }
    Ok(())
}

/// Custom-event payload scalars exposed to trigger effects as
/// parameters `payload:0`, `payload:1`, ...
fn event_params(event: &EngineEvent) -> Vec<(String, ParamValue)> {
    match event {
        EngineEvent::Custom { payload, .. } => payload
            .iter()
            .enumerate()
            .map(|(i, &v)| (format!("payload:{i}"), ParamValue::Scalar(v)))
            .collect(),
        EngineEvent::TurnStart
        | EngineEvent::TurnEnd
        | EngineEvent::PhaseEnter(_)
        | EngineEvent::PhaseExit(_) => Vec::new(),
    }
}
