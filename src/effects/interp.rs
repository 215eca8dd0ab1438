//! The budgeted effect interpreter.
//!
//! One [`Interpreter`] is constructed per top-level effect-sequence
//! call (a move's profile, a trigger's effects, setup). It carries the
//! operation budget, the binding scope stack, the decision cursor, and
//! the events emitted so far; all of these are per-call, so nesting
//! inside loops or branches can never escape the budget.
//!
//! Evaluation is depth-first, left-to-right. The budget is charged once
//! per effect node actually executed, including nodes visited inside
//! loop bodies. Bindings pushed by a scoped construct are truncated
//! when the construct exits, which is what keeps them invisible to
//! sibling effects.
//!
//! Discovery-mode evaluation stops at the first choice without a
//! supplied decision and reports it as [`EffectOutcome::Pending`]; the
//! partially mutated state must then be discarded by the caller.

use crate::core::{
    ChoiceFailure, EngineError, EngineResult, GameState, ParamValue, Scalar, SeatId, TokenId,
};
use crate::def::{GameDef, ZoneDef, ZoneOwnership};
use crate::spatial::AdjacencyGraph;
use crate::trace::{TraceCollector, TraceEntry};

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use super::choice::{AuthorityCheck, ChoiceMode, Decision, EffectOutcome, PendingChoice};
use super::condition::Condition;
use super::effect::{ChoiceOptions, Effect, VarScope};
use super::value::{SeatRef, TokenRef, ValueExpr, ZoneRef};

/// Resolved variable location, used for reads, writes, and trace scope
/// labels.
enum VarSlot {
    Global,
    Seat(SeatId),
    Zone(String),
}

impl VarSlot {
    fn label(&self) -> String {
        match self {
            VarSlot::Global => "global".to_string(),
            VarSlot::Seat(seat) => format!("seat/{}", seat.index()),
            VarSlot::Zone(instance) => instance.clone(),
        }
    }
}

/// Per-top-level-call effect evaluator.
#[derive(Debug)]
pub struct Interpreter<'a> {
    def: &'a GameDef,
    graph: &'a AdjacencyGraph,
    active_seat: SeatId,
    mode: ChoiceMode,
    authority: AuthorityCheck,
    params: &'a [(String, ParamValue)],
    decisions: &'a [Decision],
    cursor: usize,
    budget: u32,
    // Scope stack; shallow in practice, so spilling is rare.
    bindings: SmallVec<[(String, ParamValue); 8]>,
    emitted: Vec<(String, Vec<Scalar>)>,
}

impl<'a> Interpreter<'a> {
    /// Create an interpreter for one top-level call.
    ///
    /// Rejects execution mode combined with probe authority; that
    /// combination must never be constructed by any caller.
    pub fn new(
        def: &'a GameDef,
        graph: &'a AdjacencyGraph,
        active_seat: SeatId,
        mode: ChoiceMode,
        authority: AuthorityCheck,
        params: &'a [(String, ParamValue)],
        decisions: &'a [Decision],
    ) -> EngineResult<Self> {
        if mode == ChoiceMode::Execution && authority == AuthorityCheck::Probe {
            return Err(EngineError::InternalInvariant(
                "execution mode combined with probe authority".into(),
            ));
        }
        Ok(Self {
            def,
            graph,
            active_seat,
            mode,
            authority,
            params,
            decisions,
            cursor: 0,
            budget: def.limits.max_ops,
            bindings: SmallVec::new(),
            emitted: Vec::new(),
        })
    }

    /// Run an effect sequence against a state.
    pub fn run(
        &mut self,
        state: &mut GameState,
        effects: &[Effect],
        trace: &mut TraceCollector,
    ) -> EngineResult<EffectOutcome> {
        for effect in effects {
            match self.exec(state, effect, trace)? {
                EffectOutcome::Done => {}
                pending @ EffectOutcome::Pending(_) => return Ok(pending),
            }
        }
        Ok(EffectOutcome::Done)
    }

    /// Index of the next unconsumed decision.
    #[must_use]
    pub fn decisions_consumed(&self) -> usize {
        self.cursor
    }

    /// Drain the custom events emitted so far, in emission order.
    pub fn take_emitted(&mut self) -> Vec<(String, Vec<Scalar>)> {
        std::mem::take(&mut self.emitted)
    }

    fn charge(&mut self, effect: &Effect) -> EngineResult<()> {
        if self.budget == 0 {
            return Err(EngineError::BudgetExceeded {
                effect_kind: effect.kind().to_string(),
                max_ops: self.def.limits.max_ops,
            });
        }
        self.budget -= 1;
        Ok(())
    }

    fn exec(
        &mut self,
        state: &mut GameState,
        effect: &Effect,
        trace: &mut TraceCollector,
    ) -> EngineResult<EffectOutcome> {
        self.charge(effect)?;
        match effect {
            Effect::SetVar { scope, var, value } => {
                let new = self.eval(state, value)?;
                let slot = self.resolve_scope(state, scope)?;
                self.write_var(state, &slot, var, new, trace)?;
                Ok(EffectOutcome::Done)
            }

            Effect::AddVar { scope, var, delta } => {
                let delta = self.eval(state, delta)?;
                let slot = self.resolve_scope(state, scope)?;
                let old = self.read_var(state, &slot, var)?;
                self.write_var(state, &slot, var, old.saturating_add(delta), trace)?;
                Ok(EffectOutcome::Done)
            }

            Effect::TransferVar {
                from_scope,
                from_var,
                to_scope,
                to_var,
                amount,
            } => {
                self.transfer(state, from_scope, from_var, to_scope, to_var, amount, trace)?;
                Ok(EffectOutcome::Done)
            }

            Effect::MoveToken { token, to } => {
                let id = self.resolve_token(token)?;
                let to = self.resolve_zone(to)?;
                let from = state.zones.zone_of(id)?.to_string();
                let ordering = self.instance_def(&to)?.ordering;
                state.zones.move_token(id, &to, ordering)?;
                trace.record(TraceEntry::TokenMoved {
                    token: id,
                    from,
                    to,
                });
                Ok(EffectOutcome::Done)
            }

            Effect::CreateToken {
                token_type,
                zone,
                bind,
                body,
            } => {
                let instance = self.resolve_zone(zone)?;
                let ordering = self.instance_def(&instance)?.ordering;
                let type_def = self.def.token_type(token_type).ok_or_else(|| {
                    EngineError::InternalInvariant(format!("unknown token type `{token_type}`"))
                })?;
                let props: FxHashMap<String, Scalar> =
                    type_def.props.iter().cloned().collect();
                let id = state
                    .zones
                    .create_token(token_type.clone(), props, &instance, ordering)?;
                trace.record(TraceEntry::TokenCreated {
                    token: id,
                    token_type: token_type.clone(),
                    zone: instance,
                });
                match bind {
                    Some(name) => {
                        self.scoped(state, body, trace, vec![(name.clone(), id.into())])
                    }
                    None => self.scoped(state, body, trace, Vec::new()),
                }
            }

            Effect::DestroyToken { token } => {
                let id = self.resolve_token(token)?;
                let zone = state.zones.zone_of(id)?.to_string();
                state.zones.destroy_token(id)?;
                trace.record(TraceEntry::TokenDestroyed { token: id, zone });
                Ok(EffectOutcome::Done)
            }

            Effect::SetTokenProp { token, prop, value } => {
                let id = self.resolve_token(token)?;
                let new = self.eval(state, value)?;
                let token = state.zones.token_mut(id)?;
                let old = token.prop(prop);
                token.props.insert(prop.clone(), new);
                trace.record(TraceEntry::VarChanged {
                    scope: format!("token/{}", id.raw()),
                    var: prop.clone(),
                    old,
                    new,
                });
                Ok(EffectOutcome::Done)
            }

            Effect::SetMarker { marker, state: to } => {
                self.set_marker(state, marker, to.clone(), trace)?;
                Ok(EffectOutcome::Done)
            }

            Effect::ShiftMarker { marker, offset } => {
                let def = self.def.marker(marker).ok_or_else(|| {
                    EngineError::InternalInvariant(format!("unknown marker `{marker}`"))
                })?;
                let current = state.marker(marker)?;
                let index = def
                    .states
                    .iter()
                    .position(|s| s == current)
                    .ok_or_else(|| {
                        EngineError::InternalInvariant(format!(
                            "marker `{marker}` in undeclared state `{current}`"
                        ))
                    })?;
                let last = def.states.len() as Scalar - 1;
                let target = (index as Scalar + offset).clamp(0, last) as usize;
                let next = def.states[target].clone();
                self.set_marker(state, marker, next, trace)?;
                Ok(EffectOutcome::Done)
            }

            Effect::Roll {
                bind,
                min,
                max,
                body,
            } => {
                let min = self.eval(state, min)?;
                let max = self.eval(state, max)?;
                let value = state.rng.roll_range(min, max);
                trace.record(TraceEntry::Rolled {
                    bind: bind.clone(),
                    min,
                    max,
                    value,
                });
                self.scoped(state, body, trace, vec![(bind.clone(), value.into())])
            }

            Effect::If {
                condition,
                then,
                otherwise,
            } => {
                if self.eval_condition(state, condition)? {
                    self.run_nested(state, then, trace)
                } else {
                    self.run_nested(state, otherwise, trace)
                }
            }

            Effect::Repeat { times, bind, body } => {
                let times = self.eval(state, times)?.max(0);
                for i in 0..times {
                    let scope = match bind {
                        Some(name) => vec![(name.clone(), i.into())],
                        None => Vec::new(),
                    };
                    match self.scoped(state, body, trace, scope)? {
                        EffectOutcome::Done => {}
                        pending @ EffectOutcome::Pending(_) => return Ok(pending),
                    }
                }
                trace.record(TraceEntry::LoopFinished {
                    kind: "repeat",
                    count: times as usize,
                });
                Ok(EffectOutcome::Done)
            }

            Effect::ForEachTokenIn { zone, bind, body } => {
                let instance = self.resolve_zone(zone)?;
                let snapshot: Vec<TokenId> =
                    state.zones.contents(&instance)?.iter().copied().collect();
                for id in &snapshot {
                    match self.scoped(state, body, trace, vec![(bind.clone(), (*id).into())])? {
                        EffectOutcome::Done => {}
                        pending @ EffectOutcome::Pending(_) => return Ok(pending),
                    }
                }
                trace.record(TraceEntry::LoopFinished {
                    kind: "forEachTokenIn",
                    count: snapshot.len(),
                });
                Ok(EffectOutcome::Done)
            }

            Effect::RemoveByPriority {
                zone,
                count,
                priority,
            } => {
                let instance = self.resolve_zone(zone)?;
                let count = self.eval(state, count)?.max(0) as usize;
                let snapshot: Vec<TokenId> =
                    state.zones.contents(&instance)?.iter().copied().collect();

                let mut victims: Vec<TokenId> = Vec::new();
                for wanted in priority {
                    for &id in &snapshot {
                        if victims.len() >= count {
                            break;
                        }
                        if !victims.contains(&id)
                            && state.zones.token(id)?.token_type == *wanted
                        {
                            victims.push(id);
                        }
                    }
                }
                // Preference exhausted: fill with whatever remains, in
                // zone order.
                for &id in &snapshot {
                    if victims.len() >= count {
                        break;
                    }
                    if !victims.contains(&id) {
                        victims.push(id);
                    }
                }

                for id in victims {
                    state.zones.destroy_token(id)?;
                    trace.record(TraceEntry::TokenDestroyed {
                        token: id,
                        zone: instance.clone(),
                    });
                }
                Ok(EffectOutcome::Done)
            }

            Effect::Let { bind, value, body } => {
                let value = self.eval(state, value)?;
                self.scoped(state, body, trace, vec![(bind.clone(), value.into())])
            }

            Effect::ChooseOne {
                choice,
                chooser,
                options,
                bind,
                body,
            } => {
                let chooser = self.resolve_seat(chooser)?;
                let domain = self.options_domain(state, options)?;
                match self.take_decision(choice, chooser, &domain, 1)? {
                    Some(value) => {
                        self.scoped(state, body, trace, vec![(bind.clone(), value)])
                    }
                    None => Ok(EffectOutcome::Pending(PendingChoice {
                        choice: choice.clone(),
                        chooser,
                        options: domain,
                        count: 1,
                    })),
                }
            }

            Effect::ChooseN {
                choice,
                chooser,
                options,
                count,
                bind,
                body,
            } => {
                let chooser = self.resolve_seat(chooser)?;
                let domain = self.options_domain(state, options)?;
                let count = (self.eval(state, count)?.max(0) as usize).min(domain.len());
                match self.take_decision(choice, chooser, &domain, count)? {
                    Some(value) => {
                        self.scoped(state, body, trace, vec![(bind.clone(), value)])
                    }
                    None => Ok(EffectOutcome::Pending(PendingChoice {
                        choice: choice.clone(),
                        chooser,
                        options: domain,
                        count,
                    })),
                }
            }

            Effect::SetEligibility {
                seat,
                eligible,
                window,
            } => {
                let seat = self.resolve_seat(seat)?;
                if seat.index() >= state.seat_count {
                    return Err(EngineError::UnmappedSeat { seat });
                }
                let card = self.card_flow(state)?;
                let pending = *window == crate::def::EligibilityWindow::NextCard;
                card.overrides.push(crate::flow::EligibilityOverride {
                    seat,
                    make_eligible: *eligible,
                    window: *window,
                    pending,
                });
                if !pending {
                    card.eligible[seat] = *eligible;
                }
                Ok(EffectOutcome::Done)
            }

            Effect::GrantFreeOperation { seat } => {
                let seat = self.resolve_seat(seat)?;
                if seat.index() >= state.seat_count {
                    return Err(EngineError::UnmappedSeat { seat });
                }
                let card = self.card_flow(state)?;
                card.free_grants.push(seat);
                Ok(EffectOutcome::Done)
            }

            Effect::EmitEvent { name, payload } => {
                let payload = payload
                    .iter()
                    .map(|expr| self.eval(state, expr))
                    .collect::<EngineResult<Vec<Scalar>>>()?;
                self.emitted.push((name.clone(), payload));
                trace.record(TraceEntry::EventEmitted { name: name.clone() });
                Ok(EffectOutcome::Done)
            }
        }
    }

    /// The card-driven flow runtime, required by eligibility and
    /// free-grant effects.
    fn card_flow<'s>(
        &self,
        state: &'s mut GameState,
    ) -> EngineResult<&'s mut crate::flow::CardFlowState> {
        match &mut state.flow {
            crate::flow::TurnFlowState::CardDriven(card) => Ok(card),
            crate::flow::TurnFlowState::RoundRobin
            | crate::flow::TurnFlowState::FixedOrder { .. }
            | crate::flow::TurnFlowState::Simultaneous { .. } => Err(
                EngineError::InternalInvariant(
                    "eligibility effects require the card-driven turn order".into(),
                ),
            ),
        }
    }

    /// Run a nested sequence without introducing bindings.
    fn run_nested(
        &mut self,
        state: &mut GameState,
        effects: &[Effect],
        trace: &mut TraceCollector,
    ) -> EngineResult<EffectOutcome> {
        for effect in effects {
            match self.exec(state, effect, trace)? {
                EffectOutcome::Done => {}
                pending @ EffectOutcome::Pending(_) => return Ok(pending),
            }
        }
        Ok(EffectOutcome::Done)
    }

    /// Run a body with extra bindings, truncating them on exit so they
    /// never leak to sibling effects.
    fn scoped(
        &mut self,
        state: &mut GameState,
        body: &[Effect],
        trace: &mut TraceCollector,
        scope: Vec<(String, ParamValue)>,
    ) -> EngineResult<EffectOutcome> {
        let depth = self.bindings.len();
        self.bindings.extend(scope);
        let outcome = self.run_nested(state, body, trace);
        self.bindings.truncate(depth);
        outcome
    }

    // === Choice protocol ===

    /// Consume the next decision for a choice, validating authority,
    /// shape, and domain membership. Returns `None` when discovery runs
    /// out of decisions.
    fn take_decision(
        &mut self,
        choice: &str,
        chooser: SeatId,
        domain: &[ParamValue],
        count: usize,
    ) -> EngineResult<Option<ParamValue>> {
        let decision = if self.cursor < self.decisions.len() {
            let d = &self.decisions[self.cursor];
            self.cursor += 1;
            d
        } else {
            return match self.mode {
                ChoiceMode::Discovery => Ok(None),
                ChoiceMode::Execution => Err(EngineError::ChoiceValidation {
                    choice: choice.to_string(),
                    failure: ChoiceFailure::Undecided,
                }),
            };
        };

        if decision.choice != choice {
            return Err(EngineError::ChoiceValidation {
                choice: choice.to_string(),
                failure: ChoiceFailure::InvalidSelection {
                    got: format!("decision for `{}`", decision.choice),
                },
            });
        }

        if decision.decided_by != chooser {
            return match self.authority {
                AuthorityCheck::Strict => Err(EngineError::ChoiceValidation {
                    choice: choice.to_string(),
                    failure: ChoiceFailure::AuthorityMismatch { expected: chooser },
                }),
                // Probe runs only under discovery; the execution+probe
                // combination is rejected at construction.
                AuthorityCheck::Probe => Err(EngineError::ChoiceProbeAuthorityMismatch {
                    choice: choice.to_string(),
                    expected: chooser,
                }),
            };
        }

        if count == 1 {
            self.check_in_domain(choice, domain, &decision.value)?;
            Ok(Some(decision.value.clone()))
        } else {
            let items = decision.value.as_list().ok_or_else(|| {
                EngineError::ChoiceValidation {
                    choice: choice.to_string(),
                    failure: ChoiceFailure::InvalidSelection {
                        got: decision.value.kind().to_string(),
                    },
                }
            })?;
            if items.len() != count {
                return Err(EngineError::ChoiceValidation {
                    choice: choice.to_string(),
                    failure: ChoiceFailure::InvalidSelection {
                        got: format!("{} selection(s), need {count}", items.len()),
                    },
                });
            }
            for (i, item) in items.iter().enumerate() {
                if items[..i].contains(item) {
                    return Err(EngineError::ChoiceValidation {
                        choice: choice.to_string(),
                        failure: ChoiceFailure::InvalidSelection {
                            got: "duplicate selection".to_string(),
                        },
                    });
                }
                self.check_in_domain(choice, domain, item)?;
            }
            Ok(Some(decision.value.clone()))
        }
    }

    fn check_in_domain(
        &self,
        choice: &str,
        domain: &[ParamValue],
        value: &ParamValue,
    ) -> EngineResult<()> {
        let expected_kind = domain.first().map(ParamValue::kind);
        if let Some(expected) = expected_kind {
            if value.kind() != expected {
                return Err(EngineError::ChoiceValidation {
                    choice: choice.to_string(),
                    failure: ChoiceFailure::InvalidSelection {
                        got: value.kind().to_string(),
                    },
                });
            }
        }
        if !domain.contains(value) {
            return Err(EngineError::ChoiceValidation {
                choice: choice.to_string(),
                failure: ChoiceFailure::OutsideOptionsDomain,
            });
        }
        Ok(())
    }

    /// Materialize a choice's option domain from current state.
    fn options_domain(
        &self,
        state: &GameState,
        options: &ChoiceOptions,
    ) -> EngineResult<Vec<ParamValue>> {
        match options {
            ChoiceOptions::Scalars(exprs) => exprs
                .iter()
                .map(|e| Ok(ParamValue::Scalar(self.eval(state, e)?)))
                .collect(),
            ChoiceOptions::Range { min, max } => {
                let min = self.eval(state, min)?;
                let max = self.eval(state, max)?;
                Ok((min..=max).map(ParamValue::Scalar).collect())
            }
            ChoiceOptions::TokensIn(zone) => {
                let instance = self.resolve_zone(zone)?;
                Ok(state
                    .zones
                    .contents(&instance)?
                    .iter()
                    .map(|&id| ParamValue::Token(id))
                    .collect())
            }
            ChoiceOptions::Zones(names) => names
                .iter()
                .map(|name| {
                    Ok(ParamValue::Zone(
                        self.resolve_zone(&ZoneRef::Named(name.clone()))?,
                    ))
                })
                .collect(),
            ChoiceOptions::Seats => Ok(SeatId::all(state.seat_count)
                .map(ParamValue::Seat)
                .collect()),
        }
    }

    // === Variable access ===

    fn resolve_scope(&self, state: &GameState, scope: &VarScope) -> EngineResult<VarSlot> {
        match scope {
            VarScope::Global => Ok(VarSlot::Global),
            VarScope::Seat(seat) => Ok(VarSlot::Seat(self.resolve_seat(seat)?)),
            VarScope::Zone(zone) => Ok(VarSlot::Zone(self.resolve_zone(zone)?)),
        }
        .and_then(|slot| match &slot {
            VarSlot::Seat(seat) if seat.index() >= state.seat_count => {
                Err(EngineError::UnmappedSeat { seat: *seat })
            }
            _ => Ok(slot),
        })
    }

    fn read_var(&self, state: &GameState, slot: &VarSlot, var: &str) -> EngineResult<Scalar> {
        match slot {
            VarSlot::Global => state.global(var),
            VarSlot::Seat(seat) => state.seat_var(*seat, var),
            VarSlot::Zone(instance) => state.zone_var(instance, var),
        }
    }

    /// Range-validate and write a variable, recording the change.
    /// Validation happens before any mutation.
    fn write_var(
        &self,
        state: &mut GameState,
        slot: &VarSlot,
        var: &str,
        new: Scalar,
        trace: &mut TraceCollector,
    ) -> EngineResult<()> {
        let def = self.var_def(slot, var)?;
        if !def.in_range(new) {
            let (min, max) = def.bounds();
            return Err(EngineError::VariableValidation {
                var: var.to_string(),
                value: new,
                min,
                max,
            });
        }
        let old = self.read_var(state, slot, var)?;
        match slot {
            VarSlot::Global => {
                state.globals.insert(var.to_string(), new);
            }
            VarSlot::Seat(seat) => {
                state.seat_vars[*seat].insert(var.to_string(), new);
            }
            VarSlot::Zone(instance) => {
                state
                    .zone_vars
                    .entry(instance.clone())
                    .or_default()
                    .insert(var.to_string(), new);
            }
        }
        trace.record(TraceEntry::VarChanged {
            scope: slot.label(),
            var: var.to_string(),
            old,
            new,
        });
        Ok(())
    }

    fn var_def(&self, slot: &VarSlot, var: &str) -> EngineResult<&crate::def::VarDef> {
        let def = match slot {
            VarSlot::Global => self.def.global_var(var),
            VarSlot::Seat(_) => self.def.seat_var(var),
            VarSlot::Zone(_) => self.def.zone_var(var),
        };
        def.ok_or_else(|| EngineError::InternalInvariant(format!("undeclared variable `{var}`")))
    }

    /// Bounded transfer: moves as much of `amount` as both endpoints'
    /// ranges allow, never failing on headroom. The clamp is reported
    /// in the trace as requested vs. actual.
    #[allow(clippy::too_many_arguments)]
    fn transfer(
        &mut self,
        state: &mut GameState,
        from_scope: &VarScope,
        from_var: &str,
        to_scope: &VarScope,
        to_var: &str,
        amount: &ValueExpr,
        trace: &mut TraceCollector,
    ) -> EngineResult<()> {
        let requested = self.eval(state, amount)?.max(0);
        let from_slot = self.resolve_scope(state, from_scope)?;
        let to_slot = self.resolve_scope(state, to_scope)?;

        let from_value = self.read_var(state, &from_slot, from_var)?;
        let to_value = self.read_var(state, &to_slot, to_var)?;
        let (from_min, _) = self.var_def(&from_slot, from_var)?.bounds();
        let (_, to_max) = self.var_def(&to_slot, to_var)?.bounds();

        let available = (from_value - from_min).max(0);
        let capacity = (to_max - to_value).max(0);
        let headroom = available.min(capacity);
        let actual = requested.min(headroom);

        self.write_var(state, &from_slot, from_var, from_value - actual, trace)?;
        self.write_var(state, &to_slot, to_var, to_value + actual, trace)?;
        trace.record(TraceEntry::TransferApplied {
            from_scope: from_slot.label(),
            from_var: from_var.to_string(),
            to_scope: to_slot.label(),
            to_var: to_var.to_string(),
            requested,
            actual,
            headroom,
        });
        Ok(())
    }

    fn set_marker(
        &self,
        state: &mut GameState,
        marker: &str,
        to: String,
        trace: &mut TraceCollector,
    ) -> EngineResult<()> {
        let def = self.def.marker(marker).ok_or_else(|| {
            EngineError::InternalInvariant(format!("unknown marker `{marker}`"))
        })?;
        if !def.states.contains(&to) {
            return Err(EngineError::InternalInvariant(format!(
                "marker `{marker}` has no state `{to}`"
            )));
        }
        let old = state.marker(marker)?.to_string();
        state.markers.insert(marker.to_string(), to.clone());
        trace.record(TraceEntry::MarkerSet {
            marker: marker.to_string(),
            old,
            new: to,
        });
        Ok(())
    }

    // === Reference resolution ===

    fn lookup_binding(&self, name: &str) -> EngineResult<&ParamValue> {
        self.bindings
            .iter()
            .rev()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| EngineError::MissingBinding {
                name: name.to_string(),
            })
    }

    fn lookup_param(&self, name: &str) -> EngineResult<&ParamValue> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
            .ok_or_else(|| {
                EngineError::InternalInvariant(format!("missing move parameter `{name}`"))
            })
    }

    /// Resolve a seat reference.
    pub fn resolve_seat(&self, seat: &SeatRef) -> EngineResult<SeatId> {
        match seat {
            SeatRef::Active => Ok(self.active_seat),
            SeatRef::Seat(id) => Ok(*id),
            SeatRef::Binding(name) => {
                let value = self.lookup_binding(name)?;
                value.as_seat().ok_or_else(|| EngineError::MissingBinding {
                    name: name.clone(),
                })
            }
            SeatRef::Param(name) => {
                let value = self.lookup_param(name)?;
                value.as_seat().ok_or_else(|| {
                    EngineError::InternalInvariant(format!(
                        "parameter `{name}` is {}, not a seat",
                        value.kind()
                    ))
                })
            }
        }
    }

    /// Resolve a zone reference to a zone instance id.
    pub fn resolve_zone(&self, zone: &ZoneRef) -> EngineResult<String> {
        match zone {
            ZoneRef::Named(name) => {
                let def = self.zone_def(name)?;
                Ok(match def.owner {
                    ZoneOwnership::None => name.clone(),
                    ZoneOwnership::PerSeat => {
                        GameDef::zone_instance(name, Some(self.active_seat))
                    }
                })
            }
            ZoneRef::OwnedBy { zone, seat } => {
                let def = self.zone_def(zone)?;
                match def.owner {
                    ZoneOwnership::PerSeat => {
                        let seat = self.resolve_seat(seat)?;
                        Ok(GameDef::zone_instance(zone, Some(seat)))
                    }
                    ZoneOwnership::None => Err(EngineError::InternalInvariant(format!(
                        "zone `{zone}` is shared, not per-seat"
                    ))),
                }
            }
            ZoneRef::Binding(name) => {
                let value = self.lookup_binding(name)?;
                value
                    .as_zone()
                    .map(str::to_string)
                    .ok_or_else(|| EngineError::MissingBinding { name: name.clone() })
            }
            ZoneRef::Param(name) => {
                let value = self.lookup_param(name)?;
                value.as_zone().map(str::to_string).ok_or_else(|| {
                    EngineError::InternalInvariant(format!(
                        "parameter `{name}` is {}, not a zone",
                        value.kind()
                    ))
                })
            }
        }
    }

    /// Resolve a token reference.
    pub fn resolve_token(&self, token: &TokenRef) -> EngineResult<TokenId> {
        match token {
            TokenRef::Binding(name) => {
                let value = self.lookup_binding(name)?;
                value.as_token().ok_or_else(|| EngineError::MissingBinding {
                    name: name.clone(),
                })
            }
            TokenRef::Param(name) => {
                let value = self.lookup_param(name)?;
                value.as_token().ok_or_else(|| {
                    EngineError::InternalInvariant(format!(
                        "parameter `{name}` is {}, not a token",
                        value.kind()
                    ))
                })
            }
        }
    }

    fn zone_def(&self, name: &str) -> EngineResult<&ZoneDef> {
        self.def
            .zone(name)
            .ok_or_else(|| EngineError::InternalInvariant(format!("unknown zone `{name}`")))
    }

    /// Zone definition for an instance id (`"hand/2"` maps back to the
    /// declared zone `"hand"`).
    fn instance_def(&self, instance: &str) -> EngineResult<&ZoneDef> {
        let name = instance.split('/').next().unwrap_or(instance);
        self.zone_def(name)
    }

    // === Evaluation ===

    /// Evaluate a scalar expression against a state.
    pub fn eval(&self, state: &GameState, expr: &ValueExpr) -> EngineResult<Scalar> {
        match expr {
            ValueExpr::Const(v) => Ok(*v),
            ValueExpr::Var(name) => state.global(name),
            ValueExpr::SeatVar { seat, var } => {
                state.seat_var(self.resolve_seat(seat)?, var)
            }
            ValueExpr::ZoneVar { zone, var } => {
                state.zone_var(&self.resolve_zone(zone)?, var)
            }
            ValueExpr::Binding(name) => {
                let value = self.lookup_binding(name)?;
                value.as_scalar().ok_or_else(|| EngineError::MissingBinding {
                    name: name.clone(),
                })
            }
            ValueExpr::Param(name) => {
                let value = self.lookup_param(name)?;
                value.as_scalar().ok_or_else(|| {
                    EngineError::InternalInvariant(format!(
                        "parameter `{name}` is {}, not a scalar",
                        value.kind()
                    ))
                })
            }
            ValueExpr::ZoneCount(zone) => {
                Ok(state.zones.count(&self.resolve_zone(zone)?)? as Scalar)
            }
            ValueExpr::TokenProp { token, prop } => {
                let id = self.resolve_token(token)?;
                Ok(state.zones.token(id)?.prop(prop))
            }
            // Saturating so extreme operands stay deterministic across
            // build profiles instead of panicking in debug.
            ValueExpr::Add(a, b) => {
                Ok(self.eval(state, a)?.saturating_add(self.eval(state, b)?))
            }
            ValueExpr::Sub(a, b) => {
                Ok(self.eval(state, a)?.saturating_sub(self.eval(state, b)?))
            }
            ValueExpr::Mul(a, b) => {
                Ok(self.eval(state, a)?.saturating_mul(self.eval(state, b)?))
            }
            ValueExpr::Min(a, b) => Ok(self.eval(state, a)?.min(self.eval(state, b)?)),
            ValueExpr::Max(a, b) => Ok(self.eval(state, a)?.max(self.eval(state, b)?)),
        }
    }

    /// Evaluate a condition against a state.
    pub fn eval_condition(&self, state: &GameState, condition: &Condition) -> EngineResult<bool> {
        match condition {
            Condition::Always => Ok(true),
            Condition::Never => Ok(false),
            Condition::Compare { op, left, right } => {
                Ok(op.apply(self.eval(state, left)?, self.eval(state, right)?))
            }
            Condition::MarkerIs { marker, state: s } => Ok(state.marker(marker)? == s),
            Condition::InPhase(phase) => Ok(state.phase(&self.def.phases) == phase),
            Condition::Adjacent { a, b } => Ok(self
                .graph
                .adjacent(&self.resolve_zone(a)?, &self.resolve_zone(b)?)),
            Condition::Connected { a, b } => Ok(self
                .graph
                .connected(&self.resolve_zone(a)?, &self.resolve_zone(b)?)),
            Condition::All(conditions) => {
                for c in conditions {
                    if !self.eval_condition(state, c)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Condition::Any(conditions) => {
                for c in conditions {
                    if self.eval_condition(state, c)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Condition::Not(inner) => Ok(!self.eval_condition(state, inner)?),
        }
    }
}
