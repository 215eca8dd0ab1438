//! Public engine operations.
//!
//! An [`Engine`] borrows a validated definition and exposes the pure
//! transformations callers drive a game with: `initial_state`,
//! `legal_moves`, `legal_choices`, `apply_move`, `advance_phase`,
//! `advance_to_decision_point`, and `terminal_result`. Every operation
//! is deterministic given identical inputs including the RNG seed, and
//! none mutates its input state: each returns a fresh successor.
//!
//! ## Three-surface parity
//!
//! `legal_moves`, `legal_choices`, and `apply_move` agree by
//! construction: all three route a move through the same gate and the
//! same interpreter, so a reason `legal_choices` reports as `Illegal`
//! is exactly the reason `apply_move` raises, and a move `legal_moves`
//! enumerates is exactly one `legal_choices` calls `Complete`.

use crate::core::{
    ChoiceFailure, EngineError, EngineResult, GameState, IllegalMoveReason, Move, ParamValue,
    Scalar, SeatId, SeatMap,
};
use crate::def::{
    ActionClass, ActionDef, GameDef, OperationProfile, TurnOrderDef, ZoneOwnership,
};
use crate::effects::{
    AuthorityCheck, ChoiceMode, Decision, EffectOutcome, Interpreter, PendingChoice, VarScope,
};
use crate::flow::{self, TurnFlowState};
use crate::spatial::AdjacencyGraph;
use crate::trace::{TraceCollector, TraceEntry};
use crate::triggers::{self, EngineEvent};
use crate::zones::ZoneStore;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Outcome of a finished game.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameResult {
    /// A single winning seat.
    Winner(SeatId),
    /// No winner.
    Draw,
}

/// What probing a (possibly partial) move reports.
#[derive(Clone, Debug, PartialEq)]
pub enum MoveProbe {
    /// Every decision is supplied and valid; the move is ready to
    /// apply.
    Complete,
    /// The next undecided choice and its option domain.
    Pending(PendingChoice),
    /// The move is not admissible, with the same reason `apply_move`
    /// would raise.
    Illegal(IllegalMoveReason),
}

/// Where a cost debit lands.
enum CostSlot {
    Global,
    Seat(SeatId),
    Zone(String),
}

/// The rules engine for one game definition.
pub struct Engine<'d> {
    def: &'d GameDef,
    graph: AdjacencyGraph,
}

impl<'d> Engine<'d> {
    /// Create an engine, running engine-side definition validation.
    pub fn new(def: &'d GameDef) -> EngineResult<Self> {
        def.validate()?;
        let graph = AdjacencyGraph::from_edges(
            def.adjacency.iter().map(|(a, b)| (a.as_str(), b.as_str())),
        );
        Ok(Self { def, graph })
    }

    /// The definition this engine runs.
    #[must_use]
    pub fn def(&self) -> &'d GameDef {
        self.def
    }

    // === Initialization ===

    /// Build the initial state for a seed and seat count, running the
    /// definition's setup effects and firing the opening turn-start and
    /// phase-enter triggers.
    pub fn initial_state(&self, seed: u64, seat_count: usize) -> EngineResult<GameState> {
        if seat_count == 0 || seat_count > 255 {
            return Err(EngineError::Validation(format!(
                "seat count {seat_count} outside 1-255"
            )));
        }
        self.check_seat_references(seat_count)?;

        let mut globals = FxHashMap::default();
        for var in &self.def.globals {
            globals.insert(var.name.clone(), var.default);
        }

        let seat_vars = SeatMap::new(seat_count, |_| {
            let mut vars = FxHashMap::default();
            for var in &self.def.seat_vars {
                vars.insert(var.name.clone(), var.default);
            }
            vars
        });

        let mut zones = ZoneStore::new();
        let mut zone_vars: FxHashMap<String, FxHashMap<String, Scalar>> = FxHashMap::default();
        for zone in &self.def.zones {
            let instances: Vec<String> = match zone.owner {
                ZoneOwnership::None => vec![GameDef::zone_instance(&zone.name, None)],
                ZoneOwnership::PerSeat => SeatId::all(seat_count)
                    .map(|seat| GameDef::zone_instance(&zone.name, Some(seat)))
                    .collect(),
            };
            for instance in instances {
                zones.add_zone(instance.clone());
                let mut vars = FxHashMap::default();
                for var in &self.def.zone_vars {
                    vars.insert(var.name.clone(), var.default);
                }
                zone_vars.insert(instance, vars);
            }
        }

        let mut markers = FxHashMap::default();
        for marker in &self.def.markers {
            markers.insert(marker.name.clone(), marker.initial.clone());
        }

        let flow_state = TurnFlowState::initial(&self.def.turn_order, seat_count);
        let mut state = GameState {
            seat_count,
            globals,
            seat_vars,
            zone_vars,
            zones,
            markers,
            rng: crate::core::GameRng::new(seed),
            phase_index: 0,
            turn: 0,
            active_seat: SeatId::new(0),
            flow: flow_state,
            action_uses: FxHashMap::default(),
            action_uses_phase: FxHashMap::default(),
            action_uses_game: FxHashMap::default(),
            hash: 0,
        };
        if let Some(seat) = flow::expected_actor(self.def, &state) {
            state.active_seat = seat;
        }

        let mut trace = TraceCollector::disabled();
        if !self.def.setup.is_empty() {
            let mut interp = Interpreter::new(
                self.def,
                &self.graph,
                state.active_seat,
                ChoiceMode::Execution,
                AuthorityCheck::Strict,
                &[],
                &[],
            )?;
            interp.run(&mut state, &self.def.setup, &mut trace)?;
            let emitted = interp.take_emitted();
            triggers::dispatch_emitted(self.def, &self.graph, &mut state, emitted, 0, &mut trace)?;
        }

        triggers::dispatch(
            self.def,
            &self.graph,
            &mut state,
            &EngineEvent::TurnStart,
            &mut trace,
        )?;
        let first_phase = self.def.phases[0].name.clone();
        triggers::dispatch(
            self.def,
            &self.graph,
            &mut state,
            &EngineEvent::PhaseEnter(first_phase),
            &mut trace,
        )?;

        state.refresh_hash();
        Ok(state)
    }

    fn check_seat_references(&self, seat_count: usize) -> EngineResult<()> {
        let seats: Vec<SeatId> = match &self.def.turn_order {
            TurnOrderDef::FixedOrder(order) => order.clone(),
            TurnOrderDef::CardDriven(card) => card.seat_order.clone(),
            TurnOrderDef::RoundRobin | TurnOrderDef::Simultaneous => Vec::new(),
        };
        for seat in seats {
            if seat.index() >= seat_count {
                return Err(EngineError::UnmappedSeat { seat });
            }
        }
        Ok(())
    }

    // === Legality surfaces ===

    /// Enumerate the fully-specified moves currently admissible for
    /// parameterless actions, expanding every pending choice into one
    /// move per valid decision sequence.
    ///
    /// Actions with declared parameters have open value domains and
    /// are probed through [`Engine::legal_choices`] instead.
    pub fn legal_moves(&self, state: &GameState) -> EngineResult<Vec<Move>> {
        let mut seats: Vec<(SeatId, bool)> = Vec::new();
        if let Some(seat) = flow::expected_actor(self.def, state) {
            seats.push((seat, false));
        }
        if let TurnFlowState::Simultaneous { submitted } = &state.flow {
            seats.clear();
            for (i, slot) in submitted.iter().enumerate() {
                if slot.is_none() {
                    seats.push((SeatId::new(i as u8), false));
                }
            }
        }
        if let TurnFlowState::CardDriven(card) = &state.flow {
            for &seat in &card.free_grants {
                if !seats.contains(&(seat, true)) {
                    seats.push((seat, true));
                }
            }
        }

        let mut moves = Vec::new();
        for action in &self.def.actions {
            if !action.params.is_empty() {
                continue;
            }
            for &(seat, free) in &seats {
                let mut base = Move::new(seat, action.name.clone());
                base.free_action = free;
                self.expand_choices(state, base, &mut moves)?;
            }
        }
        Ok(moves)
    }

    fn expand_choices(
        &self,
        state: &GameState,
        mv: Move,
        out: &mut Vec<Move>,
    ) -> EngineResult<()> {
        match self.legal_choices(state, &mv)? {
            MoveProbe::Illegal(_) => Ok(()),
            MoveProbe::Complete => {
                out.push(mv);
                Ok(())
            }
            MoveProbe::Pending(pending) => {
                if pending.count == 1 {
                    for option in pending.options {
                        let next = mv.clone().with_decision(Decision::new(
                            pending.choice.clone(),
                            option,
                            pending.chooser,
                        ));
                        self.expand_choices(state, next, out)?;
                    }
                } else {
                    for combo in combinations(&pending.options, pending.count) {
                        let next = mv.clone().with_decision(Decision::new(
                            pending.choice.clone(),
                            ParamValue::List(combo),
                            pending.chooser,
                        ));
                        self.expand_choices(state, next, out)?;
                    }
                }
                Ok(())
            }
        }
    }

    /// Probe a partially-specified move under strict ownership
    /// enforcement.
    pub fn legal_choices(&self, state: &GameState, mv: &Move) -> EngineResult<MoveProbe> {
        self.probe(state, mv, AuthorityCheck::Strict)
    }

    /// Probe without asserting who supplied the decisions. An
    /// authority mismatch surfaces as the distinguished
    /// [`EngineError::ChoiceProbeAuthorityMismatch`] instead of an
    /// illegal reason, so tooling can tell "not yet decided" from
    /// "decided by someone else".
    pub fn legal_choices_probe(&self, state: &GameState, mv: &Move) -> EngineResult<MoveProbe> {
        self.probe(state, mv, AuthorityCheck::Probe)
    }

    fn probe(
        &self,
        state: &GameState,
        mv: &Move,
        authority: AuthorityCheck,
    ) -> EngineResult<MoveProbe> {
        // Discovery runs against a scratch clone; its partial mutations
        // are discarded along with the clone.
        let mut scratch = state.clone();
        let mut trace = TraceCollector::disabled();
        match self.run_move(&mut scratch, mv, ChoiceMode::Discovery, authority, true, &mut trace)
        {
            Ok(EffectOutcome::Done) => Ok(MoveProbe::Complete),
            Ok(EffectOutcome::Pending(pending)) => Ok(MoveProbe::Pending(pending)),
            Err(err) => match err.as_illegal_reason() {
                Some(reason) => Ok(MoveProbe::Illegal(reason)),
                None => Err(err),
            },
        }
    }

    // === Application ===

    /// Apply a fully-specified move, returning the successor state.
    ///
    /// Application is atomic: on any failure the input state is
    /// untouched and no partial successor escapes. Rejections carry
    /// the same [`IllegalMoveReason`] that [`Engine::legal_choices`]
    /// reports for the same input.
    pub fn apply_move(
        &self,
        state: &GameState,
        mv: &Move,
        trace: &mut TraceCollector,
    ) -> EngineResult<GameState> {
        if matches!(state.flow, TurnFlowState::Simultaneous { .. }) {
            return self.apply_simultaneous(state, mv, trace);
        }

        let mut next = state.clone();
        match self.run_move(
            &mut next,
            mv,
            ChoiceMode::Execution,
            AuthorityCheck::Strict,
            true,
            trace,
        ) {
            Ok(EffectOutcome::Done) => {
                if let Some(seat) = flow::expected_actor(self.def, &next) {
                    next.active_seat = seat;
                }
                next.refresh_hash();
                debug!(
                    action = %mv.action,
                    seat = mv.seat.index(),
                    hash = next.hash,
                    "move applied"
                );
                Ok(next)
            }
            Ok(EffectOutcome::Pending(pending)) => Err(EngineError::InternalInvariant(format!(
                "execution mode yielded a pending choice `{}`",
                pending.choice
            ))),
            Err(err) => Err(Self::to_illegal(err)),
        }
    }

    /// Simultaneous policy: buffer the submission; once every seat has
    /// submitted, resolve the buffered moves in seat order.
    fn apply_simultaneous(
        &self,
        state: &GameState,
        mv: &Move,
        trace: &mut TraceCollector,
    ) -> EngineResult<GameState> {
        // A submission is validated in full against the pre-resolution
        // state, decisions included: an invalid move must never reach
        // the buffer, where it would fail on another seat's apply and
        // wedge the whole batch.
        match self.probe(state, mv, AuthorityCheck::Strict)? {
            MoveProbe::Complete => {}
            MoveProbe::Pending(pending) => {
                return Err(EngineError::ChoiceValidation {
                    choice: pending.choice,
                    failure: ChoiceFailure::Undecided,
                })
            }
            MoveProbe::Illegal(reason) => return Err(EngineError::IllegalMove(reason)),
        }

        let mut next = state.clone();
        let all_in = {
            let submitted = match &mut next.flow {
                TurnFlowState::Simultaneous { submitted } => submitted,
                other => {
                    return Err(EngineError::InternalInvariant(format!(
                        "simultaneous apply on {other:?} flow state"
                    )))
                }
            };
            submitted[mv.seat.index()] = Some(mv.clone());
            submitted.iter().all(Option::is_some)
        };

        if all_in {
            let batch: Vec<Move> = {
                let submitted = match &mut next.flow {
                    TurnFlowState::Simultaneous { submitted } => submitted,
                    other => {
                        return Err(EngineError::InternalInvariant(format!(
                            "simultaneous apply on {other:?} flow state"
                        )))
                    }
                };
                submitted.iter_mut().filter_map(Option::take).collect()
            };
            // Deterministic interleaving: buffered moves resolve in
            // seat order against the state each predecessor left.
            for buffered in &batch {
                match self.run_move(
                    &mut next,
                    buffered,
                    ChoiceMode::Execution,
                    AuthorityCheck::Strict,
                    false,
                    trace,
                ) {
                    Ok(EffectOutcome::Done) => {}
                    Ok(EffectOutcome::Pending(pending)) => {
                        return Err(EngineError::InternalInvariant(format!(
                            "execution mode yielded a pending choice `{}`",
                            pending.choice
                        )))
                    }
                    Err(err) => return Err(Self::to_illegal(err)),
                }
            }
        }

        if let Some(seat) = flow::expected_actor(self.def, &next) {
            next.active_seat = seat;
        }
        next.refresh_hash();
        Ok(next)
    }

    fn to_illegal(err: EngineError) -> EngineError {
        match err.as_illegal_reason() {
            Some(reason) => EngineError::IllegalMove(reason),
            None => err,
        }
    }

    /// Gate + cost debit + profile effects + flow update. Shared by
    /// every surface so they cannot disagree.
    fn run_move(
        &self,
        state: &mut GameState,
        mv: &Move,
        mode: ChoiceMode,
        authority: AuthorityCheck,
        enforce_actor: bool,
        trace: &mut TraceCollector,
    ) -> EngineResult<EffectOutcome> {
        let (action, profile) = match self.gate(state, mv, enforce_actor)? {
            Ok(gated) => gated,
            Err(reason) => return Err(EngineError::IllegalMove(reason)),
        };

        let mut interp = Interpreter::new(
            self.def,
            &self.graph,
            mv.seat,
            mode,
            authority,
            &mv.params,
            &mv.decisions,
        )?;

        if let Some(profile) = profile {
            if let Some(cost) = &profile.cost {
                let required = interp.eval(state, &cost.amount)?;
                let slot = self.resolve_cost_slot(&interp, &cost.scope)?;
                let current = self.read_slot(state, &slot, &cost.var)?;
                let min = self.slot_min(&slot, &cost.var);
                let headroom = (current - min).max(0);
                // Non-partial profiles were validated in the gate;
                // partial ones debit what they can afford.
                let debit = if profile.partial_execution {
                    required.min(headroom).max(0)
                } else {
                    required
                };
                self.write_slot(state, &slot, &cost.var, current - debit);
                trace.record(TraceEntry::VarChanged {
                    scope: self.slot_label(&slot),
                    var: cost.var.clone(),
                    old: current,
                    new: current - debit,
                });
            }

            match interp.run(state, &profile.effects, trace)? {
                EffectOutcome::Done => {}
                pending @ EffectOutcome::Pending(_) => return Ok(pending),
            }
        }

        let emitted = interp.take_emitted();
        triggers::dispatch_emitted(self.def, &self.graph, state, emitted, 0, trace)?;

        *state.action_uses.entry(action.name.clone()).or_insert(0) += 1;
        *state
            .action_uses_phase
            .entry(action.name.clone())
            .or_insert(0) += 1;
        *state
            .action_uses_game
            .entry(action.name.clone())
            .or_insert(0) += 1;
        flow::after_move(
            self.def,
            state,
            mv.seat,
            &action.name,
            action.class,
            mv.free_action,
            trace,
        )?;
        Ok(EffectOutcome::Done)
    }

    /// Every admissibility check that precedes effect execution.
    /// Returns the selected profile on success, the illegal reason on
    /// rejection.
    #[allow(clippy::type_complexity)]
    fn gate(
        &self,
        state: &GameState,
        mv: &Move,
        enforce_actor: bool,
    ) -> EngineResult<Result<(&'d ActionDef, Option<&'d OperationProfile>), IllegalMoveReason>>
    {
        let action = match self.def.action(&mv.action) {
            Some(action) => action,
            None => {
                return Ok(Err(IllegalMoveReason::UnknownAction {
                    action: mv.action.clone(),
                }))
            }
        };

        if let Some(phase) = &action.phase {
            let current = state.phase(&self.def.phases);
            if phase != current {
                return Ok(Err(IllegalMoveReason::PhaseMismatch {
                    action: action.name.clone(),
                    phase: current.to_string(),
                }));
            }
        }

        if enforce_actor {
            if let Err(reason) = flow::seat_may_act(self.def, state, mv.seat, mv.free_action) {
                return Ok(Err(reason));
            }
        }

        if let Some(limit) = action.limit_per_turn {
            if state.uses_this_turn(&action.name) >= limit {
                return Ok(Err(IllegalMoveReason::ActionLimitExceeded {
                    action: action.name.clone(),
                    limit,
                }));
            }
        }

        // Option-matrix constraint on the second actor. Free actions
        // run outside the activation sequence and bypass it.
        if !mv.free_action && !flow::class_allowed(self.def, state, action.class) {
            return Ok(Err(IllegalMoveReason::ClassNotAllowed {
                class: action.class,
            }));
        }

        if let Some(reason) = self.monsoon_gate(state, action, mv)? {
            return Ok(Err(reason));
        }

        if action.class == ActionClass::LimitedOperation {
            if let Some((param, cap)) = &action.limited_param_cap {
                if let Some(value) = mv.param(param).and_then(ParamValue::as_scalar) {
                    if value > *cap {
                        return Ok(Err(IllegalMoveReason::ActionForbiddenThisRound {
                            action: action.name.clone(),
                        }));
                    }
                }
            }
        }

        let prober = self.prober(mv)?;

        if action.class == ActionClass::Pivotal {
            let pivotal = action.pivotal.as_ref().ok_or_else(|| {
                EngineError::InternalInvariant(format!(
                    "pivotal action `{}` without pivotal declaration",
                    action.name
                ))
            })?;
            if !prober.eval_condition(state, &pivotal.precondition)? {
                return Ok(Err(IllegalMoveReason::PivotalBlocked {
                    action: action.name.clone(),
                }));
            }
            if let TurnFlowState::CardDriven(card) = &state.flow {
                if let Some(prev) = &card.last_pivotal {
                    if pivotal.cancelled_by.contains(prev) {
                        return Ok(Err(IllegalMoveReason::CancelledByInterrupt {
                            action: action.name.clone(),
                            by: prev.clone(),
                        }));
                    }
                }
            }
        }

        let profile = match self.select_profile(state, action, &prober)? {
            Ok(profile) => profile,
            Err(reason) => return Ok(Err(reason)),
        };

        if let Some(profile) = profile {
            if let Some(legality) = &profile.legality {
                if !prober.eval_condition(state, legality)? {
                    return Ok(Err(IllegalMoveReason::ProfileLegalityFailed {
                        action: action.name.clone(),
                    }));
                }
            }
            if let Some(cost) = &profile.cost {
                if !profile.partial_execution {
                    let required = prober.eval(state, &cost.amount)?;
                    let slot = self.resolve_cost_slot(&prober, &cost.scope)?;
                    let available = self.read_slot(state, &slot, &cost.var)?
                        - self.slot_min(&slot, &cost.var);
                    if available < required {
                        return Ok(Err(IllegalMoveReason::ProfileCostValidationFailed {
                            action: action.name.clone(),
                            var: cost.var.clone(),
                            required,
                            available,
                        }));
                    }
                }
            }
        }

        Ok(Ok((action, profile)))
    }

    fn monsoon_gate(
        &self,
        state: &GameState,
        action: &ActionDef,
        mv: &Move,
    ) -> EngineResult<Option<IllegalMoveReason>> {
        let monsoon = match &self.def.turn_order {
            TurnOrderDef::CardDriven(card_def) => match &card_def.monsoon {
                Some(monsoon) => monsoon,
                None => return Ok(None),
            },
            TurnOrderDef::RoundRobin | TurnOrderDef::FixedOrder(_) | TurnOrderDef::Simultaneous => {
                return Ok(None)
            }
        };
        if state.marker(&monsoon.marker)? != monsoon.state {
            return Ok(None);
        }

        if monsoon.forbidden_actions.contains(&action.name) {
            return Ok(Some(IllegalMoveReason::ActionForbiddenThisRound {
                action: action.name.clone(),
            }));
        }
        for cap in &monsoon.param_caps {
            if cap.action != action.name {
                continue;
            }
            if let Some(value) = mv.param(&cap.param).and_then(ParamValue::as_scalar) {
                if value > cap.max {
                    return Ok(Some(IllegalMoveReason::ActionForbiddenThisRound {
                        action: action.name.clone(),
                    }));
                }
            }
        }
        if action.class == ActionClass::Pivotal && monsoon.block_pivotal {
            let overridden = match &monsoon.override_var {
                Some(var) => state.global(var)? != 0,
                None => false,
            };
            if !overridden {
                return Ok(Some(IllegalMoveReason::PivotalBlocked {
                    action: action.name.clone(),
                }));
            }
        }
        Ok(None)
    }

    fn select_profile(
        &self,
        state: &GameState,
        action: &'d ActionDef,
        prober: &Interpreter<'_>,
    ) -> EngineResult<Result<Option<&'d OperationProfile>, IllegalMoveReason>> {
        if action.profiles.is_empty() {
            return Ok(Ok(None));
        }
        for profile in &action.profiles {
            let applies = match &profile.applicability {
                Some(condition) => prober.eval_condition(state, condition)?,
                None => true,
            };
            if applies {
                return Ok(Ok(Some(profile)));
            }
        }
        Ok(Err(IllegalMoveReason::ProfileNotApplicable {
            action: action.name.clone(),
        }))
    }

    /// A read-only interpreter for gate-time condition evaluation.
    fn prober<'m>(&'m self, mv: &'m Move) -> EngineResult<Interpreter<'m>> {
        Interpreter::new(
            self.def,
            &self.graph,
            mv.seat,
            ChoiceMode::Discovery,
            AuthorityCheck::Probe,
            &mv.params,
            &[],
        )
    }

    // === Cost slots ===

    fn resolve_cost_slot(
        &self,
        interp: &Interpreter<'_>,
        scope: &VarScope,
    ) -> EngineResult<CostSlot> {
        match scope {
            VarScope::Global => Ok(CostSlot::Global),
            VarScope::Seat(seat) => Ok(CostSlot::Seat(interp.resolve_seat(seat)?)),
            VarScope::Zone(zone) => Ok(CostSlot::Zone(interp.resolve_zone(zone)?)),
        }
    }

    fn read_slot(&self, state: &GameState, slot: &CostSlot, var: &str) -> EngineResult<Scalar> {
        match slot {
            CostSlot::Global => state.global(var),
            CostSlot::Seat(seat) => state.seat_var(*seat, var),
            CostSlot::Zone(instance) => state.zone_var(instance, var),
        }
    }

    fn write_slot(&self, state: &mut GameState, slot: &CostSlot, var: &str, value: Scalar) {
        match slot {
            CostSlot::Global => {
                state.globals.insert(var.to_string(), value);
            }
            CostSlot::Seat(seat) => {
                state.seat_vars[*seat].insert(var.to_string(), value);
            }
            CostSlot::Zone(instance) => {
                state
                    .zone_vars
                    .entry(instance.clone())
                    .or_default()
                    .insert(var.to_string(), value);
            }
        }
    }

    fn slot_min(&self, slot: &CostSlot, var: &str) -> Scalar {
        let def = match slot {
            CostSlot::Global => self.def.global_var(var),
            CostSlot::Seat(_) => self.def.seat_var(var),
            CostSlot::Zone(_) => self.def.zone_var(var),
        };
        def.map_or(Scalar::MIN, |v| v.bounds().0)
    }

    fn slot_label(&self, slot: &CostSlot) -> String {
        match slot {
            CostSlot::Global => "global".to_string(),
            CostSlot::Seat(seat) => format!("seat/{}", seat.index()),
            CostSlot::Zone(instance) => instance.clone(),
        }
    }

    // === Phase and turn advancement ===

    /// Advance to the next phase, firing boundary triggers in the
    /// fixed order: phase exit, then (at a turn boundary) turn end and
    /// turn start, then phase enter.
    pub fn advance_phase(
        &self,
        state: &GameState,
        trace: &mut TraceCollector,
    ) -> EngineResult<GameState> {
        let mut next = state.clone();
        let current = self.def.phases[next.phase_index].name.clone();
        let wrap = next.phase_index + 1 == self.def.phases.len();

        triggers::dispatch(
            self.def,
            &self.graph,
            &mut next,
            &EngineEvent::PhaseExit(current),
            trace,
        )?;

        if wrap {
            triggers::dispatch(
                self.def,
                &self.graph,
                &mut next,
                &EngineEvent::TurnEnd,
                trace,
            )?;
            next.turn += 1;
            flow::flow_turn_boundary(self.def, &mut next)?;
            flow::on_turn_start(&mut next);
            triggers::dispatch(
                self.def,
                &self.graph,
                &mut next,
                &EngineEvent::TurnStart,
                trace,
            )?;
        }

        next.phase_index = (next.phase_index + 1) % self.def.phases.len();
        next.action_uses_phase.clear();
        let entered = self.def.phases[next.phase_index].name.clone();
        triggers::dispatch(
            self.def,
            &self.graph,
            &mut next,
            &EngineEvent::PhaseEnter(entered.clone()),
            trace,
        )?;
        trace.record(TraceEntry::PhaseEntered { phase: entered });

        next.refresh_hash();
        Ok(next)
    }

    /// Advance phases until a seat can act or the game is over.
    pub fn advance_to_decision_point(&self, state: &GameState) -> EngineResult<GameState> {
        let mut next = state.clone();
        let mut trace = TraceCollector::disabled();
        // One full turn of phases per attempt, a few turns deep; a
        // definition that never reaches a decision point is malformed.
        let limit = self.def.phases.len() * 8;
        for _ in 0..limit {
            if self.terminal_result(&next)?.is_some()
                || flow::expected_actor(self.def, &next).is_some()
            {
                return Ok(next);
            }
            next = self.advance_phase(&next, &mut trace)?;
        }
        Err(EngineError::InternalInvariant(
            "no decision point reachable by phase advancement".into(),
        ))
    }

    // === Terminal rules ===

    /// Evaluate the terminal rules in declaration order; `None` while
    /// the game is still live.
    pub fn terminal_result(&self, state: &GameState) -> EngineResult<Option<GameResult>> {
        let prober = Interpreter::new(
            self.def,
            &self.graph,
            state.active_seat,
            ChoiceMode::Discovery,
            AuthorityCheck::Probe,
            &[],
            &[],
        )?;
        for rule in &self.def.terminal {
            if !prober.eval_condition(state, &rule.condition)? {
                continue;
            }
            let result = match &rule.result {
                crate::def::ResultSpec::Winner(seat) => GameResult::Winner(*seat),
                crate::def::ResultSpec::Draw => GameResult::Draw,
                crate::def::ResultSpec::WinnerByVar { var, highest } => {
                    if self.def.seat_var(var).is_none() {
                        return Err(EngineError::MissingScoringConfig {
                            what: format!("per-seat variable `{var}`"),
                        });
                    }
                    self.winner_by_var(state, var, *highest)?
                }
            };
            return Ok(Some(result));
        }
        Ok(None)
    }

    fn winner_by_var(
        &self,
        state: &GameState,
        var: &str,
        highest: bool,
    ) -> EngineResult<GameResult> {
        let mut best: Option<(SeatId, Scalar)> = None;
        let mut tied = false;
        for seat in SeatId::all(state.seat_count) {
            let value = state.seat_var(seat, var)?;
            match best {
                None => best = Some((seat, value)),
                Some((_, best_value)) => {
                    let better = if highest {
                        value > best_value
                    } else {
                        value < best_value
                    };
                    if better {
                        best = Some((seat, value));
                        tied = false;
                    } else if value == best_value {
                        tied = true;
                    }
                }
            }
        }
        match best {
            Some((seat, _)) if !tied => Ok(GameResult::Winner(seat)),
            _ => Ok(GameResult::Draw),
        }
    }
}

/// All `k`-element combinations of `options`, preserving option order.
fn combinations(options: &[ParamValue], k: usize) -> Vec<Vec<ParamValue>> {
    let mut out = Vec::new();
    let mut current = Vec::with_capacity(k);
    fn recurse(
        options: &[ParamValue],
        k: usize,
        start: usize,
        current: &mut Vec<ParamValue>,
        out: &mut Vec<Vec<ParamValue>>,
    ) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in start..options.len() {
            current.push(options[i].clone());
            recurse(options, k, i + 1, current, out);
            current.pop();
        }
    }
    recurse(options, k, 0, &mut current, &mut out);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_combinations() {
        let options = vec![
            ParamValue::Scalar(1),
            ParamValue::Scalar(2),
            ParamValue::Scalar(3),
        ];
        let combos = combinations(&options, 2);
        assert_eq!(combos.len(), 3);
        assert_eq!(
            combos[0],
            vec![ParamValue::Scalar(1), ParamValue::Scalar(2)]
        );
        assert_eq!(
            combos[2],
            vec![ParamValue::Scalar(2), ParamValue::Scalar(3)]
        );
    }
}
