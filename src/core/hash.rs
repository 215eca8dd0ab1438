//! Canonical state digest.
//!
//! The digest walks every field of the state in a fixed order, visiting
//! map entries in sorted key order so iteration nondeterminism never
//! leaks into the result. Strings are length-prefixed to keep the
//! encoding prefix-free. The SHA-256 output is truncated to a `u64`.
//!
//! Two states with equal digests are treated as identical by replay
//! tooling, so everything observable must feed the digest; only the
//! stored hash itself is excluded.

use sha2::{Digest, Sha256};

use crate::core::{GameState, Move, ParamValue, Scalar, SeatId};
use crate::def::{ActionClass, EligibilityWindow};
use crate::effects::Decision;
use crate::flow::{CardFlowState, EligibilityOverride, TurnFlowState};

/// Incremental canonical hasher.
struct Canon {
    sha: Sha256,
}

impl Canon {
    fn new() -> Self {
        Self { sha: Sha256::new() }
    }

    fn str(&mut self, s: &str) {
        self.u64(s.len() as u64);
        self.sha.update(s.as_bytes());
    }

    fn u8(&mut self, v: u8) {
        self.sha.update([v]);
    }

    fn bool(&mut self, v: bool) {
        self.u8(u8::from(v));
    }

    fn u32(&mut self, v: u32) {
        self.sha.update(v.to_be_bytes());
    }

    fn u64(&mut self, v: u64) {
        self.sha.update(v.to_be_bytes());
    }

    fn u128(&mut self, v: u128) {
        self.sha.update(v.to_be_bytes());
    }

    fn i64(&mut self, v: Scalar) {
        self.sha.update(v.to_be_bytes());
    }

    fn seat(&mut self, seat: SeatId) {
        self.u8(seat.0);
    }

    fn finish(self) -> u64 {
        let bytes = self.sha.finalize();
        u64::from_be_bytes([
            bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
        ])
    }
}

/// Compute the canonical digest of a state.
#[must_use]
pub fn state_digest(state: &GameState) -> u64 {
    let mut h = Canon::new();

    h.u64(state.seat_count as u64);

    sorted_scalars(&mut h, state.globals.iter());
    for (_, vars) in state.seat_vars.iter() {
        sorted_scalars(&mut h, vars.iter());
    }

    let mut zone_var_ids: Vec<&String> = state.zone_vars.keys().collect();
    zone_var_ids.sort();
    h.u64(zone_var_ids.len() as u64);
    for id in zone_var_ids {
        h.str(id);
        sorted_scalars(&mut h, state.zone_vars[id].iter());
    }

    let mut zone_ids: Vec<&str> = state.zones.zone_ids().collect();
    zone_ids.sort_unstable();
    h.u64(zone_ids.len() as u64);
    for id in zone_ids {
        h.str(id);
        if let Ok(contents) = state.zones.contents(id) {
            h.u64(contents.len() as u64);
            for &token_id in contents {
                h.u32(token_id.raw());
                if let Ok(token) = state.zones.token(token_id) {
                    h.str(&token.token_type);
                    sorted_scalars(&mut h, token.props.iter());
                }
            }
        }
    }

    let mut marker_names: Vec<&String> = state.markers.keys().collect();
    marker_names.sort();
    h.u64(marker_names.len() as u64);
    for name in marker_names {
        h.str(name);
        h.str(&state.markers[name]);
    }

    let position = state.rng.position();
    h.u64(position.seed);
    h.u128(position.word_pos);

    h.u64(state.phase_index as u64);
    h.u32(state.turn);
    h.seat(state.active_seat);

    flow_digest(&mut h, &state.flow);

    sorted_u32s(&mut h, state.action_uses.iter());
    sorted_u32s(&mut h, state.action_uses_phase.iter());
    sorted_u32s(&mut h, state.action_uses_game.iter());

    h.finish()
}

fn sorted_scalars<'a>(h: &mut Canon, entries: impl Iterator<Item = (&'a String, &'a Scalar)>) {
    let mut sorted: Vec<(&String, &Scalar)> = entries.collect();
    sorted.sort_by_key(|(k, _)| *k);
    h.u64(sorted.len() as u64);
    for (key, value) in sorted {
        h.str(key);
        h.i64(*value);
    }
}

fn sorted_u32s<'a>(h: &mut Canon, entries: impl Iterator<Item = (&'a String, &'a u32)>) {
    let mut sorted: Vec<(&String, &u32)> = entries.collect();
    sorted.sort_by_key(|(k, _)| *k);
    h.u64(sorted.len() as u64);
    for (key, value) in sorted {
        h.str(key);
        h.u32(*value);
    }
}

fn flow_digest(h: &mut Canon, flow: &TurnFlowState) {
    match flow {
        TurnFlowState::RoundRobin => h.u8(0),
        TurnFlowState::FixedOrder { index } => {
            h.u8(1);
            h.u64(*index as u64);
        }
        TurnFlowState::Simultaneous { submitted } => {
            h.u8(2);
            h.u64(submitted.len() as u64);
            for slot in submitted {
                match slot {
                    Some(mv) => {
                        h.bool(true);
                        move_digest(h, mv);
                    }
                    None => h.bool(false),
                }
            }
        }
        TurnFlowState::CardDriven(card) => {
            h.u8(3);
            card_digest(h, card);
        }
    }
}

fn card_digest(h: &mut Canon, card: &CardFlowState) {
    for (_, &flag) in card.eligible.iter() {
        h.bool(flag);
    }
    for (_, &flag) in card.acted.iter() {
        h.bool(flag);
    }
    for (_, &flag) in card.passed.iter() {
        h.bool(flag);
    }
    match card.first_actor {
        Some(seat) => {
            h.bool(true);
            h.seat(seat);
        }
        None => h.bool(false),
    }
    match card.first_class {
        Some(class) => {
            h.bool(true);
            h.u8(class_tag(class));
        }
        None => h.bool(false),
    }
    h.u32(card.non_pass_count);
    h.u64(card.overrides.len() as u64);
    for over in &card.overrides {
        override_digest(h, over);
    }
    h.u64(card.free_grants.len() as u64);
    for &seat in &card.free_grants {
        h.seat(seat);
    }
    match &card.last_pivotal {
        Some(action) => {
            h.bool(true);
            h.str(action);
        }
        None => h.bool(false),
    }
    h.u32(card.round);
    h.u32(card.cycle);
}

fn override_digest(h: &mut Canon, over: &EligibilityOverride) {
    h.seat(over.seat);
    h.bool(over.make_eligible);
    h.u8(match over.window {
        EligibilityWindow::ThisCard => 0,
        EligibilityWindow::NextCard => 1,
        EligibilityWindow::ThisRound => 2,
        EligibilityWindow::ThisCycle => 3,
    });
    h.bool(over.pending);
}

fn class_tag(class: ActionClass) -> u8 {
    match class {
        ActionClass::Operation => 0,
        ActionClass::LimitedOperation => 1,
        ActionClass::OperationPlusSpecialActivity => 2,
        ActionClass::Pass => 3,
        ActionClass::Event => 4,
        ActionClass::Pivotal => 5,
    }
}

fn move_digest(h: &mut Canon, mv: &Move) {
    h.seat(mv.seat);
    h.str(&mv.action);
    h.u64(mv.params.len() as u64);
    for (name, value) in &mv.params {
        h.str(name);
        param_digest(h, value);
    }
    h.u64(mv.decisions.len() as u64);
    for decision in &mv.decisions {
        decision_digest(h, decision);
    }
    h.bool(mv.free_action);
}

fn decision_digest(h: &mut Canon, decision: &Decision) {
    h.str(&decision.choice);
    param_digest(h, &decision.value);
    h.seat(decision.decided_by);
}

fn param_digest(h: &mut Canon, value: &ParamValue) {
    match value {
        ParamValue::Scalar(v) => {
            h.u8(0);
            h.i64(*v);
        }
        ParamValue::Token(id) => {
            h.u8(1);
            h.u32(id.raw());
        }
        ParamValue::Zone(zone) => {
            h.u8(2);
            h.str(zone);
        }
        ParamValue::Seat(seat) => {
            h.u8(3);
            h.seat(*seat);
        }
        ParamValue::List(items) => {
            h.u8(4);
            h.u64(items.len() as u64);
            for item in items {
                param_digest(h, item);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_param_digest_distinguishes_kinds() {
        // Scalar(2) vs Seat(2) must not collide.
        let digest_of = |value: &ParamValue| {
            let mut h = Canon::new();
            param_digest(&mut h, value);
            h.finish()
        };
        assert_ne!(
            digest_of(&ParamValue::Scalar(2)),
            digest_of(&ParamValue::Seat(SeatId::new(2)))
        );
        assert_ne!(
            digest_of(&ParamValue::List(vec![])),
            digest_of(&ParamValue::Scalar(0))
        );
    }

    #[test]
    fn test_string_encoding_prefix_free() {
        let digest_of = |parts: &[&str]| {
            let mut h = Canon::new();
            for p in parts {
                h.str(p);
            }
            h.finish()
        };
        assert_ne!(digest_of(&["ab", "c"]), digest_of(&["a", "bc"]));
    }
}
