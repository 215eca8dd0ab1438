//! Turnwise is a deterministic rules engine for turn-based multiplayer
//! games. A game is described declaratively as a [`GameDef`] — variables,
//! zones, tokens, markers, actions with effect programs, triggers, phases,
//! and a turn-order policy — and the engine interprets that definition
//! against an immutable-feeling [`GameState`].
//!
//! The engine guarantees:
//!
//! - **Determinism.** Same definition, same seed, same move sequence,
//!   same resulting state. All randomness flows through a counted
//!   ChaCha stream whose position is part of the state.
//! - **Legality parity.** [`Engine::legal_moves`],
//!   [`Engine::legal_choices`], and [`Engine::apply_move`] share one
//!   validation path, so a move reported legal is a move that applies.
//! - **Bounded execution.** Effect programs are charged against an
//!   operation budget and trigger cascades against a depth limit, so a
//!   malformed definition fails loudly instead of hanging.
//!
//! ```no_run
//! use turnwise::{Engine, GameDef};
//!
//! # fn demo(def: GameDef) -> turnwise::EngineResult<()> {
//! let engine = Engine::new(&def)?;
//! let state = engine.initial_state(42, 2)?;
//!
//! for mv in engine.legal_moves(&state)? {
//!     println!("legal: {} by seat {}", mv.action, mv.seat.index());
//! }
//! # Ok(())
//! # }
//! ```

pub mod core;
pub mod def;
pub mod effects;
pub mod engine;
pub mod flow;
pub mod spatial;
pub mod trace;
pub mod triggers;
pub mod zones;

pub use crate::core::{
    EngineError, EngineResult, GameState, IllegalMoveReason, Move, ParamValue, Scalar, SeatId,
    TokenId,
};
pub use crate::def::GameDef;
pub use crate::effects::{Decision, PendingChoice};
pub use crate::engine::{Engine, GameResult, MoveProbe};
pub use crate::trace::{TraceCollector, TraceEntry};
