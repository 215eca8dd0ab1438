//! Core state types: identities, scalar values, errors, RNG, the game
//! state itself, and its canonical digest.

mod entity;
mod error;
pub mod hash;
mod rng;
mod state;
mod value;

pub use entity::{SeatId, SeatMap, TokenId};
pub use error::{ChoiceFailure, EngineError, EngineResult, IllegalMoveReason};
pub use hash::state_digest;
pub use rng::{GameRng, RngPosition};
pub use state::{GameState, Move};
pub use value::{ParamValue, Scalar};
