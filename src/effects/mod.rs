//! The effect grammar and its budgeted interpreter.

mod choice;
mod condition;
mod effect;
mod interp;
mod value;

pub use choice::{AuthorityCheck, ChoiceMode, Decision, EffectOutcome, PendingChoice};
pub use condition::{CmpOp, Condition};
pub use effect::{ChoiceOptions, Effect, VarScope};
pub use interp::Interpreter;
pub use value::{SeatRef, TokenRef, ValueExpr, ZoneRef};
