//! Event-matched trigger dispatch.

mod dispatch;
mod event;

pub use dispatch::{dispatch, dispatch_emitted};
pub use event::EngineEvent;
