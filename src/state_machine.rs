//! Session state machine
//!
//! Implements the Elm Architecture pattern with pure state transitions.
//! The runtime owns the current [`SessionState`], feeds it [`Event`]s and
//! executes the returned [`Effect`]s.

mod effect;
pub mod event;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::Effect;
pub use event::Event;
pub use state::{AnalysisStage, Phase, SessionContext, SessionState};
pub use transition::{transition, TransitionError};
