//! Survey session state machine
//!
//! Elm-style: a pure `transition` returns the next state plus the effects the
//! executor has to perform.

mod effect;
pub mod input;
pub mod state;
pub(crate) mod transition;

#[cfg(test)]
mod proptests;

pub use effect::{Effect, Prompt};
pub use input::Input;
#[allow(unused_imports)] // Public API re-exports
pub use state::{CompletedRound, Session, SurveyContext, SurveyState};
#[allow(unused_imports)]
pub use transition::{transition, TransitionError};
