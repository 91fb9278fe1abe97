//! Inputs that drive state transitions
//!
//! Raw transport text is resolved once, against the current state, into a
//! closed set of variants. The transition function never compares strings.

use super::state::SurveyState;
use crate::assessment::AnswerOption;
use crate::catalog::Catalog;

/// Keyboard label that starts another survey after a completed round
pub const RESTART_LABEL: &str = "Take another survey";
/// Keyboard label that ends the conversation
pub const EXIT_LABEL: &str = "Exit";

pub const START_COMMAND: &str = "/start";
pub const CANCEL_COMMAND: &str = "/cancel";
/// Privileged command, handled by the controller before the state machine
pub const EXPORT_COMMAND: &str = "/export";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// `/start`: begin again from the name prompt
    Start,
    Name(String),
    Category(String),
    Answer(AnswerOption),
    Restart,
    Exit,
    /// Text that means nothing in the current state
    Unrecognized(String),
}

impl Input {
    pub fn resolve(text: &str, state: &SurveyState, catalog: &Catalog) -> Self {
        match text {
            START_COMMAND => return Input::Start,
            CANCEL_COMMAND => return Input::Exit,
            _ => {}
        }

        match state {
            SurveyState::AwaitingName => Input::Name(text.to_string()),
            SurveyState::SelectingCategory { .. } => match text {
                RESTART_LABEL => Input::Restart,
                EXIT_LABEL => Input::Exit,
                name if catalog.contains(name) => Input::Category(name.to_string()),
                other => Input::Unrecognized(other.to_string()),
            },
            SurveyState::AnsweringQuestion { .. } => match text {
                EXIT_LABEL => Input::Exit,
                other => AnswerOption::from_label(other)
                    .map_or_else(|| Input::Unrecognized(other.to_string()), Input::Answer),
            },
            SurveyState::Terminated => Input::Unrecognized(text.to_string()),
        }
    }
}
