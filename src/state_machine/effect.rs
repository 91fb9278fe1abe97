//! Effects produced by state transitions

use super::input::EXIT_LABEL;
use super::state::CompletedRound;
use crate::assessment::AnswerOption;
use serde::{Deserialize, Serialize};

/// Outbound text with an optional keyboard of choices
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Prompt {
    pub text: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<String>,
}

impl Prompt {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            choices: vec![],
        }
    }

    pub fn with_choices(text: impl Into<String>, choices: Vec<String>) -> Self {
        Self {
            text: text.into(),
            choices,
        }
    }

    /// Category menu followed by the exit button
    pub fn category_menu(text: impl Into<String>, categories: &[&str]) -> Self {
        let choices = categories
            .iter()
            .map(|c| (*c).to_string())
            .chain(std::iter::once(EXIT_LABEL.to_string()))
            .collect();
        Self::with_choices(text, choices)
    }

    /// Answer options followed by the exit button
    pub fn answer_keyboard(text: impl Into<String>) -> Self {
        let mut choices = AnswerOption::labels();
        choices.push(EXIT_LABEL.to_string());
        Self::with_choices(text, choices)
    }
}

/// Effects to be executed after a state transition
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// Send a prompt to the respondent
    Reply(Prompt),

    /// Score the round, persist the report, show the summary and notify the admin
    CompleteRound(CompletedRound),

    /// Drop the session once the reply has been delivered
    EndConversation,
}

impl Effect {
    pub fn reply(text: impl Into<String>) -> Self {
        Effect::Reply(Prompt::text(text))
    }
}
