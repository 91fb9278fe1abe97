//! Pure state transition function
//!
//! Given the same state, context and input, `transition` always produces the
//! same next state and effects. Scoring, persistence and delivery happen in
//! the executor when it runs the returned effects.

use super::state::CompletedRound;
use super::{Effect, Input, Prompt, SurveyContext, SurveyState};
use thiserror::Error;

const GREETING: &str = "Hello! Please enter your full name to begin the survey:";
const NAME_REPROMPT: &str = "Please enter a valid full name.";
const CATEGORY_REPROMPT: &str = "Please choose a category from the list.";
const NEW_SURVEY_MENU: &str = "Choose a body system for a new survey:";
const ANSWER_REPROMPT: &str = "Please choose one of the answer options below.";
const GOODBYE: &str = "Thank you! Goodbye.";
const CANCELLED: &str = "Survey cancelled.";

/// Result of a state transition
#[derive(Debug)]
pub struct TransitionResult {
    pub new_state: SurveyState,
    pub effects: Vec<Effect>,
}

impl TransitionResult {
    pub fn new(state: SurveyState) -> Self {
        Self {
            new_state: state,
            effects: vec![],
        }
    }

    pub fn with_effect(mut self, effect: Effect) -> Self {
        self.effects.push(effect);
        self
    }
}

/// Errors that can occur during transition
///
/// Invalid respondent input is never an error; it produces a reprompt.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

/// Pure transition function
#[allow(clippy::too_many_lines)]
pub fn transition(
    state: &SurveyState,
    context: &SurveyContext,
    input: Input,
) -> Result<TransitionResult, TransitionError> {
    match (state, input) {
        // ============================================================
        // Start / Exit
        // ============================================================

        (_, Input::Start) => Ok(TransitionResult::new(SurveyState::AwaitingName)
            .with_effect(Effect::reply(GREETING))),

        (SurveyState::AnsweringQuestion { .. }, Input::Exit) => {
            Ok(TransitionResult::new(SurveyState::Terminated)
                .with_effect(Effect::reply(CANCELLED))
                .with_effect(Effect::EndConversation))
        }

        (SurveyState::AwaitingName | SurveyState::SelectingCategory { .. }, Input::Exit) => {
            Ok(TransitionResult::new(SurveyState::Terminated)
                .with_effect(Effect::reply(GOODBYE))
                .with_effect(Effect::EndConversation))
        }

        (SurveyState::Terminated, _) => Ok(TransitionResult::new(SurveyState::Terminated)),

        // ============================================================
        // Name
        // ============================================================

        (SurveyState::AwaitingName, Input::Name(text)) if !text.trim().is_empty() => {
            let full_name = text.trim().to_string();
            let menu = Prompt::category_menu(
                format!("Thank you, {full_name}! Choose a body system for the survey:"),
                &context.catalog.list_categories(),
            );
            Ok(TransitionResult::new(SurveyState::SelectingCategory { full_name })
                .with_effect(Effect::Reply(menu)))
        }

        (SurveyState::AwaitingName, _) => {
            Ok(TransitionResult::new(SurveyState::AwaitingName)
                .with_effect(Effect::reply(NAME_REPROMPT)))
        }

        // ============================================================
        // Category selection
        // ============================================================

        (SurveyState::SelectingCategory { full_name }, Input::Restart) => {
            let menu =
                Prompt::category_menu(NEW_SURVEY_MENU, &context.catalog.list_categories());
            Ok(TransitionResult::new(SurveyState::SelectingCategory {
                full_name: full_name.clone(),
            })
            .with_effect(Effect::Reply(menu)))
        }

        (SurveyState::SelectingCategory { full_name }, Input::Category(name))
            if context.catalog.contains(&name) =>
        {
            let prompt = question_prompt(context, &name, 0)?;
            Ok(TransitionResult::new(SurveyState::AnsweringQuestion {
                full_name: full_name.clone(),
                category: name,
                answers: vec![],
                index: 0,
            })
            .with_effect(Effect::Reply(prompt)))
        }

        (SurveyState::SelectingCategory { full_name }, _) => {
            let menu =
                Prompt::category_menu(CATEGORY_REPROMPT, &context.catalog.list_categories());
            Ok(TransitionResult::new(SurveyState::SelectingCategory {
                full_name: full_name.clone(),
            })
            .with_effect(Effect::Reply(menu)))
        }

        // ============================================================
        // Questions
        // ============================================================

        (
            SurveyState::AnsweringQuestion {
                full_name,
                category,
                answers,
                index,
            },
            Input::Answer(option),
        ) => {
            let questions = &context
                .catalog
                .get_category(category)
                .map_err(|e| TransitionError::InvariantViolation(e.to_string()))?
                .questions;

            let Some(question) = questions.get(*index) else {
                return Err(TransitionError::InvariantViolation(format!(
                    "question index {index} out of range for '{category}'"
                )));
            };
            if answers.len() != *index {
                return Err(TransitionError::InvariantViolation(format!(
                    "{} answers recorded at question index {index}",
                    answers.len()
                )));
            }

            let mut answers = answers.clone();
            answers.push((question.clone(), option));
            let next = index + 1;

            if next < questions.len() {
                let prompt = question_prompt(context, category, next)?;
                Ok(TransitionResult::new(SurveyState::AnsweringQuestion {
                    full_name: full_name.clone(),
                    category: category.clone(),
                    answers,
                    index: next,
                })
                .with_effect(Effect::Reply(prompt)))
            } else {
                // Completed: fold straight back into the category menu
                Ok(TransitionResult::new(SurveyState::SelectingCategory {
                    full_name: full_name.clone(),
                })
                .with_effect(Effect::CompleteRound(CompletedRound {
                    respondent_id: context.respondent_id.clone(),
                    full_name: full_name.clone(),
                    category: category.clone(),
                    answers,
                })))
            }
        }

        (SurveyState::AnsweringQuestion { .. }, _) => Ok(TransitionResult::new(state.clone())
            .with_effect(Effect::Reply(Prompt::answer_keyboard(ANSWER_REPROMPT)))),
    }
}

/// "Question i/N" with the answer keyboard
fn question_prompt(
    context: &SurveyContext,
    category: &str,
    index: usize,
) -> Result<Prompt, TransitionError> {
    let category = context
        .catalog
        .get_category(category)
        .map_err(|e| TransitionError::InvariantViolation(e.to_string()))?;
    let question = category.questions.get(index).ok_or_else(|| {
        TransitionError::InvariantViolation(format!(
            "question index {index} out of range for '{}'",
            category.name
        ))
    })?;
    Ok(Prompt::answer_keyboard(format!(
        "Question {}/{}:\n{question}",
        index + 1,
        category.question_count()
    )))
}
