//! Survey session state types

use crate::assessment::AnswerOption;
use crate::catalog::Catalog;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

// ============================================================================
// Survey State
// ============================================================================

/// Dialogue state of one respondent.
///
/// The transient "completed" step never appears here: finishing the last
/// question folds straight back into `SelectingCategory`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SurveyState {
    /// Waiting for the respondent's full name
    #[default]
    AwaitingName,

    /// Category menu shown; only the name carries over between rounds
    SelectingCategory { full_name: String },

    /// Walking through the questions of one category
    AnsweringQuestion {
        full_name: String,
        category: String,
        /// Insertion order matches question order
        answers: Vec<(String, AnswerOption)>,
        /// Cursor into the category's question list
        index: usize,
    },

    /// Respondent exited (terminal)
    Terminated,
}

impl SurveyState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, SurveyState::Terminated)
    }

    pub fn name(&self) -> &'static str {
        match self {
            SurveyState::AwaitingName => "awaiting_name",
            SurveyState::SelectingCategory { .. } => "selecting_category",
            SurveyState::AnsweringQuestion { .. } => "answering_question",
            SurveyState::Terminated => "terminated",
        }
    }
}

// ============================================================================
// Session
// ============================================================================

/// One respondent's survey run, keyed by the transport's identifier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub respondent_id: String,
    pub state: SurveyState,
}

impl Session {
    pub fn new(respondent_id: impl Into<String>) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            state: SurveyState::AwaitingName,
        }
    }

    pub fn full_name(&self) -> Option<&str> {
        match &self.state {
            SurveyState::SelectingCategory { full_name }
            | SurveyState::AnsweringQuestion { full_name, .. } => Some(full_name),
            SurveyState::AwaitingName | SurveyState::Terminated => None,
        }
    }

    pub fn category(&self) -> Option<&str> {
        match &self.state {
            SurveyState::AnsweringQuestion { category, .. } => Some(category),
            _ => None,
        }
    }

    pub fn answers(&self) -> &[(String, AnswerOption)] {
        match &self.state {
            SurveyState::AnsweringQuestion { answers, .. } => answers,
            _ => &[],
        }
    }

    pub fn current_index(&self) -> usize {
        match &self.state {
            SurveyState::AnsweringQuestion { index, .. } => *index,
            _ => 0,
        }
    }
}

// ============================================================================
// Completed Round
// ============================================================================

/// Everything the report builder needs from a finished category
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompletedRound {
    pub respondent_id: String,
    pub full_name: String,
    pub category: String,
    pub answers: Vec<(String, AnswerOption)>,
}

// ============================================================================
// Context
// ============================================================================

/// Immutable per-session configuration
#[derive(Debug, Clone)]
pub struct SurveyContext {
    pub respondent_id: String,
    pub catalog: Arc<Catalog>,
}

impl SurveyContext {
    pub fn new(respondent_id: impl Into<String>, catalog: Arc<Catalog>) -> Self {
        Self {
            respondent_id: respondent_id.into(),
            catalog,
        }
    }
}
