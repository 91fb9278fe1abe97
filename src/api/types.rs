//! API request and response types

use crate::state_machine::Prompt;
use serde::{Deserialize, Serialize};

/// Header carrying the caller's respondent identifier on privileged routes
pub const RESPONDENT_HEADER: &str = "x-respondent-id";

/// One inbound message from a respondent
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub text: String,
}

/// Prompts produced while handling the message
#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub prompts: Vec<Prompt>,
    pub terminated: bool,
}

/// Category names in menu order
#[derive(Debug, Serialize, Deserialize)]
pub struct CategoriesResponse {
    pub categories: Vec<String>,
}

/// Error response
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}
