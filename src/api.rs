//! HTTP API for the survey service
//!
//! A thin transport: each posted message is fed to the respondent's session
//! and the prompts it produced come back in the response.

mod handlers;
mod types;

pub use handlers::create_router;
#[allow(unused_imports)] // Public API re-exports
pub use types::*;

use crate::runtime::ProductionManager;
use std::sync::Arc;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<ProductionManager>,
}

impl AppState {
    pub fn new(sessions: ProductionManager) -> Self {
        Self {
            sessions: Arc::new(sessions),
        }
    }
}
