//! Report construction for completed survey rounds

use crate::assessment::{assess, AssessmentError, Severity};
use crate::catalog::Catalog;
use crate::state_machine::CompletedRound;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),
}

impl From<AssessmentError> for ReportError {
    fn from(e: AssessmentError) -> Self {
        ReportError::InvariantViolation(e.to_string())
    }
}

/// One record per completed round. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub created_at: DateTime<Utc>,
    pub respondent_id: String,
    pub full_name: String,
    pub category: String,
    pub severity: Severity,
    pub recommendation: String,
    pub score: u32,
    pub max_score: u32,
}

impl Report {
    /// Completion text shown to the respondent
    pub fn summary(&self) -> String {
        format!(
            "Survey complete\n\nName: {}\nSystem: {}\nCondition: {}\n\n{}",
            self.full_name, self.category, self.severity, self.recommendation
        )
    }

    /// Notification text sent to the administrator
    pub fn admin_summary(&self) -> String {
        format!(
            "New report\n\nName: {}\nSystem: {}\nScore: {}/{}\nCondition: {}\n{}",
            self.full_name,
            self.category,
            self.score,
            self.max_score,
            self.severity,
            self.recommendation
        )
    }
}

pub struct ReportBuilder;

impl ReportBuilder {
    /// Build the report for a round that reached the completion boundary.
    ///
    /// Any failure here is a contract breach upstream, not bad respondent input.
    pub fn build(
        round: &CompletedRound,
        catalog: &Catalog,
        now: DateTime<Utc>,
    ) -> Result<Report, ReportError> {
        if round.full_name.trim().is_empty() {
            return Err(ReportError::InvariantViolation(
                "report requires a full name".to_string(),
            ));
        }
        let category = catalog.get_category(&round.category).map_err(|e| {
            ReportError::InvariantViolation(format!("report category missing: {e}"))
        })?;

        let assessment = assess(catalog, category, &round.answers)?;
        if assessment.score.max_possible == 0 {
            return Err(AssessmentError::ZeroMaximum.into());
        }

        Ok(Report {
            created_at: now,
            respondent_id: round.respondent_id.clone(),
            full_name: round.full_name.clone(),
            category: category.name.clone(),
            severity: assessment.severity,
            recommendation: assessment.recommendation,
            score: assessment.score.total,
            max_score: assessment.score.max_possible,
        })
    }
}
