//! Database schema and row types

use crate::report::Report;
use serde::{Deserialize, Serialize};

/// SQL schema for initialization
pub const SCHEMA: &str = r"
CREATE TABLE IF NOT EXISTS reports (
    sequence_id INTEGER PRIMARY KEY,
    created_at TEXT NOT NULL,
    respondent_id TEXT NOT NULL,
    full_name TEXT NOT NULL,
    category TEXT NOT NULL,
    severity TEXT NOT NULL,
    recommendation TEXT NOT NULL,
    score INTEGER NOT NULL,
    max_score INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_reports_respondent ON reports(respondent_id, sequence_id);
";

/// A persisted report with its position in the append log
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredReport {
    pub sequence_id: i64,
    #[serde(flatten)]
    pub report: Report,
}

/// One row of the export artifact
///
/// `highlight` is the row fill colour for the report's severity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportRow {
    #[serde(flatten)]
    pub stored: StoredReport,
    pub highlight: String,
}

impl From<StoredReport> for ExportRow {
    fn from(stored: StoredReport) -> Self {
        let highlight = stored.report.severity.highlight().to_string();
        Self { stored, highlight }
    }
}
