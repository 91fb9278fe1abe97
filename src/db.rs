//! Database module for the survey service
//!
//! Append-only persistence for completed reports.

mod schema;

pub use schema::*;

use crate::assessment::Severity;
use crate::report::Report;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("Failed to create database directory: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to encode export: {0}")]
    Encode(#[from] serde_json::Error),
    #[error("Database lock poisoned")]
    LockPoisoned,
    #[error("Unknown severity in stored report: {0}")]
    BadSeverity(String),
    #[error("Unreadable timestamp in stored report: {0}")]
    BadTimestamp(String),
}

pub type DbResult<T> = Result<T, DbError>;

/// Thread-safe report store
///
/// Writers serialize on the connection mutex; a second writer waits for the
/// first rather than failing.
#[derive(Clone)]
pub struct ReportStore {
    conn: Arc<Mutex<Connection>>,
}

impl ReportStore {
    /// Open or create the store at the given path
    pub fn open<P: AsRef<Path>>(path: P) -> DbResult<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path)?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    /// Open an in-memory store (for testing)
    #[cfg(test)]
    pub fn open_in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let store = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        store.run_migrations()?;
        Ok(store)
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn.lock().map_err(|_| DbError::LockPoisoned)
    }

    fn run_migrations(&self) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(SCHEMA)?;
        Ok(())
    }

    // ==================== Report Operations ====================

    /// Append a report; the sequence id is assigned under the lock
    pub fn append(&self, report: &Report) -> DbResult<StoredReport> {
        let conn = self.lock()?;

        let sequence_id: i64 = conn.query_row(
            "SELECT COALESCE(MAX(sequence_id), 0) + 1 FROM reports",
            [],
            |row| row.get(0),
        )?;

        conn.execute(
            "INSERT INTO reports (sequence_id, created_at, respondent_id, full_name, category, severity, recommendation, score, max_score)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                sequence_id,
                report.created_at.to_rfc3339(),
                report.respondent_id,
                report.full_name,
                report.category,
                report.severity.label(),
                report.recommendation,
                report.score,
                report.max_score,
            ],
        )?;

        Ok(StoredReport {
            sequence_id,
            report: report.clone(),
        })
    }

    /// All reports in insertion order
    pub fn list(&self) -> DbResult<Vec<StoredReport>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(
            "SELECT sequence_id, created_at, respondent_id, full_name, category, severity,
                    recommendation, score, max_score
             FROM reports ORDER BY sequence_id ASC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, u32>(7)?,
                    row.get::<_, u32>(8)?,
                ))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(
                |(
                    sequence_id,
                    created_at,
                    respondent_id,
                    full_name,
                    category,
                    severity,
                    recommendation,
                    score,
                    max_score,
                )| {
                    Ok(StoredReport {
                        sequence_id,
                        report: Report {
                            created_at: parse_datetime(&created_at)?,
                            respondent_id,
                            full_name,
                            category,
                            severity: parse_severity(&severity)?,
                            recommendation,
                            score,
                            max_score,
                        },
                    })
                },
            )
            .collect()
    }

    pub fn count(&self) -> DbResult<i64> {
        let conn = self.lock()?;
        Ok(conn.query_row("SELECT COUNT(*) FROM reports", [], |row| row.get(0))?)
    }

    /// Every report as one pretty-printed JSON array, oldest first,
    /// with the number of rows it holds
    pub fn export_json(&self) -> DbResult<(usize, Vec<u8>)> {
        let rows: Vec<ExportRow> = self.list()?.into_iter().map(ExportRow::from).collect();
        Ok((rows.len(), serde_json::to_vec_pretty(&rows)?))
    }
}

fn parse_severity(s: &str) -> DbResult<Severity> {
    match s {
        "mild" => Ok(Severity::Mild),
        "moderate" => Ok(Severity::Moderate),
        "severe" => Ok(Severity::Severe),
        other => Err(DbError::BadSeverity(other.to_string())),
    }
}

fn parse_datetime(s: &str) -> DbResult<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|_| DbError::BadTimestamp(s.to_string()))
}
