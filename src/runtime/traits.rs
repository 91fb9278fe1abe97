//! Trait abstractions for runtime I/O
//!
//! These traits enable testing the executor with mock implementations.

use crate::db::ReportStore;
use crate::report::Report;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;
use thiserror::Error;

/// Failure to persist or read back reports
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Report storage failed: {0}")]
    Storage(String),
}

/// Snapshot of every appended report in one downloadable file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub record_count: usize,
}

/// Durable destination for completed reports
#[async_trait]
pub trait ReportSink: Send + Sync {
    /// Append one report; calls are ordered and mutually exclusive
    async fn append(&self, report: &Report) -> Result<(), SinkError>;

    /// Export everything appended so far, oldest first
    async fn export(&self) -> Result<ExportArtifact, SinkError>;
}

/// Delivery channel to the administrator
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), String>;

    async fn deliver_artifact(&self, artifact: ExportArtifact) -> Result<(), String>;
}

// ============================================================================
// Arc implementations for trait objects
// ============================================================================

#[async_trait]
impl<T: ReportSink + ?Sized> ReportSink for Arc<T> {
    async fn append(&self, report: &Report) -> Result<(), SinkError> {
        (**self).append(report).await
    }

    async fn export(&self) -> Result<ExportArtifact, SinkError> {
        (**self).export().await
    }
}

#[async_trait]
impl<T: Notifier + ?Sized> Notifier for Arc<T> {
    async fn notify(&self, text: &str) -> Result<(), String> {
        (**self).notify(text).await
    }

    async fn deliver_artifact(&self, artifact: ExportArtifact) -> Result<(), String> {
        (**self).deliver_artifact(artifact).await
    }
}

// ============================================================================
// Production Adapters
// ============================================================================

pub const EXPORT_FILENAME: &str = "reports.json";

#[async_trait]
impl ReportSink for ReportStore {
    async fn append(&self, report: &Report) -> Result<(), SinkError> {
        let stored = ReportStore::append(self, report).map_err(|e| SinkError::Storage(e.to_string()))?;
        tracing::debug!(sequence_id = stored.sequence_id, "Report appended");
        Ok(())
    }

    async fn export(&self) -> Result<ExportArtifact, SinkError> {
        let (record_count, bytes) = self
            .export_json()
            .map_err(|e| SinkError::Storage(e.to_string()))?;
        Ok(ExportArtifact {
            filename: EXPORT_FILENAME.to_string(),
            content_type: "application/json".to_string(),
            bytes,
            record_count,
        })
    }
}

/// Notifier that writes to the log and, optionally, drops the artifact on disk
#[derive(Debug, Clone, Default)]
pub struct LogNotifier {
    export_path: Option<PathBuf>,
}

impl LogNotifier {
    pub fn new(export_path: Option<PathBuf>) -> Self {
        Self { export_path }
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, text: &str) -> Result<(), String> {
        tracing::info!(target: "symptom_survey::admin", text = %text, "Admin notification");
        Ok(())
    }

    async fn deliver_artifact(&self, artifact: ExportArtifact) -> Result<(), String> {
        tracing::info!(
            target: "symptom_survey::admin",
            filename = %artifact.filename,
            records = artifact.record_count,
            bytes = artifact.bytes.len(),
            "Export snapshot ready"
        );
        let Some(path) = &self.export_path else {
            return Ok(());
        };
        tokio::fs::write(path, &artifact.bytes)
            .await
            .map_err(|e| format!("Failed to write export to {}: {e}", path.display()))
    }
}
