//! Mock implementations for testing
//!
//! These mocks enable executor and manager tests without real I/O.

use super::traits::{ExportArtifact, Notifier, ReportSink, SinkError, EXPORT_FILENAME};
use crate::report::Report;
use async_trait::async_trait;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

// ============================================================================
// In-Memory Sink
// ============================================================================

/// Sink that keeps reports in a vector and can be told to fail
#[derive(Default)]
pub struct MemorySink {
    reports: Mutex<Vec<Report>>,
    fail_appends: AtomicBool,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every following append fail
    pub fn failing() -> Self {
        let sink = Self::new();
        sink.fail_appends.store(true, Ordering::SeqCst);
        sink
    }

    pub fn reports(&self) -> Vec<Report> {
        self.reports.lock().unwrap().clone()
    }
}

#[async_trait]
impl ReportSink for MemorySink {
    async fn append(&self, report: &Report) -> Result<(), SinkError> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(SinkError::Storage("disk full".to_string()));
        }
        self.reports.lock().unwrap().push(report.clone());
        Ok(())
    }

    async fn export(&self) -> Result<ExportArtifact, SinkError> {
        let reports = self.reports();
        let bytes =
            serde_json::to_vec(&reports).map_err(|e| SinkError::Storage(e.to_string()))?;
        Ok(ExportArtifact {
            filename: EXPORT_FILENAME.to_string(),
            content_type: "application/json".to_string(),
            bytes,
            record_count: reports.len(),
        })
    }
}

// ============================================================================
// Recording Notifier
// ============================================================================

/// Notifier that records everything sent to the administrator
#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<String>>,
    pub artifacts: Mutex<Vec<ExportArtifact>>,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn recorded_messages(&self) -> Vec<String> {
        self.messages.lock().unwrap().clone()
    }

    pub fn recorded_artifacts(&self) -> Vec<ExportArtifact> {
        self.artifacts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, text: &str) -> Result<(), String> {
        self.messages.lock().unwrap().push(text.to_string());
        Ok(())
    }

    async fn deliver_artifact(&self, artifact: ExportArtifact) -> Result<(), String> {
        self.artifacts.lock().unwrap().push(artifact);
        Ok(())
    }
}
