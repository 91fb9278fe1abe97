//! Runtime for driving survey sessions
//!
//! One task per respondent consumes that respondent's messages in order;
//! different respondents run concurrently and only share the report sink.

mod executor;
pub mod traits;

#[cfg(test)]
pub mod testing;

pub use executor::SessionRuntime;
pub use traits::*;

use crate::catalog::Catalog;
use crate::db::ReportStore;
use crate::state_machine::input::EXPORT_COMMAND;
use crate::state_machine::{Prompt, SurveyContext};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, RwLock};

const EXPORT_FORBIDDEN: &str = "You do not have access to this command.";
const EXPORT_EMPTY: &str = "No data to export yet.";
const EXPORT_SENT: &str = "The report export has been sent.";
const EXPORT_FAILED: &str = "The report export is unavailable right now.";

/// Type alias for the production manager with concrete implementations
pub type ProductionManager = SessionManager<ReportStore, LogNotifier>;

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("Session for respondent {0} is unavailable")]
    SessionUnavailable(String),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Respondent {0} is not allowed to export reports")]
    Forbidden(String),
    #[error(transparent)]
    Sink(#[from] SinkError),
}

/// Everything the respondent should see in answer to one message
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Turn {
    pub prompts: Vec<Prompt>,
    /// The session ended; the next message starts a fresh one
    pub terminated: bool,
}

impl Turn {
    fn say(text: &str) -> Self {
        Self {
            prompts: vec![Prompt::text(text)],
            terminated: false,
        }
    }
}

/// A message queued for a session task, with the channel its reply goes to
#[derive(Debug)]
pub struct Inbound {
    pub text: String,
    pub reply_tx: oneshot::Sender<Turn>,
}

/// Handle to interact with a running session
#[derive(Clone)]
pub struct SessionHandle {
    pub inbox_tx: mpsc::Sender<Inbound>,
}

/// Manager for all live survey sessions
pub struct SessionManager<S, N>
where
    S: ReportSink + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    catalog: Arc<Catalog>,
    sink: Arc<S>,
    notifier: Arc<N>,
    admin_id: Option<String>,
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl<S, N> SessionManager<S, N>
where
    S: ReportSink + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    pub fn new(catalog: Arc<Catalog>, sink: Arc<S>, notifier: Arc<N>) -> Self {
        Self {
            catalog,
            sink,
            notifier,
            admin_id: None,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    /// Grant the export command to one respondent identifier
    pub fn with_admin(mut self, admin_id: Option<String>) -> Self {
        self.admin_id = admin_id;
        self
    }

    pub fn is_admin(&self, respondent_id: &str) -> bool {
        self.admin_id.as_deref() == Some(respondent_id)
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    #[allow(dead_code)] // API completeness
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Get or create the session task for a respondent
    pub async fn get_or_create(&self, respondent_id: &str) -> SessionHandle {
        if let Some(handle) = self.sessions.read().await.get(respondent_id) {
            return handle.clone();
        }

        let mut sessions = self.sessions.write().await;
        // Another caller may have won the race for the write lock
        if let Some(handle) = sessions.get(respondent_id) {
            return handle.clone();
        }

        let (inbox_tx, inbox_rx) = mpsc::channel(32);
        let runtime = SessionRuntime::new(
            SurveyContext::new(respondent_id, self.catalog.clone()),
            self.sink.clone(),
            self.notifier.clone(),
            inbox_rx,
        );
        tokio::spawn(runtime.run());

        let handle = SessionHandle { inbox_tx };
        sessions.insert(respondent_id.to_string(), handle.clone());
        tracing::info!(respondent_id = %respondent_id, active = sessions.len(), "Session created");
        handle
    }

    /// Feed one inbound message to the respondent's session and wait for its reply
    pub async fn handle_message(&self, respondent_id: &str, text: &str) -> Result<Turn, RuntimeError> {
        if text == EXPORT_COMMAND {
            return Ok(self.export_command(respondent_id).await);
        }

        // A session that just exited may still be registered; retry once on a fresh one
        for _ in 0..2 {
            let handle = self.get_or_create(respondent_id).await;
            let (reply_tx, reply_rx) = oneshot::channel();
            let inbound = Inbound {
                text: text.to_string(),
                reply_tx,
            };

            if handle.inbox_tx.send(inbound).await.is_err() {
                self.remove_if_current(respondent_id, &handle).await;
                continue;
            }

            match reply_rx.await {
                Ok(turn) => {
                    if turn.terminated {
                        self.remove_if_current(respondent_id, &handle).await;
                    }
                    return Ok(turn);
                }
                Err(_) => self.remove_if_current(respondent_id, &handle).await,
            }
        }

        tracing::error!(respondent_id = %respondent_id, "Session did not accept message");
        Err(RuntimeError::SessionUnavailable(respondent_id.to_string()))
    }

    async fn remove_if_current(&self, respondent_id: &str, handle: &SessionHandle) {
        let mut sessions = self.sessions.write().await;
        let current = sessions
            .get(respondent_id)
            .is_some_and(|h| h.inbox_tx.same_channel(&handle.inbox_tx));
        if current {
            sessions.remove(respondent_id);
            tracing::info!(respondent_id = %respondent_id, active = sessions.len(), "Session removed");
        }
    }

    /// Current export snapshot, for the administrator only
    pub async fn export(&self, requester_id: &str) -> Result<ExportArtifact, ExportError> {
        if !self.is_admin(requester_id) {
            tracing::warn!(respondent_id = %requester_id, "Export refused");
            return Err(ExportError::Forbidden(requester_id.to_string()));
        }
        Ok(self.sink.export().await?)
    }

    /// `/export` typed into the conversation: the artifact goes to the admin channel
    async fn export_command(&self, respondent_id: &str) -> Turn {
        match self.export(respondent_id).await {
            Ok(artifact) if artifact.record_count == 0 => Turn::say(EXPORT_EMPTY),
            Ok(artifact) => match self.notifier.deliver_artifact(artifact).await {
                Ok(()) => Turn::say(EXPORT_SENT),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to deliver export");
                    Turn::say(EXPORT_FAILED)
                }
            },
            Err(ExportError::Forbidden(_)) => Turn::say(EXPORT_FORBIDDEN),
            Err(ExportError::Sink(e)) => {
                tracing::error!(error = %e, "Failed to build export");
                Turn::say(EXPORT_FAILED)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{MemorySink, RecordingNotifier};
    use super::*;
    use crate::catalog::Category;
    use crate::state_machine::input::{CANCEL_COMMAND, EXIT_LABEL, START_COMMAND};

    type TestManager = SessionManager<MemorySink, RecordingNotifier>;

    fn manager() -> (Arc<TestManager>, Arc<MemorySink>, Arc<RecordingNotifier>) {
        let catalog = Catalog::new(vec![
            Category::new("Respiratory", "Pulmonologist", ["Cough?", "Wheezing?"]),
            Category::new("Digestive", "Gastroenterologist", ["Nausea?"]),
        ])
        .unwrap();
        let sink = Arc::new(MemorySink::new());
        let notifier = Arc::new(RecordingNotifier::new());
        let manager = SessionManager::new(Arc::new(catalog), sink.clone(), notifier.clone())
            .with_admin(Some("admin".to_string()));
        (Arc::new(manager), sink, notifier)
    }

    async fn run_round(manager: &TestManager, id: &str, name: &str) -> Turn {
        manager.handle_message(id, name).await.unwrap();
        manager.handle_message(id, "Respiratory").await.unwrap();
        manager.handle_message(id, "Sometimes").await.unwrap();
        manager.handle_message(id, "No").await.unwrap()
    }

    #[tokio::test]
    async fn test_messages_drive_a_round() {
        let (manager, sink, notifier) = manager();

        let turn = run_round(&manager, "42", "Jane Roe").await;
        assert!(turn.prompts[0].text.contains("Jane Roe"));
        assert!(turn.prompts[0].text.contains("mild"));

        let reports = sink.reports();
        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].respondent_id, "42");
        assert_eq!(reports[0].score, 1);
        assert_eq!(notifier.recorded_messages().len(), 1);
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_exit_removes_session() {
        let (manager, _, _) = manager();

        manager.handle_message("42", "Jane Roe").await.unwrap();
        let turn = manager.handle_message("42", EXIT_LABEL).await.unwrap();
        assert!(turn.terminated);
        assert_eq!(turn.prompts[0].text, "Thank you! Goodbye.");
        assert_eq!(manager.session_count().await, 0);

        // Next message opens a fresh session that treats it as the name
        let turn = manager.handle_message("42", "John Doe").await.unwrap();
        assert!(turn.prompts[0].text.contains("John Doe"));
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_cancel_and_start_commands() {
        let (manager, _, _) = manager();

        manager.handle_message("42", "Jane Roe").await.unwrap();
        manager.handle_message("42", "Respiratory").await.unwrap();
        let turn = manager.handle_message("42", START_COMMAND).await.unwrap();
        assert!(turn.prompts[0].text.contains("full name"));

        let turn = manager.handle_message("42", CANCEL_COMMAND).await.unwrap();
        assert!(turn.terminated);
        assert_eq!(manager.session_count().await, 0);
    }

    #[tokio::test]
    async fn test_concurrent_respondents_append_once_each() {
        let (manager, sink, notifier) = manager();

        let (a, b) = tokio::join!(
            run_round(&manager, "alice", "Alice A"),
            run_round(&manager, "bob", "Bob B")
        );
        assert!(a.prompts[0].text.contains("Alice A"));
        assert!(b.prompts[0].text.contains("Bob B"));

        let reports = sink.reports();
        assert_eq!(reports.len(), 2);
        let mut ids: Vec<_> = reports.iter().map(|r| r.respondent_id.as_str()).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec!["alice", "bob"]);
        assert_eq!(notifier.recorded_artifacts().len(), 2);
        assert_eq!(manager.session_count().await, 2);
    }

    #[tokio::test]
    async fn test_same_respondent_messages_are_serialized() {
        let (manager, sink, _) = manager();
        manager.handle_message("42", "Jane Roe").await.unwrap();

        // Fired concurrently, still applied one at a time in some order
        let (first, second) = tokio::join!(
            manager.handle_message("42", "Digestive"),
            manager.handle_message("42", "Digestive")
        );
        let turns = [first.unwrap(), second.unwrap()];
        let started = turns
            .iter()
            .filter(|t| t.prompts[0].text.starts_with("Question 1/1"))
            .count();
        assert_eq!(started, 1);
        assert!(sink.reports().is_empty());
    }

    #[tokio::test]
    async fn test_export_is_admin_only() {
        let (manager, _, notifier) = manager();

        assert!(matches!(
            manager.export("42").await,
            Err(ExportError::Forbidden(_))
        ));
        let turn = manager.handle_message("42", EXPORT_COMMAND).await.unwrap();
        assert_eq!(turn.prompts[0].text, EXPORT_FORBIDDEN);

        let turn = manager.handle_message("admin", EXPORT_COMMAND).await.unwrap();
        assert_eq!(turn.prompts[0].text, EXPORT_EMPTY);

        run_round(&manager, "42", "Jane Roe").await;
        let delivered_before = notifier.recorded_artifacts().len();
        let turn = manager.handle_message("admin", EXPORT_COMMAND).await.unwrap();
        assert_eq!(turn.prompts[0].text, EXPORT_SENT);
        assert_eq!(notifier.recorded_artifacts().len(), delivered_before + 1);

        let artifact = manager.export("admin").await.unwrap();
        assert_eq!(artifact.record_count, 1);
        // The export command never creates a session for the admin
        assert_eq!(manager.session_count().await, 1);
    }

    #[tokio::test]
    async fn test_without_admin_nobody_exports() {
        let catalog = Arc::new(Catalog::builtin());
        let manager = SessionManager::new(
            catalog,
            Arc::new(MemorySink::new()),
            Arc::new(RecordingNotifier::new()),
        );
        assert!(!manager.is_admin(""));
        assert!(manager.export("anyone").await.is_err());
    }
}
