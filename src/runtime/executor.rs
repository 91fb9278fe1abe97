//! Survey session executor

use super::traits::{Notifier, ReportSink};
use super::{Inbound, Turn};

use crate::report::{Report, ReportBuilder};
use crate::state_machine::input::{EXIT_LABEL, RESTART_LABEL};
use crate::state_machine::{transition, Effect, Input, Prompt, Session, SurveyContext};
use chrono::Utc;
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Runs one respondent's session, one inbound message at a time
pub struct SessionRuntime<S, N>
where
    S: ReportSink + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    context: SurveyContext,
    session: Session,
    sink: Arc<S>,
    notifier: Arc<N>,
    inbox: mpsc::Receiver<Inbound>,
}

impl<S, N> SessionRuntime<S, N>
where
    S: ReportSink + ?Sized + 'static,
    N: Notifier + ?Sized + 'static,
{
    pub fn new(
        context: SurveyContext,
        sink: Arc<S>,
        notifier: Arc<N>,
        inbox: mpsc::Receiver<Inbound>,
    ) -> Self {
        Self {
            session: Session::new(context.respondent_id.clone()),
            context,
            sink,
            notifier,
            inbox,
        }
    }

    pub async fn run(mut self) {
        tracing::info!(respondent_id = %self.session.respondent_id, "Starting survey session");

        while let Some(Inbound { text, reply_tx }) = self.inbox.recv().await {
            let turn = self.process_message(&text).await;
            if reply_tx.send(turn).is_err() {
                tracing::debug!(respondent_id = %self.context.respondent_id, "Caller went away before reply");
            }
            if self.session.state.is_terminal() {
                break;
            }
        }

        tracing::info!(respondent_id = %self.session.respondent_id, "Survey session stopped");
    }

    pub(crate) async fn process_message(&mut self, text: &str) -> Turn {
        let input = Input::resolve(text, &self.session.state, &self.context.catalog);

        let result = match transition(&self.session.state, &self.context, input) {
            Ok(r) => r,
            Err(e) => {
                tracing::error!(
                    respondent_id = %self.context.respondent_id,
                    state = self.session.state.name(),
                    category = ?self.session.category(),
                    question = self.session.current_index(),
                    error = %e,
                    "Transition aborted"
                );
                return Turn::default();
            }
        };

        // Reports are built before the state is committed so a broken round
        // leaves the session where it was
        let mut reports = VecDeque::new();
        for effect in &result.effects {
            if let Effect::CompleteRound(round) = effect {
                match ReportBuilder::build(round, &self.context.catalog, Utc::now()) {
                    Ok(report) => reports.push_back(report),
                    Err(e) => {
                        tracing::error!(
                            respondent_id = %self.context.respondent_id,
                            category = %round.category,
                            error = %e,
                            "Report build failed, transition aborted"
                        );
                        return Turn::default();
                    }
                }
            }
        }

        tracing::debug!(
            respondent_id = %self.context.respondent_id,
            from = self.session.state.name(),
            to = result.new_state.name(),
            "Transition"
        );
        self.session.state = result.new_state;
        tracing::debug!(
            respondent_id = %self.context.respondent_id,
            full_name = ?self.session.full_name(),
            category = ?self.session.category(),
            answered = self.session.answers().len(),
            "Session updated"
        );

        let mut turn = Turn::default();
        for effect in result.effects {
            match effect {
                Effect::Reply(prompt) => turn.prompts.push(prompt),
                Effect::CompleteRound(_) => {
                    if let Some(report) = reports.pop_front() {
                        self.complete_round(&report, &mut turn).await;
                    }
                }
                Effect::EndConversation => turn.terminated = true,
            }
        }
        turn
    }

    /// Summary to the respondent first, then best-effort persistence and
    /// admin delivery. Nothing here can undo the committed state.
    async fn complete_round(&self, report: &Report, turn: &mut Turn) {
        let respondent_id = &self.context.respondent_id;
        tracing::info!(
            respondent_id = %respondent_id,
            category = %report.category,
            severity = %report.severity,
            score = report.score,
            max_score = report.max_score,
            "Survey round completed"
        );

        turn.prompts.push(Prompt::with_choices(
            report.summary(),
            vec![RESTART_LABEL.to_string(), EXIT_LABEL.to_string()],
        ));

        if let Err(e) = self.sink.append(report).await {
            tracing::error!(respondent_id = %respondent_id, error = %e, "Failed to persist report");
            let alert = format!("Failed to save report for {}: {e}", report.full_name);
            if let Err(e) = self.notifier.notify(&alert).await {
                tracing::error!(error = %e, "Failed to notify admin of sink failure");
            }
        }

        if let Err(e) = self.notifier.notify(&report.admin_summary()).await {
            tracing::warn!(respondent_id = %respondent_id, error = %e, "Failed to notify admin");
        }

        match self.sink.export().await {
            Ok(artifact) if artifact.record_count == 0 => {
                tracing::debug!("Report store empty, no snapshot to deliver");
            }
            Ok(artifact) => {
                if let Err(e) = self.notifier.deliver_artifact(artifact).await {
                    tracing::warn!(error = %e, "Failed to deliver export to admin");
                }
            }
            Err(e) => tracing::warn!(error = %e, "Failed to build export snapshot"),
        }
    }

    #[cfg(test)]
    pub(crate) fn state(&self) -> &crate::state_machine::SurveyState {
        &self.session.state
    }

    #[cfg(test)]
    pub(crate) fn set_state(&mut self, state: crate::state_machine::SurveyState) {
        self.session.state = state;
    }
}
