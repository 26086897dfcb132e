//! Core orchestrator for askdb.
//!
//! Coordinates the session's connection, the language model, and the chat
//! history to run one question through the pipeline: synthesize a query,
//! sanitize it, execute it, and synthesize an answer from the result.

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::ConnectionConfig;
use crate::connection::Availability;
use crate::db::{DatabaseBackend, DatabaseClient};
use crate::error::Result;
use crate::llm::{sanitize, synthesize_answer, synthesize_query, LlmClient};
use crate::query::QueryExecutor;
use crate::session::Session;

/// Shown instead of an answer when a question arrives before any connection.
pub const CONNECT_FIRST_ADVISORY: &str = "Please connect database first.";

/// Where the orchestrator is in its lifecycle.
///
/// `Idle → AwaitingConnection → Connected → Synthesizing → Executing →
/// Answering → Connected`. A failed step returns straight to `Connected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// Nothing attempted yet.
    Idle,
    /// A connection is being established, or the last attempt failed.
    AwaitingConnection,
    /// Ready for a question.
    Connected,
    /// Waiting for the model to write a query.
    Synthesizing,
    /// Running the query.
    Executing,
    /// Waiting for the model to write the answer.
    Answering,
}

impl TurnState {
    /// Short label for status displays.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::AwaitingConnection => "not connected",
            Self::Connected => "ready",
            Self::Synthesizing => "writing query...",
            Self::Executing => "running query...",
            Self::Answering => "writing answer...",
        }
    }

    /// Returns true while a turn is in flight.
    pub fn is_busy(&self) -> bool {
        matches!(self, Self::Synthesizing | Self::Executing | Self::Answering)
    }
}

/// Everything a completed turn produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReport {
    /// Position of the turn in the session history.
    pub index: usize,
    /// The question as asked.
    pub question: String,
    /// The sanitized statement that was executed.
    pub sql: String,
    /// The result rendered for the answer prompt.
    pub result_text: String,
    /// The model's answer.
    pub answer: String,
}

/// Result of submitting a question.
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// No database connected; nothing was recorded or called.
    NotConnected,
    /// The turn ran to completion.
    Answered(TurnReport),
}

impl TurnOutcome {
    /// The text to show the user.
    pub fn display_text(&self) -> &str {
        match self {
            Self::NotConnected => CONNECT_FIRST_ADVISORY,
            Self::Answered(report) => &report.answer,
        }
    }
}

/// Receives every state change so a front end can redraw between steps.
pub trait TurnObserver {
    /// Called after the state changed.
    fn on_state(&mut self, state: TurnState, session: &Session);
}

/// Observer that ignores every notification.
pub struct NoopObserver;

impl TurnObserver for NoopObserver {
    fn on_state(&mut self, _state: TurnState, _session: &Session) {}
}

/// The main orchestrator that coordinates all components.
pub struct Orchestrator {
    /// Connection slot and chat history.
    session: Session,
    /// LLM client used for both synthesis calls.
    llm: Box<dyn LlmClient>,
    /// Current lifecycle state.
    state: TurnState,
    /// Reuse one schema description for both calls of a turn.
    snapshot_schema: bool,
}

impl Orchestrator {
    /// Creates a new orchestrator with the given components.
    pub fn new(session: Session, llm: Box<dyn LlmClient>) -> Self {
        let state = if session.connections().is_connected() {
            TurnState::Connected
        } else {
            TurnState::Idle
        };

        Self {
            session,
            llm,
            state,
            snapshot_schema: false,
        }
    }

    /// Fetch the schema once per turn instead of once per model call.
    pub fn with_schema_snapshot(mut self, enabled: bool) -> Self {
        self.snapshot_schema = enabled;
        self
    }

    /// Current lifecycle state.
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// The session owned by this orchestrator.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Connects to a database, replacing any current connection.
    ///
    /// On failure the previous connection, if any, stays active.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        self.begin_connect();
        let result = self.session.connections_mut().connect(config).await;
        self.finish_connect(&result);
        result
    }

    /// Installs an already-connected client, replacing any current connection.
    pub async fn attach(&mut self, db: Box<dyn DatabaseClient>, label: impl Into<String>) {
        self.begin_connect();
        self.session.connections_mut().attach(db, label).await;
        self.finish_connect(&Ok(()));
    }

    fn begin_connect(&mut self) {
        if !self.session.connections().is_connected() {
            self.state = TurnState::AwaitingConnection;
        }
    }

    fn finish_connect(&mut self, result: &Result<()>) {
        if let Err(e) = result {
            warn!("Connection attempt failed: {}", e);
        }
        self.state = if self.session.connections().is_connected() {
            TurnState::Connected
        } else {
            TurnState::AwaitingConnection
        };
    }

    /// Runs one question through the pipeline.
    ///
    /// Without a connection this returns `TurnOutcome::NotConnected` and does
    /// nothing else. Otherwise the question is recorded first; if any step
    /// fails the error is returned and the turn stays without an answer.
    pub async fn ask(
        &mut self,
        question: &str,
        observer: &mut dyn TurnObserver,
    ) -> Result<TurnOutcome> {
        if !self.session.connections().is_connected() {
            debug!("Question received without a connection");
            return Ok(TurnOutcome::NotConnected);
        }

        let index = self.session.record_question(question);
        info!("Turn {}: {}", index, question);

        let result = self.run_turn(index, question, observer).await;

        if let Ok(report) = &result {
            self.session.attach_answer(index, report.answer.clone());
        }
        self.transition(TurnState::Connected, observer);

        result.map(TurnOutcome::Answered)
    }

    async fn run_turn(
        &mut self,
        index: usize,
        question: &str,
        observer: &mut dyn TurnObserver,
    ) -> Result<TurnReport> {
        let dialect = self
            .session
            .connections()
            .backend()
            .unwrap_or(DatabaseBackend::MySql)
            .dialect();

        self.transition(TurnState::Synthesizing, observer);
        let schema = self.schema_text().await?;
        let raw = synthesize_query(self.llm.as_ref(), question, &schema, dialect).await?;
        let sql = sanitize(&raw);
        info!("Generated query: {}", sql);

        self.transition(TurnState::Executing, observer);
        let result_text = QueryExecutor::new(self.session.connections())
            .execute(&sql)
            .await?
            .map(|result| result.to_result_text())
            .to_string();

        self.transition(TurnState::Answering, observer);
        let schema = if self.snapshot_schema {
            schema
        } else {
            self.schema_text().await?
        };
        let answer = synthesize_answer(
            self.llm.as_ref(),
            question,
            &sql,
            &result_text,
            &schema,
            dialect,
        )
        .await?;

        Ok(TurnReport {
            index,
            question: question.to_string(),
            sql,
            result_text,
            answer,
        })
    }

    /// The schema description, or the advisory text if the connection is gone.
    async fn schema_text(&self) -> Result<String> {
        let schema: Availability<String> = self.session.connections().schema().await?;
        Ok(schema.to_string())
    }

    fn transition(&mut self, state: TurnState, observer: &mut dyn TurnObserver) {
        self.state = state;
        observer.on_state(state, &self.session);
    }

    /// Closes the active connection.
    pub async fn close(&mut self) -> Result<()> {
        self.session.connections_mut().close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::db::{FailingDatabaseClient, MockDatabaseClient};
    use crate::error::AskError;
    use crate::llm::MockLlmClient;

    struct Recorder(Vec<TurnState>);

    impl TurnObserver for Recorder {
        fn on_state(&mut self, state: TurnState, _session: &Session) {
            self.0.push(state);
        }
    }

    fn orchestrator(llm: MockLlmClient) -> Orchestrator {
        Orchestrator::new(Session::new(ConnectionManager::new(3)), Box::new(llm))
    }

    #[derive(Clone, Default)]
    struct LogBuffer(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_starts_idle() {
        let orch = orchestrator(MockLlmClient::new());
        assert_eq!(orch.state(), TurnState::Idle);
    }

    #[tokio::test]
    async fn test_question_without_connection() {
        let llm = MockLlmClient::new();
        let prompts = llm.prompt_log();
        let mut orch = orchestrator(llm);

        let outcome = orch.ask("how many albums?", &mut NoopObserver).await.unwrap();

        assert_eq!(outcome, TurnOutcome::NotConnected);
        assert_eq!(outcome.display_text(), "Please connect database first.");
        assert!(orch.session().turns().is_empty());
        assert!(prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_full_turn_state_sequence() {
        let mut orch = orchestrator(MockLlmClient::new());
        orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
            .await;
        assert_eq!(orch.state(), TurnState::Connected);

        let mut recorder = Recorder(Vec::new());
        let outcome = orch
            .ask("how many albums we have in database", &mut recorder)
            .await
            .unwrap();

        let TurnOutcome::Answered(report) = outcome else {
            panic!("expected an answer");
        };
        assert_eq!(report.sql, "SELECT COUNT(*) FROM album");
        assert_eq!(report.result_text, "[(347,)]");
        assert_eq!(
            recorder.0,
            vec![
                TurnState::Synthesizing,
                TurnState::Executing,
                TurnState::Answering,
                TurnState::Connected
            ]
        );
        assert_eq!(orch.state(), TurnState::Connected);
        assert_eq!(
            orch.session().turns()[0].answer.as_deref(),
            Some("The query returned [(347,)].")
        );
    }

    #[tokio::test]
    async fn test_generated_query_logged_after_sanitize() {
        let logs = LogBuffer::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_max_level(tracing::Level::INFO)
            .with_writer(move || writer.clone())
            .finish();
        let _guard = tracing::subscriber::set_default(subscriber);

        let mut orch = orchestrator(MockLlmClient::new());
        orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
            .await;
        orch.ask("how many albums we have in database", &mut NoopObserver)
            .await
            .unwrap();

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("Generated query: SELECT COUNT(*) FROM album\n"));
        assert!(!output.contains("```"));
    }

    #[tokio::test]
    async fn test_failed_execution_orphans_turn() {
        let mut orch = orchestrator(MockLlmClient::new());
        orch.attach(Box::new(FailingDatabaseClient::new("boom")), "broken")
            .await;

        let result = orch.ask("anything", &mut NoopObserver).await;

        assert!(matches!(result, Err(AskError::Query(_))));
        assert_eq!(orch.state(), TurnState::Connected);
        assert_eq!(orch.session().turns().len(), 1);
        assert!(!orch.session().turns()[0].is_answered());
    }

    #[tokio::test]
    async fn test_snapshot_schema_used_for_both_prompts() {
        let llm = MockLlmClient::new();
        let prompts = llm.prompt_log();
        let mut orch = orchestrator(llm).with_schema_snapshot(true);
        orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
            .await;

        orch.ask("how many customers?", &mut NoopObserver)
            .await
            .unwrap();

        let prompts = prompts.lock().unwrap();
        assert_eq!(prompts.len(), 2);
        assert!(prompts.iter().all(|p| p.contains("Table: customer")));
    }

    #[tokio::test]
    async fn test_failed_connect_moves_to_awaiting() {
        let mut orch = orchestrator(MockLlmClient::new());
        let config = ConnectionConfig {
            host: "bad host".to_string(),
            ..Default::default()
        };

        assert!(orch.connect(&config).await.is_err());
        assert_eq!(orch.state(), TurnState::AwaitingConnection);
    }
}
