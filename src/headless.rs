//! Headless mode for scripted runs and automation.
//!
//! Feeds a list of questions through the orchestrator without a terminal and
//! prints the transcript as text or JSON.

use std::io::Read;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::info;

use crate::app::{NoopObserver, Orchestrator, TurnOutcome};
use crate::cli::{Cli, OutputFormat};
use crate::error::{AskError, Result};

/// Configuration for headless mode execution.
#[derive(Debug, Clone)]
pub struct HeadlessConfig {
    /// Output format.
    pub output_format: OutputFormat,
    /// Questions to ask, in order.
    pub questions: Vec<String>,
}

impl HeadlessConfig {
    /// Creates a HeadlessConfig from CLI arguments.
    ///
    /// `--question` values come first, then the lines of `--script`.
    pub fn from_cli(cli: &Cli) -> Result<Self> {
        cli.validate_headless().map_err(AskError::config)?;
        let output_format = cli.parse_output_format().map_err(AskError::config)?;

        let mut questions = cli.questions.clone();
        if let Some(script) = &cli.script {
            questions.extend(parse_script(&read_script(script)?));
        }

        Ok(Self {
            output_format,
            questions,
        })
    }
}

fn read_script(path: &str) -> Result<String> {
    if path == "-" {
        let mut content = String::new();
        std::io::stdin()
            .read_to_string(&mut content)
            .map_err(|e| AskError::config(format!("Failed to read script from stdin: {e}")))?;
        return Ok(content);
    }

    std::fs::read_to_string(path)
        .map_err(|e| AskError::config(format!("Failed to read script file '{path}': {e}")))
}

/// One question per line; blank lines and `#` comments are skipped.
pub fn parse_script(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// How a single question ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Answered,
    NotConnected,
    Failed,
}

/// One question of a headless run and what came of it.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub question: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sql: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
    /// The answer, or the advisory text when not connected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Result of headless execution.
#[derive(Debug, Clone, Serialize)]
pub struct Transcript {
    /// Connection label, if connected.
    pub connection: Option<String>,
    pub entries: Vec<TranscriptEntry>,
    #[serde(skip)]
    pub duration: Duration,
}

impl Transcript {
    /// Number of questions whose turn failed.
    pub fn failures(&self) -> usize {
        self.entries
            .iter()
            .filter(|e| e.status == EntryStatus::Failed)
            .count()
    }
}

/// Asks every question in order, continuing after failures.
pub async fn run(orchestrator: &mut Orchestrator, questions: &[String]) -> Transcript {
    let start = Instant::now();
    let mut entries = Vec::with_capacity(questions.len());

    for question in questions {
        let entry = match orchestrator.ask(question, &mut NoopObserver).await {
            Ok(outcome @ TurnOutcome::NotConnected) => TranscriptEntry {
                question: question.clone(),
                status: EntryStatus::NotConnected,
                sql: None,
                result: None,
                answer: Some(outcome.display_text().to_string()),
                error: None,
            },
            Ok(TurnOutcome::Answered(report)) => TranscriptEntry {
                question: question.clone(),
                status: EntryStatus::Answered,
                sql: Some(report.sql),
                result: Some(report.result_text),
                answer: Some(report.answer),
                error: None,
            },
            Err(e) => TranscriptEntry {
                question: question.clone(),
                status: EntryStatus::Failed,
                sql: None,
                result: None,
                answer: None,
                error: Some(format!("{}: {}", e.category(), e)),
            },
        };
        entries.push(entry);
    }

    let transcript = Transcript {
        connection: orchestrator
            .session()
            .connections()
            .label()
            .map(String::from),
        entries,
        duration: start.elapsed(),
    };

    info!(
        "Headless run finished: {} questions, {} failed, {:?}",
        transcript.entries.len(),
        transcript.failures(),
        transcript.duration
    );

    transcript
}

/// Formats a transcript for output.
pub fn format_transcript(transcript: &Transcript, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(format_text(transcript)),
        OutputFormat::Json => serde_json::to_string_pretty(transcript)
            .map(|mut s| {
                s.push('\n');
                s
            })
            .map_err(|e| AskError::internal(format!("Failed to serialize transcript: {e}"))),
    }
}

fn format_text(transcript: &Transcript) -> String {
    let mut out = String::new();

    for entry in &transcript.entries {
        out.push_str(&format!("> {}\n", entry.question));
        if let Some(sql) = &entry.sql {
            out.push_str(&format!("SQL: {sql}\n"));
        }
        if let Some(result) = &entry.result {
            out.push_str(&format!("Result: {result}\n"));
        }
        if let Some(answer) = &entry.answer {
            out.push_str(answer);
            out.push('\n');
        }
        if let Some(error) = &entry.error {
            out.push_str(&format!("Error: {error}\n"));
        }
        out.push('\n');
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionManager;
    use crate::db::MockDatabaseClient;
    use crate::llm::MockLlmClient;
    use crate::session::Session;
    use pretty_assertions::assert_eq;

    fn orchestrator() -> Orchestrator {
        Orchestrator::new(
            Session::new(ConnectionManager::new(3)),
            Box::new(MockLlmClient::new()),
        )
    }

    #[test]
    fn test_parse_script() {
        let script = "# warm-up\nhow many albums we have in database\n\n  how many artists?  \n";
        assert_eq!(
            parse_script(script),
            vec!["how many albums we have in database", "how many artists?"]
        );
    }

    #[tokio::test]
    async fn test_run_without_connection() {
        let mut orch = orchestrator();
        let transcript = run(&mut orch, &["how many albums?".to_string()]).await;

        assert_eq!(transcript.failures(), 0);
        assert_eq!(transcript.entries[0].status, EntryStatus::NotConnected);
        assert_eq!(
            format_transcript(&transcript, OutputFormat::Text).unwrap(),
            "> how many albums?\nPlease connect database first.\n\n"
        );
    }

    #[tokio::test]
    async fn test_run_text_output() {
        let mut orch = orchestrator();
        orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
            .await;

        let transcript = run(&mut orch, &["how many customers?".to_string()]).await;

        assert_eq!(
            format_transcript(&transcript, OutputFormat::Text).unwrap(),
            "> how many customers?\nSQL: SELECT COUNT(*) FROM customer\nResult: [(59,)]\nThe query returned [(59,)].\n\n"
        );
    }

    #[tokio::test]
    async fn test_run_json_output_with_failure() {
        let llm = MockLlmClient::new().with_response("drop everything", "I can't do that.");
        let mut orch = Orchestrator::new(Session::new(ConnectionManager::new(3)), Box::new(llm));
        orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
            .await;

        let questions = vec!["how many albums?".to_string(), "drop everything".to_string()];
        let transcript = run(&mut orch, &questions).await;
        let json: serde_json::Value =
            serde_json::from_str(&format_transcript(&transcript, OutputFormat::Json).unwrap())
                .unwrap();

        assert_eq!(json["connection"], "music_store");
        assert_eq!(json["entries"][0]["status"], "answered");
        assert_eq!(json["entries"][0]["result"], "[(347,)]");
        assert_eq!(json["entries"][1]["status"], "failed");
        assert!(json["entries"][1]["error"]
            .as_str()
            .unwrap()
            .starts_with("Query Error:"));
        assert_eq!(transcript.failures(), 1);
        assert_eq!(orch.session().turns().len(), 2);
    }
}
