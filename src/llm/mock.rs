//! Mock LLM client for testing.
//!
//! Provides deterministic responses based on the question section of the
//! prompt, and records every prompt it receives.

use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::error::{AskError, Result};
use crate::llm::prompt::{ANSWER_SECTION, QUERY_SECTION};
use crate::llm::types::{Message, Role};
use crate::llm::LlmClient;

/// Mock LLM client that returns canned responses based on input patterns.
///
/// Used for unit testing and headless demos without a model server.
#[derive(Debug, Clone, Default)]
pub struct MockLlmClient {
    /// Custom response mappings (pattern -> response).
    custom_responses: Vec<(String, String)>,
    /// When set, every call fails with this message.
    failure: Option<String>,
    /// Every prompt received, in order.
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockLlmClient {
    /// Creates a new mock client with default responses.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a custom response mapping.
    ///
    /// When the question section of the prompt contains `pattern`, the mock
    /// will return `response`. Patterns are tried in insertion order.
    pub fn with_response(
        mut self,
        pattern: impl Into<String>,
        response: impl Into<String>,
    ) -> Self {
        self.custom_responses
            .push((pattern.into(), response.into()));
        self
    }

    /// Makes every call fail with an LLM error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            failure: Some(message.into()),
            ..Self::default()
        }
    }

    /// Returns a handle to the recorded prompts.
    pub fn prompt_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.prompts)
    }

    /// Returns the prompts received so far.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }

    /// Generates a mock response based on the prompt.
    fn mock_response(&self, prompt: &str) -> String {
        let section = question_section(prompt);
        let section_lower = section.to_lowercase();

        // Check custom responses first
        for (pattern, response) in &self.custom_responses {
            if section_lower.contains(&pattern.to_lowercase()) {
                return response.clone();
            }
        }

        if prompt.contains(ANSWER_SECTION) {
            return default_answer(section);
        }

        if section_lower.contains("how many") {
            if let Some(table) = ["album", "artist", "customer"]
                .into_iter()
                .find(|t| section_lower.contains(t))
            {
                return format!("```sql\nSELECT COUNT(*) FROM {table}\n```");
            }
        }

        "```sql\nSELECT 1\n```".to_string()
    }

    /// Extracts the last user message content from a message list.
    fn extract_user_input(messages: &[Message]) -> String {
        messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.clone())
            .unwrap_or_default()
    }
}

/// Returns the text after the last question heading, or the whole prompt.
fn question_section(prompt: &str) -> &str {
    [ANSWER_SECTION, QUERY_SECTION]
        .into_iter()
        .find_map(|heading| prompt.rfind(heading).map(|i| &prompt[i + heading.len()..]))
        .unwrap_or(prompt)
}

/// Echoes the result line back as a sentence.
fn default_answer(section: &str) -> String {
    let result = section
        .lines()
        .find_map(|line| line.strip_prefix("Result : "))
        .map(str::trim)
        .unwrap_or("");

    if result.is_empty() {
        "The query returned no rows.".to_string()
    } else {
        format!("The query returned {result}.")
    }
}

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        let input = Self::extract_user_input(messages);

        if let Ok(mut log) = self.prompts.lock() {
            log.push(input.clone());
        }

        if let Some(message) = &self.failure {
            return Err(AskError::llm(message.clone()));
        }

        Ok(self.mock_response(&input))
    }
}
