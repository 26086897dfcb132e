//! The two templated model calls of a chat turn.
//!
//! `synthesize_query` asks for a SQL statement, `synthesize_answer` asks for a
//! prose answer given the statement and its result. Each makes exactly one
//! request and returns the model text unmodified; callers sanitize the query.

use std::time::Instant;

use tracing::debug;

use super::prompt::{render_answer_prompt, render_query_prompt};
use super::{LlmClient, Message};
use crate::error::Result;

/// Asks the model to translate `question` into a SQL statement.
pub async fn synthesize_query(
    llm: &dyn LlmClient,
    question: &str,
    schema: &str,
    dialect: &str,
) -> Result<String> {
    let prompt = render_query_prompt(schema, question, dialect);
    let start = Instant::now();

    let raw = llm.complete(&[Message::user(prompt)]).await?;

    debug!(
        "Query synthesis took {:?}, {} chars returned",
        start.elapsed(),
        raw.len()
    );
    Ok(raw)
}

/// Asks the model to phrase `result_text` as an answer to `question`.
pub async fn synthesize_answer(
    llm: &dyn LlmClient,
    question: &str,
    sql: &str,
    result_text: &str,
    schema: &str,
    dialect: &str,
) -> Result<String> {
    let prompt = render_answer_prompt(schema, question, sql, result_text, dialect);
    let start = Instant::now();

    let answer = llm.complete(&[Message::user(prompt)]).await?;

    debug!("Answer synthesis took {:?}", start.elapsed());

    Ok(answer)
}
