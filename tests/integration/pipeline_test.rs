//! End-to-end turns through the orchestrator with mock clients.

use askdb::app::{NoopObserver, Orchestrator, TurnOutcome, TurnState};
use askdb::connection::ConnectionManager;
use askdb::db::{ColumnInfo, MockDatabaseClient, QueryResult, Value};
use askdb::error::AskError;
use askdb::llm::{sanitize, MockLlmClient};
use askdb::session::Session;
use pretty_assertions::assert_eq;

fn orchestrator(llm: MockLlmClient) -> Orchestrator {
    Orchestrator::new(Session::new(ConnectionManager::new(3)), Box::new(llm))
}

fn count_result(n: i64) -> QueryResult {
    QueryResult::with_data(
        vec![ColumnInfo::new("COUNT(*)", "BIGINT")],
        vec![vec![Value::Int(n)]],
    )
}

#[test]
fn test_sanitize_album_example() {
    let raw = "```sql\nSELECT COUNT(*) FROM album\n```";
    assert_eq!(sanitize(raw), "SELECT COUNT(*) FROM album");
}

#[tokio::test]
async fn test_album_question_end_to_end() {
    let db = MockDatabaseClient::music_store();
    let executed = db.executed_log();
    let mut orch = orchestrator(MockLlmClient::new());
    orch.attach(Box::new(db), "music_store").await;

    let outcome = orch
        .ask("how many albums we have in database", &mut NoopObserver)
        .await
        .unwrap();

    let TurnOutcome::Answered(report) = outcome else {
        panic!("expected an answer");
    };
    assert_eq!(report.sql, "SELECT COUNT(*) FROM album");
    assert_eq!(*executed.lock().unwrap(), vec!["SELECT COUNT(*) FROM album"]);
    assert_eq!(report.answer, "The query returned [(347,)].");
}

#[tokio::test]
async fn test_answer_prompt_contains_result_tuple() {
    let llm = MockLlmClient::new();
    let prompts = llm.prompt_log();
    let mut orch = orchestrator(llm);
    orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
        .await;

    orch.ask("how many customers?", &mut NoopObserver)
        .await
        .unwrap();

    let prompts = prompts.lock().unwrap();
    assert_eq!(prompts.len(), 2);
    assert!(prompts[1].contains("SQL query : SELECT COUNT(*) FROM customer"));
    assert!(prompts[1].contains("Result : [(59,)]"));
}

#[tokio::test]
async fn test_question_without_connection_calls_nothing() {
    let llm = MockLlmClient::new();
    let prompts = llm.prompt_log();
    let mut orch = orchestrator(llm);

    let outcome = orch.ask("how many albums?", &mut NoopObserver).await.unwrap();

    assert_eq!(outcome.display_text(), "Please connect database first.");
    assert!(prompts.lock().unwrap().is_empty());
    assert!(orch.session().turns().is_empty());
    assert_eq!(orch.state(), TurnState::Idle);
}

#[tokio::test]
async fn test_reconnect_routes_to_new_connection() {
    let first = MockDatabaseClient::music_store();
    let first_log = first.executed_log();
    let second = MockDatabaseClient::music_store()
        .with_result("SELECT COUNT(*) FROM album", count_result(12));
    let second_log = second.executed_log();

    let mut orch = orchestrator(MockLlmClient::new());
    orch.attach(Box::new(first), "first").await;
    orch.ask("how many albums?", &mut NoopObserver)
        .await
        .unwrap();

    orch.attach(Box::new(second), "second").await;
    let outcome = orch
        .ask("how many albums?", &mut NoopObserver)
        .await
        .unwrap();

    assert_eq!(outcome.display_text(), "The query returned [(12,)].");
    assert_eq!(first_log.lock().unwrap().len(), 1);
    assert_eq!(second_log.lock().unwrap().len(), 1);
    assert_eq!(orch.session().connections().label(), Some("second"));
}

#[tokio::test]
async fn test_failed_turn_keeps_question_without_answer() {
    let llm = MockLlmClient::new().with_response("drop everything", "I can't do that.");
    let mut orch = orchestrator(llm);
    orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
        .await;

    let result = orch.ask("drop everything", &mut NoopObserver).await;

    assert!(matches!(result, Err(AskError::Query(_))));
    let turns = orch.session().turns();
    assert_eq!(turns.len(), 1);
    assert_eq!(turns[0].question, "drop everything");
    assert_eq!(turns[0].answer, None);
    assert_eq!(orch.state(), TurnState::Connected);
}

#[tokio::test]
async fn test_llm_failure_orphans_turn() {
    let mut orch = orchestrator(MockLlmClient::failing("model offline"));
    orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
        .await;

    let result = orch.ask("how many artists?", &mut NoopObserver).await;

    assert!(matches!(result, Err(AskError::Llm(_))));
    assert!(!orch.session().turns()[0].is_answered());
}

#[tokio::test]
async fn test_history_keeps_order_across_turns() {
    let mut orch = orchestrator(MockLlmClient::new());
    orch.attach(Box::new(MockDatabaseClient::music_store()), "music_store")
        .await;

    for question in ["how many albums?", "how many artists?", "how many customers?"] {
        orch.ask(question, &mut NoopObserver).await.unwrap();
    }

    let answers: Vec<_> = orch
        .session()
        .turns()
        .iter()
        .map(|t| t.answer.clone().unwrap_or_default())
        .collect();
    assert_eq!(
        answers,
        vec![
            "The query returned [(347,)].",
            "The query returned [(275,)].",
            "The query returned [(59,)].",
        ]
    );
}
