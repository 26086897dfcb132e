//! Mock database clients for testing.
//!
//! Provides in-memory database implementations for headless runs and tests.

use super::{
    ColumnInfo, Column, DatabaseBackend, DatabaseClient, ForeignKey, QueryResult, Schema, Table,
    Value,
};
use crate::error::{AskError, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// A mock database client that returns predefined results.
///
/// Every executed statement is appended to a shared log, so a test can keep a
/// handle to the log after the client has been moved into a connection manager.
#[derive(Debug, Clone)]
pub struct MockDatabaseClient {
    label: String,
    schema: Schema,
    results: HashMap<String, QueryResult>,
    executed: Arc<Mutex<Vec<String>>>,
}

impl MockDatabaseClient {
    /// Creates a new mock database client with an empty schema.
    pub fn new() -> Self {
        Self {
            label: "mock".to_string(),
            schema: Schema::default(),
            results: HashMap::new(),
            executed: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Creates a new mock database client with the given schema.
    pub fn with_schema(schema: Schema) -> Self {
        Self {
            schema,
            ..Self::new()
        }
    }

    /// A small music store: artists, albums and customers, with canned
    /// answers for the counting questions used in demos.
    pub fn music_store() -> Self {
        let schema = Schema {
            tables: vec![
                Table::new("album")
                    .column(Column::new("album_id", "int").nullable(false))
                    .column(Column::new("title", "varchar(160)").nullable(false))
                    .column(Column::new("artist_id", "int").nullable(false))
                    .primary_key(&["album_id"])
                    .with_sample_rows(vec![
                        vec![Value::Int(1), Value::from("For Those About To Rock We Salute You"), Value::Int(1)],
                        vec![Value::Int(2), Value::from("Balls to the Wall"), Value::Int(2)],
                        vec![Value::Int(3), Value::from("Restless and Wild"), Value::Int(2)],
                    ]),
                Table::new("artist")
                    .column(Column::new("artist_id", "int").nullable(false))
                    .column(Column::new("name", "varchar(120)"))
                    .primary_key(&["artist_id"])
                    .with_sample_rows(vec![
                        vec![Value::Int(1), Value::from("AC/DC")],
                        vec![Value::Int(2), Value::from("Accept")],
                        vec![Value::Int(3), Value::from("Aerosmith")],
                    ]),
                Table::new("customer")
                    .column(Column::new("customer_id", "int").nullable(false))
                    .column(Column::new("first_name", "varchar(40)").nullable(false))
                    .column(Column::new("last_name", "varchar(20)").nullable(false))
                    .column(Column::new("country", "varchar(40)"))
                    .primary_key(&["customer_id"])
                    .with_sample_rows(vec![
                        vec![Value::Int(1), Value::from("Luís"), Value::from("Gonçalves"), Value::from("Brazil")],
                        vec![Value::Int(2), Value::from("Leonie"), Value::from("Köhler"), Value::from("Germany")],
                        vec![Value::Int(3), Value::from("François"), Value::from("Tremblay"), Value::from("Canada")],
                    ]),
            ],
            foreign_keys: vec![ForeignKey::new(
                "album",
                vec!["artist_id".to_string()],
                "artist",
                vec!["artist_id".to_string()],
            )],
        };

        let count = |n: i64| {
            QueryResult::with_data(
                vec![ColumnInfo::new("COUNT(*)", "BIGINT")],
                vec![vec![Value::Int(n)]],
            )
        };

        Self::with_schema(schema)
            .with_label("music_store")
            .with_result("SELECT COUNT(*) FROM album", count(347))
            .with_result("SELECT COUNT(*) FROM artist", count(275))
            .with_result("SELECT COUNT(*) FROM customer", count(59))
            .with_result(
                "SELECT COUNT(*) FROM customer WHERE country='Brazil'",
                count(5),
            )
    }

    /// Sets the label reported in the executed-statement log.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    /// Registers the result returned for an exact SQL text.
    ///
    /// Matching ignores surrounding whitespace and a trailing semicolon.
    pub fn with_result(mut self, sql: &str, result: QueryResult) -> Self {
        self.results.insert(normalize(sql), result);
        self
    }

    /// Returns the label of this client.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Returns a handle to the log of executed statements.
    pub fn executed_log(&self) -> Arc<Mutex<Vec<String>>> {
        Arc::clone(&self.executed)
    }

    /// Returns the statements executed so far.
    pub fn executed(&self) -> Vec<String> {
        self.executed
            .lock()
            .map(|log| log.clone())
            .unwrap_or_default()
    }
}

impl Default for MockDatabaseClient {
    fn default() -> Self {
        Self::new()
    }
}

fn normalize(sql: &str) -> String {
    sql.trim().trim_end_matches(';').trim_end().to_string()
}

#[async_trait]
impl DatabaseClient for MockDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySql
    }

    async fn introspect_schema(&self, sample_rows: usize) -> Result<Schema> {
        let mut schema = self.schema.clone();
        for table in &mut schema.tables {
            table.sample_rows.truncate(sample_rows);
        }
        Ok(schema)
    }

    async fn execute_query(&self, sql: &str) -> Result<QueryResult> {
        if let Ok(mut log) = self.executed.lock() {
            log.push(sql.to_string());
        }

        if let Some(result) = self.results.get(&normalize(sql)) {
            return Ok(result.clone().with_execution_time(Duration::from_millis(1)));
        }

        let sql_upper = sql.trim_start().to_uppercase();

        if sql_upper.starts_with("SELECT") {
            let columns = vec![ColumnInfo::new("result", "text")];
            let rows = vec![vec![Value::String(format!("Mock result for: {}", sql))]];

            Ok(QueryResult::with_data(columns, rows).with_execution_time(Duration::from_millis(1)))
        } else if sql_upper.starts_with("INSERT")
            || sql_upper.starts_with("UPDATE")
            || sql_upper.starts_with("DELETE")
            || sql_upper.starts_with("CREATE")
            || sql_upper.starts_with("DROP")
        {
            // Statements without a result set
            Ok(QueryResult::new().with_execution_time(Duration::from_millis(1)))
        } else {
            Err(AskError::query(format!(
                "You have an error in your SQL syntax near '{}'",
                sql.trim()
            )))
        }
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}

/// A database client whose every operation fails.
#[derive(Debug, Clone)]
pub struct FailingDatabaseClient {
    message: String,
}

impl FailingDatabaseClient {
    /// Creates a client that fails with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[async_trait]
impl DatabaseClient for FailingDatabaseClient {
    fn backend(&self) -> DatabaseBackend {
        DatabaseBackend::MySql
    }

    async fn introspect_schema(&self, _sample_rows: usize) -> Result<Schema> {
        Err(AskError::query(self.message.clone()))
    }

    async fn execute_query(&self, _sql: &str) -> Result<QueryResult> {
        Err(AskError::query(self.message.clone()))
    }

    async fn close(&self) -> Result<()> {
        Ok(())
    }
}
