//! Connection manager for the session's database handle.

use tracing::{info, warn};

use super::Availability;
use crate::config::ConnectionConfig;
use crate::db::{DatabaseBackend, DatabaseClient};
use crate::error::Result;

/// An active database connection with its metadata.
pub struct ActiveConnection {
    /// Human-readable target, e.g. `rag_test @ localhost:3306`.
    pub label: String,
    /// Database client.
    pub db: Box<dyn DatabaseClient>,
}

/// Manages the single database connection of a session.
///
/// A new connection always replaces the previous one; a failed attempt
/// leaves the previous one in place.
pub struct ConnectionManager {
    active: Option<ActiveConnection>,
    sample_rows: usize,
}

impl ConnectionManager {
    /// Creates a new connection manager.
    ///
    /// `sample_rows` is the number of rows per table included in the schema
    /// description.
    pub fn new(sample_rows: usize) -> Self {
        Self {
            active: None,
            sample_rows,
        }
    }

    /// Connect to a database using the given configuration.
    pub async fn connect(&mut self, config: &ConnectionConfig) -> Result<()> {
        let db = crate::db::connect(config).await?;
        self.attach(db, config.display_string()).await;
        Ok(())
    }

    /// Installs an already-connected client, replacing the current one.
    pub async fn attach(&mut self, db: Box<dyn DatabaseClient>, label: impl Into<String>) {
        let label = label.into();

        if let Some(old) = self.active.take() {
            if let Err(e) = old.db.close().await {
                warn!("Failed to close previous connection {}: {}", old.label, e);
            }
        }

        info!("Connected to {}", label);
        self.active = Some(ActiveConnection { label, db });
    }

    /// Get the active database client.
    pub fn db(&self) -> Option<&dyn DatabaseClient> {
        self.active.as_ref().map(|c| c.db.as_ref())
    }

    /// Get the label of the active connection.
    pub fn label(&self) -> Option<&str> {
        self.active.as_ref().map(|c| c.label.as_str())
    }

    /// Returns the backend of the active connection.
    pub fn backend(&self) -> Option<DatabaseBackend> {
        self.db().map(|db| db.backend())
    }

    /// Check if there's an active connection.
    pub fn is_connected(&self) -> bool {
        self.active.is_some()
    }

    /// Describes the schema of the active connection for a prompt.
    ///
    /// The description is built fresh on every call.
    pub async fn schema(&self) -> Result<Availability<String>> {
        let Some(db) = self.db() else {
            return Ok(Availability::NotConnected);
        };

        let schema = db.introspect_schema(self.sample_rows).await?;
        Ok(Availability::Ready(schema.format_for_llm()))
    }

    /// Close the active connection.
    pub async fn close(&mut self) -> Result<()> {
        if let Some(conn) = self.active.take() {
            conn.db.close().await?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FailingDatabaseClient, MockDatabaseClient};
    use crate::error::AskError;

    #[tokio::test]
    async fn test_new_manager_has_no_connection() {
        let manager = ConnectionManager::new(3);
        assert!(!manager.is_connected());
        assert!(manager.db().is_none());
        assert!(manager.label().is_none());
        assert_eq!(manager.schema().await.unwrap(), Availability::NotConnected);
    }

    #[tokio::test]
    async fn test_attach_and_describe_schema() {
        let mut manager = ConnectionManager::new(2);
        manager
            .attach(Box::new(MockDatabaseClient::music_store()), "music_store")
            .await;

        assert!(manager.is_connected());
        assert_eq!(manager.label(), Some("music_store"));
        assert_eq!(manager.backend(), Some(DatabaseBackend::MySql));

        let schema = manager.schema().await.unwrap().ready().unwrap();
        assert!(schema.contains("Table: album"));
        assert!(schema.contains("/* 2 rows from artist table:"));
    }

    #[tokio::test]
    async fn test_attach_replaces_previous_connection() {
        let first = MockDatabaseClient::new().with_label("first");
        let second = MockDatabaseClient::new().with_label("second");
        let first_log = first.executed_log();
        let second_log = second.executed_log();

        let mut manager = ConnectionManager::new(0);
        manager.attach(Box::new(first), "first").await;
        manager.attach(Box::new(second), "second").await;

        manager.db().unwrap().execute_query("SELECT 1").await.unwrap();

        assert_eq!(manager.label(), Some("second"));
        assert!(first_log.lock().unwrap().is_empty());
        assert_eq!(second_log.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_failed_connect_keeps_previous_connection() {
        let mut manager = ConnectionManager::new(0);
        manager
            .attach(Box::new(MockDatabaseClient::new()), "mock")
            .await;

        let config = ConnectionConfig {
            host: "bad host name".to_string(),
            ..Default::default()
        };
        let result = manager.connect(&config).await;

        assert!(matches!(result, Err(AskError::Connection(_))));
        assert_eq!(manager.label(), Some("mock"));
    }

    #[tokio::test]
    async fn test_schema_error_propagates() {
        let mut manager = ConnectionManager::new(3);
        manager
            .attach(Box::new(FailingDatabaseClient::new("lost connection")), "broken")
            .await;

        let result = manager.schema().await;
        assert!(matches!(result, Err(AskError::Query(_))));
    }

    #[tokio::test]
    async fn test_close_connection() {
        let mut manager = ConnectionManager::new(3);
        manager
            .attach(Box::new(MockDatabaseClient::new()), "mock")
            .await;

        manager.close().await.unwrap();
        assert!(!manager.is_connected());
    }
}
