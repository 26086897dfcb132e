//! Query execution against the active connection.
//!
//! Provides isolated query execution that can be tested independently
//! of the full orchestrator.

use tracing::{debug, info};

use crate::connection::{Availability, ConnectionManager};
use crate::db::QueryResult;
use crate::error::Result;

/// Runs SQL verbatim on whichever connection is active at call time.
pub struct QueryExecutor<'a> {
    connections: &'a ConnectionManager,
}

impl<'a> QueryExecutor<'a> {
    /// Creates a new query executor.
    pub fn new(connections: &'a ConnectionManager) -> Self {
        Self { connections }
    }

    /// Executes `sql` and returns every row it produced.
    ///
    /// Returns `Availability::NotConnected` instead of touching anything when
    /// no database is connected. Driver errors are returned unchanged.
    pub async fn execute(&self, sql: &str) -> Result<Availability<QueryResult>> {
        let Some(db) = self.connections.db() else {
            return Ok(Availability::NotConnected);
        };

        let result = db.execute_query(sql).await?;

        debug!(
            "Query returned {} rows in {:?}",
            result.row_count, result.execution_time
        );
        info!("Query result: {}", result.to_result_text());

        Ok(Availability::Ready(result))
    }
}
