//! Query execution for askdb.
//!
//! Runs generated SQL against the session's connection.

pub mod executor;

pub use executor::QueryExecutor;
