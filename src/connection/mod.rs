//! Connection management for askdb.
//!
//! Holds the single live database handle of a session and reports its
//! absence as a value rather than an error.

pub mod manager;

pub use manager::{ActiveConnection, ConnectionManager};

use std::fmt;

/// Text returned in place of a schema or result when no database is connected.
pub const NOT_CONNECTED_ADVISORY: &str = "Please connect to database";

/// A value that needs a live connection, or the fact that there is none.
#[derive(Debug, Clone, PartialEq)]
pub enum Availability<T> {
    /// The connection was present and produced a value.
    Ready(T),
    /// No connection is active.
    NotConnected,
}

impl<T> Availability<T> {
    /// Returns the value, if any.
    pub fn ready(self) -> Option<T> {
        match self {
            Self::Ready(value) => Some(value),
            Self::NotConnected => None,
        }
    }

    /// Returns true if no connection was active.
    pub fn is_not_connected(&self) -> bool {
        matches!(self, Self::NotConnected)
    }

    /// Maps the ready value.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Availability<U> {
        match self {
            Self::Ready(value) => Availability::Ready(f(value)),
            Self::NotConnected => Availability::NotConnected,
        }
    }
}

impl<T: fmt::Display> fmt::Display for Availability<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ready(value) => value.fmt(f),
            Self::NotConnected => f.write_str(NOT_CONNECTED_ADVISORY),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_connected_displays_advisory() {
        let schema: Availability<String> = Availability::NotConnected;
        assert_eq!(schema.to_string(), "Please connect to database");
        assert!(schema.is_not_connected());
        assert_eq!(schema.ready(), None);
    }

    #[test]
    fn test_ready_displays_value() {
        let schema = Availability::Ready("Database Schema:".to_string());
        assert_eq!(schema.to_string(), "Database Schema:");
        assert_eq!(schema.map(|s| s.len()), Availability::Ready(16));
    }
}
