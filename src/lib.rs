//! askdb - Chat with a relational database in natural language.
//!
//! This library exposes the core modules for use in integration tests.

pub mod app;
pub mod cli;
pub mod config;
pub mod connection;
pub mod db;
pub mod error;
pub mod headless;
pub mod llm;
pub mod logging;
pub mod query;
pub mod session;
pub mod tui;
