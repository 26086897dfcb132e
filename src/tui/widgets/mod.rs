//! TUI widgets for askdb.
//!
//! Contains reusable UI components.

pub mod chat;
pub mod header;
pub mod input;
pub mod sidebar;
