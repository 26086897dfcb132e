//! Integration tests for askdb.

pub mod connection_test;
pub mod headless_test;
pub mod pipeline_test;
