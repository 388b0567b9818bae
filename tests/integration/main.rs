//! End-to-end tests for the harvest pipeline
//!
//! Runs are driven by fixture-backed source clients against temporary stores
//! and export directories.

mod pipeline_tests;
