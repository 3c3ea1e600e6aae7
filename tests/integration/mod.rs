//! Integration test suite for pgjbuilder
//!
//! End-to-end tests for the template engine and the `pgjb` binary. Each test
//! builds its own template tree in a temporary directory.
//!
//! # Running Integration Tests
//!
//! ```bash
//! cargo test --test integration
//! ```
//!
//! # Test Organization
//!
//! - **render**: Rendering through the public engine API
//! - **paths**: Search path ordering and shadowing
//! - **cache**: Compiled template cache behaviour
//! - **connection**: Quoting hooks, providers and query execution
//! - **cli**: The `pgjb` command-line host

// Shared test utilities (from parent tests/ directory)
#[path = "../common/mod.rs"]
mod common;

mod cache;
mod cli;
mod connection;
mod paths;
mod render;
