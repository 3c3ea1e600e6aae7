//! Test utilities for pgjbuilder
//!
//! Helpers shared by unit and integration tests: a temporary template tree,
//! connections that record what they were asked to quote, and one-time
//! logging setup.
//!
//! # Example
//!
//! ```rust,no_run
//! use pgjbuilder::test_utils::{RecordingConnection, TemplateDir};
//! use pgjbuilder::templating::Variables;
//! use std::sync::Arc;
//!
//! let dir = TemplateDir::new().unwrap();
//! dir.write("users/list", "SELECT * FROM users WHERE name = <%= quote name %>").unwrap();
//!
//! let engine = dir.engine();
//! let connection = Arc::new(RecordingConnection::default());
//! engine.set_connection(connection.clone());
//! ```

pub mod fixtures;

pub use fixtures::TemplateDir;

use anyhow::Result;
use serde_json::Value;
use std::sync::{Mutex, Once, PoisonError};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use crate::templating::Connection;

static INIT_LOGGING: Once = Once::new();

/// Route the engine's `tracing` output to the test harness.
///
/// [`TemplateDir::new`] calls this, so any test that builds a template root
/// gets resolver and expander logs. Only the first call has an effect.
/// `level` applies to the `pgjbuilder` target alone; without it the
/// `RUST_LOG` directives are used, and with neither nothing is printed.
///
/// ```bash
/// RUST_LOG=pgjbuilder::templating=trace cargo test --test integration render
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let Some(filter) = test_log_filter(level, std::env::var("RUST_LOG").ok().as_deref()) else {
            return;
        };
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .without_time()
            .try_init();
    });
}

fn test_log_filter(level: Option<Level>, rust_log: Option<&str>) -> Option<EnvFilter> {
    match (level, rust_log) {
        (Some(level), _) => Some(EnvFilter::new(format!("pgjbuilder={level}"))),
        (None, Some(directives)) if !directives.trim().is_empty() => Some(EnvFilter::new(directives)),
        _ => None,
    }
}

/// Connection that quotes like `'value'` and remembers every value it quoted.
///
/// Strings are wrapped in single quotes without escaping, null becomes
/// `NULL` and everything else is written as JSON. `select_value` returns the
/// configured result, or fails like a quoting-only connection when none is
/// set.
#[derive(Debug, Default)]
pub struct RecordingConnection {
    quoted: Mutex<Vec<Value>>,
    executed: Mutex<Vec<String>>,
    result: Option<Value>,
}

impl RecordingConnection {
    /// A connection whose queries all return `result`.
    pub fn returning(result: Value) -> Self {
        Self {
            result: Some(result),
            ..Self::default()
        }
    }

    /// Values passed to `quote`, in call order.
    pub fn quoted(&self) -> Vec<Value> {
        self.quoted.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// SQL passed to `select_value`, in call order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.lock().unwrap_or_else(PoisonError::into_inner).clone()
    }
}

impl Connection for RecordingConnection {
    fn quote(&self, value: &Value) -> Result<String> {
        self.quoted.lock().unwrap_or_else(PoisonError::into_inner).push(value.clone());
        Ok(match value {
            Value::String(text) => format!("'{text}'"),
            Value::Null => "NULL".to_string(),
            other => other.to_string(),
        })
    }

    fn select_value(&self, sql: &str) -> Result<Value> {
        self.executed.lock().unwrap_or_else(PoisonError::into_inner).push(sql.to_string());
        match &self.result {
            Some(result) => Ok(result.clone()),
            None => Err(crate::core::PgJbuilderError::QueryExecutionUnsupported.into()),
        }
    }
}
