//! PostgreSQL literal quoting for the command-line host.

use anyhow::Result;
use serde_json::Value;

use crate::templating::Connection;

/// Offline quoter producing PostgreSQL literals.
///
/// It follows the rules of PostgreSQL's `quote_literal`: single quotes are
/// doubled, and a string containing backslashes becomes an `E'...'` literal
/// with its backslashes doubled. Null becomes `NULL`, booleans `TRUE` /
/// `FALSE`, numbers are written as is, and arrays and objects are quoted as
/// their JSON text.
///
/// It cannot execute queries.
#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresQuoter;

impl Connection for PostgresQuoter {
    fn quote(&self, value: &Value) -> Result<String> {
        Ok(match value {
            Value::Null => "NULL".to_string(),
            Value::Bool(true) => "TRUE".to_string(),
            Value::Bool(false) => "FALSE".to_string(),
            Value::Number(number) => number.to_string(),
            Value::String(text) => quote_literal(text),
            composite => quote_literal(&composite.to_string()),
        })
    }
}

fn quote_literal(text: &str) -> String {
    let doubled = text.replace('\'', "''");
    if text.contains('\\') {
        format!("E'{}'", doubled.replace('\\', "\\\\"))
    } else {
        format!("'{doubled}'")
    }
}
