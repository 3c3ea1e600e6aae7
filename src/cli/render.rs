//! Render a template to SQL.

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::core::PgJbuilderError;
use crate::templating::{Engine, RenderMode, Variables};

/// Command to render a template and print the SQL to stdout.
///
/// # Examples
///
/// ```bash
/// pgjb render users/posts --var user_id=42
/// pgjb render users/posts --vars params.json --as array
/// pgjb render search --var "term=O'Brien" --var limit=10
/// ```
#[derive(Args)]
pub struct RenderCommand {
    /// Template name, e.g. `users/posts`
    name: String,

    /// Variable as KEY=VALUE; VALUE is parsed as JSON, falling back to a string
    #[arg(long = "var", value_name = "KEY=VALUE")]
    vars: Vec<String>,

    /// JSON file holding an object of variables, applied before --var
    #[arg(long = "vars", value_name = "FILE")]
    vars_file: Option<PathBuf>,

    /// Shape of the output statement
    #[arg(long = "as", value_enum, default_value = "plain")]
    pub(super) mode: OutputShape,
}

/// Values accepted by `--as`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub(super) enum OutputShape {
    /// The template's SQL unchanged
    Plain,
    /// One JSON object built from the first row
    Object,
    /// One JSON array built from every row
    Array,
}

impl From<OutputShape> for RenderMode {
    fn from(shape: OutputShape) -> Self {
        match shape {
            OutputShape::Plain => RenderMode::Plain,
            OutputShape::Object => RenderMode::Object,
            OutputShape::Array => RenderMode::Array,
        }
    }
}

impl RenderCommand {
    pub(super) async fn execute(self, engine: Arc<Engine>) -> Result<()> {
        let variables = self.variables().await?;
        let Self {
            name,
            mode,
            ..
        } = self;

        let mode = RenderMode::from(mode);
        let sql = tokio::task::spawn_blocking(move || engine.render_as(&name, &variables, mode))
            .await
            .context("Render task failed")??;
        println!("{sql}");
        Ok(())
    }

    async fn variables(&self) -> Result<Variables> {
        let mut variables = match &self.vars_file {
            Some(path) => read_variables_file(path).await?,
            None => Variables::new(),
        };
        for input in &self.vars {
            let (key, value) = parse_variable(input)?;
            variables.insert(key, value);
        }
        Ok(variables)
    }
}

async fn read_variables_file(path: &Path) -> Result<Variables> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read variables from {}", path.display()))?;
    let value: Value = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse variables from {}", path.display()))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(PgJbuilderError::InvalidVariable {
            input: path.display().to_string(),
            reason: "the file must contain a JSON object".to_string(),
        }
        .into()),
    }
}

/// Parse a `KEY=VALUE` argument.
///
/// The value is read as JSON when it parses (`42`, `true`, `null`, `[1,2]`,
/// `"quoted"`), and taken as a plain string otherwise.
///
/// # Errors
///
/// [`PgJbuilderError::InvalidVariable`] when there is no `=` or the key is empty.
///
/// # Examples
///
/// ```rust
/// use pgjbuilder::cli::parse_variable;
/// use serde_json::json;
///
/// assert_eq!(parse_variable("id=42")?, ("id".to_string(), json!(42)));
/// assert_eq!(parse_variable("name=Ada")?, ("name".to_string(), json!("Ada")));
/// # Ok::<(), pgjbuilder::core::PgJbuilderError>(())
/// ```
pub fn parse_variable(input: &str) -> Result<(String, Value), PgJbuilderError> {
    let invalid = |reason: &str| PgJbuilderError::InvalidVariable {
        input: input.to_string(),
        reason: reason.to_string(),
    };

    let (key, raw) = input.split_once('=').ok_or_else(|| invalid("expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid("the key is empty"));
    }

    let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
    Ok((key.to_string(), value))
}
