//! Error handling for pgjbuilder
//!
//! This module provides the error types raised by the template engine and the
//! user-friendly reporting used by the `pgjb` command-line host. The error system
//! follows two principles:
//! 1. **Strongly-typed errors** ([`PgJbuilderError`]) that callers can match on after
//!    downcasting the [`anyhow::Error`] returned by the engine
//! 2. **User-friendly messages** ([`ErrorContext`]) with details and suggestions for the CLI
//!
//! # Error Categories
//!
//! - **Resolution**: [`PgJbuilderError::TemplateNotFound`], [`PgJbuilderError::InvalidTemplateName`]
//! - **Expansion**: [`PgJbuilderError::RecursionLimitExceeded`], [`PgJbuilderError::TemplateSyntax`]
//! - **Connection**: [`PgJbuilderError::ConnectionNotConfigured`],
//!   [`PgJbuilderError::QueryExecutionUnsupported`]
//! - **Host configuration**: [`PgJbuilderError::ConfigError`], [`PgJbuilderError::InvalidVariable`]
//! - **Everything else**: [`PgJbuilderError::Other`], produced only by [`user_friendly_error`]
//!
//! Errors raised by a host-supplied [`Connection`](crate::templating::Connection) are never
//! wrapped: the engine returns them exactly as the connection produced them.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pgjbuilder::core::PgJbuilderError;
//! use pgjbuilder::templating::Engine;
//! use serde_json::Map;
//!
//! let engine = Engine::new();
//! match engine.render("reports/missing", &Map::new()) {
//!     Ok(sql) => println!("{sql}"),
//!     Err(e) => match e.downcast_ref::<PgJbuilderError>() {
//!         Some(PgJbuilderError::TemplateNotFound { name }) => eprintln!("no template {name}"),
//!         _ => eprintln!("render failed: {e}"),
//!     },
//! }
//! ```

use colored::Colorize;
use std::fmt;
use thiserror::Error;

/// The main error type for pgjbuilder operations.
///
/// Every variant carries enough context to produce a useful message on its own.
/// The engine returns these inside [`anyhow::Error`], so callers recover the
/// variant with [`anyhow::Error::downcast_ref`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PgJbuilderError {
    /// No search root contains a file for the requested template name.
    #[error("Template {name} was not found in any source paths")]
    TemplateNotFound {
        /// The template name exactly as requested
        name: String,
    },

    /// The template name cannot be mapped onto a relative file path.
    #[error("Invalid template name '{name}': {reason}")]
    InvalidTemplateName {
        /// The rejected template name
        name: String,
        /// Why the name was rejected
        reason: String,
    },

    /// An include chain nested deeper than the engine allows.
    #[error("Maximum include depth ({limit}) exceeded while rendering '{name}'")]
    RecursionLimitExceeded {
        /// Template that would have exceeded the limit
        name: String,
        /// The configured depth limit
        limit: usize,
    },

    /// The template text could not be compiled.
    #[error("Template syntax error in '{name}' at line {line}: {message}")]
    TemplateSyntax {
        /// Template being compiled
        name: String,
        /// 1-based line of the offending tag
        line: usize,
        /// Description of the problem
        message: String,
    },

    /// A template used `quote` (or a `select_*` call ran) with no connection set.
    #[error("No connection configured for quoting or query execution")]
    ConnectionNotConfigured,

    /// The configured connection can quote values but cannot execute queries.
    #[error("The configured connection cannot execute queries")]
    QueryExecutionUnsupported,

    /// The engine configuration file is invalid.
    #[error("Configuration error: {message}")]
    ConfigError {
        /// Description of the problem
        message: String,
    },

    /// A variable supplied by the host could not be parsed.
    #[error("Invalid variable '{input}': {reason}")]
    InvalidVariable {
        /// The raw input as given
        input: String,
        /// Why it could not be parsed
        reason: String,
    },

    /// Any other failure, with its cause chain already flattened.
    #[error("{message}")]
    Other {
        /// Error message
        message: String,
    },
}

/// User-friendly error wrapper with optional details and suggestions.
///
/// Used by the command-line host to present failures. Details explain what
/// happened; suggestions tell the user what to do next.
#[derive(Debug)]
pub struct ErrorContext {
    /// The underlying error
    pub error: PgJbuilderError,
    /// Optional suggestion for resolving the error
    pub suggestion: Option<String>,
    /// Optional additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with no details or suggestion.
    #[must_use]
    pub const fn new(error: PgJbuilderError) -> Self {
        Self {
            error,
            suggestion: None,
            details: None,
        }
    }

    /// Add a suggestion for resolving the error.
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add additional details explaining the error.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    /// Display the error context to stderr with terminal colors.
    ///
    /// - Error message: red and bold
    /// - Details: yellow
    /// - Suggestion: green
    pub fn display(&self) {
        eprintln!("{}: {}", "error".red().bold(), self.error);

        if let Some(details) = &self.details {
            eprintln!("{}: {}", "details".yellow(), details);
        }

        if let Some(suggestion) = &self.suggestion {
            eprintln!("{}: {}", "suggestion".green(), suggestion);
        }
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)?;

        if let Some(details) = &self.details {
            write!(f, "\nDetails: {details}")?;
        }

        if let Some(suggestion) = &self.suggestion {
            write!(f, "\nSuggestion: {suggestion}")?;
        }

        Ok(())
    }
}

impl std::error::Error for ErrorContext {}

/// Convert any error into an [`ErrorContext`] with actionable suggestions.
///
/// [`PgJbuilderError`] variants get tailored suggestions. Anything else (I/O
/// failures, connection errors, TOML errors) is reported with its full cause
/// chain.
///
/// # Examples
///
/// ```rust,no_run
/// use pgjbuilder::core::{PgJbuilderError, user_friendly_error};
///
/// let error = anyhow::Error::from(PgJbuilderError::TemplateNotFound {
///     name: "users/list".to_string(),
/// });
/// user_friendly_error(error).display();
/// ```
#[must_use]
pub fn user_friendly_error(error: anyhow::Error) -> ErrorContext {
    if let Some(engine_error) = error.downcast_ref::<PgJbuilderError>() {
        return create_error_context(engine_error.clone());
    }

    if let Some(toml_error) = error.downcast_ref::<toml::de::Error>() {
        return ErrorContext::new(PgJbuilderError::ConfigError {
            message: toml_error.to_string(),
        })
        .with_suggestion("Check the TOML syntax of your pgjb.toml file");
    }

    let mut message = error.to_string();
    let chain: Vec<String> =
        error.chain().skip(1).map(std::string::ToString::to_string).collect();

    if !chain.is_empty() {
        message.push_str("\n\nCaused by:");
        for (i, cause) in chain.iter().enumerate() {
            message.push_str(&format!("\n  {}: {}", i + 1, cause));
        }
    }

    ErrorContext::new(PgJbuilderError::Other {
        message,
    })
}

/// Attach suggestions to a known [`PgJbuilderError`].
fn create_error_context(error: PgJbuilderError) -> ErrorContext {
    match &error {
        PgJbuilderError::TemplateNotFound {
            name,
        } => {
            let suggestion = format!(
                "Create '{name}.sql' under one of the search paths, or add its directory with --path"
            );
            ErrorContext::new(error).with_suggestion(suggestion)
        }
        PgJbuilderError::InvalidTemplateName {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Template names are relative paths like 'users/list' without '..' or a leading '/'",
        ),
        PgJbuilderError::RecursionLimitExceeded {
            ..
        } => ErrorContext::new(error)
            .with_details("A template includes itself, directly or through a chain of includes")
            .with_suggestion("Break the include cycle or raise max_depth in pgjb.toml"),
        PgJbuilderError::TemplateSyntax {
            ..
        } => ErrorContext::new(error).with_suggestion(
            "Tags look like <%= name %>, <%= include 'other', key: 'value' %> or \
             <% object do %>...<% end %>",
        ),
        PgJbuilderError::ConnectionNotConfigured => ErrorContext::new(error)
            .with_suggestion("Set a connection on the engine before rendering templates that use quote"),
        PgJbuilderError::QueryExecutionUnsupported => ErrorContext::new(error)
            .with_details("The connection only implements quoting"),
        PgJbuilderError::ConfigError {
            ..
        } => ErrorContext::new(error).with_suggestion("Check the contents of your pgjb.toml file"),
        PgJbuilderError::InvalidVariable {
            ..
        } => ErrorContext::new(error)
            .with_suggestion("Pass variables as key=value, for example --var user_id=42"),
        PgJbuilderError::Other {
            ..
        } => ErrorContext::new(error),
    }
}

/// Attach a "did you mean" suggestion to a not-found error.
///
/// `candidates` is the list of template names available to the engine. The
/// closest names by edit distance are offered when they are similar enough.
#[must_use]
pub fn not_found_with_candidates(name: &str, candidates: &[String]) -> ErrorContext {
    let context = create_error_context(PgJbuilderError::TemplateNotFound {
        name: name.to_string(),
    });
    let similar = similar_names(name, candidates);
    if similar.is_empty() {
        return context;
    }
    context.with_details(format!("Did you mean: {}?", similar.join(", ")))
}

/// Maximum edit distance, as a percentage of the requested name's length.
const SIMILARITY_THRESHOLD_PERCENT: usize = 50;

fn similar_names(name: &str, candidates: &[String]) -> Vec<String> {
    let threshold = (name.len() * SIMILARITY_THRESHOLD_PERCENT / 100).max(1);
    let mut scored: Vec<(usize, &String)> = candidates
        .iter()
        .map(|candidate| (strsim::levenshtein(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= threshold)
        .collect();
    scored.sort();
    scored.into_iter().take(3).map(|(_, candidate)| candidate.clone()).collect()
}
