//! Core types for pgjbuilder
//!
//! This module holds the error types shared by the template engine, the
//! configuration layer and the command-line host.
//!
//! - [`PgJbuilderError`] - Enumerated failure modes, returned inside [`anyhow::Error`]
//! - [`ErrorContext`] - User-friendly wrapper with details and suggestions
//! - [`user_friendly_error`] - Convert any error into an [`ErrorContext`]
//!
//! # Examples
//!
//! ```rust
//! use pgjbuilder::core::{PgJbuilderError, user_friendly_error};
//!
//! let error = anyhow::Error::from(PgJbuilderError::ConnectionNotConfigured);
//! let friendly = user_friendly_error(error);
//! assert!(friendly.suggestion.is_some());
//! ```

pub mod error;

pub use error::{ErrorContext, PgJbuilderError, not_found_with_candidates, user_friendly_error};
