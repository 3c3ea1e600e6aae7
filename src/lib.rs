//! pgjbuilder - SQL templates that build JSON in PostgreSQL
//!
//! A template engine for query text. Templates are `.sql` files with embedded
//! tags; rendering substitutes variables, splices in other templates, quotes
//! literals through a host-supplied connection and wraps sub-queries so
//! PostgreSQL returns a single JSON object or array.
//!
//! # Core Modules
//!
//! - [`templating`] - The engine: syntax, scopes, path resolution, cache and wrappers
//! - [`core`] - Error types and user-facing error reporting
//! - [`config`] - Optional `pgjb.toml` configuration
//! - [`cli`] - The `pgjb` command-line host
//! - [`constants`] - Shared defaults
//!
//! # Template Example
//!
//! `queries/users/show.sql`:
//! ```sql
//! SELECT users.id, users.name,
//!   <%= array 'posts/for_user', user_id: id %> AS posts
//! FROM users
//! WHERE users.id = <%= quote id %>
//! ```
//!
//! `queries/posts/for_user.sql`:
//! ```sql
//! SELECT id, title FROM posts WHERE user_id = <%= quote user_id %>
//! ```
//!
//! Rendering `users/show` with `render_object` produces one statement whose
//! single result column is the user as a JSON object, with the user's posts
//! nested as a JSON array.
//!
//! # Library Usage
//!
//! ```rust,no_run
//! use pgjbuilder::cli::PostgresQuoter;
//! use pgjbuilder::templating::{Engine, Variables};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let engine = Engine::new();
//! engine.paths().prepend("app/queries");
//! engine.set_connection(Arc::new(PostgresQuoter));
//!
//! let mut variables = Variables::new();
//! variables.insert("id".into(), json!(42));
//! let sql = engine.render_object("users/show", &variables)?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! # Command-Line Usage
//!
//! ```bash
//! pgjb render users/show --var id=42 --as object
//! pgjb -I app/queries list
//! ```

pub mod cli;
pub mod config;
pub mod constants;
pub mod core;
pub mod templating;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
