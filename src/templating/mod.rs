//! SQL templating engine.
//!
//! This module turns named `.sql` template files into query text. Templates
//! are plain SQL with embedded tags; rendering substitutes variables, expands
//! includes, quotes literals through a host-supplied connection and wraps
//! sub-queries in PostgreSQL JSON aggregation.
//!
//! # Overview
//!
//! - [`Engine`]: entry point owning the search paths, cache and connection
//! - [`PathResolver`]: maps template names onto files across ordered roots
//! - [`TemplateCache`]: compiled templates keyed by name
//! - [`ConnectionHook`]: late-bound [`Connection`] used by `quote`
//! - [`Scope`]: variable lookup through nested include overlays
//! - [`WrapKind`]: the object and array aggregation text
//!
//! # Template Syntax
//!
//! | Tag | Effect |
//! |-----|--------|
//! | `<%= name %>` | value of `name`, unescaped; undefined and null render as nothing |
//! | `<%= user.id %>` | dotted lookup into objects and array indices |
//! | `<%= quote name %>` | value of `name` quoted by the connection |
//! | `<%= include 'other', key: value %>` | `other` expanded with extra bindings |
//! | `<%= object 'row' %>` / `<%= array 'rows' %>` | template wrapped as a JSON sub-query |
//! | `<% object do %>...<% end %>` | block body wrapped as a JSON object sub-query |
//! | `<% array do %>...<% end %>` | block body wrapped as a JSON array sub-query |
//! | `<%# note %>` | comment, produces nothing |
//! | `<%%` | a literal `<%` |
//!
//! `<% ... %>` and `<%= ... %>` are interchangeable. Helper arguments may be
//! wrapped in parentheses, bindings are written `key: value` or `key = value`,
//! and values are variable paths or literals (`'text'`, `"text"`, numbers,
//! `true`, `false`, `null`).
//!
//! # Scoping
//!
//! Bindings passed to `include`, `object` or `array` are visible in the
//! included template and everything it includes in turn, and shadow outer
//! variables of the same name. They never leak back to the caller. Block
//! bodies are part of the enclosing template and see its scope unchanged.
//!
//! # Examples
//!
//! ```rust,no_run
//! use pgjbuilder::templating::{Engine, Variables};
//! use serde_json::json;
//!
//! // queries/users/posts.sql:
//! //   SELECT id, title FROM posts WHERE user_id = <%= user_id %>
//! let engine = Engine::new();
//! let mut variables = Variables::new();
//! variables.insert("user_id".into(), json!(7));
//!
//! let sql = engine.render_array("users/posts", &variables)?;
//! assert!(sql.starts_with("SELECT COALESCE(array_to_json"));
//! # Ok::<(), anyhow::Error>(())
//! ```

mod cache;
mod connection;
mod engine;
mod expander;
mod resolver;
mod scope;
mod syntax;
mod wrap;

/// Variables supplied to a render call, keyed by name.
pub type Variables = serde_json::Map<String, serde_json::Value>;

pub use cache::{CacheStats, TemplateCache};
pub use connection::{Connection, ConnectionHook, ConnectionProvider};
pub use engine::{Engine, RenderMode};
pub use resolver::PathResolver;
pub use scope::Scope;
pub use syntax::{Binding, CompiledTemplate, Expr, Node};
pub use wrap::WrapKind;
