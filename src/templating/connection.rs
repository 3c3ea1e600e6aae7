//! Late-bound database connection used for quoting and query execution.
//!
//! The engine never quotes literals itself. Templates call `quote`, and the
//! engine forwards the value to whatever [`Connection`] the host configured.
//! The host can configure either a connection value or a provider closure;
//! a provider is called on every access, so a host can hand out a pooled
//! connection per call or swap the live connection between renders.
//!
//! Errors produced by a connection or a provider are passed back to the caller
//! untouched.

use anyhow::Result;
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, PoisonError, RwLock};

use crate::core::PgJbuilderError;

/// Capability supplied by the host for quoting literals and running queries.
///
/// # Examples
///
/// ```rust
/// use pgjbuilder::templating::Connection;
/// use serde_json::Value;
///
/// struct SingleQuotes;
///
/// impl Connection for SingleQuotes {
///     fn quote(&self, value: &Value) -> anyhow::Result<String> {
///         Ok(match value {
///             Value::String(s) => format!("'{}'", s.replace('\'', "''")),
///             Value::Null => "NULL".to_string(),
///             other => other.to_string(),
///         })
///     }
/// }
/// ```
pub trait Connection: Send + Sync {
    /// Render `value` as a safely quoted SQL literal.
    fn quote(&self, value: &Value) -> Result<String>;

    /// Run `sql` and return the single value of its single row.
    ///
    /// The default implementation reports that the connection cannot execute
    /// queries.
    fn select_value(&self, sql: &str) -> Result<Value> {
        let _ = sql;
        Err(PgJbuilderError::QueryExecutionUnsupported.into())
    }
}

/// Closure producing the live connection on demand.
pub type ConnectionProvider = dyn Fn() -> Result<Arc<dyn Connection>> + Send + Sync;

#[derive(Clone)]
enum ConnectionSource {
    Value(Arc<dyn Connection>),
    Provider(Arc<ConnectionProvider>),
}

/// Slot holding the host's connection, read lazily on every use.
#[derive(Default)]
pub struct ConnectionHook {
    source: RwLock<Option<ConnectionSource>>,
}

impl fmt::Debug for ConnectionHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match &*self.source.read().unwrap_or_else(PoisonError::into_inner) {
            None => "unset",
            Some(ConnectionSource::Value(_)) => "value",
            Some(ConnectionSource::Provider(_)) => "provider",
        };
        f.debug_struct("ConnectionHook").field("source", &kind).finish()
    }
}

impl ConnectionHook {
    /// Use `connection` for every subsequent access.
    pub fn set(&self, connection: Arc<dyn Connection>) {
        self.replace(Some(ConnectionSource::Value(connection)));
    }

    /// Call `provider` on every subsequent access to obtain the connection.
    pub fn set_provider<F>(&self, provider: F)
    where
        F: Fn() -> Result<Arc<dyn Connection>> + Send + Sync + 'static,
    {
        self.replace(Some(ConnectionSource::Provider(Arc::new(provider))));
    }

    /// Remove the configured connection.
    pub fn clear(&self) {
        self.replace(None);
    }

    /// Whether a connection or provider is configured.
    pub fn is_configured(&self) -> bool {
        self.source.read().unwrap_or_else(PoisonError::into_inner).is_some()
    }

    /// The connection to use right now.
    ///
    /// A provider is invoked on every call and never memoized. The lock is
    /// released before the provider runs, so a slow provider does not block
    /// hosts reconfiguring the hook.
    ///
    /// # Errors
    ///
    /// [`PgJbuilderError::ConnectionNotConfigured`] when nothing is set, or the
    /// provider's own error.
    pub fn current(&self) -> Result<Arc<dyn Connection>> {
        let source = self.source.read().unwrap_or_else(PoisonError::into_inner).clone();
        match source {
            Some(ConnectionSource::Value(connection)) => Ok(connection),
            Some(ConnectionSource::Provider(provider)) => provider(),
            None => Err(PgJbuilderError::ConnectionNotConfigured.into()),
        }
    }

    fn replace(&self, source: Option<ConnectionSource>) {
        *self.source.write().unwrap_or_else(PoisonError::into_inner) = source;
    }
}
