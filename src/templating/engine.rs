//! The template engine entry point.
//!
//! [`Engine`] owns the three pieces of state a host configures once and then
//! shares: the search path list, the compiled template cache and the
//! connection hook. Rendering borrows them immutably, so an engine behind an
//! `Arc` serves any number of threads.

use anyhow::Result;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

use super::Variables;
use super::cache::TemplateCache;
use super::connection::{Connection, ConnectionHook};
use super::expander::Expander;
use super::resolver::PathResolver;
use super::syntax::CompiledTemplate;
use super::wrap::WrapKind;
use crate::config::EngineConfig;
use crate::constants::{DEFAULT_MAX_DEPTH, MAX_DEPTH_LIMIT};

/// Shape of the SQL produced by [`Engine::render_as`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RenderMode {
    /// The template's text as is
    #[default]
    Plain,
    /// Wrapped so the first row comes back as one JSON object
    Object,
    /// Wrapped so all rows come back as one JSON array
    Array,
}

impl RenderMode {
    fn wrap_kind(self) -> Option<WrapKind> {
        match self {
            RenderMode::Plain => None,
            RenderMode::Object => Some(WrapKind::Object),
            RenderMode::Array => Some(WrapKind::Array),
        }
    }
}

/// SQL template engine.
///
/// # Examples
///
/// ```rust,no_run
/// use pgjbuilder::templating::{Engine, Variables};
/// use serde_json::json;
///
/// let engine = Engine::new();
/// engine.paths().prepend("app/queries");
///
/// let mut variables = Variables::new();
/// variables.insert("user_id".into(), json!(42));
/// let sql = engine.render_array("users/posts", &variables)?;
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug)]
pub struct Engine {
    resolver: PathResolver,
    cache: TemplateCache,
    connection: ConnectionHook,
    max_depth: usize,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

impl Engine {
    /// Create an engine searching only the built-in default root, with caching
    /// enabled and no connection.
    pub fn new() -> Self {
        Self::with_resolver(PathResolver::default())
    }

    /// Create an engine over a custom resolver.
    pub fn with_resolver(resolver: PathResolver) -> Self {
        Self {
            resolver,
            cache: TemplateCache::default(),
            connection: ConnectionHook::default(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    /// Create an engine from loaded configuration.
    ///
    /// Configured paths are searched first, in order, followed by the
    /// built-in default root.
    pub fn from_config(config: &EngineConfig) -> Self {
        let resolver = PathResolver::new(config.search_paths(), config.extension.clone());
        Self::with_resolver(resolver)
            .with_caching(config.caching)
            .with_max_depth(config.max_depth)
    }

    /// Set the maximum include depth, capped at [`MAX_DEPTH_LIMIT`].
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth.min(MAX_DEPTH_LIMIT);
        self
    }

    /// Set whether compiled templates are cached.
    #[must_use]
    pub fn with_caching(self, enabled: bool) -> Self {
        self.cache.set_enabled(enabled);
        self
    }

    /// Search path list, for prepending or appending roots.
    pub fn paths(&self) -> &PathResolver {
        &self.resolver
    }

    /// Compiled template cache.
    pub fn cache(&self) -> &TemplateCache {
        &self.cache
    }

    /// Drop every compiled template.
    pub fn clear_cache(&self) {
        self.cache.clear();
    }

    /// Turn template caching on or off.
    pub fn set_caching_enabled(&self, enabled: bool) {
        self.cache.set_enabled(enabled);
    }

    /// Whether template caching is on.
    pub fn caching_enabled(&self) -> bool {
        self.cache.is_enabled()
    }

    /// Maximum include depth.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    /// Use `connection` for quoting and query execution.
    pub fn set_connection(&self, connection: Arc<dyn Connection>) {
        self.connection.set(connection);
    }

    /// Obtain the connection from `provider` on every use.
    pub fn set_connection_provider<F>(&self, provider: F)
    where
        F: Fn() -> Result<Arc<dyn Connection>> + Send + Sync + 'static,
    {
        self.connection.set_provider(provider);
    }

    /// The connection hook, for clearing or inspecting it.
    pub fn connection_hook(&self) -> &ConnectionHook {
        &self.connection
    }

    /// The connection currently configured, invoking the provider if one is set.
    pub fn connection(&self) -> Result<Arc<dyn Connection>> {
        self.connection.current()
    }

    /// Resolve the file backing `name`.
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        self.resolver.resolve(name)
    }

    /// Compile `name` (or fetch it from the cache) without rendering it.
    pub fn compile(&self, name: &str) -> Result<Arc<CompiledTemplate>> {
        self.cache.get_or_compile(name, &self.resolver)
    }

    /// Render template `name` with `variables`.
    ///
    /// # Errors
    ///
    /// - [`TemplateNotFound`](crate::core::PgJbuilderError::TemplateNotFound) for
    ///   the first template (root or included) that cannot be found
    /// - [`RecursionLimitExceeded`](crate::core::PgJbuilderError::RecursionLimitExceeded)
    ///   when includes nest too deeply
    /// - [`TemplateSyntax`](crate::core::PgJbuilderError::TemplateSyntax) for
    ///   templates that do not compile
    /// - the connection's own error when quoting fails
    pub fn render(&self, name: &str, variables: &Variables) -> Result<String> {
        tracing::debug!("Rendering template '{}' with {} variable(s)", name, variables.len());
        self.expander().render(name, variables)
    }

    /// Render `name` as a complete statement returning one JSON object.
    pub fn render_object(&self, name: &str, variables: &Variables) -> Result<String> {
        self.render_as(name, variables, RenderMode::Object)
    }

    /// Render `name` as a complete statement returning one JSON array.
    pub fn render_array(&self, name: &str, variables: &Variables) -> Result<String> {
        self.render_as(name, variables, RenderMode::Array)
    }

    /// Render `name` in the given `mode`.
    pub fn render_as(&self, name: &str, variables: &Variables, mode: RenderMode) -> Result<String> {
        let body = self.render(name, variables)?;
        Ok(match mode.wrap_kind() {
            Some(kind) => kind.wrap_statement(&body),
            None => body,
        })
    }

    /// Render `name` and return the single value the query produces.
    pub fn select_value(&self, name: &str, variables: &Variables) -> Result<Value> {
        self.select(name, variables, RenderMode::Plain)
    }

    /// Render `name` as an object statement and return the resulting JSON object.
    pub fn select_object(&self, name: &str, variables: &Variables) -> Result<Value> {
        self.select(name, variables, RenderMode::Object)
    }

    /// Render `name` as an array statement and return the resulting JSON array.
    pub fn select_array(&self, name: &str, variables: &Variables) -> Result<Value> {
        self.select(name, variables, RenderMode::Array)
    }

    fn select(&self, name: &str, variables: &Variables, mode: RenderMode) -> Result<Value> {
        let sql = self.render_as(name, variables, mode)?;
        let connection = self.connection.current()?;
        tracing::debug!("Executing '{}' ({} bytes of SQL)", name, sql.len());
        connection.select_value(&sql)
    }

    fn expander(&self) -> Expander<'_> {
        Expander {
            resolver: &self.resolver,
            cache: &self.cache,
            connection: &self.connection,
            max_depth: self.max_depth,
        }
    }
}
