//! Engine configuration file (`pgjb.toml`).
//!
//! # File Format
//!
//! ```toml
//! # Searched in order, ahead of the built-in `queries` root.
//! # Relative entries are resolved against the directory holding this file.
//! paths = ["app/queries", "vendor/queries"]
//!
//! # Extension appended to template names (default "sql")
//! extension = "sql"
//!
//! # Reuse compiled templates between renders (default true)
//! caching = true
//!
//! # Maximum include nesting (default 50, at most 256)
//! max_depth = 50
//! ```
//!
//! Every key is optional and unknown keys are rejected.
//!
//! # Lookup Order
//!
//! 1. An explicit path (the CLI's `--config`)
//! 2. The path in the `PGJB_CONFIG` environment variable
//! 3. `pgjb.toml` in the working directory, if it exists
//! 4. Built-in defaults

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

use crate::constants::{
    CONFIG_ENV_VAR, CONFIG_FILE_NAME, DEFAULT_MAX_DEPTH, DEFAULT_TEMPLATE_EXTENSION,
    DEFAULT_TEMPLATE_ROOT, MAX_DEPTH_LIMIT,
};
use crate::core::PgJbuilderError;

fn default_extension() -> String {
    DEFAULT_TEMPLATE_EXTENSION.to_string()
}

const fn default_caching() -> bool {
    true
}

const fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

/// Settings used to build an [`Engine`](crate::templating::Engine).
///
/// # Examples
///
/// ```rust
/// use pgjbuilder::config::EngineConfig;
///
/// let config = EngineConfig::from_toml_str("paths = ['app/queries']\nmax_depth = 10")?;
/// assert_eq!(config.max_depth, 10);
/// assert!(config.caching);
/// # Ok::<(), anyhow::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Template roots searched before the built-in default root.
    #[serde(default)]
    pub paths: Vec<PathBuf>,

    /// Extension appended to template names, without the dot.
    #[serde(default = "default_extension")]
    pub extension: String,

    /// Whether compiled templates are cached between renders.
    #[serde(default = "default_caching")]
    pub caching: bool,

    /// Maximum include nesting before rendering fails, at most 256.
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            paths: Vec::new(),
            extension: default_extension(),
            caching: default_caching(),
            max_depth: default_max_depth(),
        }
    }
}

impl EngineConfig {
    /// Parse configuration from TOML text.
    ///
    /// Relative paths are kept as written.
    ///
    /// # Errors
    ///
    /// Returns the TOML error for malformed input or unknown keys, and
    /// [`PgJbuilderError::ConfigError`] for values that fail validation.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from `path`.
    ///
    /// Relative entries in `paths` are resolved against the directory that
    /// contains the file, so a config works the same from any working
    /// directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// fails validation.
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config from {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        config.validate()?;

        if let Some(base) = path.parent() {
            config.paths = config
                .paths
                .into_iter()
                .map(|p| if p.is_relative() { base.join(p) } else { p })
                .collect();
        }

        tracing::debug!("Loaded config from {} ({} path(s))", path.display(), config.paths.len());
        Ok(config)
    }

    /// Load configuration following the lookup order described in the module
    /// documentation.
    ///
    /// An explicit path or one named by `PGJB_CONFIG` must exist. The
    /// working-directory file is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the selected file cannot be loaded.
    pub async fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        let from_env = std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from);
        match config_location(explicit, from_env, Path::new(CONFIG_FILE_NAME)) {
            Some(path) => Self::load(&path).await,
            None => {
                tracing::debug!("No config file found, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Roots to search, in order: the configured paths followed by the
    /// built-in default root.
    pub fn search_paths(&self) -> Vec<PathBuf> {
        let mut roots = self.paths.clone();
        roots.push(PathBuf::from(DEFAULT_TEMPLATE_ROOT));
        roots
    }

    /// Check values that parse but cannot work.
    ///
    /// # Errors
    ///
    /// Returns [`PgJbuilderError::ConfigError`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        let invalid = |message: String| -> Result<()> {
            Err(PgJbuilderError::ConfigError {
                message,
            }
            .into())
        };

        if self.extension.contains(['/', '\\']) {
            return invalid(format!(
                "extension '{}' must not contain path separators",
                self.extension
            ));
        }
        if let Some(empty) = self.paths.iter().position(|p| p.as_os_str().is_empty()) {
            return invalid(format!("paths[{empty}] is empty"));
        }
        if self.max_depth > MAX_DEPTH_LIMIT {
            return invalid(format!(
                "max_depth {} exceeds the maximum of {MAX_DEPTH_LIMIT}",
                self.max_depth
            ));
        }
        Ok(())
    }
}

fn config_location(
    explicit: Option<&Path>,
    from_env: Option<PathBuf>,
    local: &Path,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    if let Some(path) = from_env.filter(|p| !p.as_os_str().is_empty()) {
        return Some(path);
    }
    local.is_file().then(|| local.to_path_buf())
}
