//! Global constants used throughout pgjbuilder.
//!
//! Defaults for template resolution and expansion live here so the engine,
//! the configuration layer and the CLI agree on them.

/// Built-in search root, relative to the working directory.
///
/// Hosts usually prepend an application-specific root so it shadows this one.
pub const DEFAULT_TEMPLATE_ROOT: &str = "queries";

/// File extension appended to template names during resolution.
pub const DEFAULT_TEMPLATE_EXTENSION: &str = "sql";

/// Maximum include nesting before expansion fails.
///
/// Templates have no conditionals, so a template that includes itself never
/// terminates on its own. Fifty levels is far beyond any real query layout.
pub const DEFAULT_MAX_DEPTH: usize = 50;

/// Upper bound accepted for the include depth.
///
/// Each include level is a native stack frame, so larger limits would let a
/// runaway template overflow the thread stack instead of failing cleanly.
pub const MAX_DEPTH_LIMIT: usize = 256;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "pgjb.toml";

/// Environment variable that overrides the configuration file location.
pub const CONFIG_ENV_VAR: &str = "PGJB_CONFIG";
