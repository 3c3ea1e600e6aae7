//! Command-line interface for pgjbuilder.
//!
//! The `pgjb` binary is a thin host around [`Engine`]: it loads `pgjb.toml`,
//! applies command-line overrides, configures a PostgreSQL-style quoting
//! connection and runs one subcommand.
//!
//! # Available Commands
//!
//! - `render` - Render a template to SQL, optionally wrapped as a JSON object or array
//! - `resolve` - Print the file a template name resolves to
//! - `check` - Compile templates and report syntax errors
//! - `list` - List every template available on the search paths
//!
//! # Global Options
//!
//! - `--verbose` / `-v` - Enable debug logging
//! - `--quiet` / `-q` - Disable logging entirely
//! - `--config` / `-c` - Use a specific `pgjb.toml`
//! - `--path` / `-I` - Add a template root ahead of the configured ones (repeatable)
//! - `--no-cache` - Disable the compiled template cache
//!
//! # Examples
//!
//! ```bash
//! pgjb render users/posts --var user_id=42 --as array
//! pgjb -I app/queries resolve users/posts
//! pgjb check users/posts users/show
//! pgjb list
//! ```
//!
//! # Logging
//!
//! Logs go to stderr so rendered SQL on stdout can be piped. Without
//! `--verbose` or `--quiet` the filter comes from `RUST_LOG`, defaulting to
//! warnings only.

mod check;
mod list;
mod quote;
mod render;
mod resolve;

pub use quote::PostgresQuoter;
pub use render::parse_variable;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::config::EngineConfig;
use crate::core::{PgJbuilderError, not_found_with_candidates};
use crate::templating::Engine;

/// Main CLI application structure for pgjb.
#[derive(Parser)]
#[command(
    name = "pgjb",
    about = "Render SQL templates that build JSON in PostgreSQL",
    version,
    long_about = "pgjb expands SQL templates with includes, quoting and JSON object/array \
                  aggregation wrappers, printing the resulting query to stdout."
)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true, conflicts_with = "quiet")]
    verbose: bool,

    /// Disable all logging.
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Path to the configuration file.
    ///
    /// Defaults to `$PGJB_CONFIG`, then `pgjb.toml` in the working directory.
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Template root searched before the configured ones.
    ///
    /// May be given several times; earlier roots shadow later ones.
    #[arg(short = 'I', long = "path", global = true, value_name = "DIR")]
    paths: Vec<PathBuf>,

    /// Compile every template on every use instead of caching it.
    #[arg(long, global = true)]
    no_cache: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template to SQL.
    Render(render::RenderCommand),

    /// Print the file a template name resolves to.
    Resolve(resolve::ResolveCommand),

    /// Compile templates and report syntax errors.
    Check(check::CheckCommand),

    /// List templates available on the search paths.
    List(list::ListCommand),
}

impl Cli {
    /// Execute the CLI with the parsed arguments.
    ///
    /// # Errors
    ///
    /// Returns the command's error. A missing template is returned as an
    /// [`ErrorContext`](crate::core::ErrorContext) that already lists similar
    /// template names.
    pub async fn execute(self) -> Result<()> {
        self.init_logging();

        let config = EngineConfig::load_or_default(self.config.as_deref()).await?;
        let engine = Arc::new(self.build_engine(&config));

        let result = match self.command {
            Commands::Render(cmd) => cmd.execute(Arc::clone(&engine)).await,
            Commands::Resolve(cmd) => cmd.execute(&engine),
            Commands::Check(cmd) => cmd.execute(&engine),
            Commands::List(cmd) => cmd.execute(&engine),
        };
        result.map_err(|e| suggest_similar_templates(e, &engine))
    }

    /// Filter for the tracing subscriber, or `None` when logging is off.
    fn log_filter(&self) -> Option<EnvFilter> {
        if self.verbose {
            Some(EnvFilter::new("debug"))
        } else if self.quiet {
            None
        } else {
            Some(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        }
    }

    fn init_logging(&self) {
        if let Some(filter) = self.log_filter() {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init();
        }
    }

    fn build_engine(&self, config: &EngineConfig) -> Engine {
        let engine = Engine::from_config(config);
        for root in self.paths.iter().rev() {
            engine.paths().prepend(root.clone());
        }
        if self.no_cache {
            engine.set_caching_enabled(false);
        }
        engine.set_connection(Arc::new(PostgresQuoter));
        engine
    }
}

fn suggest_similar_templates(error: anyhow::Error, engine: &Engine) -> anyhow::Error {
    let name = match error.downcast_ref::<PgJbuilderError>() {
        Some(PgJbuilderError::TemplateNotFound {
            name,
        }) => name.clone(),
        _ => return error,
    };
    let candidates = engine.paths().available_templates();
    anyhow::Error::new(not_found_with_candidates(&name, &candidates))
}
