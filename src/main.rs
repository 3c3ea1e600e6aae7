//! pgjb CLI entry point
//!
//! Parses the command line, runs the selected command and prints failures
//! with suggestions before exiting with status 1.
//!
//! - `render` - Render a template to SQL
//! - `resolve` - Show the file a template name resolves to
//! - `check` - Compile templates and report syntax errors
//! - `list` - List available templates

use anyhow::Result;
use clap::Parser;
use pgjbuilder::cli;
use pgjbuilder::core::{ErrorContext, user_friendly_error};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Set up colored output for Windows
    #[cfg(windows)]
    colored::control::set_virtual_terminal(true).ok();

    match cli.execute().await {
        Ok(()) => Ok(()),
        Err(e) => {
            // Errors that already carry suggestions are shown as they are
            let error_ctx = match e.downcast::<ErrorContext>() {
                Ok(context) => context,
                Err(e) => user_friendly_error(e),
            };
            error_ctx.display();
            std::process::exit(1);
        }
    }
}
