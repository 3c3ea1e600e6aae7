//! Compile templates without rendering them.

use anyhow::{Result, bail};
use clap::Args;
use colored::Colorize;

use crate::templating::Engine;

/// Command to compile one or more templates and report failures.
///
/// Only the named templates are compiled; templates they include are not
/// followed, since include targets can depend on variables.
///
/// # Examples
///
/// ```bash
/// pgjb check users/posts users/show
/// pgjb check --all
/// ```
#[derive(Args)]
pub struct CheckCommand {
    /// Template names to check
    #[arg(required_unless_present = "all")]
    names: Vec<String>,

    /// Check every template on the search paths
    #[arg(long, conflicts_with = "names")]
    all: bool,
}

impl CheckCommand {
    pub(super) fn execute(self, engine: &Engine) -> Result<()> {
        let names = if self.all {
            engine.paths().available_templates()
        } else {
            self.names
        };

        // A single template's error is reported as is.
        if let [name] = names.as_slice() {
            engine.compile(name)?;
            println!("{} {}", "ok".green(), name);
            return Ok(());
        }

        let mut failed = 0;
        for name in &names {
            match engine.compile(name) {
                Ok(_) => println!("{} {}", "ok".green(), name),
                Err(e) => {
                    failed += 1;
                    println!("{} {}: {}", "failed".red(), name, e);
                }
            }
        }

        if failed > 0 {
            bail!("{} of {} template(s) failed to compile", failed, names.len());
        }
        Ok(())
    }
}
