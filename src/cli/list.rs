//! List the templates available on the search paths.

use anyhow::Result;
use clap::Args;

use crate::templating::Engine;

/// Command to list every template name the engine can resolve.
///
/// Names are printed one per line, sorted. A name provided by several roots
/// is printed once.
#[derive(Args)]
pub struct ListCommand {}

impl ListCommand {
    pub(super) fn execute(self, engine: &Engine) -> Result<()> {
        let names = engine.paths().available_templates();
        if names.is_empty() {
            let roots: Vec<String> =
                engine.paths().roots().iter().map(|r| r.display().to_string()).collect();
            tracing::warn!("No templates found in: {}", roots.join(", "));
        }
        for name in names {
            println!("{name}");
        }
        Ok(())
    }
}
