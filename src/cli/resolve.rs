//! Print the file backing a template name.

use anyhow::Result;
use clap::Args;

use crate::templating::Engine;

/// Command to show which file a template name resolves to.
///
/// Useful when several roots provide the same template and only the first
/// one is used.
#[derive(Args)]
pub struct ResolveCommand {
    /// Template name, e.g. `users/posts`
    name: String,
}

impl ResolveCommand {
    pub(super) fn execute(self, engine: &Engine) -> Result<()> {
        let path = engine.resolve(&self.name)?;
        println!("{}", path.display());
        Ok(())
    }
}
