//! Temporary template trees for tests.

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use crate::templating::{Engine, PathResolver};

/// A temporary directory used as a template root.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct TemplateDir {
    dir: TempDir,
}

impl TemplateDir {
    /// Create an empty template root.
    pub fn new() -> Result<Self> {
        super::init_test_logging(None);
        Ok(Self {
            dir: TempDir::new().context("Failed to create temporary template root")?,
        })
    }

    /// Create a root holding the given `(name, contents)` templates.
    pub fn with_templates(templates: &[(&str, &str)]) -> Result<Self> {
        let dir = Self::new()?;
        for (name, contents) in templates {
            dir.write(name, contents)?;
        }
        Ok(dir)
    }

    /// Root directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Write template `name` (without extension), creating sub-directories.
    pub fn write(&self, name: &str, contents: &str) -> Result<PathBuf> {
        let path = self.dir.path().join(format!("{name}.sql"));
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::write(&path, contents).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    /// Remove template `name`.
    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.dir.path().join(format!("{name}.sql"));
        fs::remove_file(&path).with_context(|| format!("Failed to remove {}", path.display()))
    }

    /// An engine searching only this root.
    pub fn engine(&self) -> Engine {
        Engine::with_resolver(PathResolver::new(vec![self.path().to_path_buf()], "sql"))
    }
}
