//! Template lookup across ordered search roots.
//!
//! A template name such as `users/list` maps to `users/list.sql` relative to a
//! search root. Roots are tried in order and the first existing regular file
//! wins, so a root added with [`PathResolver::prepend`] shadows every root after
//! it. Failed lookups are not remembered: a template created after a miss is
//! found on the next call.
//!
//! # Name Rules
//!
//! - Segments are separated by `/` and map onto sub-directories
//! - Empty names, empty segments, `.` and `..` segments are rejected
//! - Names never start with `/`; they are always relative to a root

use anyhow::Result;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};
use walkdir::WalkDir;

use crate::constants::{DEFAULT_TEMPLATE_EXTENSION, DEFAULT_TEMPLATE_ROOT};
use crate::core::PgJbuilderError;

/// Ordered list of directories searched for template files.
///
/// The list can be changed at any time through a shared reference; renders
/// already in progress see either the old or the new list for each lookup.
#[derive(Debug)]
pub struct PathResolver {
    roots: RwLock<Vec<PathBuf>>,
    extension: String,
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(vec![PathBuf::from(DEFAULT_TEMPLATE_ROOT)], DEFAULT_TEMPLATE_EXTENSION)
    }
}

impl PathResolver {
    /// Create a resolver over `roots` (searched in order) for files ending in
    /// `.{extension}`. An empty extension matches the bare name.
    pub fn new(roots: Vec<PathBuf>, extension: impl Into<String>) -> Self {
        let extension = extension.into();
        Self {
            roots: RwLock::new(roots),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    /// Add a root ahead of every existing root.
    pub fn prepend(&self, root: impl Into<PathBuf>) {
        let root = root.into();
        tracing::debug!("Prepending template root {}", root.display());
        self.roots.write().unwrap_or_else(PoisonError::into_inner).insert(0, root);
    }

    /// Add a root after every existing root.
    pub fn append(&self, root: impl Into<PathBuf>) {
        let root = root.into();
        tracing::debug!("Appending template root {}", root.display());
        self.roots.write().unwrap_or_else(PoisonError::into_inner).push(root);
    }

    /// Snapshot of the roots in search order.
    pub fn roots(&self) -> Vec<PathBuf> {
        self.roots.read().unwrap_or_else(PoisonError::into_inner).clone()
    }

    /// Extension appended to template names, without the leading dot.
    pub fn extension(&self) -> &str {
        &self.extension
    }

    /// Find the file backing template `name`.
    ///
    /// # Errors
    ///
    /// - [`PgJbuilderError::InvalidTemplateName`] if `name` is not a relative name
    /// - [`PgJbuilderError::TemplateNotFound`] if no root contains the file
    ///
    /// # Examples
    ///
    /// ```rust,no_run
    /// use pgjbuilder::templating::PathResolver;
    ///
    /// let resolver = PathResolver::new(vec!["app/queries".into(), "queries".into()], "sql");
    /// let path = resolver.resolve("users/list")?;
    /// assert!(path.ends_with("users/list.sql"));
    /// # Ok::<(), anyhow::Error>(())
    /// ```
    pub fn resolve(&self, name: &str) -> Result<PathBuf> {
        let relative = self.relative_path(name)?;
        let roots = self.roots();

        for root in &roots {
            let candidate = root.join(&relative);
            if candidate.is_file() {
                tracing::debug!("Resolved template '{}' to {}", name, candidate.display());
                return Ok(candidate);
            }
        }

        tracing::debug!("Template '{}' not found in {} root(s)", name, roots.len());
        Err(PgJbuilderError::TemplateNotFound {
            name: name.to_string(),
        }
        .into())
    }

    /// Every template name available across all roots, sorted, with shadowed
    /// duplicates listed once. Roots that do not exist are skipped.
    pub fn available_templates(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        for root in self.roots() {
            if !root.is_dir() {
                continue;
            }
            for entry in WalkDir::new(&root).follow_links(true).into_iter().filter_map(|e| e.ok())
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                if let Some(name) = self.template_name(&root, entry.path()) {
                    names.insert(name);
                }
            }
        }
        names.into_iter().collect()
    }

    /// Map a file under `root` back to the template name that resolves to it.
    fn template_name(&self, root: &Path, file: &Path) -> Option<String> {
        let relative = file.strip_prefix(root).ok()?;
        let segments: Vec<&str> =
            relative.components().map(|c| c.as_os_str().to_str()).collect::<Option<_>>()?;
        let joined = segments.join("/");
        if self.extension.is_empty() {
            return Some(joined);
        }
        joined.strip_suffix(&format!(".{}", self.extension)).map(str::to_string)
    }

    fn relative_path(&self, name: &str) -> Result<PathBuf, PgJbuilderError> {
        let invalid = |reason: &str| PgJbuilderError::InvalidTemplateName {
            name: name.to_string(),
            reason: reason.to_string(),
        };

        if name.is_empty() {
            return Err(invalid("name is empty"));
        }
        if name.starts_with('/') {
            return Err(invalid("names are relative to the search paths"));
        }

        let segments: Vec<&str> = name.split('/').collect();
        let mut path = PathBuf::new();
        for (index, segment) in segments.iter().enumerate() {
            match *segment {
                "" => return Err(invalid("name contains an empty segment")),
                "." | ".." => return Err(invalid("'.' and '..' segments are not allowed")),
                // `\` is only a separator on Windows; elsewhere it is a filename character
                #[cfg(windows)]
                _ if segment.contains('\\') => return Err(invalid("use '/' to separate segments")),
                _ if index + 1 == segments.len() && !self.extension.is_empty() => {
                    path.push(format!("{}.{}", segment, self.extension));
                }
                _ => path.push(segment),
            }
        }
        Ok(path)
    }
}
