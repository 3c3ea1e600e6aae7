//! Compiled template cache.
//!
//! Compiling a template means resolving its path, reading the file and
//! parsing it. The cache keeps the compiled form per template name so repeated
//! renders skip all three steps.
//!
//! # Cache Invalidation
//!
//! Entries live until [`TemplateCache::clear`] is called; there is no
//! per-entry invalidation and no expiry. Hosts that edit templates while
//! running either clear the cache after a change or disable caching, in which
//! case every lookup reads and compiles the file again.
//!
//! # Concurrency
//!
//! The cache is backed by a [`DashMap`] and can be shared between threads.
//! Two threads missing on the same name at once both compile it; the last
//! insert wins and both callers get a correct template.

use anyhow::{Context, Result};
use dashmap::DashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use super::resolver::PathResolver;
use super::syntax::CompiledTemplate;

/// Counters describing cache behaviour since the last clear.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups served from the cache
    pub hits: usize,
    /// Lookups that had to compile the template
    pub misses: usize,
    /// Template files read from disk
    pub reads: usize,
}

impl CacheStats {
    /// Hit rate as a percentage of all lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            (self.hits as f64 / total as f64) * 100.0
        }
    }
}

/// Cache of compiled templates keyed by template name.
#[derive(Debug)]
pub struct TemplateCache {
    entries: DashMap<String, Arc<CompiledTemplate>>,
    enabled: AtomicBool,
    hits: AtomicUsize,
    misses: AtomicUsize,
    reads: AtomicUsize,
}

impl Default for TemplateCache {
    fn default() -> Self {
        Self::new(true)
    }
}

impl TemplateCache {
    /// Create an empty cache, with caching on or off.
    pub fn new(enabled: bool) -> Self {
        Self {
            entries: DashMap::new(),
            enabled: AtomicBool::new(enabled),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            reads: AtomicUsize::new(0),
        }
    }

    /// Turn caching on or off.
    ///
    /// While off, every lookup recompiles from disk and nothing is stored.
    /// Entries stored earlier are kept and used again once caching is back on.
    pub fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::SeqCst);
    }

    /// Whether compiled templates are currently stored and reused.
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Return the compiled template for `name`, compiling it on a miss.
    ///
    /// # Errors
    ///
    /// Propagates resolution failures from `resolver`, file read errors and
    /// syntax errors. Nothing is cached when compilation fails.
    pub fn get_or_compile(&self, name: &str, resolver: &PathResolver) -> Result<Arc<CompiledTemplate>> {
        let enabled = self.is_enabled();

        if enabled {
            if let Some(entry) = self.entries.get(name) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                tracing::debug!("Template cache hit for '{}'", name);
                return Ok(Arc::clone(entry.value()));
            }
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        tracing::debug!("Template cache miss for '{}' (caching enabled: {})", name, enabled);

        let path = resolver.resolve(name)?;
        let source = std::fs::read_to_string(&path).with_context(|| {
            format!("Failed to read template '{}' from {}", name, path.display())
        })?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let compiled = Arc::new(CompiledTemplate::compile(name, &source)?);
        if enabled {
            self.entries.insert(name.to_string(), Arc::clone(&compiled));
        }
        Ok(compiled)
    }

    /// Drop every entry and reset the statistics.
    ///
    /// Expansions already holding a template keep using it.
    pub fn clear(&self) {
        self.entries.clear();
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.reads.store(0, Ordering::Relaxed);
        tracing::debug!("Template cache cleared");
    }

    /// Number of cached templates.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no templates.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Statistics since creation or the last [`clear`](Self::clear).
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
        }
    }
}
