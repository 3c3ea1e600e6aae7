//! Variable scopes used during expansion.
//!
//! A render call starts with a root [`Scope`] that borrows the caller's
//! variables. Every `include` layers a child scope holding only the bindings
//! passed to it; the child keeps a reference to its parent instead of copying
//! it, so creating one costs the size of the overlay. Lookups walk from the
//! innermost scope outwards and the first binding found wins.
//!
//! Scopes live on the expansion call stack. They are dropped when the frame
//! that created them returns and are never shared between render calls.

use serde_json::Value;
use std::borrow::Cow;

use super::Variables;

/// An immutable view of the variables visible at one point of an expansion.
#[derive(Debug)]
pub struct Scope<'p> {
    bindings: Cow<'p, Variables>,
    parent: Option<&'p Scope<'p>>,
}

impl<'p> Scope<'p> {
    /// Create a root scope over the caller's variables.
    pub fn root(variables: &'p Variables) -> Self {
        Self {
            bindings: Cow::Borrowed(variables),
            parent: None,
        }
    }

    /// Create a child scope in which `overlay` shadows this scope's bindings.
    ///
    /// `self` is left untouched.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use pgjbuilder::templating::{Scope, Variables};
    /// use serde_json::json;
    ///
    /// let mut variables = Variables::new();
    /// variables.insert("a".into(), json!(1));
    /// let root = Scope::root(&variables);
    ///
    /// let mut overlay = Variables::new();
    /// overlay.insert("a".into(), json!(2));
    /// let child = root.with_overlay(overlay);
    ///
    /// assert_eq!(child.lookup("a"), Some(&json!(2)));
    /// assert_eq!(root.lookup("a"), Some(&json!(1)));
    /// ```
    pub fn with_overlay(&self, overlay: Variables) -> Scope<'_> {
        Scope {
            bindings: Cow::Owned(overlay),
            parent: Some(self),
        }
    }

    /// Find the nearest binding for `name`.
    pub fn lookup(&self, name: &str) -> Option<&Value> {
        let mut scope = Some(self);
        while let Some(current) = scope {
            if let Some(value) = current.bindings.get(name) {
                return Some(value);
            }
            scope = current.parent;
        }
        None
    }

    /// Resolve a dotted path: the first segment through the scope chain, the
    /// rest through object keys (or array indices).
    pub fn lookup_path(&self, path: &[String]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut value = self.lookup(first)?;
        for segment in rest {
            value = match value {
                Value::Object(map) => map.get(segment)?,
                Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
                _ => return None,
            };
        }
        Some(value)
    }
}
