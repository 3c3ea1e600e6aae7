//! Expansion of compiled templates into query text.
//!
//! An [`Expander`] borrows the engine's resolver, cache and connection hook for
//! the duration of one render call. All per-call state (the scope chain, the
//! include depth and the output buffer) is passed down explicitly, so any
//! number of renders can run at once and a template can appear several times
//! on the same include chain.

use anyhow::Result;
use serde_json::Value;

use super::Variables;
use super::cache::TemplateCache;
use super::connection::ConnectionHook;
use super::resolver::PathResolver;
use super::scope::Scope;
use super::syntax::{Binding, Expr, Node};
use crate::core::PgJbuilderError;

pub(crate) struct Expander<'e> {
    pub(crate) resolver: &'e PathResolver,
    pub(crate) cache: &'e TemplateCache,
    pub(crate) connection: &'e ConnectionHook,
    pub(crate) max_depth: usize,
}

impl Expander<'_> {
    /// Render template `name` with `variables` as the root scope.
    pub(crate) fn render(&self, name: &str, variables: &Variables) -> Result<String> {
        let scope = Scope::root(variables);
        let mut out = String::new();
        self.expand_template(name, &scope, 0, &mut out)?;
        Ok(out)
    }

    fn expand_template(
        &self,
        name: &str,
        scope: &Scope<'_>,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        if depth > self.max_depth {
            return Err(PgJbuilderError::RecursionLimitExceeded {
                name: name.to_string(),
                limit: self.max_depth,
            }
            .into());
        }

        let template = self.cache.get_or_compile(name, self.resolver)?;
        tracing::trace!("Expanding '{}' at include depth {}", name, depth);
        self.expand_nodes(template.nodes(), scope, depth, out)
    }

    fn expand_nodes(
        &self,
        nodes: &[Node],
        scope: &Scope<'_>,
        depth: usize,
        out: &mut String,
    ) -> Result<()> {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Output(expr) => {
                    if let Some(value) = evaluate(expr, scope) {
                        push_value(value, out);
                    }
                }
                Node::Quote(expr) => {
                    let value = evaluate(expr, scope).unwrap_or(&Value::Null);
                    let connection = self.connection.current()?;
                    out.push_str(&connection.quote(value)?);
                }
                Node::Include {
                    name,
                    bindings,
                } => {
                    let target = template_name(name, scope)?;
                    let child = scope.with_overlay(overlay(bindings, scope));
                    self.expand_template(&target, &child, depth + 1, out)?;
                }
                Node::Wrap {
                    kind,
                    name,
                    bindings,
                } => {
                    let target = template_name(name, scope)?;
                    let child = scope.with_overlay(overlay(bindings, scope));
                    out.push_str(&kind.fragment_prefix());
                    out.push('\n');
                    self.expand_template(&target, &child, depth + 1, out)?;
                    out.push('\n');
                    out.push_str(&kind.fragment_suffix());
                }
                Node::Block {
                    kind,
                    body,
                } => {
                    out.push_str(&kind.fragment_prefix());
                    self.expand_nodes(body, scope, depth, out)?;
                    out.push_str(&kind.fragment_suffix());
                }
            }
        }
        Ok(())
    }
}

fn evaluate<'a>(expr: &'a Expr, scope: &'a Scope<'_>) -> Option<&'a Value> {
    match expr {
        Expr::Literal(value) => Some(value),
        Expr::Path(path) => scope.lookup_path(path),
    }
}

/// Append the raw text of `value`. Null renders as nothing; strings render
/// without quotes; arrays and objects render as compact JSON.
fn push_value(value: &Value, out: &mut String) {
    match value {
        Value::Null => {}
        Value::String(text) => out.push_str(text),
        other => out.push_str(&other.to_string()),
    }
}

fn overlay(bindings: &[Binding], scope: &Scope<'_>) -> Variables {
    bindings
        .iter()
        .map(|binding| {
            let value = evaluate(&binding.value, scope).cloned().unwrap_or(Value::Null);
            (binding.key.clone(), value)
        })
        .collect()
}

fn template_name(expr: &Expr, scope: &Scope<'_>) -> Result<String> {
    match evaluate(expr, scope) {
        Some(Value::String(name)) => Ok(name.clone()),
        _ => {
            let written = match expr {
                Expr::Literal(value) => value.to_string(),
                Expr::Path(path) => path.join("."),
            };
            Err(PgJbuilderError::InvalidTemplateName {
                name: written,
                reason: "template names must be strings".to_string(),
            }
            .into())
        }
    }
}
