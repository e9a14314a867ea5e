//! Template variable resolution for query text.
//!
//! Query text may reference dashboard variables as `$name`, `${name}` or
//! `[[name]]`. Resolution substitutes every bound placeholder with its scoped
//! value and leaves unbound placeholders untouched, so unknown names are a
//! pass-through rather than an error. The resolver behind the substitution is
//! an injected trait so callers can swap in the host's own interpolation
//! rules (and tests can stub it).

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// Current value of one template variable. Multi-valued variables render
/// comma-joined.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VariableValue {
    Single(String),
    Multi(Vec<String>),
}

impl VariableValue {
    pub fn render(&self) -> String {
        match self {
            VariableValue::Single(s) => s.clone(),
            VariableValue::Multi(vs) => vs.join(","),
        }
    }
}

impl From<&str> for VariableValue {
    fn from(s: &str) -> Self {
        VariableValue::Single(s.to_string())
    }
}

/// The set of template variables bound at the point of a query or discovery
/// call. Read-only to this layer; supplied fresh per invocation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScopedVars(pub HashMap<String, VariableValue>);

impl ScopedVars {
    pub fn new() -> Self {
        ScopedVars(HashMap::new())
    }

    pub fn get(&self, name: &str) -> Option<&VariableValue> {
        self.0.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<S: Into<String>, V: Into<VariableValue>> FromIterator<(S, V)> for ScopedVars {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        ScopedVars(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// Interpolation service seam. `replace` substitutes every recognized
/// placeholder bound in `scope` and must not fail on unknown names.
pub trait TemplateResolver {
    fn replace(&self, text: &str, scope: &ScopedVars) -> String;
}

// $name | ${name} | [[name]]
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\$\{(\w+)\}|\$(\w+)|\[\[(\w+)\]\]").unwrap()
});

/// Default placeholder syntax: `$name`, `${name}` and the legacy `[[name]]`.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardResolver;

impl TemplateResolver for StandardResolver {
    fn replace(&self, text: &str, scope: &ScopedVars) -> String {
        PLACEHOLDER
            .replace_all(text, |caps: &Captures| {
                let name = caps
                    .get(1)
                    .or_else(|| caps.get(2))
                    .or_else(|| caps.get(3))
                    .map(|m| m.as_str())
                    .unwrap_or("");
                match scope.get(name) {
                    Some(v) => v.render(),
                    // unbound: keep the literal placeholder text
                    None => caps.get(0).unwrap().as_str().to_string(),
                }
            })
            .into_owned()
    }
}

/// Resolve raw query text against a scope. Absent or empty text resolves to
/// the empty string without consulting the scope, so downstream consumers
/// always see a plain string.
pub fn resolve_query_text<R: TemplateResolver>(
    resolver: &R,
    raw: Option<&str>,
    scope: &ScopedVars,
) -> String {
    match raw {
        Some(text) if !text.is_empty() => resolver.replace(text, scope),
        _ => String::new(),
    }
}
