//! Core types for template-variable resolution.
//!
//! This module provides the fundamental types used throughout the
//! lma-templating crate:
//! - [`TemplateDefinition`]: a named placeholder with a query template and
//!   optional value-extraction regex
//! - [`RawValue`]: one raw value returned by a backend query
//! - [`DefaultTemplates`]: the fixed placeholders handled outside the tree
//! - [`Substitutions`]: a placeholder-to-value substitution dictionary

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

/// A placeholder-to-resolved-value substitution dictionary.
///
/// Keys carry the leading `$` (e.g. `$environment`).
pub type Substitutions = HashMap<String, String>;

/// Pattern matching placeholder references such as `$environment`.
static PLACEHOLDER_REGEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\$\w+").unwrap_or_else(|_| unreachable!()));

/// Returns the placeholders referenced in `text`, in order of first
/// appearance, without duplicates. Names include the leading `$`.
#[must_use]
pub fn placeholders(text: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for m in PLACEHOLDER_REGEX.find_iter(text) {
        let name = m.as_str();
        if !seen.iter().any(|s: &String| s == name) {
            seen.push(name.to_string());
        }
    }
    seen
}

/// A named dashboard template variable.
///
/// The query template may reference other template variables (`$name`);
/// those references form the dependency edges the tree is built from.
/// Definitions are created once per dashboard and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemplateDefinition {
    /// The placeholder name, including the leading `$`.
    pub name: String,
    /// The backend query template used to enumerate this variable's values.
    pub query: String,
    /// Optional extraction regex applied to each returned raw value.
    pub regex: Option<String>,
}

impl TemplateDefinition {
    /// Creates a new definition. A missing leading `$` is added so that
    /// dashboard-sourced names (`environment`) and query-sourced names
    /// (`$environment`) compare equal.
    #[must_use]
    pub fn new(name: impl Into<String>, query: impl Into<String>) -> Self {
        let name = name.into();
        let name = if name.starts_with('$') {
            name
        } else {
            format!("${name}")
        };
        Self {
            name,
            query: query.into(),
            regex: None,
        }
    }

    /// Sets the value-extraction regex.
    #[must_use]
    pub fn with_regex(mut self, regex: impl Into<String>) -> Self {
        self.regex = Some(regex.into());
        self
    }

    /// Returns the placeholders this definition's query references,
    /// excluding the definition's own name.
    #[must_use]
    pub fn dependencies(&self) -> Vec<String> {
        placeholders(&self.query)
            .into_iter()
            .filter(|p| p != &self.name)
            .collect()
    }
}

/// One raw value returned by a backend query.
///
/// Time-series backends frequently return `[timestamp_or_key, value]`
/// pairs; for those the second element is the value of interest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawValue {
    /// A plain scalar result.
    Scalar(String),
    /// A labeled pair; the second element is the value.
    Pair(String, String),
}

impl RawValue {
    /// Extracts the value string, taking the second element of a pair.
    #[must_use]
    pub fn into_value(self) -> String {
        match self {
            Self::Scalar(v) => v,
            Self::Pair(_, v) => v,
        }
    }
}

impl From<&str> for RawValue {
    fn from(v: &str) -> Self {
        Self::Scalar(v.to_string())
    }
}

/// The fixed template variables handled outside the tree.
///
/// `$interval` and `$timeFilter` are supplied by Grafana itself rather than
/// by a backend query; the facade merges them into every substitution
/// dictionary it returns and never materializes nodes for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DefaultTemplates {
    /// Value substituted for `$interval`.
    pub interval: String,
    /// Value substituted for `$timeFilter`.
    pub time_filter: String,
}

impl Default for DefaultTemplates {
    fn default() -> Self {
        Self {
            interval: "1m".to_string(),
            time_filter: "time > now() - 1h".to_string(),
        }
    }
}

impl DefaultTemplates {
    /// The placeholder names this type covers.
    pub const NAMES: [&'static str; 2] = ["$interval", "$timeFilter"];

    /// Returns true if `name` is one of the default placeholders.
    #[must_use]
    pub fn contains(name: &str) -> bool {
        Self::NAMES.contains(&name)
    }

    /// Inserts the default bindings into `substitutions`.
    pub fn merge_into(&self, substitutions: &mut Substitutions) {
        substitutions.insert("$interval".to_string(), self.interval.clone());
        substitutions.insert("$timeFilter".to_string(), self.time_filter.clone());
    }

    /// Returns a dictionary containing only the default bindings.
    #[must_use]
    pub fn substitutions(&self) -> Substitutions {
        let mut map = Substitutions::new();
        self.merge_into(&mut map);
        map
    }
}
