//! Error types for the lma-templating crate.

use thiserror::Error;

/// Errors that can occur while building or querying a template tree.
#[derive(Debug, Error)]
pub enum TemplateError {
    /// The template dependency mapping contains a cycle.
    #[error("cyclic dependency among templates: {remaining:?}")]
    CyclicDependency {
        /// Template names that could not be ordered.
        remaining: Vec<String>,
    },

    /// A query referenced a placeholder that is not a known template.
    #[error("unknown placeholder: {name}")]
    UnknownPlaceholder {
        /// The placeholder name that was never defined.
        name: String,
    },

    /// A backend query failed for a reason other than "no data".
    #[error("query failed for template {template}: {reason}")]
    QueryFailed {
        /// The template whose query failed.
        template: String,
        /// The backend-reported reason.
        reason: String,
    },

    /// A Grafana dashboard document could not be parsed.
    #[error("invalid dashboard JSON: {0}")]
    InvalidDashboard(String),
}

impl From<serde_json::Error> for TemplateError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidDashboard(err.to_string())
    }
}

/// Result type for templating operations.
pub type Result<T> = std::result::Result<T, TemplateError>;
