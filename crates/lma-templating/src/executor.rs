//! The query collaborator seam.
//!
//! The tree never talks to InfluxDB/Prometheus directly; it is handed a
//! [`QueryExecutor`] that compiles a query template against a substitution
//! dictionary and executes the result against the backing store. The
//! default [`QueryExecutor::compile_query`] implements plain textual
//! substitution plus two backend quirks the reference deployment requires;
//! executors may override it wholesale.

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

use crate::types::{RawValue, Substitutions};

/// Errors reported by a query executor.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The backing store has no series matching the query.
    ///
    /// The tree builder recovers from this locally: the branch simply
    /// contributes zero nodes.
    #[error("no data for query: {query}")]
    NoData {
        /// The resolved query that matched nothing.
        query: String,
    },

    /// Any other backend failure. Fatal for the tree build.
    #[error("backend error: {reason}")]
    Backend {
        /// The backend-reported reason.
        reason: String,
    },
}

/// Configuration for the default query compilation rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExecutorConfig {
    /// Environment domain suffix stripped from substituted hostname values
    /// (e.g. `.domain.local`). `None` disables stripping.
    pub domain_suffix: Option<String>,
}

static DEFAULT_CONFIG: Lazy<ExecutorConfig> = Lazy::new(ExecutorConfig::default);

/// Compiles and executes backend queries on behalf of the tree.
pub trait QueryExecutor {
    /// Configuration consulted by the default [`compile_query`].
    ///
    /// [`compile_query`]: QueryExecutor::compile_query
    fn config(&self) -> &ExecutorConfig {
        &DEFAULT_CONFIG
    }

    /// Substitutes every known placeholder in `template`.
    ///
    /// The default implementation performs textual replacement and applies
    /// two fixed cleanup rules observed against the reference backends:
    /// substituted values lose the configured environment domain suffix,
    /// and a compiled query starting with `^/` gets the leading caret
    /// escaped so the backend does not parse it as a path regex.
    fn compile_query(&self, template: &str, substitutions: &Substitutions) -> String {
        compile_with_config(template, substitutions, self.config())
    }

    /// Runs `query` against the backing store, applying `regex` extraction
    /// to each returned value if provided.
    ///
    /// # Errors
    ///
    /// [`QueryError::NoData`] when the store has nothing matching;
    /// [`QueryError::Backend`] for any other failure.
    fn execute_query(
        &self,
        query: &str,
        regex: Option<&str>,
    ) -> std::result::Result<Vec<RawValue>, QueryError>;
}

/// Textual substitution plus the fixed cleanup rules, driven by `config`.
#[must_use]
pub fn compile_with_config(
    template: &str,
    substitutions: &Substitutions,
    config: &ExecutorConfig,
) -> String {
    // Longer names first so $env never clobbers $environment.
    let mut keys: Vec<&String> = substitutions.keys().collect();
    keys.sort_by_key(|k| std::cmp::Reverse(k.len()));

    let mut compiled = template.to_string();
    for key in keys {
        if let Some(value) = substitutions.get(key) {
            let value = match &config.domain_suffix {
                Some(suffix) => value.strip_suffix(suffix.as_str()).unwrap_or(value),
                None => value.as_str(),
            };
            compiled = compiled.replace(key.as_str(), value);
        }
    }

    if compiled.starts_with("^/") {
        compiled = format!("\\{compiled}");
    }

    debug!(template, compiled, "compiled query");
    compiled
}

/// Applies an extraction regex to raw values.
///
/// Each value is matched against `pattern`; the first capture group (or the
/// whole match when the pattern has no groups) becomes the extracted value,
/// and values that do not match are dropped. Pair values are matched on
/// their value element.
///
/// # Errors
///
/// [`QueryError::Backend`] when the pattern does not compile.
pub fn apply_extraction(
    values: Vec<RawValue>,
    pattern: &str,
) -> std::result::Result<Vec<RawValue>, QueryError> {
    // Grafana exports regexes in /.../ form.
    let pattern = pattern
        .strip_prefix('/')
        .and_then(|p| p.strip_suffix('/'))
        .unwrap_or(pattern);
    let re = Regex::new(pattern).map_err(|e| QueryError::Backend {
        reason: format!("invalid extraction regex {pattern:?}: {e}"),
    })?;

    Ok(values
        .into_iter()
        .filter_map(|raw| {
            let value = raw.into_value();
            re.captures(&value).map(|caps| {
                let extracted = caps.get(1).map_or(&caps[0], |m| m.as_str());
                RawValue::Scalar(extracted.to_string())
            })
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subs(entries: &[(&str, &str)]) -> Substitutions {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn compile_replaces_placeholders() {
        let out = compile_with_config(
            "cpu where env = $environment and host = $server",
            &subs(&[("$environment", "prod"), ("$server", "node-1")]),
            &ExecutorConfig::default(),
        );
        assert_eq!(out, "cpu where env = prod and host = node-1");
    }

    #[test]
    fn compile_prefers_longer_placeholder_names() {
        let out = compile_with_config(
            "$environment vs $env",
            &subs(&[("$env", "short"), ("$environment", "long")]),
            &ExecutorConfig::default(),
        );
        assert_eq!(out, "long vs short");
    }

    #[test]
    fn compile_strips_domain_suffix() {
        let config = ExecutorConfig {
            domain_suffix: Some(".test.domain.local".to_string()),
        };
        let out = compile_with_config(
            "load where host = $server",
            &subs(&[("$server", "node-1.test.domain.local")]),
            &config,
        );
        assert_eq!(out, "load where host = node-1");
    }

    #[test]
    fn compile_escapes_leading_path_regex() {
        let out = compile_with_config(
            "^/dev/$disk",
            &subs(&[("$disk", "sda")]),
            &ExecutorConfig::default(),
        );
        assert_eq!(out, "\\^/dev/sda");
    }

    #[test]
    fn compile_leaves_unknown_placeholders_alone() {
        let out = compile_with_config("cpu{host=$server}", &subs(&[]), &ExecutorConfig::default());
        assert_eq!(out, "cpu{host=$server}");
    }

    #[test]
    fn extraction_uses_first_capture_group() {
        let values = vec![
            RawValue::Scalar("cpu.node-1.idle".to_string()),
            RawValue::Scalar("cpu.node-2.idle".to_string()),
        ];
        let out = apply_extraction(values, r"cpu\.(\w+[\w-]*)\.idle").unwrap();
        assert_eq!(out, vec!["node-1".into(), "node-2".into()]);
    }

    #[test]
    fn extraction_without_groups_keeps_the_whole_match() {
        let values = vec![RawValue::Scalar("host=node-7,rack=3".to_string())];
        let out = apply_extraction(values, r"node-\d+").unwrap();
        assert_eq!(out, vec!["node-7".into()]);
    }

    #[test]
    fn extraction_drops_non_matching_values() {
        let values = vec![
            RawValue::Scalar("keep-me".to_string()),
            RawValue::Scalar("skip".to_string()),
        ];
        let out = apply_extraction(values, r"keep-(\w+)").unwrap();
        assert_eq!(out, vec!["me".into()]);
    }

    #[test]
    fn extraction_matches_pair_on_value_element() {
        let values = vec![RawValue::Pair("0".to_string(), "node-3".to_string())];
        let out = apply_extraction(values, r"(node-\d+)").unwrap();
        assert_eq!(out, vec!["node-3".into()]);
    }

    #[test]
    fn extraction_accepts_slash_delimited_patterns() {
        let values = vec![RawValue::Scalar("web1.test.local".to_string())];
        let out = apply_extraction(values, "/^([^.]+)/").unwrap();
        assert_eq!(out, vec!["web1".into()]);
    }

    #[test]
    fn extraction_rejects_bad_pattern() {
        let err = apply_extraction(vec!["x".into()], "(unclosed").unwrap_err();
        assert!(matches!(err, QueryError::Backend { .. }));
    }
}
