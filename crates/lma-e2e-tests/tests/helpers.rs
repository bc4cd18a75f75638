//! Test helpers for E2E tests.

// Each test binary uses its own subset of these helpers.
#![allow(dead_code)]

use std::cell::RefCell;

use lma_templating::{
    apply_extraction, ExecutorConfig, QueryError, QueryExecutor, RawValue,
};

/// What the scripted backend does for a matching query.
#[derive(Debug, Clone)]
pub enum Response {
    /// Return these values.
    Values(Vec<RawValue>),
    /// Signal "no matching series".
    NoData,
    /// Fail with a backend error.
    Fail(String),
}

/// A query executor scripted by resolved-query substrings.
///
/// The first script entry whose fragment is contained in the resolved query
/// wins; an unmatched query signals no data. Every executed query is
/// recorded so tests can assert on compilation output.
pub struct ScriptedExecutor {
    config: ExecutorConfig,
    script: Vec<(String, Response)>,
    executed: RefCell<Vec<String>>,
}

impl ScriptedExecutor {
    /// Creates an executor with default compile rules.
    pub fn new() -> Self {
        Self {
            config: ExecutorConfig::default(),
            script: Vec::new(),
            executed: RefCell::new(Vec::new()),
        }
    }

    /// Sets the domain suffix stripped by the default compile rules.
    pub fn with_domain_suffix(mut self, suffix: &str) -> Self {
        self.config.domain_suffix = Some(suffix.to_string());
        self
    }

    /// Scripts scalar values for queries containing `fragment`.
    pub fn returning(mut self, fragment: &str, values: &[&str]) -> Self {
        self.script.push((
            fragment.to_string(),
            Response::Values(values.iter().map(|v| RawValue::Scalar((*v).to_string())).collect()),
        ));
        self
    }

    /// Scripts `[label, value]` pairs for queries containing `fragment`.
    pub fn returning_pairs(mut self, fragment: &str, pairs: &[(&str, &str)]) -> Self {
        self.script.push((
            fragment.to_string(),
            Response::Values(
                pairs
                    .iter()
                    .map(|(label, value)| {
                        RawValue::Pair((*label).to_string(), (*value).to_string())
                    })
                    .collect(),
            ),
        ));
        self
    }

    /// Scripts a no-data result for queries containing `fragment`.
    pub fn no_data_for(mut self, fragment: &str) -> Self {
        self.script.push((fragment.to_string(), Response::NoData));
        self
    }

    /// Scripts a backend failure for queries containing `fragment`.
    pub fn failing_for(mut self, fragment: &str, reason: &str) -> Self {
        self.script
            .push((fragment.to_string(), Response::Fail(reason.to_string())));
        self
    }

    /// Every query executed so far, in execution order.
    pub fn executed(&self) -> Vec<String> {
        self.executed.borrow().clone()
    }
}

impl QueryExecutor for ScriptedExecutor {
    fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    fn execute_query(
        &self,
        query: &str,
        regex: Option<&str>,
    ) -> Result<Vec<RawValue>, QueryError> {
        self.executed.borrow_mut().push(query.to_string());
        for (fragment, response) in &self.script {
            if query.contains(fragment.as_str()) {
                return match response {
                    Response::Values(values) => match regex {
                        Some(pattern) => apply_extraction(values.clone(), pattern),
                        None => Ok(values.clone()),
                    },
                    Response::NoData => Err(QueryError::NoData {
                        query: query.to_string(),
                    }),
                    Response::Fail(reason) => Err(QueryError::Backend {
                        reason: reason.clone(),
                    }),
                };
            }
        }
        Err(QueryError::NoData {
            query: query.to_string(),
        })
    }
}

/// Initializes tracing for a test run; safe to call repeatedly.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("debug")),
        )
        .with_test_writer()
        .try_init();
}
