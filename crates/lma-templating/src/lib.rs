//! Grafana dashboard template-variable dependency resolution.
//!
//! `lma-templating` is the core of the LMA integration-test harness: it
//! takes the template variables of a Grafana dashboard (whose queries may
//! reference other template variables, forming a DAG), materializes every
//! concrete value combination level by level against a backend query
//! collaborator, and then answers "which substitution dictionaries apply"
//! for any panel query.
//!
//! # Features
//!
//! - **Dependency leveling**: template queries are parsed for `$name`
//!   references and ordered topologically, with cycles rejected
//! - **Tree materialization**: each template's query runs once per
//!   ancestor branch, producing one node per returned value
//! - **Query resolution**: panel queries are matched against the tree,
//!   with cartesian expansion across independent sibling templates
//! - **Dashboard ingestion**: template definitions and panel targets are
//!   read straight from exported dashboard JSON
//!
//! # Example
//!
//! ```rust
//! use lma_templating::{
//!     QueryError, QueryExecutor, RawValue, TemplateDefinition, TemplatesTree,
//! };
//!
//! struct StaticBackend;
//!
//! impl QueryExecutor for StaticBackend {
//!     fn execute_query(
//!         &self,
//!         query: &str,
//!         _regex: Option<&str>,
//!     ) -> Result<Vec<RawValue>, QueryError> {
//!         if query.starts_with("show env") {
//!             Ok(vec![RawValue::Scalar("prod".into())])
//!         } else {
//!             Ok(vec![
//!                 RawValue::Scalar("web1".into()),
//!                 RawValue::Scalar("web2".into()),
//!             ])
//!         }
//!     }
//! }
//!
//! let definitions = vec![
//!     TemplateDefinition::new("$env", "show env"),
//!     TemplateDefinition::new("$server", "show servers where env=$env"),
//! ];
//! let tree = TemplatesTree::build(&definitions, &StaticBackend).unwrap();
//!
//! let resolutions = tree.resolutions_for("metric{server=$server}").unwrap();
//! assert_eq!(resolutions.len(), 2);
//! for substitutions in &resolutions {
//!     assert_eq!(substitutions["$env"], "prod");
//!     assert_eq!(substitutions["$interval"], "1m");
//! }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]

pub mod dashboard;
pub mod error;
pub mod executor;
pub mod resolve;
pub mod topo;
pub mod tree;
pub mod types;

// Re-export main types at crate root
pub use dashboard::{Dashboard, Panel};
pub use error::{Result, TemplateError};
pub use executor::{apply_extraction, ExecutorConfig, QueryError, QueryExecutor};
pub use topo::topo_sort;
pub use tree::{DepNode, NodeId, TemplatesTree};
pub use types::{
    placeholders, DefaultTemplates, RawValue, Substitutions, TemplateDefinition,
};
