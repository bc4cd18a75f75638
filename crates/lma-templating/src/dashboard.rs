//! Grafana dashboard JSON ingestion.
//!
//! Template definitions and panel queries come from exported dashboard
//! documents. Only the subset the harness needs is modeled
//! (`templating.list`, `rows`/`panels`, `targets`); everything else in the
//! document is ignored, and missing sections deserialize to empty lists so
//! a minimal dashboard still parses.

use serde::Deserialize;

use crate::error::Result;
use crate::types::{DefaultTemplates, TemplateDefinition};

/// An exported Grafana dashboard, reduced to the fields the harness reads.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dashboard {
    /// Dashboard title.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    templating: TemplatingSection,
    #[serde(default)]
    rows: Vec<Row>,
    #[serde(default)]
    panels: Vec<Panel>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct TemplatingSection {
    #[serde(default)]
    list: Vec<TemplateEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct TemplateEntry {
    name: String,
    #[serde(default)]
    query: String,
    #[serde(default)]
    regex: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Row {
    #[serde(default)]
    panels: Vec<Panel>,
}

/// One dashboard panel with its backend queries.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Panel {
    /// Panel title.
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    targets: Vec<Target>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct Target {
    #[serde(default)]
    query: String,
}

impl Dashboard {
    /// Parses an exported dashboard document.
    ///
    /// # Errors
    ///
    /// [`crate::TemplateError::InvalidDashboard`] when the document is not
    /// valid JSON or has the wrong shape.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// The dashboard's template definitions, in `templating.list` order.
    ///
    /// List order is preserved because sibling tie-breaks in the tree use
    /// insertion order. Entries that are defaults (`interval`,
    /// `timeFilter`) or have no query are skipped; an empty regex means no
    /// extraction.
    #[must_use]
    pub fn template_definitions(&self) -> Vec<TemplateDefinition> {
        self.templating
            .list
            .iter()
            .filter(|entry| !entry.query.is_empty())
            .map(|entry| {
                let definition = TemplateDefinition::new(entry.name.clone(), entry.query.clone());
                if entry.regex.is_empty() {
                    definition
                } else {
                    definition.with_regex(entry.regex.clone())
                }
            })
            .filter(|definition| !DefaultTemplates::contains(&definition.name))
            .collect()
    }

    /// Every panel target query, across both flat panels and row panels.
    #[must_use]
    pub fn target_queries(&self) -> Vec<&str> {
        self.panels
            .iter()
            .chain(self.rows.iter().flat_map(|row| row.panels.iter()))
            .flat_map(|panel| panel.targets.iter())
            .map(|target| target.query.as_str())
            .filter(|query| !query.is_empty())
            .collect()
    }
}
