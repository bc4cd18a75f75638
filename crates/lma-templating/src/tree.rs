//! The materialized template substitution tree.
//!
//! [`TemplatesTree::build`] turns a set of [`TemplateDefinition`]s into a
//! forest of concrete value nodes: templates are leveled topologically,
//! then each level's queries are compiled against the substitutions of
//! already-materialized ancestor nodes and executed through the
//! [`QueryExecutor`] collaborator, one branch per returned value.
//!
//! Nodes are owned by a flat arena and addressed by [`NodeId`];
//! parent/children are relationship handles, not owning pointers, so the
//! multi-rooted, multi-branching structure stays free of ownership cycles.

use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, info};

use crate::error::{Result, TemplateError};
use crate::executor::{QueryError, QueryExecutor};
use crate::topo::topo_sort;
use crate::types::{DefaultTemplates, RawValue, Substitutions, TemplateDefinition};

/// Handle to a node in a [`TemplatesTree`] arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NodeId(pub(crate) usize);

/// One concrete value bound to one template within one resolution branch.
///
/// Nodes are created during the build phase and never mutated afterwards
/// (children links excepted, which are fixed once the next level is built).
#[derive(Debug, Clone, Serialize)]
pub struct DepNode {
    /// The owning template's name (with leading `$`).
    pub name: String,
    /// The resolved value bound to the template in this branch.
    pub value: String,
    /// Topological depth; equals the owning template's level assignment.
    pub level: usize,
    /// The owning template's dependency names.
    pub dependencies: Vec<String>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl DepNode {
    /// The node this one was expanded under, if any.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Nodes expanded under this one, in creation order.
    #[must_use]
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A materialized forest of template substitutions for one dashboard.
///
/// Built once per dashboard; immutable afterwards. Sibling order within a
/// level is insertion order (the order values came back from the backend),
/// not sorted — consumers must not assume more than that.
#[derive(Debug)]
pub struct TemplatesTree {
    defaults: DefaultTemplates,
    nodes: Vec<DepNode>,
    /// Node ids per level, insertion-ordered.
    levels: Vec<Vec<NodeId>>,
    /// Template name -> level assignment.
    level_of: HashMap<String, usize>,
    /// Template name -> dependency names that are themselves templates.
    deps_of: HashMap<String, Vec<String>>,
}

impl TemplatesTree {
    /// Builds the tree for `definitions`, executing every template query
    /// through `executor`. Uses the standard Grafana defaults for
    /// `$interval`/`$timeFilter`.
    ///
    /// # Errors
    ///
    /// [`TemplateError::CyclicDependency`] if the definitions do not form a
    /// DAG, [`TemplateError::QueryFailed`] if the executor fails for any
    /// reason other than "no data". A failed build aborts the whole
    /// dashboard; per-branch no-data results only narrow the tree.
    pub fn build(
        definitions: &[TemplateDefinition],
        executor: &dyn QueryExecutor,
    ) -> Result<Self> {
        Self::build_with_defaults(definitions, executor, DefaultTemplates::default())
    }

    /// Same as [`build`](Self::build) with caller-supplied defaults.
    pub fn build_with_defaults(
        definitions: &[TemplateDefinition],
        executor: &dyn QueryExecutor,
        defaults: DefaultTemplates,
    ) -> Result<Self> {
        let known: Vec<&str> = definitions.iter().map(|d| d.name.as_str()).collect();
        let mapping: Vec<(String, Vec<String>)> = definitions
            .iter()
            .map(|d| {
                let deps: Vec<String> = d
                    .dependencies()
                    .into_iter()
                    .filter(|dep| known.contains(&dep.as_str()))
                    .collect();
                (d.name.clone(), deps)
            })
            .collect();

        let sorted = topo_sort(&mapping)?;

        let mut level_of: HashMap<String, usize> = HashMap::new();
        let mut deps_of: HashMap<String, Vec<String>> = HashMap::new();
        let mut max_level = 0;
        for (name, deps) in &sorted {
            // Dependency levels are always known first: topological order.
            let level = deps
                .iter()
                .filter_map(|d| level_of.get(d))
                .max()
                .map_or(0, |m| m + 1);
            max_level = max_level.max(level);
            level_of.insert(name.clone(), level);
            deps_of.insert(name.clone(), deps.clone());
        }

        let by_name: HashMap<&str, &TemplateDefinition> =
            definitions.iter().map(|d| (d.name.as_str(), d)).collect();

        let mut tree = Self {
            defaults,
            nodes: Vec::new(),
            levels: if sorted.is_empty() {
                Vec::new()
            } else {
                vec![Vec::new(); max_level + 1]
            },
            level_of,
            deps_of,
        };

        for level in 0..tree.levels.len() {
            // Topological output order keeps sibling tie-breaks at
            // insertion order.
            let at_level: Vec<&TemplateDefinition> = sorted
                .iter()
                .filter(|(name, _)| tree.level_of.get(name) == Some(&level))
                .filter_map(|(name, _)| by_name.get(name.as_str()).copied())
                .collect();
            for definition in at_level {
                tree.materialize(definition, level, executor)?;
            }
        }

        info!(
            templates = definitions.len(),
            nodes = tree.nodes.len(),
            levels = tree.levels.len(),
            "built template tree"
        );
        Ok(tree)
    }

    /// Creates the nodes for one template at one level.
    fn materialize(
        &mut self,
        definition: &TemplateDefinition,
        level: usize,
        executor: &dyn QueryExecutor,
    ) -> Result<()> {
        if level == 0 {
            let values = self.run_query(definition, &Substitutions::new(), executor)?;
            debug!(template = %definition.name, roots = values.len(), "materialized roots");
            for value in values {
                self.insert(definition, level, value, None);
            }
            return Ok(());
        }

        // Closest parents: already-built nodes owned by this template's
        // dependencies at the deepest dependency level, which is exactly
        // level - 1 by the level assignment rule.
        let deps = self.deps_of.get(&definition.name).cloned().unwrap_or_default();
        let parents: Vec<NodeId> = self.levels[level - 1]
            .iter()
            .copied()
            .filter(|id| deps.contains(&self.nodes[id.0].name))
            .collect();

        for parent in parents {
            let substitutions = self.substitutions_for(parent);
            let values = self.run_query(definition, &substitutions, executor)?;
            debug!(
                template = %definition.name,
                parent_value = %self.nodes[parent.0].value,
                children = values.len(),
                "materialized branch"
            );
            for value in values {
                self.insert(definition, level, value, Some(parent));
            }
        }
        Ok(())
    }

    fn run_query(
        &self,
        definition: &TemplateDefinition,
        substitutions: &Substitutions,
        executor: &dyn QueryExecutor,
    ) -> Result<Vec<String>> {
        let compiled = executor.compile_query(&definition.query, substitutions);
        match executor.execute_query(&compiled, definition.regex.as_deref()) {
            Ok(values) => Ok(values.into_iter().map(RawValue::into_value).collect()),
            // A branch with no matching series contributes zero nodes.
            Err(QueryError::NoData { query }) => {
                debug!(template = %definition.name, query, "no data for branch");
                Ok(Vec::new())
            }
            Err(QueryError::Backend { reason }) => Err(TemplateError::QueryFailed {
                template: definition.name.clone(),
                reason,
            }),
        }
    }

    fn insert(
        &mut self,
        definition: &TemplateDefinition,
        level: usize,
        value: String,
        parent: Option<NodeId>,
    ) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(DepNode {
            name: definition.name.clone(),
            value,
            level,
            dependencies: self.deps_of.get(&definition.name).cloned().unwrap_or_default(),
            parent,
            children: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0].children.push(id);
        }
        self.levels[level].push(id);
        id
    }

    /// The full substitution dictionary for `id`: its own binding plus one
    /// binding per ancestor, walking parent links to the root.
    #[must_use]
    pub fn substitutions_for(&self, id: NodeId) -> Substitutions {
        let mut map = Substitutions::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = &self.nodes[node_id.0];
            map.insert(node.name.clone(), node.value.clone());
            current = node.parent;
        }
        map
    }

    /// The node behind `id`, or `None` for a foreign handle.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&DepNode> {
        self.nodes.get(id.0)
    }

    /// Nodes at `level`, in insertion order.
    #[must_use]
    pub fn nodes_at_level(&self, level: usize) -> Vec<&DepNode> {
        self.levels
            .get(level)
            .map(|ids| ids.iter().map(|id| &self.nodes[id.0]).collect())
            .unwrap_or_default()
    }

    /// Node ids at `level`, in insertion order.
    #[must_use]
    pub fn ids_at_level(&self, level: usize) -> &[NodeId] {
        self.levels.get(level).map_or(&[], Vec::as_slice)
    }

    /// Number of levels with at least one template assigned.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.levels.len()
    }

    /// Total node count across all levels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no nodes were materialized.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The level assignment for a template name, if it is known.
    #[must_use]
    pub fn level_of(&self, name: &str) -> Option<usize> {
        self.level_of.get(name).copied()
    }

    /// Returns true if `name` is one of this tree's templates.
    #[must_use]
    pub fn knows(&self, name: &str) -> bool {
        self.level_of.contains_key(name)
    }

    /// The defaults merged into every resolution result.
    #[must_use]
    pub const fn defaults(&self) -> &DefaultTemplates {
        &self.defaults
    }
}
