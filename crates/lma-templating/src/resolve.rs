//! Resolving arbitrary panel queries against a built tree.
//!
//! Given a panel query containing template placeholders, the facade
//! answers "which substitution dictionaries apply": one dictionary per
//! independent branch of the tree that can satisfy every referenced
//! placeholder, with the fixed `$interval`/`$timeFilter` defaults merged
//! into every result.

use tracing::debug;

use crate::error::{Result, TemplateError};
use crate::tree::{NodeId, TemplatesTree};
use crate::types::{placeholders, DefaultTemplates, Substitutions};

impl TemplatesTree {
    /// Returns every substitution dictionary applicable to `query`.
    ///
    /// Placeholders handled outside the tree (`$interval`, `$timeFilter`)
    /// are filtered out first and merged back into every returned
    /// dictionary. A query with no tree-managed placeholders resolves to a
    /// single defaults-only dictionary.
    ///
    /// For the remaining placeholders the closest-parent nodes are located
    /// (deepest level touching any referenced name). When they all belong
    /// to one template the query has a single substitution axis: one
    /// dictionary per node, each the node's full ancestor chain. When they
    /// belong to several templates the sibling groups are cross-joined
    /// under each common parent (cartesian product across the distinct
    /// template names); results from distinct parents are concatenated,
    /// not cross-joined — a deliberate reference-behavior limitation.
    ///
    /// # Errors
    ///
    /// [`TemplateError::UnknownPlaceholder`] if the query references a
    /// placeholder that is neither a default nor one of this tree's
    /// templates. A known placeholder whose branches all came back empty
    /// yields `Ok` with an empty list instead.
    pub fn resolutions_for(&self, query: &str) -> Result<Vec<Substitutions>> {
        let names: Vec<String> = placeholders(query)
            .into_iter()
            .filter(|name| !DefaultTemplates::contains(name))
            .collect();

        for name in &names {
            if !self.knows(name) {
                return Err(TemplateError::UnknownPlaceholder { name: name.clone() });
            }
        }

        if names.is_empty() {
            return Ok(vec![self.defaults().substitutions()]);
        }

        let closest = self.closest_nodes(&names);
        debug!(query, candidates = closest.len(), "resolving query");

        let distinct_names = distinct_owner_names(self, &closest);
        let mut resolutions = if distinct_names.len() <= 1 {
            // Single axis: one dictionary per closest node.
            closest
                .iter()
                .map(|id| self.substitutions_for(*id))
                .collect()
        } else {
            self.cross_join_under_parents(&closest, &distinct_names)
        };

        for substitutions in &mut resolutions {
            self.defaults().merge_into(substitutions);
        }
        Ok(resolutions)
    }

    /// Nodes owned by any of `names` at the deepest level any of them
    /// reaches, in level-index order.
    fn closest_nodes(&self, names: &[String]) -> Vec<NodeId> {
        let deepest = names
            .iter()
            .filter_map(|name| self.level_of(name))
            .max()
            .unwrap_or(0);
        self.ids_at_level(deepest)
            .iter()
            .copied()
            .filter(|id| {
                self.node(*id)
                    .is_some_and(|node| names.contains(&node.name))
            })
            .collect()
    }

    /// Cartesian expansion of sibling groups sharing one parent.
    fn cross_join_under_parents(
        &self,
        closest: &[NodeId],
        distinct_names: &[String],
    ) -> Vec<Substitutions> {
        // Group ids by parent, keeping first-appearance parent order.
        let mut parents: Vec<Option<NodeId>> = Vec::new();
        for id in closest {
            let parent = self.node(*id).and_then(crate::tree::DepNode::parent);
            if !parents.contains(&parent) {
                parents.push(parent);
            }
        }

        let mut resolutions = Vec::new();
        for parent in parents {
            let group: Vec<NodeId> = closest
                .iter()
                .copied()
                .filter(|id| self.node(*id).and_then(crate::tree::DepNode::parent) == parent)
                .collect();

            let base = parent.map_or_else(Substitutions::new, |p| self.substitutions_for(p));

            // Product across distinct template names within this group.
            let mut combos: Vec<Substitutions> = vec![base];
            for name in distinct_names {
                let values: Vec<&str> = group
                    .iter()
                    .filter_map(|id| self.node(*id))
                    .filter(|node| &node.name == name)
                    .map(|node| node.value.as_str())
                    .collect();
                if values.is_empty() {
                    // This parent has no branch for `name`; nothing to
                    // cross-join here.
                    combos.clear();
                    break;
                }
                combos = combos
                    .into_iter()
                    .flat_map(|combo| {
                        values.iter().map(move |value| {
                            let mut next = combo.clone();
                            next.insert(name.clone(), (*value).to_string());
                            next
                        })
                    })
                    .collect();
            }
            resolutions.extend(combos);
        }
        resolutions
    }
}

/// Distinct owning-template names among `ids`, in first-appearance order.
fn distinct_owner_names(tree: &TemplatesTree, ids: &[NodeId]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for id in ids {
        if let Some(node) = tree.node(*id) {
            if !names.contains(&node.name) {
                names.push(node.name.clone());
            }
        }
    }
    names
}
