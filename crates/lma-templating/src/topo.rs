//! Topological ordering of template dependency mappings.

use std::collections::HashSet;

use crate::error::{Result, TemplateError};

/// Orders `mapping` so every node appears after all of its dependencies.
///
/// The input is an ordered list of `(name, dependencies)` pairs. Dependency
/// names that are not themselves keys in the mapping are treated as external
/// leaves and never block a node. Ties among independent nodes keep input
/// order.
///
/// The ordering is computed by pass-by-pass removal: each pass takes every
/// node whose remaining dependencies are all satisfied. Nodes removed in the
/// same pass have no ordering relationship to each other, which is exactly
/// the grouping the level assignment in the tree builder needs.
///
/// # Errors
///
/// [`TemplateError::CyclicDependency`] if a pass makes no progress while
/// nodes remain, i.e. the mapping is not a DAG.
pub fn topo_sort(mapping: &[(String, Vec<String>)]) -> Result<Vec<(String, Vec<String>)>> {
    let mut remaining: Vec<&(String, Vec<String>)> = mapping.iter().collect();
    let mut sorted = Vec::with_capacity(mapping.len());

    while !remaining.is_empty() {
        let unsorted_keys: HashSet<&str> =
            remaining.iter().map(|(name, _)| name.as_str()).collect();

        let (ready, blocked): (Vec<_>, Vec<_>) = remaining
            .into_iter()
            .partition(|(_, deps)| deps.iter().all(|d| !unsorted_keys.contains(d.as_str())));

        if ready.is_empty() {
            return Err(TemplateError::CyclicDependency {
                remaining: blocked.iter().map(|(name, _)| name.clone()).collect(),
            });
        }

        sorted.extend(ready.into_iter().cloned());
        remaining = blocked;
    }

    Ok(sorted)
}
