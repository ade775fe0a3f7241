//! Hierarchical level assignment over a built chain graph.
//!
//! Levels are BFS distances from the principal document following
//! child -> parent edges. Pinned levels then override computed ones, and
//! unpinned end-of-chain sentinels move one past the deepest level.

use crate::model::chain::{DocumentNode, Edge};
use crate::model::document::DocumentId;
use std::collections::{HashMap, VecDeque};

/// Assigns `level` on every node in place.
///
/// Nodes unreachable from `principal_id` over `edges` keep their draft level.
pub fn assign_levels(nodes: &mut [DocumentNode], edges: &[Edge], principal_id: DocumentId) {
    let distances = distances_from(principal_id, edges);

    for node in nodes.iter_mut() {
        if let Some(pinned) = node.document.pinned_level {
            node.level = pinned;
        } else if let Some(distance) = distances.get(&node.document.id) {
            node.level = *distance;
        }
    }

    let deepest = nodes
        .iter()
        .filter(|node| !node.document.is_chain_end)
        .map(|node| node.level)
        .max()
        .unwrap_or(0);
    for node in nodes
        .iter_mut()
        .filter(|node| node.document.is_chain_end && node.document.pinned_level.is_none())
    {
        node.level = deepest + 1;
    }
}

fn distances_from(principal_id: DocumentId, edges: &[Edge]) -> HashMap<DocumentId, u32> {
    let mut parents: HashMap<DocumentId, Vec<DocumentId>> = HashMap::new();
    for edge in edges {
        parents.entry(edge.from_id).or_default().push(edge.to_id);
    }

    let mut distances = HashMap::from([(principal_id, 0)]);
    let mut queue = VecDeque::from([(principal_id, 0u32)]);
    while let Some((current, level)) = queue.pop_front() {
        for parent in parents.get(&current).into_iter().flatten() {
            if !distances.contains_key(parent) {
                distances.insert(*parent, level + 1);
                queue.push_back((*parent, level + 1));
            }
        }
    }
    distances
}
