//! Pathfinding algorithms
//!
//! Depth-bounded breadth-first search over the undirected view of a directed graph.

use super::common::{Adjacency, Direction, NodeIndex};
use std::collections::HashMap;

/// Result of a pathfinding algorithm
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PathResult {
    pub source: NodeIndex,
    pub target: NodeIndex,
    /// Nodes from source to target inclusive
    pub path: Vec<NodeIndex>,
    /// Number of edges on the path
    pub hops: usize,
}

/// Breadth-First Search (Unweighted Shortest Path), ignoring edge direction.
///
/// Expansion is level by level; within a node, successors are visited before
/// predecessors, each in the graph's own iteration order. The first path that
/// reaches `target` wins, which makes the choice among equally short paths
/// reproducible. Returns `None` if either endpoint is inactive or `target`
/// is more than `max_depth` hops away. `source == target` yields the
/// zero-hop path.
pub fn bfs_undirected<G: Adjacency>(
    graph: &G,
    source: NodeIndex,
    target: NodeIndex,
    max_depth: usize,
) -> Option<PathResult> {
    if !graph.is_active(source) || !graph.is_active(target) {
        return None;
    }
    if source == target {
        return Some(PathResult { source, target, path: vec![source], hops: 0 });
    }

    // index -> parent index (source maps to itself)
    let mut parents: HashMap<NodeIndex, NodeIndex> = HashMap::new();
    parents.insert(source, source);
    let mut frontier = vec![source];

    for _depth in 1..=max_depth {
        let mut next = Vec::new();
        for &current in &frontier {
            for neighbor in graph.neighbors(current, Direction::Both) {
                if parents.contains_key(&neighbor) {
                    continue;
                }
                parents.insert(neighbor, current);
                if neighbor == target {
                    let path = reconstruct(&parents, source, target);
                    return Some(PathResult {
                        source,
                        target,
                        hops: path.len() - 1,
                        path,
                    });
                }
                next.push(neighbor);
            }
        }
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    None
}

fn reconstruct(parents: &HashMap<NodeIndex, NodeIndex>, source: NodeIndex, target: NodeIndex) -> Vec<NodeIndex> {
    let mut path = vec![target];
    let mut curr = target;
    while curr != source {
        match parents.get(&curr) {
            Some(&parent) => {
                path.push(parent);
                curr = parent;
            }
            None => break,
        }
    }
    path.reverse();
    path
}
