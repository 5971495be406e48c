//! Neighborhood topology
//!
//! Common successors, reciprocal links and hop-layer sizes.

use super::common::{Adjacency, Direction, NodeIndex};
use std::collections::HashSet;

/// Nodes that both `a` and `b` point to, in `a`'s successor order, capped at `limit`.
pub fn common_successors<G: Adjacency>(
    graph: &G,
    a: NodeIndex,
    b: NodeIndex,
    limit: usize,
) -> Vec<NodeIndex> {
    if !graph.is_active(a) || !graph.is_active(b) {
        return Vec::new();
    }
    graph
        .successors(a)
        .filter(|&n| graph.has_successor(b, n))
        .take(limit)
        .collect()
}

/// Successors of `idx` that point back at it
pub fn reciprocal_neighbors<G: Adjacency>(graph: &G, idx: NodeIndex) -> Vec<NodeIndex> {
    if !graph.is_active(idx) {
        return Vec::new();
    }
    graph
        .successors(idx)
        .filter(|&n| graph.has_successor(n, idx))
        .collect()
}

/// Sizes of the hop layers around `source`.
///
/// Entry `k - 1` counts the nodes first reached after exactly `k` hops in
/// `direction`; the source is never counted. The result always has
/// `max_depth` entries, trailing zeros once the frontier is exhausted.
pub fn layer_sizes<G: Adjacency>(
    graph: &G,
    source: NodeIndex,
    max_depth: usize,
    direction: Direction,
) -> Vec<usize> {
    let mut sizes = vec![0; max_depth];
    if !graph.is_active(source) {
        return sizes;
    }

    let mut visited: HashSet<NodeIndex> = HashSet::new();
    visited.insert(source);
    let mut frontier = vec![source];

    for size in sizes.iter_mut() {
        let mut next = Vec::new();
        for &current in &frontier {
            for neighbor in graph.neighbors(current, direction) {
                if visited.insert(neighbor) {
                    next.push(neighbor);
                }
            }
        }
        *size = next.len();
        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    sizes
}
