//! Graph algorithms module
//!
//! Algorithms are implemented in the `socialgraph-algorithms` crate and work on
//! dense slot indices. This module provides the integration/adapter layer: it
//! exposes [`FollowGraph`] through [`Adjacency`] and translates user ids to
//! slots and back. Every query borrows the graph immutably, so a caller holding
//! a read guard sees one consistent snapshot for the whole traversal.

mod paths;
mod recommend;
mod relationships;
mod stats;

pub use paths::ConnectionPath;
pub use recommend::{Recommendation, RecommendationSource, ScoredUser};
pub use stats::NetworkStats;

// Re-export algorithms
pub use socialgraph_algorithms::{Adjacency, Direction, GraphView, NodeIndex};

use crate::graph::FollowGraph;

/// Default hop bound for shortest-path search
pub const DEFAULT_MAX_DEPTH: usize = 6;

/// Default cap on mutual-connection results
pub const DEFAULT_MUTUAL_LIMIT: usize = 50;

impl Adjacency for FollowGraph {
    fn node_count(&self) -> usize {
        self.slot_count()
    }

    fn is_active(&self, idx: NodeIndex) -> bool {
        self.user_at(idx).is_some()
    }

    fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.following_slots(idx)
            .into_iter()
            .flat_map(|following| following.keys().copied())
    }

    fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.follower_slots(idx)
            .into_iter()
            .flat_map(|followers| followers.iter().copied())
    }

    fn out_degree(&self, idx: NodeIndex) -> usize {
        self.following_slots(idx).map_or(0, |following| following.len())
    }

    fn in_degree(&self, idx: NodeIndex) -> usize {
        self.follower_slots(idx).map_or(0, |followers| followers.len())
    }

    fn has_successor(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.following_slots(from)
            .is_some_and(|following| following.contains_key(&to))
    }
}

impl FollowGraph {
    /// Freeze the current topology into a slot-indexed CSR view.
    ///
    /// Freed slots stay in the view as isolated nodes.
    pub fn to_view(&self) -> GraphView {
        let edges: Vec<(NodeIndex, NodeIndex)> = (0..self.slot_count())
            .flat_map(|from| self.successors(from).map(move |to| (from, to)))
            .collect();
        GraphView::from_edges(self.slot_count(), &edges)
    }
}
