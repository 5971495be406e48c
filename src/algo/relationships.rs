//! Direct relationship queries

use crate::graph::{FollowGraph, RelationshipStatus, UserId};
use socialgraph_algorithms::{common_successors, reciprocal_neighbors, Adjacency};

impl FollowGraph {
    /// Whether `a` follows `b`. Always false for `a == b`.
    pub fn is_following(&self, a: &UserId, b: &UserId) -> bool {
        match (self.slot_of(a), self.slot_of(b)) {
            (Some(a), Some(b)) => self.has_successor(a, b),
            _ => false,
        }
    }

    pub fn relationship_status(&self, a: &UserId, b: &UserId) -> RelationshipStatus {
        RelationshipStatus::from_flags(self.is_following(a, b), self.is_following(b, a))
    }

    /// Users that both `a` and `b` follow, in `a`'s follow order, at most `limit`
    pub fn mutual_connections(&self, a: &UserId, b: &UserId, limit: usize) -> Vec<UserId> {
        match (self.slot_of(a), self.slot_of(b)) {
            (Some(a), Some(b)) => self.resolve(common_successors(self, a, b, limit)),
            _ => Vec::new(),
        }
    }

    /// Users with a follow in both directions with `id`
    pub fn friends(&self, id: &UserId) -> Vec<UserId> {
        self.slot_of(id)
            .map(|slot| self.resolve(reciprocal_neighbors(self, slot)))
            .unwrap_or_default()
    }

    /// (following, followers)
    pub fn degree(&self, id: &UserId) -> (usize, usize) {
        (self.following_count(id), self.follower_count(id))
    }
}
