//! Per-user network statistics
//!
//! An edge `A -> B` means "A follows B". Reach is measured along outgoing
//! edges only.

use crate::graph::{FollowGraph, UserId};
use serde::Serialize;
use socialgraph_algorithms::{layer_sizes, Direction};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NetworkStats {
    pub following: usize,
    pub followers: usize,
    /// Users reached through exactly two follow hops, excluding the user and its followees
    pub second_degree: usize,
}

impl FollowGraph {
    /// Counts for `user`; all zero for an unknown user
    pub fn stats(&self, user: &UserId) -> NetworkStats {
        let reach = self.reach(user, 2);
        NetworkStats {
            following: self.following_count(user),
            followers: self.follower_count(user),
            second_degree: reach[1],
        }
    }

    /// Entry `k - 1` is the number of users first reached after exactly `k` follow hops
    pub fn reach(&self, user: &UserId, max_depth: usize) -> Vec<usize> {
        match self.slot_of(user) {
            Some(slot) => layer_sizes(self, slot, max_depth, Direction::Outgoing),
            None => vec![0; max_depth],
        }
    }
}
