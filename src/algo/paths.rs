//! Shortest connection path between two users

use crate::graph::{FollowGraph, UserId};
use serde::Serialize;
use socialgraph_algorithms::bfs_undirected;

/// A connection path and its length in hops
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionPath {
    pub path: Vec<UserId>,
    pub degrees: usize,
}

impl FollowGraph {
    /// Shortest path from `a` to `b` over the undirected view, at most `max_depth` hops.
    ///
    /// From each user, the users it follows are tried before its followers,
    /// each in follow order; among equally short paths the first one found
    /// wins. `a == b` is the zero-hop path `[a]`. An unknown user or a
    /// target beyond `max_depth` gives `None`.
    pub fn shortest_path(&self, a: &UserId, b: &UserId, max_depth: usize) -> Option<Vec<UserId>> {
        if a == b {
            return Some(vec![a.clone()]);
        }
        let source = self.slot_of(a)?;
        let target = self.slot_of(b)?;
        let result = bfs_undirected(self, source, target, max_depth)?;
        Some(self.resolve(result.path))
    }

    pub fn degrees_of_separation(&self, a: &UserId, b: &UserId, max_depth: usize) -> Option<usize> {
        self.shortest_path(a, b, max_depth).map(|path| path.len() - 1)
    }

    pub fn connection_path(&self, a: &UserId, b: &UserId, max_depth: usize) -> Option<ConnectionPath> {
        self.shortest_path(a, b, max_depth).map(|path| ConnectionPath {
            degrees: path.len() - 1,
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::DEFAULT_MAX_DEPTH;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    fn chain(ids: &[&str]) -> FollowGraph {
        let mut graph = FollowGraph::new();
        for pair in ids.windows(2) {
            graph.add_edge(&uid(pair[0]), &uid(pair[1]));
        }
        graph
    }

    #[test]
    fn test_shortest_path_chain() {
        let mut graph = chain(&["A", "B", "C", "D"]);
        graph.register_user(&uid("E"));

        let path = graph.shortest_path(&uid("A"), &uid("D"), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(path, vec![uid("A"), uid("B"), uid("C"), uid("D")]);
        assert_eq!(graph.degrees_of_separation(&uid("A"), &uid("D"), DEFAULT_MAX_DEPTH), Some(3));

        assert_eq!(graph.shortest_path(&uid("A"), &uid("A"), DEFAULT_MAX_DEPTH), Some(vec![uid("A")]));
        assert!(graph.shortest_path(&uid("A"), &uid("E"), DEFAULT_MAX_DEPTH).is_none());
        assert!(graph.shortest_path(&uid("A"), &uid("missing"), DEFAULT_MAX_DEPTH).is_none());
    }

    #[test]
    fn test_shortest_path_against_direction() {
        let graph = chain(&["A", "B", "C", "D"]);
        let path = graph.shortest_path(&uid("D"), &uid("A"), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(path, vec![uid("D"), uid("C"), uid("B"), uid("A")]);
    }

    #[test]
    fn test_shortest_path_depth_bound() {
        let graph = chain(&["A", "B", "C", "D"]);
        assert!(graph.shortest_path(&uid("A"), &uid("D"), 2).is_none());
        assert!(graph.shortest_path(&uid("A"), &uid("D"), 3).is_some());
    }

    #[test]
    fn test_shortest_path_is_reproducible() {
        // A follows C then B; both reach D
        let mut graph = FollowGraph::new();
        graph.add_edge(&uid("A"), &uid("C"));
        graph.add_edge(&uid("A"), &uid("B"));
        graph.add_edge(&uid("B"), &uid("D"));
        graph.add_edge(&uid("C"), &uid("D"));

        for _ in 0..5 {
            let path = graph.shortest_path(&uid("A"), &uid("D"), DEFAULT_MAX_DEPTH).unwrap();
            assert_eq!(path, vec![uid("A"), uid("C"), uid("D")]);
        }
    }

    #[test]
    fn test_connection_path() {
        let graph = chain(&["A", "B", "C"]);
        let conn = graph.connection_path(&uid("A"), &uid("C"), DEFAULT_MAX_DEPTH).unwrap();
        assert_eq!(conn.degrees, 2);
        assert_eq!(conn.path.len(), 3);
    }
}
