//! Shared utilities for graph algorithms
//!
//! Algorithms address nodes by dense integer index and read topology through
//! the [`Adjacency`] trait, so the live store and a frozen CSR snapshot can be
//! traversed by the same code.

/// Dense node index (0..node_count)
pub type NodeIndex = usize;

/// Which edges to follow when expanding a node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Direction {
    /// Follow edges from source to target
    Outgoing,
    /// Follow edges from target back to source
    Incoming,
    /// Treat every edge as undirected
    Both,
}

/// Read-only access to a directed graph addressed by dense index.
///
/// Neighbor iteration order must be stable between calls on an unmodified
/// graph; algorithms rely on it for reproducible tie-breaking.
pub trait Adjacency {
    /// Exclusive upper bound on node indices
    fn node_count(&self) -> usize;

    /// Whether `idx` currently holds a node.
    ///
    /// Stores that recycle slots override this to hide freed indices.
    fn is_active(&self, idx: NodeIndex) -> bool {
        idx < self.node_count()
    }

    /// Targets of the outgoing edges of `idx`
    fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_;

    /// Sources of the incoming edges of `idx`
    fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_;

    fn out_degree(&self, idx: NodeIndex) -> usize {
        self.successors(idx).count()
    }

    fn in_degree(&self, idx: NodeIndex) -> usize {
        self.predecessors(idx).count()
    }

    /// Whether the edge `from -> to` exists
    fn has_successor(&self, from: NodeIndex, to: NodeIndex) -> bool {
        self.successors(from).any(|n| n == to)
    }

    /// Neighbors in the given direction. For [`Direction::Both`] successors
    /// come first, then predecessors; a node linked both ways appears twice.
    fn neighbors(&self, idx: NodeIndex, direction: Direction) -> impl Iterator<Item = NodeIndex> + '_ {
        let (out, inc) = match direction {
            Direction::Outgoing => (usize::MAX, 0),
            Direction::Incoming => (0, usize::MAX),
            Direction::Both => (usize::MAX, usize::MAX),
        };
        self.successors(idx)
            .take(out)
            .chain(self.predecessors(idx).take(inc))
    }
}

/// A dense, integer-indexed view of the graph topology using Compressed Sparse Row (CSR) format.
#[derive(Debug, Clone, Default)]
pub struct GraphView {
    /// Number of nodes
    pub node_count: usize,

    /// Outgoing edges CSR structure
    /// Offsets into `out_targets`. Size = node_count + 1
    pub out_offsets: Vec<usize>,
    /// Contiguous array of target node indices
    pub out_targets: Vec<NodeIndex>,

    /// Incoming edges CSR structure (Compressed Sparse Column effectively)
    /// Offsets into `in_sources`. Size = node_count + 1
    pub in_offsets: Vec<usize>,
    /// Contiguous array of source node indices
    pub in_sources: Vec<NodeIndex>,
}

impl GraphView {
    /// Build a view from an edge list.
    ///
    /// Each node's successors (and predecessors) keep the order in which
    /// their edges appear in `edges`. Edges touching an index outside
    /// `0..node_count` are skipped.
    pub fn from_edges(node_count: usize, edges: &[(NodeIndex, NodeIndex)]) -> Self {
        let edges: Vec<_> = edges
            .iter()
            .copied()
            .filter(|&(u, v)| u < node_count && v < node_count)
            .collect();

        let mut out_counts = vec![0usize; node_count];
        let mut in_counts = vec![0usize; node_count];
        for &(u, v) in &edges {
            out_counts[u] += 1;
            in_counts[v] += 1;
        }

        let out_offsets = prefix_sums(&out_counts);
        let in_offsets = prefix_sums(&in_counts);

        // Stable placement keeps edge order within each row
        let mut out_targets = vec![0; edges.len()];
        let mut in_sources = vec![0; edges.len()];
        let mut out_cursor = out_offsets.clone();
        let mut in_cursor = in_offsets.clone();
        for &(u, v) in &edges {
            out_targets[out_cursor[u]] = v;
            out_cursor[u] += 1;
            in_sources[in_cursor[v]] = u;
            in_cursor[v] += 1;
        }

        GraphView {
            node_count,
            out_offsets,
            out_targets,
            in_offsets,
            in_sources,
        }
    }

    /// Get outgoing neighbors (successors) of a node
    pub fn successor_slice(&self, idx: NodeIndex) -> &[NodeIndex] {
        let start = self.out_offsets[idx];
        let end = self.out_offsets[idx + 1];
        &self.out_targets[start..end]
    }

    /// Get incoming neighbors (predecessors) of a node
    pub fn predecessor_slice(&self, idx: NodeIndex) -> &[NodeIndex] {
        let start = self.in_offsets[idx];
        let end = self.in_offsets[idx + 1];
        &self.in_sources[start..end]
    }

    pub fn edge_count(&self) -> usize {
        self.out_targets.len()
    }
}

fn prefix_sums(counts: &[usize]) -> Vec<usize> {
    let mut offsets = Vec::with_capacity(counts.len() + 1);
    offsets.push(0);
    let mut total = 0;
    for &c in counts {
        total += c;
        offsets.push(total);
    }
    offsets
}

impl Adjacency for GraphView {
    fn node_count(&self) -> usize {
        self.node_count
    }

    fn successors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let slice: &[NodeIndex] = if idx < self.node_count { self.successor_slice(idx) } else { &[] };
        slice.iter().copied()
    }

    fn predecessors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        let slice: &[NodeIndex] = if idx < self.node_count { self.predecessor_slice(idx) } else { &[] };
        slice.iter().copied()
    }

    fn out_degree(&self, idx: NodeIndex) -> usize {
        if idx < self.node_count {
            self.out_offsets[idx + 1] - self.out_offsets[idx]
        } else {
            0
        }
    }

    fn in_degree(&self, idx: NodeIndex) -> usize {
        if idx < self.node_count {
            self.in_offsets[idx + 1] - self.in_offsets[idx]
        } else {
            0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_edges_keeps_order() {
        // 0->2, 0->1, 1->2
        let view = GraphView::from_edges(3, &[(0, 2), (0, 1), (1, 2)]);

        assert_eq!(view.successor_slice(0), &[2, 1]);
        assert_eq!(view.predecessor_slice(2), &[0, 1]);
        assert_eq!(view.out_degree(0), 2);
        assert_eq!(view.in_degree(0), 0);
        assert_eq!(view.edge_count(), 3);
    }

    #[test]
    fn test_from_edges_skips_out_of_range() {
        let view = GraphView::from_edges(2, &[(0, 1), (1, 5)]);
        assert_eq!(view.edge_count(), 1);
        assert_eq!(view.successors(7).count(), 0);
    }

    #[test]
    fn test_neighbors_direction() {
        // 0->1, 2->0
        let view = GraphView::from_edges(3, &[(0, 1), (2, 0)]);

        let out: Vec<_> = view.neighbors(0, Direction::Outgoing).collect();
        let inc: Vec<_> = view.neighbors(0, Direction::Incoming).collect();
        let both: Vec<_> = view.neighbors(0, Direction::Both).collect();

        assert_eq!(out, vec![1]);
        assert_eq!(inc, vec![2]);
        assert_eq!(both, vec![1, 2]);
        assert!(view.has_successor(0, 1));
        assert!(!view.has_successor(1, 0));
    }
}
