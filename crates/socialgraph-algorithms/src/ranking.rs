//! Ranking algorithms
//!
//! Friend-of-friend candidate scoring and in-degree popularity.

use super::common::{Adjacency, NodeIndex};
use rayon::prelude::*;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// A node paired with its score
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scored {
    pub node: NodeIndex,
    pub score: usize,
}

/// Friend-of-friend candidates of `source`.
///
/// Candidates are successors of successors, excluding `source` itself and its
/// direct successors. The score counts the distinct intermediate nodes that
/// lead to the candidate. Output is in discovery order and unranked.
pub fn friends_of_friends<G: Adjacency>(graph: &G, source: NodeIndex) -> Vec<Scored> {
    if !graph.is_active(source) {
        return Vec::new();
    }

    let direct: HashSet<NodeIndex> = graph.successors(source).collect();
    let mut positions: HashMap<NodeIndex, usize> = HashMap::new();
    let mut candidates: Vec<Scored> = Vec::new();

    for friend in graph.successors(source) {
        for candidate in graph.successors(friend) {
            if candidate == source || direct.contains(&candidate) {
                continue;
            }
            match positions.get(&candidate) {
                Some(&pos) => candidates[pos].score += 1,
                None => {
                    positions.insert(candidate, candidates.len());
                    candidates.push(Scored { node: candidate, score: 1 });
                }
            }
        }
    }

    candidates
}

/// In-degree of every active node, in index order.
pub fn in_degree_scores<G: Adjacency + Sync>(graph: &G) -> Vec<Scored> {
    (0..graph.node_count())
        .into_par_iter()
        .filter(|&idx| graph.is_active(idx))
        .map(|idx| Scored { node: idx, score: graph.in_degree(idx) })
        .collect()
}

/// Sort by score descending, breaking ties by `key` ascending, and keep the first `limit`.
pub fn rank_by_score<K, F>(mut scored: Vec<Scored>, key: F, limit: usize) -> Vec<Scored>
where
    K: Ord,
    F: Fn(NodeIndex) -> K,
{
    if limit == 0 {
        return Vec::new();
    }

    let compare = |a: &Scored, b: &Scored| -> Ordering {
        b.score.cmp(&a.score).then_with(|| key(a.node).cmp(&key(b.node)))
    };

    if scored.len() > limit {
        scored.select_nth_unstable_by(limit, compare);
        scored.truncate(limit);
    }
    scored.sort_by(compare);
    scored
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::GraphView;

    #[test]
    fn test_friends_of_friends() {
        // 0->1, 1->2, 1->3, 0->4, 4->2, 1->0
        let view = GraphView::from_edges(5, &[(0, 1), (1, 2), (1, 3), (0, 4), (4, 2), (1, 0)]);

        let mut result = friends_of_friends(&view, 0);
        result.sort_by_key(|s| s.node);

        assert_eq!(
            result,
            vec![Scored { node: 2, score: 2 }, Scored { node: 3, score: 1 }]
        );
    }

    #[test]
    fn test_friends_of_friends_excludes_direct() {
        // 0->1, 0->2, 1->2
        let view = GraphView::from_edges(3, &[(0, 1), (0, 2), (1, 2)]);
        assert!(friends_of_friends(&view, 0).is_empty());
    }

    #[test]
    fn test_in_degree_scores() {
        let view = GraphView::from_edges(3, &[(0, 1), (2, 1), (1, 0)]);
        let scores = in_degree_scores(&view);
        assert_eq!(
            scores,
            vec![
                Scored { node: 0, score: 1 },
                Scored { node: 1, score: 2 },
                Scored { node: 2, score: 0 },
            ]
        );
    }

    #[test]
    fn test_rank_by_score_ties() {
        let scored = vec![
            Scored { node: 3, score: 1 },
            Scored { node: 1, score: 4 },
            Scored { node: 2, score: 1 },
            Scored { node: 0, score: 1 },
        ];

        let ranked = rank_by_score(scored.clone(), |n| n, 3);
        let nodes: Vec<_> = ranked.iter().map(|s| s.node).collect();
        assert_eq!(nodes, vec![1, 0, 2]);

        // Reverse key order flips the tie-break
        let ranked = rank_by_score(scored, |n| std::cmp::Reverse(n), 10);
        let nodes: Vec<_> = ranked.iter().map(|s| s.node).collect();
        assert_eq!(nodes, vec![1, 3, 2, 0]);
    }

    #[test]
    fn test_rank_by_score_zero_limit() {
        let scored = vec![Scored { node: 0, score: 1 }];
        assert!(rank_by_score(scored, |n| n, 0).is_empty());
    }
}
