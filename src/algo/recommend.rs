//! Recommendation engine
//!
//! Friend-of-friend suggestions scored by mutual-connection count and a pure
//! follower-count popularity ranking. Ties always break by user id ascending.

use crate::graph::{FollowGraph, UserId};
use serde::Serialize;
use socialgraph_algorithms::{friends_of_friends, in_degree_scores, rank_by_score, Adjacency, Scored};
use std::collections::HashSet;

/// A user with a ranking score
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScoredUser {
    pub id: UserId,
    pub score: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecommendationSource {
    /// Scored by mutual connections
    Mutual,
    /// Scored by follower count
    Popular,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recommendation {
    pub id: UserId,
    pub score: usize,
    pub source: RecommendationSource,
}

impl FollowGraph {
    /// Friends of friends of `user` it does not follow yet, best first
    pub fn people_you_may_know(&self, user: &UserId, limit: usize) -> Vec<ScoredUser> {
        let Some(slot) = self.slot_of(user) else {
            return Vec::new();
        };
        self.ranked(friends_of_friends(self, slot), limit)
    }

    /// Every known user ranked by follower count
    pub fn trending_users(&self, limit: usize) -> Vec<ScoredUser> {
        self.ranked(in_degree_scores(self), limit)
    }

    /// People-you-may-know, or popular users when `user` has no friend-of-friend candidates.
    ///
    /// The popular fallback skips `user`, the users it already follows and
    /// users without followers.
    pub fn recommendations(&self, user: &UserId, limit: usize) -> Vec<Recommendation> {
        let suggestions = self.people_you_may_know(user, limit);
        if !suggestions.is_empty() {
            return tag(suggestions, RecommendationSource::Mutual);
        }

        let slot = self.slot_of(user);
        let excluded: HashSet<usize> = match slot {
            Some(slot) => self.successors(slot).chain(Some(slot)).collect(),
            None => HashSet::new(),
        };
        let popular: Vec<Scored> = in_degree_scores(self)
            .into_iter()
            .filter(|s| s.score > 0 && !excluded.contains(&s.node))
            .collect();

        tag(self.ranked(popular, limit), RecommendationSource::Popular)
    }

    fn ranked(&self, scored: Vec<Scored>, limit: usize) -> Vec<ScoredUser> {
        rank_by_score(scored, |slot| self.user_at(slot), limit)
            .into_iter()
            .filter_map(|s| {
                Some(ScoredUser {
                    id: self.user_at(s.node)?.clone(),
                    score: s.score,
                })
            })
            .collect()
    }
}

fn tag(users: Vec<ScoredUser>, source: RecommendationSource) -> Vec<Recommendation> {
    users
        .into_iter()
        .map(|u| Recommendation { id: u.id, score: u.score, source })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    fn scored(id: &str, score: usize) -> ScoredUser {
        ScoredUser { id: uid(id), score }
    }

    #[test]
    fn test_people_you_may_know() {
        let mut graph = FollowGraph::new();
        graph.add_edge(&uid("A"), &uid("B"));
        graph.add_edge(&uid("B"), &uid("D"));
        graph.add_edge(&uid("B"), &uid("C"));

        let result = graph.people_you_may_know(&uid("A"), 10);
        assert_eq!(result, vec![scored("C", 1), scored("D", 1)]);
    }

    #[test]
    fn test_people_you_may_know_scores_and_excludes() {
        let mut graph = FollowGraph::new();
        // A follows B, E and already follows C
        for to in ["B", "E", "C"] {
            graph.add_edge(&uid("A"), &uid(to));
        }
        graph.add_edge(&uid("B"), &uid("C"));
        graph.add_edge(&uid("B"), &uid("F"));
        graph.add_edge(&uid("E"), &uid("F"));
        graph.add_edge(&uid("E"), &uid("A"));
        graph.add_edge(&uid("E"), &uid("G"));

        let result = graph.people_you_may_know(&uid("A"), 10);
        assert_eq!(result, vec![scored("F", 2), scored("G", 1)]);

        assert_eq!(graph.people_you_may_know(&uid("A"), 1), vec![scored("F", 2)]);
        assert!(graph.people_you_may_know(&uid("nobody"), 10).is_empty());
    }

    #[test]
    fn test_trending_users() {
        let mut graph = FollowGraph::new();
        let mut follow_n = |target: &str, n: usize| {
            for i in 0..n {
                graph.add_edge(&uid(&format!("{}-fan{}", target, i)), &uid(target));
            }
        };
        follow_n("U1", 5);
        follow_n("U2", 9);
        follow_n("U3", 1);

        let result = graph.trending_users(2);
        assert_eq!(result, vec![scored("U2", 9), scored("U1", 5)]);
    }

    #[test]
    fn test_trending_ties_break_by_id() {
        let mut graph = FollowGraph::new();
        graph.add_edge(&uid("x"), &uid("b"));
        graph.add_edge(&uid("y"), &uid("a"));

        let result = graph.trending_users(3);
        assert_eq!(result, vec![scored("a", 1), scored("b", 1), scored("x", 0)]);
    }

    #[test]
    fn test_recommendations_fall_back_to_popular() {
        let mut graph = FollowGraph::new();
        graph.add_edge(&uid("fan1"), &uid("star"));
        graph.add_edge(&uid("fan2"), &uid("star"));
        graph.add_edge(&uid("fan1"), &uid("rising"));
        graph.add_edge(&uid("newbie"), &uid("rising"));

        let result = graph.recommendations(&uid("newbie"), 10);
        assert_eq!(
            result,
            vec![Recommendation { id: uid("star"), score: 2, source: RecommendationSource::Popular }]
        );
    }

    #[test]
    fn test_recommendations_prefer_mutual() {
        let mut graph = FollowGraph::new();
        graph.add_edge(&uid("A"), &uid("B"));
        graph.add_edge(&uid("B"), &uid("C"));

        let result = graph.recommendations(&uid("A"), 10);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id, uid("C"));
        assert_eq!(result[0].source, RecommendationSource::Mutual);
    }

    #[test]
    fn test_queries_do_not_mutate() {
        let mut graph = FollowGraph::new();
        graph.add_edge(&uid("A"), &uid("B"));
        graph.add_edge(&uid("B"), &uid("C"));

        let before = graph.statistics();
        graph.people_you_may_know(&uid("A"), 10);
        graph.trending_users(10);
        graph.recommendations(&uid("Z"), 10);
        assert_eq!(graph.statistics(), before);
        assert!(!graph.contains_user(&uid("Z")));
    }
}
