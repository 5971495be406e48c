pub mod common;
pub mod pathfinding;
pub mod ranking;
pub mod topology;

pub use common::{Adjacency, Direction, GraphView, NodeIndex};
pub use pathfinding::{bfs_undirected, PathResult};
pub use ranking::{friends_of_friends, in_degree_scores, rank_by_score, Scored};
pub use topology::{common_successors, layer_sizes, reciprocal_neighbors};
