//! Social Graph Engine
//!
//! An in-memory directed "follows" graph over opaque user identifiers, with
//! the structural queries a social application needs: relationship status,
//! mutual connections, bounded shortest connection paths, friend-of-friend
//! recommendations, trending users and per-user network statistics.
//!
//! # Architecture
//!
//! - [`graph`]: the follow-graph store with O(degree) neighbor lookups
//! - [`algo`]: query adapters over the `socialgraph-algorithms` crate
//! - [`persistence`]: write-ahead log replayed on startup
//! - [`engine`]: the store behind a single-writer/multi-reader lock
//! - [`http`]: JSON API over the engine
//!
//! An edge `A -> B` means "A follows B".
//!
//! ## Example Usage
//!
//! ```rust
//! use socialgraph::{FollowGraph, UserId};
//!
//! let mut graph = FollowGraph::new();
//! let (a, b, c) = (UserId::new("alice"), UserId::new("bob"), UserId::new("carol"));
//!
//! graph.add_edge(&a, &b);
//! graph.add_edge(&b, &c);
//!
//! // Carol is a friend of a friend
//! let suggestions = graph.people_you_may_know(&a, 10);
//! assert_eq!(suggestions[0].id, c);
//! assert_eq!(suggestions[0].score, 1);
//!
//! let path = graph.shortest_path(&a, &c, 6).unwrap();
//! assert_eq!(path, vec![a, b, c]);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod config;
pub mod engine;
pub mod graph;
pub mod http;
pub mod persistence;

// Re-export main types for convenience
pub use graph::{
    FollowEvent, FollowGraph, GraphError, GraphResult, GraphStatistics, RelationshipStatus, UserId,
};

pub use algo::{ConnectionPath, NetworkStats, Recommendation, RecommendationSource, ScoredUser};

pub use config::{QueryLimits, ServerConfig};

pub use engine::{spawn_notification_sink, EngineError, EngineResult, SocialGraphEngine, UserStats};

pub use http::HttpServer;

pub use persistence::{
    PersistenceError, PersistenceManager, PersistenceResult, Wal, WalEntry, WalError, WalResult,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
