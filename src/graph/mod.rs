//! Core follow-graph implementation
//!
//! This module implements the directed "follows" relation:
//! - Opaque user identifiers interned into dense slots
//! - At most one edge per ordered pair, no self-edges
//! - O(degree) neighbor lookups in both directions
//! - Optional event channel for follow notifications

pub mod event;
pub mod store;
pub mod types;

// Re-export main types
pub use event::FollowEvent;
pub use store::{FollowGraph, GraphError, GraphResult, GraphStatistics};
pub use types::{RelationshipStatus, UserId, MAX_USER_ID_LEN};
