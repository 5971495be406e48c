//! Graph events for async processing
//!
//! Emitted after successful follow-graph mutations so a caller can announce
//! "X followed Y" without the store knowing about notifications.

use super::types::UserId;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum FollowEvent {
    Followed {
        follower: UserId,
        followee: UserId,
        /// Unix milliseconds
        at: i64,
    },
    Unfollowed {
        follower: UserId,
        followee: UserId,
    },
    UserRemoved {
        id: UserId,
    },
}
