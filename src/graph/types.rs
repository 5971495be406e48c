//! Core type definitions for the follow graph

use super::store::{GraphError, GraphResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted user identifier, in bytes
pub const MAX_USER_ID_LEN: usize = 128;

/// Opaque user identifier, shared with the external profile store
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Wrap an identifier without validation
    pub fn new(id: impl Into<String>) -> Self {
        UserId(id.into())
    }

    /// Validate and wrap an identifier.
    ///
    /// Rejects empty ids, ids longer than [`MAX_USER_ID_LEN`] bytes and ids
    /// containing whitespace or control characters.
    pub fn parse(id: &str) -> GraphResult<Self> {
        if id.is_empty() {
            return Err(GraphError::InvalidArgument("user id is empty".to_string()));
        }
        if id.len() > MAX_USER_ID_LEN {
            return Err(GraphError::InvalidArgument(format!(
                "user id exceeds {} bytes",
                MAX_USER_ID_LEN
            )));
        }
        if id.chars().any(|c| c.is_whitespace() || c.is_control()) {
            return Err(GraphError::InvalidArgument(format!(
                "user id {:?} contains whitespace or control characters",
                id
            )));
        }
        Ok(UserId(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for UserId {
    fn from(s: String) -> Self {
        UserId(s)
    }
}

impl From<&str> for UserId {
    fn from(s: &str) -> Self {
        UserId(s.to_string())
    }
}

/// How two users relate, seen from the first one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationshipStatus {
    None,
    /// The first user follows the second
    Following,
    /// The second user follows the first
    FollowedBy,
    Mutual,
}

impl RelationshipStatus {
    pub fn from_flags(a_follows_b: bool, b_follows_a: bool) -> Self {
        match (a_follows_b, b_follows_a) {
            (true, true) => RelationshipStatus::Mutual,
            (true, false) => RelationshipStatus::Following,
            (false, true) => RelationshipStatus::FollowedBy,
            (false, false) => RelationshipStatus::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_id() {
        let id = UserId::new("alice");
        assert_eq!(id.as_str(), "alice");
        assert_eq!(format!("{}", id), "alice");

        let id2: UserId = "bob".into();
        assert!(id < id2);
    }

    #[test]
    fn test_user_id_parse() {
        assert!(UserId::parse("u-42").is_ok());
        assert!(matches!(UserId::parse(""), Err(GraphError::InvalidArgument(_))));
        assert!(matches!(UserId::parse("a b"), Err(GraphError::InvalidArgument(_))));
        assert!(matches!(UserId::parse("a\nb"), Err(GraphError::InvalidArgument(_))));
        assert!(UserId::parse(&"x".repeat(MAX_USER_ID_LEN)).is_ok());
        assert!(UserId::parse(&"x".repeat(MAX_USER_ID_LEN + 1)).is_err());
    }

    #[test]
    fn test_user_id_serializes_as_string() {
        let json = serde_json::to_string(&UserId::new("carol")).unwrap();
        assert_eq!(json, "\"carol\"");
    }

    #[test]
    fn test_relationship_status() {
        assert_eq!(RelationshipStatus::from_flags(true, true), RelationshipStatus::Mutual);
        assert_eq!(RelationshipStatus::from_flags(true, false), RelationshipStatus::Following);
        assert_eq!(RelationshipStatus::from_flags(false, true), RelationshipStatus::FollowedBy);
        assert_eq!(RelationshipStatus::from_flags(false, false), RelationshipStatus::None);

        let json = serde_json::to_string(&RelationshipStatus::FollowedBy).unwrap();
        assert_eq!(json, "\"followed_by\"");
    }
}
