//! In-memory follow graph storage
//!
//! User ids are interned into dense slots so the algorithms crate can walk
//! the graph by index. Each slot keeps an insertion-ordered map of the users
//! it follows (with the follow timestamp) and an insertion-ordered set of its
//! followers; both are updated inside the same `&mut self` call, so the two
//! directions never disagree.

use super::event::FollowEvent;
use super::types::UserId;
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHashMap;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info};

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("User {0} not found")]
    UserNotFound(UserId),

    #[error("{follower} does not follow {followee}")]
    FollowNotFound { follower: UserId, followee: UserId },

    #[error("{follower} already follows {followee}")]
    AlreadyFollowing { follower: UserId, followee: UserId },
}

pub type GraphResult<T> = Result<T, GraphError>;

/// Aggregate counts over the whole graph
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphStatistics {
    pub user_count: usize,
    pub edge_count: usize,
    /// Unordered pairs that follow each other
    pub mutual_pairs: usize,
    pub max_followers: usize,
    pub average_following: f64,
}

/// One stored follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct FollowEdge {
    /// Unix millis
    pub(crate) at: i64,
    /// Graph-wide insertion counter; millisecond timestamps can tie
    pub(crate) order: u64,
}

/// In-memory directed "follows" graph
///
/// - slots: UserId -> slot
/// - users: slot -> UserId (None for a freed slot)
/// - outgoing: slot -> (followee slot -> edge)
/// - incoming: slot -> follower slots
#[derive(Debug, Default)]
pub struct FollowGraph {
    slots: FxHashMap<UserId, usize>,

    users: Vec<Option<UserId>>,

    outgoing: Vec<IndexMap<usize, FollowEdge>>,

    incoming: Vec<IndexSet<usize>>,

    /// Freed slots for reuse
    free_slots: Vec<usize>,

    user_count: usize,

    edge_count: usize,

    next_edge_order: u64,

    /// Follow event sender
    event_sender: Option<UnboundedSender<FollowEvent>>,
}

impl FollowGraph {
    /// Create a new empty graph
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a graph that publishes a [`FollowEvent`] after every successful mutation
    pub fn with_event_channel() -> (Self, UnboundedReceiver<FollowEvent>) {
        let (tx, rx) = unbounded_channel();
        let mut graph = Self::new();
        graph.event_sender = Some(tx);
        (graph, rx)
    }

    pub fn set_event_sender(&mut self, sender: Option<UnboundedSender<FollowEvent>>) {
        self.event_sender = sender;
    }

    fn emit(&self, event: FollowEvent) {
        if let Some(sender) = &self.event_sender {
            // A dropped receiver only means nobody listens for notifications
            let _ = sender.send(event);
        }
    }

    pub(crate) fn slot_of(&self, id: &UserId) -> Option<usize> {
        self.slots.get(id).copied()
    }

    pub(crate) fn user_at(&self, slot: usize) -> Option<&UserId> {
        self.users.get(slot).and_then(|u| u.as_ref())
    }

    pub(crate) fn slot_count(&self) -> usize {
        self.users.len()
    }

    pub(crate) fn following_slots(&self, slot: usize) -> Option<&IndexMap<usize, FollowEdge>> {
        self.outgoing.get(slot)
    }

    pub(crate) fn follower_slots(&self, slot: usize) -> Option<&IndexSet<usize>> {
        self.incoming.get(slot)
    }

    /// Slot for `id`, allocating one (reusing freed slots first) if unknown
    fn intern(&mut self, id: &UserId) -> usize {
        if let Some(slot) = self.slot_of(id) {
            return slot;
        }

        let slot = if let Some(slot) = self.free_slots.pop() {
            self.users[slot] = Some(id.clone());
            slot
        } else {
            self.users.push(Some(id.clone()));
            self.outgoing.push(IndexMap::new());
            self.incoming.push(IndexSet::new());
            self.users.len() - 1
        };

        self.slots.insert(id.clone(), slot);
        self.user_count += 1;
        slot
    }

    /// Make `id` a known user without any edges. Returns `true` if it was new.
    pub fn register_user(&mut self, id: &UserId) -> bool {
        if self.contains_user(id) {
            return false;
        }
        self.intern(id);
        debug!("Registered user {}", id);
        true
    }

    pub fn contains_user(&self, id: &UserId) -> bool {
        self.slots.contains_key(id)
    }

    pub fn user_count(&self) -> usize {
        self.user_count
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Insert the edge `from -> to` stamped with the current time.
    ///
    /// Returns `false` and leaves the graph untouched when the edge already
    /// exists or `from == to`.
    pub fn add_edge(&mut self, from: &UserId, to: &UserId) -> bool {
        self.add_edge_at(from, to, chrono::Utc::now().timestamp_millis())
    }

    /// Insert the edge `from -> to` with an explicit timestamp (Unix millis)
    pub fn add_edge_at(&mut self, from: &UserId, to: &UserId, at: i64) -> bool {
        if from == to || self.is_following(from, to) {
            return false;
        }

        let from_slot = self.intern(from);
        let to_slot = self.intern(to);
        let order = self.next_edge_order;
        self.next_edge_order += 1;
        self.outgoing[from_slot].insert(to_slot, FollowEdge { at, order });
        self.incoming[to_slot].insert(from_slot);
        self.edge_count += 1;

        debug!("{} -> {}", from, to);
        self.emit(FollowEvent::Followed {
            follower: from.clone(),
            followee: to.clone(),
            at,
        });
        true
    }

    /// Delete the edge `from -> to`. Returns `false` if it did not exist.
    pub fn remove_edge(&mut self, from: &UserId, to: &UserId) -> bool {
        let (Some(from_slot), Some(to_slot)) = (self.slot_of(from), self.slot_of(to)) else {
            return false;
        };
        if self.outgoing[from_slot].shift_remove(&to_slot).is_none() {
            return false;
        }
        self.incoming[to_slot].shift_remove(&from_slot);
        self.edge_count -= 1;

        debug!("{} -/-> {}", from, to);
        self.emit(FollowEvent::Unfollowed {
            follower: from.clone(),
            followee: to.clone(),
        });
        true
    }

    /// Why `follower -> followee` cannot be added, if anything
    pub fn check_follow(&self, follower: &UserId, followee: &UserId) -> GraphResult<()> {
        if follower == followee {
            return Err(GraphError::InvalidArgument(format!(
                "user {} cannot follow itself",
                follower
            )));
        }
        if self.is_following(follower, followee) {
            return Err(GraphError::AlreadyFollowing {
                follower: follower.clone(),
                followee: followee.clone(),
            });
        }
        Ok(())
    }

    /// Why `follower -> followee` cannot be removed, if anything
    pub fn check_unfollow(&self, follower: &UserId, followee: &UserId) -> GraphResult<()> {
        if !self.is_following(follower, followee) {
            return Err(GraphError::FollowNotFound {
                follower: follower.clone(),
                followee: followee.clone(),
            });
        }
        Ok(())
    }

    /// Checked follow: rejects self-follows and duplicates
    pub fn follow(&mut self, follower: &UserId, followee: &UserId) -> GraphResult<()> {
        self.check_follow(follower, followee)?;
        self.add_edge(follower, followee);
        Ok(())
    }

    /// Checked unfollow: fails if the relationship is absent
    pub fn unfollow(&mut self, follower: &UserId, followee: &UserId) -> GraphResult<()> {
        self.check_unfollow(follower, followee)?;
        self.remove_edge(follower, followee);
        Ok(())
    }

    /// Delete a user and every edge touching it
    pub fn remove_user(&mut self, id: &UserId) -> GraphResult<()> {
        let slot = self.slot_of(id).ok_or_else(|| GraphError::UserNotFound(id.clone()))?;

        let following = std::mem::take(&mut self.outgoing[slot]);
        let followers = std::mem::take(&mut self.incoming[slot]);

        for &followee in following.keys() {
            self.incoming[followee].shift_remove(&slot);
        }
        for &follower in &followers {
            self.outgoing[follower].shift_remove(&slot);
        }
        self.edge_count -= following.len() + followers.len();

        self.slots.remove(id);
        self.users[slot] = None;
        self.free_slots.push(slot);
        self.user_count -= 1;

        info!(
            "Removed user {} ({} following, {} followers)",
            id,
            following.len(),
            followers.len()
        );
        self.emit(FollowEvent::UserRemoved { id: id.clone() });
        Ok(())
    }

    /// Users `id` follows, in follow order. Empty for an unknown user.
    pub fn out_neighbors(&self, id: &UserId) -> Vec<UserId> {
        self.slot_of(id)
            .map(|slot| self.resolve(self.outgoing[slot].keys().copied()))
            .unwrap_or_default()
    }

    /// Users following `id`, in follow order. Empty for an unknown user.
    pub fn in_neighbors(&self, id: &UserId) -> Vec<UserId> {
        self.slot_of(id)
            .map(|slot| self.resolve(self.incoming[slot].iter().copied()))
            .unwrap_or_default()
    }

    pub fn following_count(&self, id: &UserId) -> usize {
        self.slot_of(id).map_or(0, |slot| self.outgoing[slot].len())
    }

    pub fn follower_count(&self, id: &UserId) -> usize {
        self.slot_of(id).map_or(0, |slot| self.incoming[slot].len())
    }

    /// When `follower` started following `followee` (Unix millis)
    pub fn followed_at(&self, follower: &UserId, followee: &UserId) -> Option<i64> {
        let from_slot = self.slot_of(follower)?;
        let to_slot = self.slot_of(followee)?;
        self.outgoing[from_slot].get(&to_slot).map(|edge| edge.at)
    }

    /// Page of known users in id order
    pub fn users(&self, skip: usize, limit: usize) -> Vec<UserId> {
        let mut ids: Vec<&UserId> = self.slots.keys().collect();
        ids.sort_unstable();
        ids.into_iter().skip(skip).take(limit).cloned().collect()
    }

    /// Every edge as (follower, followee, followed_at), oldest follow first.
    ///
    /// Re-adding the edges in this order rebuilds the same neighbor order on
    /// both sides of every user, since removals keep the relative order of
    /// the remaining neighbors.
    pub fn edges(&self) -> impl Iterator<Item = (&UserId, &UserId, i64)> + '_ {
        let mut edges: Vec<(u64, &UserId, &UserId, i64)> = self
            .outgoing
            .iter()
            .enumerate()
            .flat_map(move |(slot, following)| {
                following.iter().filter_map(move |(&to, edge)| {
                    Some((edge.order, self.user_at(slot)?, self.user_at(to)?, edge.at))
                })
            })
            .collect();
        edges.sort_unstable_by_key(|&(order, ..)| order);
        edges.into_iter().map(|(_, from, to, at)| (from, to, at))
    }

    pub fn statistics(&self) -> GraphStatistics {
        let mut mutual_pairs = 0;
        let mut max_followers = 0;
        for (slot, following) in self.outgoing.iter().enumerate() {
            max_followers = max_followers.max(self.incoming[slot].len());
            mutual_pairs += following
                .keys()
                .filter(|&&to| to > slot && self.outgoing[to].contains_key(&slot))
                .count();
        }

        GraphStatistics {
            user_count: self.user_count,
            edge_count: self.edge_count,
            mutual_pairs,
            max_followers,
            average_following: if self.user_count == 0 {
                0.0
            } else {
                self.edge_count as f64 / self.user_count as f64
            },
        }
    }

    pub(crate) fn resolve(&self, slots: impl IntoIterator<Item = usize>) -> Vec<UserId> {
        slots
            .into_iter()
            .filter_map(|slot| self.user_at(slot).cloned())
            .collect()
    }
}
