//! Shared engine: the follow graph behind a single-writer/multi-reader lock
//!
//! Mutations take the write guard, append to the WAL and only then touch
//! the graph, so log order always equals apply order. Queries share a read
//! guard and see one consistent snapshot.

use crate::algo::{ConnectionPath, Recommendation, ScoredUser};
use crate::config::{QueryLimits, ServerConfig};
use crate::graph::{FollowEvent, FollowGraph, GraphError, GraphStatistics, RelationshipStatus, UserId};
use crate::persistence::{PersistenceError, PersistenceManager};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};
use tokio::sync::{RwLock, RwLockReadGuard};
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Depth of the reach histogram when the caller does not ask for one
pub const DEFAULT_REACH_DEPTH: usize = 3;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error(transparent)]
    Graph(#[from] GraphError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),

    #[error("Query task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

pub type EngineResult<T> = Result<T, EngineError>;

/// Network statistics of one user plus its reach histogram
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    pub id: UserId,
    pub following: usize,
    pub followers: usize,
    pub second_degree: usize,
    /// Entry `k - 1`: users first reached after exactly `k` follow hops
    pub reach: Vec<usize>,
}

struct EngineState {
    graph: FollowGraph,
    persistence: Option<PersistenceManager>,
}

pub struct SocialGraphEngine {
    state: Arc<RwLock<EngineState>>,
    limits: QueryLimits,
}

impl SocialGraphEngine {
    /// In-memory engine without persistence
    pub fn new(limits: QueryLimits) -> Self {
        Self::from_graph(FollowGraph::new(), limits)
    }

    pub fn from_graph(graph: FollowGraph, limits: QueryLimits) -> Self {
        Self {
            state: Arc::new(RwLock::new(EngineState { graph, persistence: None })),
            limits,
        }
    }

    /// Build the engine described by `config`, replaying its WAL when a data path is set
    pub fn open(config: &ServerConfig) -> EngineResult<Self> {
        let Some(path) = &config.data_path else {
            info!("No data path configured, running in-memory only");
            return Ok(Self::new(config.limits));
        };

        let mut persistence = PersistenceManager::new(path)?;
        persistence.set_sync_mode(config.sync_wal);

        let mut graph = FollowGraph::new();
        persistence.recover(&mut graph)?;

        Ok(Self {
            state: Arc::new(RwLock::new(EngineState {
                graph,
                persistence: Some(persistence),
            })),
            limits: config.limits,
        })
    }

    pub fn limits(&self) -> &QueryLimits {
        &self.limits
    }

    /// Route follow events of all later mutations to the returned receiver
    pub async fn subscribe(&self) -> UnboundedReceiver<FollowEvent> {
        let (tx, rx) = unbounded_channel();
        self.state.write().await.graph.set_event_sender(Some(tx));
        rx
    }

    /// Read guard over the graph for multi-query snapshots
    pub async fn read(&self) -> RwLockReadGuard<'_, FollowGraph> {
        RwLockReadGuard::map(self.state.read().await, |state| &state.graph)
    }

    /// Run a whole-graph scan on the blocking pool, holding an owned read guard
    async fn scan<T, F>(&self, query: F) -> EngineResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&FollowGraph) -> T + Send + 'static,
    {
        let guard = Arc::clone(&self.state).read_owned().await;
        Ok(tokio::task::spawn_blocking(move || query(&guard.graph)).await?)
    }

    /// Follow `followee`, returning the follow timestamp (Unix millis)
    pub async fn follow(&self, follower: &UserId, followee: &UserId) -> EngineResult<i64> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        state.graph.check_follow(follower, followee)?;
        let at = chrono::Utc::now().timestamp_millis();
        if let Some(persistence) = state.persistence.as_mut() {
            persistence.persist_follow(follower, followee, at)?;
        }
        state.graph.add_edge_at(follower, followee, at);

        info!("{} followed {}", follower, followee);
        Ok(at)
    }

    pub async fn unfollow(&self, follower: &UserId, followee: &UserId) -> EngineResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        state.graph.check_unfollow(follower, followee)?;
        if let Some(persistence) = state.persistence.as_mut() {
            persistence.persist_unfollow(follower, followee)?;
        }
        state.graph.remove_edge(follower, followee);

        info!("{} unfollowed {}", follower, followee);
        Ok(())
    }

    /// Returns `false` if the user was already known
    pub async fn register_user(&self, id: &UserId) -> EngineResult<bool> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if state.graph.contains_user(id) {
            return Ok(false);
        }
        if let Some(persistence) = state.persistence.as_mut() {
            persistence.persist_register_user(id)?;
        }
        Ok(state.graph.register_user(id))
    }

    pub async fn remove_user(&self, id: &UserId) -> EngineResult<()> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;

        if !state.graph.contains_user(id) {
            return Err(GraphError::UserNotFound(id.clone()).into());
        }
        if let Some(persistence) = state.persistence.as_mut() {
            persistence.persist_remove_user(id)?;
        }
        state.graph.remove_user(id)?;
        Ok(())
    }

    /// Compact the WAL to the current graph. `None` when running in-memory.
    pub async fn checkpoint(&self) -> EngineResult<Option<u64>> {
        let mut guard = self.state.write().await;
        let state = &mut *guard;
        match state.persistence.as_mut() {
            Some(persistence) => Ok(Some(persistence.checkpoint(&state.graph)?)),
            None => Ok(None),
        }
    }

    pub async fn flush(&self) -> EngineResult<()> {
        if let Some(persistence) = self.state.write().await.persistence.as_mut() {
            persistence.flush()?;
        }
        Ok(())
    }

    pub async fn relationship_status(&self, a: &UserId, b: &UserId) -> RelationshipStatus {
        self.read().await.relationship_status(a, b)
    }

    pub async fn connection_path(
        &self,
        a: &UserId,
        b: &UserId,
        max_depth: Option<usize>,
    ) -> Option<ConnectionPath> {
        let depth = self.limits.path_depth(max_depth);
        self.read().await.connection_path(a, b, depth)
    }

    pub async fn mutual_connections(&self, a: &UserId, b: &UserId, limit: Option<usize>) -> Vec<UserId> {
        let limit = self.limits.mutual(limit);
        self.read().await.mutual_connections(a, b, limit)
    }

    /// The popular fallback ranks every user, so this runs on the blocking pool
    pub async fn recommendations(&self, user: &UserId, limit: Option<usize>) -> EngineResult<Vec<Recommendation>> {
        let limit = self.limits.limit(limit);
        let user = user.clone();
        self.scan(move |graph| graph.recommendations(&user, limit)).await
    }

    pub async fn trending_users(&self, limit: Option<usize>) -> EngineResult<Vec<ScoredUser>> {
        let limit = self.limits.limit(limit);
        self.scan(move |graph| graph.trending_users(limit)).await
    }

    pub async fn users(&self, skip: usize, limit: Option<usize>) -> Vec<UserId> {
        let limit = self.limits.limit(limit);
        self.read().await.users(skip, limit)
    }

    /// Stats of a known user; `UserNotFound` otherwise
    pub async fn user_stats(&self, id: &UserId, depth: Option<usize>) -> EngineResult<UserStats> {
        let depth = self.limits.path_depth(Some(depth.unwrap_or(DEFAULT_REACH_DEPTH)));
        let graph = self.read().await;
        Self::require_user(&graph, id)?;

        let stats = graph.stats(id);
        Ok(UserStats {
            id: id.clone(),
            following: stats.following,
            followers: stats.followers,
            second_degree: stats.second_degree,
            reach: graph.reach(id, depth),
        })
    }

    pub async fn followers(&self, id: &UserId) -> EngineResult<Vec<UserId>> {
        let graph = self.read().await;
        Self::require_user(&graph, id)?;
        Ok(graph.in_neighbors(id))
    }

    pub async fn following(&self, id: &UserId) -> EngineResult<Vec<UserId>> {
        let graph = self.read().await;
        Self::require_user(&graph, id)?;
        Ok(graph.out_neighbors(id))
    }

    pub async fn friends(&self, id: &UserId) -> EngineResult<Vec<UserId>> {
        let graph = self.read().await;
        Self::require_user(&graph, id)?;
        Ok(graph.friends(id))
    }

    pub async fn statistics(&self) -> GraphStatistics {
        self.read().await.statistics()
    }

    fn require_user(graph: &FollowGraph, id: &UserId) -> Result<(), GraphError> {
        if graph.contains_user(id) {
            Ok(())
        } else {
            Err(GraphError::UserNotFound(id.clone()))
        }
    }
}

/// Drain follow events and log them as notifications until every sender is gone
pub fn spawn_notification_sink(mut receiver: UnboundedReceiver<FollowEvent>) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!("Notification sink started");
        while let Some(event) = receiver.recv().await {
            match &event {
                FollowEvent::Followed { follower, followee, .. } => {
                    info!("Notify {}: {} started following you", followee, follower);
                }
                FollowEvent::Unfollowed { .. } | FollowEvent::UserRemoved { .. } => {
                    debug!("Follow event: {:?}", event);
                }
            }
        }
        info!("Notification sink stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn uid(s: &str) -> UserId {
        UserId::new(s)
    }

    #[tokio::test]
    async fn test_follow_and_query() {
        let engine = SocialGraphEngine::new(QueryLimits::default());
        engine.follow(&uid("a"), &uid("b")).await.unwrap();
        engine.follow(&uid("b"), &uid("c")).await.unwrap();

        assert_eq!(engine.relationship_status(&uid("a"), &uid("b")).await, RelationshipStatus::Following);
        let path = engine.connection_path(&uid("a"), &uid("c"), None).await.unwrap();
        assert_eq!(path.degrees, 2);

        let recs = engine.recommendations(&uid("a"), None).await.unwrap();
        assert_eq!(recs[0].id, uid("c"));
    }

    #[tokio::test]
    async fn test_checked_mutations() {
        let engine = SocialGraphEngine::new(QueryLimits::default());
        engine.follow(&uid("a"), &uid("b")).await.unwrap();

        assert!(matches!(
            engine.follow(&uid("a"), &uid("b")).await,
            Err(EngineError::Graph(GraphError::AlreadyFollowing { .. }))
        ));
        assert!(matches!(
            engine.follow(&uid("a"), &uid("a")).await,
            Err(EngineError::Graph(GraphError::InvalidArgument(_)))
        ));
        assert!(matches!(
            engine.unfollow(&uid("b"), &uid("a")).await,
            Err(EngineError::Graph(GraphError::FollowNotFound { .. }))
        ));
        assert!(matches!(
            engine.remove_user(&uid("ghost")).await,
            Err(EngineError::Graph(GraphError::UserNotFound(_)))
        ));
    }

    #[tokio::test]
    async fn test_user_stats_requires_known_user() {
        let engine = SocialGraphEngine::new(QueryLimits::default());
        engine.follow(&uid("a"), &uid("b")).await.unwrap();
        engine.follow(&uid("b"), &uid("c")).await.unwrap();

        let stats = engine.user_stats(&uid("a"), None).await.unwrap();
        assert_eq!(stats.following, 1);
        assert_eq!(stats.second_degree, 1);
        assert_eq!(stats.reach, vec![1, 1, 0]);

        assert!(engine.user_stats(&uid("ghost"), None).await.is_err());
        assert!(engine.followers(&uid("ghost")).await.is_err());
    }

    #[tokio::test]
    async fn test_limits_are_clamped() {
        let limits = QueryLimits { max_limit: 2, ..QueryLimits::default() };
        let engine = SocialGraphEngine::new(limits);
        for i in 0..5 {
            engine.follow(&uid(&format!("fan{}", i)), &uid("star")).await.unwrap();
        }

        assert_eq!(engine.trending_users(Some(50)).await.unwrap().len(), 2);
        assert_eq!(engine.users(0, Some(50)).await.len(), 2);
    }

    #[tokio::test]
    async fn test_events_reach_subscriber() {
        let engine = SocialGraphEngine::new(QueryLimits::default());
        let mut rx = engine.subscribe().await;

        engine.follow(&uid("a"), &uid("b")).await.unwrap();
        match rx.recv().await.unwrap() {
            FollowEvent::Followed { follower, followee, .. } => {
                assert_eq!(follower, uid("a"));
                assert_eq!(followee, uid("b"));
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_writers_and_readers() {
        let engine = Arc::new(SocialGraphEngine::new(QueryLimits::default()));
        let mut tasks = Vec::new();

        // Each writer owns its own follower, so the final edge set is known
        for w in 0..8 {
            let engine = Arc::clone(&engine);
            tasks.push(tokio::spawn(async move {
                let follower = uid(&format!("w{}", w));
                for i in 0..20 {
                    engine.follow(&follower, &uid(&format!("t{}", i))).await.unwrap();
                }
                for i in (0..20).filter(|i| i % 2 == 0) {
                    engine.unfollow(&follower, &uid(&format!("t{}", i))).await.unwrap();
                }
            }));
        }
        for r in 0..4 {
            let engine = Arc::clone(&engine);
            tasks.push(tokio::spawn(async move {
                for i in 0..50 {
                    let from = uid(&format!("w{}", (r + i) % 8));
                    if let Some(path) = engine.connection_path(&from, &uid("t1"), None).await {
                        assert_eq!(path.degrees + 1, path.path.len());
                    }
                    let trending = engine.trending_users(Some(5)).await.unwrap();
                    assert!(trending.windows(2).all(|w| w[0].score >= w[1].score));
                    engine.recommendations(&from, None).await.unwrap();
                }
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let graph = engine.read().await;
        assert_eq!(graph.edge_count(), 8 * 10);
        for w in 0..8 {
            let follower = uid(&format!("w{}", w));
            let expected: Vec<UserId> = (0..20).filter(|i| i % 2 == 1).map(|i| uid(&format!("t{}", i))).collect();
            assert_eq!(graph.out_neighbors(&follower), expected);
        }

        let users = graph.users(0, usize::MAX);
        let mut mirrored = 0;
        for user in &users {
            for followee in graph.out_neighbors(user) {
                assert!(graph.in_neighbors(&followee).contains(user));
            }
            for follower in graph.in_neighbors(user) {
                assert!(graph.out_neighbors(&follower).contains(user));
                mirrored += 1;
            }
        }
        assert_eq!(mirrored, graph.edge_count());
    }

    #[tokio::test]
    async fn test_open_replays_wal() {
        let temp_dir = TempDir::new().unwrap();
        let config = ServerConfig {
            data_path: Some(temp_dir.path().to_string_lossy().into_owned()),
            ..ServerConfig::default()
        };

        {
            let engine = SocialGraphEngine::open(&config).unwrap();
            engine.follow(&uid("a"), &uid("b")).await.unwrap();
            engine.follow(&uid("b"), &uid("a")).await.unwrap();
            engine.register_user(&uid("c")).await.unwrap();
            engine.unfollow(&uid("b"), &uid("a")).await.unwrap();
            // Rejected mutations never reach the log
            assert!(engine.follow(&uid("a"), &uid("b")).await.is_err());
            engine.flush().await.unwrap();
        }

        let engine = SocialGraphEngine::open(&config).unwrap();
        let stats = engine.statistics().await;
        assert_eq!(stats.user_count, 3);
        assert_eq!(stats.edge_count, 1);
        assert_eq!(engine.following(&uid("a")).await.unwrap(), vec![uid("b")]);
    }
}
