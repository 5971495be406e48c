//! Persistence layer for the follow graph
//!
//! Mutations are appended to the write-ahead log before they touch the
//! in-memory graph; on startup the log is replayed into an empty graph.

pub mod wal;

pub use wal::{Wal, WalEntry, WalError, WalResult};

use crate::graph::{FollowGraph, GraphError, UserId};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Durable log of follow-graph mutations
pub struct PersistenceManager {
    /// Base path for all data
    base_path: PathBuf,
    /// Write-Ahead Log
    wal: Wal,
}

impl PersistenceManager {
    /// Open the data directory, creating `<base>/wal` if needed
    pub fn new(base_path: impl AsRef<Path>) -> PersistenceResult<Self> {
        let base_path = base_path.as_ref().to_path_buf();
        let wal_path = base_path.join("wal");
        std::fs::create_dir_all(&wal_path)?;

        info!("Initializing persistence manager at: {:?}", base_path);
        let wal = Wal::new(&wal_path)?;

        Ok(Self { base_path, wal })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Flush and fsync after every append
    pub fn set_sync_mode(&mut self, sync: bool) {
        self.wal.set_sync_mode(sync);
    }

    /// Replay the log into `graph`, returning the number of entries applied.
    ///
    /// Entries that no longer apply (removing an absent edge, say) are
    /// skipped with a warning rather than aborting recovery.
    pub fn recover(&self, graph: &mut FollowGraph) -> PersistenceResult<usize> {
        info!("Starting recovery from {:?}", self.base_path);
        let mut applied = 0usize;

        self.wal.replay(0, |entry| {
            let ok = match entry {
                WalEntry::Follow { follower, followee, at } => {
                    graph.add_edge_at(&UserId::new(follower.as_str()), &UserId::new(followee.as_str()), *at)
                }
                WalEntry::Unfollow { follower, followee } => {
                    graph.remove_edge(&UserId::new(follower.as_str()), &UserId::new(followee.as_str()))
                }
                WalEntry::RegisterUser { id } => graph.register_user(&UserId::new(id.as_str())),
                WalEntry::RemoveUser { id } => graph.remove_user(&UserId::new(id.as_str())).is_ok(),
            };
            if ok {
                applied += 1;
            } else {
                warn!("Skipping WAL entry with no effect: {:?}", entry);
            }
            Ok(())
        })?;

        info!(
            "Recovered {} users and {} follows ({} entries)",
            graph.user_count(),
            graph.edge_count(),
            applied
        );
        Ok(applied)
    }

    pub fn persist_follow(&mut self, follower: &UserId, followee: &UserId, at: i64) -> PersistenceResult<()> {
        self.wal.append(WalEntry::Follow {
            follower: follower.as_str().to_string(),
            followee: followee.as_str().to_string(),
            at,
        })?;
        Ok(())
    }

    pub fn persist_unfollow(&mut self, follower: &UserId, followee: &UserId) -> PersistenceResult<()> {
        self.wal.append(WalEntry::Unfollow {
            follower: follower.as_str().to_string(),
            followee: followee.as_str().to_string(),
        })?;
        Ok(())
    }

    pub fn persist_register_user(&mut self, id: &UserId) -> PersistenceResult<()> {
        self.wal.append(WalEntry::RegisterUser { id: id.as_str().to_string() })?;
        Ok(())
    }

    pub fn persist_remove_user(&mut self, id: &UserId) -> PersistenceResult<()> {
        self.wal.append(WalEntry::RemoveUser { id: id.as_str().to_string() })?;
        Ok(())
    }

    /// Rewrite the log as the minimal set of entries that rebuilds `graph`.
    ///
    /// Follows are written oldest first so replay restores every neighbor
    /// list in its original order.
    pub fn checkpoint(&mut self, graph: &FollowGraph) -> PersistenceResult<u64> {
        info!("Creating checkpoint");

        // Users without edges would otherwise vanish on replay
        let isolated = graph
            .users(0, usize::MAX)
            .into_iter()
            .filter(|id| graph.following_count(id) == 0 && graph.follower_count(id) == 0)
            .map(|id| WalEntry::RegisterUser { id: id.as_str().to_string() });
        let follows = graph.edges().map(|(follower, followee, at)| WalEntry::Follow {
            follower: follower.as_str().to_string(),
            followee: followee.as_str().to_string(),
            at,
        });
        let entries: Vec<WalEntry> = isolated.chain(follows).collect();

        let sequence = self.wal.compact(entries)?;
        info!("Checkpoint created at sequence {}", sequence);
        Ok(sequence)
    }

    /// Flush all pending writes
    pub fn flush(&mut self) -> PersistenceResult<()> {
        self.wal.flush()?;
        Ok(())
    }
}

/// Persistence errors
#[derive(Debug, thiserror::Error)]
pub enum PersistenceError {
    #[error("WAL error: {0}")]
    Wal(#[from] WalError),

    #[error("Graph error: {0}")]
    Graph(#[from] GraphError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type PersistenceResult<T> = Result<T, PersistenceError>;
