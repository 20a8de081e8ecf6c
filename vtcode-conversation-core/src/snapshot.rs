//! Snapshot Lifecycle (spec §4.8, component J): durable, restorable,
//! write-once dumps of conversation state. Grounded on the
//! `SnapshotStore` trait split (in-memory for tests, filesystem-JSON for
//! production) specified in `SPEC_FULL.md` §3.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use uuid::Uuid;

use crate::checkpoints::Checkpoint;
use crate::goals::Goal;
use crate::message::Message;
use crate::prompts::Mode;
use crate::size::ContextTier;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotReason {
    Manual,
    PreCompression,
    Emergency,
    Rollover,
}

/// A complete, immutable dump of conversation state (spec §3, "Snapshot").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: Uuid,
    pub messages: Vec<Message>,
    pub checkpoints: Vec<Checkpoint>,
    pub active_goal: Option<Goal>,
    pub tier: ContextTier,
    pub mode: Mode,
    pub user_size: u32,
    pub reason: SnapshotReason,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot {0} not found")]
    NotFound(Uuid),
    #[error("storage error: {0}")]
    Storage(String),
}

/// Pruning policy for [`SnapshotStore::prune`]; the policy is caller-supplied
/// per spec §4.8.
pub enum PrunePolicy {
    KeepNewest(usize),
    OlderThan(DateTime<Utc>),
}

/// The Snapshot Lifecycle contract (spec §4.8). Storage backend is the
/// caller's choice; snapshots are write-once.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    async fn create(&self, snapshot: Snapshot) -> Result<Uuid, SnapshotError>;
    async fn restore(&self, id: Uuid) -> Result<Snapshot, SnapshotError>;
    async fn list(&self) -> Result<Vec<Uuid>, SnapshotError>;
    async fn delete(&self, id: Uuid) -> Result<(), SnapshotError>;
    async fn prune(&self, policy: PrunePolicy) -> Result<usize, SnapshotError>;
}

/// In-memory store: single writer enforced via an internal mutex, matching
/// the "single writer at a time" resource policy (spec §5).
#[derive(Default)]
pub struct InMemorySnapshotStore {
    snapshots: tokio::sync::Mutex<HashMap<Uuid, Snapshot>>,
}

impl InMemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SnapshotStore for InMemorySnapshotStore {
    async fn create(&self, snapshot: Snapshot) -> Result<Uuid, SnapshotError> {
        let id = snapshot.id;
        let mut guard = self.snapshots.lock().await;
        guard.insert(id, snapshot);
        Ok(id)
    }

    async fn restore(&self, id: Uuid) -> Result<Snapshot, SnapshotError> {
        let guard = self.snapshots.lock().await;
        guard.get(&id).cloned().ok_or(SnapshotError::NotFound(id))
    }

    async fn list(&self) -> Result<Vec<Uuid>, SnapshotError> {
        let guard = self.snapshots.lock().await;
        Ok(guard.keys().copied().collect())
    }

    async fn delete(&self, id: Uuid) -> Result<(), SnapshotError> {
        let mut guard = self.snapshots.lock().await;
        guard.remove(&id).ok_or(SnapshotError::NotFound(id))?;
        Ok(())
    }

    async fn prune(&self, policy: PrunePolicy) -> Result<usize, SnapshotError> {
        let mut guard = self.snapshots.lock().await;
        let before = guard.len();
        match policy {
            PrunePolicy::KeepNewest(n) => {
                let mut ids: Vec<(Uuid, DateTime<Utc>)> = guard.iter().map(|(id, s)| (*id, s.created_at)).collect();
                ids.sort_by_key(|(_, created_at)| std::cmp::Reverse(*created_at));
                for (id, _) in ids.into_iter().skip(n) {
                    guard.remove(&id);
                }
            }
            PrunePolicy::OlderThan(cutoff) => {
                guard.retain(|_, snapshot| snapshot.created_at >= cutoff);
            }
        }
        Ok(before - guard.len())
    }
}

/// Filesystem-JSON store: one file per snapshot, content-addressed by id
/// (spec §6.4).
pub struct FileSnapshotStore {
    root: std::path::PathBuf,
    write_lock: tokio::sync::Mutex<()>,
}

impl FileSnapshotStore {
    pub fn new(root: impl Into<std::path::PathBuf>) -> Self {
        Self { root: root.into(), write_lock: tokio::sync::Mutex::new(()) }
    }

    fn path_for(&self, id: Uuid) -> std::path::PathBuf {
        self.root.join(format!("{id}.json"))
    }
}

#[async_trait]
impl SnapshotStore for FileSnapshotStore {
    async fn create(&self, snapshot: Snapshot) -> Result<Uuid, SnapshotError> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::create_dir_all(&self.root).await.map_err(|e| SnapshotError::Storage(e.to_string()))?;
        let id = snapshot.id;
        let json = serde_json::to_vec_pretty(&snapshot).map_err(|e| SnapshotError::Storage(e.to_string()))?;
        tokio::fs::write(self.path_for(id), json).await.map_err(|e| SnapshotError::Storage(e.to_string()))?;
        Ok(id)
    }

    async fn restore(&self, id: Uuid) -> Result<Snapshot, SnapshotError> {
        let bytes = tokio::fs::read(self.path_for(id)).await.map_err(|_| SnapshotError::NotFound(id))?;
        serde_json::from_slice(&bytes).map_err(|e| SnapshotError::Storage(e.to_string()))
    }

    async fn list(&self) -> Result<Vec<Uuid>, SnapshotError> {
        let mut ids = Vec::new();
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(_) => return Ok(ids),
        };
        while let Ok(Some(entry)) = entries.next_entry().await {
            if let Some(stem) = entry.path().file_stem().and_then(|s| s.to_str()) {
                if let Ok(id) = Uuid::parse_str(stem) {
                    ids.push(id);
                }
            }
        }
        Ok(ids)
    }

    async fn delete(&self, id: Uuid) -> Result<(), SnapshotError> {
        let _guard = self.write_lock.lock().await;
        tokio::fs::remove_file(self.path_for(id)).await.map_err(|_| SnapshotError::NotFound(id))
    }

    async fn prune(&self, policy: PrunePolicy) -> Result<usize, SnapshotError> {
        let ids = self.list().await?;
        let mut removed = 0;
        match policy {
            PrunePolicy::KeepNewest(n) => {
                let mut with_times = Vec::new();
                for id in ids {
                    if let Ok(snapshot) = self.restore(id).await {
                        with_times.push((id, snapshot.created_at));
                    }
                }
                with_times.sort_by_key(|(_, created_at)| std::cmp::Reverse(*created_at));
                for (id, _) in with_times.into_iter().skip(n) {
                    if self.delete(id).await.is_ok() {
                        removed += 1;
                    }
                }
            }
            PrunePolicy::OlderThan(cutoff) => {
                for id in ids {
                    if let Ok(snapshot) = self.restore(id).await {
                        if snapshot.created_at < cutoff && self.delete(id).await.is_ok() {
                            removed += 1;
                        }
                    }
                }
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_snapshot() -> Snapshot {
        Snapshot {
            id: Uuid::new_v4(),
            messages: vec![Message::user("hi")],
            checkpoints: vec![],
            active_goal: None,
            tier: ContextTier::T3Standard,
            mode: Mode::Developer,
            user_size: 16384,
            reason: SnapshotReason::Manual,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn restore_returns_an_atomic_copy() {
        let store = InMemorySnapshotStore::new();
        let snapshot = sample_snapshot();
        let id = store.create(snapshot.clone()).await.unwrap();
        let restored = store.restore(id).await.unwrap();
        assert_eq!(restored.user_size, snapshot.user_size);
    }

    #[tokio::test]
    async fn restoring_unknown_id_fails_without_mutating_state() {
        let store = InMemorySnapshotStore::new();
        let result = store.restore(Uuid::new_v4()).await;
        assert!(matches!(result, Err(SnapshotError::NotFound(_))));
    }

    #[tokio::test]
    async fn prune_keep_newest_retains_only_the_requested_count() {
        let store = InMemorySnapshotStore::new();
        for _ in 0..5 {
            store.create(sample_snapshot()).await.unwrap();
        }
        let removed = store.prune(PrunePolicy::KeepNewest(2)).await.unwrap();
        assert_eq!(removed, 3);
        assert_eq!(store.list().await.unwrap().len(), 2);
    }
}
