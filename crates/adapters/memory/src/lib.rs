//! # bStat Memory Adapter
//!
//! An in-memory footstep store and a static context provider, primarily
//! intended for testing and for embedding the recorder where no analytics
//! backend is available.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bstat_adapter_memory::{MemoryStore, StaticContext};
//! use bstat_core::FootstepRecorder;
//!
//! let store = Arc::new(MemoryStore::new());
//! let context = Arc::new(StaticContext::new(1, "session-1"));
//! let recorder = FootstepRecorder::new(store.clone(), context);
//! ```

mod context;

pub use context::StaticContext;

use async_trait::async_trait;
use bstat_core::{BackingStore, FootstepRecord, RecordId, StoreError, StoreResult, StoredFootstep};
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory append-only footstep store.
///
/// Each insert is a single push under the write lock, so a record is either
/// fully visible or absent. Data is lost when the process exits.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    footsteps: Arc<RwLock<Vec<StoredFootstep>>>,
    failure: Arc<RwLock<Option<String>>>,
}

impl MemoryStore {
    /// Creates a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent insert fail with a connection error.
    pub async fn fail_inserts(&self, reason: impl Into<String>) {
        *self.failure.write().await = Some(reason.into());
    }

    /// Stops failing inserts.
    pub async fn recover(&self) {
        *self.failure.write().await = None;
    }

    /// Returns the number of stored footsteps.
    pub async fn len(&self) -> usize {
        self.footsteps.read().await.len()
    }

    /// Returns true if nothing has been stored.
    pub async fn is_empty(&self) -> bool {
        self.footsteps.read().await.is_empty()
    }

    /// Returns all stored footsteps in insertion order.
    pub async fn footsteps(&self) -> Vec<StoredFootstep> {
        self.footsteps.read().await.clone()
    }

    /// Returns the stored footstep with the given id.
    pub async fn get(&self, id: &RecordId) -> Option<StoredFootstep> {
        let footsteps = self.footsteps.read().await;
        footsteps.iter().find(|f| &f.id == id).cloned()
    }

    /// Returns the records stored for an action.
    pub async fn by_action(&self, action: &str) -> Vec<FootstepRecord> {
        let footsteps = self.footsteps.read().await;
        footsteps
            .iter()
            .filter(|f| f.record.action() == action)
            .map(|f| f.record.clone())
            .collect()
    }

    /// Clears all stored footsteps.
    pub async fn clear(&self) {
        self.footsteps.write().await.clear();
    }
}

#[async_trait]
impl BackingStore for MemoryStore {
    async fn insert(&self, record: &FootstepRecord) -> StoreResult<RecordId> {
        if let Some(reason) = self.failure.read().await.as_ref() {
            return Err(StoreError::Connection(reason.clone()));
        }

        let stored = StoredFootstep::new(record.clone());
        let id = stored.id;
        self.footsteps.write().await.push(stored);

        Ok(id)
    }
}
