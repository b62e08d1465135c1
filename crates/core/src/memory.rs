//! In-process implementations of the store contracts.
//!
//! Used by tests and single-instance deployments. The conditional write is
//! performed under the map's write lock, which gives the same
//! "exactly one first acquire wins" guarantee as the database backend.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::error::StoreError;
use crate::record::LockRecord;
use crate::store::{LockStore, TargetResolver};
use crate::target::LockTarget;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// InMemoryLockStore
// ---------------------------------------------------------------------------

/// Lock records kept in a `HashMap` behind a tokio `RwLock`.
///
/// Versions come from one store-wide counter, so a target that is deleted
/// and recreated never reuses a version a stale writer may still hold.
#[derive(Debug, Default)]
pub struct InMemoryLockStore {
    records: RwLock<HashMap<LockTarget, LockRecord>>,
    last_version: AtomicI64,
}

impl InMemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records, held or dormant.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

fn newest_first(mut records: Vec<LockRecord>) -> Vec<LockRecord> {
    records.sort_by(|a, b| {
        b.acquired_at()
            .cmp(&a.acquired_at())
            .then_with(|| a.target.entity_type.cmp(&b.target.entity_type))
            .then_with(|| a.target.entity_id.cmp(&b.target.entity_id))
    });
    records
}

#[async_trait]
impl LockStore for InMemoryLockStore {
    async fn find(&self, target: &LockTarget) -> Result<Option<LockRecord>, StoreError> {
        Ok(self.records.read().await.get(target).cloned())
    }

    async fn upsert(&self, record: &LockRecord) -> Result<Option<LockRecord>, StoreError> {
        let mut records = self.records.write().await;
        let current_version = records.get(&record.target).map(|r| r.version);

        let expected = if record.version == 0 {
            None
        } else {
            Some(record.version)
        };
        if current_version != expected {
            return Ok(None);
        }

        let mut stored = record.clone();
        stored.version = self.last_version.fetch_add(1, Ordering::Relaxed) + 1;
        records.insert(stored.target.clone(), stored.clone());
        Ok(Some(stored))
    }

    async fn delete(&self, target: &LockTarget) -> Result<bool, StoreError> {
        Ok(self.records.write().await.remove(target).is_some())
    }

    async fn find_all_active_for(
        &self,
        user_id: DbId,
        acquired_after: Timestamp,
    ) -> Result<Vec<LockRecord>, StoreError> {
        let records = self.records.read().await;
        let held = records
            .values()
            .filter(|r| {
                r.holder
                    .as_ref()
                    .is_some_and(|h| h.user_id == user_id && h.acquired_at > acquired_after)
            })
            .cloned()
            .collect();
        Ok(newest_first(held))
    }

    async fn find_all_active(
        &self,
        acquired_after: Timestamp,
    ) -> Result<Vec<LockRecord>, StoreError> {
        let records = self.records.read().await;
        let held = records
            .values()
            .filter(|r| r.acquired_at().is_some_and(|at| at > acquired_after))
            .cloned()
            .collect();
        Ok(newest_first(held))
    }

    async fn delete_dormant(&self, acquired_before: Timestamp) -> Result<u64, StoreError> {
        let mut records = self.records.write().await;
        let before = records.len();
        records.retain(|_, r| r.acquired_at().is_some_and(|at| at > acquired_before));
        Ok((before - records.len()) as u64)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// InMemoryTargets
// ---------------------------------------------------------------------------

/// Which lockable records exist, for deployments without a record database.
#[derive(Debug, Default)]
pub enum InMemoryTargets {
    /// Every well-formed target exists.
    #[default]
    Any,
    /// Only the listed targets exist.
    Known(HashSet<LockTarget>),
}

impl InMemoryTargets {
    pub fn known(targets: impl IntoIterator<Item = LockTarget>) -> Self {
        Self::Known(targets.into_iter().collect())
    }
}

#[async_trait]
impl TargetResolver for InMemoryTargets {
    async fn exists(&self, target: &LockTarget) -> Result<bool, StoreError> {
        match self {
            Self::Any => Ok(true),
            Self::Known(set) => Ok(set.contains(target)),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
