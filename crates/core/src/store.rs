//! Persistence contracts consumed by the lock engine.
//!
//! The engine never touches a database directly. It reads and writes
//! [`LockRecord`]s through a [`LockStore`] and asks a [`TargetResolver`]
//! whether the record being locked exists at all.

use async_trait::async_trait;

use crate::error::StoreError;
use crate::record::LockRecord;
use crate::target::LockTarget;
use crate::types::{DbId, Timestamp};

/// Storage for lock records, keyed by [`LockTarget`].
///
/// Implementations must give read-your-writes consistency and make
/// [`upsert`](LockStore::upsert) atomic: two writers presenting the same
/// `version` can never both succeed. Versions must never repeat for a
/// target, even after its record is deleted and recreated.
#[async_trait]
pub trait LockStore: Send + Sync {
    /// Fetch the record for `target`, held or dormant.
    async fn find(&self, target: &LockTarget) -> Result<Option<LockRecord>, StoreError>;

    /// Conditionally write `record`.
    ///
    /// With `version == 0` the record is inserted only if no record exists
    /// for its target. Otherwise the stored record is replaced only if its
    /// version still equals `record.version`. Returns the stored record with
    /// a new, never-before-used version, or `None` if another writer got
    /// there first.
    async fn upsert(&self, record: &LockRecord) -> Result<Option<LockRecord>, StoreError>;

    /// Remove the record for `target`. Returns `true` if one existed.
    async fn delete(&self, target: &LockTarget) -> Result<bool, StoreError>;

    /// Records held by `user_id` that were acquired strictly after
    /// `acquired_after`, i.e. that are still active.
    async fn find_all_active_for(
        &self,
        user_id: DbId,
        acquired_after: Timestamp,
    ) -> Result<Vec<LockRecord>, StoreError>;

    /// All records acquired strictly after `acquired_after`.
    async fn find_all_active(&self, acquired_after: Timestamp)
        -> Result<Vec<LockRecord>, StoreError>;

    /// Delete unheld records and records acquired at or before
    /// `acquired_before`. Returns the number removed.
    async fn delete_dormant(&self, acquired_before: Timestamp) -> Result<u64, StoreError>;

    /// Verify the backing store is reachable.
    async fn ping(&self) -> Result<(), StoreError>;
}

/// Existence check for the records that locks protect.
#[async_trait]
pub trait TargetResolver: Send + Sync {
    async fn exists(&self, target: &LockTarget) -> Result<bool, StoreError>;
}
