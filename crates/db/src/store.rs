//! [`LockStore`] backed by the `record_locks` table.

use async_trait::async_trait;
use editlock_core::error::StoreError;
use editlock_core::record::LockRecord;
use editlock_core::store::LockStore;
use editlock_core::target::LockTarget;
use editlock_core::types::{DbId, Timestamp};

use crate::repositories::RecordLockRepo;
use crate::DbPool;

/// PostgreSQL lock store. Cheap to clone (the pool is reference-counted).
#[derive(Debug, Clone)]
pub struct PgLockStore {
    pool: DbPool,
}

impl PgLockStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &DbPool {
        &self.pool
    }
}

fn store_err(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |err| {
        tracing::error!(error = %err, context, "Lock store query failed");
        StoreError::backend(context, err)
    }
}

#[async_trait]
impl LockStore for PgLockStore {
    async fn find(&self, target: &LockTarget) -> Result<Option<LockRecord>, StoreError> {
        let row = RecordLockRepo::find(&self.pool, target)
            .await
            .map_err(store_err("find lock"))?;
        Ok(row.map(LockRecord::from))
    }

    async fn upsert(&self, record: &LockRecord) -> Result<Option<LockRecord>, StoreError> {
        let row = if record.version == 0 {
            RecordLockRepo::insert(&self.pool, record)
                .await
                .map_err(store_err("insert lock"))?
        } else {
            RecordLockRepo::update_if_version(&self.pool, record)
                .await
                .map_err(store_err("update lock"))?
        };
        Ok(row.map(LockRecord::from))
    }

    async fn delete(&self, target: &LockTarget) -> Result<bool, StoreError> {
        RecordLockRepo::delete(&self.pool, target)
            .await
            .map_err(store_err("delete lock"))
    }

    async fn find_all_active_for(
        &self,
        user_id: DbId,
        acquired_after: Timestamp,
    ) -> Result<Vec<LockRecord>, StoreError> {
        let rows = RecordLockRepo::list_held_by(&self.pool, user_id, acquired_after)
            .await
            .map_err(store_err("list locks for user"))?;
        Ok(rows.into_iter().map(LockRecord::from).collect())
    }

    async fn find_all_active(
        &self,
        acquired_after: Timestamp,
    ) -> Result<Vec<LockRecord>, StoreError> {
        let rows = RecordLockRepo::list_acquired_after(&self.pool, acquired_after)
            .await
            .map_err(store_err("list active locks"))?;
        Ok(rows.into_iter().map(LockRecord::from).collect())
    }

    async fn delete_dormant(&self, acquired_before: Timestamp) -> Result<u64, StoreError> {
        RecordLockRepo::delete_dormant(&self.pool, acquired_before)
            .await
            .map_err(store_err("delete dormant locks"))
    }

    async fn ping(&self) -> Result<(), StoreError> {
        crate::health_check(&self.pool)
            .await
            .map_err(store_err("health check"))
    }
}
