//! Repository for the `record_locks` table.

use editlock_core::record::LockRecord;
use editlock_core::target::LockTarget;
use editlock_core::types::{DbId, Timestamp};
use sqlx::PgPool;

use crate::models::record_lock::RecordLock;

/// Column list for `record_locks` queries.
const COLUMNS: &str = "id, entity_type, entity_id, locked_by, locked_by_name, \
                       locked_at, hard_lock, version, created_at, updated_at";

/// Provides conditional reads and writes for record locks.
pub struct RecordLockRepo;

impl RecordLockRepo {
    /// Find the lock row for a target, held or dormant.
    pub async fn find(pool: &PgPool, target: &LockTarget) -> Result<Option<RecordLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM record_locks WHERE entity_type = $1 AND entity_id = $2"
        );
        sqlx::query_as::<_, RecordLock>(&query)
            .bind(&target.entity_type)
            .bind(target.entity_id)
            .fetch_optional(pool)
            .await
    }

    /// Insert the first row for a target.
    ///
    /// `ON CONFLICT DO NOTHING` against `uq_record_locks_target` makes this
    /// the atomic "first acquire": if another writer inserted first, `None`
    /// is returned. The version is drawn from `record_lock_versions`.
    pub async fn insert(pool: &PgPool, record: &LockRecord) -> Result<Option<RecordLock>, sqlx::Error> {
        let query = format!(
            "INSERT INTO record_locks \
                 (entity_type, entity_id, locked_by, locked_by_name, locked_at, hard_lock) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (entity_type, entity_id) DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecordLock>(&query)
            .bind(&record.target.entity_type)
            .bind(record.target.entity_id)
            .bind(record.owner())
            .bind(record.owner_name())
            .bind(record.acquired_at())
            .bind(record.is_hard())
            .fetch_optional(pool)
            .await
    }

    /// Replace holder and mode if the stored version still equals
    /// `record.version`. Returns `None` if the row changed underneath us.
    pub async fn update_if_version(
        pool: &PgPool,
        record: &LockRecord,
    ) -> Result<Option<RecordLock>, sqlx::Error> {
        let query = format!(
            "UPDATE record_locks SET \
                 locked_by = $3, locked_by_name = $4, locked_at = $5, hard_lock = $6, \
                 version = nextval('record_lock_versions'), updated_at = NOW() \
             WHERE entity_type = $1 AND entity_id = $2 AND version = $7 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, RecordLock>(&query)
            .bind(&record.target.entity_type)
            .bind(record.target.entity_id)
            .bind(record.owner())
            .bind(record.owner_name())
            .bind(record.acquired_at())
            .bind(record.is_hard())
            .bind(record.version)
            .fetch_optional(pool)
            .await
    }

    /// Delete the row for a target. Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, target: &LockTarget) -> Result<bool, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM record_locks WHERE entity_type = $1 AND entity_id = $2")
                .bind(&target.entity_type)
                .bind(target.entity_id)
                .execute(pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Rows held by `user_id` and acquired after `acquired_after`, newest first.
    pub async fn list_held_by(
        pool: &PgPool,
        user_id: DbId,
        acquired_after: Timestamp,
    ) -> Result<Vec<RecordLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM record_locks \
             WHERE locked_by = $1 AND locked_at > $2 \
             ORDER BY locked_at DESC, entity_type, entity_id"
        );
        sqlx::query_as::<_, RecordLock>(&query)
            .bind(user_id)
            .bind(acquired_after)
            .fetch_all(pool)
            .await
    }

    /// All rows acquired after `acquired_after`, newest first.
    pub async fn list_acquired_after(
        pool: &PgPool,
        acquired_after: Timestamp,
    ) -> Result<Vec<RecordLock>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM record_locks \
             WHERE locked_at > $1 \
             ORDER BY locked_at DESC, entity_type, entity_id"
        );
        sqlx::query_as::<_, RecordLock>(&query)
            .bind(acquired_after)
            .fetch_all(pool)
            .await
    }

    /// Delete released rows and rows acquired at or before `acquired_before`.
    /// Returns the number of rows removed.
    pub async fn delete_dormant(pool: &PgPool, acquired_before: Timestamp) -> Result<u64, sqlx::Error> {
        let result =
            sqlx::query("DELETE FROM record_locks WHERE locked_at IS NULL OR locked_at <= $1")
                .bind(acquired_before)
                .execute(pool)
                .await?;
        Ok(result.rows_affected())
    }
}
