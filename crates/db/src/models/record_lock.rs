//! Record lock row model (`record_locks` table).

use editlock_core::record::{LockHolder, LockMode, LockRecord};
use editlock_core::target::LockTarget;
use editlock_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `record_locks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct RecordLock {
    pub id: DbId,
    pub entity_type: String,
    pub entity_id: DbId,
    pub locked_by: Option<DbId>,
    pub locked_by_name: Option<String>,
    pub locked_at: Option<Timestamp>,
    pub hard_lock: bool,
    pub version: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl From<RecordLock> for LockRecord {
    fn from(row: RecordLock) -> Self {
        // `ck_record_locks_holder_pairing` keeps locked_by and locked_at in step.
        let holder = match (row.locked_by, row.locked_at) {
            (Some(user_id), Some(acquired_at)) => Some(LockHolder {
                user_id,
                display_name: row.locked_by_name,
                acquired_at,
            }),
            _ => None,
        };
        LockRecord {
            target: LockTarget {
                entity_type: row.entity_type,
                entity_id: row.entity_id,
            },
            holder,
            mode: LockMode::from_hard_flag(row.hard_lock),
            version: row.version,
        }
    }
}
