//! The lock lifecycle engine.
//!
//! Every state change is a read-check-write sequence against the
//! [`LockStore`], where the write is conditional on the version that was
//! read. A writer that loses the race re-reads and re-evaluates, so two
//! concurrent first acquisitions of the same target can never both win.

use std::sync::Arc;

use chrono::TimeDelta;
use serde::Serialize;

use crate::clock::Clock;
use crate::config::LockingConfig;
use crate::error::{ConflictKind, CoreError, StoreError};
use crate::record::{LockHolder, LockMode, LockRecord};
use crate::store::{LockStore, TargetResolver};
use crate::target::LockTarget;
use crate::types::{DbId, Timestamp};

/// How many times a lost conditional write is re-evaluated before giving up.
pub const MAX_WRITE_ATTEMPTS: usize = 5;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// The caller, as identified by the identity provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockUser {
    pub user_id: DbId,
    pub display_name: Option<String>,
}

impl LockUser {
    pub fn new(user_id: DbId, display_name: Option<String>) -> Self {
        Self {
            user_id,
            display_name,
        }
    }
}

/// A target's lock as seen by one caller at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LockStatus {
    #[serde(flatten)]
    pub target: LockTarget,
    pub is_active: bool,
    pub owner: Option<DbId>,
    pub owner_name: Option<String>,
    pub lock_type: Option<LockMode>,
    pub applies_to_caller: bool,
    pub seconds_remaining: i64,
    pub expires_at: Option<Timestamp>,
}

impl LockStatus {
    /// Evaluate `record` for `user_id` at `now`.
    ///
    /// Inactive records report no owner, exactly like an absent record.
    pub fn of(record: &LockRecord, user_id: DbId, now: Timestamp, window: TimeDelta) -> Self {
        if !record.is_active(now, window) {
            return Self::unlocked(record.target.clone());
        }
        Self {
            target: record.target.clone(),
            is_active: true,
            owner: record.owner(),
            owner_name: record.owner_name().map(str::to_string),
            lock_type: record.lock_type(now, window),
            applies_to_caller: record.applies_to(user_id, now, window),
            seconds_remaining: record.seconds_remaining(now, window),
            expires_at: record.expires_at(window),
        }
    }

    pub fn unlocked(target: LockTarget) -> Self {
        Self {
            target,
            is_active: false,
            owner: None,
            owner_name: None,
            lock_type: None,
            applies_to_caller: false,
            seconds_remaining: 0,
            expires_at: None,
        }
    }
}

/// Result of a release request that did not conflict.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReleaseOutcome {
    /// A holder was cleared.
    Released,
    /// There was no record or no holder; nothing changed.
    NotLocked,
}

impl ReleaseOutcome {
    pub fn released(self) -> bool {
        matches!(self, Self::Released)
    }
}

// ---------------------------------------------------------------------------
// LockEngine
// ---------------------------------------------------------------------------

/// Acquire, release, override and inspect locks.
pub struct LockEngine {
    config: LockingConfig,
    store: Arc<dyn LockStore>,
    targets: Arc<dyn TargetResolver>,
    clock: Arc<dyn Clock>,
}

impl LockEngine {
    pub fn new(
        config: LockingConfig,
        store: Arc<dyn LockStore>,
        targets: Arc<dyn TargetResolver>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            config,
            store,
            targets,
            clock,
        }
    }

    pub fn config(&self) -> &LockingConfig {
        &self.config
    }

    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    fn window(&self) -> TimeDelta {
        self.config.time_until_expiration()
    }

    /// Acquire (or renew) the lock on `target` for `user`.
    ///
    /// Succeeds when the target is unlocked, its lock has expired, the lock
    /// is already held by `user`, or `override_lock` is set. The holder,
    /// mode and acquisition time are always rewritten, so renewing resets
    /// the expiration window.
    pub async fn acquire(
        &self,
        target: &LockTarget,
        user: &LockUser,
        mode: LockMode,
        override_lock: bool,
    ) -> Result<LockRecord, CoreError> {
        let window = self.window();

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let now = self.clock.now();
            let current = match self.store.find(target).await? {
                Some(record) => record,
                None => {
                    if !self.targets.exists(target).await? {
                        return Err(CoreError::TargetNotFound(target.clone()));
                    }
                    LockRecord::unlocked(target.clone())
                }
            };

            if let Some(conflict) =
                current.conflict_for(user.user_id, ConflictKind::Acquire, now, window)
            {
                if !override_lock {
                    tracing::debug!(
                        user_id = user.user_id,
                        holder = conflict.holder,
                        entity_type = %target.entity_type,
                        entity_id = target.entity_id,
                        "Lock acquisition denied"
                    );
                    return Err(CoreError::LockConflict(conflict));
                }
                tracing::info!(
                    user_id = user.user_id,
                    previous_holder = conflict.holder,
                    entity_type = %target.entity_type,
                    entity_id = target.entity_id,
                    "Overriding active lock"
                );
            }

            let next = current.held_by(
                LockHolder {
                    user_id: user.user_id,
                    display_name: user.display_name.clone(),
                    acquired_at: now,
                },
                mode,
            );

            if let Some(stored) = self.store.upsert(&next).await? {
                tracing::info!(
                    user_id = user.user_id,
                    entity_type = %target.entity_type,
                    entity_id = target.entity_id,
                    lock_type = mode.as_str(),
                    "Lock acquired"
                );
                return Ok(stored);
            }
            tracing::debug!(
                attempt,
                entity_type = %target.entity_type,
                entity_id = target.entity_id,
                "Lock write raced, retrying"
            );
        }

        Err(contention_error(target))
    }

    /// Release `user_id`'s claim on `target`.
    ///
    /// Releasing an absent, unheld or expired lock succeeds. An active lock
    /// held by someone else is only cleared with `override_lock`; otherwise
    /// a [`CoreError::LockConflict`] is returned, which callers handling a
    /// stale client unlock request should swallow.
    pub async fn release(
        &self,
        target: &LockTarget,
        user_id: DbId,
        override_lock: bool,
    ) -> Result<ReleaseOutcome, CoreError> {
        let window = self.window();

        for attempt in 1..=MAX_WRITE_ATTEMPTS {
            let now = self.clock.now();
            let Some(current) = self.store.find(target).await? else {
                return Ok(ReleaseOutcome::NotLocked);
            };

            if !override_lock {
                if let Some(conflict) =
                    current.conflict_for(user_id, ConflictKind::Release, now, window)
                {
                    return Err(CoreError::LockConflict(conflict));
                }
            }

            if current.holder.is_none() {
                return Ok(ReleaseOutcome::NotLocked);
            }

            if self.store.upsert(&current.released()).await?.is_some() {
                tracing::info!(
                    user_id,
                    entity_type = %target.entity_type,
                    entity_id = target.entity_id,
                    override_lock,
                    "Lock released"
                );
                return Ok(ReleaseOutcome::Released);
            }
            tracing::debug!(
                attempt,
                entity_type = %target.entity_type,
                entity_id = target.entity_id,
                "Lock release raced, retrying"
            );
        }

        Err(contention_error(target))
    }

    /// Unconditionally clear any lock on `target`. Administrative use only.
    ///
    /// Returns `true` if a record existed.
    pub async fn force_clear(&self, target: &LockTarget) -> Result<bool, CoreError> {
        let existed = self.store.delete(target).await?;
        tracing::info!(
            entity_type = %target.entity_type,
            entity_id = target.entity_id,
            existed,
            "Lock force-cleared"
        );
        Ok(existed)
    }

    /// The lock on `target` as seen by `user_id`. Absent records read as
    /// unlocked.
    pub async fn status(&self, target: &LockTarget, user_id: DbId) -> Result<LockStatus, CoreError> {
        let record = self.store.find(target).await?;
        Ok(match record {
            Some(record) => self.describe(&record, user_id),
            None => LockStatus::unlocked(target.clone()),
        })
    }

    /// Evaluate an already-loaded record for `user_id` at the current time.
    pub fn describe(&self, record: &LockRecord, user_id: DbId) -> LockStatus {
        LockStatus::of(record, user_id, self.clock.now(), self.window())
    }

    /// Write-path hook: may `user_id` persist changes to `target` now?
    ///
    /// Only an active hard lock held by another user blocks the write.
    pub async fn check_write(&self, target: &LockTarget, user_id: DbId) -> Result<(), CoreError> {
        let Some(record) = self.store.find(target).await? else {
            return Ok(());
        };
        if !record.is_hard() {
            return Ok(());
        }
        match record.conflict_for(user_id, ConflictKind::Write, self.clock.now(), self.window()) {
            Some(conflict) => {
                tracing::info!(
                    user_id,
                    holder = conflict.holder,
                    entity_type = %target.entity_type,
                    entity_id = target.entity_id,
                    "Write rejected by hard lock"
                );
                Err(CoreError::LockConflict(conflict))
            }
            None => Ok(()),
        }
    }

    /// Active locks held by `user_id`, newest first.
    pub async fn active_locks_for(&self, user_id: DbId) -> Result<Vec<LockRecord>, CoreError> {
        let cutoff = self.clock.now() - self.window();
        Ok(self.store.find_all_active_for(user_id, cutoff).await?)
    }

    /// Every active lock, newest first.
    pub async fn active_locks(&self) -> Result<Vec<LockRecord>, CoreError> {
        let cutoff = self.clock.now() - self.window();
        Ok(self.store.find_all_active(cutoff).await?)
    }

    /// Delete released records and records whose lock expired more than
    /// `grace` ago. Returns the number removed.
    pub async fn sweep_dormant(&self, grace: TimeDelta) -> Result<u64, CoreError> {
        let cutoff = self.clock.now() - self.window() - grace;
        Ok(self.store.delete_dormant(cutoff).await?)
    }

    /// Verify the lock store is reachable.
    pub async fn ping(&self) -> Result<(), CoreError> {
        Ok(self.store.ping().await?)
    }
}

fn contention_error(target: &LockTarget) -> CoreError {
    CoreError::Store(StoreError::new(format!(
        "gave up on {target} after {MAX_WRITE_ATTEMPTS} conflicting writes"
    )))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
