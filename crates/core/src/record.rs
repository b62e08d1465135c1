//! Lock record state and its time-derived predicates.
//!
//! A [`LockRecord`] stores only who acquired the lock and when. Whether the
//! lock is *active* is always recomputed from `acquired_at`, the expiration
//! window and the current time; nothing derived is ever persisted.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{ConflictKind, LockConflict};
use crate::target::LockTarget;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Lock mode
// ---------------------------------------------------------------------------

/// Whether the lock is enforced on the write path or advisory only.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LockMode {
    /// Advisory: the UI reflects the lock, saves are not blocked.
    #[default]
    Soft,
    /// Saves by anyone but the holder are rejected while active.
    Hard,
}

impl LockMode {
    pub fn from_hard_flag(hard: bool) -> Self {
        if hard {
            Self::Hard
        } else {
            Self::Soft
        }
    }

    pub fn is_hard(self) -> bool {
        matches!(self, Self::Hard)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Soft => "soft",
            Self::Hard => "hard",
        }
    }
}

// ---------------------------------------------------------------------------
// Holder
// ---------------------------------------------------------------------------

/// Owner and acquisition time of a lock. They are set and cleared together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub user_id: DbId,
    pub display_name: Option<String>,
    pub acquired_at: Timestamp,
}

// ---------------------------------------------------------------------------
// LockRecord
// ---------------------------------------------------------------------------

/// A single target's lock, held or dormant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub target: LockTarget,
    pub holder: Option<LockHolder>,
    pub mode: LockMode,
    /// Optimistic-concurrency counter; 0 means the record was never stored.
    pub version: i64,
}

impl LockRecord {
    /// A not-yet-persisted, unheld record for `target`.
    pub fn unlocked(target: LockTarget) -> Self {
        Self {
            target,
            holder: None,
            mode: LockMode::Soft,
            version: 0,
        }
    }

    pub fn owner(&self) -> Option<DbId> {
        self.holder.as_ref().map(|h| h.user_id)
    }

    pub fn owner_name(&self) -> Option<&str> {
        self.holder.as_ref().and_then(|h| h.display_name.as_deref())
    }

    pub fn acquired_at(&self) -> Option<Timestamp> {
        self.holder.as_ref().map(|h| h.acquired_at)
    }

    pub fn is_hard(&self) -> bool {
        self.mode.is_hard()
    }

    /// `acquired_at + window`, or `None` if the record has never been held.
    pub fn expires_at(&self, window: TimeDelta) -> Option<Timestamp> {
        self.acquired_at().map(|at| at + window)
    }

    /// Active while `now` is strictly before the expiration instant.
    pub fn is_active(&self, now: Timestamp, window: TimeDelta) -> bool {
        match self.expires_at(window) {
            Some(expires_at) => now < expires_at,
            None => false,
        }
    }

    /// Whole seconds until expiry, rounded up; 0 once inactive.
    pub fn seconds_remaining(&self, now: Timestamp, window: TimeDelta) -> i64 {
        let Some(expires_at) = self.expires_at(window) else {
            return 0;
        };
        let delta = expires_at - now;
        if delta <= TimeDelta::zero() {
            return 0;
        }
        let secs = delta.num_seconds();
        if delta > TimeDelta::seconds(secs) {
            secs + 1
        } else {
            secs
        }
    }

    /// True iff the lock is active and held by someone other than `user_id`.
    pub fn applies_to(&self, user_id: DbId, now: Timestamp, window: TimeDelta) -> bool {
        self.is_active(now, window) && self.owner() != Some(user_id)
    }

    /// True iff the lock is active and held by `user_id`.
    pub fn is_held_by(&self, user_id: DbId, now: Timestamp, window: TimeDelta) -> bool {
        self.is_active(now, window) && self.owner() == Some(user_id)
    }

    /// `Some(mode)` while active, `None` otherwise.
    pub fn lock_type(&self, now: Timestamp, window: TimeDelta) -> Option<LockMode> {
        self.is_active(now, window).then_some(self.mode)
    }

    /// Describe the lock blocking `user_id`'s `kind` operation.
    ///
    /// `Some` exactly when [`applies_to`](Self::applies_to) is true.
    pub fn conflict_for(
        &self,
        user_id: DbId,
        kind: ConflictKind,
        now: Timestamp,
        window: TimeDelta,
    ) -> Option<LockConflict> {
        if !self.applies_to(user_id, now, window) {
            return None;
        }
        let holder = self.holder.as_ref()?;
        Some(LockConflict {
            kind,
            target: self.target.clone(),
            holder: holder.user_id,
            holder_name: holder.display_name.clone(),
            expires_at: holder.acquired_at + window,
            seconds_remaining: self.seconds_remaining(now, window),
        })
    }

    /// Return a copy held by `holder` in `mode`, keeping target and version.
    pub fn held_by(&self, holder: LockHolder, mode: LockMode) -> Self {
        Self {
            target: self.target.clone(),
            holder: Some(holder),
            mode,
            version: self.version,
        }
    }

    /// Return a copy with the holder cleared, keeping target and version.
    pub fn released(&self) -> Self {
        Self {
            target: self.target.clone(),
            holder: None,
            mode: self.mode,
            version: self.version,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    const WINDOW_SECS: i64 = 600;

    fn window() -> TimeDelta {
        TimeDelta::seconds(WINDOW_SECS)
    }

    fn t0() -> Timestamp {
        Utc.with_ymd_and_hms(2026, 5, 4, 10, 0, 0).unwrap()
    }

    fn held(user_id: DbId, mode: LockMode) -> LockRecord {
        LockRecord::unlocked(LockTarget::new("article", 1).unwrap()).held_by(
            LockHolder {
                user_id,
                display_name: Some("alice".to_string()),
                acquired_at: t0(),
            },
            mode,
        )
    }

    // -----------------------------------------------------------------------
    // Activity and expiration
    // -----------------------------------------------------------------------

    #[test]
    fn unheld_record_is_inactive() {
        let record = LockRecord::unlocked(LockTarget::new("article", 1).unwrap());
        assert!(!record.is_active(t0(), window()));
        assert_eq!(record.expires_at(window()), None);
        assert_eq!(record.seconds_remaining(t0(), window()), 0);
        assert_eq!(record.lock_type(t0(), window()), None);
        assert_eq!(record.owner(), None);
    }

    #[test]
    fn expiration_boundary_is_strict() {
        let record = held(1, LockMode::Soft);
        let w = window();
        assert!(record.is_active(t0() + TimeDelta::seconds(599), w));
        assert!(!record.is_active(t0() + TimeDelta::seconds(600), w));
        assert!(!record.is_active(t0() + TimeDelta::seconds(601), w));
    }

    #[test]
    fn seconds_remaining_rounds_up_and_floors_at_zero() {
        let record = held(1, LockMode::Soft);
        let w = window();
        assert_eq!(record.seconds_remaining(t0(), w), WINDOW_SECS);
        assert_eq!(
            record.seconds_remaining(t0() + TimeDelta::milliseconds(599_500), w),
            1
        );
        assert_eq!(record.seconds_remaining(t0() + TimeDelta::seconds(600), w), 0);
        assert_eq!(record.seconds_remaining(t0() + TimeDelta::hours(3), w), 0);
    }

    #[test]
    fn expires_at_adds_window() {
        let record = held(1, LockMode::Hard);
        assert_eq!(
            record.expires_at(window()),
            Some(t0() + TimeDelta::seconds(WINDOW_SECS))
        );
    }

    // -----------------------------------------------------------------------
    // Ownership predicates
    // -----------------------------------------------------------------------

    #[test]
    fn applies_to_other_users_only_while_active() {
        let record = held(1, LockMode::Soft);
        let w = window();
        let now = t0() + TimeDelta::seconds(10);
        assert!(record.applies_to(2, now, w));
        assert!(!record.applies_to(1, now, w));
        assert!(record.is_held_by(1, now, w));
        assert!(!record.is_held_by(2, now, w));

        let later = t0() + TimeDelta::seconds(700);
        assert!(!record.applies_to(2, later, w));
        assert!(!record.is_held_by(1, later, w));
    }

    #[test]
    fn lock_type_reports_mode_while_active() {
        let w = window();
        let now = t0() + TimeDelta::seconds(1);
        assert_eq!(held(1, LockMode::Hard).lock_type(now, w), Some(LockMode::Hard));
        assert_eq!(held(1, LockMode::Soft).lock_type(now, w), Some(LockMode::Soft));
        assert_eq!(
            held(1, LockMode::Hard).lock_type(t0() + TimeDelta::hours(1), w),
            None
        );
    }

    #[test]
    fn released_clears_holder_and_keeps_version() {
        let mut record = held(1, LockMode::Hard);
        record.version = 4;
        let released = record.released();
        assert_eq!(released.holder, None);
        assert_eq!(released.acquired_at(), None);
        assert_eq!(released.version, 4);
        assert_eq!(released.target, record.target);
    }

    #[test]
    fn conflict_describes_holder() {
        let record = held(9, LockMode::Hard);
        let now = t0() + TimeDelta::seconds(60);
        let conflict = record
            .conflict_for(2, ConflictKind::Write, now, window())
            .unwrap();
        assert_eq!(conflict.holder, 9);
        assert_eq!(conflict.holder_name.as_deref(), Some("alice"));
        assert_eq!(conflict.seconds_remaining, 540);
    }

    #[test]
    fn no_conflict_for_holder_or_expired_or_unheld() {
        let record = held(9, LockMode::Hard);
        let w = window();
        let now = t0() + TimeDelta::seconds(60);
        assert!(record.conflict_for(9, ConflictKind::Write, now, w).is_none());
        assert!(record
            .conflict_for(2, ConflictKind::Write, t0() + TimeDelta::hours(1), w)
            .is_none());
        assert!(LockRecord::unlocked(record.target.clone())
            .conflict_for(2, ConflictKind::Write, now, w)
            .is_none());
    }

    #[test]
    fn lock_mode_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&LockMode::Hard).unwrap(), r#""hard""#);
        assert_eq!(LockMode::from_hard_flag(false), LockMode::Soft);
        assert_eq!(LockMode::Soft.as_str(), "soft");
    }
}
