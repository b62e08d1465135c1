use std::fmt;

use crate::target::LockTarget;
use crate::types::{DbId, Timestamp};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("{0}")]
    LockConflict(LockConflict),

    #[error("Target not found: {0}")]
    TargetNotFound(LockTarget),

    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Which operation ran into someone else's active lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    Acquire,
    Release,
    Write,
}

/// An active lock held by another user blocked the requested operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LockConflict {
    pub kind: ConflictKind,
    pub target: LockTarget,
    pub holder: DbId,
    pub holder_name: Option<String>,
    pub expires_at: Timestamp,
    pub seconds_remaining: i64,
}

impl LockConflict {
    /// Display name of the holder, falling back to the user id.
    pub fn holder_label(&self) -> String {
        match &self.holder_name {
            Some(name) => name.clone(),
            None => self.holder.to_string(),
        }
    }

    /// Remaining lock time rounded to the nearest minute.
    pub fn minutes_remaining(&self) -> i64 {
        (self.seconds_remaining + 30) / 60
    }
}

impl fmt::Display for LockConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            ConflictKind::Write => {
                let mins = self.minutes_remaining();
                write!(
                    f,
                    "You cannot save this object because it is locked by user {} \
                     for roughly {mins} more minute{}.",
                    self.holder_label(),
                    if mins == 1 { "" } else { "s" }
                )
            }
            ConflictKind::Acquire | ConflictKind::Release => write!(
                f,
                "{} is locked by user {} until {}",
                self.target,
                self.holder_label(),
                self.expires_at.to_rfc3339()
            ),
        }
    }
}

/// Failure reported by a [`LockStore`](crate::store::LockStore) backend.
#[derive(Debug, thiserror::Error)]
#[error("Lock store error: {message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<BoxError>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap a backend error, keeping it as the error source.
    pub fn backend<E>(message: impl Into<String>, err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: message.into(),
            source: Some(Box::new(err)),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn conflict(kind: ConflictKind, seconds_remaining: i64) -> LockConflict {
        LockConflict {
            kind,
            target: LockTarget::new("article", 3).unwrap(),
            holder: 7,
            holder_name: Some("alice".to_string()),
            expires_at: Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap(),
            seconds_remaining,
        }
    }

    #[test]
    fn acquire_conflict_names_holder_and_expiry() {
        let msg = conflict(ConflictKind::Acquire, 300).to_string();
        assert_eq!(
            msg,
            "article 3 is locked by user alice until 2026-01-01T12:00:00+00:00"
        );
    }

    #[test]
    fn write_conflict_uses_rounded_minutes() {
        let msg = conflict(ConflictKind::Write, 89).to_string();
        assert!(msg.starts_with("You cannot save this object"));
        assert!(msg.ends_with("for roughly 1 more minute."), "{msg}");

        let msg = conflict(ConflictKind::Write, 400).to_string();
        assert!(msg.ends_with("for roughly 7 more minutes."), "{msg}");
    }

    #[test]
    fn holder_label_falls_back_to_id() {
        let mut c = conflict(ConflictKind::Acquire, 10);
        c.holder_name = None;
        assert_eq!(c.holder_label(), "7");
    }

    #[test]
    fn store_error_keeps_source() {
        let inner = std::io::Error::other("connection reset");
        let err = StoreError::backend("find failed", inner);
        assert_eq!(err.to_string(), "Lock store error: find failed");
        assert!(std::error::Error::source(&err).is_some());
        assert!(std::error::Error::source(&StoreError::new("x")).is_none());
    }
}
