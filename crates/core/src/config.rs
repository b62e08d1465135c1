//! Lock timing configuration.
//!
//! Built once at startup and handed to [`LockEngine::new`](crate::engine::LockEngine::new).
//! Construction validates eagerly so a misconfigured process never serves
//! a request.

use chrono::TimeDelta;
use serde::Serialize;

use crate::error::CoreError;

/// Default time until an unrenewed lock expires (10 minutes).
pub const DEFAULT_TIME_UNTIL_EXPIRATION_SECS: i64 = 600;

/// Default time after which clients warn the holder (9 minutes).
pub const DEFAULT_TIME_UNTIL_WARNING_SECS: i64 = 540;

/// Upper bound for any configured lock duration (one year).
pub const MAX_DURATION_SECS: i64 = 365 * 24 * 60 * 60;

/// Validated lock timing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LockingConfig {
    time_until_expiration: TimeDelta,
    time_until_warning: TimeDelta,
}

impl LockingConfig {
    /// Validate and build a config.
    ///
    /// `time_until_expiration` must be positive and at most
    /// [`MAX_DURATION_SECS`]; `time_until_warning` must be positive and
    /// strictly less than it.
    pub fn new(
        time_until_expiration: TimeDelta,
        time_until_warning: TimeDelta,
    ) -> Result<Self, CoreError> {
        if time_until_expiration > TimeDelta::seconds(MAX_DURATION_SECS) {
            return Err(CoreError::InvalidConfiguration(format!(
                "time_until_expiration must be at most {MAX_DURATION_SECS}s, got {}s",
                time_until_expiration.num_seconds()
            )));
        }
        if time_until_expiration <= TimeDelta::zero() {
            return Err(CoreError::InvalidConfiguration(format!(
                "time_until_expiration must be positive, got {}s",
                time_until_expiration.num_seconds()
            )));
        }
        if time_until_warning <= TimeDelta::zero() {
            return Err(CoreError::InvalidConfiguration(format!(
                "time_until_warning must be positive, got {}s",
                time_until_warning.num_seconds()
            )));
        }
        if time_until_warning >= time_until_expiration {
            return Err(CoreError::InvalidConfiguration(format!(
                "time_until_warning ({}s) must be less than time_until_expiration ({}s)",
                time_until_warning.num_seconds(),
                time_until_expiration.num_seconds()
            )));
        }
        Ok(Self {
            time_until_expiration,
            time_until_warning,
        })
    }

    /// Convenience constructor from whole seconds.
    pub fn from_secs(expiration_secs: i64, warning_secs: i64) -> Result<Self, CoreError> {
        Self::new(
            duration_from_secs("time_until_expiration", expiration_secs)?,
            duration_from_secs("time_until_warning", warning_secs)?,
        )
    }

    /// The expiration window.
    pub fn time_until_expiration(&self) -> TimeDelta {
        self.time_until_expiration
    }

    /// Client-side warning threshold. Not enforced by the engine.
    pub fn time_until_warning(&self) -> TimeDelta {
        self.time_until_warning
    }

    /// The timing values clients need, in seconds.
    pub fn client_settings(&self) -> ClientLockSettings {
        ClientLockSettings {
            time_until_expiration: self.time_until_expiration.num_seconds(),
            time_until_warning: self.time_until_warning.num_seconds(),
        }
    }
}

impl Default for LockingConfig {
    fn default() -> Self {
        Self {
            time_until_expiration: TimeDelta::seconds(DEFAULT_TIME_UNTIL_EXPIRATION_SECS),
            time_until_warning: TimeDelta::seconds(DEFAULT_TIME_UNTIL_WARNING_SECS),
        }
    }
}

/// Convert a configured number of seconds to a [`TimeDelta`].
///
/// Values whose magnitude exceeds [`MAX_DURATION_SECS`] are rejected; sign
/// checks are left to the caller.
pub fn duration_from_secs(name: &str, secs: i64) -> Result<TimeDelta, CoreError> {
    if secs.unsigned_abs() > MAX_DURATION_SECS as u64 {
        return Err(CoreError::InvalidConfiguration(format!(
            "{name} must be at most {MAX_DURATION_SECS}s, got {secs}s"
        )));
    }
    Ok(TimeDelta::seconds(secs))
}

/// Timing published to editing clients so they can warn and renew.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ClientLockSettings {
    pub time_until_expiration: i64,
    pub time_until_warning: i64,
}
