use std::str::FromStr;

use chrono::TimeDelta;
use editlock_core::config::{
    duration_from_secs, LockingConfig, DEFAULT_TIME_UNTIL_EXPIRATION_SECS,
    DEFAULT_TIME_UNTIL_WARNING_SECS, MAX_DURATION_SECS,
};
use editlock_core::error::CoreError;

use crate::auth::jwt::JwtConfig;

/// Default grace period before an expired lock row is swept (24 hours).
const DEFAULT_SWEEP_GRACE_SECS: i64 = 86_400;

/// Server configuration loaded from environment variables.
///
/// Everything except `JWT_SECRET` (and `DATABASE_URL`, read by `main`) has a
/// default suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// JWT token configuration.
    pub jwt: JwtConfig,
    /// Validated lock expiration and warning thresholds.
    pub locking: LockingConfig,
    /// Dormant-lock sweeper settings.
    pub sweep: SweepConfig,
    /// Raw `type:table` pairs naming the lockable records.
    pub lockable_entities: String,
}

/// Settings for the background sweeper that deletes dormant lock rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepConfig {
    /// Seconds between sweeps; `0` disables the sweeper.
    pub interval_secs: u64,
    /// How long after expiry a lock row is kept.
    pub grace_secs: i64,
}

impl SweepConfig {
    pub fn enabled(&self) -> bool {
        self.interval_secs > 0
    }

    /// The grace period, clamped to `0..=MAX_DURATION_SECS`.
    pub fn grace(&self) -> TimeDelta {
        TimeDelta::seconds(self.grace_secs.clamp(0, MAX_DURATION_SECS))
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            interval_secs: 0,
            grace_secs: DEFAULT_SWEEP_GRACE_SECS,
        }
    }
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                           | Default                 |
    /// |-----------------------------------|-------------------------|
    /// | `HOST`                            | `0.0.0.0`               |
    /// | `PORT`                            | `3000`                  |
    /// | `CORS_ORIGINS`                    | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`            | `30`                    |
    /// | `LOCK_TIME_UNTIL_EXPIRATION_SECS` | `600`                   |
    /// | `LOCK_TIME_UNTIL_WARNING_SECS`    | `540`                   |
    /// | `LOCK_SWEEP_INTERVAL_SECS`        | `0` (disabled)          |
    /// | `LOCK_SWEEP_GRACE_SECS`           | `86400`                 |
    /// | `LOCKABLE_ENTITIES`               | empty                   |
    ///
    /// Returns [`CoreError::InvalidConfiguration`] for unparsable values or
    /// lock thresholds that do not validate.
    pub fn from_env() -> Result<Self, CoreError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());
        let port: u16 = env_or("PORT", 3000)?;

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", 30)?;

        let locking = LockingConfig::from_secs(
            env_or(
                "LOCK_TIME_UNTIL_EXPIRATION_SECS",
                DEFAULT_TIME_UNTIL_EXPIRATION_SECS,
            )?,
            env_or("LOCK_TIME_UNTIL_WARNING_SECS", DEFAULT_TIME_UNTIL_WARNING_SECS)?,
        )?;

        let sweep = SweepConfig {
            interval_secs: env_or("LOCK_SWEEP_INTERVAL_SECS", 0)?,
            grace_secs: env_or("LOCK_SWEEP_GRACE_SECS", DEFAULT_SWEEP_GRACE_SECS)?,
        };
        validate_grace(sweep.grace_secs)?;

        let lockable_entities = std::env::var("LOCKABLE_ENTITIES").unwrap_or_default();
        let jwt = JwtConfig::from_env()?;

        Ok(Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            jwt,
            locking,
            sweep,
            lockable_entities,
        })
    }
}

fn validate_grace(grace_secs: i64) -> Result<(), CoreError> {
    if grace_secs < 0 {
        return Err(CoreError::InvalidConfiguration(
            "LOCK_SWEEP_GRACE_SECS must not be negative".into(),
        ));
    }
    duration_from_secs("LOCK_SWEEP_GRACE_SECS", grace_secs)?;
    Ok(())
}

/// Read and parse `key`, falling back to `default` when unset.
fn env_or<T>(key: &str, default: T) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => parse_setting(key, &raw),
        Err(_) => Ok(default),
    }
}

fn parse_setting<T>(key: &str, raw: &str) -> Result<T, CoreError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        CoreError::InvalidConfiguration(format!("{key} has invalid value '{raw}': {e}"))
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn parse_setting_accepts_numbers() {
        let port: u16 = parse_setting("PORT", " 8080 ").unwrap();
        assert_eq!(port, 8080);
    }

    #[test]
    fn parse_setting_names_the_key() {
        let err = parse_setting::<u16>("PORT", "eighty").unwrap_err();
        assert!(err.to_string().contains("PORT"));
        assert_matches!(err, CoreError::InvalidConfiguration(_));
    }

    #[test]
    fn grace_must_be_in_range() {
        assert!(validate_grace(86_400).is_ok());
        assert_matches!(validate_grace(-1), Err(CoreError::InvalidConfiguration(_)));
        assert_matches!(
            validate_grace(i64::MAX),
            Err(CoreError::InvalidConfiguration(msg)) if msg.contains("LOCK_SWEEP_GRACE_SECS")
        );
    }

    #[test]
    fn grace_is_clamped_when_built_directly() {
        let sweep = SweepConfig {
            interval_secs: 60,
            grace_secs: i64::MAX,
        };
        assert_eq!(sweep.grace(), TimeDelta::seconds(MAX_DURATION_SECS));
    }

    #[test]
    fn sweep_disabled_by_default() {
        assert!(!SweepConfig::default().enabled());
        assert!(SweepConfig {
            interval_secs: 60,
            grace_secs: 0
        }
        .enabled());
    }
}
