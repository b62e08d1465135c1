//! Periodic removal of dormant lock rows.
//!
//! Expired locks are already harmless: expiration is evaluated on read. The
//! sweeper only keeps the lock table from growing without bound by deleting
//! released rows and rows whose lock lapsed longer than the grace period ago.

use std::sync::Arc;
use std::time::Duration;

use editlock_core::engine::LockEngine;
use tokio_util::sync::CancellationToken;

use crate::config::SweepConfig;

/// Run the sweep loop until `cancel` is triggered.
///
/// The first tick fires immediately, so a sweep also runs at startup.
pub async fn run(engine: Arc<LockEngine>, sweep: SweepConfig, cancel: CancellationToken) {
    let grace = sweep.grace();

    tracing::info!(
        interval_secs = sweep.interval_secs,
        grace_secs = sweep.grace_secs,
        "Lock sweeper started"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(sweep.interval_secs));

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lock sweeper stopping");
                break;
            }
            _ = interval.tick() => {
                match engine.sweep_dormant(grace).await {
                    Ok(deleted) if deleted > 0 => {
                        tracing::info!(deleted, "Lock sweeper: removed dormant rows");
                    }
                    Ok(_) => {
                        tracing::debug!("Lock sweeper: nothing to remove");
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Lock sweeper: sweep failed");
                    }
                }
            }
        }
    }
}
