use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use editlock_core::clock::SystemClock;
use editlock_core::engine::LockEngine;
use editlock_db::store::PgLockStore;
use editlock_db::targets::{parse_lockable_entities, PgTargetResolver};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use editlock_api::background::lock_sweeper;
use editlock_api::config::ServerConfig;
use editlock_api::router::build_app_router;
use editlock_api::state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    "editlock_api=debug,editlock_core=debug,editlock_db=debug,tower_http=debug".into()
                }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };
    tracing::info!(
        host = %config.host,
        port = %config.port,
        lock_expiration_secs = config.locking.time_until_expiration().num_seconds(),
        lock_warning_secs = config.locking.time_until_warning().num_seconds(),
        "Loaded server configuration"
    );

    let lockable = match parse_lockable_entities(&config.lockable_entities) {
        Ok(tables) => tables,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // --- Database ---
    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = editlock_db::create_pool(&database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    editlock_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    editlock_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");
    tracing::info!("Database migrations applied");

    // --- Lock engine ---
    let targets = PgTargetResolver::new(pool.clone(), lockable);
    tracing::info!(entity_types = ?targets.entity_types(), "Lockable entity types");
    let engine = Arc::new(LockEngine::new(
        config.locking,
        Arc::new(PgLockStore::new(pool)),
        Arc::new(targets),
        Arc::new(SystemClock),
    ));

    // --- Sweeper ---
    let sweep_cancel = CancellationToken::new();
    let sweep_handle = config.sweep.enabled().then(|| {
        tokio::spawn(lock_sweeper::run(
            Arc::clone(&engine),
            config.sweep,
            sweep_cancel.clone(),
        ))
    });

    // --- App state ---
    let state = AppState {
        engine,
        config: Arc::new(config.clone()),
    };

    // --- Router ---
    let app = match build_app_router(state, &config) {
        Ok(app) => app,
        Err(e) => {
            tracing::error!(error = %e, "Invalid configuration");
            std::process::exit(1);
        }
    };

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    sweep_cancel.cancel();
    if let Some(handle) = sweep_handle {
        let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        tracing::info!("Lock sweeper stopped");
    }

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
