//! HTTP gateway for advisory record locking.
//!
//! The binary in `main.rs` wires a PostgreSQL-backed [`LockEngine`] into the
//! router built by [`router::build_app_router`]; integration tests build the
//! same router over the in-memory store.
//!
//! [`LockEngine`]: editlock_core::engine::LockEngine

pub mod auth;
pub mod background;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
