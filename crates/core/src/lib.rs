//! Domain core for advisory, time-bounded record locking.
//!
//! Zero I/O of its own: the [`engine::LockEngine`] reads and writes through
//! the [`store`] traits and reads time from a [`clock::Clock`], so the
//! database crate, the HTTP gateway and tests can all share it.

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod memory;
pub mod record;
pub mod roles;
pub mod store;
pub mod target;
pub mod types;
