//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async methods that
//! accept `&PgPool` as the first argument.

pub mod record_lock_repo;

pub use record_lock_repo::RecordLockRepo;
