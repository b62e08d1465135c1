//! Row structs mapping database tables.

pub mod record_lock;
