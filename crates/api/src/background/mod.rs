//! Background tasks spawned by the binary.

pub mod lock_sweeper;
