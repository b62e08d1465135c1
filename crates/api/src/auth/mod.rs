//! Authentication primitives.
//!
//! Identity is issued elsewhere; this service only verifies HS256 access
//! tokens and reads the caller's id, role and display name from them.

pub mod jwt;
