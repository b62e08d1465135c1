//! Request interceptors.
//!
//! Authorization is expressed as extractors, logging as a layer:
//!
//! - [`auth::AuthUser`] -- Extracts the authenticated user from a JWT Bearer token.
//! - [`rbac::RequireAdmin`] -- Requires the `admin` role.
//! - [`request_log::log_lock_request`] -- Logs the outcome of every lock request.

pub mod auth;
pub mod rbac;
pub mod request_log;
