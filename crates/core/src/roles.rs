//! Well-known role name constants.
//!
//! Roles arrive in the `role` claim of identity-provider tokens. Only
//! administrators may override or force-clear another user's lock.

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_EDITOR: &str = "editor";
