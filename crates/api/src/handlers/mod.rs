pub mod admin;
pub mod locks;
