// Common types and utilities shared across the application

pub mod auth;
pub mod pagination;
pub mod utils;

pub use auth::{AuthError, AuthIdentity, Capability, PermissionSet};
pub use pagination::{Page, PageRequest};
