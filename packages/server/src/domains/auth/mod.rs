//! Token issuing and verification
//!
//! The service trusts externally issued HS256 tokens. [`PermissionGate`]
//! verifies them once per request; [`JwtService`] also mints tokens for the
//! operator CLI and tests.

pub mod gate;
pub mod jwt;

pub use gate::{PermissionGate, BEARER_PREFIX};
pub use jwt::{Claims, JwtService};
