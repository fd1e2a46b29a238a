use thiserror::Error;

use super::Capability;

/// Authentication and authorization failures
///
/// Token problems collapse into one variant so callers cannot tell a bad
/// signature from an expired token.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Authorization header required")]
    MissingOrMalformedHeader,

    #[error("Invalid or expired token")]
    InvalidToken,

    #[error("Insufficient permissions")]
    Forbidden(Capability),
}
