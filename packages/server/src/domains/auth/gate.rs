use tracing::debug;

use super::JwtService;
use crate::common::auth::{AuthError, AuthIdentity, Capability, PermissionSet};

/// Literal scheme prefix a protected request must send
pub const BEARER_PREFIX: &str = "Bearer ";

/// Turns an `Authorization` header into an [`AuthIdentity`]
#[derive(Clone)]
pub struct PermissionGate {
    jwt: JwtService,
}

impl PermissionGate {
    pub fn new(jwt: JwtService) -> Self {
        Self { jwt }
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    /// Verify the header value and decode the caller's identity
    ///
    /// A missing header or one without the `Bearer ` scheme is
    /// [`AuthError::MissingOrMalformedHeader`]; every token verification
    /// failure is [`AuthError::InvalidToken`].
    pub fn authenticate(&self, header: Option<&str>) -> Result<AuthIdentity, AuthError> {
        let token = header
            .and_then(|value| value.strip_prefix(BEARER_PREFIX))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or(AuthError::MissingOrMalformedHeader)?;

        let claims = self.jwt.verify_token(token).map_err(|e| {
            debug!(error = %e, "Rejected bearer token");
            AuthError::InvalidToken
        })?;

        let permissions: PermissionSet = claims
            .permissions
            .into_iter()
            .map(Capability::new)
            .collect();

        debug!(
            subject_id = claims.sub,
            permissions = permissions.len(),
            "Authenticated request"
        );

        Ok(AuthIdentity {
            subject_id: claims.sub,
            email: claims.email,
            permissions,
        })
    }
}
