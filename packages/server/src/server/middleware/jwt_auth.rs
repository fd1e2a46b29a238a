use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request},
    http::{header::AUTHORIZATION, request::Parts},
    middleware::Next,
    response::Response,
};
use tracing::debug;

use crate::common::auth::{AuthError, AuthIdentity};
use crate::domains::auth::PermissionGate;

/// Result of authenticating the current request, stored in its extensions
#[derive(Clone, Debug)]
pub struct AuthOutcome(pub Result<AuthIdentity, AuthError>);

/// JWT authentication middleware
///
/// Decodes the `Authorization` header once and records the outcome on the
/// request. Public routes ignore it; protected handlers take an
/// [`AuthIdentity`] argument, which rejects with the recorded error.
pub async fn jwt_auth_middleware(
    gate: Arc<PermissionGate>,
    mut request: Request,
    next: Next,
) -> Response {
    let outcome = authenticate_request(&request, &gate);

    match &outcome {
        Ok(identity) => debug!(subject_id = identity.subject_id, "Authenticated request"),
        Err(AuthError::MissingOrMalformedHeader) => {}
        Err(error) => debug!(error = %error, "Authentication failed"),
    }

    request.extensions_mut().insert(AuthOutcome(outcome));
    next.run(request).await
}

fn authenticate_request(
    request: &Request,
    gate: &PermissionGate,
) -> Result<AuthIdentity, AuthError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());
    gate.authenticate(header)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthIdentity
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<AuthOutcome>() {
            Some(AuthOutcome(outcome)) => outcome.clone(),
            None => Err(AuthError::MissingOrMalformedHeader),
        }
    }
}
