//! HTTP error mapping
//!
//! Every error body is `{"error": "<message>"}`. Internal details are logged
//! here and never returned.

use axum::{
    http::{header, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::common::auth::AuthError;
use crate::domains::aba_centers::AbaCenterValidationError;
use crate::domains::resources::ResourceValidationError;
use crate::domains::search::{SearchError, StoreError};

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    NotFound(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<SearchError> for ApiError {
    fn from(error: SearchError) -> Self {
        match error {
            SearchError::InvalidParameter(message) => ApiError::BadRequest(message),
            SearchError::StoreUnavailable(e) => e.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::Internal(anyhow::Error::new(error))
    }
}

impl From<ResourceValidationError> for ApiError {
    fn from(error: ResourceValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

impl From<AbaCenterValidationError> for ApiError {
    fn from(error: AbaCenterValidationError) -> Self {
        ApiError::BadRequest(error.to_string())
    }
}

fn error_body(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::BadRequest(message) => error_body(StatusCode::BAD_REQUEST, &message),
            ApiError::NotFound(message) => error_body(StatusCode::NOT_FOUND, &message),
            ApiError::Auth(error) => error.into_response(),
            ApiError::Internal(error) => {
                tracing::error!(error = ?error, "Request failed");
                error_body(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::MissingOrMalformedHeader | AuthError::InvalidToken => {
                StatusCode::UNAUTHORIZED
            }
            AuthError::Forbidden(_) => StatusCode::FORBIDDEN,
        };

        let mut response = error_body(status, &self.to_string());

        // RFC 6750: challenge on 401
        if status == StatusCode::UNAUTHORIZED {
            let challenge = match self {
                AuthError::InvalidToken => "Bearer error=\"invalid_token\"",
                _ => "Bearer",
            };
            response
                .headers_mut()
                .insert(header::WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }

        response
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::auth::Capability;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_missing_header_is_401_with_challenge() {
        let response = AuthError::MissingOrMalformedHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }

    #[tokio::test]
    async fn test_forbidden_is_403_without_challenge() {
        let response = AuthError::Forbidden(Capability::READ_USERS).into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(response.headers().get(header::WWW_AUTHENTICATE).is_none());
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Insufficient permissions" })
        );
    }

    #[tokio::test]
    async fn test_invalid_parameter_is_400() {
        let error: ApiError = SearchError::InvalidParameter("Invalid latitude parameter".into()).into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Invalid latitude parameter" })
        );
    }

    #[tokio::test]
    async fn test_store_failure_hides_details() {
        let error: ApiError =
            SearchError::StoreUnavailable(StoreError::Backend(anyhow::anyhow!("password=hunter2")))
                .into();
        let response = error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            body_json(response).await,
            json!({ "error": "Internal server error" })
        );
    }
}
