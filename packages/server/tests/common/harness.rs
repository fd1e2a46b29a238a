//! Test harness driving the axum router over in-memory stores.
//!
//! Requests go through the full middleware stack via `oneshot`; no network
//! listener or database is involved.

use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use care_directory::domains::auth::JwtService;
use care_directory::kernel::{TestDependencies, TEST_JWT_SECRET};
use care_directory::server::build_app;
use serde_json::Value;
use tower::ServiceExt;

pub struct TestHarness {
    app: Router,
}

/// A response with its body decoded as JSON (`Null` when empty)
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn total_count(&self) -> Option<usize> {
        self.header("x-total-count").and_then(|v| v.parse().ok())
    }

    pub fn error_message(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

impl TestHarness {
    pub fn new(deps: TestDependencies) -> Self {
        Self {
            app: build_app(deps.into_server_deps(), &[]),
        }
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.send(Method::GET, uri, None, None).await
    }

    pub async fn get_authorized(&self, uri: &str, authorization: &str) -> TestResponse {
        self.send(Method::GET, uri, Some(authorization), None).await
    }

    /// Send a request; `authorization` is the raw header value
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        authorization: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(value) = authorization {
            builder = builder.header(header::AUTHORIZATION, value);
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

/// `Authorization` header value for a token signed with the test secret
pub fn bearer(subject_id: i64, permissions: &[&str]) -> String {
    format!("Bearer {}", token(subject_id, permissions, chrono::Duration::hours(1)))
}

pub fn token(subject_id: i64, permissions: &[&str], ttl: chrono::Duration) -> String {
    JwtService::new(TEST_JWT_SECRET, None)
        .create_token(
            subject_id,
            format!("user{}@example.org", subject_id),
            permissions.iter().map(|p| p.to_string()).collect(),
            ttl,
        )
        .unwrap()
}
