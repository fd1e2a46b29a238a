//! Application setup and router construction.

use std::sync::Arc;

use axum::{
    extract::{Extension, Request},
    http::{
        header::{AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method,
    },
    middleware::{self, Next},
    routing::get,
    Router,
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::kernel::ServerDeps;
use crate::server::middleware::jwt_auth_middleware;
use crate::server::routes::{
    create_aba_center, create_resource, delete_aba_center, delete_resource, get_aba_center,
    get_provider, get_regional_center, get_resource, health_handler, list_aba_centers,
    list_providers, list_regional_centers, list_resources, list_users, me, nearby_providers,
    nearby_resources, nearest_regional_centers, search_aba_centers, search_regional_centers,
    update_aba_center, update_resource, TOTAL_COUNT_HEADER,
};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub deps: Arc<ServerDeps>,
}

/// CORS for browser clients; an empty origin list allows any origin
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    let allow_origin = if origins.is_empty() {
        AllowOrigin::from(Any)
    } else {
        AllowOrigin::list(origins)
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE])
        .expose_headers([TOTAL_COUNT_HEADER])
}

/// Build the Axum application router
pub fn build_app(deps: ServerDeps, allowed_origins: &[String]) -> Router {
    let gate = deps.gate.clone();
    let app_state = AppState {
        deps: Arc::new(deps),
    };

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/resources", get(list_resources).post(create_resource))
        .route("/api/resources/nearby", get(nearby_resources))
        .route(
            "/api/resources/:id",
            get(get_resource).put(update_resource).delete(delete_resource),
        )
        .route("/api/regional-centers", get(list_regional_centers))
        .route("/api/regional-centers/search", get(search_regional_centers))
        .route("/api/regional-centers/nearest", get(nearest_regional_centers))
        .route("/api/regional-centers/:id", get(get_regional_center))
        .route("/api/aba-centers", get(list_aba_centers).post(create_aba_center))
        .route("/api/aba-centers/search", get(search_aba_centers))
        .route(
            "/api/aba-centers/:id",
            get(get_aba_center)
                .put(update_aba_center)
                .delete(delete_aba_center),
        )
        .route("/api/providers", get(list_providers))
        .route("/api/providers/nearby", get(nearby_providers))
        .route("/api/providers/:id", get(get_provider))
        .route("/api/me", get(me))
        .route("/api/users", get(list_users))
        // Middleware layers (applied in reverse order - last added runs first)
        .layer(middleware::from_fn(move |req: Request, next: Next| {
            jwt_auth_middleware(gate.clone(), req, next)
        })) // JWT authentication
        .layer(Extension(app_state))
        .layer(cors_layer(allowed_origins))
        .layer(TraceLayer::new_for_http())
}
