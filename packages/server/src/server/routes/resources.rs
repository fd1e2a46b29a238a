use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::TOTAL_COUNT_HEADER;
use crate::common::auth::{AuthIdentity, Capability};
use crate::common::pagination::PageRequest;
use crate::domains::resources::{NearbyResource, Resource, ResourceInput};
use crate::domains::search::{
    parse_origin, parse_radius, AttributeFilters, SearchQuery, DEFAULT_RADIUS,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Raw query string; every field is parsed leniently by the handler
#[derive(Debug, Default, Deserialize)]
pub struct NearbyParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub diagnoses: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

pub async fn list_resources(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<Resource>>, ApiError> {
    Ok(Json(state.deps.resources.list().await?))
}

/// Resources within `radius` miles, nearest first
///
/// The body is the page of results; the total before pagination goes in
/// `X-Total-Count`.
pub async fn nearby_resources(
    Extension(state): Extension<AppState>,
    Query(params): Query<NearbyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = parse_origin(params.lat.as_deref(), params.lng.as_deref())?;
    let query = SearchQuery::new(origin)
        .with_radius(parse_radius(params.radius.as_deref(), DEFAULT_RADIUS))
        .with_filters(AttributeFilters::default().with_diagnoses_csv(params.diagnoses.as_deref()))
        .with_page(PageRequest::from_params(
            params.page.as_deref(),
            params.page_size.as_deref(),
        ));

    let page = state
        .deps
        .resource_search()
        .search_nearby::<Resource>(&query)
        .await?;

    let results: Vec<NearbyResource> = page
        .items
        .into_iter()
        .map(|ranked| NearbyResource {
            resource: ranked.record,
            distance_miles: ranked.distance,
        })
        .collect();

    Ok((
        [(TOTAL_COUNT_HEADER, page.total_count.to_string())],
        Json(results),
    ))
}

pub async fn get_resource(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Resource>, ApiError> {
    state
        .deps
        .resources
        .get(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))
}

pub async fn create_resource(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
    Json(input): Json<ResourceInput>,
) -> Result<(StatusCode, Json<Resource>), ApiError> {
    identity.require(&Capability::WRITE_RESOURCES)?;
    let input = input.normalized()?;

    let resource = state.deps.resources.create(input).await?;
    tracing::info!(
        resource_id = %resource.id,
        subject_id = identity.subject_id,
        "Resource created"
    );
    Ok((StatusCode::CREATED, Json(resource)))
}

pub async fn update_resource(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(input): Json<ResourceInput>,
) -> Result<Json<Resource>, ApiError> {
    identity.require(&Capability::WRITE_RESOURCES)?;
    let input = input.normalized()?;

    let resource = state
        .deps
        .resources
        .update(&id, input)
        .await?
        .ok_or_else(|| ApiError::NotFound("Resource not found".to_string()))?;
    tracing::info!(resource_id = %id, subject_id = identity.subject_id, "Resource updated");
    Ok(Json(resource))
}

pub async fn delete_resource(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    identity.require(&Capability::WRITE_RESOURCES)?;

    if state.deps.resources.delete(&id).await? {
        tracing::info!(resource_id = %id, subject_id = identity.subject_id, "Resource deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(ApiError::NotFound("Resource not found".to_string()))
    }
}
