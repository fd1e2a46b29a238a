use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::TOTAL_COUNT_HEADER;
use crate::common::pagination::PageRequest;
use crate::domains::providers::{NearbyProvider, Provider, ProviderView};
use crate::domains::search::{
    parse_origin, parse_radius, AttributeFilters, SearchQuery, DEFAULT_RADIUS,
};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct ProviderNearbyParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub radius: Option<String>,
    pub area: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

pub async fn list_providers(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<ProviderView>>, ApiError> {
    let providers = state.deps.providers.list().await?;
    Ok(Json(providers.iter().map(Provider::view).collect()))
}

/// Providers within `radius` miles, nearest first, optionally limited to an
/// area; the total before pagination goes in `X-Total-Count`
pub async fn nearby_providers(
    Extension(state): Extension<AppState>,
    Query(params): Query<ProviderNearbyParams>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = parse_origin(params.lat.as_deref(), params.lng.as_deref())?;
    let query = SearchQuery::new(origin)
        .with_radius(parse_radius(params.radius.as_deref(), DEFAULT_RADIUS))
        .with_filters(AttributeFilters::default().with_area(params.area))
        .with_page(PageRequest::from_params(
            params.page.as_deref(),
            params.page_size.as_deref(),
        ));

    let page = state
        .deps
        .provider_search()
        .search_nearby::<Provider>(&query)
        .await?;

    let results: Vec<NearbyProvider> = page
        .items
        .into_iter()
        .map(|ranked| NearbyProvider {
            provider: ranked.record.view(),
            distance_miles: ranked.distance,
        })
        .collect();

    Ok((
        [(TOTAL_COUNT_HEADER, page.total_count.to_string())],
        Json(results),
    ))
}

pub async fn get_provider(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ProviderView>, ApiError> {
    let id: i32 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid provider id".to_string()))?;

    state
        .deps
        .providers
        .get(id)
        .await?
        .map(|provider| Json(provider.view()))
        .ok_or_else(|| ApiError::NotFound("Provider not found".to_string()))
}
