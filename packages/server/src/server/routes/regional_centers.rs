use axum::{
    extract::{Extension, Path, Query},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use super::TOTAL_COUNT_HEADER;
use crate::common::pagination::{Page, PageRequest};
use crate::domains::locations::DistanceUnit;
use crate::domains::regional_centers::{NearestCenter, RegionalCenter, RegionalCenterSummary};
use crate::domains::search::{parse_origin, parse_radius, AttributeFilters, SearchQuery};
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// Search distance for nearest-center lookups: 10 miles, in meters
pub const DEFAULT_NEAREST_DISTANCE_METERS: f64 = 16093.4;

#[derive(Debug, Default, Deserialize)]
pub struct CenterSearchParams {
    pub county: Option<String>,
    pub district: Option<String>,
    pub office_type: Option<String>,
    pub city: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct NearestParams {
    pub lat: Option<String>,
    pub lng: Option<String>,
    pub distance: Option<String>,
    pub page: Option<String>,
    #[serde(rename = "pageSize")]
    pub page_size: Option<String>,
}

/// Every center; those without a resolvable location carry null coordinates
pub async fn list_regional_centers(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<RegionalCenterSummary>>, ApiError> {
    let centers = state.deps.regional_centers.list().await?;

    let unresolved = centers
        .iter()
        .filter(|center| center.resolve_location().is_none())
        .count();
    if unresolved > 0 {
        tracing::debug!(unresolved, "Regional centers without a resolvable location");
    }

    Ok(Json(centers.iter().map(RegionalCenter::summary).collect()))
}

pub async fn search_regional_centers(
    Extension(state): Extension<AppState>,
    Query(params): Query<CenterSearchParams>,
) -> Result<Json<Page<RegionalCenter>>, ApiError> {
    let filters = AttributeFilters::default()
        .with_county(params.county)
        .with_district(params.district)
        .with_office_type(params.office_type)
        .with_city(params.city);
    let page = PageRequest::from_params(params.page.as_deref(), params.page_size.as_deref());

    Ok(Json(state.deps.regional_centers.search(&filters, page).await?))
}

/// Centers within `distance` meters, nearest first
pub async fn nearest_regional_centers(
    Extension(state): Extension<AppState>,
    Query(params): Query<NearestParams>,
) -> Result<impl IntoResponse, ApiError> {
    let origin = parse_origin(params.lat.as_deref(), params.lng.as_deref())?;
    let query = SearchQuery::new(origin)
        .with_unit(DistanceUnit::Meters)
        .with_radius(parse_radius(
            params.distance.as_deref(),
            DEFAULT_NEAREST_DISTANCE_METERS,
        ));
    // Paged only when the caller asks for it
    let query = match PageRequest::from_optional_params(
        params.page.as_deref(),
        params.page_size.as_deref(),
    ) {
        Some(page) => query.with_page(page),
        None => query.without_paging(),
    };

    let page = state
        .deps
        .regional_center_search()
        .search_nearby::<RegionalCenter>(&query)
        .await?;

    let results: Vec<NearestCenter> = page
        .items
        .into_iter()
        .map(|ranked| NearestCenter {
            id: ranked.record.id,
            name: ranked.record.regional_center,
            distance: ranked.distance,
        })
        .collect();

    Ok((
        [(TOTAL_COUNT_HEADER, page.total_count.to_string())],
        Json(results),
    ))
}

pub async fn get_regional_center(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RegionalCenter>, ApiError> {
    let id: i32 = id
        .parse()
        .map_err(|_| ApiError::BadRequest("Invalid regional center id".to_string()))?;

    state
        .deps
        .regional_centers
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound("Regional center not found".to_string()))
}
