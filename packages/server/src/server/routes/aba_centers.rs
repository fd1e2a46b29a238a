use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::common::auth::{AuthIdentity, Capability};
use crate::domains::aba_centers::{AbaCenter, AbaCenterInput, AbaCenterSearch};
use crate::server::app::AppState;
use crate::server::error::ApiError;

#[derive(Debug, Default, Deserialize)]
pub struct AbaCenterSearchParams {
    pub city: Option<String>,
    pub service_type: Option<String>,
    pub insurance: Option<String>,
    /// Only the literal `true` turns the filter on
    pub medi_cal: Option<String>,
}

impl AbaCenterSearchParams {
    fn into_search(self) -> AbaCenterSearch {
        let non_blank = |value: Option<String>| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        AbaCenterSearch {
            city: non_blank(self.city),
            service_type: non_blank(self.service_type),
            insurance: non_blank(self.insurance),
            medi_cal_only: self.medi_cal.as_deref() == Some("true"),
        }
    }
}

fn parse_id(id: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(id).map_err(|_| ApiError::BadRequest("Invalid ABA center id".to_string()))
}

fn not_found() -> ApiError {
    ApiError::NotFound("ABA center not found".to_string())
}

pub async fn list_aba_centers(
    Extension(state): Extension<AppState>,
) -> Result<Json<Vec<AbaCenter>>, ApiError> {
    Ok(Json(state.deps.aba_centers.list().await?))
}

pub async fn search_aba_centers(
    Extension(state): Extension<AppState>,
    Query(params): Query<AbaCenterSearchParams>,
) -> Result<Json<Vec<AbaCenter>>, ApiError> {
    let criteria = params.into_search();
    Ok(Json(state.deps.aba_centers.search(&criteria).await?))
}

pub async fn get_aba_center(
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<Json<AbaCenter>, ApiError> {
    let id = parse_id(&id)?;
    state
        .deps
        .aba_centers
        .get(id)
        .await?
        .map(Json)
        .ok_or_else(not_found)
}

pub async fn create_aba_center(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
    Json(input): Json<AbaCenterInput>,
) -> Result<(StatusCode, Json<AbaCenter>), ApiError> {
    identity.require(&Capability::WRITE_ABA_CENTERS)?;
    let input = input.normalized()?;

    let center = state.deps.aba_centers.create(input).await?;
    tracing::info!(
        aba_center_id = %center.id,
        subject_id = identity.subject_id,
        "ABA center created"
    );
    Ok((StatusCode::CREATED, Json(center)))
}

pub async fn update_aba_center(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
    Json(input): Json<AbaCenterInput>,
) -> Result<Json<AbaCenter>, ApiError> {
    identity.require(&Capability::WRITE_ABA_CENTERS)?;
    let id = parse_id(&id)?;
    let input = input.normalized()?;

    let center = state
        .deps
        .aba_centers
        .update(id, input)
        .await?
        .ok_or_else(not_found)?;
    tracing::info!(aba_center_id = %id, subject_id = identity.subject_id, "ABA center updated");
    Ok(Json(center))
}

pub async fn delete_aba_center(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    identity.require(&Capability::WRITE_ABA_CENTERS)?;
    let id = parse_id(&id)?;

    if state.deps.aba_centers.delete(id).await? {
        tracing::info!(aba_center_id = %id, subject_id = identity.subject_id, "ABA center deleted");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(not_found())
    }
}
