use axum::{extract::Extension, Json};
use serde_json::{json, Value};

use crate::common::auth::{AuthIdentity, Capability};
use crate::domains::users::UserProfile;
use crate::server::app::AppState;
use crate::server::error::ApiError;

/// The caller's account and the capabilities their token grants
pub async fn me(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
) -> Result<Json<UserProfile>, ApiError> {
    let not_found = || ApiError::NotFound("User not found".to_string());

    let id = i32::try_from(identity.subject_id).map_err(|_| not_found())?;
    let user = state.deps.users.get(id).await?.ok_or_else(not_found)?;

    let mut permissions: Vec<String> = identity
        .permissions
        .iter()
        .map(|capability| capability.to_string())
        .collect();
    permissions.sort();

    Ok(Json(UserProfile { user, permissions }))
}

pub async fn list_users(
    identity: AuthIdentity,
    Extension(state): Extension<AppState>,
) -> Result<Json<Value>, ApiError> {
    identity.require(&Capability::READ_USERS)?;

    let users = state.deps.users.list().await?;
    Ok(Json(json!({ "users": users })))
}
