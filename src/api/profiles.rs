//! Profile and role management endpoints

use axum::{
    extract::{Path, State},
    Json,
};
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::profile::{Profile, UpdateRole},
};

use super::CurrentUser;

/// Get the calling user's profile
#[utoipa::path(
    get,
    path = "/profiles/me",
    tag = "profiles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Caller's profile", body = Profile),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<Profile>> {
    let profile = state.services.accounts.me(&identity).await?;
    Ok(Json(profile))
}

/// List all profiles (admin only)
#[utoipa::path(
    get,
    path = "/profiles",
    tag = "profiles",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "All profiles", body = Vec<Profile>),
        (status = 403, description = "Administrator privileges required")
    )
)]
pub async fn list_profiles(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
) -> AppResult<Json<Vec<Profile>>> {
    let profiles = state.services.accounts.list(&identity).await?;
    Ok(Json(profiles))
}

/// Assign a role to a profile (admin only)
#[utoipa::path(
    put,
    path = "/profiles/{id}/role",
    tag = "profiles",
    security(("bearer_auth" = [])),
    params(
        ("id" = Uuid, Path, description = "Profile ID")
    ),
    request_body = UpdateRole,
    responses(
        (status = 200, description = "Role assigned", body = Profile),
        (status = 403, description = "Administrator privileges required"),
        (status = 404, description = "Profile not found")
    )
)]
pub async fn update_role(
    State(state): State<crate::AppState>,
    CurrentUser(identity): CurrentUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateRole>,
) -> AppResult<Json<Profile>> {
    let profile = state
        .services
        .accounts
        .set_role(&identity, id, request.role)
        .await?;
    Ok(Json(profile))
}
