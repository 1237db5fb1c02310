// src/handlers/settings.rs

use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use super::auth::normalize_email;
use crate::{
    error::AppError,
    models::user::{ChangePasswordRequest, UpdateProfileRequest},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::Claims,
    },
};

/// Updates name, email and phone number of the current user.
#[utoipa::path(
    put,
    path = "/settings/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile updated"),
        (status = 409, description = "Email already in use")
    ),
    security(("bearer" = [])),
    tag = "settings"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(mut payload): Json<UpdateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    payload.email = normalize_email(&payload.email);
    payload.first_name = payload.first_name.trim().to_string();
    payload.last_name = payload.last_name.trim().to_string();

    let user = state.store.update_profile(user_id, &payload).await?;
    Ok(Json(json!({ "success": true, "user": user })))
}

/// Changes the password after checking the current one.
#[utoipa::path(
    post,
    path = "/settings/change-password",
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 401, description = "Current password is incorrect")
    ),
    security(("bearer" = [])),
    tag = "settings"
)]
pub async fn change_password(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(payload): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    let user_id = claims.user_id()?;

    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if !verify_password(&payload.current_password, &user.password)? {
        return Err(AppError::AuthError(
            "Current password is incorrect".to_string(),
        ));
    }

    let hashed = hash_password(&payload.new_password)?;
    state.store.update_password(user_id, &hashed).await?;

    Ok(Json(json!({ "success": true, "message": "Password changed successfully" })))
}
