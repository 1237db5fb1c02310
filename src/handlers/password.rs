// src/handlers/password.rs

use axum::{Json, extract::State, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use super::auth::normalize_email;
use crate::{
    error::AppError,
    models::user::{ForgotPasswordOtpRequest, ForgotPasswordRequest, ResetPasswordRequest},
    state::AppState,
    utils::{
        hash::hash_password,
        otp::{OtpRecord, PURPOSE_RESET, generate_otp, otp_key},
    },
};

/// Emails a password-reset OTP to a registered address.
#[utoipa::path(
    post,
    path = "/forgot-password/send-otp",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "OTP sent"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn send_reset_otp(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email_id);
    state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let code = generate_otp();
    state
        .otp
        .put(
            &otp_key(PURPOSE_RESET, &email),
            &OtpRecord::new(code.clone(), None),
            state.config.otp_ttl_secs,
        )
        .await?;
    state.mailer.send_otp(&email, &code, PURPOSE_RESET).await?;

    Ok(Json(json!({ "success": true, "message": "OTP sent successfully" })))
}

/// Marks the reset OTP as verified; the reset itself needs this step first.
#[utoipa::path(
    post,
    path = "/forgot-password/verify-otp",
    request_body = ForgotPasswordOtpRequest,
    responses(
        (status = 200, description = "OTP verified"),
        (status = 400, description = "Missing, expired or wrong OTP")
    ),
    tag = "auth"
)]
pub async fn verify_reset_otp(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let key = otp_key(PURPOSE_RESET, &payload.email_id);
    let mut record = state
        .otp
        .get(&key)
        .await?
        .ok_or_else(|| AppError::BadRequest("No OTP requested for this email".to_string()))?;

    if record.code != payload.otp.trim() {
        return Err(AppError::BadRequest("Invalid OTP".to_string()));
    }

    record.verified = true;
    state
        .otp
        .put(&key, &record, state.config.otp_ttl_secs)
        .await?;

    Ok(Json(json!({ "success": true, "message": "OTP verified" })))
}

/// Sets a new password once the reset OTP has been verified. The OTP is consumed.
#[utoipa::path(
    post,
    path = "/forgot-password/reset-password",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset"),
        (status = 400, description = "OTP not verified"),
        (status = 404, description = "User not found")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email_id);
    let key = otp_key(PURPOSE_RESET, &email);
    let verified = state
        .otp
        .get(&key)
        .await?
        .is_some_and(|record| record.verified);
    if !verified {
        return Err(AppError::BadRequest(
            "OTP must be verified before resetting the password".to_string(),
        ));
    }

    let user = state
        .store
        .find_user_by_email(&email)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let hashed = hash_password(&payload.password)?;
    state.store.update_password(user.id, &hashed).await?;
    state.otp.remove(&key).await?;

    tracing::info!(user_id = user.id, "Password reset");

    Ok(Json(json!({ "success": true, "message": "Password reset successfully" })))
}
