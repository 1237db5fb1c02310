// src/handlers/auth.rs

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use serde_json::json;
use validator::Validate;

use crate::{
    error::AppError,
    models::user::{LoginRequest, NewUser, SignupRequest, VerifyOtpRequest},
    state::AppState,
    utils::{
        hash::{hash_password, verify_password},
        jwt::sign_jwt,
        otp::{OtpRecord, PURPOSE_SIGNUP, generate_otp, otp_key},
    },
};

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Starts a signup: emails an OTP and parks the pending account until it is verified.
///
/// The password is hashed before being parked.
#[utoipa::path(
    post,
    path = "/auth/send-otp",
    request_body = SignupRequest,
    responses(
        (status = 200, description = "OTP sent"),
        (status = 409, description = "Email already registered")
    ),
    tag = "auth"
)]
pub async fn send_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    if state.store.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("User already exists".to_string()));
    }

    let pending = NewUser {
        first_name: payload.first_name.trim().to_string(),
        last_name: payload.last_name.trim().to_string(),
        email: email.clone(),
        phone_number: payload.phone_number.trim().to_string(),
        password: hash_password(&payload.password)?,
    };
    let pending = serde_json::to_value(&pending)
        .map_err(|e| AppError::InternalServerError(e.to_string()))?;

    let code = generate_otp();
    state
        .otp
        .put(
            &otp_key(PURPOSE_SIGNUP, &email),
            &OtpRecord::new(code.clone(), Some(pending)),
            state.config.otp_ttl_secs,
        )
        .await?;
    state.mailer.send_otp(&email, &code, PURPOSE_SIGNUP).await?;

    Ok(Json(json!({ "message": format!("OTP sent to {}", email) })))
}

/// Verifies the signup OTP and creates the account.
#[utoipa::path(
    post,
    path = "/auth/verify-otp",
    request_body = VerifyOtpRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Missing, expired or wrong OTP")
    ),
    tag = "auth"
)]
pub async fn verify_signup_otp(
    State(state): State<AppState>,
    Json(payload): Json<VerifyOtpRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let email = normalize_email(&payload.email);
    let key = otp_key(PURPOSE_SIGNUP, &email);
    let record = state
        .otp
        .get(&key)
        .await?
        .ok_or_else(|| AppError::BadRequest("OTP expired or not requested".to_string()))?;

    if record.code != payload.otp.trim() {
        return Err(AppError::BadRequest("Invalid OTP".to_string()));
    }

    let pending: NewUser = record
        .payload
        .ok_or_else(|| AppError::InternalServerError("OTP record has no pending signup".to_string()))
        .and_then(|v| {
            serde_json::from_value(v).map_err(|e| AppError::InternalServerError(e.to_string()))
        })?;

    let user = state.store.create_user(pending).await?;
    state.otp.remove(&key).await?;

    tracing::info!(user_id = user.id, "Account created");

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "Account verified and created successfully",
            "user": user
        })),
    ))
}

/// Authenticates a user and returns a JWT token.
#[utoipa::path(
    post,
    path = "/auth/signin",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Bearer token issued"),
        (status = 401, description = "Invalid email or password")
    ),
    tag = "auth"
)]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let user = state
        .store
        .find_user_by_email(&normalize_email(&payload.email))
        .await?
        .ok_or_else(|| AppError::AuthError("Invalid email or password".to_string()))?;

    if !verify_password(&payload.password, &user.password)? {
        return Err(AppError::AuthError("Invalid email or password".to_string()));
    }

    let token = sign_jwt(
        user.id,
        &user.email,
        &state.config.jwt_secret,
        state.config.jwt_expiration,
    )?;

    Ok(Json(json!({
        "access_token": token,
        "token_type": "bearer",
        "message": "Login successful",
        "user": user
    })))
}
