// src/models/user.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

use super::history::HistoryEntry;

/// Represents the 'users' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,

    /// Unique login identifier.
    pub email: String,
    pub phone_number: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Structured skills summary produced from the latest resume.
    pub skills: String,
    pub total_interviews: i32,
    pub technical_interview: i32,
    pub aptitude_interview: i32,
    pub technical_scores: Vec<f64>,
    pub aptitude_scores: Vec<f64>,

    /// Mean of every technical and aptitude score, two decimals.
    pub overall_score: f64,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// Fields needed to insert a new account. `password` is already hashed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone_number: String,
    pub password: String,
}

/// Which score history a finished session feeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InterviewKind {
    Technical,
    Aptitude,
}

impl InterviewKind {
    pub fn label(&self) -> &'static str {
        match self {
            InterviewKind::Technical => "Technical",
            InterviewKind::Aptitude => "Aptitude",
        }
    }
}

/// DTO for the first signup step; the account is created once the OTP is verified.
#[derive(Debug, Clone, Deserialize, Serialize, Validate, ToSchema)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 50, message = "First name is required."))]
    pub first_name: String,
    #[validate(length(max = 50))]
    pub last_name: String,
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone_number: String,
    #[validate(length(
        min = 4,
        max = 128,
        message = "Password length must be between 4 and 128 characters."
    ))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct VerifyOtpRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(equal = 6, message = "OTP must be 6 digits."))]
    pub otp: String,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for profile updates.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct UpdateProfileRequest {
    #[validate(length(min = 1, max = 50))]
    pub first_name: String,
    #[validate(length(max = 50))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(max = 20))]
    pub phone_number: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1, max = 128))]
    pub current_password: String,
    #[validate(length(min = 4, max = 128))]
    pub new_password: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    #[validate(email)]
    pub email_id: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordOtpRequest {
    #[validate(email)]
    pub email_id: String,
    #[validate(length(equal = 6))]
    pub otp: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    #[validate(email)]
    pub email_id: String,
    #[validate(length(min = 4, max = 128))]
    pub password: String,
}

/// Aggregated dashboard data for the current user.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DashboardResponse {
    pub total_interviews: i32,
    pub technical_interview: i32,
    pub aptitude_interview: i32,
    pub technical_scores: Vec<f64>,
    pub aptitude_scores: Vec<f64>,
    pub overall_score: f64,
    pub recent_history: Vec<HistoryEntry>,
}
