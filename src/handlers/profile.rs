// src/handlers/profile.rs

use axum::{Extension, Json, extract::State};

use crate::{
    config::DASHBOARD_HISTORY_LIMIT,
    error::AppError,
    models::user::DashboardResponse,
    state::AppState,
    utils::jwt::Claims,
};

/// Get current user's counters, score arrays and most recent sessions.
#[utoipa::path(
    get,
    path = "/user/dashboard",
    responses(
        (status = 200, description = "Dashboard of the current user", body = DashboardResponse),
        (status = 404, description = "User not found")
    ),
    security(("bearer" = [])),
    tag = "profile"
)]
pub async fn dashboard(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DashboardResponse>, AppError> {
    let user_id = claims.user_id()?;
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or(AppError::NotFound("User not found".to_string()))?;
    let recent_history = state
        .store
        .recent_history(user_id, DASHBOARD_HISTORY_LIMIT)
        .await?;

    Ok(Json(DashboardResponse {
        total_interviews: user.total_interviews,
        technical_interview: user.technical_interview,
        aptitude_interview: user.aptitude_interview,
        technical_scores: user.technical_scores,
        aptitude_scores: user.aptitude_scores,
        overall_score: user.overall_score,
        recent_history,
    }))
}
