// src/models/answer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Represents one row of the 'user_answers' collection.
/// Append-only; the most recent rows feed the difficulty adjuster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnswerRecord {
    pub id: Uuid,
    pub question_id: Uuid,

    /// Free-form client identifier. `None` for anonymous runs.
    pub user_id: Option<String>,
    pub category: String,
    pub topic: String,
    pub selected_index: usize,
    pub correct_index: usize,
    pub is_correct: bool,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
}

/// DTO for submitting an answer to an adaptive question.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct AnswerRequest {
    pub question_id: Uuid,
    pub selected_index: i64,
    #[validate(length(min = 1, max = 100))]
    pub category: String,
    pub topic: Option<String>,
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AnswerResponse {
    pub is_correct: bool,
    pub correct_answer_text: String,
    pub explanation: String,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    pub user_id: Option<String>,
}

/// Aggregated per-category report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FinalReport {
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score_percent: f64,
    pub strengths: Vec<String>,
    pub weaknesses: Vec<String>,
    pub areas_of_improvement: Vec<String>,
}
