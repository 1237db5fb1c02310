// src/models/history.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// Represents the 'history' table: one row per finished session.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, ToSchema)]
pub struct HistoryEntry {
    pub id: i64,
    pub user_id: i64,

    /// "Technical" or "Aptitude".
    pub interview_type: String,
    pub score: f64,
    pub feedback: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewHistoryEntry {
    pub user_id: i64,
    pub interview_type: String,
    pub score: f64,
    pub feedback: Option<String>,
}
