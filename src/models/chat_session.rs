// src/models/chat_session.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// One question/answer exchange of a mock interview.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub question: String,
    pub answer: String,
    pub feedback: String,
    /// 1-10 when evaluated, 0 when feedback was skipped.
    pub score: i32,
    pub timestamp: DateTime<Utc>,
}

/// Parsed overall evaluation of a finished session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SessionSummary {
    pub strengths: String,
    pub weaknesses: String,
    pub areas_of_improvement: String,
}

/// Represents the 'chat_sessions' collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatSession {
    pub session_id: Uuid,
    pub user_id: i64,
    pub interactions: Vec<Interaction>,

    /// Sum of interaction scores, maintained on every append.
    pub raw_score: i64,

    /// Percentage of the maximum, set once on finish.
    pub overall_score: Option<f64>,
    pub overall_feedback: Option<String>,
    pub summary: Option<SessionSummary>,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
}

impl ChatSession {
    pub fn new(user_id: i64) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            user_id,
            interactions: Vec::new(),
            raw_score: 0,
            overall_score: None,
            overall_feedback: None,
            summary: None,
            started_at: Utc::now(),
            ended_at: None,
        }
    }

    pub fn record_interaction(&mut self, interaction: Interaction) {
        self.raw_score += i64::from(interaction.score);
        self.interactions.push(interaction);
    }

    pub fn is_finished(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Questions already asked in this session, oldest first.
    pub fn asked_questions(&self) -> Vec<String> {
        self.interactions.iter().map(|i| i.question.clone()).collect()
    }

    /// Plain-text transcript handed to the summarizer.
    pub fn transcript(&self) -> String {
        self.interactions
            .iter()
            .map(|i| {
                format!(
                    "Bot: {}\nUser: {}\nFeedback: {}",
                    i.question, i.answer, i.feedback
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Final fields written when a session is finished.
#[derive(Debug, Clone)]
pub struct ChatFinalization {
    pub overall_score: f64,
    pub overall_feedback: String,
    pub summary: SessionSummary,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartInterviewResponse {
    pub question: String,
    pub session_id: Uuid,
}

/// DTO for evaluating an answer in a running session.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct EvaluateRequest {
    #[validate(length(min = 1, max = 2000, message = "question is required"))]
    pub question: String,
    #[validate(length(min = 1, max = 20000, message = "answer is required"))]
    pub answer: String,
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
    #[serde(default)]
    pub skip_feedback: bool,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EvaluateResponse {
    pub feedback: String,
    pub score: i32,
    pub next_question: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct FinishRequest {
    #[serde(rename = "sessionId")]
    pub session_id: Uuid,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FinishResponse {
    pub overall_feedback: String,
    pub overall_score: f64,
    pub questions_attended: usize,
    pub strengths: String,
    pub weaknesses: String,
    pub areas_of_improvement: String,
}
