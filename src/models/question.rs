// src/models/question.rs

use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Placeholder used when the model returns fewer than four options.
pub const PADDING_OPTION: &str = "None of the above";

/// Every stored question carries exactly this many options.
pub const OPTION_COUNT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub fn as_str(&self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Difficulty::Easy),
            "medium" => Ok(Difficulty::Medium),
            "hard" => Ok(Difficulty::Hard),
            other => Err(format!("Unknown difficulty '{}'", other)),
        }
    }
}

/// A cached multiple-choice question.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Question {
    pub id: Uuid,
    pub category: String,
    pub topic: String,
    pub subtopic: String,
    pub difficulty: Difficulty,

    /// Unique across the store; used as the dedup key.
    pub question_text: String,

    /// Always exactly `OPTION_COUNT` entries.
    pub options: Vec<String>,

    /// Index into `options`, in `0..OPTION_COUNT`.
    pub correct_index: usize,
    pub correct_answer_text: String,
    pub explanation: String,

    /// How many times this question has been served.
    pub used_count: i32,
    pub created_at: DateTime<Utc>,
}

/// A single question as produced by the text-generation gateway, already normalized.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratedQuestion {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_index: usize,
    pub correct_answer_text: String,
    pub explanation: String,
    pub subtopic: Option<String>,
}

impl Question {
    /// Builds a fresh, never-served question from gateway output.
    pub fn from_generated(
        generated: GeneratedQuestion,
        category: &str,
        topic: &str,
        difficulty: Difficulty,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            category: category.to_string(),
            topic: topic.to_string(),
            subtopic: generated.subtopic.unwrap_or_else(|| topic.to_string()),
            difficulty,
            question_text: generated.question_text,
            options: generated.options,
            correct_index: generated.correct_index,
            correct_answer_text: generated.correct_answer_text,
            explanation: generated.explanation,
            used_count: 1,
            created_at: Utc::now(),
        }
    }

    /// The guaranteed-valid question served when generation fails.
    pub fn fallback(category: &str, topic: &str, difficulty: Difficulty) -> Self {
        let options: Vec<String> = ["5", "6", "7", "8"].iter().map(|s| s.to_string()).collect();
        Self::from_generated(
            GeneratedQuestion {
                question_text: "What is 5 + 3?".to_string(),
                correct_answer_text: options[3].clone(),
                options,
                correct_index: 3,
                explanation: "5 + 3 = 8".to_string(),
                subtopic: Some("General".to_string()),
            },
            category,
            topic,
            difficulty,
        )
    }

    pub fn to_public(&self) -> PublicQuestion {
        PublicQuestion {
            question_id: self.id,
            question: self.question_text.clone(),
            options: self.options.clone(),
            difficulty: self.difficulty,
            subtopic: self.subtopic.clone(),
        }
    }
}

/// Filter used when looking up a reusable cached question.
#[derive(Debug, Clone, Copy)]
pub struct QuestionFilter<'a> {
    pub category: &'a str,
    pub topic: &'a str,
    pub difficulty: Difficulty,
}

/// DTO for sending a question to the client (excludes answer and explanation).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PublicQuestion {
    pub question_id: Uuid,
    pub question: String,
    pub options: Vec<String>,
    pub difficulty: Difficulty,
    pub subtopic: String,
}

/// DTO for requesting the next adaptive question.
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 100, message = "category is required"))]
    pub category: String,
    #[validate(length(max = 100))]
    pub topic: Option<String>,
    pub difficulty: Option<String>,
    pub user_id: Option<String>,
    /// Question texts the client has already seen in this run.
    #[serde(default)]
    pub previous_questions: Vec<String>,
}
