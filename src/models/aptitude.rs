// src/models/aptitude.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// A generated question handed to the client when a test is created.
/// Options are labelled A-D, `correct_answer` holds the letter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BatchQuestion {
    pub question_text: String,
    pub option_a: String,
    pub option_b: String,
    pub option_c: String,
    pub option_d: String,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

/// One answered question embedded in an aptitude test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub question_text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub user_answer: String,
    pub is_correct: bool,
    pub time_taken: u32,
    pub score: i32,
    pub explanation: Option<String>,
}

/// Represents the 'aptitude_tests' collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AptitudeTest {
    pub test_id: Uuid,
    pub user_id: i64,
    pub question_type: String,
    pub difficulty: String,
    pub topics: Vec<String>,

    /// The generated questions, answer key included. Submissions are checked
    /// against this list, never against what the client sends back.
    pub questions: Vec<BatchQuestion>,

    /// Number of questions generated for this test; the percentage denominator.
    pub total_questions: u32,
    pub time_per_question: u32,
    pub responses: Vec<TestResponse>,

    /// Percentage of the maximum possible score, two decimals.
    pub total_score: f64,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AptitudeTest {
    pub fn new(user_id: i64, req: &CreateTestRequest, questions: Vec<BatchQuestion>) -> Self {
        Self {
            test_id: Uuid::new_v4(),
            user_id,
            question_type: req.question_type.trim().to_string(),
            difficulty: req.difficulty.trim().to_string(),
            topics: req.topics.clone(),
            total_questions: questions.len() as u32,
            questions,
            time_per_question: req.time_per_question,
            responses: Vec::new(),
            total_score: 0.0,
            started_at: Utc::now(),
            completed_at: None,
        }
    }

    /// The generated question with this text, if it belongs to the test.
    pub fn question(&self, question_text: &str) -> Option<&BatchQuestion> {
        let question_text = question_text.trim();
        self.questions
            .iter()
            .find(|q| q.question_text == question_text)
    }

    pub fn has_response_for(&self, question_text: &str) -> bool {
        self.responses.iter().any(|r| r.question_text == question_text)
    }

    pub fn is_completed(&self) -> bool {
        self.completed_at.is_some()
    }
}

impl BatchQuestion {
    pub fn options(&self) -> Vec<String> {
        vec![
            self.option_a.clone(),
            self.option_b.clone(),
            self.option_c.clone(),
            self.option_d.clone(),
        ]
    }
}

/// DTO for creating a test.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestRequest {
    #[validate(length(min = 1, max = 100))]
    pub question_type: String,
    #[validate(length(min = 1, max = 20))]
    pub difficulty: String,
    #[validate(range(min = 1, max = 50))]
    pub total_questions: u32,
    #[validate(range(min = 1, max = 3600))]
    pub time_per_question: u32,
    #[serde(default)]
    pub topics: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateTestResponse {
    pub message: String,
    pub test_id: Uuid,
    pub questions: Vec<BatchQuestion>,
}

/// DTO for submitting one answer of a running test.
///
/// Clients echo the whole question back; only its text is used to look the
/// question up, the rest is ignored.
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestAnswerRequest {
    pub test_id: Uuid,
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(length(min = 1, max = 5))]
    pub selected_option: String,
    pub time_taken: u32,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitTestAnswerResponse {
    pub message: String,
    pub is_correct: bool,
    pub score: i32,
    pub total_score: f64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CompleteTestResponse {
    pub message: String,
    pub aptitude_score: f64,
    pub overall_score: f64,
}
