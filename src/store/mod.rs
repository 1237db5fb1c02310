// src/store/mod.rs

//! Storage traits.
//!
//! Every collection sits behind an async trait so handlers never see the
//! backing engine. `PgStore` is the production implementation, `MemoryStore`
//! keeps the same invariants in process for tests and database-less runs.

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    error::AppError,
    models::{
        answer::AnswerRecord,
        aptitude::{AptitudeTest, TestResponse},
        chat_session::{ChatFinalization, ChatSession, Interaction},
        history::{HistoryEntry, NewHistoryEntry},
        question::{Question, QuestionFilter},
        resume::NewResume,
        user::{InterviewKind, NewUser, UpdateProfileRequest, User},
    },
};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Least-used, then oldest, question matching `filter` that has been
    /// served fewer than `QUESTION_REUSE_CAP` times and whose text is not in `exclude`.
    async fn find_reusable(
        &self,
        filter: QuestionFilter<'_>,
        exclude: &[String],
    ) -> Result<Option<Question>, AppError>;

    async fn record_use(&self, id: Uuid) -> Result<(), AppError>;

    /// Inserts `question`, or bumps the usage counter of the stored question
    /// with the same text and returns that one instead.
    async fn upsert(&self, question: Question) -> Result<Question, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, AppError>;

    async fn find_by_text(&self, text: &str) -> Result<Option<Question>, AppError>;
}

#[async_trait]
pub trait AnswerStore: Send + Sync {
    async fn insert_answer(&self, answer: &AnswerRecord) -> Result<(), AppError>;

    /// Newest first, at most `limit` rows.
    async fn recent_answers(
        &self,
        category: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AnswerRecord>, AppError>;

    async fn answers_for(
        &self,
        category: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<AnswerRecord>, AppError>;
}

#[async_trait]
pub trait TestStore: Send + Sync {
    async fn create_test(&self, test: &AptitudeTest) -> Result<(), AppError>;

    async fn find_test(&self, test_id: Uuid, user_id: i64)
    -> Result<Option<AptitudeTest>, AppError>;

    /// Appends `response` unless one with the same question text exists,
    /// then returns the test as stored.
    async fn append_response(
        &self,
        test_id: Uuid,
        response: &TestResponse,
    ) -> Result<AptitudeTest, AppError>;

    async fn set_total_score(&self, test_id: Uuid, total_score: f64) -> Result<(), AppError>;

    /// Sets the completion timestamp. `None` when the test was already completed.
    async fn complete_test(&self, test_id: Uuid) -> Result<Option<AptitudeTest>, AppError>;
}

#[async_trait]
pub trait ChatStore: Send + Sync {
    async fn create_session(&self, session: &ChatSession) -> Result<(), AppError>;

    async fn find_session(
        &self,
        session_id: Uuid,
        user_id: i64,
    ) -> Result<Option<ChatSession>, AppError>;

    /// Appends to a running session. Returns `false` when it has already ended.
    async fn append_interaction(
        &self,
        session_id: Uuid,
        interaction: &Interaction,
    ) -> Result<bool, AppError>;

    /// Ends a running session. Returns `false` when it had already ended.
    async fn finalize_session(
        &self,
        session_id: Uuid,
        finalization: &ChatFinalization,
    ) -> Result<bool, AppError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fails with `Conflict` when the email is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError>;

    /// Fails with `Conflict` when the new email belongs to another account.
    async fn update_profile(
        &self,
        id: i64,
        profile: &UpdateProfileRequest,
    ) -> Result<User, AppError>;

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError>;

    async fn set_skills(&self, id: i64, skills: &str) -> Result<(), AppError>;

    /// Appends a finished session's score, bumps the counters and recomputes
    /// the overall score. Returns the updated user.
    async fn record_session_score(
        &self,
        id: i64,
        kind: InterviewKind,
        score: f64,
    ) -> Result<User, AppError>;
}

#[async_trait]
pub trait HistoryStore: Send + Sync {
    async fn insert_history(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, AppError>;

    /// Newest first.
    async fn recent_history(&self, user_id: i64, limit: i64)
    -> Result<Vec<HistoryEntry>, AppError>;
}

#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn insert_resume(&self, resume: NewResume) -> Result<(), AppError>;
}

/// The full storage surface carried in `AppState`.
#[async_trait]
pub trait Store:
    QuestionStore + AnswerStore + TestStore + ChatStore + UserStore + HistoryStore + ResumeStore
{
    /// Short backend name for the health endpoint.
    fn backend(&self) -> &'static str;

    async fn health_check(&self) -> Result<(), AppError>;
}
