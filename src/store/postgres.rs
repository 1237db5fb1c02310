// src/store/postgres.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};
use uuid::Uuid;

use super::{
    AnswerStore, ChatStore, HistoryStore, QuestionStore, ResumeStore, Store, TestStore, UserStore,
};
use crate::{
    adaptive::aggregate::overall_score,
    config::QUESTION_REUSE_CAP,
    error::AppError,
    models::{
        answer::AnswerRecord,
        aptitude::{AptitudeTest, BatchQuestion, TestResponse},
        chat_session::{ChatFinalization, ChatSession, Interaction, SessionSummary},
        history::{HistoryEntry, NewHistoryEntry},
        question::{Difficulty, Question, QuestionFilter},
        resume::NewResume,
        user::{InterviewKind, NewUser, UpdateProfileRequest, User},
    },
};

/// Postgres-backed store. Queries are checked at runtime.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

/// Helper struct for reading rows of the 'questions' table.
#[derive(FromRow)]
struct QuestionRow {
    id: Uuid,
    category: String,
    topic: String,
    subtopic: String,
    difficulty: String,
    question_text: String,
    options: Json<Vec<String>>,
    correct_index: i32,
    correct_answer_text: String,
    explanation: String,
    used_count: i32,
    created_at: DateTime<Utc>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = AppError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let difficulty: Difficulty = row
            .difficulty
            .parse()
            .map_err(AppError::InternalServerError)?;
        Ok(Question {
            id: row.id,
            category: row.category,
            topic: row.topic,
            subtopic: row.subtopic,
            difficulty,
            question_text: row.question_text,
            options: row.options.0,
            correct_index: row.correct_index.max(0) as usize,
            correct_answer_text: row.correct_answer_text,
            explanation: row.explanation,
            used_count: row.used_count,
            created_at: row.created_at,
        })
    }
}

const QUESTION_COLUMNS: &str = "id, category, topic, subtopic, difficulty, question_text, options, \
     correct_index, correct_answer_text, explanation, used_count, created_at";

#[async_trait]
impl QuestionStore for PgStore {
    async fn find_reusable(
        &self,
        filter: QuestionFilter<'_>,
        exclude: &[String],
    ) -> Result<Option<Question>, AppError> {
        let sql = format!(
            r#"
            SELECT {QUESTION_COLUMNS}
            FROM questions
            WHERE category = $1 AND topic = $2 AND difficulty = $3
              AND used_count < $4
              AND NOT (question_text = ANY($5))
            ORDER BY used_count ASC, created_at ASC
            LIMIT 1
            "#
        );
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(filter.category)
            .bind(filter.topic)
            .bind(filter.difficulty.as_str())
            .bind(QUESTION_REUSE_CAP)
            .bind(exclude)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Question::try_from).transpose()
    }

    async fn record_use(&self, id: Uuid) -> Result<(), AppError> {
        sqlx::query("UPDATE questions SET used_count = used_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn upsert(&self, question: Question) -> Result<Question, AppError> {
        let sql = format!(
            r#"
            INSERT INTO questions ({QUESTION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            ON CONFLICT (question_text)
            DO UPDATE SET used_count = questions.used_count + 1
            RETURNING {QUESTION_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(question.id)
            .bind(&question.category)
            .bind(&question.topic)
            .bind(&question.subtopic)
            .bind(question.difficulty.as_str())
            .bind(&question.question_text)
            .bind(Json(&question.options))
            .bind(question.correct_index as i32)
            .bind(&question.correct_answer_text)
            .bind(&question.explanation)
            .bind(question.used_count)
            .bind(question.created_at)
            .fetch_one(&self.pool)
            .await?;
        Question::try_from(row)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE id = $1");
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Question::try_from).transpose()
    }

    async fn find_by_text(&self, text: &str) -> Result<Option<Question>, AppError> {
        let sql = format!("SELECT {QUESTION_COLUMNS} FROM questions WHERE question_text = $1");
        let row = sqlx::query_as::<_, QuestionRow>(&sql)
            .bind(text)
            .fetch_optional(&self.pool)
            .await?;
        row.map(Question::try_from).transpose()
    }
}

#[derive(FromRow)]
struct AnswerRow {
    id: Uuid,
    question_id: Uuid,
    user_id: Option<String>,
    category: String,
    topic: String,
    selected_index: i32,
    correct_index: i32,
    is_correct: bool,
    question_text: String,
    created_at: DateTime<Utc>,
}

impl From<AnswerRow> for AnswerRecord {
    fn from(row: AnswerRow) -> Self {
        AnswerRecord {
            id: row.id,
            question_id: row.question_id,
            user_id: row.user_id,
            category: row.category,
            topic: row.topic,
            selected_index: row.selected_index.max(0) as usize,
            correct_index: row.correct_index.max(0) as usize,
            is_correct: row.is_correct,
            question_text: row.question_text,
            created_at: row.created_at,
        }
    }
}

const ANSWER_COLUMNS: &str = "id, question_id, user_id, category, topic, selected_index, \
     correct_index, is_correct, question_text, created_at";

#[async_trait]
impl AnswerStore for PgStore {
    async fn insert_answer(&self, answer: &AnswerRecord) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO user_answers ({ANSWER_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)"
        );
        sqlx::query(&sql)
            .bind(answer.id)
            .bind(answer.question_id)
            .bind(&answer.user_id)
            .bind(&answer.category)
            .bind(&answer.topic)
            .bind(answer.selected_index as i32)
            .bind(answer.correct_index as i32)
            .bind(answer.is_correct)
            .bind(&answer.question_text)
            .bind(answer.created_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn recent_answers(
        &self,
        category: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AnswerRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {ANSWER_COLUMNS}
            FROM user_answers
            WHERE category = $1 AND ($2::TEXT IS NULL OR user_id = $2)
            ORDER BY created_at DESC
            LIMIT $3
            "#
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(category)
            .bind(user_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(AnswerRecord::from).collect())
    }

    async fn answers_for(
        &self,
        category: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<AnswerRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT {ANSWER_COLUMNS}
            FROM user_answers
            WHERE category = $1 AND ($2::TEXT IS NULL OR user_id = $2)
            ORDER BY created_at ASC
            "#
        );
        let rows = sqlx::query_as::<_, AnswerRow>(&sql)
            .bind(category)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(AnswerRecord::from).collect())
    }
}

#[derive(FromRow)]
struct TestRow {
    test_id: Uuid,
    user_id: i64,
    question_type: String,
    difficulty: String,
    topics: Vec<String>,
    questions: Json<Vec<BatchQuestion>>,
    total_questions: i32,
    time_per_question: i32,
    responses: Json<Vec<TestResponse>>,
    total_score: f64,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl From<TestRow> for AptitudeTest {
    fn from(row: TestRow) -> Self {
        AptitudeTest {
            test_id: row.test_id,
            user_id: row.user_id,
            question_type: row.question_type,
            difficulty: row.difficulty,
            topics: row.topics,
            questions: row.questions.0,
            total_questions: row.total_questions.max(0) as u32,
            time_per_question: row.time_per_question.max(0) as u32,
            responses: row.responses.0,
            total_score: row.total_score,
            started_at: row.started_at,
            completed_at: row.completed_at,
        }
    }
}

const TEST_COLUMNS: &str = "test_id, user_id, question_type, difficulty, topics, questions, \
     total_questions, time_per_question, responses, total_score, started_at, completed_at";

#[async_trait]
impl TestStore for PgStore {
    async fn create_test(&self, test: &AptitudeTest) -> Result<(), AppError> {
        let sql = format!(
            "INSERT INTO aptitude_tests ({TEST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)"
        );
        sqlx::query(&sql)
            .bind(test.test_id)
            .bind(test.user_id)
            .bind(&test.question_type)
            .bind(&test.difficulty)
            .bind(&test.topics)
            .bind(Json(&test.questions))
            .bind(test.total_questions as i32)
            .bind(test.time_per_question as i32)
            .bind(Json(&test.responses))
            .bind(test.total_score)
            .bind(test.started_at)
            .bind(test.completed_at)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_test(
        &self,
        test_id: Uuid,
        user_id: i64,
    ) -> Result<Option<AptitudeTest>, AppError> {
        let sql =
            format!("SELECT {TEST_COLUMNS} FROM aptitude_tests WHERE test_id = $1 AND user_id = $2");
        let row = sqlx::query_as::<_, TestRow>(&sql)
            .bind(test_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AptitudeTest::from))
    }

    async fn append_response(
        &self,
        test_id: Uuid,
        response: &TestResponse,
    ) -> Result<AptitudeTest, AppError> {
        // The guard keeps the append idempotent per question text.
        sqlx::query(
            r#"
            UPDATE aptitude_tests
            SET responses = responses || jsonb_build_array($2::JSONB)
            WHERE test_id = $1
              AND NOT EXISTS (
                  SELECT 1 FROM jsonb_array_elements(responses) r
                  WHERE r->>'questionText' = $3
              )
            "#,
        )
        .bind(test_id)
        .bind(Json(response))
        .bind(&response.question_text)
        .execute(&self.pool)
        .await?;

        let sql = format!("SELECT {TEST_COLUMNS} FROM aptitude_tests WHERE test_id = $1");
        let row = sqlx::query_as::<_, TestRow>(&sql)
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;
        Ok(row.into())
    }

    async fn set_total_score(&self, test_id: Uuid, total_score: f64) -> Result<(), AppError> {
        sqlx::query("UPDATE aptitude_tests SET total_score = $2 WHERE test_id = $1")
            .bind(test_id)
            .bind(total_score)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn complete_test(&self, test_id: Uuid) -> Result<Option<AptitudeTest>, AppError> {
        let sql = format!(
            r#"
            UPDATE aptitude_tests
            SET completed_at = NOW()
            WHERE test_id = $1 AND completed_at IS NULL
            RETURNING {TEST_COLUMNS}
            "#
        );
        let row = sqlx::query_as::<_, TestRow>(&sql)
            .bind(test_id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(AptitudeTest::from))
    }
}

#[derive(FromRow)]
struct SessionRow {
    session_id: Uuid,
    user_id: i64,
    interactions: Json<Vec<Interaction>>,
    raw_score: i64,
    overall_score: Option<f64>,
    overall_feedback: Option<String>,
    strengths: Option<String>,
    weaknesses: Option<String>,
    areas_of_improvement: Option<String>,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
}

impl From<SessionRow> for ChatSession {
    fn from(row: SessionRow) -> Self {
        let summary = match (row.strengths, row.weaknesses, row.areas_of_improvement) {
            (Some(strengths), Some(weaknesses), Some(areas_of_improvement)) => {
                Some(SessionSummary {
                    strengths,
                    weaknesses,
                    areas_of_improvement,
                })
            }
            _ => None,
        };
        ChatSession {
            session_id: row.session_id,
            user_id: row.user_id,
            interactions: row.interactions.0,
            raw_score: row.raw_score,
            overall_score: row.overall_score,
            overall_feedback: row.overall_feedback,
            summary,
            started_at: row.started_at,
            ended_at: row.ended_at,
        }
    }
}

#[async_trait]
impl ChatStore for PgStore {
    async fn create_session(&self, session: &ChatSession) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO chat_sessions (session_id, user_id, interactions, raw_score, started_at)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(session.session_id)
        .bind(session.user_id)
        .bind(Json(&session.interactions))
        .bind(session.raw_score)
        .bind(session.started_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn find_session(
        &self,
        session_id: Uuid,
        user_id: i64,
    ) -> Result<Option<ChatSession>, AppError> {
        let row = sqlx::query_as::<_, SessionRow>(
            r#"
            SELECT session_id, user_id, interactions, raw_score, overall_score, overall_feedback,
                   strengths, weaknesses, areas_of_improvement, started_at, ended_at
            FROM chat_sessions
            WHERE session_id = $1 AND user_id = $2
            "#,
        )
        .bind(session_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(ChatSession::from))
    }

    async fn append_interaction(
        &self,
        session_id: Uuid,
        interaction: &Interaction,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET interactions = interactions || jsonb_build_array($2::JSONB),
                raw_score = raw_score + $3
            WHERE session_id = $1 AND ended_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(Json(interaction))
        .bind(i64::from(interaction.score))
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn finalize_session(
        &self,
        session_id: Uuid,
        finalization: &ChatFinalization,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE chat_sessions
            SET overall_score = $2,
                overall_feedback = $3,
                strengths = $4,
                weaknesses = $5,
                areas_of_improvement = $6,
                ended_at = NOW()
            WHERE session_id = $1 AND ended_at IS NULL
            "#,
        )
        .bind(session_id)
        .bind(finalization.overall_score)
        .bind(&finalization.overall_feedback)
        .bind(&finalization.summary.strengths)
        .bind(&finalization.summary.weaknesses)
        .bind(&finalization.summary.areas_of_improvement)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }
}

const USER_COLUMNS: &str = "id, first_name, last_name, email, phone_number, password, skills, \
     total_interviews, technical_interview, aptitude_interview, technical_scores, \
     aptitude_scores, overall_score, created_at";

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            r#"
            INSERT INTO users (first_name, last_name, email, phone_number, password)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.first_name)
            .bind(&user.last_name)
            .bind(&user.email)
            .bind(&user.phone_number)
            .bind(&user.password)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict(format!("Email '{}' is already registered", user.email))
                } else {
                    tracing::error!("Failed to create user: {:?}", e);
                    AppError::from(e)
                }
            })
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_profile(
        &self,
        id: i64,
        profile: &UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let sql = format!(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, email = $4, phone_number = $5
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(&profile.first_name)
            .bind(&profile.last_name)
            .bind(&profile.email)
            .bind(&profile.phone_number)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::Conflict("Email is already in use".to_string())
                } else {
                    AppError::from(e)
                }
            })?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let result = sqlx::query("UPDATE users SET password = $2 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .execute(&self.pool)
            .await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("User not found".to_string()));
        }
        Ok(())
    }

    async fn set_skills(&self, id: i64, skills: &str) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET skills = $2 WHERE id = $1")
            .bind(id)
            .bind(skills)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_session_score(
        &self,
        id: i64,
        kind: InterviewKind,
        score: f64,
    ) -> Result<User, AppError> {
        let append = match kind {
            InterviewKind::Technical => {
                "technical_scores = array_append(technical_scores, $2), \
                 technical_interview = technical_interview + 1"
            }
            InterviewKind::Aptitude => {
                "aptitude_scores = array_append(aptitude_scores, $2), \
                 aptitude_interview = aptitude_interview + 1"
            }
        };
        let sql = format!(
            "UPDATE users SET {append}, total_interviews = total_interviews + 1 \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        let mut user = sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(score)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        user.overall_score = overall_score(&user.technical_scores, &user.aptitude_scores);
        sqlx::query("UPDATE users SET overall_score = $2 WHERE id = $1")
            .bind(id)
            .bind(user.overall_score)
            .execute(&self.pool)
            .await?;
        Ok(user)
    }
}

#[async_trait]
impl HistoryStore for PgStore {
    async fn insert_history(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, AppError> {
        Ok(sqlx::query_as::<_, HistoryEntry>(
            r#"
            INSERT INTO history (user_id, interview_type, score, feedback)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, interview_type, score, feedback, created_at
            "#,
        )
        .bind(entry.user_id)
        .bind(&entry.interview_type)
        .bind(entry.score)
        .bind(&entry.feedback)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn recent_history(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(sqlx::query_as::<_, HistoryEntry>(
            r#"
            SELECT id, user_id, interview_type, score, feedback, created_at
            FROM history
            WHERE user_id = $1
            ORDER BY created_at DESC, id DESC
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[async_trait]
impl ResumeStore for PgStore {
    async fn insert_resume(&self, resume: NewResume) -> Result<(), AppError> {
        sqlx::query(
            r#"
            INSERT INTO resumes (user_id, file_name, file_type, file_data, description)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(resume.user_id)
        .bind(&resume.file_name)
        .bind(&resume.file_type)
        .bind(&resume.file_data)
        .bind(&resume.description)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    fn backend(&self) -> &'static str {
        "postgres"
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
