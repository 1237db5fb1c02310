// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
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
        aptitude::{AptitudeTest, TestResponse},
        chat_session::{ChatFinalization, ChatSession, Interaction},
        history::{HistoryEntry, NewHistoryEntry},
        question::{Question, QuestionFilter},
        resume::NewResume,
        user::{InterviewKind, NewUser, UpdateProfileRequest, User},
    },
};

#[derive(Default)]
struct Inner {
    questions: Vec<Question>,
    answers: Vec<AnswerRecord>,
    tests: HashMap<Uuid, AptitudeTest>,
    sessions: HashMap<Uuid, ChatSession>,
    users: Vec<User>,
    history: Vec<HistoryEntry>,
    resumes: Vec<NewResume>,
    next_user_id: i64,
    next_history_id: i64,
}

/// In-process store. Every operation holds one lock, so each call is atomic.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn answer_matches(answer: &AnswerRecord, category: &str, user_id: Option<&str>) -> bool {
    answer.category == category
        && user_id.is_none_or(|uid| answer.user_id.as_deref() == Some(uid))
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn find_reusable(
        &self,
        filter: QuestionFilter<'_>,
        exclude: &[String],
    ) -> Result<Option<Question>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .questions
            .iter()
            .filter(|q| {
                q.category == filter.category
                    && q.topic == filter.topic
                    && q.difficulty == filter.difficulty
                    && q.used_count < QUESTION_REUSE_CAP
                    && !exclude.contains(&q.question_text)
            })
            .min_by_key(|q| (q.used_count, q.created_at))
            .cloned())
    }

    async fn record_use(&self, id: Uuid) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        if let Some(q) = inner.questions.iter_mut().find(|q| q.id == id) {
            q.used_count += 1;
        }
        Ok(())
    }

    async fn upsert(&self, question: Question) -> Result<Question, AppError> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner
            .questions
            .iter_mut()
            .find(|q| q.question_text == question.question_text)
        {
            existing.used_count += 1;
            return Ok(existing.clone());
        }
        inner.questions.push(question.clone());
        Ok(question)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Question>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.questions.iter().find(|q| q.id == id).cloned())
    }

    async fn find_by_text(&self, text: &str) -> Result<Option<Question>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .questions
            .iter()
            .find(|q| q.question_text == text)
            .cloned())
    }
}

#[async_trait]
impl AnswerStore for MemoryStore {
    async fn insert_answer(&self, answer: &AnswerRecord) -> Result<(), AppError> {
        self.inner.lock().await.answers.push(answer.clone());
        Ok(())
    }

    async fn recent_answers(
        &self,
        category: &str,
        user_id: Option<&str>,
        limit: usize,
    ) -> Result<Vec<AnswerRecord>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .answers
            .iter()
            .rev()
            .filter(|a| answer_matches(a, category, user_id))
            .take(limit)
            .cloned()
            .collect())
    }

    async fn answers_for(
        &self,
        category: &str,
        user_id: Option<&str>,
    ) -> Result<Vec<AnswerRecord>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .answers
            .iter()
            .filter(|a| answer_matches(a, category, user_id))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl TestStore for MemoryStore {
    async fn create_test(&self, test: &AptitudeTest) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .tests
            .insert(test.test_id, test.clone());
        Ok(())
    }

    async fn find_test(
        &self,
        test_id: Uuid,
        user_id: i64,
    ) -> Result<Option<AptitudeTest>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .tests
            .get(&test_id)
            .filter(|t| t.user_id == user_id)
            .cloned())
    }

    async fn append_response(
        &self,
        test_id: Uuid,
        response: &TestResponse,
    ) -> Result<AptitudeTest, AppError> {
        let mut inner = self.inner.lock().await;
        let test = inner
            .tests
            .get_mut(&test_id)
            .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;
        if !test.has_response_for(&response.question_text) {
            test.responses.push(response.clone());
        }
        Ok(test.clone())
    }

    async fn set_total_score(&self, test_id: Uuid, total_score: f64) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        if let Some(test) = inner.tests.get_mut(&test_id) {
            test.total_score = total_score;
        }
        Ok(())
    }

    async fn complete_test(&self, test_id: Uuid) -> Result<Option<AptitudeTest>, AppError> {
        let mut inner = self.inner.lock().await;
        match inner.tests.get_mut(&test_id) {
            Some(test) if test.completed_at.is_none() => {
                test.completed_at = Some(Utc::now());
                Ok(Some(test.clone()))
            }
            _ => Ok(None),
        }
    }
}

#[async_trait]
impl ChatStore for MemoryStore {
    async fn create_session(&self, session: &ChatSession) -> Result<(), AppError> {
        self.inner
            .lock()
            .await
            .sessions
            .insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_session(
        &self,
        session_id: Uuid,
        user_id: i64,
    ) -> Result<Option<ChatSession>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .sessions
            .get(&session_id)
            .filter(|s| s.user_id == user_id)
            .cloned())
    }

    async fn append_interaction(
        &self,
        session_id: Uuid,
        interaction: &Interaction,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        match inner.sessions.get_mut(&session_id) {
            Some(session) if !session.is_finished() => {
                session.record_interaction(interaction.clone());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn finalize_session(
        &self,
        session_id: Uuid,
        finalization: &ChatFinalization,
    ) -> Result<bool, AppError> {
        let mut inner = self.inner.lock().await;
        match inner.sessions.get_mut(&session_id) {
            Some(session) if !session.is_finished() => {
                session.overall_score = Some(finalization.overall_score);
                session.overall_feedback = Some(finalization.overall_feedback.clone());
                session.summary = Some(finalization.summary.clone());
                session.ended_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        if inner.users.iter().any(|u| u.email == user.email) {
            return Err(AppError::Conflict(format!(
                "Email '{}' is already registered",
                user.email
            )));
        }
        inner.next_user_id += 1;
        let created = User {
            id: inner.next_user_id,
            first_name: user.first_name,
            last_name: user.last_name,
            email: user.email,
            phone_number: user.phone_number,
            password: user.password,
            skills: String::new(),
            total_interviews: 0,
            technical_interview: 0,
            aptitude_interview: 0,
            technical_scores: Vec::new(),
            aptitude_scores: Vec::new(),
            overall_score: 0.0,
            created_at: Utc::now(),
        };
        inner.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.email == email).cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner.users.iter().find(|u| u.id == id).cloned())
    }

    async fn update_profile(
        &self,
        id: i64,
        profile: &UpdateProfileRequest,
    ) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        if inner
            .users
            .iter()
            .any(|u| u.id != id && u.email == profile.email)
        {
            return Err(AppError::Conflict("Email is already in use".to_string()));
        }
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.first_name = profile.first_name.clone();
        user.last_name = profile.last_name.clone();
        user.email = profile.email.clone();
        user.phone_number = profile.phone_number.clone();
        Ok(user.clone())
    }

    async fn update_password(&self, id: i64, password_hash: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.password = password_hash.to_string();
        Ok(())
    }

    async fn set_skills(&self, id: i64, skills: &str) -> Result<(), AppError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        user.skills = skills.to_string();
        Ok(())
    }

    async fn record_session_score(
        &self,
        id: i64,
        kind: InterviewKind,
        score: f64,
    ) -> Result<User, AppError> {
        let mut inner = self.inner.lock().await;
        let user = inner
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
        match kind {
            InterviewKind::Technical => {
                user.technical_scores.push(score);
                user.technical_interview += 1;
            }
            InterviewKind::Aptitude => {
                user.aptitude_scores.push(score);
                user.aptitude_interview += 1;
            }
        }
        user.total_interviews += 1;
        user.overall_score = overall_score(&user.technical_scores, &user.aptitude_scores);
        Ok(user.clone())
    }
}

#[async_trait]
impl HistoryStore for MemoryStore {
    async fn insert_history(&self, entry: NewHistoryEntry) -> Result<HistoryEntry, AppError> {
        let mut inner = self.inner.lock().await;
        inner.next_history_id += 1;
        let created = HistoryEntry {
            id: inner.next_history_id,
            user_id: entry.user_id,
            interview_type: entry.interview_type,
            score: entry.score,
            feedback: entry.feedback,
            created_at: Utc::now(),
        };
        inner.history.push(created.clone());
        Ok(created)
    }

    async fn recent_history(
        &self,
        user_id: i64,
        limit: i64,
    ) -> Result<Vec<HistoryEntry>, AppError> {
        let inner = self.inner.lock().await;
        Ok(inner
            .history
            .iter()
            .rev()
            .filter(|h| h.user_id == user_id)
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ResumeStore for MemoryStore {
    async fn insert_resume(&self, resume: NewResume) -> Result<(), AppError> {
        self.inner.lock().await.resumes.push(resume);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    fn backend(&self) -> &'static str {
        "memory"
    }

    async fn health_check(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::question::{Difficulty, GeneratedQuestion};

    fn question(text: &str) -> Question {
        Question::from_generated(
            GeneratedQuestion {
                question_text: text.to_string(),
                options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
                correct_index: 0,
                correct_answer_text: "1".into(),
                explanation: String::new(),
                subtopic: None,
            },
            "Quantitative",
            "Arithmetic",
            Difficulty::Easy,
        )
    }

    fn filter() -> QuestionFilter<'static> {
        QuestionFilter {
            category: "Quantitative",
            topic: "Arithmetic",
            difficulty: Difficulty::Easy,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser {
            first_name: "Ada".into(),
            last_name: "L".into(),
            email: email.into(),
            phone_number: "123".into(),
            password: "hash".into(),
        }
    }

    #[tokio::test]
    async fn test_upsert_same_text_increments_existing() {
        let store = MemoryStore::new();
        let first = store.upsert(question("Q?")).await.unwrap();
        assert_eq!(first.used_count, 1);

        let second = store.upsert(question("Q?")).await.unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.used_count, 2);
        assert_eq!(store.find_by_text("Q?").await.unwrap().unwrap().used_count, 2);
    }

    #[tokio::test]
    async fn test_reuse_is_capped() {
        let store = MemoryStore::new();
        let q = store.upsert(question("Capped?")).await.unwrap();

        assert!(store.find_reusable(filter(), &[]).await.unwrap().is_some());
        store.record_use(q.id).await.unwrap();
        assert!(store.find_reusable(filter(), &[]).await.unwrap().is_some());
        store.record_use(q.id).await.unwrap();
        // used_count == 3
        assert!(store.find_reusable(filter(), &[]).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_reuse_prefers_least_used_and_honours_exclusions() {
        let store = MemoryStore::new();
        let busy = store.upsert(question("Busy?")).await.unwrap();
        store.record_use(busy.id).await.unwrap();
        store.upsert(question("Fresh?")).await.unwrap();

        let picked = store.find_reusable(filter(), &[]).await.unwrap().unwrap();
        assert_eq!(picked.question_text, "Fresh?");

        let picked = store
            .find_reusable(filter(), &["Fresh?".to_string()])
            .await
            .unwrap()
            .unwrap();
        assert_eq!(picked.question_text, "Busy?");
    }

    fn aptitude_test(user_id: i64) -> AptitudeTest {
        let req = crate::models::aptitude::CreateTestRequest {
            question_type: "Verbal".into(),
            difficulty: "easy".into(),
            total_questions: 2,
            time_per_question: 30,
            topics: vec![],
        };
        AptitudeTest::new(user_id, &req, Vec::new())
    }

    fn response(text: &str, score: i32) -> TestResponse {
        TestResponse {
            question_text: text.to_string(),
            options: vec!["1".into(), "2".into(), "3".into(), "4".into()],
            correct_answer: "A".to_string(),
            user_answer: "A".to_string(),
            is_correct: true,
            time_taken: 5,
            score,
            explanation: None,
        }
    }

    #[tokio::test]
    async fn test_append_response_is_idempotent_by_text() {
        let store = MemoryStore::new();
        let test = aptitude_test(1);
        store.create_test(&test).await.unwrap();

        store.append_response(test.test_id, &response("Q1", 9)).await.unwrap();
        let stored = store
            .append_response(test.test_id, &response("Q1", 10))
            .await
            .unwrap();
        assert_eq!(stored.responses.len(), 1);
        assert_eq!(stored.responses[0].score, 9);
    }

    #[tokio::test]
    async fn test_complete_test_only_once() {
        let store = MemoryStore::new();
        let test = aptitude_test(1);
        store.create_test(&test).await.unwrap();

        assert!(store.find_test(test.test_id, 2).await.unwrap().is_none());
        assert!(store.complete_test(test.test_id).await.unwrap().is_some());
        assert!(store.complete_test(test.test_id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@x.io")).await.unwrap();
        let err = store.create_user(new_user("a@x.io")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_record_session_score_updates_overall() {
        let store = MemoryStore::new();
        let user = store.create_user(new_user("b@x.io")).await.unwrap();
        store
            .record_session_score(user.id, InterviewKind::Aptitude, 80.0)
            .await
            .unwrap();
        let updated = store
            .record_session_score(user.id, InterviewKind::Technical, 65.0)
            .await
            .unwrap();
        assert_eq!(updated.total_interviews, 2);
        assert_eq!(updated.aptitude_interview, 1);
        assert_eq!(updated.technical_interview, 1);
        assert_eq!(updated.overall_score, 72.5);
    }

    #[tokio::test]
    async fn test_recent_answers_newest_first_and_scoped() {
        let store = MemoryStore::new();
        for (i, user) in ["u1", "u2", "u1"].iter().enumerate() {
            let record = AnswerRecord {
                id: Uuid::new_v4(),
                question_id: Uuid::new_v4(),
                user_id: Some(user.to_string()),
                category: "Verbal".into(),
                topic: "Synonyms".into(),
                selected_index: i,
                correct_index: 0,
                is_correct: i == 0,
                question_text: format!("Q{}", i),
                created_at: Utc::now(),
            };
            store.insert_answer(&record).await.unwrap();
        }
        let recent = store.recent_answers("Verbal", Some("u1"), 10).await.unwrap();
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].question_text, "Q2");
        assert_eq!(store.answers_for("Verbal", None).await.unwrap().len(), 3);
    }
}
