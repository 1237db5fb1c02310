// src/handlers/adaptive.rs

use axum::{
    Json,
    extract::{Path, Query, State},
};
use chrono::Utc;
use uuid::Uuid;
use validator::Validate;

use crate::{
    adaptive::{aggregate::topic_report, difficulty::adjust_difficulty},
    error::AppError,
    generation,
    models::{
        answer::{AnswerRecord, AnswerRequest, AnswerResponse, FinalReport, ReportQuery},
        question::{
            Difficulty, OPTION_COUNT, PublicQuestion, Question, QuestionFilter, QuestionRequest,
        },
    },
    state::AppState,
};

const DEFAULT_TOPIC: &str = "General";

fn topic_or_default(topic: Option<&str>) -> String {
    topic
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .unwrap_or(DEFAULT_TOPIC)
        .to_string()
}

/// Delivers the next question for a category.
///
/// * Picks the target difficulty from the caller's recent answers.
/// * Serves a cached question when one is below the reuse cap and not in
///   `previous_questions`.
/// * Otherwise generates one; a generation failure is replaced by the
///   fallback question rather than surfaced.
#[utoipa::path(
    post,
    path = "/get_question",
    request_body = QuestionRequest,
    responses(
        (status = 200, description = "Next question", body = PublicQuestion),
        (status = 400, description = "Missing category or unknown difficulty")
    ),
    tag = "adaptive"
)]
pub async fn get_question(
    State(state): State<AppState>,
    Json(req): Json<QuestionRequest>,
) -> Result<Json<PublicQuestion>, AppError> {
    req.validate()?;

    let category = req.category.trim();
    if category.is_empty() {
        return Err(AppError::BadRequest("category is required".to_string()));
    }
    let topic = topic_or_default(req.topic.as_deref());
    let requested = match req.difficulty.as_deref() {
        Some(d) if !d.trim().is_empty() => d.parse::<Difficulty>().map_err(AppError::BadRequest)?,
        _ => Difficulty::Easy,
    };
    let user_id = req.user_id.as_deref().filter(|u| !u.is_empty());

    let difficulty = adjust_difficulty(state.store.as_ref(), category, user_id, requested).await?;
    tracing::debug!(category, topic = %topic, %requested, %difficulty, "Adjusted difficulty");

    let filter = QuestionFilter {
        category,
        topic: &topic,
        difficulty,
    };
    if let Some(cached) = state
        .store
        .find_reusable(filter, &req.previous_questions)
        .await?
    {
        state.store.record_use(cached.id).await?;
        return Ok(Json(cached.to_public()));
    }

    let question = match generation::generate_question(
        state.llm.as_ref(),
        category,
        &topic,
        difficulty,
        &req.previous_questions,
    )
    .await
    {
        Ok(generated) => Question::from_generated(generated, category, &topic, difficulty),
        Err(e) => {
            tracing::warn!("Question generation failed, serving fallback: {}", e);
            Question::fallback(category, &topic, difficulty)
        }
    };

    let stored = state.store.upsert(question).await?;
    Ok(Json(stored.to_public()))
}

/// Records an answer to a delivered question.
#[utoipa::path(
    post,
    path = "/submit_answer",
    request_body = AnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = AnswerResponse),
        (status = 400, description = "selected_index out of range"),
        (status = 404, description = "Question not found")
    ),
    tag = "adaptive"
)]
pub async fn submit_answer(
    State(state): State<AppState>,
    Json(req): Json<AnswerRequest>,
) -> Result<Json<AnswerResponse>, AppError> {
    req.validate()?;

    let question = state
        .store
        .find_by_id(req.question_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Question not found".to_string()))?;

    if req.selected_index < 0 || req.selected_index >= OPTION_COUNT as i64 {
        return Err(AppError::BadRequest(
            "selected_index out of range".to_string(),
        ));
    }
    let selected_index = req.selected_index as usize;
    let is_correct = selected_index == question.correct_index;

    let record = AnswerRecord {
        id: Uuid::new_v4(),
        question_id: question.id,
        user_id: req.user_id.filter(|u| !u.is_empty()),
        category: req.category.trim().to_string(),
        topic: topic_or_default(req.topic.as_deref()),
        selected_index,
        correct_index: question.correct_index,
        is_correct,
        question_text: question.question_text.clone(),
        created_at: Utc::now(),
    };
    state.store.insert_answer(&record).await?;

    Ok(Json(AnswerResponse {
        is_correct,
        correct_answer_text: question.correct_answer_text,
        explanation: question.explanation,
    }))
}

/// Per-topic strengths and weaknesses for a category.
#[utoipa::path(
    get,
    path = "/final_report/{category}",
    params(
        ("category" = String, Path, description = "Question category"),
        ReportQuery
    ),
    responses((status = 200, description = "Category report", body = FinalReport)),
    tag = "adaptive"
)]
pub async fn final_report(
    State(state): State<AppState>,
    Path(category): Path<String>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<FinalReport>, AppError> {
    let user_id = query.user_id.as_deref().filter(|u| !u.is_empty());
    let answers = state.store.answers_for(category.trim(), user_id).await?;
    Ok(Json(topic_report(&answers)))
}
