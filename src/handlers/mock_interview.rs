// src/handlers/mock_interview.rs

use axum::{Extension, Json, extract::State};
use chrono::Utc;
use validator::Validate;

use crate::{
    adaptive::aggregate::{chat_metrics, chat_percentage},
    error::AppError,
    generation::{self, parser::NOT_AVAILABLE},
    models::{
        chat_session::{
            ChatFinalization, ChatSession, EvaluateRequest, EvaluateResponse, FinishRequest,
            FinishResponse, Interaction, SessionSummary, StartInterviewResponse,
        },
        history::NewHistoryEntry,
        user::{InterviewKind, User},
    },
    state::AppState,
    utils::jwt::Claims,
};

const EVALUATION_UNAVAILABLE: &str = "Evaluation not available.";

async fn load_user_with_skills(state: &AppState, user_id: i64) -> Result<User, AppError> {
    let user = state
        .store
        .find_user_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    if user.skills.trim().is_empty() {
        return Err(AppError::NotFound(
            "No skills on record, upload a resume first".to_string(),
        ));
    }
    Ok(user)
}

async fn load_running_session(
    state: &AppState,
    session_id: uuid::Uuid,
    user_id: i64,
) -> Result<ChatSession, AppError> {
    let session = state
        .store
        .find_session(session_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Chat session not found".to_string()))?;
    if session.is_finished() {
        return Err(AppError::Conflict("Chat session already finished".to_string()));
    }
    Ok(session)
}

/// Starts a session and asks the first question, based on the resume skills.
#[utoipa::path(
    get,
    path = "/mock-interview/",
    responses(
        (status = 200, description = "Session started", body = StartInterviewResponse),
        (status = 404, description = "No skills on record")
    ),
    security(("bearer" = [])),
    tag = "mock-interview"
)]
pub async fn start_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<StartInterviewResponse>, AppError> {
    let user_id = claims.user_id()?;
    let user = load_user_with_skills(&state, user_id).await?;

    let question = generation::next_technical_question(state.llm.as_ref(), &user.skills, &[]).await?;

    let session = ChatSession::new(user_id);
    state.store.create_session(&session).await?;
    tracing::info!(user_id, session_id = %session.session_id, "Mock interview started");

    Ok(Json(StartInterviewResponse {
        question,
        session_id: session.session_id,
    }))
}

/// Evaluates one answer, records it and asks the next question.
///
/// With `skip_feedback` the answer is recorded with no feedback and a score of 0.
#[utoipa::path(
    post,
    path = "/mock-interview/evaluate",
    request_body = EvaluateRequest,
    responses(
        (status = 200, description = "Answer evaluated", body = EvaluateResponse),
        (status = 404, description = "Chat session not found"),
        (status = 409, description = "Chat session already finished")
    ),
    security(("bearer" = [])),
    tag = "mock-interview"
)]
pub async fn evaluate(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<EvaluateRequest>,
) -> Result<Json<EvaluateResponse>, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;
    let session = load_running_session(&state, req.session_id, user_id).await?;

    let (feedback, score) = if req.skip_feedback {
        (String::new(), 0)
    } else {
        let evaluation =
            generation::evaluate_answer(state.llm.as_ref(), &req.question, &req.answer).await?;
        (evaluation.feedback, evaluation.score)
    };

    // Nothing is stored until the follow-up exists, so a retried answer is counted once.
    let user = load_user_with_skills(&state, user_id).await?;
    let mut asked = session.asked_questions();
    asked.push(req.question.clone());
    let next_question =
        generation::next_technical_question(state.llm.as_ref(), &user.skills, &asked).await?;

    let interaction = Interaction {
        question: req.question,
        answer: req.answer,
        feedback: feedback.clone(),
        score,
        timestamp: Utc::now(),
    };
    if !state
        .store
        .append_interaction(session.session_id, &interaction)
        .await?
    {
        return Err(AppError::Conflict("Chat session already finished".to_string()));
    }

    Ok(Json(EvaluateResponse {
        feedback,
        score,
        next_question,
    }))
}

/// Ends a session: score, model summary, and the user's technical history.
///
/// A failed summary call does not block finishing; the placeholders are stored instead.
#[utoipa::path(
    post,
    path = "/mock-interview/finish",
    request_body = FinishRequest,
    responses(
        (status = 200, description = "Session finished", body = FinishResponse),
        (status = 404, description = "Chat session not found"),
        (status = 409, description = "Chat session already finished")
    ),
    security(("bearer" = [])),
    tag = "mock-interview"
)]
pub async fn finish_interview(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<FinishRequest>,
) -> Result<Json<FinishResponse>, AppError> {
    let user_id = claims.user_id()?;
    let session = load_running_session(&state, req.session_id, user_id).await?;

    let metrics = chat_metrics(&session.interactions);
    let overall_score = chat_percentage(session.raw_score, session.interactions.len());

    let (overall_feedback, summary) = match generation::summarize_session(
        state.llm.as_ref(),
        &session.transcript(),
        &metrics,
        overall_score,
    )
    .await
    {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("Session summary failed: {}", e);
            (
                EVALUATION_UNAVAILABLE.to_string(),
                SessionSummary {
                    strengths: NOT_AVAILABLE.to_string(),
                    weaknesses: NOT_AVAILABLE.to_string(),
                    areas_of_improvement: NOT_AVAILABLE.to_string(),
                },
            )
        }
    };

    let finalization = ChatFinalization {
        overall_score,
        overall_feedback,
        summary,
    };
    if !state
        .store
        .finalize_session(session.session_id, &finalization)
        .await?
    {
        return Err(AppError::Conflict("Chat session already finished".to_string()));
    }

    // A session with no answers is closed without touching the score history.
    if metrics.attended > 0 {
        state
            .store
            .record_session_score(user_id, InterviewKind::Technical, overall_score)
            .await?;
        state
            .store
            .insert_history(NewHistoryEntry {
                user_id,
                interview_type: InterviewKind::Technical.label().to_string(),
                score: overall_score,
                feedback: Some(finalization.overall_feedback.clone()),
            })
            .await?;
    }

    tracing::info!(
        user_id,
        session_id = %session.session_id,
        overall_score,
        attended = metrics.attended,
        "Mock interview finished"
    );

    Ok(Json(FinishResponse {
        overall_feedback: finalization.overall_feedback,
        overall_score,
        questions_attended: metrics.attended,
        strengths: finalization.summary.strengths,
        weaknesses: finalization.summary.weaknesses,
        areas_of_improvement: finalization.summary.areas_of_improvement,
    }))
}
