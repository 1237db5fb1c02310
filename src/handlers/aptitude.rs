// src/handlers/aptitude.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    adaptive::{aggregate::test_percentage, scoring::question_score},
    error::AppError,
    generation,
    models::{
        aptitude::{
            AptitudeTest, CompleteTestResponse, CreateTestRequest, CreateTestResponse,
            SubmitTestAnswerRequest, SubmitTestAnswerResponse, TestResponse,
        },
        history::NewHistoryEntry,
        user::InterviewKind,
    },
    state::AppState,
    utils::jwt::Claims,
};

/// Generates a test and stores it, answer key included, with an empty response list.
///
/// The stored question count is the number actually generated, which can be
/// lower than requested.
#[utoipa::path(
    post,
    path = "/aptitude/create-test",
    request_body = CreateTestRequest,
    responses(
        (status = 201, description = "Test created", body = CreateTestResponse),
        (status = 500, description = "Question generation failed")
    ),
    security(("bearer" = [])),
    tag = "aptitude"
)]
pub async fn create_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<CreateTestRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;

    let questions = generation::generate_batch(
        state.llm.as_ref(),
        req.question_type.trim(),
        req.difficulty.trim(),
        &req.topics,
        req.total_questions,
    )
    .await?;

    let test = AptitudeTest::new(user_id, &req, questions.clone());
    state.store.create_test(&test).await?;

    tracing::info!(
        user_id,
        test_id = %test.test_id,
        questions = test.total_questions,
        "Aptitude test created"
    );

    Ok((
        StatusCode::CREATED,
        Json(CreateTestResponse {
            message: "Test created".to_string(),
            test_id: test.test_id,
            questions,
        }),
    ))
}

/// Scores and records one answer.
///
/// A second submission for the same question text leaves the stored list
/// untouched; the response still carries the score this submission would earn.
#[utoipa::path(
    post,
    path = "/aptitude/submit-answer",
    request_body = SubmitTestAnswerRequest,
    responses(
        (status = 200, description = "Answer recorded", body = SubmitTestAnswerResponse),
        (status = 400, description = "Question is not part of this test"),
        (status = 404, description = "Test not found"),
        (status = 409, description = "Test already completed")
    ),
    security(("bearer" = [])),
    tag = "aptitude"
)]
pub async fn submit_answer(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Json(req): Json<SubmitTestAnswerRequest>,
) -> Result<Json<SubmitTestAnswerResponse>, AppError> {
    req.validate()?;
    let user_id = claims.user_id()?;

    let test = state
        .store
        .find_test(req.test_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;
    if test.is_completed() {
        return Err(AppError::Conflict("Test already completed".to_string()));
    }

    let question = test
        .question(&req.question_text)
        .ok_or_else(|| AppError::BadRequest("Question is not part of this test".to_string()))?;

    let correct_answer = question.correct_answer.trim().to_uppercase();
    let user_answer = req.selected_option.trim().to_uppercase();
    let is_correct = user_answer == correct_answer;
    let score = question_score(is_correct, req.time_taken, test.time_per_question);

    let response = TestResponse {
        question_text: question.question_text.clone(),
        options: question.options(),
        correct_answer,
        user_answer,
        is_correct,
        time_taken: req.time_taken,
        score,
        explanation: question.explanation.clone(),
    };

    let updated = state.store.append_response(test.test_id, &response).await?;
    let scores: Vec<i32> = updated.responses.iter().map(|r| r.score).collect();
    let total_score = test_percentage(&scores, updated.total_questions);
    state.store.set_total_score(test.test_id, total_score).await?;

    Ok(Json(SubmitTestAnswerResponse {
        message: "Answer recorded".to_string(),
        is_correct,
        score,
        total_score,
    }))
}

/// Finalizes a test and folds its score into the user's history.
#[utoipa::path(
    post,
    path = "/aptitude/complete-test/{test_id}",
    params(("test_id" = Uuid, Path, description = "Test id")),
    responses(
        (status = 200, description = "Test completed", body = CompleteTestResponse),
        (status = 404, description = "Test not found"),
        (status = 409, description = "Test already completed")
    ),
    security(("bearer" = [])),
    tag = "aptitude"
)]
pub async fn complete_test(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
    Path(test_id): Path<Uuid>,
) -> Result<Json<CompleteTestResponse>, AppError> {
    let user_id = claims.user_id()?;

    state
        .store
        .find_test(test_id, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Test not found".to_string()))?;

    let completed = state
        .store
        .complete_test(test_id)
        .await?
        .ok_or_else(|| AppError::Conflict("Test already completed".to_string()))?;

    let aptitude_score = completed.total_score;
    let user = state
        .store
        .record_session_score(user_id, InterviewKind::Aptitude, aptitude_score)
        .await?;
    state
        .store
        .insert_history(NewHistoryEntry {
            user_id,
            interview_type: InterviewKind::Aptitude.label().to_string(),
            score: aptitude_score,
            feedback: None,
        })
        .await?;

    tracing::info!(user_id, %test_id, aptitude_score, "Aptitude test completed");

    Ok(Json(CompleteTestResponse {
        message: "Aptitude test completed".to_string(),
        aptitude_score,
        overall_score: user.overall_score,
    }))
}
