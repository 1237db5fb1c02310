// src/adaptive/difficulty.rs

use crate::{
    config::{DIFFICULTY_MIN_SAMPLES, DIFFICULTY_WINDOW},
    error::AppError,
    models::question::Difficulty,
    store::AnswerStore,
};

/// Picks the next difficulty from the correctness of recent answers, newest first.
///
/// Only the first `DIFFICULTY_WINDOW` outcomes are considered. With fewer than
/// `DIFFICULTY_MIN_SAMPLES` outcomes the requested difficulty is returned unchanged.
pub fn next_difficulty(recent_outcomes: &[bool], requested: Difficulty) -> Difficulty {
    let window = &recent_outcomes[..recent_outcomes.len().min(DIFFICULTY_WINDOW)];
    if window.len() < DIFFICULTY_MIN_SAMPLES {
        return requested;
    }

    let correct = window.iter().filter(|&&ok| ok).count();
    let accuracy = correct as f64 / window.len() as f64;

    if accuracy >= 0.8 {
        Difficulty::Hard
    } else if accuracy >= 0.5 {
        Difficulty::Medium
    } else {
        Difficulty::Easy
    }
}

/// Loads the recent answer window for (category[, user]) and applies `next_difficulty`.
pub async fn adjust_difficulty<S: AnswerStore + ?Sized>(
    answers: &S,
    category: &str,
    user_id: Option<&str>,
    requested: Difficulty,
) -> Result<Difficulty, AppError> {
    let recent = answers
        .recent_answers(category, user_id, DIFFICULTY_WINDOW)
        .await?;
    let outcomes: Vec<bool> = recent.iter().map(|a| a.is_correct).collect();
    Ok(next_difficulty(&outcomes, requested))
}
