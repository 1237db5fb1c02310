// src/adaptive/scoring.rs

//! Per-question score for timed aptitude tests.
//!
//! Fast correct answers earn up to 10 points, slow correct answers a flat 5.
//! Wrong answers still earn 1-3 points, more when answered quickly.

/// Computes the score of one answered question, always in `1..=10`.
///
/// `time_per_question` must be non-zero; the HTTP layer validates it.
pub fn question_score(is_correct: bool, time_taken: u32, time_per_question: u32) -> i32 {
    let ratio = f64::from(time_taken) / f64::from(time_per_question);

    if is_correct {
        if ratio <= 0.5 {
            9 + ((0.5 - ratio) * 2.0).floor() as i32
        } else if ratio <= 0.8 {
            6 + ((0.8 - ratio) * 10.0 / 3.0).floor() as i32
        } else {
            5
        }
    } else {
        (3 - (ratio * 2.0).floor() as i32).clamp(1, 3)
    }
}
