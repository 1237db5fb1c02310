// src/generation/mod.rs

//! Text-generation gateway.
//!
//! Builds prompts, sends them through a `TextGenerator` and parses the reply
//! into domain records. Nothing here retries a failed model call, except
//! `next_technical_question`, which asks again when the model repeats itself.

use thiserror::Error;
use tracing::{info, warn};

use crate::{
    adaptive::aggregate::ChatMetrics,
    llm_client::{LlmError, Prompt, TextGenerator},
    models::{
        aptitude::BatchQuestion, chat_session::SessionSummary, question::Difficulty,
        question::GeneratedQuestion,
    },
};

pub mod answer_match;
pub mod parser;
pub mod prompts;

pub use parser::Evaluation;

/// Attempts at getting a technical question the session has not seen yet.
const MAX_QUESTION_ATTEMPTS: usize = 5;

#[derive(Debug, Error)]
pub enum GenerationError {
    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error("model output contained no parseable JSON")]
    Unparseable,

    #[error("model output had an unexpected shape: {0}")]
    Malformed(String),

    #[error("model output is missing `{0}`")]
    MissingField(&'static str),

    #[error("model output contained no usable content")]
    Empty,
}

/// Generates one multiple-choice question in structured-output mode.
pub async fn generate_question(
    llm: &dyn TextGenerator,
    category: &str,
    topic: &str,
    difficulty: Difficulty,
    previous: &[String],
) -> Result<GeneratedQuestion, GenerationError> {
    let prompt = Prompt::json(
        prompts::single_question(category, topic, difficulty, previous),
        prompts::question_schema(),
    );
    let text = llm.generate(&prompt).await?;
    parser::parse_generated_question(&text)
}

/// Generates up to `count` template-formatted questions for an aptitude test.
///
/// Fails with `Empty` when no block of the reply was complete.
pub async fn generate_batch(
    llm: &dyn TextGenerator,
    question_type: &str,
    difficulty: &str,
    topics: &[String],
    count: u32,
) -> Result<Vec<BatchQuestion>, GenerationError> {
    let prompt = Prompt::text(prompts::question_batch(
        question_type,
        difficulty,
        topics,
        count,
    ));
    let text = llm.generate(&prompt).await?;

    let mut questions = parser::parse_template_batch(&text);
    if questions.is_empty() {
        return Err(GenerationError::Empty);
    }
    questions.truncate(count as usize);

    if questions.len() < count as usize {
        info!(
            requested = count,
            parsed = questions.len(),
            "Model returned fewer questions than requested"
        );
    }
    Ok(questions)
}

fn first_line(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .find(|l| !l.is_empty())
        .map(|l| l.trim_matches('"').trim().to_string())
}

fn already_asked(previous: &[String], candidate: &str) -> bool {
    previous
        .iter()
        .any(|p| p.trim().eq_ignore_ascii_case(candidate))
}

/// Asks for the next interview question, avoiding repeats within the session.
///
/// After `MAX_QUESTION_ATTEMPTS` repeats the last candidate is returned anyway.
pub async fn next_technical_question(
    llm: &dyn TextGenerator,
    skills: &str,
    previous: &[String],
) -> Result<String, GenerationError> {
    let prompt = Prompt::text(prompts::technical_question(skills, previous));
    let mut candidate = String::new();

    for attempt in 1..=MAX_QUESTION_ATTEMPTS {
        let text = llm.generate(&prompt).await?;
        candidate = first_line(&text).ok_or(GenerationError::Empty)?;
        if !already_asked(previous, &candidate) {
            return Ok(candidate);
        }
        warn!(attempt, "Model repeated an earlier interview question");
    }

    Ok(candidate)
}

/// Evaluates a candidate's answer into feedback plus a 0-10 score.
pub async fn evaluate_answer(
    llm: &dyn TextGenerator,
    question: &str,
    answer: &str,
) -> Result<Evaluation, GenerationError> {
    let text = llm
        .generate(&Prompt::text(prompts::evaluation(question, answer)))
        .await?;
    Ok(parser::parse_evaluation(&text))
}

/// Summarizes a finished chat session. Returns the raw summary text, used as
/// the overall feedback, together with its parsed sections.
pub async fn summarize_session(
    llm: &dyn TextGenerator,
    transcript: &str,
    metrics: &ChatMetrics,
    score_percent: f64,
) -> Result<(String, SessionSummary), GenerationError> {
    let text = llm
        .generate(&Prompt::text(prompts::session_summary(
            transcript,
            metrics,
            score_percent,
        )))
        .await?;
    let summary = parser::parse_summary(&text);
    Ok((text.trim().to_string(), summary))
}

/// Extracts the structured skills summary from resume text.
pub async fn analyze_resume(llm: &dyn TextGenerator, text: &str) -> Result<String, GenerationError> {
    let reply = llm
        .generate(&Prompt::text(prompts::resume_analysis(text)))
        .await?;
    let reply = reply.trim();
    if reply.is_empty() {
        return Err(GenerationError::Empty);
    }
    Ok(reply.to_string())
}

#[cfg(test)]
mod tests {
    use std::sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    };

    use super::*;
    use crate::llm_client::{ResponseFormat, mock::ScriptedClient};

    #[tokio::test]
    async fn test_generate_question_uses_structured_output() {
        let llm = ScriptedClient::new(|prompt| {
            assert!(matches!(prompt.format, ResponseFormat::Json(_)));
            Ok(r#"{"question": "1+1?", "options": ["1","2","3","4"], "correct_index": 1}"#.into())
        });
        let q = generate_question(&llm, "Quantitative", "Arithmetic", Difficulty::Easy, &[])
            .await
            .unwrap();
        assert_eq!(q.correct_answer_text, "2");
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_generate_question_is_not_retried() {
        let llm = ScriptedClient::always("I can't do that");
        let result =
            generate_question(&llm, "Verbal", "Synonyms", Difficulty::Medium, &[]).await;
        assert!(matches!(result, Err(GenerationError::Unparseable)));
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_llm_failure_surfaces() {
        let llm = ScriptedClient::failing();
        let result = evaluate_answer(&llm, "q", "a").await;
        assert!(matches!(result, Err(GenerationError::Llm(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_is_an_error() {
        let llm = ScriptedClient::always("Sorry, no questions today.");
        let result = generate_batch(&llm, "Quantitative", "easy", &[], 5).await;
        assert!(matches!(result, Err(GenerationError::Empty)));
    }

    #[tokio::test]
    async fn test_batch_truncated_to_count() {
        let block = |n: u32| format!("Q: Question {n}?\nA) 1\nB) 2\nC) 3\nD) 4\nAnswer: A\n");
        let text: String = (0..4).map(block).collect();
        let llm = ScriptedClient::always(text);
        let batch = generate_batch(&llm, "Reasoning", "hard", &["Series".into()], 2)
            .await
            .unwrap();
        assert_eq!(batch.len(), 2);
    }

    #[tokio::test]
    async fn test_technical_question_regenerates_on_repeat() {
        let counter = Arc::new(AtomicUsize::new(0));
        let seen = counter.clone();
        let llm = ScriptedClient::new(move |_| {
            let n = seen.fetch_add(1, Ordering::SeqCst);
            Ok(if n < 2 {
                "What is a closure?".to_string()
            } else {
                "\"Explain ownership in Rust.\"\nextra".to_string()
            })
        });
        let previous = vec!["what is a closure?".to_string()];
        let q = next_technical_question(&llm, "Rust", &previous).await.unwrap();
        assert_eq!(q, "Explain ownership in Rust.");
        assert_eq!(counter.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_technical_question_gives_up_after_max_attempts() {
        let llm = ScriptedClient::always("What is a closure?");
        let previous = vec!["What is a closure?".to_string()];
        let q = next_technical_question(&llm, "Rust", &previous).await.unwrap();
        assert_eq!(q, "What is a closure?");
        assert_eq!(llm.calls(), MAX_QUESTION_ATTEMPTS);
    }

    #[tokio::test]
    async fn test_summarize_session_parses_sections() {
        let llm = ScriptedClient::always(
            "1. Strengths: Good basics.\n2. Weakness: Slow.\n3. Areas for Improvement: Practice.",
        );
        let (raw, summary) = summarize_session(&llm, "Bot: hi", &ChatMetrics::default(), 50.0)
            .await
            .unwrap();
        assert!(raw.starts_with("1. Strengths"));
        assert_eq!(summary.strengths, "Good basics.");
        assert_eq!(summary.areas_of_improvement, "Practice.");
    }
}
