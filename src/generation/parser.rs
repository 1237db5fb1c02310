// src/generation/parser.rs

//! Parsers for model output.
//!
//! JSON answers go through `parse_json_lenient` (strict first, then one
//! fallback path). Template answers for batches go through
//! `parse_template_batch`. Feedback and summaries are line-labelled text.

use std::{collections::HashSet, sync::LazyLock};

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;

use super::{GenerationError, answer_match::resolve_correct_index};
use crate::models::{
    aptitude::BatchQuestion,
    chat_session::SessionSummary,
    question::{GeneratedQuestion, OPTION_COUNT, PADDING_OPTION},
};

static FIRST_BRACE_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)\{.*\}").expect("valid regex"));
static TRAILING_COMMA: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r",\s*([}\]])").expect("valid regex"));
static QUESTION_ANCHOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*Q:").expect("valid regex"));

/// Strips ```json ... ``` or ``` ... ``` code fences from model output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    let inner = text
        .strip_prefix("```json")
        .or_else(|| text.strip_prefix("```"));
    match inner {
        Some(stripped) => stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start()),
        None => text,
    }
}

/// Parses a JSON object out of model text.
///
/// Strict parse first. Otherwise take the first brace-delimited block (after
/// removing code fences), parse it, and finally retry with trailing commas removed.
pub fn parse_json_lenient(text: &str) -> Option<Value> {
    if let Ok(value) = serde_json::from_str::<Value>(text.trim()) {
        return Some(value);
    }

    let block = FIRST_BRACE_BLOCK.find(strip_json_fences(text))?.as_str();
    if let Ok(value) = serde_json::from_str::<Value>(block) {
        return Some(value);
    }

    let cleaned = TRAILING_COMMA.replace_all(block, "$1");
    serde_json::from_str::<Value>(&cleaned).ok()
}

/// Wire shape of a single generated question, tolerant of common key variants.
#[derive(Debug, Deserialize)]
struct RawQuestion {
    #[serde(alias = "question_text", alias = "questionText")]
    question: Option<String>,
    #[serde(alias = "choices", alias = "answers")]
    options: Option<Vec<Value>>,
    #[serde(alias = "correctOptionIndex")]
    correct_index: Option<Value>,
    #[serde(alias = "correct_answer", alias = "correctAnswer")]
    correct_answer_text: Option<Value>,
    #[serde(alias = "explain")]
    explanation: Option<String>,
    subtopic: Option<String>,
}

fn value_to_string(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        other => other.to_string(),
    }
}

fn value_to_index(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Truncates to, or pads up to, exactly `OPTION_COUNT` options.
pub fn normalize_options(mut options: Vec<String>) -> Vec<String> {
    options.truncate(OPTION_COUNT);
    while options.len() < OPTION_COUNT {
        options.push(PADDING_OPTION.to_string());
    }
    options
}

/// Turns model text into a normalized question.
pub fn parse_generated_question(text: &str) -> Result<GeneratedQuestion, GenerationError> {
    let value = parse_json_lenient(text).ok_or(GenerationError::Unparseable)?;
    let raw: RawQuestion = serde_json::from_value(value)
        .map_err(|e| GenerationError::Malformed(e.to_string()))?;

    let question_text = raw
        .question
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or(GenerationError::MissingField("question"))?;

    let options: Vec<String> = raw
        .options
        .unwrap_or_default()
        .iter()
        .map(value_to_string)
        .collect();
    if options.len() < 2 {
        return Err(GenerationError::MissingField("options"));
    }
    let options = normalize_options(options);

    let answer_text = raw.correct_answer_text.as_ref().map(value_to_string);
    let correct_index = resolve_correct_index(
        raw.correct_index.as_ref().and_then(value_to_index),
        &options,
        answer_text.as_deref(),
    );

    Ok(GeneratedQuestion {
        question_text,
        correct_answer_text: options[correct_index].clone(),
        options,
        correct_index,
        explanation: raw.explanation.unwrap_or_default().trim().to_string(),
        subtopic: raw
            .subtopic
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
    })
}

fn capture_line(block: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(block)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().trim().to_string())
}

static FIELD_Q: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"Q:\s*(.*)").expect("valid regex"));
static FIELD_A: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*A\)\s*(.*)").expect("valid regex"));
static FIELD_B: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*B\)\s*(.*)").expect("valid regex"));
static FIELD_C: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*C\)\s*(.*)").expect("valid regex"));
static FIELD_D: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^\s*D\)\s*(.*)").expect("valid regex"));
static FIELD_ANSWER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Answer:\s*([A-Da-d])").expect("valid regex"));
static FIELD_EXPLANATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Explanation:\s*(.*)").expect("valid regex"));

/// Parses the fixed-field template used for batch generation.
///
/// ```text
/// Q: <question>
/// A) <option>
/// B) <option>
/// C) <option>
/// D) <option>
/// Answer: <A-D>
/// Explanation: <text>
/// ```
///
/// Blocks missing any field other than the explanation are skipped, and a
/// question text seen earlier in the batch is dropped.
pub fn parse_template_batch(text: &str) -> Vec<BatchQuestion> {
    let starts: Vec<usize> = QUESTION_ANCHOR.find_iter(text).map(|m| m.start()).collect();
    let mut seen = HashSet::new();
    let mut questions = Vec::new();

    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(text.len());
        let block = &text[start..end];

        let fields = (
            capture_line(block, &FIELD_Q),
            capture_line(block, &FIELD_A),
            capture_line(block, &FIELD_B),
            capture_line(block, &FIELD_C),
            capture_line(block, &FIELD_D),
            capture_line(block, &FIELD_ANSWER),
        );
        let (Some(q), Some(a), Some(b), Some(c), Some(d), Some(answer)) = fields else {
            tracing::debug!("Skipping incomplete question block");
            continue;
        };
        if q.is_empty() || !seen.insert(q.clone()) {
            continue;
        }

        questions.push(BatchQuestion {
            question_text: q,
            option_a: a,
            option_b: b,
            option_c: c,
            option_d: d,
            correct_answer: answer.to_uppercase(),
            explanation: capture_line(block, &FIELD_EXPLANATION).filter(|e| !e.is_empty()),
        });
    }

    questions
}

/// Feedback and score extracted from an evaluation reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    pub feedback: String,
    /// 1-10, or 0 when the reply carried no usable score.
    pub score: i32,
}

/// Parses a `Feedback: ...` / `Score: N` reply. Lines other than the score
/// line form the feedback.
pub fn parse_evaluation(text: &str) -> Evaluation {
    let mut feedback_lines = Vec::new();
    let mut score = 0;

    for line in text.lines() {
        let trimmed = line.trim();
        let lower = trimmed.to_lowercase();
        if let Some(rest) = lower.strip_prefix("score:") {
            let digits: String = rest
                .trim()
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            score = digits.parse::<i32>().unwrap_or(0);
        } else if !trimmed.is_empty() {
            feedback_lines.push(trimmed);
        }
    }

    let feedback = feedback_lines.join(" ").replace("Feedback:", "");
    Evaluation {
        feedback: feedback.trim().to_string(),
        score: if score > 0 { score.clamp(1, 10) } else { 0 },
    }
}

/// Placeholder for sections the summarizer left out.
pub const NOT_AVAILABLE: &str = "Not available";

static SECTION_STRENGTHS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:\d+\.\s*)?\**Strengths?\**\s*:\s*(.+)$").expect("valid regex")
});
static SECTION_WEAKNESSES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:\d+\.\s*)?\**Weakness(?:es)?\**\s*:\s*(.+)$").expect("valid regex")
});
static SECTION_IMPROVEMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?im)^\s*(?:\d+\.\s*)?\**Areas? (?:for|of) Improvement\**\s*:\s*(.+)$")
        .expect("valid regex")
});

/// Parses the end-of-interview summary by its section labels.
pub fn parse_summary(text: &str) -> SessionSummary {
    let section = |pattern: &Regex| {
        capture_line(text, pattern)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| NOT_AVAILABLE.to_string())
    };

    SessionSummary {
        strengths: section(&SECTION_STRENGTHS),
        weaknesses: section(&SECTION_WEAKNESSES),
        areas_of_improvement: section(&SECTION_IMPROVEMENT),
    }
}
