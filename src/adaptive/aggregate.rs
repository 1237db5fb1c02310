// src/adaptive/aggregate.rs

use std::collections::BTreeMap;

use crate::{
    config::MAX_POINTS_PER_QUESTION,
    models::{
        answer::{AnswerRecord, FinalReport},
        chat_session::Interaction,
    },
};

/// Rounds to two decimals.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Score of a test as a percentage of `10 × total_questions`.
pub fn test_percentage(scores: &[i32], total_questions: u32) -> f64 {
    if total_questions == 0 {
        return 0.0;
    }
    let sum: i64 = scores.iter().map(|&s| i64::from(s)).sum();
    round2(sum as f64 * 100.0 / (MAX_POINTS_PER_QUESTION * i64::from(total_questions)) as f64)
}

/// Score of a chat session as a percentage of `10 × interaction_count`.
pub fn chat_percentage(raw_score: i64, interaction_count: usize) -> f64 {
    if interaction_count == 0 {
        return 0.0;
    }
    round2(raw_score as f64 * 100.0 / (MAX_POINTS_PER_QUESTION * interaction_count as i64) as f64)
}

/// Mean of every historical score across both assessment types.
pub fn overall_score(technical: &[f64], aptitude: &[f64]) -> f64 {
    let count = technical.len() + aptitude.len();
    if count == 0 {
        return 0.0;
    }
    let sum: f64 = technical.iter().chain(aptitude.iter()).sum();
    round2(sum / count as f64)
}

/// Counts of interview answers by evaluation band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChatMetrics {
    pub attended: usize,
    /// Scored 9-10.
    pub correct: usize,
    /// Scored 5-8.
    pub partial: usize,
    /// Scored 4 or below, including skipped answers.
    pub wrong: usize,
}

pub fn chat_metrics(interactions: &[Interaction]) -> ChatMetrics {
    interactions
        .iter()
        .fold(ChatMetrics::default(), |mut m, i| {
            m.attended += 1;
            match i.score {
                s if s >= 9 => m.correct += 1,
                5..=8 => m.partial += 1,
                _ => m.wrong += 1,
            }
            m
        })
}

const STRENGTH_ACCURACY: f64 = 0.75;
const WEAKNESS_ACCURACY: f64 = 0.5;
const MIN_TOPIC_ANSWERS: usize = 2;

/// Builds the per-category report from every matching answer.
///
/// A topic needs at least two answers to be classified: accuracy of 0.75 or
/// more makes it a strength, 0.5 or less a weakness. Anything in between
/// stays unclassified.
pub fn topic_report(answers: &[AnswerRecord]) -> FinalReport {
    let total = answers.len();
    let correct = answers.iter().filter(|a| a.is_correct).count();
    let score_percent = if total == 0 {
        0.0
    } else {
        round2(correct as f64 / total as f64 * 100.0)
    };

    // topic -> (answered, correct)
    let mut by_topic: BTreeMap<&str, (usize, usize)> = BTreeMap::new();
    for answer in answers {
        let entry = by_topic.entry(answer.topic.as_str()).or_default();
        entry.0 += 1;
        if answer.is_correct {
            entry.1 += 1;
        }
    }

    let mut strengths = Vec::new();
    let mut weaknesses = Vec::new();
    for (topic, (answered, right)) in by_topic {
        if answered < MIN_TOPIC_ANSWERS {
            continue;
        }
        let accuracy = right as f64 / answered as f64;
        if accuracy >= STRENGTH_ACCURACY {
            strengths.push(topic.to_string());
        } else if accuracy <= WEAKNESS_ACCURACY {
            weaknesses.push(topic.to_string());
        }
    }

    FinalReport {
        total_questions: total,
        correct_answers: correct,
        score_percent,
        strengths,
        areas_of_improvement: weaknesses.clone(),
        weaknesses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    fn answer(topic: &str, is_correct: bool) -> AnswerRecord {
        AnswerRecord {
            id: Uuid::new_v4(),
            question_id: Uuid::new_v4(),
            user_id: None,
            category: "Verbal".to_string(),
            topic: topic.to_string(),
            selected_index: 0,
            correct_index: 0,
            is_correct,
            question_text: "q".to_string(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_percentages_round_to_two_decimals() {
        assert_eq!(test_percentage(&[9, 6, 5], 3), 66.67);
        assert_eq!(test_percentage(&[], 0), 0.0);
        assert_eq!(chat_percentage(17, 3), 56.67);
        assert_eq!(chat_percentage(0, 0), 0.0);
    }

    #[test]
    fn test_overall_score_spans_both_histories() {
        assert_eq!(overall_score(&[80.0], &[50.0, 65.0]), 65.0);
        assert_eq!(overall_score(&[], &[]), 0.0);
        assert_eq!(overall_score(&[10.0, 20.0, 20.0], &[]), 16.67);
    }

    #[test]
    fn test_three_of_four_is_a_strength() {
        let answers = vec![
            answer("Verbal", true),
            answer("Verbal", true),
            answer("Verbal", true),
            answer("Verbal", false),
        ];
        let report = topic_report(&answers);
        assert_eq!(report.total_questions, 4);
        assert_eq!(report.correct_answers, 3);
        assert_eq!(report.score_percent, 75.0);
        assert_eq!(report.strengths, vec!["Verbal".to_string()]);
        assert!(report.weaknesses.is_empty());
    }

    #[test]
    fn test_half_right_is_a_weakness_and_single_answers_are_ignored() {
        let answers = vec![
            answer("Series", true),
            answer("Series", false),
            answer("Ratios", false),
            answer("Blood Relations", true),
            answer("Blood Relations", true),
            answer("Blood Relations", false),
        ];
        let report = topic_report(&answers);
        assert_eq!(report.weaknesses, vec!["Series".to_string()]);
        assert_eq!(report.areas_of_improvement, report.weaknesses);
        // 2/3 sits between the thresholds
        assert!(report.strengths.is_empty());
    }

    #[test]
    fn test_chat_metrics_bands() {
        let make = |score| Interaction {
            question: "q".into(),
            answer: "a".into(),
            feedback: String::new(),
            score,
            timestamp: Utc::now(),
        };
        let metrics = chat_metrics(&[make(10), make(9), make(7), make(5), make(4), make(0)]);
        assert_eq!(
            metrics,
            ChatMetrics {
                attended: 6,
                correct: 2,
                partial: 2,
                wrong: 2
            }
        );
    }
}
