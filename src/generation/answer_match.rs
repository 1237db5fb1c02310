// src/generation/answer_match.rs

//! Inference of the correct option when the model gives no usable index.
//!
//! Strategies run in order and the first hit wins. Each one is a plain
//! function so it can be tested on its own.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::question::OPTION_COUNT;

/// A single way of locating `answer` among `options`.
pub type MatchStrategy = fn(options: &[String], answer: &str) -> Option<usize>;

/// Ordered strategy list used by `resolve_correct_index`.
pub const STRATEGIES: &[(&str, MatchStrategy)] = &[
    ("exact", exact_match),
    ("contains", containment_match),
    ("label_stripped", label_stripped_match),
    ("leading_letter", leading_letter),
];

static OPTION_LABEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Da-d][.)]?\s+|^[A-Da-d][.)]").expect("valid regex"));

fn normalize(s: &str) -> String {
    s.trim().to_lowercase()
}

/// Case-insensitive equality with an option.
pub fn exact_match(options: &[String], answer: &str) -> Option<usize> {
    let answer = normalize(answer);
    options.iter().position(|o| normalize(o) == answer)
}

/// Answer contained in an option or the other way round.
pub fn containment_match(options: &[String], answer: &str) -> Option<usize> {
    let answer = normalize(answer);
    if answer.is_empty() {
        return None;
    }
    options.iter().position(|o| {
        let o = normalize(o);
        !o.is_empty() && (o.contains(&answer) || answer.contains(&o))
    })
}

/// Equality after removing an "A." / "B)" style label from each option.
pub fn label_stripped_match(options: &[String], answer: &str) -> Option<usize> {
    let answer = normalize(answer);
    options
        .iter()
        .position(|o| normalize(&OPTION_LABEL.replace(o.trim(), "")) == answer)
}

/// A lone letter A-D, or one followed by punctuation ("B)", "c. 42"), as an index.
pub fn leading_letter(_options: &[String], answer: &str) -> Option<usize> {
    let mut chars = answer.trim().chars();
    let letter = chars.next()?.to_ascii_uppercase();
    if !('A'..='D').contains(&letter) {
        return None;
    }
    match chars.next() {
        None => {}
        Some(c) if !c.is_alphanumeric() => {}
        Some(_) => return None,
    }
    Some(letter as usize - 'A' as usize)
}

/// Resolves the correct option index, always returning something in `0..OPTION_COUNT`.
///
/// An explicit index wins (clamped into range); otherwise the strategies are
/// tried in order against the answer text; otherwise 0.
pub fn resolve_correct_index(
    explicit: Option<i64>,
    options: &[String],
    answer_text: Option<&str>,
) -> usize {
    let last = OPTION_COUNT as i64 - 1;
    if let Some(index) = explicit {
        return index.clamp(0, last) as usize;
    }

    answer_text
        .and_then(|answer| {
            STRATEGIES.iter().find_map(|(name, strategy)| {
                let hit = strategy(options, answer)?;
                tracing::debug!(strategy = name, index = hit, "Inferred correct option");
                Some(hit)
            })
        })
        .filter(|&i| i < OPTION_COUNT)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn opts(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_exact_match_ignores_case_and_whitespace() {
        let options = opts(&["Paris", "Rome", "Berlin", "Madrid"]);
        assert_eq!(exact_match(&options, "  berlin "), Some(2));
        assert_eq!(exact_match(&options, "Lisbon"), None);
    }

    #[test]
    fn test_containment_either_direction() {
        let options = opts(&["12 km/h", "15 km/h", "18 km/h", "20 km/h"]);
        assert_eq!(containment_match(&options, "15"), Some(1));
        assert_eq!(containment_match(&options, "The answer is 18 km/h"), Some(2));
        assert_eq!(containment_match(&options, ""), None);
    }

    #[test]
    fn test_label_stripped() {
        let options = opts(&["A. 3", "B. 4", "C) 5", "D 6"]);
        assert_eq!(label_stripped_match(&options, "5"), Some(2));
        assert_eq!(label_stripped_match(&options, "6"), Some(3));
    }

    #[test]
    fn test_leading_letter() {
        assert_eq!(leading_letter(&[], "c"), Some(2));
        assert_eq!(leading_letter(&[], "B) 42"), Some(1));
        assert_eq!(leading_letter(&[], "D."), Some(3));
        assert_eq!(leading_letter(&[], "apple"), None);
        assert_eq!(leading_letter(&[], "E"), None);
    }

    #[test]
    fn test_explicit_index_wins_and_is_clamped() {
        let options = opts(&["1", "2", "3", "4"]);
        assert_eq!(resolve_correct_index(Some(2), &options, Some("1")), 2);
        assert_eq!(resolve_correct_index(Some(9), &options, None), 3);
        assert_eq!(resolve_correct_index(Some(-1), &options, None), 0);
    }

    #[test]
    fn test_strategies_run_in_order() {
        // "b" is a substring of "bb" (containment) before the letter rule applies.
        let options = opts(&["aa", "bb", "cc", "dd"]);
        assert_eq!(resolve_correct_index(None, &options, Some("b")), 1);

        let options = opts(&["10", "20", "30", "40"]);
        assert_eq!(resolve_correct_index(None, &options, Some("D")), 3);
    }

    #[test]
    fn test_unresolvable_defaults_to_first() {
        let options = opts(&["10", "20", "30", "40"]);
        assert_eq!(resolve_correct_index(None, &options, Some("fifty")), 0);
        assert_eq!(resolve_correct_index(None, &options, None), 0);
    }
}
