//! Typed-answer grading.
//!
//! Used when review runs in [`AnswerMode::Type`](crate::settings::AnswerMode::Type):
//! the caller grades the typed answer here and passes the verdict to
//! [`Scheduler::process_review`](crate::scheduler::Scheduler::process_review).

use serde::{Deserialize, Serialize};

/// How forgiving the comparison is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Surrounding whitespace ignored, otherwise exact.
    Strict,
    /// Also case-insensitive.
    #[default]
    Normal,
    /// Also ignores punctuation and repeated whitespace.
    Lenient,
}

/// Normalize `text` for comparison under `strictness`.
pub fn normalize(text: &str, strictness: Strictness) -> String {
    let trimmed = text.trim();
    match strictness {
        Strictness::Strict => trimmed.to_string(),
        Strictness::Normal => trimmed.to_lowercase(),
        Strictness::Lenient => {
            let stripped: String = trimmed
                .to_lowercase()
                .chars()
                .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
                .collect();
            stripped.split_whitespace().collect::<Vec<_>>().join(" ")
        }
    }
}

/// True when `given` matches `expected` under `strictness`.
///
/// An empty answer or an empty expected answer never matches.
pub fn check_answer(given: &str, expected: &str, strictness: Strictness) -> bool {
    if given.is_empty() || expected.is_empty() {
        return false;
    }
    normalize(given, strictness) == normalize(expected, strictness)
}

/// Positional character similarity in `0.0..=1.0` after lenient normalization.
///
/// Counts characters that are equal at the same index and divides by the
/// longer length. Useful for "almost right" feedback.
pub fn similarity(a: &str, b: &str) -> f64 {
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let a: Vec<char> = normalize(a, Strictness::Lenient).chars().collect();
    let b: Vec<char> = normalize(b, Strictness::Lenient).chars().collect();
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 0.0;
    }
    if a == b {
        return 1.0;
    }
    let matches = a.iter().zip(&b).filter(|(x, y)| x == y).count();
    matches as f64 / longest as f64
}
