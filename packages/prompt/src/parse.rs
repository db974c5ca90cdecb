//! Extraction of the rating and its explanation from generated text.
//!
//! Parsing never fails loudly: a reply that does not follow the
//! `Rating: X` / `Explanation: <text>` grammar yields absent fields.

use std::sync::LazyLock;

use flood_risk_assessment_models::LikelihoodRating;
use regex::Regex;

/// Captures the whole number after `Rating:` so out-of-scale values such
/// as `7` or `35` can be rejected instead of truncated.
static RATING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"Rating:\s*([0-9]+(?:\.[0-9]+)?)").expect("valid regex"));

static EXPLANATION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)Explanation:\s*(.*)").expect("valid regex"));

/// Rating and explanation read from a rating reply.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ParsedRating {
    /// The rating, if present and within `0..=5`.
    pub rating: Option<LikelihoodRating>,
    /// Text following `Explanation:`, if any.
    pub explanation: Option<String>,
}

/// Reads the first `Rating: X` in `text`.
///
/// Values outside `0..=5` and fractional values yield `None`; nothing
/// is clamped. A zero fraction (`4.0`) reads as the whole number.
#[must_use]
pub fn parse_rating(text: &str) -> Option<LikelihoodRating> {
    let captured = RATING_RE.captures(text)?.get(1)?.as_str();
    let (whole, fraction) = captured.split_once('.').unwrap_or((captured, ""));
    if !fraction.bytes().all(|b| b == b'0') {
        return None;
    }
    LikelihoodRating::from_value(whole.parse().ok()?)
}

/// Returns everything after `Explanation:`, trimmed.
///
/// Missing or blank explanations yield `None`.
#[must_use]
pub fn parse_explanation(text: &str) -> Option<String> {
    let captured = EXPLANATION_RE.captures(text)?.get(1)?.as_str().trim();
    if captured.is_empty() {
        None
    } else {
        Some(captured.to_string())
    }
}

/// Parses both fields of a rating reply.
#[must_use]
pub fn parse_rating_response(text: &str) -> ParsedRating {
    ParsedRating {
        rating: parse_rating(text),
        explanation: parse_explanation(text),
    }
}
