//! Post-processing filters applied to generated text after sanitizing.
//!
//! Filters are heuristics, not correctness guarantees. They are pluggable
//! so a deployment can swap in a different strategy or turn filtering
//! off entirely with [`NoopFilter`].

/// Number of leading words that make up a sentence's "leading clause".
const LEADING_CLAUSE_WORDS: usize = 4;

/// A text post-processing stage.
pub trait TextFilter: Send + Sync {
    /// Returns the filtered text.
    fn apply(&self, text: &str) -> String;
}

/// Passes text through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopFilter;

impl TextFilter for NoopFilter {
    fn apply(&self, text: &str) -> String {
        text.to_string()
    }
}

/// Drops a sentence that immediately repeats the leading clause of the
/// sentence before it.
///
/// Models sometimes restate advice back to back ("Residents should
/// evacuate early. Residents should evacuate before ..."). Two adjacent
/// sentences on the same line whose first four words match
/// (case-insensitively, ignoring punctuation) are collapsed to the first.
#[derive(Debug, Clone, Copy, Default)]
pub struct RedundantSentenceFilter;

impl TextFilter for RedundantSentenceFilter {
    fn apply(&self, text: &str) -> String {
        text.split('\n')
            .map(collapse_line)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

fn collapse_line(line: &str) -> String {
    let sentences = split_sentences(line);
    let total = sentences.len();
    if total < 2 {
        return line.to_string();
    }

    let mut kept: Vec<&str> = Vec::with_capacity(total);
    let mut previous_clause: Option<Vec<String>> = None;

    for sentence in sentences {
        let clause = leading_clause(sentence);
        if previous_clause.as_ref() == Some(&clause) && !clause.is_empty() {
            continue;
        }
        previous_clause = Some(clause);
        kept.push(sentence);
    }

    if kept.len() == total {
        return line.to_string();
    }

    let leading_ws = &line[..line.len() - line.trim_start().len()];
    format!("{leading_ws}{}", kept.join(" "))
}

/// Splits a line into trimmed sentences ending in `.`, `!` or `?`
/// followed by whitespace (or the end of the line).
fn split_sentences(line: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = line.char_indices().peekable();

    while let Some((idx, c)) = chars.next() {
        if !matches!(c, '.' | '!' | '?') {
            continue;
        }
        match chars.peek() {
            Some((_, next)) if next.is_whitespace() => {
                let end = idx + c.len_utf8();
                let sentence = line[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
            _ => {}
        }
    }

    let rest = line[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }

    sentences
}

fn leading_clause(sentence: &str) -> Vec<String> {
    sentence
        .split_whitespace()
        .map(|word| {
            word.chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect::<String>()
        })
        .filter(|word| !word.is_empty())
        .take(LEADING_CLAUSE_WORDS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_back_to_back_restatement() {
        let text = "Residents should evacuate early. Residents should evacuate before roads close. \
                    Keep documents dry.";
        assert_eq!(
            RedundantSentenceFilter.apply(text),
            "Residents should evacuate early. Keep documents dry."
        );
    }

    #[test]
    fn keeps_non_adjacent_repeats() {
        let text = "Residents should evacuate early. Water rises fast. Residents should evacuate early.";
        assert_eq!(RedundantSentenceFilter.apply(text), text);
    }

    #[test]
    fn compares_case_and_punctuation_insensitively() {
        let text = "Move your car, now! move YOUR car now to higher ground.";
        assert_eq!(RedundantSentenceFilter.apply(text), "Move your car, now!");
    }

    #[test]
    fn does_not_cross_line_boundaries() {
        let text = "Stay off flooded roads.\nStay off flooded roads at night.";
        assert_eq!(RedundantSentenceFilter.apply(text), text);
    }

    #[test]
    fn leaves_decimals_and_single_sentences_alone() {
        let text = "Expect 2.5 feet of water in the basement";
        assert_eq!(RedundantSentenceFilter.apply(text), text);
    }

    #[test]
    fn noop_filter_is_identity() {
        let text = "Same. Same.";
        assert_eq!(NoopFilter.apply(text), text);
    }
}
