//! Strips Markdown formatting artifacts from generated text.

use std::sync::LazyLock;

use regex::Regex;

/// `### Heading` markers at the start of a line.
static HEADING_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*#{1,6}\s+").expect("valid regex"));

/// `**bold**` and `__bold__` markers anywhere in a line.
static BOLD_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\*\*|__").expect("valid regex"));

/// Bullet (`-`, `*`, `+`, `•`) or numbered (`1.`, `2)`) list markers at
/// the start of a line.
static LIST_ITEM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(?:[-*+•]|\d{1,3}[.)])\s+").expect("valid regex"));

/// Removes heading, bold and leading list markers and collapses runs of
/// blank lines to a single blank line.
///
/// Trailing whitespace is trimmed from every line and leading/trailing
/// blank lines are dropped.
#[must_use]
pub fn sanitize(text: &str) -> String {
    let mut lines: Vec<String> = Vec::new();
    let mut previous_blank = false;

    for raw in text.lines() {
        let line = HEADING_RE.replace(raw, "");
        let line = BOLD_RE.replace_all(&line, "");
        let line = LIST_ITEM_RE.replace(&line, "");
        let line = line.trim_end();

        let blank = line.trim().is_empty();
        if blank && previous_blank {
            continue;
        }
        previous_blank = blank;
        lines.push(if blank { String::new() } else { line.to_string() });
    }

    lines.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_markers_and_collapses_blank_lines() {
        assert_eq!(
            sanitize("### Title\n**bold** text\n- item\n\n\n\nmore"),
            "Title\nbold text\nitem\n\nmore"
        );
    }

    #[test]
    fn strips_numbered_and_nested_list_items() {
        assert_eq!(
            sanitize("1. Move valuables upstairs\n  * **Tip:** unplug appliances\n2) Leave early"),
            "Move valuables upstairs\nTip: unplug appliances\nLeave early"
        );
    }

    #[test]
    fn keeps_single_blank_lines_and_inline_content() {
        let text = "Water at 3 feet - roughly knee height - is dangerous.\n\nStay out of it.";
        assert_eq!(sanitize(text), text);
    }

    #[test]
    fn trims_surrounding_blank_lines_and_whitespace_only_lines() {
        assert_eq!(sanitize("\n\n   \n# Heading  \n \t \n\nBody\n\n"), "Heading\n\nBody");
    }

    #[test]
    fn leaves_hash_without_space_alone() {
        assert_eq!(sanitize("#1 priority is safety"), "#1 priority is safety");
    }
}
