//! Shared text normalization and comparison utilities
//!
//! Scanner titles carry bracketed edition text, marketing words, and
//! punctuation that catalog titles may or may not share. Search queries use
//! [`normalize`]; distance scoring uses the harsher [`reduce_for_comparison`]
//! so punctuation-style differences cost nothing.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Bracketed spans like "(Unabridged)" or "[2nd Edition]", non-greedy.
static BRACKETED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\(\[].*?[\)\]]").unwrap());

/// Marketing words that never help a catalog query.
static STOPWORDS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(official|audiobook|unabridged|abridged)\b").unwrap());

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Turn a raw scanner string into its canonical searchable form: strip
/// diacritics, bracketed spans, stopwords, and punctuation; collapse
/// whitespace; fold case. Pure and idempotent; empty in, empty out.
pub fn normalize(raw: &str) -> String {
    let decomposed: String = raw.nfkd().filter(|c| !is_combining_mark(*c)).collect();
    let stripped = BRACKETED.replace_all(&decomposed, "");
    let stripped = STOPWORDS.replace_all(&stripped, "");
    stripped
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Lowercase and drop `-`, `.`, `,` and spaces entirely. Only used inside
/// distance scoring, where "J.R.R." and "J R R" must compare equal.
pub fn reduce_for_comparison(s: &str) -> String {
    s.to_lowercase().replace(['-', '.', ',', ' '], "")
}

/// Edit distance over the reduced forms of both strings.
pub fn comparison_distance(a: &str, b: &str) -> usize {
    strsim::levenshtein(&reduce_for_comparison(a), &reduce_for_comparison(b))
}

/// Drop bracketed edition text from a display title
/// ("Dune (Unabridged)" -> "Dune").
pub fn simplify_title(title: &str) -> String {
    let stripped = BRACKETED.replace_all(title, "");
    WHITESPACE_RUN.replace_all(&stripped, " ").trim().to_string()
}

/// Shorten a person's name by truncating prenames to initials, keeping the
/// surname whole. 'Arthur Conan Doyle' -> 'A.C.Doyle'. Parts that already
/// are initials pass through unchanged.
pub fn name_to_initials(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    if parts.len() < 2 {
        return name.to_string();
    }

    let mut shortened = String::new();
    for part in &parts[..parts.len() - 1] {
        let already_initial = part.chars().count() <= 2 || part.chars().nth(1) == Some('.');
        if already_initial {
            shortened.push_str(part);
        } else if let Some(first) = part.chars().next() {
            shortened.push(first);
            shortened.push('.');
        }
    }
    shortened.push_str(parts[parts.len() - 1]);
    shortened
}

/// Strip the simple HTML markup catalog summaries arrive with, keeping
/// paragraph and list breaks readable.
pub fn strip_html_tags(s: &str) -> String {
    s.replace("<i>", "")
        .replace("</i>", "")
        .replace("<em>", "")
        .replace("</em>", "")
        .replace("<u>", "")
        .replace("</u>", "")
        .replace("<b>", "")
        .replace("</b>", "")
        .replace("<strong>", "")
        .replace("</strong>", "")
        .replace("<ul>", "")
        .replace("</ul>", "\n")
        .replace("<ol>", "")
        .replace("</ol>", "\n")
        .replace("<li>", " • ")
        .replace("</li>", "\n")
        .replace("<br />", "")
        .replace("<br/>", "")
        .replace("<br>", "")
        .replace("<p>", "")
        .replace("</p>", "\n")
}

/// Truncate long titles for display. The tolerance means a title is only
/// cut when more than a few characters would go.
pub fn truncate_for_display(title: &str) -> String {
    const DISPLAY_LIMIT: usize = 36;
    const TRUNCATED_LEN: usize = 30;

    if title.chars().count() > DISPLAY_LIMIT {
        let cut: String = title.chars().take(TRUNCATED_LEN).collect();
        format!("{}..", cut)
    } else {
        title.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_strips_brackets_and_stopwords() {
        assert_eq!(normalize("The Martian (Unabridged)"), "the martian");
        assert_eq!(normalize("Dune [Official Audiobook]"), "dune");
        assert_eq!(normalize("Project Hail Mary: Audiobook"), "project hail mary");
    }

    #[test]
    fn test_normalize_strips_diacritics_and_punctuation() {
        assert_eq!(normalize("Amélie's Café"), "amelies cafe");
        assert_eq!(normalize("Spider-Man: No Way Home"), "spiderman no way home");
    }

    #[test]
    fn test_normalize_is_idempotent() {
        for s in [
            "The Martian (Unabridged)",
            "Amélie's Café",
            "  spaced   out  ",
            "",
        ] {
            let once = normalize(s);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_normalize_empty_is_empty() {
        assert_eq!(normalize(""), "");
        assert_eq!(normalize("()[]"), "");
    }

    #[test]
    fn test_reduce_for_comparison() {
        assert_eq!(
            reduce_for_comparison("J. R. R. Tolkien"),
            reduce_for_comparison("J R R Tolkien")
        );
        assert_eq!(
            reduce_for_comparison("J. R. R. Tolkien"),
            reduce_for_comparison("jrrtolkien")
        );
    }

    #[test]
    fn test_comparison_distance() {
        assert_eq!(comparison_distance("Jane Doe", "jane doe"), 0);
        assert_eq!(comparison_distance("J.R.R. Tolkien", "J R R Tolkien"), 0);
        assert_eq!(comparison_distance("kitten", "sitting"), 3);
    }

    #[test]
    fn test_simplify_title() {
        assert_eq!(simplify_title("Dune (Unabridged)"), "Dune");
        assert_eq!(simplify_title("Dune"), "Dune");
        assert_eq!(
            simplify_title("Mistborn [The Final Empire] (Unabridged)"),
            "Mistborn"
        );
    }

    #[test]
    fn test_name_to_initials() {
        assert_eq!(name_to_initials("Arthur Conan Doyle"), "A.C.Doyle");
        assert_eq!(name_to_initials("J.R.R. Tolkien"), "J.R.R.Tolkien");
        assert_eq!(name_to_initials("Plato"), "Plato");
    }

    #[test]
    fn test_strip_html_tags() {
        assert_eq!(strip_html_tags("<i>Hi</i> <b>there</b>"), "Hi there");
        assert_eq!(
            strip_html_tags("<p>One</p><ul><li>a</li><li>b</li></ul>"),
            "One\n • a\n • b\n\n"
        );
    }

    #[test]
    fn test_truncate_for_display() {
        assert_eq!(truncate_for_display("Dune"), "Dune");
        let long = "A Very Long Subtitled Title That Keeps Going On";
        assert_eq!(truncate_for_display(long), format!("{}..", &long[..30]));
    }
}
