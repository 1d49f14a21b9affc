//! Primary-author selection from scanner artist strings
//!
//! Artist fields arrive messy: comma-joined co-authors, contributor
//! suffixes ("Jane Doe - translator"), placeholder values. A search query
//! wants exactly one author name, preferably not a contributor.

use once_cell::sync::Lazy;
use regex::Regex;

/// "Name - role" contributor shape. Names that legitimately contain a
/// spaced hyphen match too; the suffix split is the agreed heuristic.
static CONTRIBUTOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(.+?) - (.+)$").unwrap());

/// Leading run of two or more spaced single-letter initials ("J. R. R.").
static SPACED_INITIALS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(?:[A-Za-z]\.\s+)+[A-Za-z]\.").unwrap());

/// Scanner placeholders that must never reach a search query.
const PLACEHOLDER_AUTHORS: &[&str] = &["[Unknown Artist]"];

/// Split a possible contributor entry into the bare name and whether the
/// entry carried a contributor suffix.
pub fn split_contributor(entry: &str) -> (&str, bool) {
    let entry = entry.trim();
    match CONTRIBUTOR.captures(entry) {
        Some(caps) => match caps.get(1) {
            Some(name) => (name.as_str(), true),
            None => (entry, false),
        },
        None => (entry, false),
    }
}

/// True for artist values the scanner uses as "unknown" markers.
pub fn is_placeholder(name: &str) -> bool {
    PLACEHOLDER_AUTHORS.contains(&name.trim())
}

/// Pick the single author to use as a query term.
///
/// The raw artist field is split on `", "`; the first entry without a
/// contributor suffix wins. When every entry is a contributor, the first
/// entry is used anyway. A single contributor-tagged author still has its
/// suffix stripped. An empty artist field falls back to the title, which
/// some scanners populate instead; when both are empty there is nothing to
/// search with.
pub fn resolve_primary_author(
    raw_artist: Option<&str>,
    fallback_title: Option<&str>,
) -> Option<String> {
    let raw = match raw_artist {
        Some(artist) if !artist.trim().is_empty() => artist,
        _ => fallback_title.filter(|title| !title.trim().is_empty())?,
    };

    let entries: Vec<(&str, bool)> = raw.split(", ").map(split_contributor).collect();
    let (chosen, _) = entries
        .iter()
        .copied()
        .find(|(_, contributor)| !contributor)
        .unwrap_or(entries[0]);

    // The all-contributor fallback pick may still carry a suffix.
    let (bare, _) = split_contributor(chosen);
    if is_placeholder(bare) {
        return None;
    }
    Some(bare.to_string())
}

/// Normalize an author name into its search-query form: drop leading
/// honorific tokens and compact a leading run of spaced initials
/// ("Dr. J. R. R. Tolkien" -> "J.R.R. Tolkien").
pub fn search_form(name: &str, honorifics: &[String]) -> String {
    let mut parts: Vec<&str> = name.split_whitespace().collect();
    while let Some(first) = parts.first() {
        if honorifics.iter().any(|h| h.eq_ignore_ascii_case(first)) {
            parts.remove(0);
        } else {
            break;
        }
    }

    let joined = parts.join(" ");
    match SPACED_INITIALS.find(&joined) {
        Some(m) => {
            let compact: String = m.as_str().split_whitespace().collect::<Vec<_>>().concat();
            format!("{}{}", compact, &joined[m.end()..])
        }
        None => joined,
    }
}

/// "Arthur Conan Doyle" -> "Doyle, Arthur Conan", for last-name sorting.
pub fn last_name_first(name: &str) -> String {
    let parts: Vec<&str> = name.split_whitespace().collect();
    match parts.split_last() {
        Some((last, rest)) if !rest.is_empty() => format!("{}, {}", last, rest.join(" ")),
        _ => name.trim().to_string(),
    }
}
