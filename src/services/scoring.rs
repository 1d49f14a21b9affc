//! Candidate scoring and ranking
//!
//! Each candidate gets a deterministic score built from edit-distance
//! penalties against the local metadata. Low scorers are dropped rather
//! than ranked last; the catalog's own relevance order survives as a small
//! per-position penalty, so text ties break the way the catalog ranked
//! them.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::catalog::{AuthorCandidate, BookCandidate};
use super::identifier::CatalogId;
use super::regions::{display_separators, language_display_name};
use super::text_utils;

/// Starting value before deductions are taken.
pub const INITIAL_SCORE: i64 = 100;
/// At or above this, an automatic search stops offering alternatives.
pub const GOOD_SCORE: i64 = 98;
/// Any score lower than this is dropped, not ranked low.
pub const IGNORE_SCORE: i64 = 45;

/// Title text varies naturally (subtitles, editions); authorship does not.
const TITLE_WEIGHT: i64 = 2;
const AUTHOR_WEIGHT: i64 = 10;

/// Absent ground truth is not free: fixed substitutes when the local field
/// is missing.
const MISSING_TITLE_PENALTY: i64 = 50;
const MISSING_AUTHOR_PENALTY: i64 = 20;

const LANGUAGE_PENALTY: i64 = 2;

/// Local ground truth a candidate list is scored against.
#[derive(Debug, Clone)]
pub struct ScoreInputs<'a> {
    pub local_title: Option<&'a str>,
    pub local_author: Option<&'a str>,
    pub library_language: &'a str,
    pub manual: bool,
    pub today: NaiveDate,
}

/// One ranked search result handed back to the host. `position` is the
/// 1-based rank after sorting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredResult {
    pub id: CatalogId,
    pub score: i64,
    pub display_name: String,
    pub year: Option<i32>,
    pub position: usize,
}

/// Score and rank book candidates in catalog order. Pre-order titles are
/// excluded before scoring but still consume their index slot, so later
/// candidates keep their original-position penalty.
pub fn rank_books(inputs: &ScoreInputs<'_>, candidates: &[BookCandidate]) -> Vec<ScoredResult> {
    let mut accepted = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        if let Some(date) = candidate.release_date {
            if date > inputs.today {
                info!(asin = %candidate.id.asin, release_date = %date, "Excluding pre-order book");
                continue;
            }
        }

        let title_penalty = match inputs.local_title {
            Some(title) => {
                TITLE_WEIGHT * text_utils::comparison_distance(title, &candidate.title) as i64
            }
            None => MISSING_TITLE_PENALTY,
        };
        let author_penalty = match inputs.local_author {
            Some(author) => {
                AUTHOR_WEIGHT
                    * text_utils::comparison_distance(author, &candidate.joined_authors()) as i64
            }
            None => MISSING_AUTHOR_PENALTY,
        };
        // A library language outside the display table can never match.
        let language_penalty = match language_display_name(inputs.library_language) {
            Some(expected) if expected == candidate.language => 0,
            _ => LANGUAGE_PENALTY,
        };

        let penalties = [title_penalty, author_penalty, language_penalty];
        let score = INITIAL_SCORE - penalties.iter().sum::<i64>() - index as i64;

        debug!(
            index = index,
            asin = %candidate.id.asin,
            title = %candidate.title,
            title_penalty = title_penalty,
            author_penalty = author_penalty,
            language_penalty = language_penalty,
            score = score,
            "Scored candidate"
        );

        if score < IGNORE_SCORE {
            debug!(asin = %candidate.id.asin, score = score, "Score below ignore boundary, skipping");
            continue;
        }

        accepted.push(ScoredResult {
            id: candidate.id.clone(),
            score,
            display_name: book_display_name(candidate, inputs.library_language),
            year: candidate.release_date.map(|d| d.year()),
            position: 0,
        });
    }

    finalize(accepted, inputs.manual)
}

/// Score and rank author candidates. No title or language dimension exists
/// for a pure author lookup; the name distance is unweighted.
pub fn rank_authors(
    inputs: &ScoreInputs<'_>,
    candidates: &[AuthorCandidate],
) -> Vec<ScoredResult> {
    let mut accepted = Vec::new();

    for (index, candidate) in candidates.iter().enumerate() {
        let name_penalty = match inputs.local_author {
            Some(author) => text_utils::comparison_distance(author, &candidate.name) as i64,
            None => MISSING_AUTHOR_PENALTY,
        };

        let score = INITIAL_SCORE - name_penalty - index as i64;

        debug!(
            index = index,
            asin = %candidate.id.asin,
            name = %candidate.name,
            name_penalty = name_penalty,
            score = score,
            "Scored author candidate"
        );

        if score < IGNORE_SCORE {
            debug!(asin = %candidate.id.asin, score = score, "Score below ignore boundary, skipping");
            continue;
        }

        accepted.push(ScoredResult {
            id: candidate.id.clone(),
            score,
            display_name: candidate.name.clone(),
            year: None,
            position: 0,
        });
    }

    finalize(accepted, inputs.manual)
}

/// Sort by score, best first, and stamp rank positions. On automatic
/// searches, a good-enough result makes the remaining alternatives noise;
/// manual searches keep everything so the human can pick.
fn finalize(mut results: Vec<ScoredResult>, manual: bool) -> Vec<ScoredResult> {
    results.sort_by(|a, b| b.score.cmp(&a.score));

    if !manual && results.len() > 1 {
        if let Some(cut) = results.iter().position(|r| r.score >= GOOD_SCORE) {
            info!(
                score = results[cut].score,
                "Score is good enough, ignoring the remaining results"
            );
            results.truncate(cut + 1);
        }
    }

    for (index, result) in results.iter_mut().enumerate() {
        result.position = index + 1;
    }

    results
}

/// "\"Title\" by A.C.Doyle w/ S.Vance", separators localized per library
/// language.
fn book_display_name(candidate: &BookCandidate, language: &str) -> String {
    let (title_author, author_narrator) = display_separators(language);
    let title = text_utils::truncate_for_display(&candidate.title);
    let author = candidate
        .authors
        .first()
        .map(|a| text_utils::name_to_initials(a))
        .unwrap_or_default();
    let narrator = candidate
        .narrators
        .first()
        .map(|n| text_utils::name_to_initials(n))
        .unwrap_or_default();

    format!(
        "\"{}\" {} {} {} {}",
        title, title_author, author, author_narrator, narrator
    )
}
