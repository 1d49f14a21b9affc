//! Catalog identifier extraction
//!
//! Scanner input often carries a catalog id directly: a 10-character token
//! in the filename, or an id pasted into a manual search. A found id is
//! trusted over any text similarity, so the search can skip fetching and
//! scoring entirely.

use std::borrow::Cow;
use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use super::regions::Region;

/// Candidate tokens: exactly 10 uppercase alphanumerics on word
/// boundaries. A real id also needs at least one digit, checked
/// separately; plenty of title words are 10 plain letters.
static ID_TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b[0-9A-Z]{10}\b").unwrap());

/// Region tag embedded in a name, e.g. "[uk]".
static REGION_TAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"\[([A-Za-z]{2})\]").unwrap());

/// Catalog identifier: the id code plus the marketplace it belongs to.
/// Equal only when both parts match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CatalogId {
    pub asin: String,
    pub region: Region,
}

impl CatalogId {
    pub fn new(asin: impl Into<String>, region: Region) -> Self {
        Self {
            asin: asin.into(),
            region,
        }
    }

    /// Parse the composite form persisted by the host ("B002V0QK4C_uk").
    /// Identifiers stored before regions existed carry no suffix; those
    /// get the supplied default region.
    pub fn parse_persisted(persisted: &str, default_region: Region) -> Option<CatalogId> {
        let persisted = persisted.trim();
        if persisted.is_empty() {
            return None;
        }
        if let Some((asin, region)) = persisted.rsplit_once('_') {
            if let Ok(region) = region.parse::<Region>() {
                if !asin.is_empty() {
                    return Some(CatalogId::new(asin, region));
                }
            }
        }
        Some(CatalogId::new(persisted, default_region))
    }
}

impl fmt::Display for CatalogId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.asin, self.region.code())
    }
}

/// True when a token is shaped like a catalog id: 10 uppercase
/// alphanumerics with at least one digit.
pub fn is_id_shaped(token: &str) -> bool {
    token.len() == 10
        && token
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_uppercase())
        && token.chars().any(|c| c.is_ascii_digit())
}

/// Find the first embedded catalog id in free text. The text is URL-decoded
/// first; ids frequently arrive inside copied store URLs. The region comes
/// from an embedded tag when present, else the supplied default.
pub fn find_identifier(text: &str, default_region: Region) -> Option<CatalogId> {
    let decoded = urlencoding::decode(text)
        .map(Cow::into_owned)
        .unwrap_or_else(|_| text.to_string());
    let region = find_region_tag(&decoded).unwrap_or(default_region);

    ID_TOKEN
        .find_iter(&decoded)
        .map(|m| m.as_str())
        .find(|token| is_id_shaped(token))
        .map(|token| CatalogId::new(token, region))
}

/// Find a region tag like "[uk]" in free text. Bracketed pairs that are
/// not marketplace codes are ignored.
pub fn find_region_tag(text: &str) -> Option<Region> {
    REGION_TAG
        .captures_iter(text)
        .filter_map(|caps| caps.get(1))
        .find_map(|m| m.as_str().parse::<Region>().ok())
}
