//! Catalog marketplace regions and locale tables
//!
//! The catalog runs a separate marketplace per region, each with its own
//! API top-level domain. Language display names and result separators
//! follow the catalog's own localization.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Marketplace region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Au,
    Ca,
    De,
    Es,
    Fr,
    In,
    It,
    Jp,
    Us,
    Uk,
}

impl Region {
    pub const ALL: &'static [Region] = &[
        Region::Au,
        Region::Ca,
        Region::De,
        Region::Es,
        Region::Fr,
        Region::In,
        Region::It,
        Region::Jp,
        Region::Us,
        Region::Uk,
    ];

    /// Two-letter code, as persisted by the host and embedded in tags.
    pub fn code(&self) -> &'static str {
        match self {
            Region::Au => "au",
            Region::Ca => "ca",
            Region::De => "de",
            Region::Es => "es",
            Region::Fr => "fr",
            Region::In => "in",
            Region::It => "it",
            Region::Jp => "jp",
            Region::Us => "us",
            Region::Uk => "uk",
        }
    }

    /// API top-level domain for this marketplace.
    pub fn tld(&self) -> &'static str {
        match self {
            Region::Au => "com.au",
            Region::Ca => "ca",
            Region::De => "de",
            Region::Es => "es",
            Region::Fr => "fr",
            Region::In => "in",
            Region::It => "it",
            Region::Jp => "co.jp",
            Region::Us => "com",
            Region::Uk => "co.uk",
        }
    }

    /// Human-readable marketplace name.
    pub fn marketplace_name(&self) -> &'static str {
        match self {
            Region::Au => "Australia",
            Region::Ca => "Canada",
            Region::De => "Germany",
            Region::Es => "Spain",
            Region::Fr => "France",
            Region::In => "India",
            Region::It => "Italy",
            Region::Jp => "Japan",
            Region::Us => "United States",
            Region::Uk => "United Kingdom",
        }
    }
}

impl Default for Region {
    fn default() -> Self {
        Region::Us
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Error for region codes outside the marketplace table.
#[derive(Debug, thiserror::Error)]
#[error("unknown region code: {0}")]
pub struct UnknownRegion(String);

impl FromStr for Region {
    type Err = UnknownRegion;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "au" => Ok(Region::Au),
            "ca" => Ok(Region::Ca),
            "de" => Ok(Region::De),
            "es" => Ok(Region::Es),
            "fr" => Ok(Region::Fr),
            "in" => Ok(Region::In),
            "it" => Ok(Region::It),
            "jp" => Ok(Region::Jp),
            "us" => Ok(Region::Us),
            "uk" => Ok(Region::Uk),
            other => Err(UnknownRegion(other.to_string())),
        }
    }
}

/// Catalog display name for a library language tag. Candidates report
/// language as a display string ("English", "Deutsch"), so scoring compares
/// against this table with exact equality.
pub fn language_display_name(tag: &str) -> Option<&'static str> {
    let primary = tag.split(['-', '_']).next().unwrap_or(tag);
    match primary.to_ascii_lowercase().as_str() {
        "en" => Some("English"),
        "de" => Some("Deutsch"),
        "fr" => Some("Français"),
        "it" => Some("Italiano"),
        "ja" => Some("日本語"),
        "es" => Some("Español"),
        _ => None,
    }
}

/// Localized separators used in result display names: title-to-author and
/// author-to-narrator ("\"Dune\" by F.Herbert w/ S.Vance").
pub fn display_separators(tag: &str) -> (&'static str, &'static str) {
    let primary = tag.split(['-', '_']).next().unwrap_or(tag);
    match primary.to_ascii_lowercase().as_str() {
        "de" => ("von", "mit"),
        "fr" => ("de", "ac"),
        "it" => ("di", "con"),
        _ => ("by", "w/"),
    }
}
