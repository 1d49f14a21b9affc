//! Metadata compilation into the host sink
//!
//! Maps an accepted catalog record onto the host's mutable metadata
//! fields. Every field follows one rule (write only when the existing
//! value is empty or `force` is set) with the documented exceptions:
//! ratings always win, tag sets are replaced whole rather than merged, and
//! covers rewrite only when the image URL changes. This is the one
//! component with observable side effects beyond logging.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;

use super::author;
use super::catalog::{CatalogClient, FullAuthorRecord, FullBookRecord, GenreRef, parse_catalog_date};
use super::text_utils;

/// Volume labels already shaped like "Book 3" keep their prefix.
static BOOK_LABEL: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^book\s+\d").unwrap());

/// A stored cover image. Sort order 0 is the primary image.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Poster {
    pub url: String,
    #[serde(default)]
    pub data: Vec<u8>,
    pub sort_order: u32,
}

/// The host's mutable metadata record for one library item. The host owns
/// the persistence of this; the agent only fills fields in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSink {
    pub id: Option<String>,
    pub title: Option<String>,
    pub sort_title: Option<String>,
    pub studio: Option<String>,
    pub summary: Option<String>,
    pub release_date: Option<NaiveDate>,
    pub rating: Option<f32>,
    pub genres: Vec<String>,
    pub narrators: Vec<String>,
    pub author_tags: Vec<String>,
    pub series_tags: Vec<String>,
    pub poster: Option<Poster>,
}

pub struct MetadataCompiler<'a> {
    config: &'a AgentConfig,
}

impl<'a> MetadataCompiler<'a> {
    pub fn new(config: &'a AgentConfig) -> Self {
        Self { config }
    }

    /// Write a full book record into the sink.
    pub async fn apply_book(
        &self,
        record: &FullBookRecord,
        sink: &mut MetadataSink,
        force: bool,
        catalog: &CatalogClient,
    ) {
        if let Some(title) = record.title.as_deref().filter(|t| !t.is_empty()) {
            let display = self.display_title(title, record.subtitle.as_deref());
            write_string(&mut sink.title, Some(&display), force);

            let sort = self.sort_title(title, record);
            write_string(&mut sink.sort_title, Some(&sort), force);
        }

        write_string(&mut sink.studio, record.publisher.as_deref(), force);

        let summary = record.summary.as_deref().map(text_utils::strip_html_tags);
        write_string(&mut sink.summary, summary.as_deref(), force);

        if sink.release_date.is_none() || force {
            if let Some(date) = record.release_date.as_deref().and_then(parse_catalog_date) {
                sink.release_date = Some(date);
            }
        }

        // Catalog ratings are always fresher than a stored one. The
        // catalog rates out of 5, the host out of 10.
        if let Some(rating) = record.rating.as_deref().and_then(|r| r.parse::<f32>().ok()) {
            sink.rating = Some(rating * 2.0);
        }

        self.apply_genres(&record.genres, sink, force);
        self.apply_narrators(record, sink, force);
        self.apply_author_tags(record, sink, force);
        self.apply_series_tags(record, sink, force);
        self.apply_poster(record.image.as_deref(), sink, force, catalog)
            .await;

        info!(
            title = sink.title.as_deref().unwrap_or(""),
            sort_title = sink.sort_title.as_deref().unwrap_or(""),
            studio = sink.studio.as_deref().unwrap_or(""),
            genres = sink.genres.len(),
            narrators = sink.narrators.len(),
            "Compiled book metadata"
        );
    }

    /// Write a full author record into the sink.
    pub async fn apply_author(
        &self,
        record: &FullAuthorRecord,
        sink: &mut MetadataSink,
        force: bool,
        catalog: &CatalogClient,
    ) {
        if let Some(name) = record.name.as_deref().filter(|n| !n.is_empty()) {
            write_string(&mut sink.title, Some(name), force);

            let sort = if self.config.sort_author_by_last_name {
                author::last_name_first(name)
            } else {
                name.to_string()
            };
            write_string(&mut sink.sort_title, Some(&sort), force);
        }

        write_string(&mut sink.summary, record.description.as_deref(), force);
        self.apply_genres(&record.genres, sink, force);
        self.apply_poster(record.image.as_deref(), sink, force, catalog)
            .await;

        info!(
            title = sink.title.as_deref().unwrap_or(""),
            sort_title = sink.sort_title.as_deref().unwrap_or(""),
            "Compiled author metadata"
        );
    }

    /// Display title: "Title: Subtitle" normally; with the simplify
    /// preference the subtitle is dropped and trailing edition text
    /// stripped instead.
    fn display_title(&self, title: &str, subtitle: Option<&str>) -> String {
        if self.config.simplify_title {
            return text_utils::simplify_title(title);
        }
        match subtitle.filter(|s| !s.is_empty()) {
            Some(subtitle) => format!("{}: {}", title, subtitle),
            None => title.to_string(),
        }
    }

    /// Sort title: "{series}, {volume} - {title}", pieces omitted when the
    /// record lacks them.
    fn sort_title(&self, title: &str, record: &FullBookRecord) -> String {
        let bare = if self.config.simplify_title {
            text_utils::simplify_title(title)
        } else {
            title.to_string()
        };

        match &record.series_primary {
            Some(series) => {
                let series_part = match series.position.as_deref().filter(|p| !p.is_empty()) {
                    Some(position) => format!("{}, {}", series.name, volume_label(position)),
                    None => series.name.clone(),
                };
                format!("{} - {}", series_part, bare)
            }
            None => bare,
        }
    }

    fn apply_genres(&self, genres: &[GenreRef], sink: &mut MetadataSink, force: bool) {
        if self.config.keep_existing_genres || genres.is_empty() {
            return;
        }
        if sink.genres.is_empty() || force {
            sink.genres = genres
                .iter()
                .map(|g| g.name.trim().to_string())
                .filter(|name| !name.is_empty())
                .collect();
        }
    }

    fn apply_narrators(&self, record: &FullBookRecord, sink: &mut MetadataSink, force: bool) {
        if record.narrators.is_empty() {
            return;
        }
        if sink.narrators.is_empty() || force {
            sink.narrators = record
                .narrators
                .iter()
                .map(|n| n.name.trim().to_string())
                .collect();
        }
    }

    /// Authors become tags unless they carry a contributor suffix.
    fn apply_author_tags(&self, record: &FullBookRecord, sink: &mut MetadataSink, force: bool) {
        if !self.config.store_author_tags || record.authors.is_empty() {
            return;
        }
        if sink.author_tags.is_empty() || force {
            sink.author_tags = record
                .authors
                .iter()
                .filter(|person| !author::split_contributor(&person.name).1)
                .map(|person| person.name.trim().to_string())
                .collect();
        }
    }

    fn apply_series_tags(&self, record: &FullBookRecord, sink: &mut MetadataSink, force: bool) {
        let mut tags = Vec::new();
        if let Some(series) = &record.series_primary {
            tags.push(format!("Series: {}", series.name));
        }
        if let Some(series) = &record.series_secondary {
            tags.push(format!("Series: {}", series.name));
        }
        if tags.is_empty() {
            return;
        }
        if sink.series_tags.is_empty() || force {
            sink.series_tags = tags;
        }
    }

    /// Fetch and store the cover, but only when the URL actually changed
    /// or the update is forced. The new cover becomes the primary image.
    async fn apply_poster(
        &self,
        image: Option<&str>,
        sink: &mut MetadataSink,
        force: bool,
        catalog: &CatalogClient,
    ) {
        let Some(url) = image.filter(|u| !u.is_empty()) else {
            return;
        };
        let unchanged = sink.poster.as_ref().is_some_and(|p| p.url == url);
        if unchanged && !force {
            debug!(url = %url, "Cover image unchanged, keeping stored copy");
            return;
        }

        match catalog.fetch_image(url).await {
            Ok(data) => {
                sink.poster = Some(Poster {
                    url: url.to_string(),
                    data,
                    sort_order: 0,
                });
            }
            Err(e) => warn!(url = %url, error = %e, "Failed to fetch cover image"),
        }
    }
}

/// Write only when the field is empty or the update is forced.
fn write_string(field: &mut Option<String>, value: Option<&str>, force: bool) {
    let Some(value) = value.filter(|v| !v.is_empty()) else {
        return;
    };
    if field.as_deref().map_or(true, |existing| existing.is_empty()) || force {
        *field = Some(value.to_string());
    }
}

/// Prefix bare positions with "Book "; positions already labelled keep
/// theirs.
fn volume_label(position: &str) -> String {
    if BOOK_LABEL.is_match(position) {
        position.to_string()
    } else {
        format!("Book {}", position)
    }
}
