//! Host-facing entry points
//!
//! The host framework drives the agent through two callbacks: search,
//! which ranks catalog candidates for a scanned item, and update, which
//! writes an accepted match into the host's metadata sink. Failures
//! degrade to an empty result or a no-op with a log line; nothing here
//! panics the host.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::config::AgentConfig;
use crate::services::author;
use crate::services::catalog::CatalogClient;
use crate::services::compiler::{MetadataCompiler, MetadataSink};
use crate::services::identifier::{self, CatalogId};
use crate::services::regions::Region;
use crate::services::scoring::{self, INITIAL_SCORE, ScoreInputs, ScoredResult};
use crate::services::text_utils;

/// Scanner placeholder for an album with no usable title.
const UNKNOWN_ALBUM: &str = "[Unknown Album]";

/// Which catalog content type a query targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    #[default]
    Book,
    Author,
}

/// Scanned attributes the host hands to a search call. `title` holds the
/// user-entered text on a manual search; `album` is the scanner's hint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LocalMediaQuery {
    pub kind: MediaKind,
    pub title: Option<String>,
    pub album: Option<String>,
    pub artist: Option<String>,
    pub filename: Option<String>,
    pub manual: bool,
    pub language: String,
}

/// Search terms derived once from the scanned attributes; never mutated
/// afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedQuery {
    pub normalized_title: String,
    pub primary_author: Option<String>,
    pub region: Region,
    pub identifier_override: Option<CatalogId>,
}

/// The metadata agent. One instance serves any number of host calls; it
/// holds no per-item state, so the host may invoke it concurrently for
/// different media items.
pub struct Agent {
    config: AgentConfig,
    catalog: CatalogClient,
}

impl Agent {
    pub fn new(config: AgentConfig) -> Self {
        let catalog = CatalogClient::new(&config);
        Self { config, catalog }
    }

    /// Rank catalog candidates for a scanned item. Never errors: an empty
    /// list means no acceptable candidate, which covers failed searches
    /// too.
    pub async fn search(&self, media: &LocalMediaQuery) -> Vec<ScoredResult> {
        info!(
            kind = ?media.kind,
            album = media.album.as_deref().unwrap_or(""),
            title = media.title.as_deref().unwrap_or(""),
            artist = media.artist.as_deref().unwrap_or(""),
            manual = media.manual,
            "Starting search"
        );

        let Some(query) = self.normalize_query(media) else {
            return Vec::new();
        };

        if let Some(id) = &query.identifier_override {
            // A trusted id beats any text similarity; skip fetching and
            // scoring entirely.
            info!(id = %id, "Quick match on embedded catalog identifier");
            let display_name = self
                .search_term(media)
                .unwrap_or_else(|| id.to_string());
            return vec![ScoredResult {
                id: id.clone(),
                score: INITIAL_SCORE,
                display_name,
                year: None,
                position: 1,
            }];
        }

        let outcome = match media.kind {
            MediaKind::Book => self.search_books(media, &query).await,
            MediaKind::Author => self.search_authors(media, &query).await,
        };

        match outcome {
            Ok(results) => {
                for result in &results {
                    debug!(
                        position = result.position,
                        score = result.score,
                        id = %result.id,
                        name = %result.display_name,
                        year = ?result.year,
                        "Search result"
                    );
                }
                results
            }
            Err(e) => {
                warn!(error = %e, "Search failed, returning no candidates");
                Vec::new()
            }
        }
    }

    /// Write the accepted match into the host's metadata sink. Failures
    /// are logged; the sink is left untouched when the record cannot be
    /// fetched.
    pub async fn update(
        &self,
        id: &CatalogId,
        kind: MediaKind,
        sink: &mut MetadataSink,
        force: bool,
    ) {
        info!(id = %id, kind = ?kind, force = force, "Updating metadata");
        let compiler = MetadataCompiler::new(&self.config);

        match kind {
            MediaKind::Book => match self.catalog.fetch_book(id).await {
                Ok(record) => compiler.apply_book(&record, sink, force, &self.catalog).await,
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to fetch book record, leaving metadata untouched");
                }
            },
            MediaKind::Author => match self.catalog.fetch_author(id).await {
                Ok(record) => {
                    compiler
                        .apply_author(&record, sink, force, &self.catalog)
                        .await;
                }
                Err(e) => {
                    warn!(id = %id, error = %e, "Failed to fetch author record, leaving metadata untouched");
                }
            },
        }
    }

    /// Recover a catalog id from the host-persisted composite string,
    /// falling back to the configured region for pre-region identifiers.
    pub fn parse_id(&self, persisted: &str) -> Option<CatalogId> {
        CatalogId::parse_persisted(persisted, self.config.region)
    }

    /// Derive the immutable query terms for this search, or nothing when
    /// there is nothing usable to search with.
    fn normalize_query(&self, media: &LocalMediaQuery) -> Option<NormalizedQuery> {
        let region = media
            .filename
            .as_deref()
            .and_then(identifier::find_region_tag)
            .unwrap_or(self.config.region);

        let identifier_override = self.find_identifier_override(media, region);

        let raw_term = self.search_term(media);
        let normalized_title = raw_term
            .as_deref()
            .map(text_utils::normalize)
            .unwrap_or_default();

        let primary_author = match media.kind {
            MediaKind::Book => author::resolve_primary_author(media.artist.as_deref(), None),
            MediaKind::Author => {
                author::resolve_primary_author(media.artist.as_deref(), media.title.as_deref())
            }
        };

        if identifier_override.is_none() {
            match media.kind {
                MediaKind::Book if normalized_title.is_empty() => {
                    info!("No usable album or title to search with, returning");
                    return None;
                }
                MediaKind::Author if primary_author.is_none() => {
                    info!("No usable author name to search with, returning");
                    return None;
                }
                _ => {}
            }
        }

        debug!(
            normalized_title = %normalized_title,
            primary_author = primary_author.as_deref().unwrap_or(""),
            region = %region,
            quick_match = identifier_override.is_some(),
            "Normalized query"
        );

        Some(NormalizedQuery {
            normalized_title,
            primary_author,
            region,
            identifier_override,
        })
    }

    /// The text searched for: the user-entered title on a manual search,
    /// otherwise the scanner's album hint. Placeholder albums abort an
    /// automatic search.
    fn search_term(&self, media: &LocalMediaQuery) -> Option<String> {
        if media.manual {
            if let Some(title) = media.title.as_deref().filter(|t| !t.trim().is_empty()) {
                return Some(title.to_string());
            }
        }

        let album = media.album.as_deref().filter(|a| !a.trim().is_empty())?;
        if album == UNKNOWN_ALBUM && !media.manual {
            info!("Album title is a scanner placeholder, returning");
            return None;
        }
        Some(album.to_string())
    }

    /// Check likely spots for an embedded id: the filename, then the
    /// manually entered title/album, then the raw artist field.
    fn find_identifier_override(
        &self,
        media: &LocalMediaQuery,
        region: Region,
    ) -> Option<CatalogId> {
        let mut sources: Vec<&str> = Vec::new();
        if let Some(filename) = media.filename.as_deref() {
            sources.push(filename);
        }
        if media.manual {
            if let Some(title) = media.title.as_deref() {
                sources.push(title);
            }
            if let Some(album) = media.album.as_deref() {
                sources.push(album);
            }
        }
        if let Some(artist) = media.artist.as_deref() {
            sources.push(artist);
        }

        sources
            .into_iter()
            .find_map(|text| identifier::find_identifier(text, region))
    }

    async fn search_books(
        &self,
        media: &LocalMediaQuery,
        query: &NormalizedQuery,
    ) -> anyhow::Result<Vec<ScoredResult>> {
        let author_query = query
            .primary_author
            .as_deref()
            .map(|a| author::search_form(a, &self.config.honorifics));

        let candidates = self
            .catalog
            .search_books(query.region, &query.normalized_title, author_query.as_deref())
            .await?;

        if candidates.is_empty() {
            warn!(title = %query.normalized_title, "No results found for query");
            return Ok(Vec::new());
        }
        debug!(
            count = candidates.len(),
            title = %query.normalized_title,
            "Found candidates"
        );

        let raw_term = self.search_term(media);
        let inputs = ScoreInputs {
            local_title: raw_term.as_deref(),
            local_author: query.primary_author.as_deref(),
            library_language: &media.language,
            manual: media.manual,
            today: Utc::now().date_naive(),
        };
        Ok(scoring::rank_books(&inputs, &candidates))
    }

    async fn search_authors(
        &self,
        media: &LocalMediaQuery,
        query: &NormalizedQuery,
    ) -> anyhow::Result<Vec<ScoredResult>> {
        // normalize_query only lets an author search through with a
        // resolved author.
        let Some(primary) = query.primary_author.as_deref() else {
            return Ok(Vec::new());
        };
        let author_query = author::search_form(primary, &self.config.honorifics);

        let candidates = self
            .catalog
            .search_authors(query.region, &author_query)
            .await?;

        if candidates.is_empty() {
            warn!(author = %author_query, "No results found for author query");
            return Ok(Vec::new());
        }

        let inputs = ScoreInputs {
            local_title: None,
            local_author: query.primary_author.as_deref(),
            library_language: &media.language,
            manual: media.manual,
            today: Utc::now().date_naive(),
        };
        Ok(scoring::rank_authors(&inputs, &candidates))
    }
}
