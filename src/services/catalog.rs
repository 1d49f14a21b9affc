//! Catalog API client for audiobook metadata
//!
//! Two endpoints cooperate: the store's regional products API answers
//! search queries, and an aggregation API serves the full per-title record
//! used during update. Responses are JSON with no schema guarantees, so
//! everything parses into optional-field structs; a search record missing
//! a required field is dropped before it can reach scoring.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::AgentConfig;

use super::identifier::CatalogId;
use super::rate_limiter::{RateLimitedClient, RetryConfig, retry_async};
use super::regions::Region;

/// Aggregation API base; serves full book and author records by id.
const ENRICHMENT_API_BASE: &str = "https://api.audnex.us";

/// Fixed query constants for the products search endpoint.
const SEARCH_RESPONSE_GROUPS: &str = "contributors,product_desc,product_attrs";
const SEARCH_NUM_RESULTS: &str = "25";
const SEARCH_SORT: &str = "Relevance";

/// Catalog client: search against the regional products API, full records
/// from the aggregation API, both rate limited and retried.
pub struct CatalogClient {
    client: Arc<RateLimitedClient>,
    retry: RetryConfig,
    api_base_override: Option<String>,
    enrichment_base: String,
}

/// Contributor reference shared across endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonRef {
    pub name: String,
    #[serde(default)]
    pub asin: Option<String>,
}

/// Genre entry from the aggregation API; `kind` distinguishes parent
/// genres from child tags.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenreRef {
    pub name: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Series membership with an optional position ("3", "3.5").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeriesRef {
    pub name: String,
    #[serde(default)]
    pub position: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct ProductSearchResponse {
    #[serde(default)]
    products: Vec<RawProduct>,
}

/// One search hit exactly as the products API returns it. Everything is
/// optional here; required-field checks happen when building a candidate.
#[derive(Debug, Clone, Deserialize)]
pub struct RawProduct {
    pub asin: Option<String>,
    pub title: Option<String>,
    #[serde(default)]
    pub authors: Vec<PersonRef>,
    #[serde(default)]
    pub narrators: Vec<PersonRef>,
    pub language: Option<String>,
    pub release_date: Option<String>,
}

/// A book search candidate with every required field present.
#[derive(Debug, Clone)]
pub struct BookCandidate {
    pub id: CatalogId,
    pub title: String,
    pub authors: Vec<String>,
    pub narrators: Vec<String>,
    pub language: String,
    pub release_date: Option<NaiveDate>,
}

impl BookCandidate {
    /// Build from a raw record; `None` when a required field is missing.
    fn from_raw(raw: RawProduct, region: Region) -> Option<Self> {
        let asin = raw.asin.filter(|a| !a.is_empty())?;
        let title = raw.title.filter(|t| !t.is_empty())?;
        let language = raw.language.filter(|l| !l.is_empty())?;
        if raw.authors.is_empty() || raw.narrators.is_empty() {
            return None;
        }

        let release_date = raw.release_date.as_deref().and_then(parse_catalog_date);

        Some(Self {
            id: CatalogId::new(asin, region),
            title,
            authors: raw.authors.into_iter().map(|p| p.name).collect(),
            narrators: raw.narrators.into_iter().map(|p| p.name).collect(),
            language,
            release_date,
        })
    }

    /// Candidate authors joined the way the scorer compares them.
    pub fn joined_authors(&self) -> String {
        self.authors.join(", ")
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawAuthorHit {
    pub asin: Option<String>,
    pub name: Option<String>,
}

/// An author search candidate with every required field present.
#[derive(Debug, Clone)]
pub struct AuthorCandidate {
    pub id: CatalogId,
    pub name: String,
}

impl AuthorCandidate {
    fn from_raw(raw: RawAuthorHit, region: Region) -> Option<Self> {
        let asin = raw.asin.filter(|a| !a.is_empty())?;
        let name = raw.name.filter(|n| !n.is_empty())?;
        Some(Self {
            id: CatalogId::new(asin, region),
            name,
        })
    }
}

/// Full per-title record from the aggregation API. Absent keys parse to
/// `None` or empty; nothing here is trusted to exist.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullBookRecord {
    pub asin: Option<String>,
    pub title: Option<String>,
    pub subtitle: Option<String>,
    pub summary: Option<String>,
    #[serde(rename = "publisherName")]
    pub publisher: Option<String>,
    #[serde(rename = "releaseDate")]
    pub release_date: Option<String>,
    pub rating: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
    #[serde(rename = "seriesPrimary")]
    pub series_primary: Option<SeriesRef>,
    #[serde(rename = "seriesSecondary")]
    pub series_secondary: Option<SeriesRef>,
    #[serde(default)]
    pub authors: Vec<PersonRef>,
    #[serde(default)]
    pub narrators: Vec<PersonRef>,
}

/// Full author record from the aggregation API.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FullAuthorRecord {
    pub asin: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    #[serde(default)]
    pub genres: Vec<GenreRef>,
}

/// Release dates arrive either as "YYYY-MM-DD" or a full ISO timestamp;
/// only the date part matters. Unparseable input is `None`, never an
/// error.
pub fn parse_catalog_date(s: &str) -> Option<NaiveDate> {
    let date_part = s.get(..10).unwrap_or(s);
    NaiveDate::parse_from_str(date_part, "%Y-%m-%d").ok()
}

impl CatalogClient {
    pub fn new(config: &AgentConfig) -> Self {
        Self {
            client: Arc::new(RateLimitedClient::for_catalog(config.request_timeout_secs)),
            retry: RetryConfig {
                max_attempts: config.max_retries,
                base_delay: Duration::from_millis(500),
            },
            api_base_override: config.api_base_url.clone(),
            enrichment_base: config
                .enrichment_base_url
                .clone()
                .unwrap_or_else(|| ENRICHMENT_API_BASE.to_string())
                .trim_end_matches('/')
                .to_string(),
        }
    }

    /// Products API host for a marketplace, unless overridden.
    fn api_base(&self, region: Region) -> String {
        match &self.api_base_override {
            Some(base) => base.trim_end_matches('/').to_string(),
            None => format!("https://api.audible.{}", region.tld()),
        }
    }

    /// Search the products API for books by title, optionally scoped to an
    /// author. Without an author the title doubles as a keyword query.
    pub async fn search_books(
        &self,
        region: Region,
        title: &str,
        author: Option<&str>,
    ) -> Result<Vec<BookCandidate>> {
        let url = format!("{}/1.0/catalog/products", self.api_base(region));
        debug!(url = %url, title = %title, author = author.unwrap_or(""), "Searching catalog for books");

        let mut query: Vec<(&str, String)> = vec![
            ("response_groups", SEARCH_RESPONSE_GROUPS.to_string()),
            ("num_results", SEARCH_NUM_RESULTS.to_string()),
            ("products_sort_by", SEARCH_SORT.to_string()),
            ("title", title.to_string()),
        ];
        match author {
            Some(author) => query.push(("author", author.to_string())),
            None => query.push(("keywords", title.to_string())),
        }

        let response: ProductSearchResponse = self.get_json(&url, &query).await?;

        let total = response.products.len();
        let candidates: Vec<BookCandidate> = response
            .products
            .into_iter()
            .filter_map(|raw| BookCandidate::from_raw(raw, region))
            .collect();
        if candidates.len() < total {
            warn!(
                dropped = total - candidates.len(),
                "Dropped catalog records with missing required fields"
            );
        }

        debug!(count = candidates.len(), "Catalog search returned candidates");
        Ok(candidates)
    }

    /// Search the aggregation API for authors by name.
    pub async fn search_authors(
        &self,
        region: Region,
        name: &str,
    ) -> Result<Vec<AuthorCandidate>> {
        let url = format!("{}/authors", self.enrichment_base);
        debug!(url = %url, name = %name, "Searching catalog for authors");

        let query = vec![
            ("region", region.code().to_string()),
            ("name", name.to_string()),
        ];
        let hits: Vec<RawAuthorHit> = self.get_json(&url, &query).await?;

        let total = hits.len();
        let candidates: Vec<AuthorCandidate> = hits
            .into_iter()
            .filter_map(|raw| AuthorCandidate::from_raw(raw, region))
            .collect();
        if candidates.len() < total {
            warn!(
                dropped = total - candidates.len(),
                "Dropped author records with missing required fields"
            );
        }

        debug!(count = candidates.len(), "Author search returned candidates");
        Ok(candidates)
    }

    /// Fetch the full record for an accepted book match.
    pub async fn fetch_book(&self, id: &CatalogId) -> Result<FullBookRecord> {
        let url = format!("{}/books/{}", self.enrichment_base, id.asin);
        debug!(url = %url, region = %id.region, "Fetching full book record");

        let query = vec![("region", id.region.code().to_string())];
        self.get_json(&url, &query).await
    }

    /// Fetch the full record for an accepted author match.
    pub async fn fetch_author(&self, id: &CatalogId) -> Result<FullAuthorRecord> {
        let url = format!("{}/authors/{}", self.enrichment_base, id.asin);
        debug!(url = %url, region = %id.region, "Fetching full author record");

        let query = vec![("region", id.region.code().to_string())];
        self.get_json(&url, &query).await
    }

    /// Fetch raw image bytes, for cover art.
    pub async fn fetch_image(&self, url: &str) -> Result<Vec<u8>> {
        let client = self.client.clone();
        retry_async(
            || {
                let client = client.clone();
                let url = url.to_string();
                async move {
                    let response = client.get(&url).await?;
                    if !response.status().is_success() {
                        anyhow::bail!("image request failed with status {}", response.status());
                    }
                    let bytes = response
                        .bytes()
                        .await
                        .context("Failed to read image body")?;
                    Ok(bytes.to_vec())
                }
            },
            &self.retry,
            "catalog_fetch_image",
        )
        .await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let client = self.client.clone();
        retry_async(
            || {
                let client = client.clone();
                let url = url.to_string();
                let query: Vec<(String, String)> = query
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.clone()))
                    .collect();
                async move {
                    let response = client.get_with_query(&url, &query).await?;
                    let status = response.status();
                    if !status.is_success() {
                        anyhow::bail!("catalog request failed with status {}", status);
                    }
                    response
                        .json::<T>()
                        .await
                        .context("Failed to parse catalog response")
                }
            },
            &self.retry,
            "catalog_get",
        )
        .await
    }
}
