//! Agent configuration
//!
//! The host framework owns the preference store; it hands the agent a
//! resolved [`AgentConfig`] at construction time. Nothing in the agent
//! reads process-wide state. Logging verbosity is the host's concern: the
//! agent only emits `tracing` events and installs no subscriber.

use serde::{Deserialize, Serialize};

use crate::services::regions::Region;

/// Preferences and network tunables supplied by the host.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Marketplace queried by default, also the fallback region for
    /// identifiers persisted before region qualifiers existed.
    pub region: Region,

    /// Keep genres already present on an item instead of replacing them.
    pub keep_existing_genres: bool,

    /// Store author names as tags on the item (contributor entries are
    /// never tagged).
    pub store_author_tags: bool,

    /// Sort author display names by last name ("Doyle, Arthur Conan").
    pub sort_author_by_last_name: bool,

    /// Drop subtitles and trailing edition text from display titles.
    pub simplify_title: bool,

    /// Honorific tokens stripped from author search queries.
    pub honorifics: Vec<String>,

    /// Seconds before an HTTP request is abandoned.
    pub request_timeout_secs: u64,

    /// Attempts per network call; the sleep between attempts grows
    /// linearly.
    pub max_retries: u32,

    /// Override for the catalog search API base URL.
    pub api_base_url: Option<String>,

    /// Override for the enrichment API base URL.
    pub enrichment_base_url: Option<String>,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            region: Region::Us,
            keep_existing_genres: false,
            store_author_tags: true,
            sort_author_by_last_name: false,
            simplify_title: false,
            honorifics: vec!["Dr.".to_string(), "Prof.".to_string()],
            request_timeout_secs: 30,
            max_retries: 4,
            api_base_url: None,
            enrichment_base_url: None,
        }
    }
}
