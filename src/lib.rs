//! narrator: audiobook metadata matching agent
//!
//! Runs embedded inside a host media-management framework that owns the
//! scan pipeline, UI, preference store, and on-disk metadata. The host
//! drives the agent through two callbacks: [`Agent::search`] ranks catalog
//! candidates for a scanned audiobook, and [`Agent::update`] writes an
//! accepted match back into the host's metadata sink.

pub mod agent;
pub mod config;
pub mod services;

pub use agent::{Agent, LocalMediaQuery, MediaKind, NormalizedQuery};
pub use config::AgentConfig;
pub use services::compiler::{MetadataSink, Poster};
pub use services::identifier::CatalogId;
pub use services::regions::Region;
pub use services::scoring::ScoredResult;
