//! Agent components
//!
//! Leaf modules first: text normalization, identifier extraction, and
//! author disambiguation feed the catalog client and scoring engine; the
//! compiler writes accepted matches into the host sink.

pub mod author;
pub mod catalog;
pub mod compiler;
pub mod identifier;
pub mod rate_limiter;
pub mod regions;
pub mod scoring;
pub mod text_utils;
pub mod work_queue;

pub use catalog::CatalogClient;
pub use compiler::{MetadataCompiler, MetadataSink, Poster};
pub use identifier::CatalogId;
pub use regions::Region;
pub use scoring::ScoredResult;
