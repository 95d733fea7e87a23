//! Zone indexing for ZoneWatch.
//!
//! Loads zone reports, chunks them, and builds two persisted indexes per
//! zone (semantic search and tree summarization) plus a cached short
//! summary. Query engines over both indexes implement
//! `zonewatch_core::QueryEngine`.

pub mod builder;
pub mod documents;
pub mod engine;
pub mod splitter;
pub mod store;
pub mod summary_index;
pub mod vector;
pub mod vector_index;

#[cfg(test)]
pub(crate) mod testing;

pub use builder::{BuiltZone, CacheOutcome, CacheState, ZoneIndexBuilder, ZoneIndexPair, SUMMARY_PROMPT};
pub use documents::{load_zone_documents, save_upload, validate_upload_name};
pub use engine::EngineSettings;
pub use splitter::{Chunk, SentenceSplitter};
pub use store::{content_hash, IndexStore};
pub use summary_index::{SummaryIndex, SummaryQueryEngine};
pub use vector::{cosine_similarity, top_k};
pub use vector_index::{VectorIndex, VectorQueryEngine};
