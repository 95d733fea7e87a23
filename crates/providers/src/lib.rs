//! LLM, embedding and rerank provider implementations for ZoneWatch.
//!
//! All chat/embedding providers implement `zonewatch_core::Provider`; rerank
//! clients implement `zonewatch_core::Reranker`. The router builds the right
//! ones from configuration.

pub mod openai_compat;
pub mod rerank;
pub mod router;

pub use openai_compat::OpenAiCompatProvider;
pub use rerank::{CohereReranker, PassthroughReranker};
pub use router::{build_provider, build_reranker};
