//! Reranker trait: second-pass relevance scoring of a candidate set.
//!
//! The tool selector retrieves K candidates by embedding similarity and asks
//! a reranker to keep the best N. The reranker's order is authoritative.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::ProviderError;

/// One reranked document: its index in the input slice and its score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RerankHit {
    pub index: usize,
    pub relevance_score: f32,
}

#[async_trait]
pub trait Reranker: Send + Sync {
    fn name(&self) -> &str;

    /// Return at most `top_n` hits, most relevant first.
    async fn rerank(
        &self,
        query: &str,
        documents: &[String],
        top_n: usize,
    ) -> std::result::Result<Vec<RerankHit>, ProviderError>;
}
