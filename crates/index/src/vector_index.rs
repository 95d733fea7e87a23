//! Semantic-search index over a zone's chunks.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::error::IndexError;
use zonewatch_core::provider::{embed_one, EmbeddingRequest};
use crate::engine::{qa_prompt, EngineSettings};
use crate::splitter::Chunk;
use crate::store::{EmbeddedNode, VectorDocstore};
use crate::vector::top_k;

/// Chunks plus one embedding per chunk.
#[derive(Debug, Clone)]
pub struct VectorIndex {
    docstore: VectorDocstore,
}

impl VectorIndex {
    /// Embed all chunks in a single batch request.
    pub async fn build(
        settings: &EngineSettings,
        chunks: Vec<Chunk>,
        content_hash: String,
    ) -> Result<Self, IndexError> {
        let zone_id = chunks
            .first()
            .map(|c| c.zone_id.clone())
            .ok_or_else(|| IndexError::EmbeddingFailed("no chunks to embed".into()))?;

        let response = settings
            .provider
            .embed(EmbeddingRequest {
                model: settings.embed_model.clone(),
                inputs: chunks.iter().map(|c| c.text.clone()).collect(),
            })
            .await
            .map_err(|e| IndexError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != chunks.len() {
            return Err(IndexError::EmbeddingFailed(format!(
                "expected {} embeddings, got {}",
                chunks.len(),
                response.embeddings.len()
            )));
        }

        let nodes = chunks
            .into_iter()
            .zip(response.embeddings)
            .map(|(chunk, embedding)| EmbeddedNode { chunk, embedding })
            .collect();

        Ok(Self {
            docstore: VectorDocstore {
                zone_id,
                content_hash,
                embed_model: settings.embed_model.clone(),
                nodes,
            },
        })
    }

    pub fn from_docstore(docstore: VectorDocstore) -> Self {
        Self { docstore }
    }

    pub fn docstore(&self) -> &VectorDocstore {
        &self.docstore
    }

    pub fn content_hash(&self) -> &str {
        &self.docstore.content_hash
    }

    pub fn len(&self) -> usize {
        self.docstore.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docstore.nodes.is_empty()
    }

    /// The `k` chunks closest to `query_embedding`.
    pub fn retrieve(&self, query_embedding: &[f32], k: usize) -> Vec<(&Chunk, f32)> {
        top_k(
            self.docstore.nodes.iter().map(|n| n.embedding.as_slice()),
            query_embedding,
            k,
        )
        .into_iter()
        .map(|(i, score)| (&self.docstore.nodes[i].chunk, score))
        .collect()
    }
}

/// Embeds the query, retrieves top-k chunks, and asks the LLM to answer.
pub struct VectorQueryEngine {
    index: Arc<VectorIndex>,
    settings: EngineSettings,
}

impl VectorQueryEngine {
    pub fn new(index: Arc<VectorIndex>, settings: EngineSettings) -> Self {
        Self { index, settings }
    }
}

#[async_trait]
impl QueryEngine for VectorQueryEngine {
    async fn query(&self, query: &str) -> zonewatch_core::Result<String> {
        let embedding = embed_one(self.settings.provider.as_ref(), &self.settings.embed_model, query).await?;
        let hits = self.index.retrieve(&embedding, self.settings.similarity_top_k);

        debug!(
            zone = %self.index.docstore().zone_id,
            hits = hits.len(),
            top_score = hits.first().map(|(_, s)| *s).unwrap_or_default(),
            "Vector retrieval"
        );

        let context = hits
            .iter()
            .map(|(chunk, _)| chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        Ok(self.settings.complete_text(qa_prompt(&context, query)).await?)
    }
}
