//! Embedding index over zone tools, keyed by their descriptions.

use std::sync::Arc;
use tracing::debug;
use zonewatch_core::error::IndexError;
use zonewatch_core::provider::EmbeddingRequest;
use zonewatch_core::tool::Tool;
use zonewatch_index::{top_k, EngineSettings};

struct ToolEntry {
    tool: Arc<dyn Tool>,
    embedding: Vec<f32>,
}

/// The retrievable universe of zone tools, in registration order.
#[derive(Default)]
pub struct ZoneToolIndex {
    entries: Vec<ToolEntry>,
}

impl ZoneToolIndex {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Embed every tool description in one batch. No tools, no request.
    pub async fn build(settings: &EngineSettings, tools: Vec<Arc<dyn Tool>>) -> Result<Self, IndexError> {
        if tools.is_empty() {
            return Ok(Self::empty());
        }

        let response = settings
            .provider
            .embed(EmbeddingRequest {
                model: settings.embed_model.clone(),
                inputs: tools.iter().map(|t| t.description().to_string()).collect(),
            })
            .await
            .map_err(|e| IndexError::EmbeddingFailed(e.to_string()))?;

        if response.embeddings.len() != tools.len() {
            return Err(IndexError::EmbeddingFailed(format!(
                "expected {} tool embeddings, got {}",
                tools.len(),
                response.embeddings.len()
            )));
        }

        debug!(tools = tools.len(), "Tool index built");
        Ok(Self {
            entries: tools
                .into_iter()
                .zip(response.embeddings)
                .map(|(tool, embedding)| ToolEntry { tool, embedding })
                .collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn tool_names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.tool.name()).collect()
    }

    /// The `limit` tools closest to `query_embedding`. Ties keep registration order.
    pub fn retrieve(&self, query_embedding: &[f32], limit: usize) -> Vec<Arc<dyn Tool>> {
        top_k(self.entries.iter().map(|e| e.embedding.as_slice()), query_embedding, limit)
            .into_iter()
            .map(|(i, _)| self.entries[i].tool.clone())
            .collect()
    }
}
