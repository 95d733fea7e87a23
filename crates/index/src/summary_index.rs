//! Summary index: a zone's chunks in order, queried by tree summarization.

use async_trait::async_trait;
use futures::future::try_join_all;
use std::sync::Arc;
use tracing::debug;
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::error::IndexError;
use crate::engine::{combine_prompt, EngineSettings};
use crate::splitter::Chunk;
use crate::store::SummaryDocstore;

#[derive(Debug, Clone)]
pub struct SummaryIndex {
    docstore: SummaryDocstore,
}

impl SummaryIndex {
    pub fn from_chunks(chunks: Vec<Chunk>, content_hash: String) -> Result<Self, IndexError> {
        let zone_id = chunks
            .first()
            .map(|c| c.zone_id.clone())
            .ok_or_else(|| IndexError::Storage("summary index needs at least one chunk".into()))?;
        Ok(Self {
            docstore: SummaryDocstore {
                zone_id,
                content_hash,
                nodes: chunks,
            },
        })
    }

    pub fn from_docstore(docstore: SummaryDocstore) -> Self {
        Self { docstore }
    }

    pub fn docstore(&self) -> &SummaryDocstore {
        &self.docstore
    }

    pub fn content_hash(&self) -> &str {
        &self.docstore.content_hash
    }

    pub fn chunks(&self) -> &[Chunk] {
        &self.docstore.nodes
    }
}

/// Tree-summarize: answer the query over groups of `summary_fanout` chunks,
/// then combine the partial answers the same way until one remains.
pub struct SummaryQueryEngine {
    index: Arc<SummaryIndex>,
    settings: EngineSettings,
}

impl SummaryQueryEngine {
    pub fn new(index: Arc<SummaryIndex>, settings: EngineSettings) -> Self {
        Self { index, settings }
    }
}

#[async_trait]
impl QueryEngine for SummaryQueryEngine {
    async fn query(&self, query: &str) -> zonewatch_core::Result<String> {
        let mut texts: Vec<String> = self.index.chunks().iter().map(|c| c.text.clone()).collect();
        if texts.is_empty() {
            return Err(IndexError::EmptyDocument(self.index.docstore().zone_id.to_string()).into());
        }
        let fanout = self.settings.summary_fanout.max(2);

        let mut level = 0;
        loop {
            let calls = texts
                .chunks(fanout)
                .map(|group| self.settings.complete_text(combine_prompt(group, query)));
            let answers = try_join_all(calls).await?;

            debug!(
                zone = %self.index.docstore().zone_id,
                level,
                inputs = texts.len(),
                outputs = answers.len(),
                "Tree summarize level"
            );

            if answers.len() == 1 {
                return Ok(answers.into_iter().next().unwrap_or_default());
            }
            texts = answers;
            level += 1;
        }
    }
}
