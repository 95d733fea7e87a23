//! Per-query tool selection: embedding retrieval, reranking, compare tool.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};
use zonewatch_core::event::{DomainEvent, EventBus};
use zonewatch_core::provider::embed_one;
use zonewatch_core::rerank::Reranker;
use zonewatch_core::tool::{Tool, ToolRegistry};
use zonewatch_index::EngineSettings;
use zonewatch_tools::compare_tool;
use crate::loop_runner::{AgentLoop, DEFAULT_MAX_ITERATIONS};
use crate::tool_index::ZoneToolIndex;

pub const COMPARE_AGENT_PROMPT: &str = "Compare multiple Zone information; use tools only.";

/// Resolves the tools a query may use.
#[async_trait]
pub trait ToolProvider: Send + Sync {
    async fn tools_for(&self, query: &str) -> zonewatch_core::Result<Vec<Arc<dyn Tool>>>;
}

/// Retrieve top-K zone tools by embedding, rerank to top-N, and append a
/// fresh compare tool when more than one zone survives.
pub struct RetrievalToolSelector {
    index: Arc<ZoneToolIndex>,
    reranker: Arc<dyn Reranker>,
    settings: EngineSettings,
    top_k: usize,
    top_n: usize,
    compare_max_iterations: u32,
    tool_timeout: Duration,
    event_bus: Option<Arc<EventBus>>,
}

impl RetrievalToolSelector {
    pub fn new(
        index: Arc<ZoneToolIndex>,
        reranker: Arc<dyn Reranker>,
        settings: EngineSettings,
        top_k: usize,
        top_n: usize,
    ) -> Self {
        Self {
            index,
            reranker,
            settings,
            top_k,
            top_n,
            compare_max_iterations: DEFAULT_MAX_ITERATIONS,
            tool_timeout: Duration::from_secs(120),
            event_bus: None,
        }
    }

    pub fn with_compare_max_iterations(mut self, max: u32) -> Self {
        self.compare_max_iterations = max;
        self
    }

    pub fn with_tool_timeout(mut self, timeout: Duration) -> Self {
        self.tool_timeout = timeout;
        self
    }

    pub fn with_event_bus(mut self, bus: Arc<EventBus>) -> Self {
        self.event_bus = Some(bus);
        self
    }

    pub fn index(&self) -> &ZoneToolIndex {
        &self.index
    }

    /// Select the zone tools for `query`, plus the compare tool if needed.
    pub async fn select(&self, query: &str) -> zonewatch_core::Result<Vec<Arc<dyn Tool>>> {
        if self.index.is_empty() {
            debug!("Tool universe is empty, nothing to select");
            return Ok(Vec::new());
        }

        let query_embedding =
            embed_one(self.settings.provider.as_ref(), &self.settings.embed_model, query).await?;
        let candidates = self.index.retrieve(&query_embedding, self.top_k);

        let descriptions: Vec<String> = candidates.iter().map(|t| t.description().to_string()).collect();
        let hits = self.reranker.rerank(query, &descriptions, self.top_n).await?;

        let mut selected: Vec<Arc<dyn Tool>> = Vec::with_capacity(self.top_n + 1);
        for hit in hits {
            let Some(tool) = candidates.get(hit.index) else {
                continue;
            };
            if selected.len() < self.top_n && !selected.iter().any(|t| t.name() == tool.name()) {
                selected.push(tool.clone());
            }
        }

        if selected.len() > 1 {
            let compare = AgentLoop::from_settings(
                "compare",
                &self.settings,
                COMPARE_AGENT_PROMPT,
                Arc::new(ToolRegistry::from_tools(selected.iter().cloned())),
            )
            .with_max_iterations(self.compare_max_iterations);
            let compare = match &self.event_bus {
                Some(bus) => compare.with_event_bus(bus.clone()),
                None => compare,
            };
            selected.push(compare_tool(Arc::new(compare), self.tool_timeout));
        }

        let names: Vec<String> = selected.iter().map(|t| t.name().to_string()).collect();
        info!(candidates = candidates.len(), selected = ?names, "Tools selected");
        if let Some(bus) = &self.event_bus {
            bus.publish(DomainEvent::ToolsSelected {
                query_preview: query.chars().take(80).collect(),
                candidates: candidates.len(),
                selected: names,
                timestamp: chrono::Utc::now(),
            });
        }

        Ok(selected)
    }
}

#[async_trait]
impl ToolProvider for RetrievalToolSelector {
    async fn tools_for(&self, query: &str) -> zonewatch_core::Result<Vec<Arc<dyn Tool>>> {
        self.select(query).await
    }
}
