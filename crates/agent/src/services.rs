//! Service initialization: zone documents → indexes → zone agents → dispatcher.

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use zonewatch_config::{AppConfig, FailurePolicy};
use zonewatch_core::error::IndexError;
use zonewatch_core::event::{DomainEvent, EventBus};
use zonewatch_core::provider::Provider;
use zonewatch_core::rerank::Reranker;
use zonewatch_core::tool::Tool;
use zonewatch_index::{load_zone_documents, BuiltZone, EngineSettings, ZoneIndexBuilder};
use zonewatch_tools::zone_tool;
use crate::react::DispatchAgent;
use crate::selector::RetrievalToolSelector;
use crate::tool_index::ZoneToolIndex;
use crate::zone_agent::make_zone_agent;

/// A zone that is ready to answer questions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneReport {
    pub zone_id: String,
    pub summary: String,
    pub chunks: usize,
    /// Cache state of vector index, summary index and summary
    pub cache: [String; 3],
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneFailure {
    pub zone_id: String,
    pub error: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InitReport {
    pub zones: Vec<ZoneReport>,
    pub failures: Vec<ZoneFailure>,
}

/// Everything a chat turn needs once initialization has finished.
pub struct Services {
    pub report: InitReport,
    pub dispatcher: Arc<DispatchAgent>,
}

/// Build every zone found in the data directory and wire up the dispatcher.
///
/// Zones build in file-name order, `index.build_concurrency` at a time. A
/// failing zone is reported and skipped under `FailurePolicy::Isolate`, or
/// aborts the whole run under `FailurePolicy::Abort`.
pub async fn initialize(
    config: &AppConfig,
    provider: Arc<dyn Provider>,
    reranker: Arc<dyn Reranker>,
    event_bus: Option<Arc<EventBus>>,
) -> zonewatch_core::Result<Services> {
    config
        .paths
        .ensure_dirs()
        .map_err(|e| IndexError::Storage(format!("Failed to create data directories: {e}")))?;

    let documents = load_zone_documents(&config.paths.data_dir).await?;
    info!(
        zones = documents.len(),
        data_dir = %config.paths.data_dir.display(),
        "Initializing services"
    );

    let settings = EngineSettings::from_config(provider, config);
    let builder = Arc::new(ZoneIndexBuilder::from_config(settings.clone(), config));
    let publish = |event: DomainEvent| {
        if let Some(bus) = &event_bus {
            bus.publish(event);
        }
    };

    // The stream must not borrow locals: callers spawn this future.
    let mut builds = futures::stream::iter(documents)
        .map(|doc| {
            let builder = builder.clone();
            async move {
                let result = builder.build(&doc).await;
                (doc, result)
            }
        })
        .buffered(config.index.build_concurrency.max(1));

    let mut built: Vec<BuiltZone> = Vec::new();
    let mut failures = Vec::new();
    while let Some((doc, result)) = builds.next().await {
        match result {
            Ok(zone) => {
                publish(DomainEvent::ZoneIndexed {
                    zone_id: zone.zone_id.to_string(),
                    cache: zone.cache.labels(),
                    chunks: zone.chunk_count(),
                    timestamp: chrono::Utc::now(),
                });
                built.push(zone);
            }
            Err(e) => {
                publish(DomainEvent::ZoneFailed {
                    zone_id: doc.id.to_string(),
                    error_message: e.to_string(),
                    timestamp: chrono::Utc::now(),
                });
                match config.index.on_zone_failure {
                    FailurePolicy::Abort => {
                        error!(zone = %doc.id, error = %e, "Zone build failed, aborting initialization");
                        return Err(e);
                    }
                    FailurePolicy::Isolate => {
                        warn!(zone = %doc.id, error = %e, "Zone build failed, marking unavailable");
                        failures.push(ZoneFailure {
                            zone_id: doc.id.to_string(),
                            error: e.to_string(),
                        });
                    }
                }
            }
        }
    }
    drop(builds);

    let tool_timeout = Duration::from_secs(config.agent.tool_timeout_secs);
    let mut zone_tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(built.len());
    let mut zones = Vec::with_capacity(built.len());
    for zone in &built {
        let agent = make_zone_agent(
            builder.vector_engine(&zone.pair),
            builder.summary_engine(&zone.pair),
            &zone.zone_id,
            &settings,
            config.agent.zone_max_iterations,
            tool_timeout,
        );
        let agent = match &event_bus {
            Some(bus) => agent.with_event_bus(bus.clone()),
            None => agent,
        };
        zone_tools.push(zone_tool(&zone.zone_id, &zone.summary, Arc::new(agent), tool_timeout));
        zones.push(ZoneReport {
            zone_id: zone.zone_id.to_string(),
            summary: zone.summary.clone(),
            chunks: zone.chunk_count(),
            cache: zone.cache.labels(),
        });
    }

    let index = ZoneToolIndex::build(&settings, zone_tools).await?;
    let selector = RetrievalToolSelector::new(
        Arc::new(index),
        reranker,
        settings.clone(),
        config.retrieval.top_k,
        config.retrieval.top_n,
    )
    .with_compare_max_iterations(config.agent.zone_max_iterations)
    .with_tool_timeout(tool_timeout);
    let selector = match &event_bus {
        Some(bus) => selector.with_event_bus(bus.clone()),
        None => selector,
    };

    let dispatcher = DispatchAgent::new(settings, Arc::new(selector))
        .with_max_iterations(config.agent.dispatch_max_iterations);
    let dispatcher = match &event_bus {
        Some(bus) => dispatcher.with_event_bus(bus.clone()),
        None => dispatcher,
    };

    info!(ready = zones.len(), failed = failures.len(), "Services initialized");
    Ok(Services {
        report: InitReport { zones, failures },
        dispatcher: Arc::new(dispatcher),
    })
}
