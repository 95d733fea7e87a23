//! Per-zone index builder with content-hash caching.
//!
//! For each zone document the builder produces a vector index, a summary
//! index and a one-to-two line summary. Each of the three is reused from disk
//! when its recorded content hash matches the current one; otherwise it is
//! rebuilt and persisted.

use chrono::Utc;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};
use tracing::{info, warn};
use zonewatch_config::AppConfig;
use zonewatch_core::engine::QueryEngine;
use zonewatch_core::error::IndexError;
use zonewatch_core::zone::{ZoneDocument, ZoneId};
use crate::engine::EngineSettings;
use crate::splitter::{Chunk, SentenceSplitter};
use crate::store::{content_hash, IndexStore, Lookup, StoredSummary};
use crate::summary_index::{SummaryIndex, SummaryQueryEngine};
use crate::vector_index::{VectorIndex, VectorQueryEngine};

/// The fixed instruction used to derive a zone's cached summary.
pub const SUMMARY_PROMPT: &str = "Summarize this Zone information in 1-2 lines.";

/// How one persisted artifact was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    /// Loaded from disk with a matching hash
    Hit,
    /// Nothing on disk; built fresh
    Miss,
    /// On disk but outdated or unreadable; rebuilt
    Stale,
}

impl fmt::Display for CacheState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CacheState::Hit => "hit",
            CacheState::Miss => "miss",
            CacheState::Stale => "stale",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOutcome {
    pub vector_index: CacheState,
    pub summary_index: CacheState,
    pub summary: CacheState,
}

impl CacheOutcome {
    pub fn all_hits(&self) -> bool {
        self.vector_index == CacheState::Hit
            && self.summary_index == CacheState::Hit
            && self.summary == CacheState::Hit
    }

    pub fn labels(&self) -> [String; 3] {
        [
            self.vector_index.to_string(),
            self.summary_index.to_string(),
            self.summary.to_string(),
        ]
    }
}

/// A zone's two indexes.
#[derive(Debug, Clone)]
pub struct ZoneIndexPair {
    pub vector: Arc<VectorIndex>,
    pub summary: Arc<SummaryIndex>,
}

#[derive(Debug, Clone)]
pub struct BuiltZone {
    pub zone_id: ZoneId,
    pub pair: ZoneIndexPair,
    pub summary: String,
    pub cache: CacheOutcome,
}

impl BuiltZone {
    pub fn chunk_count(&self) -> usize {
        self.pair.summary.chunks().len()
    }
}

pub struct ZoneIndexBuilder {
    store: IndexStore,
    settings: EngineSettings,
    splitter: SentenceSplitter,
    locks: Mutex<HashMap<ZoneId, Arc<tokio::sync::Mutex<()>>>>,
}

impl ZoneIndexBuilder {
    pub fn new(store: IndexStore, settings: EngineSettings, splitter: SentenceSplitter) -> Self {
        Self {
            store,
            settings,
            splitter,
            locks: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(settings: EngineSettings, config: &AppConfig) -> Self {
        Self::new(
            IndexStore::new(&config.paths.storage_dir, &config.paths.summary_dir),
            settings,
            SentenceSplitter::new(config.index.chunk_size, config.index.chunk_overlap),
        )
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn store(&self) -> &IndexStore {
        &self.store
    }

    pub fn vector_engine(&self, pair: &ZoneIndexPair) -> Arc<dyn QueryEngine> {
        Arc::new(VectorQueryEngine::new(pair.vector.clone(), self.settings.clone()))
    }

    pub fn summary_engine(&self, pair: &ZoneIndexPair) -> Arc<dyn QueryEngine> {
        Arc::new(SummaryQueryEngine::new(pair.summary.clone(), self.settings.clone()))
    }

    fn zone_lock(&self, zone: &ZoneId) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
        locks.entry(zone.clone()).or_default().clone()
    }

    /// Build (or load) the index pair and summary for one zone.
    pub async fn build(&self, document: &ZoneDocument) -> zonewatch_core::Result<BuiltZone> {
        let zone = &document.id;
        if document.text.trim().is_empty() {
            return Err(IndexError::EmptyDocument(zone.to_string()).into());
        }

        let lock = self.zone_lock(zone);
        let _guard = lock.lock().await;

        let hash = content_hash(
            &document.text,
            self.splitter.chunk_size,
            self.splitter.chunk_overlap,
            &self.settings.embed_model,
        );
        let mut chunks: Option<Vec<Chunk>> = None;
        let mut split = || -> Vec<Chunk> { self.splitter.split(zone, &document.text) };

        // Vector index
        let (vector, vector_state) = match self.store.load_vector(zone).await {
            Lookup::Found(doc) if doc.content_hash == hash && !doc.nodes.is_empty() => {
                (VectorIndex::from_docstore(doc), CacheState::Hit)
            }
            lookup => {
                let state = rebuild_state(zone, "vector_index", &lookup);
                let built_chunks = chunks.get_or_insert_with(&mut split).clone();
                let index = VectorIndex::build(&self.settings, built_chunks, hash.clone()).await?;
                self.store.save_vector(index.docstore()).await?;
                (index, state)
            }
        };

        // Summary index
        let (summary_index, summary_index_state) = match self.store.load_summary_index(zone).await {
            Lookup::Found(doc) if doc.content_hash == hash && !doc.nodes.is_empty() => {
                (SummaryIndex::from_docstore(doc), CacheState::Hit)
            }
            lookup => {
                let state = rebuild_state(zone, "summary_index", &lookup);
                let built_chunks = match chunks.take() {
                    Some(c) => c,
                    None => split(),
                };
                let index = SummaryIndex::from_chunks(built_chunks, hash.clone())?;
                self.store.save_summary_index(index.docstore()).await?;
                (index, state)
            }
        };

        let pair = ZoneIndexPair {
            vector: Arc::new(vector),
            summary: Arc::new(summary_index),
        };

        // Summary
        let (summary, summary_state) = match self.store.load_summary(zone).await {
            Lookup::Found(stored) if stored.content_hash == hash => (stored.summary, CacheState::Hit),
            lookup => {
                let state = rebuild_state(zone, "summary", &lookup);
                let summary = self
                    .summary_engine(&pair)
                    .query(SUMMARY_PROMPT)
                    .await
                    .map_err(|e| IndexError::SummarizationFailed {
                        zone_id: zone.to_string(),
                        reason: e.to_string(),
                    })?;
                self.store
                    .save_summary(&StoredSummary {
                        zone_id: zone.clone(),
                        summary: summary.clone(),
                        content_hash: hash.clone(),
                        created_at: Utc::now(),
                    })
                    .await?;
                (summary, state)
            }
        };

        let cache = CacheOutcome {
            vector_index: vector_state,
            summary_index: summary_index_state,
            summary: summary_state,
        };

        info!(
            zone = %zone,
            chunks = pair.summary.chunks().len(),
            vector_index = %cache.vector_index,
            summary_index = %cache.summary_index,
            summary = %cache.summary,
            "Zone index ready"
        );

        Ok(BuiltZone {
            zone_id: zone.clone(),
            pair,
            summary,
            cache,
        })
    }
}

/// Classify a cache miss and log why the artifact is being rebuilt.
fn rebuild_state<T>(zone: &ZoneId, artifact: &str, lookup: &Lookup<T>) -> CacheState {
    match lookup {
        Lookup::Missing => CacheState::Miss,
        Lookup::Found(_) => {
            warn!(zone = %zone, artifact, "Persisted content hash changed, rebuilding");
            CacheState::Stale
        }
        Lookup::Unreadable(reason) => {
            warn!(zone = %zone, artifact, reason = %reason, "Persisted file unreadable, rebuilding");
            CacheState::Stale
        }
    }
}
