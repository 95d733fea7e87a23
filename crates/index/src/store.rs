//! On-disk layout for persisted zone indexes and summaries.
//!
//! ```text
//! storage/<zone>/vector_index/docstore.json
//! storage/<zone>/summary_index/docstore.json
//! summaries/<zone>.json
//! ```
//!
//! Every file records the content hash it was built from. Files are written
//! atomically (temp file + rename) so a crash never leaves a half-written
//! docstore behind.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use tracing::warn;
use zonewatch_core::error::IndexError;
use zonewatch_core::zone::ZoneId;
use crate::splitter::Chunk;

pub const DOCSTORE_FILE: &str = "docstore.json";

/// Hash of everything that determines a zone's chunks and embeddings.
pub fn content_hash(text: &str, chunk_size: usize, chunk_overlap: usize, embed_model: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(text.as_bytes());
    hasher.update([0u8]);
    hasher.update(chunk_size.to_le_bytes());
    hasher.update(chunk_overlap.to_le_bytes());
    hasher.update(embed_model.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect()
}

/// A chunk with its embedding, as stored in the vector docstore.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddedNode {
    pub chunk: Chunk,
    pub embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorDocstore {
    pub zone_id: ZoneId,
    pub content_hash: String,
    pub embed_model: String,
    pub nodes: Vec<EmbeddedNode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SummaryDocstore {
    pub zone_id: ZoneId,
    pub content_hash: String,
    pub nodes: Vec<Chunk>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredSummary {
    pub zone_id: ZoneId,
    pub summary: String,
    pub content_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Result of looking for a persisted file.
#[derive(Debug)]
pub enum Lookup<T> {
    Found(T),
    Missing,
    /// Present but unreadable; the reason is logged by the caller.
    Unreadable(String),
}

/// Paths for the storage and summary roots.
#[derive(Debug, Clone)]
pub struct IndexStore {
    storage_dir: PathBuf,
    summary_dir: PathBuf,
}

impl IndexStore {
    pub fn new(storage_dir: impl Into<PathBuf>, summary_dir: impl Into<PathBuf>) -> Self {
        Self {
            storage_dir: storage_dir.into(),
            summary_dir: summary_dir.into(),
        }
    }

    pub fn vector_path(&self, zone: &ZoneId) -> PathBuf {
        self.storage_dir.join(zone.as_str()).join("vector_index").join(DOCSTORE_FILE)
    }

    pub fn summary_index_path(&self, zone: &ZoneId) -> PathBuf {
        self.storage_dir.join(zone.as_str()).join("summary_index").join(DOCSTORE_FILE)
    }

    pub fn summary_path(&self, zone: &ZoneId) -> PathBuf {
        self.summary_dir.join(format!("{zone}.json"))
    }

    pub async fn load_vector(&self, zone: &ZoneId) -> Lookup<VectorDocstore> {
        read_json(&self.vector_path(zone)).await
    }

    pub async fn save_vector(&self, docstore: &VectorDocstore) -> Result<(), IndexError> {
        write_json_atomic(&self.vector_path(&docstore.zone_id), docstore).await
    }

    pub async fn load_summary_index(&self, zone: &ZoneId) -> Lookup<SummaryDocstore> {
        read_json(&self.summary_index_path(zone)).await
    }

    pub async fn save_summary_index(&self, docstore: &SummaryDocstore) -> Result<(), IndexError> {
        write_json_atomic(&self.summary_index_path(&docstore.zone_id), docstore).await
    }

    pub async fn load_summary(&self, zone: &ZoneId) -> Lookup<StoredSummary> {
        read_json(&self.summary_path(zone)).await
    }

    pub async fn save_summary(&self, summary: &StoredSummary) -> Result<(), IndexError> {
        write_json_atomic(&self.summary_path(&summary.zone_id), summary).await
    }
}

async fn read_json<T: DeserializeOwned>(path: &Path) -> Lookup<T> {
    let bytes = match tokio::fs::read(path).await {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Lookup::Missing,
        Err(e) => return Lookup::Unreadable(e.to_string()),
    };
    match serde_json::from_slice(&bytes) {
        Ok(value) => Lookup::Found(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Persisted index is not valid JSON");
            Lookup::Unreadable(e.to_string())
        }
    }
}

/// Serialize `value` to `path` via a sibling temp file and rename.
pub async fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), IndexError> {
    let parent = path
        .parent()
        .ok_or_else(|| IndexError::Storage(format!("{} has no parent directory", path.display())))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to create {}: {e}", parent.display())))?;

    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| IndexError::Storage(format!("Failed to serialize {}: {e}", path.display())))?;

    let tmp = path.with_extension(format!("json.tmp-{}", uuid::Uuid::new_v4().simple()));
    tokio::fs::write(&tmp, &json)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to write {}: {e}", tmp.display())))?;
    if let Err(e) = tokio::fs::rename(&tmp, path).await {
        let _ = tokio::fs::remove_file(&tmp).await;
        return Err(IndexError::Storage(format!("Failed to replace {}: {e}", path.display())));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn zone() -> ZoneId {
        ZoneId::new("north").unwrap()
    }

    #[test]
    fn hash_depends_on_every_input() {
        let base = content_hash("text", 1024, 200, "gemini-embedding-001");
        assert_eq!(base.len(), 64);
        assert_eq!(base, content_hash("text", 1024, 200, "gemini-embedding-001"));
        assert_ne!(base, content_hash("text!", 1024, 200, "gemini-embedding-001"));
        assert_ne!(base, content_hash("text", 512, 200, "gemini-embedding-001"));
        assert_ne!(base, content_hash("text", 1024, 100, "gemini-embedding-001"));
        assert_ne!(base, content_hash("text", 1024, 200, "text-embedding-3-small"));
    }

    #[test]
    fn layout_is_zone_scoped() {
        let store = IndexStore::new("storage", "summaries");
        assert_eq!(
            store.vector_path(&zone()),
            PathBuf::from("storage/north/vector_index/docstore.json")
        );
        assert_eq!(
            store.summary_index_path(&zone()),
            PathBuf::from("storage/north/summary_index/docstore.json")
        );
        assert_eq!(store.summary_path(&zone()), PathBuf::from("summaries/north.json"));
    }

    #[tokio::test]
    async fn summary_roundtrip_and_missing() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("storage"), dir.path().join("summaries"));
        assert!(matches!(store.load_summary(&zone()).await, Lookup::Missing));

        let summary = StoredSummary {
            zone_id: zone(),
            summary: "North gate is busy.".into(),
            content_hash: "abc".into(),
            created_at: Utc::now(),
        };
        store.save_summary(&summary).await.unwrap();

        match store.load_summary(&zone()).await {
            Lookup::Found(s) => {
                assert_eq!(s.summary, "North gate is busy.");
                assert_eq!(s.content_hash, "abc");
            }
            other => panic!("expected stored summary, got {other:?}"),
        }

        // No temp files left behind
        let leftovers: Vec<_> = std::fs::read_dir(dir.path().join("summaries"))
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_string_lossy().contains(".tmp-"))
            .collect();
        assert!(leftovers.is_empty());
    }

    #[tokio::test]
    async fn corrupted_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let store = IndexStore::new(dir.path().join("storage"), dir.path().join("summaries"));
        let path = store.vector_path(&zone());
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(&path, b"{not json").unwrap();
        assert!(matches!(store.load_vector(&zone()).await, Lookup::Unreadable(_)));
    }
}
