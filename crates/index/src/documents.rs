//! Zone document ingestion: loading `*.txt` reports and accepting uploads.

use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use zonewatch_core::error::IndexError;
use zonewatch_core::zone::{ZoneDocument, ZoneId};

/// Load every `*.txt` file directly inside `dir`, sorted by file name.
///
/// A missing directory is created and yields no documents. Files whose stem
/// is not a valid zone id are skipped with a warning.
pub async fn load_zone_documents(dir: &Path) -> Result<Vec<ZoneDocument>, IndexError> {
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to create {}: {e}", dir.display())))?;

    let mut entries = tokio::fs::read_dir(dir)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to read {}: {e}", dir.display())))?;

    let mut paths = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| IndexError::Storage(e.to_string()))?
    {
        let path = entry.path();
        let is_file = entry.file_type().await.map(|t| t.is_file()).unwrap_or(false);
        if is_file && path.extension().and_then(|e| e.to_str()) == Some("txt") {
            paths.push(path);
        }
    }
    paths.sort_by(|a, b| a.file_name().cmp(&b.file_name()));

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
        let Ok(zone_id) = ZoneId::new(stem) else {
            warn!(path = %path.display(), "Skipping file with invalid zone id");
            continue;
        };
        let bytes = tokio::fs::read(&path)
            .await
            .map_err(|e| IndexError::Storage(format!("Failed to read {}: {e}", path.display())))?;
        let text = String::from_utf8_lossy(&bytes).into_owned();
        documents.push(
            ZoneDocument::new(zone_id, text).with_metadata("path", path.display().to_string()),
        );
    }

    debug!(dir = %dir.display(), count = documents.len(), "Loaded zone documents");
    Ok(documents)
}

/// Check an uploaded file name: a bare `<zone-id>.txt`.
pub fn validate_upload_name(file_name: &str) -> Result<ZoneId, IndexError> {
    let reject = |reason: &str| IndexError::InvalidUpload {
        name: file_name.to_string(),
        reason: reason.to_string(),
    };

    if file_name.contains(['/', '\\']) {
        return Err(reject("file name must not contain path separators"));
    }
    let Some(stem) = file_name.strip_suffix(".txt") else {
        return Err(reject("only .txt files are accepted"));
    };
    ZoneId::new(stem).map_err(|_| reject("stem must be a valid zone id"))
}

/// Write an uploaded report into `dir` verbatim, replacing any file of the
/// same name.
pub async fn save_upload(dir: &Path, file_name: &str, bytes: &[u8]) -> Result<PathBuf, IndexError> {
    let zone = validate_upload_name(file_name)?;
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to create {}: {e}", dir.display())))?;

    let path = dir.join(file_name);
    tokio::fs::write(&path, bytes)
        .await
        .map_err(|e| IndexError::Storage(format!("Failed to write {}: {e}", path.display())))?;

    debug!(zone = %zone, bytes = bytes.len(), "Saved upload");
    Ok(path)
}
