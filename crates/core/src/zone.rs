//! Zone identity and zone documents.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use crate::error::IndexError;

/// A zone identifier: the stem of the zone's source file.
///
/// It is used verbatim as a directory name under the storage root and inside
/// tool names, so the character set is restricted.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ZoneId(String);

impl ZoneId {
    pub fn new(raw: impl Into<String>) -> Result<Self, IndexError> {
        let raw = raw.into();
        if Self::is_valid(&raw) {
            Ok(Self(raw))
        } else {
            Err(IndexError::InvalidZoneId(raw))
        }
    }

    pub fn is_valid(raw: &str) -> bool {
        !raw.is_empty()
            && !raw.starts_with('.')
            && raw
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ZoneId {
    type Error = IndexError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ZoneId> for String {
    fn from(id: ZoneId) -> Self {
        id.0
    }
}

impl AsRef<str> for ZoneId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// One ingested zone report. Immutable after loading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ZoneDocument {
    pub id: ZoneId,
    pub text: String,
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

impl ZoneDocument {
    pub fn new(id: ZoneId, text: impl Into<String>) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert("zone_id".to_string(), id.to_string());
        Self {
            id,
            text: text.into(),
            metadata,
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
