//! Persistence of harvested review snapshots.

use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use crate::models::ReviewRecord;

/// Result type for persistence operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors from persisting a snapshot.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create output directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to encode reviews: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Where a snapshot ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredSnapshot {
    /// Key derived from the place name.
    pub key: String,
    /// Human-readable location (a file path for file sinks).
    pub location: String,
    pub records: usize,
}

/// Receives the ordered records of one harvest pass.
#[async_trait]
pub trait ReviewSink: Send + Sync {
    /// Store `records` under a key derived from `place_name`, replacing any
    /// previous snapshot for the same key.
    async fn store(
        &self,
        place_name: &str,
        records: &[ReviewRecord],
    ) -> StorageResult<StoredSnapshot>;
}

/// Storage key for a place name: whitespace and path separators become `_`.
pub fn storage_key(place_name: &str) -> String {
    let key: String = place_name
        .trim()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '\0' => '_',
            c if c.is_whitespace() || c.is_control() => '_',
            c => c,
        })
        .collect();

    if key.is_empty() {
        "place".to_string()
    } else {
        key
    }
}

/// Writes each snapshot as a pretty-printed JSON array to
/// `<directory>/<key>_reviews.json`.
#[derive(Debug, Clone)]
pub struct JsonFileSink {
    directory: PathBuf,
}

impl JsonFileSink {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// File a place's snapshot is written to.
    pub fn path_for(&self, place_name: &str) -> PathBuf {
        self.directory.join(format!("{}_reviews.json", storage_key(place_name)))
    }
}

#[async_trait]
impl ReviewSink for JsonFileSink {
    async fn store(
        &self,
        place_name: &str,
        records: &[ReviewRecord],
    ) -> StorageResult<StoredSnapshot> {
        tokio::fs::create_dir_all(&self.directory)
            .await
            .map_err(|source| StorageError::CreateDir {
                path: self.directory.clone(),
                source,
            })?;

        let path = self.path_for(place_name);
        let json = serde_json::to_string_pretty(records)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| StorageError::Write {
                path: path.clone(),
                source,
            })?;

        info!("Saved {} reviews to {}", records.len(), path.display());
        Ok(StoredSnapshot {
            key: storage_key(place_name),
            location: path.display().to_string(),
            records: records.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(text: &str, owner: Option<&str>) -> ReviewRecord {
        ReviewRecord {
            date: "a week ago".to_string(),
            rating: "5/5".to_string(),
            text: text.to_string(),
            owner: owner.map(str::to_string),
        }
    }

    #[test]
    fn test_storage_key() {
        assert_eq!(storage_key("Blue Bottle Coffee"), "Blue_Bottle_Coffee");
        assert_eq!(storage_key("Café A/B\\C"), "Café_A_B_C");
        assert_eq!(storage_key("  Padded  "), "Padded");
        assert_eq!(storage_key("   "), "place");
    }

    #[tokio::test]
    async fn test_writes_pretty_json_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path().join("out"));
        let records = vec![
            record("Très bon café", None),
            record("Nice", Some("Thanks!")),
        ];

        let stored = sink.store("Unknown Place", &records).await.unwrap();
        assert_eq!(stored.key, "Unknown_Place");
        assert_eq!(stored.records, 2);

        let path = dir.path().join("out").join("Unknown_Place_reviews.json");
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.contains("Très bon café"));
        assert!(content.contains("\n  {"));

        let parsed: Vec<ReviewRecord> = serde_json::from_str(&content).unwrap();
        assert_eq!(parsed, records);
        let raw: serde_json::Value = serde_json::from_str(&content).unwrap();
        assert!(raw[0]["owner"].is_null());
    }

    #[tokio::test]
    async fn test_store_replaces_previous_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let sink = JsonFileSink::new(dir.path());

        sink.store("Place", &[record("old", None), record("older", None)])
            .await
            .unwrap();
        sink.store("Place", &[]).await.unwrap();

        let content = std::fs::read_to_string(sink.path_for("Place")).unwrap();
        let parsed: Vec<ReviewRecord> = serde_json::from_str(&content).unwrap();
        assert!(parsed.is_empty());
    }
}
