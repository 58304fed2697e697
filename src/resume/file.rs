use anyhow::{Context, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::debug;

use super::ResumeStore;

/// In-process store; the default when no persistence path is configured,
/// and the store used by tests.
#[derive(Debug, Default)]
pub struct MemoryResumeStore {
    entries: std::sync::Mutex<HashMap<String, i64>>,
}

impl MemoryResumeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ResumeStore for MemoryResumeStore {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.entries.lock().unwrap().get(key).copied())
    }

    async fn set(&self, key: &str, position_ms: i64) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(key.to_string(), position_ms);
        Ok(())
    }
}

/// Flat key -> integer-milliseconds map persisted as a single JSON file.
#[derive(Debug)]
pub struct JsonResumeStore {
    path: PathBuf,
    entries: Mutex<HashMap<String, i64>>,
}

impl JsonResumeStore {
    pub async fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = tokio::fs::read_to_string(&path)
                .await
                .context("Failed to read resume file")?;
            serde_json::from_str(&contents).context("Failed to parse resume file")?
        } else {
            HashMap::new()
        };
        debug!("Opened resume store at {:?}", path);
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    pub fn default_path() -> Result<PathBuf> {
        let data_dir = dirs::data_dir().context("Failed to get data directory")?;
        Ok(data_dir.join("reprise").join("resume.json"))
    }

    async fn flush(path: &Path, entries: &HashMap<String, i64>) -> Result<()> {
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .context("Failed to create resume directory")?;
        }
        let contents =
            serde_json::to_string_pretty(entries).context("Failed to serialize resume map")?;
        tokio::fs::write(path, contents)
            .await
            .context("Failed to write resume file")?;
        Ok(())
    }
}

#[async_trait]
impl ResumeStore for JsonResumeStore {
    async fn get(&self, key: &str) -> Result<Option<i64>> {
        Ok(self.entries.lock().await.get(key).copied())
    }

    async fn set(&self, key: &str, position_ms: i64) -> Result<()> {
        let mut entries = self.entries.lock().await;
        entries.insert(key.to_string(), position_ms);
        Self::flush(&self.path, &entries).await
    }
}
