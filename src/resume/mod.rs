mod file;
pub mod keys;
mod tracker;

pub use file::{JsonResumeStore, MemoryResumeStore};
pub use tracker::ProgressTracker;

use anyhow::Result;
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, warn};

/// Persistent key -> position map. `Some(0)` is the cleared sentinel
/// ("fully watched, start over"); `None` means the key was never seen.
#[async_trait]
pub trait ResumeStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<i64>>;
    async fn set(&self, key: &str, position_ms: i64) -> Result<()>;
}

/// Fuzzy lookup over the candidate-key ladder; returns the first candidate
/// holding a positive position.
pub async fn get_best(store: &dyn ResumeStore, raw_key: &str) -> Option<Duration> {
    for key in keys::candidates(raw_key) {
        match store.get(&key).await {
            Ok(Some(ms)) if ms > 0 => {
                debug!(%key, position_ms = ms, "resume position matched");
                return Some(Duration::from_millis(ms as u64));
            }
            Ok(_) => {}
            Err(e) => warn!(%key, "resume lookup failed: {e:#}"),
        }
    }
    None
}
