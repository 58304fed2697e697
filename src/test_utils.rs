#![cfg(test)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

use crate::catalog::{CatalogLookup, StreamResolver};
use crate::models::CatalogId;
use crate::notify::{AdvanceNotifier, EpisodeAdvance};
use crate::player::{EngineError, EngineState, MediaEngine, PlaybackSnapshot};

/// Opt-in log output while debugging tests: `RUST_LOG=debug cargo test`.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Wait for a condition to become true, polling every few milliseconds.
pub async fn wait_until<F>(mut condition: F, max_wait: Duration) -> bool
where
    F: FnMut() -> bool,
{
    let start = std::time::Instant::now();
    while start.elapsed() < max_wait {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCall {
    Load(String),
    Play,
    Pause,
    Stop,
    Seek(Duration),
}

/// Engine double that records every call and can fail on demand.
#[derive(Default)]
pub struct MockEngine {
    calls: Mutex<Vec<EngineCall>>,
    snapshot: Mutex<Option<PlaybackSnapshot>>,
    fail_load: Mutex<bool>,
    fail_seek: Mutex<Option<EngineError>>,
}

impl MockEngine {
    pub fn calls(&self) -> Vec<EngineCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn seeks(&self) -> Vec<Duration> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                EngineCall::Seek(position) => Some(position),
                _ => None,
            })
            .collect()
    }

    pub fn stop_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| **call == EngineCall::Stop)
            .count()
    }

    pub fn set_snapshot(&self, snapshot: PlaybackSnapshot) {
        *self.snapshot.lock().unwrap() = Some(snapshot);
    }

    pub fn fail_next_load(&self) {
        *self.fail_load.lock().unwrap() = true;
    }

    pub fn fail_next_seek(&self, error: EngineError) {
        *self.fail_seek.lock().unwrap() = Some(error);
    }

    fn record(&self, call: EngineCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl MediaEngine for MockEngine {
    async fn load(&self, url: &str) -> Result<(), EngineError> {
        self.record(EngineCall::Load(url.to_string()));
        if std::mem::take(&mut *self.fail_load.lock().unwrap()) {
            return Err(EngineError::network("no engine"));
        }
        Ok(())
    }

    async fn play(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Play);
        Ok(())
    }

    async fn pause(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Pause);
        Ok(())
    }

    async fn stop(&self) -> Result<(), EngineError> {
        self.record(EngineCall::Stop);
        Ok(())
    }

    async fn seek(&self, position: Duration) -> Result<(), EngineError> {
        self.record(EngineCall::Seek(position));
        if let Some(error) = self.fail_seek.lock().unwrap().take() {
            return Err(error);
        }
        Ok(())
    }

    async fn snapshot(&self) -> Option<PlaybackSnapshot> {
        *self.snapshot.lock().unwrap()
    }

    async fn state(&self) -> EngineState {
        EngineState::Idle
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifierCall {
    Time(Duration),
    Stopped(Duration),
    NextEpisode { season: u32, episode: u32 },
}

/// Notifier double recording delivered messages.
#[derive(Default)]
pub struct RecordingNotifier {
    calls: Mutex<Vec<NotifierCall>>,
    fail_next_episode: bool,
}

impl RecordingNotifier {
    pub fn failing() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_next_episode: true,
        }
    }

    pub fn calls(&self) -> Vec<NotifierCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn stopped_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, NotifierCall::Stopped(_)))
            .count()
    }

    pub fn time_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, NotifierCall::Time(_)))
            .count()
    }

    pub fn next_episode_calls(&self) -> Vec<(u32, u32)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                NotifierCall::NextEpisode { season, episode } => Some((season, episode)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl AdvanceNotifier for RecordingNotifier {
    async fn player_time(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(NotifierCall::Time(snapshot.position));
        Ok(())
    }

    async fn stopped(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(NotifierCall::Stopped(snapshot.position));
        Ok(())
    }

    async fn next_episode(&self, advance: &EpisodeAdvance) -> Result<()> {
        self.calls.lock().unwrap().push(NotifierCall::NextEpisode {
            season: advance.season,
            episode: advance.episode,
        });
        if self.fail_next_episode {
            bail!("callback channel down");
        }
        Ok(())
    }
}

/// Catalog double with a fixed answer.
pub struct StaticCatalog {
    id: Option<CatalogId>,
}

impl StaticCatalog {
    pub fn with(id: CatalogId) -> Self {
        Self { id: Some(id) }
    }

    pub fn empty() -> Self {
        Self { id: None }
    }
}

#[async_trait]
impl CatalogLookup for StaticCatalog {
    async fn resolve_title(&self, _title: &str) -> Result<Option<CatalogId>> {
        Ok(self.id.clone())
    }
}

/// Stream resolver double with a fixed answer.
pub struct StaticStreams {
    url: Option<Url>,
}

impl StaticStreams {
    pub fn with(url: Url) -> Self {
        Self { url: Some(url) }
    }

    pub fn empty() -> Self {
        Self { url: None }
    }
}

#[async_trait]
impl StreamResolver for StaticStreams {
    async fn next_episode_stream(
        &self,
        _id: &CatalogId,
        _season: u32,
        _episode: u32,
    ) -> Result<Option<Url>> {
        Ok(self.url.clone())
    }
}
