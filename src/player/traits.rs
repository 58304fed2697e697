use async_trait::async_trait;
use std::time::Duration;

use super::types::{EngineDiagnostics, EngineError, EngineState, PlaybackSnapshot};

/// Abstract playback engine. The controller only ever talks to this
/// interface; decoding, rendering, and track selection live behind it.
#[async_trait]
pub trait MediaEngine: Send + Sync {
    async fn load(&self, url: &str) -> Result<(), EngineError>;
    async fn play(&self) -> Result<(), EngineError>;
    async fn pause(&self) -> Result<(), EngineError>;
    async fn stop(&self) -> Result<(), EngineError>;
    async fn seek(&self, position: Duration) -> Result<(), EngineError>;
    /// Current position/duration, if the engine has a loaded item.
    async fn snapshot(&self) -> Option<PlaybackSnapshot>;
    async fn state(&self) -> EngineState;
    async fn diagnostics(&self) -> EngineDiagnostics {
        EngineDiagnostics::default()
    }
}
