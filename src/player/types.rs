/// Common types exchanged with engine backends.
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;

/// Discrete engine lifecycle states.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Idle,
    Loading,
    Playing,
    Paused,
    Ended,
    Error,
}

/// Point-in-time read of playback progress. Transient only; never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackSnapshot {
    pub position: Duration,
    pub duration: Duration,
    pub is_playing: bool,
}

impl PlaybackSnapshot {
    pub fn new(position: Duration, duration: Duration, is_playing: bool) -> Self {
        Self {
            position,
            duration,
            is_playing,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.duration.saturating_sub(self.position)
    }

    /// 0.0..=1.0, or 0.0 while the duration is still unknown.
    pub fn fraction_watched(&self) -> f64 {
        if self.duration.is_zero() {
            0.0
        } else {
            self.position.as_secs_f64() / self.duration.as_secs_f64()
        }
    }
}

/// Coarse origin of an engine error, used by recovery classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineErrorKind {
    /// Container/demux parse failure.
    Demux,
    /// Subtitle stream parse failure.
    Subtitle,
    /// Connection reset, DNS failure, or an explicit network error code.
    Network,
    /// Request or stream timeout.
    Timeout,
    /// Underlying I/O failure.
    Io,
    Other,
}

impl EngineErrorKind {
    /// Container or subtitle parsing; near the end of a stream these are
    /// usually the content ending, not corruption.
    pub fn is_format(&self) -> bool {
        matches!(self, EngineErrorKind::Demux | EngineErrorKind::Subtitle)
    }

    pub fn is_network(&self) -> bool {
        matches!(
            self,
            EngineErrorKind::Network | EngineErrorKind::Timeout | EngineErrorKind::Io
        )
    }
}

impl fmt::Display for EngineErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EngineErrorKind::Demux => "demux",
            EngineErrorKind::Subtitle => "subtitle",
            EngineErrorKind::Network => "network",
            EngineErrorKind::Timeout => "timeout",
            EngineErrorKind::Io => "io",
            EngineErrorKind::Other => "other",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Clone, Error)]
#[error("{kind} error: {message}")]
pub struct EngineError {
    pub kind: EngineErrorKind,
    pub message: String,
}

impl EngineError {
    pub fn new(kind: EngineErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn demux(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Demux, message)
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(EngineErrorKind::Network, message)
    }
}

/// Events the engine feeds into the recovery controller.
#[derive(Debug, Clone)]
pub enum EngineEvent {
    State(EngineState),
    Position(PlaybackSnapshot),
    Error(EngineError),
}

/// Explicit diagnostics surface; engines expose this instead of leaking
/// renderer internals.
#[derive(Debug, Clone, Default)]
pub struct EngineDiagnostics {
    pub backend: String,
    pub video_tracks: usize,
    pub audio_tracks: usize,
    pub subtitle_tracks: usize,
}
