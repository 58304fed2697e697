mod identifiers;
pub mod identity;

pub use identifiers::{CatalogId, SessionId, ShowId};
pub use identity::{ContentIdentity, ExplicitIdentity, resolve_identity};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

use crate::player::PlaybackSnapshot;

/// What kind of content a session is playing. Classified once when the
/// session is created, immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MediaKind {
    Movie,
    Episode {
        show_id: ShowId,
        season: u32,
        episode: u32,
    },
}

impl MediaKind {
    pub fn is_episode(&self) -> bool {
        matches!(self, MediaKind::Episode { .. })
    }
}

/// One playback attempt for one content reference, from start to terminal
/// outcome.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: SessionId,
    pub content_ref: Url,
    pub kind: MediaKind,
    pub started_at: DateTime<Utc>,
    pub last_known_duration: Option<Duration>,
}

impl Session {
    pub fn new(content_ref: Url, kind: MediaKind) -> Self {
        Self {
            id: SessionId::new(uuid::Uuid::new_v4().to_string()),
            content_ref,
            kind,
            started_at: Utc::now(),
            last_known_duration: None,
        }
    }

    /// Canonical resume-store key for this content.
    pub fn resume_key(&self) -> &str {
        self.content_ref.as_str()
    }
}

/// Structured outcome handed to callers that expect one instead of (or
/// alongside) the RPC channel. `position_ms == duration_ms` is the
/// canonical "fully watched" signal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaybackResult {
    pub position_ms: i64,
    pub duration_ms: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl PlaybackResult {
    pub fn from_snapshot(snapshot: &PlaybackSnapshot) -> Self {
        Self {
            position_ms: snapshot.position.as_millis() as i64,
            duration_ms: snapshot.duration.as_millis() as i64,
            season: None,
            episode: None,
        }
    }

    /// A fully-watched result for the given duration.
    pub fn completed(duration: Duration) -> Self {
        let ms = duration.as_millis() as i64;
        Self {
            position_ms: ms,
            duration_ms: ms,
            season: None,
            episode: None,
        }
    }

    pub fn with_episode(mut self, season: u32, episode: u32) -> Self {
        self.season = Some(season);
        self.episode = Some(episode);
        self
    }

    pub fn fully_watched(&self) -> bool {
        self.duration_ms > 0 && self.position_ms == self.duration_ms
    }
}

/// A fresh session request handed back to the caller, e.g. a resolved
/// next episode.
#[derive(Debug, Clone)]
pub struct SessionRequest {
    pub content_ref: Url,
    pub kind: MediaKind,
}
