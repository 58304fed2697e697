pub mod rpc;

pub use rpc::RpcNotifier;

use anyhow::Result;
use async_trait::async_trait;

use crate::player::PlaybackSnapshot;

/// Advance-to request sent to the remote orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EpisodeAdvance {
    pub season: u32,
    pub episode: u32,
    pub show_id: Option<String>,
}

/// Session-lifecycle sink. Delivery failures are never fatal to the
/// session; mid-session callers log and move on.
#[async_trait]
pub trait AdvanceNotifier: Send + Sync {
    /// Periodic progress heartbeat.
    async fn player_time(&self, snapshot: &PlaybackSnapshot) -> Result<()>;
    /// One-shot terminal stop message.
    async fn stopped(&self, snapshot: &PlaybackSnapshot) -> Result<()>;
    /// Ask the orchestrator to move to the given episode.
    async fn next_episode(&self, advance: &EpisodeAdvance) -> Result<()>;
}
