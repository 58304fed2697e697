use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;
use url::Url;

use crate::config::NetworkConfig;
use crate::player::PlaybackSnapshot;

use super::{AdvanceNotifier, EpisodeAdvance};

/// JSON-RPC 2.0 notifier over HTTP POST. Responses carry no semantics
/// beyond the status code: 2xx means delivered.
pub struct RpcNotifier {
    client: reqwest::Client,
    endpoint: Url,
}

impl RpcNotifier {
    pub fn new(endpoint: Url, timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .expect("Failed to create HTTP client");

        Self { client, endpoint }
    }

    /// Builds a notifier when an endpoint is configured; `None` means no
    /// callback channel exists for this deployment.
    pub fn from_config(config: &NetworkConfig) -> Result<Option<Self>> {
        let Some(endpoint) = &config.notifier_endpoint else {
            return Ok(None);
        };
        let endpoint = Url::parse(endpoint).context("Invalid notifier endpoint")?;
        Ok(Some(Self::new(endpoint, config.request_timeout())))
    }

    async fn call(&self, method: &str, params: serde_json::Value) -> Result<()> {
        let envelope = json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
        });

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&envelope)
            .send()
            .await
            .context("Notifier request failed")?;

        if !response.status().is_success() {
            bail!("Notifier returned {}", response.status());
        }
        Ok(())
    }
}

#[async_trait]
impl AdvanceNotifier for RpcNotifier {
    async fn player_time(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        self.call(
            "playerEvent",
            json!({
                "event": "time",
                "position": snapshot.position.as_secs_f64(),
                "duration": snapshot.duration.as_secs_f64(),
                "paused": !snapshot.is_playing,
            }),
        )
        .await
    }

    async fn stopped(&self, snapshot: &PlaybackSnapshot) -> Result<()> {
        self.call(
            "playerEvent",
            json!({
                "event": "stopped",
                "position": snapshot.position.as_secs_f64(),
                "duration": snapshot.duration.as_secs_f64(),
                "paused": !snapshot.is_playing,
            }),
        )
        .await
    }

    async fn next_episode(&self, advance: &EpisodeAdvance) -> Result<()> {
        let mut params = json!({
            "season": advance.season,
            "episode": advance.episode,
        });
        if let Some(show_id) = &advance.show_id {
            params["showId"] = json!(show_id);
        }
        self.call("nextEpisode", params).await
    }
}
