use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub playback: PlaybackConfig,

    #[serde(default)]
    pub recovery: RecoveryConfig,

    #[serde(default)]
    pub network: NetworkConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlaybackConfig {
    #[serde(default = "default_true")]
    pub auto_resume: bool,

    /// Positions below this are treated as "not really started".
    #[serde(default = "default_resume_floor")]
    pub resume_floor_seconds: u64,

    #[serde(default = "default_save_interval")]
    pub progress_save_interval_seconds: u64,

    /// Past this fraction the item counts as watched; periodic saves stop
    /// and completion clears the resume record instead.
    #[serde(default = "default_watched_threshold")]
    pub watched_threshold_percent: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryConfig {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_retry_delay")]
    pub retry_delay_ms: u64,

    /// A terminal engine signal is trusted only within this distance of
    /// the known duration.
    #[serde(default = "default_end_epsilon")]
    pub end_epsilon_ms: u64,

    /// Errors this close to the end are the content ending.
    #[serde(default = "default_near_end_window")]
    pub near_end_window_ms: u64,

    /// Successive errors within this distance of each other count as a
    /// retry loop rather than progress.
    #[serde(default = "default_loop_window")]
    pub loop_window_ms: u64,

    #[serde(default = "default_skip_step")]
    pub skip_step_ms: u64,

    #[serde(default = "default_loop_skip_step")]
    pub loop_skip_step_ms: u64,

    /// Fraction of the duration targeted by the corrupt-tail skip.
    #[serde(default = "default_tail_fraction")]
    pub tail_fraction: f64,

    #[serde(default = "default_completion_grace")]
    pub completion_grace_ms: u64,

    /// How long to let a remote orchestrator react to an advance message
    /// before tearing the session down.
    #[serde(default = "default_advance_grace")]
    pub advance_grace_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,

    #[serde(default = "default_heartbeat_interval")]
    pub heartbeat_interval_seconds: u64,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub notifier_endpoint: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if config_path.exists() {
            debug!("Loading config from {:?}", config_path);
            let contents =
                fs::read_to_string(&config_path).context("Failed to read config file")?;
            let config: Config =
                toml::from_str(&contents).context("Failed to parse config file")?;
            info!("Config loaded successfully");
            Ok(config)
        } else {
            info!("No config file found, using defaults");
            let config = Config::default();
            config.save()?;
            Ok(config)
        }
    }

    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(&config_path, contents).context("Failed to write config file")?;

        debug!("Config saved to {:?}", config_path);
        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir().context("Failed to get config directory")?;
        Ok(config_dir.join("reprise").join("config.toml"))
    }
}

impl PlaybackConfig {
    pub fn resume_floor(&self) -> Duration {
        Duration::from_secs(self.resume_floor_seconds)
    }

    pub fn save_interval(&self) -> Duration {
        Duration::from_secs(self.progress_save_interval_seconds)
    }

    pub fn watched_fraction(&self) -> f64 {
        f64::from(self.watched_threshold_percent) / 100.0
    }
}

impl RecoveryConfig {
    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.retry_delay_ms)
    }

    pub fn end_epsilon(&self) -> Duration {
        Duration::from_millis(self.end_epsilon_ms)
    }

    pub fn near_end_window(&self) -> Duration {
        Duration::from_millis(self.near_end_window_ms)
    }

    pub fn loop_window(&self) -> Duration {
        Duration::from_millis(self.loop_window_ms)
    }

    pub fn skip_step(&self) -> Duration {
        Duration::from_millis(self.skip_step_ms)
    }

    pub fn loop_skip_step(&self) -> Duration {
        Duration::from_millis(self.loop_skip_step_ms)
    }

    pub fn completion_grace(&self) -> Duration {
        Duration::from_millis(self.completion_grace_ms)
    }

    pub fn advance_grace(&self) -> Duration {
        Duration::from_millis(self.advance_grace_ms)
    }
}

impl NetworkConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_secs(self.heartbeat_interval_seconds)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            playback: PlaybackConfig::default(),
            recovery: RecoveryConfig::default(),
            network: NetworkConfig::default(),
        }
    }
}

impl Default for PlaybackConfig {
    fn default() -> Self {
        Self {
            auto_resume: default_true(),
            resume_floor_seconds: default_resume_floor(),
            progress_save_interval_seconds: default_save_interval(),
            watched_threshold_percent: default_watched_threshold(),
        }
    }
}

impl Default for RecoveryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            retry_delay_ms: default_retry_delay(),
            end_epsilon_ms: default_end_epsilon(),
            near_end_window_ms: default_near_end_window(),
            loop_window_ms: default_loop_window(),
            skip_step_ms: default_skip_step(),
            loop_skip_step_ms: default_loop_skip_step(),
            tail_fraction: default_tail_fraction(),
            completion_grace_ms: default_completion_grace(),
            advance_grace_ms: default_advance_grace(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            heartbeat_interval_seconds: default_heartbeat_interval(),
            notifier_endpoint: None,
        }
    }
}

// Default value functions
fn default_true() -> bool {
    true
}
fn default_resume_floor() -> u64 {
    30
}
fn default_save_interval() -> u64 {
    5
}
fn default_watched_threshold() -> u8 {
    95
}
fn default_max_retries() -> u32 {
    3
}
fn default_retry_delay() -> u64 {
    2000
}
fn default_end_epsilon() -> u64 {
    1000
}
fn default_near_end_window() -> u64 {
    5000
}
fn default_loop_window() -> u64 {
    10_000
}
fn default_skip_step() -> u64 {
    5000
}
fn default_loop_skip_step() -> u64 {
    15_000
}
fn default_tail_fraction() -> f64 {
    0.999
}
fn default_completion_grace() -> u64 {
    500
}
fn default_advance_grace() -> u64 {
    1500
}
fn default_request_timeout() -> u64 {
    4
}
fn default_heartbeat_interval() -> u64 {
    1
}
