use thiserror::Error;

use crate::player::EngineError;

#[derive(Error, Debug)]
pub enum RecoveryError {
    #[error("Media engine unavailable: {0}")]
    EngineUnavailable(String),

    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Resume store error: {0}")]
    Store(String),

    #[error("Notifier error: {0}")]
    Notifier(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
