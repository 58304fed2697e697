//! Playback session supervision for external media engines: recovery
//! classification, bounded retries, resume persistence, and exactly-once
//! completion routing.

pub mod catalog;
pub mod config;
pub mod models;
pub mod notify;
pub mod player;
pub mod resume;
pub mod session;
pub mod utils;
pub mod workers;

#[cfg(test)]
mod test_utils;

pub use config::Config;
pub use models::{MediaKind, PlaybackResult, Session, SessionRequest};
pub use player::{EngineError, EngineErrorKind, EngineEvent, EngineState, MediaEngine};
pub use session::{AdvanceProtocol, RecoveryController, SessionHandle, SessionOutcome};
pub use utils::RecoveryError;
