pub mod traits;
pub mod types;

pub use traits::MediaEngine;
pub use types::{
    EngineDiagnostics, EngineError, EngineErrorKind, EngineEvent, EngineState, PlaybackSnapshot,
};
