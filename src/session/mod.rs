pub mod advance;
pub mod classify;
pub mod controller;
pub mod retry;

pub use advance::{AdvanceProtocol, SessionOutcome};
pub use classify::{ErrorClass, Plan};
pub use controller::{CompletionGuard, Phase, RecoveryController, SessionHandle};
pub use retry::RetryState;
