use std::time::Duration;

use crate::player::EngineErrorKind;

/// Per-session retry bookkeeping. Owned by the controller, mutated only on
/// its serial queue, and reset only when a new session starts — attempts
/// carry across error classes.
#[derive(Debug, Default)]
pub struct RetryState {
    pub attempts: u32,
    pub last_error_kind: Option<EngineErrorKind>,
    pub last_error_position: Option<Duration>,
    loop_suspected: bool,
    tail_skip_done: bool,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn can_retry(&self, max_retries: u32) -> bool {
        self.attempts < max_retries
    }

    pub fn bump(&mut self) {
        self.attempts += 1;
    }

    /// True when this format error landed within `window` of the previous
    /// format error: positions are converging instead of advancing.
    pub fn converges(&self, position: Duration, window: Duration) -> bool {
        match (self.last_error_kind, self.last_error_position) {
            (Some(kind), Some(last)) if kind.is_format() => abs_diff(last, position) <= window,
            _ => false,
        }
    }

    pub fn record(&mut self, kind: EngineErrorKind, position: Duration) {
        self.last_error_kind = Some(kind);
        self.last_error_position = Some(position);
    }

    pub fn suspect_loop(&mut self) {
        self.loop_suspected = true;
    }

    pub fn loop_suspected(&self) -> bool {
        self.loop_suspected
    }

    /// Claims the one skip-to-tail mitigation this session gets. Returns
    /// false once it has already run.
    pub fn take_tail_skip(&mut self) -> bool {
        !std::mem::replace(&mut self.tail_skip_done, true)
    }
}

fn abs_diff(a: Duration, b: Duration) -> Duration {
    if a > b { a - b } else { b - a }
}
