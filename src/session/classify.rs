//! Engine-error classification.
//!
//! Streams fail in ways that look alike from the outside: a container
//! throwing a parse error two seconds before the end is the content
//! ending, the same error twenty minutes in is a damaged stream, and a
//! connection reset anywhere is worth another try. The rules below are
//! applied in priority order; the first match wins.

use std::time::Duration;
use tracing::debug;

use crate::config::RecoveryConfig;
use crate::player::{EngineError, PlaybackSnapshot};

use super::retry::RetryState;

/// Error taxonomy, for logging and retry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    Network,
    NearEndFormat,
    RetryLoop,
    MidStreamFormat,
    /// Non-format error close enough to the end to be the content ending.
    EndOfStream,
    MaxRetries,
    Fatal,
}

/// What the controller should do about a classified error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Plan {
    /// The error is the content ending; run the completion path.
    TreatAsCompletion { class: ErrorClass },
    /// Schedule a delayed resume at `resume_at`.
    Retry { class: ErrorClass, resume_at: Duration },
    /// No recovery; the session terminates and the engine settles on its own.
    GiveUp { class: ErrorClass },
}

/// Classify `error` against the current snapshot. Records the error in
/// `retry` so the next classification sees its position; the caller bumps
/// the attempt count when it acts on a `Retry` plan.
pub fn classify(
    error: &EngineError,
    snapshot: &PlaybackSnapshot,
    retry: &mut RetryState,
    config: &RecoveryConfig,
) -> Plan {
    let position = snapshot.position;
    let duration = snapshot.duration;
    let near_end = !duration.is_zero() && snapshot.remaining() <= config.near_end_window();
    let converges = retry.converges(position, config.loop_window());

    let plan = if error.kind.is_format() && near_end {
        if converges {
            // The tail itself is damaged. One skip to just before the end,
            // after that let the engine end rather than loop.
            if retry.can_retry(config.max_retries) && retry.take_tail_skip() {
                retry.suspect_loop();
                Plan::Retry {
                    class: ErrorClass::RetryLoop,
                    resume_at: duration.mul_f64(config.tail_fraction),
                }
            } else {
                Plan::TreatAsCompletion {
                    class: ErrorClass::RetryLoop,
                }
            }
        } else {
            Plan::TreatAsCompletion {
                class: ErrorClass::NearEndFormat,
            }
        }
    } else if error.kind.is_format() {
        if converges {
            retry.suspect_loop();
        }
        if retry.can_retry(config.max_retries) {
            let step = if retry.loop_suspected() {
                config.loop_skip_step()
            } else {
                config.skip_step()
            };
            let target = if duration.is_zero() {
                position + step
            } else {
                (position + step).min(duration)
            };
            Plan::Retry {
                class: ErrorClass::MidStreamFormat,
                resume_at: target,
            }
        } else {
            Plan::GiveUp {
                class: ErrorClass::MaxRetries,
            }
        }
    } else if near_end {
        Plan::TreatAsCompletion {
            class: ErrorClass::EndOfStream,
        }
    } else if error.kind.is_network() {
        if retry.can_retry(config.max_retries) {
            // Resume from where the error happened, not from the session's
            // original start position.
            Plan::Retry {
                class: ErrorClass::Network,
                resume_at: position,
            }
        } else {
            Plan::GiveUp {
                class: ErrorClass::MaxRetries,
            }
        }
    } else {
        Plan::GiveUp {
            class: ErrorClass::Fatal,
        }
    };

    retry.record(error.kind, position);
    debug!(
        kind = %error.kind,
        position_ms = position.as_millis() as u64,
        ?plan,
        "classified engine error"
    );
    plan
}
