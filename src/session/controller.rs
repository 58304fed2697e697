//! Session recovery controller.
//!
//! One logical actor per session: engine callbacks, timer ticks, and stop
//! requests all land on a single queue and are processed strictly in
//! arrival order. Nothing outside this actor mutates `RetryState` or the
//! completion guard. Blocking I/O (notifier calls, persistence writes)
//! either runs on spawned tasks whose results never feed back into state,
//! or — on the terminal completion path only — is awaited behind the
//! already-armed guard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::models::{MediaKind, PlaybackResult, Session};
use crate::notify::AdvanceNotifier;
use crate::player::{EngineError, EngineEvent, EngineState, MediaEngine, PlaybackSnapshot};
use crate::resume::{self, ProgressTracker, ResumeStore};
use crate::utils::RecoveryError;
use crate::workers::heartbeat;

use super::advance::{AdvanceProtocol, SessionOutcome};
use super::classify::{self, Plan};
use super::retry::RetryState;

/// Controller lifecycle. `Terminated` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Playing,
    ErrorDetected,
    Retrying,
    Completing,
    Terminated,
}

/// One-shot completion latch. Once armed, no further completion or retry
/// action may execute for the session; it is never unset.
#[derive(Debug, Default)]
pub struct CompletionGuard {
    handled: bool,
}

impl CompletionGuard {
    /// Arms the guard. Returns false if it was already armed.
    pub fn arm(&mut self) -> bool {
        !std::mem::replace(&mut self.handled, true)
    }

    pub fn is_handled(&self) -> bool {
        self.handled
    }
}

#[derive(Debug)]
enum ControllerMsg {
    Engine(EngineEvent),
    RetryFire { generation: u64 },
    Stop { respond_to: oneshot::Sender<()> },
}

#[derive(Debug, Clone, Copy)]
struct PendingRetry {
    generation: u64,
    resume_at: Duration,
}

/// Owns one `Session` and everything mutable about it.
pub struct RecoveryController {
    engine: Arc<dyn MediaEngine>,
    store: Arc<dyn ResumeStore>,
    notifier: Option<Arc<dyn AdvanceNotifier>>,
    advance: AdvanceProtocol,
    config: Config,

    session: Session,
    phase: Phase,
    retry: RetryState,
    guard: CompletionGuard,
    tracker: ProgressTracker,
    last_snapshot: PlaybackSnapshot,
    pending_retry: Option<PendingRetry>,
    retry_generation: u64,
    outcome: Option<SessionOutcome>,

    self_tx: mpsc::UnboundedSender<ControllerMsg>,
    receiver: mpsc::UnboundedReceiver<ControllerMsg>,
    shutdown: CancellationToken,
}

impl RecoveryController {
    pub fn new(
        session: Session,
        engine: Arc<dyn MediaEngine>,
        store: Arc<dyn ResumeStore>,
        notifier: Option<Arc<dyn AdvanceNotifier>>,
        advance: AdvanceProtocol,
        config: Config,
    ) -> (SessionHandle, RecoveryController) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let tracker = ProgressTracker::new(
            config.playback.save_interval(),
            config.playback.watched_fraction(),
            config.playback.resume_floor(),
        );

        let controller = RecoveryController {
            engine,
            store,
            notifier,
            advance,
            config,
            session,
            phase: Phase::Idle,
            retry: RetryState::new(),
            guard: CompletionGuard::default(),
            tracker,
            last_snapshot: PlaybackSnapshot::default(),
            pending_retry: None,
            retry_generation: 0,
            outcome: None,
            self_tx: sender.clone(),
            receiver,
            shutdown: CancellationToken::new(),
        };
        let handle = SessionHandle { sender };

        (handle, controller)
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn outcome(&self) -> Option<&SessionOutcome> {
        self.outcome.as_ref()
    }

    /// Acquire the engine and begin playback: at the resume hint when one
    /// is present and positive, else at the best fuzzy store match, else
    /// at zero.
    pub async fn start(&mut self, resume_hint: Option<Duration>) -> Result<(), RecoveryError> {
        let start_at = self.resolve_start_position(resume_hint).await;

        self.engine
            .load(self.session.content_ref.as_str())
            .await
            .map_err(|e| RecoveryError::EngineUnavailable(e.to_string()))?;
        if !start_at.is_zero() {
            self.engine.seek(start_at).await?;
        }
        self.engine.play().await?;
        self.phase = Phase::Playing;

        if let Some(notifier) = &self.notifier {
            let _ = heartbeat::spawn(
                self.engine.clone(),
                notifier.clone(),
                self.shutdown.child_token(),
                self.config.network.heartbeat_interval(),
            );
        }

        let diagnostics = self.engine.diagnostics().await;
        debug!(
            backend = %diagnostics.backend,
            audio_tracks = diagnostics.audio_tracks,
            subtitle_tracks = diagnostics.subtitle_tracks,
            "engine acquired"
        );
        info!(
            session = %self.session.id,
            start_ms = start_at.as_millis() as u64,
            "playback session started"
        );
        Ok(())
    }

    async fn resolve_start_position(&self, resume_hint: Option<Duration>) -> Duration {
        if let Some(hint) = resume_hint.filter(|h| !h.is_zero()) {
            return hint;
        }
        if !self.config.playback.auto_resume {
            return Duration::ZERO;
        }
        match resume::get_best(self.store.as_ref(), self.session.resume_key()).await {
            Some(stored) if self.tracker.usable_resume(stored) => stored,
            _ => Duration::ZERO,
        }
    }

    /// Drives the controller until the session terminates, then yields the
    /// terminal outcome.
    pub async fn run(mut self) -> Option<SessionOutcome> {
        debug!(session = %self.session.id, "recovery controller loop started");

        while let Some(msg) = self.receiver.recv().await {
            match msg {
                ControllerMsg::Engine(event) => self.on_engine_event(event).await,
                ControllerMsg::RetryFire { generation } => self.on_retry_fire(generation).await,
                ControllerMsg::Stop { respond_to } => {
                    self.stop().await;
                    let _ = respond_to.send(());
                }
            }
            if self.phase == Phase::Terminated {
                break;
            }
        }

        debug!(session = %self.session.id, "recovery controller loop terminated");
        self.outcome
    }

    /// Sole mutation entry point. Only ever invoked from the serial queue.
    pub async fn on_engine_event(&mut self, event: EngineEvent) {
        if self.phase == Phase::Terminated {
            return;
        }
        match event {
            EngineEvent::Position(snapshot) => self.on_position(snapshot),
            EngineEvent::State(state) => self.on_state(state).await,
            EngineEvent::Error(error) => self.handle_error(error).await,
        }
    }

    fn on_position(&mut self, snapshot: PlaybackSnapshot) {
        if !snapshot.duration.is_zero() {
            self.session.last_known_duration = Some(snapshot.duration);
        }
        self.last_snapshot = snapshot;

        if self.phase != Phase::Playing {
            return;
        }
        if self.tracker.should_save(snapshot.position, snapshot.duration) {
            self.tracker.mark_saved();
            let store = self.store.clone();
            let key = self.session.resume_key().to_string();
            let position_ms = snapshot.position.as_millis() as i64;
            tokio::spawn(async move {
                if let Err(e) = store.set(&key, position_ms).await {
                    warn!("periodic resume save failed: {e:#}");
                }
            });
        }
    }

    async fn on_state(&mut self, state: EngineState) {
        if state != EngineState::Ended {
            return;
        }
        let snapshot = self.last_snapshot;
        // A terminal signal is only trusted when playback is actually at
        // the end; buffering stalls can emit spurious ones.
        if !snapshot.duration.is_zero()
            && snapshot.remaining() <= self.config.recovery.end_epsilon()
        {
            self.enter_completing().await;
        } else {
            debug!(
                position_ms = snapshot.position.as_millis() as u64,
                duration_ms = snapshot.duration.as_millis() as u64,
                "ignoring terminal signal away from the end"
            );
        }
    }

    async fn handle_error(&mut self, error: EngineError) {
        if self.guard.is_handled() {
            debug!("engine error after completion, ignoring");
            return;
        }
        self.phase = Phase::ErrorDetected;
        warn!(session = %self.session.id, "engine error: {error}");

        let snapshot = self.last_snapshot;
        let plan = classify::classify(&error, &snapshot, &mut self.retry, &self.config.recovery);
        match plan {
            Plan::TreatAsCompletion { class } => {
                info!(?class, "engine error treated as completion");
                self.enter_completing().await;
            }
            Plan::Retry { class, resume_at } => {
                self.retry.bump();
                info!(
                    ?class,
                    attempt = self.retry.attempts,
                    resume_ms = resume_at.as_millis() as u64,
                    "scheduling delayed resume"
                );
                self.schedule_retry(resume_at);
            }
            Plan::GiveUp { class } => {
                warn!(?class, "no recovery possible, ending session");
                self.terminate_quietly().await;
            }
        }
    }

    /// Supersedes any previously scheduled retry. The timer posts back into
    /// the controller queue and is re-validated on arrival.
    fn schedule_retry(&mut self, resume_at: Duration) {
        self.retry_generation += 1;
        let generation = self.retry_generation;
        self.pending_retry = Some(PendingRetry {
            generation,
            resume_at,
        });
        self.phase = Phase::Retrying;

        let delay = self.config.recovery.retry_delay();
        let tx = self.self_tx.clone();
        let cancelled = self.shutdown.child_token();
        tokio::spawn(async move {
            tokio::select! {
                _ = cancelled.cancelled() => {}
                _ = tokio::time::sleep(delay) => {
                    let _ = tx.send(ControllerMsg::RetryFire { generation });
                }
            }
        });
    }

    async fn on_retry_fire(&mut self, generation: u64) {
        // A fired timer may be stale: superseded by a newer retry, or the
        // session completed or stopped while it was in flight.
        let Some(pending) = self.pending_retry else {
            return;
        };
        if generation != self.retry_generation
            || self.phase != Phase::Retrying
            || self.guard.is_handled()
        {
            debug!(generation, "discarding stale retry");
            return;
        }
        self.pending_retry = None;

        let target = pending.resume_at;
        let resumed = match self.engine.seek(target).await {
            Ok(()) => self.engine.play().await,
            Err(e) => Err(e),
        };
        match resumed {
            Ok(()) => {
                info!(
                    resume_ms = target.as_millis() as u64,
                    "delayed resume succeeded"
                );
                self.phase = Phase::Playing;
            }
            Err(error) => {
                warn!("delayed resume failed: {error}");
                self.handle_error(error).await;
            }
        }
    }

    /// Runs the completion action. The guard makes re-entry a no-op.
    async fn enter_completing(&mut self) {
        if !self.guard.arm() {
            debug!(session = %self.session.id, "duplicate completion signal ignored");
            return;
        }
        self.phase = Phase::Completing;
        self.cancel_pending_retry();

        let snapshot = self.end_snapshot();
        match self.session.kind.clone() {
            MediaKind::Movie => {
                tokio::time::sleep(self.config.recovery.completion_grace()).await;
                // Cleared sentinel: fully watched, next session starts over.
                if let Err(e) = self.store.set(self.session.resume_key(), 0).await {
                    warn!("failed to clear resume position: {e:#}");
                }
                if let Some(notifier) = &self.notifier {
                    if let Err(e) = notifier.stopped(&snapshot).await {
                        warn!("stop notification failed: {e:#}");
                    }
                }
                self.finish(SessionOutcome::Finished(PlaybackResult::completed(
                    snapshot.duration,
                )));
            }
            MediaKind::Episode { .. } => {
                let outcome = self.advance.advance(&self.session, &snapshot).await;
                self.finish(outcome);
            }
        }
    }

    /// Terminal path for unrecoverable errors: persist where we got to and
    /// end the session without touching the engine, which is left to
    /// settle on its own.
    async fn terminate_quietly(&mut self) {
        self.cancel_pending_retry();
        self.persist_exit_position().await;
        self.finish(SessionOutcome::Ended(self.exit_result()));
    }

    /// Idempotent teardown: persists the exit position, cancels timers and
    /// the heartbeat, and releases the engine.
    pub async fn stop(&mut self) {
        if self.phase == Phase::Terminated {
            return;
        }
        info!(session = %self.session.id, "stopping playback session");
        self.cancel_pending_retry();
        self.persist_exit_position().await;

        if let Some(notifier) = &self.notifier {
            if let Err(e) = notifier.stopped(&self.last_snapshot).await {
                debug!("stop notification failed: {e:#}");
            }
        }
        if let Err(e) = self.engine.stop().await {
            debug!("engine stop failed: {e}");
        }
        self.finish(SessionOutcome::Ended(self.exit_result()));
    }

    fn finish(&mut self, outcome: SessionOutcome) {
        if self.outcome.is_none() {
            self.outcome = Some(outcome);
        }
        self.phase = Phase::Terminated;
        self.shutdown.cancel();
    }

    fn cancel_pending_retry(&mut self) {
        // Invalidates any timer message still in flight.
        self.retry_generation += 1;
        self.pending_retry = None;
    }

    async fn persist_exit_position(&self) {
        let snapshot = self.last_snapshot;
        let position_ms = if !snapshot.duration.is_zero()
            && snapshot.fraction_watched() >= self.config.playback.watched_fraction()
        {
            0
        } else {
            snapshot.position.as_millis() as i64
        };
        if let Err(e) = self.store.set(self.session.resume_key(), position_ms).await {
            warn!("failed to persist resume position: {e:#}");
        }
    }

    fn exit_result(&self) -> PlaybackResult {
        let mut result = PlaybackResult::from_snapshot(&self.last_snapshot);
        if let MediaKind::Episode {
            season, episode, ..
        } = &self.session.kind
        {
            result = result.with_episode(*season, *episode);
        }
        result
    }

    fn end_snapshot(&self) -> PlaybackSnapshot {
        let duration = self
            .session
            .last_known_duration
            .unwrap_or(self.last_snapshot.duration);
        PlaybackSnapshot::new(duration, duration, false)
    }
}

/// Cloneable handle to a running controller. Marshals engine callbacks
/// arriving from other execution contexts onto the serial queue.
#[derive(Clone)]
pub struct SessionHandle {
    sender: mpsc::UnboundedSender<ControllerMsg>,
}

impl SessionHandle {
    pub fn forward_event(&self, event: EngineEvent) {
        let _ = self.sender.send(ControllerMsg::Engine(event));
    }

    pub async fn stop(&self) -> Result<()> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(ControllerMsg::Stop { respond_to })
            .map_err(|_| anyhow::anyhow!("Recovery controller disconnected"))?;
        response
            .await
            .map_err(|_| anyhow::anyhow!("Failed to receive response from recovery controller"))
    }
}
