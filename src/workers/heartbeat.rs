use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::notify::AdvanceNotifier;
use crate::player::MediaEngine;

/// Samples the engine once per `interval` and forwards progress to the
/// notifier while a valid (`duration > 0`) snapshot exists. Runs until the
/// token is cancelled; the controller cancels it on stop and on
/// termination. Delivery failures only log.
pub fn spawn(
    engine: Arc<dyn MediaEngine>,
    notifier: Arc<dyn AdvanceNotifier>,
    cancelled: CancellationToken,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
        loop {
            tokio::select! {
                _ = cancelled.cancelled() => break,
                _ = ticker.tick() => {
                    let Some(snapshot) = engine.snapshot().await else {
                        continue;
                    };
                    if snapshot.duration.is_zero() {
                        continue;
                    }
                    if let Err(e) = notifier.player_time(&snapshot).await {
                        debug!("heartbeat delivery failed: {e:#}");
                    }
                }
            }
        }
        trace!("heartbeat reporter stopped");
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::PlaybackSnapshot;
    use crate::test_utils::{MockEngine, RecordingNotifier, wait_until};

    #[tokio::test]
    async fn reports_while_a_valid_snapshot_exists() {
        let engine = Arc::new(MockEngine::default());
        engine.set_snapshot(PlaybackSnapshot::new(
            Duration::from_secs(10),
            Duration::from_secs(3600),
            true,
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let token = CancellationToken::new();

        let handle = spawn(
            engine,
            notifier.clone(),
            token.clone(),
            Duration::from_millis(10),
        );

        let observer = notifier.clone();
        let reported = wait_until(move || observer.time_count() >= 2, Duration::from_secs(2)).await;
        assert!(reported);

        token.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn stays_quiet_without_a_duration() {
        let engine = Arc::new(MockEngine::default());
        engine.set_snapshot(PlaybackSnapshot::new(
            Duration::from_secs(10),
            Duration::ZERO,
            true,
        ));
        let notifier = Arc::new(RecordingNotifier::default());
        let token = CancellationToken::new();

        let handle = spawn(
            engine,
            notifier.clone(),
            token.clone(),
            Duration::from_millis(10),
        );
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(notifier.time_count(), 0);
        token.cancel();
        handle.await.unwrap();
    }
}
