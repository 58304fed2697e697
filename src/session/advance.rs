//! Episode advance protocol.
//!
//! When an episode finishes, progression to the next one is requested
//! through a tiered fallback; each tier runs only if the previous one is
//! unavailable or fails, and the first tier to produce a terminal output
//! wins — the early returns make overwriting impossible.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::catalog::{CatalogLookup, StreamResolver, title_hint};
use crate::models::{MediaKind, PlaybackResult, Session, SessionRequest, ShowId};
use crate::notify::{AdvanceNotifier, EpisodeAdvance};
use crate::player::PlaybackSnapshot;

/// Terminal output of a session. Set exactly once.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The orchestrator was told to advance; nothing else to do.
    AdvanceNotified { season: u32, episode: u32 },
    /// Structured result for a caller without a callback channel.
    Finished(PlaybackResult),
    /// A resolved next-episode session for the caller to open.
    NextSession(SessionRequest),
    /// Session ended without a next-episode signal.
    Ended(PlaybackResult),
}

pub struct AdvanceProtocol {
    notifier: Option<Arc<dyn AdvanceNotifier>>,
    expects_result: bool,
    catalog: Option<Arc<dyn CatalogLookup>>,
    streams: Option<Arc<dyn StreamResolver>>,
    grace: Duration,
}

impl AdvanceProtocol {
    pub fn new(grace: Duration) -> Self {
        Self {
            notifier: None,
            expects_result: false,
            catalog: None,
            streams: None,
            grace,
        }
    }

    /// Tier 1: a configured callback channel to the orchestrator.
    pub fn with_notifier(mut self, notifier: Arc<dyn AdvanceNotifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Tier 2: the caller expects a structured result.
    pub fn with_result_channel(mut self) -> Self {
        self.expects_result = true;
        self
    }

    /// Tier 3: external catalog and stream resolution.
    pub fn with_lookup(
        mut self,
        catalog: Arc<dyn CatalogLookup>,
        streams: Arc<dyn StreamResolver>,
    ) -> Self {
        self.catalog = Some(catalog);
        self.streams = Some(streams);
        self
    }

    /// Request progression past the just-finished episode.
    pub async fn advance(&self, session: &Session, snapshot: &PlaybackSnapshot) -> SessionOutcome {
        let MediaKind::Episode {
            show_id,
            season,
            episode,
        } = &session.kind
        else {
            return SessionOutcome::Ended(PlaybackResult::completed(snapshot.duration));
        };
        let (season, next) = (*season, episode + 1);

        // Tier 1: direct notifier callback.
        if let Some(notifier) = &self.notifier {
            let request = EpisodeAdvance {
                season,
                episode: next,
                show_id: Some(show_id.to_string()),
            };
            match notifier.next_episode(&request).await {
                Ok(()) => {
                    // Bounded pause so the orchestrator can react before
                    // the session tears down.
                    tokio::time::sleep(self.grace).await;
                    return SessionOutcome::AdvanceNotified {
                        season,
                        episode: next,
                    };
                }
                Err(e) => warn!("next-episode notification failed, falling back: {e:#}"),
            }
        }

        // Tier 2: structured result back to the caller.
        if self.expects_result {
            let result = PlaybackResult::completed(snapshot.duration).with_episode(season, next);
            return SessionOutcome::Finished(result);
        }

        // Tier 3: resolve a playable next episode via external lookup.
        if let (Some(catalog), Some(streams)) = (&self.catalog, &self.streams) {
            match resolve_next(
                catalog.as_ref(),
                streams.as_ref(),
                session,
                show_id,
                season,
                next,
            )
            .await
            {
                Ok(Some(request)) => return SessionOutcome::NextSession(request),
                Ok(None) => debug!("no next-episode stream found"),
                Err(e) => warn!("next-episode lookup failed: {e:#}"),
            }
        }

        // Tier 4: give up gracefully; manual selection is the
        // orchestrator's problem now.
        SessionOutcome::Ended(
            PlaybackResult::completed(snapshot.duration).with_episode(season, *episode),
        )
    }
}

async fn resolve_next(
    catalog: &dyn CatalogLookup,
    streams: &dyn StreamResolver,
    session: &Session,
    show_id: &ShowId,
    season: u32,
    episode: u32,
) -> anyhow::Result<Option<SessionRequest>> {
    let Some(title) = title_hint(&session.content_ref) else {
        return Ok(None);
    };
    let Some(id) = catalog.resolve_title(&title).await? else {
        return Ok(None);
    };
    let Some(url) = streams.next_episode_stream(&id, season, episode).await? else {
        return Ok(None);
    };
    Ok(Some(SessionRequest {
        content_ref: url,
        kind: MediaKind::Episode {
            show_id: show_id.clone(),
            season,
            episode,
        },
    }))
}
