//! Content identity resolution.
//!
//! Season/episode/imdb metadata can arrive from several disjoint places:
//! explicit fields supplied by the caller, query parameters on the content
//! reference, or a release-style filename. This resolves them once, with a
//! fixed precedence (explicit fields, then query parameters, then filename
//! pattern), into a tagged kind that is never re-derived afterwards.

use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use url::Url;

use super::{MediaKind, ShowId};

static SEASON_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bs(\d{1,2})[ ._-]*e(\d{1,3})\b").unwrap());
static CROSS_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(\d{1,2})x(\d{2,3})\b").unwrap());

/// Identity fields the caller already knows, if any.
#[derive(Debug, Clone, Default)]
pub struct ExplicitIdentity {
    pub show_id: Option<ShowId>,
    pub season: Option<u32>,
    pub episode: Option<u32>,
    pub imdb_id: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ContentIdentity {
    pub kind: MediaKind,
    pub imdb_id: Option<String>,
}

/// Classify a content reference as a movie or an episode.
pub fn resolve_identity(content_ref: &Url, explicit: Option<&ExplicitIdentity>) -> ContentIdentity {
    let imdb_id = explicit
        .and_then(|e| e.imdb_id.clone())
        .or_else(|| query_param(content_ref, &["imdbId", "imdb_id", "imdb"]));

    if let Some(explicit) = explicit {
        if let (Some(season), Some(episode)) = (explicit.season, explicit.episode) {
            let show_id = explicit
                .show_id
                .clone()
                .unwrap_or_else(|| fallback_show_id(content_ref));
            return ContentIdentity {
                kind: MediaKind::Episode {
                    show_id,
                    season,
                    episode,
                },
                imdb_id,
            };
        }
    }

    let season = query_param(content_ref, &["season", "s"]).and_then(|v| v.parse().ok());
    let episode = query_param(content_ref, &["episode", "ep", "e"]).and_then(|v| v.parse().ok());
    if let (Some(season), Some(episode)) = (season, episode) {
        let show_id = query_param(content_ref, &["show", "showId", "show_id"])
            .map(ShowId::new)
            .unwrap_or_else(|| fallback_show_id(content_ref));
        return ContentIdentity {
            kind: MediaKind::Episode {
                show_id,
                season,
                episode,
            },
            imdb_id,
        };
    }

    if let Some((season, episode)) = episode_from_filename(content_ref) {
        return ContentIdentity {
            kind: MediaKind::Episode {
                show_id: fallback_show_id(content_ref),
                season,
                episode,
            },
            imdb_id,
        };
    }

    ContentIdentity {
        kind: MediaKind::Movie,
        imdb_id,
    }
}

/// Byte range of the first episode marker in `text`, if one is present.
pub(crate) fn episode_marker(text: &str) -> Option<std::ops::Range<usize>> {
    SEASON_EPISODE
        .find(text)
        .or_else(|| CROSS_EPISODE.find(text))
        .map(|m| m.range())
}

fn episode_from_filename(content_ref: &Url) -> Option<(u32, u32)> {
    let name = decoded_file_name(content_ref)?;
    let captures = SEASON_EPISODE
        .captures(&name)
        .or_else(|| CROSS_EPISODE.captures(&name))?;
    let season = captures.get(1)?.as_str().parse().ok()?;
    let episode = captures.get(2)?.as_str().parse().ok()?;
    Some((season, episode))
}

fn decoded_file_name(content_ref: &Url) -> Option<String> {
    let segment = content_ref.path_segments()?.filter(|s| !s.is_empty()).last()?;
    Some(percent_decode_str(segment).decode_utf8_lossy().into_owned())
}

fn query_param(content_ref: &Url, names: &[&str]) -> Option<String> {
    content_ref
        .query_pairs()
        .find(|(key, _)| names.iter().any(|name| key == name))
        .map(|(_, value)| value.into_owned())
}

fn fallback_show_id(content_ref: &Url) -> ShowId {
    let name = decoded_file_name(content_ref).unwrap_or_else(|| content_ref.as_str().to_string());
    let stem = name.rsplit_once('.').map(|(s, _)| s).unwrap_or(name.as_str());
    ShowId::new(stem)
}
