//! Last-resort external lookup interfaces for the advance protocol.
//!
//! Catalog and stream resolution are external services; this crate only
//! consumes them behind these traits.

use anyhow::Result;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use url::Url;

use crate::models::CatalogId;
use crate::models::identity::episode_marker;

/// Resolves a human title hint to a canonical catalog identifier.
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    async fn resolve_title(&self, title: &str) -> Result<Option<CatalogId>>;
}

/// Resolves a playable reference for a specific episode of a catalog item.
#[async_trait]
pub trait StreamResolver: Send + Sync {
    async fn next_episode_stream(
        &self,
        id: &CatalogId,
        season: u32,
        episode: u32,
    ) -> Result<Option<Url>>;
}

/// Derive a searchable title from a content reference: the decoded last
/// path segment, extension stripped, separators normalized, and anything
/// from the episode marker onwards dropped.
pub fn title_hint(content_ref: &Url) -> Option<String> {
    let segment = content_ref
        .path_segments()?
        .filter(|s| !s.is_empty())
        .last()?;
    let decoded = percent_decode_str(segment).decode_utf8_lossy();

    let stem = match decoded.rsplit_once('.') {
        Some((name, ext)) if !name.is_empty() && ext.len() <= 4 => name,
        _ => decoded.as_ref(),
    };
    let cleaned = stem.replace(['.', '_'], " ");

    let cleaned = match episode_marker(&cleaned) {
        Some(range) if range.start > 0 => cleaned[..range.start].trim().to_string(),
        _ => cleaned.trim().to_string(),
    };

    if cleaned.is_empty() { None } else { Some(cleaned) }
}
