//! Resume-key candidates.
//!
//! The same content is often referenced by subtly different URLs across
//! sessions: rotated query tokens, re-encoded characters, mirrored hosts.
//! Exact-key lookup alone therefore produces false negatives, so a lookup
//! tries a fixed ladder of derived keys.

use percent_encoding::percent_decode_str;
use sha2::{Digest, Sha256};

/// Candidate keys for `raw`, in lookup priority order: the raw key, the
/// query-stripped key, the percent-decoded key, the last path segment of
/// the decoded key, and a content hash of the raw key. Duplicates are
/// dropped without disturbing the order.
pub fn candidates(raw: &str) -> Vec<String> {
    let mut keys: Vec<String> = Vec::with_capacity(5);
    push_unique(&mut keys, raw.to_string());
    push_unique(&mut keys, strip_query(raw).to_string());

    let decoded = percent_decode_str(raw).decode_utf8_lossy().into_owned();
    push_unique(&mut keys, decoded.clone());
    if let Some(segment) = last_segment(strip_query(&decoded)) {
        push_unique(&mut keys, segment.to_string());
    }

    push_unique(&mut keys, content_hash(raw));
    keys
}

pub(crate) fn strip_query(key: &str) -> &str {
    key.split(['?', '#']).next().unwrap_or(key)
}

pub(crate) fn content_hash(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn last_segment(path: &str) -> Option<&str> {
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
}

fn push_unique(keys: &mut Vec<String>, key: String) {
    if !key.is_empty() && !keys.iter().any(|k| *k == key) {
        keys.push(key);
    }
}
