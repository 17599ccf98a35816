//! Version token classification.

use regex::Regex;

/// Weak test for something shaped like a semantic version (`MAJOR.MINOR.PATCH`).
/// Upstream releases are tagged this way; tokens of this shape are only ever
/// fetched, never built from source.
pub fn is_release_tag(token: &str) -> bool {
    let semver = Regex::new(r"^[0-9]+\.[0-9]+\.[0-9]+$").expect("regex for release tags");
    semver.is_match(token)
}

/// Sort release tags newest-first by numeric (major, minor, patch).
/// Tags that fail to parse numerically sort after every well-formed tag.
pub fn sort_tags_descending(tags: &mut [String]) {
    fn key(tag: &str) -> Option<(u64, u64, u64)> {
        let mut parts = tag.split('.').map(|part| part.parse::<u64>().ok());
        let major = parts.next()??;
        let minor = parts.next()??;
        let patch = parts.next()??;
        if parts.next().is_some() {
            return None;
        }
        Some((major, minor, patch))
    }
    tags.sort_by(|a, b| match (key(a), key(b)) {
        (Some(a), Some(b)) => b.cmp(&a),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.cmp(b),
    });
}
