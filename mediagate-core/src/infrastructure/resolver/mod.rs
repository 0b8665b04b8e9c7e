//! Candidate resolution
//!
//! Turns a vendor page URL into an ordered list of direct-asset URLs to
//! probe. The output is a pure function of the input URL and the resolver
//! configuration. An empty list means "unresolvable", not failure.

pub mod matrix;
pub mod rules;

use std::collections::HashSet;
use tracing::debug;
use url::Url;

use crate::config::MediaConfig;
use crate::domain::Candidate;

/// Extensions that mark a URL as already pointing at an asset
const DIRECT_ASSET_EXTENSIONS: &[&str] = &[
    "mp4", "webm", "mov", "jpg", "jpeg", "png", "gif", "webp", "svg", "mp3", "wav", "ogg", "m4a",
];

/// Deterministic page URL -> candidate list mapping
#[derive(Debug, Clone)]
pub struct CandidateResolver {
    cdn_hosts: Vec<String>,
    max_candidates: usize,
}

impl CandidateResolver {
    pub fn new(cdn_hosts: Vec<String>, max_candidates: usize) -> Self {
        Self {
            cdn_hosts,
            max_candidates: max_candidates.max(1),
        }
    }

    pub fn from_config(config: &MediaConfig) -> Self {
        Self::new(config.cdn_hosts.clone(), config.max_candidates)
    }

    /// Whether `url` already names a media file
    pub fn is_direct_asset(url: &Url) -> bool {
        url.path()
            .rsplit_once('.')
            .map(|(_, ext)| {
                let ext = ext.to_ascii_lowercase();
                DIRECT_ASSET_EXTENSIONS.contains(&ext.as_str())
            })
            .unwrap_or(false)
    }

    /// Ordered, de-duplicated candidates for `source_url`
    pub fn resolve(&self, source_url: &str) -> Vec<Candidate> {
        let Ok(url) = Url::parse(source_url) else {
            return Vec::new();
        };

        if Self::is_direct_asset(&url) {
            return vec![Candidate::new(url.as_str(), 0)];
        }

        let Some(found) = rules::extract(url.path()) else {
            debug!(url = %source_url, "No identifier found in page URL");
            return Vec::new();
        };

        let mut seen = HashSet::new();
        let candidates: Vec<Candidate> =
            matrix::expand(found.kind, &found.stem(), &self.cdn_hosts)
                .into_iter()
                .filter(|candidate| seen.insert(candidate.clone()))
                .take(self.max_candidates)
                .enumerate()
                .map(|(priority, url)| Candidate::new(url, priority))
                .collect();

        debug!(
            url = %source_url,
            rule = found.rule,
            id = %found.id,
            kind = %found.kind,
            candidates = candidates.len(),
            "Resolved page URL"
        );

        candidates
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CandidateResolver {
        CandidateResolver::new(
            vec![
                "https://static.example.com".to_string(),
                "https://cdn.example.com".to_string(),
            ],
            64,
        )
    }

    #[test]
    fn test_direct_asset_is_singleton() {
        let candidates = resolver().resolve("https://cdn.example.com/x/clip.MP4");
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].url, "https://cdn.example.com/x/clip.MP4");
        assert_eq!(candidates[0].priority, 0);
    }

    #[test]
    fn test_video_page_prefers_video_candidates() {
        let candidates =
            resolver().resolve("https://www.vendor.com/video/free-videos/ocean-waves_123456.htm");
        assert!(!candidates.is_empty());
        assert!(candidates.iter().all(|c| c.url.contains("123456")));
        assert!(candidates[0].url.ends_with(".mp4"));

        let last_video = candidates
            .iter()
            .rposition(|c| c.url.contains("/videos/"))
            .unwrap();
        let first_other = candidates
            .iter()
            .position(|c| !c.url.contains("/videos/"))
            .unwrap();
        assert!(last_video < first_other);
    }

    #[test]
    fn test_priorities_follow_order() {
        let candidates = resolver().resolve("https://www.vendor.com/free-photos/lake-98765");
        for (i, candidate) in candidates.iter().enumerate() {
            assert_eq!(candidate.priority, i);
        }
    }

    #[test]
    fn test_bounded_by_max_candidates() {
        let resolver = CandidateResolver::new(vec!["https://a.example".to_string()], 5);
        let candidates = resolver.resolve("https://www.vendor.com/free-photos/lake-98765");
        assert_eq!(candidates.len(), 5);
    }

    #[test]
    fn test_unresolvable_is_empty() {
        assert!(resolver().resolve("https://www.vendor.com/about").is_empty());
        assert!(resolver().resolve("not a url").is_empty());
    }

    #[test]
    fn test_no_hosts_means_no_candidates() {
        let resolver = CandidateResolver::new(Vec::new(), 64);
        assert!(
            resolver
                .resolve("https://www.vendor.com/free-photos/lake-98765")
                .is_empty()
        );
    }
}
