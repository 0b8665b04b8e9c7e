//! Identifier extraction rules
//!
//! Evaluated in order, first match wins. More specific shapes come first so
//! that a slug containing digits is never mistaken for the identifier.

use once_cell::sync::Lazy;
use regex::Regex;

use crate::domain::MediaKind;

/// What a rule pulled out of a page path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentifierMatch {
    /// Rule that produced the match, for logging
    pub rule: &'static str,
    pub id: String,
    pub slug: Option<String>,
    pub kind: MediaKind,
}

impl IdentifierMatch {
    /// File stem used when expanding candidates: `{slug}_{id}` or `{id}`
    pub fn stem(&self) -> String {
        match &self.slug {
            Some(slug) => format!("{}_{}", slug, self.id),
            None => self.id.clone(),
        }
    }
}

/// Capture group layout of one rule
#[derive(Debug, Clone, Copy)]
enum Shape {
    /// kind, slug, id
    KindSlugId,
    /// id, slug
    IdSlug,
    /// id only
    IdOnly,
}

pub struct ExtractionRule {
    pub name: &'static str,
    pattern: Regex,
    shape: Shape,
}

fn rule(name: &'static str, pattern: &str, shape: Shape) -> Option<ExtractionRule> {
    match Regex::new(pattern) {
        Ok(pattern) => Some(ExtractionRule {
            name,
            pattern,
            shape,
        }),
        Err(e) => {
            tracing::error!(rule = name, "Invalid extraction pattern: {}", e);
            None
        }
    }
}

/// The ordered rule table
pub static RULES: Lazy<Vec<ExtractionRule>> = Lazy::new(|| {
    [
        // /free-videos/sunset-beach_123456.htm
        rule(
            "free-kind/slug_id.ext",
            r"/free-([a-z-]+)/([a-z0-9-]+)_(\d+)\.[a-z0-9]+$",
            Shape::KindSlugId,
        ),
        // /free-photos/sunset-beach-123456
        rule(
            "free-kind/slug-id",
            r"/free-([a-z-]+)/([a-z0-9-]+?)-(\d+)/?$",
            Shape::KindSlugId,
        ),
        // /free-vectors/sunset-beach/123456
        rule(
            "free-kind/slug/id",
            r"/free-([a-z-]+)/([a-z0-9-]+)/(\d+)/?$",
            Shape::KindSlugId,
        ),
        // /video/123456-sunset-beach
        rule("id-slug", r"/(\d{4,})-([a-z0-9-]+)/?$", Shape::IdSlug),
        // anything ending in a long number
        rule("trailing-number", r"(\d{4,})(?:\.[a-z0-9]+)?/?$", Shape::IdOnly),
    ]
    .into_iter()
    .flatten()
    .collect()
});

/// Kind implied by the path segments, most specific hint first
pub fn kind_from_path(path: &str) -> MediaKind {
    path.split('/')
        .filter(|segment| !segment.is_empty())
        .map(MediaKind::from_hint)
        .find(|kind| *kind != MediaKind::Unknown)
        .unwrap_or(MediaKind::Unknown)
}

/// Apply the rule table to a lowercased URL path
pub fn extract(path: &str) -> Option<IdentifierMatch> {
    let path = path.to_ascii_lowercase();

    for rule in RULES.iter() {
        let Some(caps) = rule.pattern.captures(&path) else {
            continue;
        };

        let group = |i: usize| caps.get(i).map(|m| m.as_str().to_string());

        let (kind_hint, slug, id) = match rule.shape {
            Shape::KindSlugId => (group(1), group(2), group(3)),
            Shape::IdSlug => (None, group(2), group(1)),
            Shape::IdOnly => (None, None, group(1)),
        };

        let Some(id) = id else {
            continue;
        };

        let kind = kind_hint
            .map(|hint| MediaKind::from_hint(&hint))
            .filter(|kind| *kind != MediaKind::Unknown)
            .unwrap_or_else(|| kind_from_path(&path));

        return Some(IdentifierMatch {
            rule: rule.name,
            id,
            slug: slug.filter(|s| !s.is_empty()),
            kind,
        });
    }

    None
}
