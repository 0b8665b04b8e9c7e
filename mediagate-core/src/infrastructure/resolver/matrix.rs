//! Candidate expansion matrix
//!
//! An identifier is expanded across CDN host × path segment × size variant ×
//! extension. Kind-specific segments come before the generic ones, so a
//! video page tries video locations before any thumbnail guess.

use crate::domain::MediaKind;

/// Where one kind of asset tends to live
#[derive(Debug, Clone, Copy)]
pub struct KindProfile {
    pub segments: &'static [&'static str],
    pub variants: &'static [&'static str],
    pub extensions: &'static [&'static str],
}

const VIDEO: KindProfile = KindProfile {
    segments: &["videos/previews", "videos"],
    variants: &["", "-preview"],
    extensions: &["mp4", "webm"],
};

const PHOTO: KindProfile = KindProfile {
    segments: &["photos/large", "photos"],
    variants: &["-large", "", "-thumb"],
    extensions: &["jpg", "jpeg", "png", "webp"],
};

const VECTOR: KindProfile = KindProfile {
    segments: &["vectors/large", "vectors"],
    variants: &["-large", ""],
    extensions: &["jpg", "png"],
};

const AUDIO: KindProfile = KindProfile {
    segments: &["audio/previews", "audio"],
    variants: &[""],
    extensions: &["mp3", "ogg"],
};

/// Thumbnail locations shared by every kind
const GENERIC: KindProfile = KindProfile {
    segments: &["previews", "thumbnails"],
    variants: &["-large", "", "-thumb"],
    extensions: &["jpg", "png", "webp"],
};

/// Profiles to expand for `kind`, in priority order
pub fn profiles_for(kind: MediaKind) -> Vec<KindProfile> {
    match kind {
        MediaKind::Video => vec![VIDEO, GENERIC],
        MediaKind::Photo => vec![PHOTO, GENERIC],
        MediaKind::Vector => vec![VECTOR, GENERIC],
        MediaKind::Audio => vec![AUDIO, GENERIC],
        MediaKind::Unknown => vec![GENERIC],
    }
}

/// Expand `stem` into candidate URLs, unbounded and possibly with duplicates
pub fn expand(kind: MediaKind, stem: &str, hosts: &[String]) -> Vec<String> {
    let mut urls = Vec::new();
    for profile in profiles_for(kind) {
        for segment in profile.segments {
            for host in hosts {
                let host = host.trim_end_matches('/');
                for variant in profile.variants {
                    for ext in profile.extensions {
                        urls.push(format!("{}/{}/{}{}.{}", host, segment, stem, variant, ext));
                    }
                }
            }
        }
    }
    urls
}
