//! Value objects for the mediation domain

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::errors::MediationError;

/// Content kind detected from a vendor page URL
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Video,
    Photo,
    Vector,
    Audio,
    /// Nothing in the URL hints at a kind
    Unknown,
}

impl MediaKind {
    /// Classify a free-form URL fragment such as `videos`, `free-photos` or `music`
    pub fn from_hint(hint: &str) -> Self {
        let hint = hint.to_ascii_lowercase();
        if hint.contains("video") || hint.contains("footage") {
            MediaKind::Video
        } else if hint.contains("vector") || hint.contains("illustration") || hint.contains("icon")
        {
            MediaKind::Vector
        } else if hint.contains("audio") || hint.contains("music") || hint.contains("sound") {
            MediaKind::Audio
        } else if hint.contains("photo") || hint.contains("image") || hint.contains("picture") {
            MediaKind::Photo
        } else {
            MediaKind::Unknown
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Video => "video",
            MediaKind::Photo => "photo",
            MediaKind::Vector => "vector",
            MediaKind::Audio => "audio",
            MediaKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Kind of bytes served by the binary proxy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryKind {
    Image,
    Video,
    Audio,
}

impl BinaryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BinaryKind::Image => "image",
            BinaryKind::Video => "video",
            BinaryKind::Audio => "audio",
        }
    }

    /// Audio and video support byte-range seeking
    pub fn supports_ranges(&self) -> bool {
        matches!(self, BinaryKind::Video | BinaryKind::Audio)
    }

    /// Content type used when the origin does not declare one
    pub fn default_content_type(&self) -> &'static str {
        match self {
            BinaryKind::Image => "image/jpeg",
            BinaryKind::Video => "video/mp4",
            BinaryKind::Audio => "audio/mpeg",
        }
    }
}

impl FromStr for BinaryKind {
    type Err = MediationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "image" => Ok(BinaryKind::Image),
            "video" => Ok(BinaryKind::Video),
            "audio" => Ok(BinaryKind::Audio),
            other => Err(MediationError::validation(format!(
                "Unsupported binary kind '{}', expected image, video or audio",
                other
            ))),
        }
    }
}

impl fmt::Display for BinaryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Dimension tallied by the aggregate statistics endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatsDimension {
    #[serde(rename = "providers")]
    Providers,
    #[serde(rename = "file-types")]
    FileTypes,
}

impl StatsDimension {
    pub fn as_str(&self) -> &'static str {
        match self {
            StatsDimension::Providers => "providers",
            StatsDimension::FileTypes => "file-types",
        }
    }
}

impl FromStr for StatsDimension {
    type Err = MediationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "providers" => Ok(StatsDimension::Providers),
            "file-types" => Ok(StatsDimension::FileTypes),
            other => Err(MediationError::validation(format!(
                "Unknown statistics dimension '{}', expected providers or file-types",
                other
            ))),
        }
    }
}

impl fmt::Display for StatsDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
