//! Topic status and source kinds.
//!
//! Both enums use stable lowercase identifiers for wire/storage interoperability.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Client-derived presentation state of a topic.
///
/// Not necessarily mirrored by the backend's own processing pipeline.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TopicStatus {
    /// Known locally, not yet processed.
    #[default]
    Pending,
    /// Backend work in progress.
    Processing,
    /// Ready for use.
    Completed,
    /// Processing failed.
    Error,
}

impl TopicStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Processing, Self::Completed, Self::Error];

    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Processing => "processing",
            Self::Completed => "completed",
            Self::Error => "error",
        }
    }

    /// Whether no further automatic transition is expected.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Error)
    }
}

impl fmt::Display for TopicStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown kind or status string.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct KindParseError {
    what: &'static str,
    value: String,
}

impl fmt::Display for KindParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.what, self.value)
    }
}

impl std::error::Error for KindParseError {}

impl FromStr for TopicStatus {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or(KindParseError {
                what: "topic status",
                value: s.to_string(),
            })
    }
}

/// Kind of a source attached to a topic.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// Uploaded document (PDF, text file, ...).
    Document,
    /// Scraped web page.
    Webpage,
    /// Video transcript.
    Youtube,
    /// Interpreted image.
    Image,
    /// Raw text pasted by the user.
    Text,
}

impl SourceKind {
    /// All kinds.
    pub const ALL: [Self; 5] = [
        Self::Document,
        Self::Webpage,
        Self::Youtube,
        Self::Image,
        Self::Text,
    ];

    /// Stable string representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Webpage => "webpage",
            Self::Youtube => "youtube",
            Self::Image => "image",
            Self::Text => "text",
        }
    }
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = KindParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == normalized)
            .ok_or(KindParseError {
                what: "source kind",
                value: s.to_string(),
            })
    }
}
