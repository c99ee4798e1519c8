//! Identifier types for topics.
//!
//! Topic identifiers are assigned by the backend at creation time and are opaque to the
//! client: no format is assumed beyond "non-empty, bounded, no control characters".

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

/// Errors returned when parsing/validating a [`TopicId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TopicIdError {
    /// Empty (or whitespace-only) identifier.
    Empty,
    /// Exceeds the maximum accepted length.
    TooLong {
        /// Maximum allowed length.
        max: usize,
        /// Actual length received.
        got: usize,
    },
    /// Contains a control character.
    InvalidChar {
        /// The invalid character.
        ch: char,
        /// The index where it was found.
        index: usize,
    },
}

impl fmt::Display for TopicIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "topic id must not be empty"),
            Self::TooLong { max, got } => write!(f, "topic id too long: got {got}, max {max}"),
            Self::InvalidChar { ch, index } => {
                write!(f, "topic id contains invalid character {ch:?} at index {index}")
            }
        }
    }
}

impl std::error::Error for TopicIdError {}

/// Server-assigned topic identifier. Immutable once assigned.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(try_from = "String", into = "String")]
pub struct TopicId(String);

impl TopicId {
    /// Hard ceiling to prevent pathological payloads.
    pub const MAX_LEN: usize = 128;

    /// Build a validated `TopicId` (input is trimmed).
    ///
    /// # Errors
    /// Returns `TopicIdError` if the input is empty, too long, or contains control characters.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, TopicIdError> {
        let s = raw.as_ref().trim();

        if s.is_empty() {
            return Err(TopicIdError::Empty);
        }
        if s.len() > Self::MAX_LEN {
            return Err(TopicIdError::TooLong {
                max: Self::MAX_LEN,
                got: s.len(),
            });
        }
        if let Some((index, ch)) = s.chars().enumerate().find(|(_, c)| c.is_control()) {
            return Err(TopicIdError::InvalidChar { ch, index });
        }

        Ok(Self(s.to_owned()))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume into `String`.
    #[inline]
    #[must_use]
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TopicId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AsRef<str> for TopicId {
    #[inline]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl FromStr for TopicId {
    type Err = TopicIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for TopicId {
    type Error = TopicIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<TopicId> for String {
    fn from(value: TopicId) -> Self {
        value.0
    }
}
