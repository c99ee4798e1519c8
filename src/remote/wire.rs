//! JSON payloads exchanged with the topic backend.
//!
//! Records use the backend's naming (`topic_id`, `name`, `use_knowledge_graph`) and are
//! translated into [`Topic`] values here, so nothing above this module sees wire names.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{TopicError, TopicResult};
use crate::model::{Topic, TopicId, TopicStatus};

/// Topic record as returned by create, get, update and list.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct TopicRecord {
    /// Server-assigned identifier.
    pub topic_id: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// Knowledge-graph mode flag (the backend column defaults to true).
    #[serde(default = "default_use_knowledge_graph")]
    pub use_knowledge_graph: bool,
    /// Creation time.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    /// Last update time.
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

const fn default_use_knowledge_graph() -> bool {
    true
}

impl TopicRecord {
    /// Translate into a domain topic.
    ///
    /// A record confirmed by the backend has finished its initial setup, so the status is
    /// `completed`. Client-owned fields (sources, attachments) start empty.
    ///
    /// # Errors
    /// Returns [`TopicError::Protocol`] if the id or name is unusable.
    pub fn into_topic(self) -> TopicResult<Topic> {
        let id = TopicId::new(&self.topic_id)
            .map_err(|e| TopicError::Protocol(format!("bad topic_id: {e}")))?;
        let title = self.name.trim();
        if title.is_empty() {
            return Err(TopicError::Protocol(format!("topic {id} has an empty name")));
        }
        let description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());

        Ok(Topic {
            id,
            title: title.to_string(),
            description,
            status: TopicStatus::Completed,
            created_at: self.created_at,
            updated_at: self.updated_at.max(self.created_at),
            uses_knowledge_graph: self.use_knowledge_graph,
            sources: Vec::new(),
            graph_data: None,
            audio_summary_ref: None,
        })
    }
}

/// Body of the create request.
#[derive(Debug, Serialize)]
pub struct CreateTopicRequest<'a> {
    /// Display name.
    pub name: &'a str,
    /// Optional description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
    /// Knowledge-graph mode flag.
    pub use_knowledge_graph: bool,
}

/// Body of the update request; absent fields are left unchanged by the backend.
#[derive(Debug, Serialize)]
pub struct UpdateTopicRequest<'a> {
    /// New display name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<&'a str>,
    /// New description.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'a str>,
}

/// Query string of the list request.
#[derive(Debug, Serialize)]
pub struct ListTopicsQuery {
    /// Page size.
    pub limit: u32,
    /// Number of records to skip.
    pub offset: u32,
}

/// Body of the list response.
#[derive(Debug, Deserialize)]
pub struct ListTopicsResponse {
    /// Page of records, in backend order.
    #[serde(default)]
    pub topics: Vec<TopicRecord>,
}

/// Pull a human-readable message out of an error body.
///
/// Understands `{"detail": "..."}`, `{"detail": [{"msg": "..."}]}`, `{"message": "..."}` and
/// `{"error": "..."}`; falls back to the raw text for non-JSON bodies.
#[must_use]
pub fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    let Ok(value) = serde_json::from_str::<Value>(trimmed) else {
        return Some(trimmed.chars().take(300).collect());
    };

    let field = ["detail", "message", "error"]
        .iter()
        .find_map(|key| value.get(key));
    match field {
        Some(Value::String(message)) => Some(message.clone()),
        Some(Value::Array(items)) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(Value::as_str))
                .collect();
            (!messages.is_empty()).then(|| messages.join("; "))
        }
        Some(other) => Some(other.to_string()),
        None => None,
    }
}

/// Timestamps in RFC 3339, or the backend's `YYYY-MM-DD HH:MM:SS[.fff]` UTC form.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

    /// Parse a backend timestamp.
    #[must_use]
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        let raw = raw.trim();
        if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
            return Some(parsed.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| naive.and_utc())
    }

    /// Deserialize any accepted timestamp format.
    ///
    /// # Errors
    /// Fails on unrecognised formats.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        parse(&raw).ok_or_else(|| D::Error::custom(format!("unrecognised timestamp: {raw}")))
    }
}
