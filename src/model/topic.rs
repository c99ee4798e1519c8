//! The topic aggregate and its partial-update patch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::ids::TopicId;
use crate::model::kinds::{SourceKind, TopicStatus};

/// Lightweight reference to a source attached to a topic.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    /// Source identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Source kind.
    pub kind: SourceKind,
}

/// A user-defined study subject and its aggregate metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Topic {
    /// Server-assigned identifier.
    pub id: TopicId,
    /// Non-empty display name.
    pub title: String,
    /// Optional free text.
    pub description: Option<String>,
    /// Client-derived presentation state.
    pub status: TopicStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp, never moves backwards.
    pub updated_at: DateTime<Utc>,
    /// Query strategy flag, fixed at creation.
    pub uses_knowledge_graph: bool,
    /// Ordered source references.
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    /// Opaque graph payload owned by the graph subsystem.
    #[serde(default)]
    pub graph_data: Option<Value>,
    /// Opaque reference owned by the audio subsystem.
    #[serde(default)]
    pub audio_summary_ref: Option<String>,
}

impl Topic {
    /// Return a copy of this topic with `patch` merged in.
    ///
    /// Only fields present in the patch change. A blank title is ignored and
    /// `updated_at` is clamped so it never moves backwards.
    #[must_use]
    pub fn merged(&self, patch: &TopicPatch) -> Self {
        let mut next = self.clone();
        if let Some(title) = patch.title.as_deref().map(str::trim).filter(|t| !t.is_empty()) {
            next.title = title.to_string();
        }
        if let Some(description) = &patch.description {
            next.description.clone_from(description);
        }
        if let Some(status) = patch.status {
            next.status = status;
        }
        if let Some(sources) = &patch.sources {
            next.sources.clone_from(sources);
        }
        if let Some(graph_data) = &patch.graph_data {
            next.graph_data.clone_from(graph_data);
        }
        if let Some(audio) = &patch.audio_summary_ref {
            next.audio_summary_ref.clone_from(audio);
        }
        if let Some(updated_at) = patch.updated_at {
            next.updated_at = next.updated_at.max(updated_at);
        }
        next
    }
}

/// Partial set of topic fields for [`Topic::merged`].
///
/// `id`, `created_at` and `uses_knowledge_graph` are fixed at creation and cannot be patched.
/// Nested options distinguish "leave as is" (`None`) from "clear" (`Some(None)`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicPatch {
    /// New title.
    pub title: Option<String>,
    /// New description.
    pub description: Option<Option<String>>,
    /// New status.
    pub status: Option<TopicStatus>,
    /// Replacement source list.
    pub sources: Option<Vec<SourceRef>>,
    /// Replacement graph payload.
    pub graph_data: Option<Option<Value>>,
    /// Replacement audio summary reference.
    pub audio_summary_ref: Option<Option<String>>,
    /// New update timestamp.
    pub updated_at: Option<DateTime<Utc>>,
}

impl TopicPatch {
    /// Create an empty patch.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fields the backend owns: title, description and update time.
    #[must_use]
    pub fn from_server(topic: &Topic) -> Self {
        Self {
            title: Some(topic.title.clone()),
            description: Some(topic.description.clone()),
            updated_at: Some(topic.updated_at),
            ..Self::default()
        }
    }

    /// Set the title.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Set or clear the description.
    #[must_use]
    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = Some(description);
        self
    }

    /// Set the status.
    #[must_use]
    pub const fn with_status(mut self, status: TopicStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Replace the source list.
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<SourceRef>) -> Self {
        self.sources = Some(sources);
        self
    }

    /// Set or clear the graph payload.
    #[must_use]
    pub fn with_graph_data(mut self, graph_data: Option<Value>) -> Self {
        self.graph_data = Some(graph_data);
        self
    }

    /// Set or clear the audio summary reference.
    #[must_use]
    pub fn with_audio_summary_ref(mut self, reference: Option<String>) -> Self {
        self.audio_summary_ref = Some(reference);
        self
    }

    /// Set the update timestamp.
    #[must_use]
    pub const fn with_updated_at(mut self, updated_at: DateTime<Utc>) -> Self {
        self.updated_at = Some(updated_at);
        self
    }

    /// Whether the patch changes nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.status.is_none()
            && self.sources.is_none()
            && self.graph_data.is_none()
            && self.audio_summary_ref.is_none()
            && self.updated_at.is_none()
    }
}


#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::fixtures::topic;
    use super::*;

    #[test]
    fn test_merge_changes_only_patched_fields() {
        let mut original = topic("t1", "Quantum");
        original.description = Some("intro".to_string());
        original.uses_knowledge_graph = true;

        let merged = original.merged(&TopicPatch::new().with_title("X"));

        assert_eq!(merged.title, "X");
        assert_eq!(
            Topic {
                title: original.title.clone(),
                ..merged
            },
            original
        );
    }

    #[test]
    fn test_merge_ignores_blank_title() {
        let original = topic("t1", "Quantum");
        let merged = original.merged(&TopicPatch::new().with_title("   "));
        assert_eq!(merged, original);
    }

    #[test]
    fn test_merge_can_clear_optional_fields() {
        let mut original = topic("t1", "Quantum");
        original.audio_summary_ref = Some("audio/1".to_string());

        let merged = original.merged(&TopicPatch::new().with_audio_summary_ref(None));
        assert_eq!(merged.audio_summary_ref, None);
    }

    #[test]
    fn test_updated_at_never_moves_backwards() {
        let original = topic("t1", "Quantum");
        let earlier = original.updated_at - Duration::hours(1);
        let later = original.updated_at + Duration::hours(1);

        let stale = original.merged(&TopicPatch::new().with_updated_at(earlier));
        assert_eq!(stale.updated_at, original.updated_at);

        let fresh = original.merged(&TopicPatch::new().with_updated_at(later));
        assert_eq!(fresh.updated_at, later);
    }

    #[test]
    fn test_patch_is_empty() {
        assert!(TopicPatch::new().is_empty());
        assert!(!TopicPatch::new().with_status(TopicStatus::Error).is_empty());
    }
}
