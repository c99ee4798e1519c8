//! Topic collection state and its pure transitions.
//!
//! Every transition takes the current snapshot by reference and builds the next one; nothing
//! is mutated in place, so a published snapshot never changes under a reader.

use std::fmt;

use crate::model::{Topic, TopicId, TopicPatch};

/// Remote-backed operation currently in flight.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    /// `create_topic`.
    Create,
    /// `load_topics`.
    Load,
    /// `refresh_topic` on the given id.
    Refresh(TopicId),
    /// `edit_topic` on the given id.
    Edit(TopicId),
    /// `delete_topic` on the given id.
    Delete(TopicId),
}

impl Operation {
    /// Stable name (for logs).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Load => "load",
            Self::Refresh(_) => "refresh",
            Self::Edit(_) => "edit",
            Self::Delete(_) => "delete",
        }
    }

    /// Target topic, if the operation has one.
    #[must_use]
    pub const fn target(&self) -> Option<&TopicId> {
        match self {
            Self::Create | Self::Load => None,
            Self::Refresh(id) | Self::Edit(id) | Self::Delete(id) => Some(id),
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.target() {
            Some(id) => write!(f, "{}({id})", self.name()),
            None => f.write_str(self.name()),
        }
    }
}

/// Snapshot of the client-side topic collection.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicState {
    /// Topics, newest first by insertion. Ids are unique.
    pub topics: Vec<Topic>,
    /// Selected topic (value copy). May outlive its entry in `topics`.
    pub selected_topic: Option<Topic>,
    /// Remote-backed operations in flight, in start order.
    pub in_flight: Vec<Operation>,
    /// Message of the most recent failure.
    pub last_error: Option<String>,
}

impl TopicState {
    /// Initial state holding `topics` (deduplicated by id, first occurrence wins).
    #[must_use]
    pub fn with_topics(topics: Vec<Topic>) -> Self {
        Self::default().replaced(topics)
    }

    /// Whether any remote-backed operation is outstanding.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        !self.in_flight.is_empty()
    }

    /// Whether this exact operation is outstanding.
    #[must_use]
    pub fn is_pending(&self, operation: &Operation) -> bool {
        self.in_flight.contains(operation)
    }

    /// Topic with the given id.
    #[must_use]
    pub fn topic(&self, id: &TopicId) -> Option<&Topic> {
        self.topics.iter().find(|t| &t.id == id)
    }

    /// Whether the selected topic has the given id.
    #[must_use]
    pub fn is_selected(&self, id: &TopicId) -> bool {
        self.selected_topic.as_ref().is_some_and(|t| &t.id == id)
    }

    /// Full replace of the collection.
    pub(crate) fn replaced(&self, topics: Vec<Topic>) -> Self {
        let mut unique: Vec<Topic> = Vec::with_capacity(topics.len());
        for topic in topics {
            if unique.iter().any(|t| t.id == topic.id) {
                tracing::debug!(id = %topic.id, "dropping duplicate topic");
                continue;
            }
            unique.push(topic);
        }
        Self {
            topics: unique,
            ..self.clone()
        }
    }

    /// Prepend `topic`, dropping any older entry with the same id.
    pub(crate) fn prepended(&self, topic: Topic) -> Self {
        let id = topic.id.clone();
        let mut topics = Vec::with_capacity(self.topics.len() + 1);
        topics.push(topic);
        topics.extend(self.topics.iter().filter(|t| t.id != id).cloned());
        Self {
            topics,
            ..self.clone()
        }
    }

    /// Merge `patch` into the matching entry and into the selection. `None` if neither matches.
    pub(crate) fn patched(&self, id: &TopicId, patch: &TopicPatch) -> Option<Self> {
        let in_topics = self.topic(id).is_some();
        let in_selection = self.is_selected(id);
        if !in_topics && !in_selection {
            return None;
        }

        let mut next = self.clone();
        if in_topics {
            next.topics = self
                .topics
                .iter()
                .map(|t| if &t.id == id { t.merged(patch) } else { t.clone() })
                .collect();
        }
        if in_selection {
            next.selected_topic = self.selected_topic.as_ref().map(|t| t.merged(patch));
        }
        Some(next)
    }

    /// Set the selection.
    pub(crate) fn selected(&self, topic: Topic) -> Self {
        Self {
            selected_topic: Some(topic),
            ..self.clone()
        }
    }

    /// Clear the selection.
    pub(crate) fn unselected(&self) -> Self {
        Self {
            selected_topic: None,
            ..self.clone()
        }
    }

    /// Remove `id` from the collection and the selection. `None` if neither matches.
    pub(crate) fn without(&self, id: &TopicId) -> Option<Self> {
        let in_topics = self.topic(id).is_some();
        let in_selection = self.is_selected(id);
        if !in_topics && !in_selection {
            return None;
        }

        let mut next = self.clone();
        next.topics.retain(|t| &t.id != id);
        if in_selection {
            next.selected_topic = None;
        }
        Some(next)
    }

    /// Mark `operation` as started and clear the last error.
    pub(crate) fn began(&self, operation: Operation) -> Self {
        let mut next = self.clone();
        next.in_flight.push(operation);
        next.last_error = None;
        next
    }

    /// Mark one instance of `operation` as settled.
    pub(crate) fn settled(mut self, operation: &Operation) -> Self {
        if let Some(pos) = self.in_flight.iter().position(|op| op == operation) {
            self.in_flight.remove(pos);
        }
        self
    }

    /// Settle `operation` as failed with `message`.
    pub(crate) fn failed(&self, operation: &Operation, message: String) -> Self {
        let mut next = self.clone().settled(operation);
        next.last_error = Some(message);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topic::fixtures::topic;

    fn id(raw: &str) -> TopicId {
        topic(raw, "x").id
    }

    fn ids(state: &TopicState) -> Vec<&str> {
        state.topics.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_replace_deduplicates() {
        let state = TopicState::with_topics(vec![
            topic("a", "first"),
            topic("b", "B"),
            topic("a", "second"),
        ]);
        assert_eq!(ids(&state), ["a", "b"]);
        assert_eq!(state.topics[0].title, "first");
    }

    #[test]
    fn test_prepend_keeps_ids_unique() {
        let state = TopicState::with_topics(vec![topic("a", "A"), topic("b", "B")]);
        let next = state.prepended(topic("b", "B2"));
        assert_eq!(ids(&next), ["b", "a"]);
        assert_eq!(next.topics[0].title, "B2");
        assert_eq!(ids(&state), ["a", "b"]);
    }

    #[test]
    fn test_patch_missing_id_is_noop() {
        let state = TopicState::with_topics(vec![topic("a", "A")]);
        assert!(state.patched(&id("zz"), &TopicPatch::new().with_title("X")).is_none());
    }

    #[test]
    fn test_patch_reaches_stale_selection() {
        let state = TopicState::default().selected(topic("gone", "Old"));
        let next = state.patched(&id("gone"), &TopicPatch::new().with_title("New"));
        assert_eq!(
            next.and_then(|s| s.selected_topic).map(|t| t.title),
            Some("New".to_string())
        );
    }

    #[test]
    fn test_without_clears_matching_selection_only() {
        let state = TopicState::with_topics(vec![topic("a", "A"), topic("b", "B")])
            .selected(topic("a", "A"));

        let removed_other = state.without(&id("b")).unwrap_or_default();
        assert!(removed_other.is_selected(&id("a")));

        let removed_selected = state.without(&id("a")).unwrap_or_default();
        assert_eq!(removed_selected.selected_topic, None);
        assert_eq!(ids(&removed_selected), ["b"]);
    }

    #[test]
    fn test_in_flight_tracking() {
        let state = TopicState::default()
            .began(Operation::Load)
            .began(Operation::Delete(id("a")));
        assert!(state.is_loading());
        assert!(state.is_pending(&Operation::Delete(id("a"))));

        let state = state.settled(&Operation::Load);
        assert!(state.is_loading());

        let state = state.failed(&Operation::Delete(id("a")), "boom".to_string());
        assert!(!state.is_loading());
        assert_eq!(state.last_error.as_deref(), Some("boom"));

        let state = state.began(Operation::Create);
        assert_eq!(state.last_error, None);
    }

    #[test]
    fn test_operation_display() {
        assert_eq!(Operation::Load.to_string(), "load");
        assert_eq!(Operation::Delete(id("t2")).to_string(), "delete(t2)");
    }
}
