//! Remote access layer: the only boundary between the store and the network.
//!
//! - `session`: identity collaborator (opaque bearer token)
//! - `wire`: JSON payloads and their translation to domain topics
//! - `http`: `reqwest` implementation of [`TopicGateway`]
//!
//! Nothing here retries or caches; every call is one request and one typed answer.

pub mod http;
pub mod session;
pub mod wire;

pub use http::HttpTopicGateway;
pub use session::{SessionProvider, SessionToken, SharedSession, StaticSession};

use async_trait::async_trait;

use crate::error::{TopicError, TopicResult};
use crate::model::{Topic, TopicId};

/// Validated input of a create call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewTopic {
    name: String,
    description: Option<String>,
    uses_knowledge_graph: bool,
}

impl NewTopic {
    /// Validate create input. The name and description are trimmed; an empty description
    /// is treated as absent.
    ///
    /// # Errors
    /// Returns [`TopicError::Validation`] if the name is blank.
    pub fn new(
        name: &str,
        description: Option<&str>,
        uses_knowledge_graph: bool,
    ) -> TopicResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TopicError::Validation(
                "topic name must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: name.to_string(),
            description: description
                .map(str::trim)
                .filter(|d| !d.is_empty())
                .map(str::to_string),
            uses_knowledge_graph,
        })
    }

    /// Trimmed name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Trimmed description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Knowledge-graph mode flag.
    #[must_use]
    pub const fn uses_knowledge_graph(&self) -> bool {
        self.uses_knowledge_graph
    }
}

/// Backend-owned fields that can change after creation.
///
/// The knowledge-graph flag is fixed at creation and deliberately absent.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TopicChanges {
    /// New name.
    pub name: Option<String>,
    /// New description.
    pub description: Option<String>,
}

impl TopicChanges {
    /// Empty change set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rename.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Change the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Check the change set before it is sent.
    ///
    /// # Errors
    /// Returns [`TopicError::Validation`] if nothing would change or the new name is blank.
    pub fn validate(&self) -> TopicResult<()> {
        if self.name.is_none() && self.description.is_none() {
            return Err(TopicError::Validation(
                "update must change at least one field".to_string(),
            ));
        }
        if self.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(TopicError::Validation(
                "topic name must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

/// One page of a list call.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopicPage {
    /// Topics in backend order.
    pub topics: Vec<Topic>,
    /// Whether a further page may exist (the page came back full).
    pub has_more: bool,
}

impl TopicPage {
    /// Build a page, deriving `has_more` from the requested limit.
    #[must_use]
    pub fn new(topics: Vec<Topic>, limit: u32) -> Self {
        let has_more = limit > 0 && topics.len() >= limit as usize;
        Self { topics, has_more }
    }
}

/// Typed gateway over the backend's topic endpoints.
#[async_trait]
pub trait TopicGateway: Send + Sync {
    /// Create a topic and return the authoritative record.
    async fn create_topic(&self, topic: &NewTopic) -> TopicResult<Topic>;

    /// Fetch one page of topics.
    async fn list_topics(&self, limit: u32, offset: u32) -> TopicResult<TopicPage>;

    /// Fetch a single topic.
    async fn get_topic(&self, id: &TopicId) -> TopicResult<Topic>;

    /// Apply backend-owned changes and return the updated record.
    async fn update_topic(&self, id: &TopicId, changes: &TopicChanges) -> TopicResult<Topic>;

    /// Delete a topic.
    async fn delete_topic(&self, id: &TopicId) -> TopicResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::topic::fixtures::topic;

    #[test]
    fn test_new_topic_trims() {
        let input = NewTopic::new("  Quantum  ", Some("   "), true);
        assert_eq!(input.as_ref().map(NewTopic::name), Ok("Quantum"));
        assert_eq!(input.as_ref().map(NewTopic::description), Ok(None));
    }

    #[test]
    fn test_new_topic_rejects_blank_name() {
        assert!(matches!(
            NewTopic::new(" \t", None, false),
            Err(TopicError::Validation(_))
        ));
    }

    #[test]
    fn test_changes_validation() {
        assert!(TopicChanges::new().validate().is_err());
        assert!(TopicChanges::new().with_name(" ").validate().is_err());
        assert!(TopicChanges::new().with_description("").validate().is_ok());
        assert!(TopicChanges::new().with_name("Rust").validate().is_ok());
    }

    #[test]
    fn test_page_has_more() {
        let full = TopicPage::new(vec![topic("a", "A"), topic("b", "B")], 2);
        assert!(full.has_more);

        let partial = TopicPage::new(vec![topic("a", "A")], 2);
        assert!(!partial.has_more);
    }
}
