//! Domain types: topics, identifiers, statuses and patches.

pub mod ids;
pub mod kinds;
pub mod topic;

pub use ids::{TopicId, TopicIdError};
pub use kinds::{KindParseError, SourceKind, TopicStatus};
pub use topic::{SourceRef, Topic, TopicPatch};
