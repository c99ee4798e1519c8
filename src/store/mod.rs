//! Topic store: client-side authoritative state for the topic collection.
//!
//! - `state`: the snapshot type and its pure transitions
//! - `subscription`: listener registration
//! - `actions`: remote-backed actions (create, load, refresh, edit, delete)
//!
//! All mutation goes through the store's actions. Each commit builds a new [`TopicState`]
//! from the previous one, swaps it in atomically, then notifies watchers and listeners.

mod actions;
pub mod state;
pub mod subscription;

#[cfg(test)]
pub(crate) mod scripted;

pub use state::{Operation, TopicState};
pub use subscription::Subscription;

use std::sync::Arc;

use tokio::sync::watch;

use crate::config::DEFAULT_PAGE_SIZE;
use crate::model::{Topic, TopicId, TopicPatch};
use subscription::Listeners;

/// Reactive topic store over a remote gateway `G`.
///
/// Construct one per application session; independent instances share nothing. Clones are
/// handles to the same store.
pub struct TopicStore<G> {
    shared: Arc<Shared<G>>,
    page_size: u32,
}

/// State shared by every handle and by remote-backed actions still running.
pub(crate) struct Shared<G> {
    gateway: G,
    state: watch::Sender<Arc<TopicState>>,
    listeners: Listeners,
}

impl<G> Clone for TopicStore<G> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
            page_size: self.page_size,
        }
    }
}

impl<G> TopicStore<G> {
    /// Create an empty store.
    #[must_use]
    pub fn new(gateway: G) -> Self {
        Self::with_state(gateway, TopicState::default())
    }

    /// Create a store starting from `initial`.
    #[must_use]
    pub fn with_state(gateway: G, initial: TopicState) -> Self {
        let (state, _) = watch::channel(Arc::new(initial));
        Self {
            shared: Arc::new(Shared {
                gateway,
                state,
                listeners: Listeners::default(),
            }),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Page size used by [`TopicStore::load_topics`]. Zero keeps the current value.
    #[must_use]
    pub const fn with_page_size(mut self, page_size: u32) -> Self {
        if page_size > 0 {
            self.page_size = page_size;
        }
        self
    }

    /// Underlying gateway.
    #[must_use]
    pub fn gateway(&self) -> &G {
        &self.shared.gateway
    }

    // ----- Reads -----------------------------------------------------------

    /// Current snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<TopicState> {
        self.shared.snapshot()
    }

    /// Current topics, newest first.
    #[must_use]
    pub fn topics(&self) -> Vec<Topic> {
        self.snapshot().topics.clone()
    }

    /// Topic with the given id.
    #[must_use]
    pub fn topic(&self, id: &TopicId) -> Option<Topic> {
        self.snapshot().topic(id).cloned()
    }

    /// Selected topic, which may no longer be in [`TopicStore::topics`].
    #[must_use]
    pub fn selected_topic(&self) -> Option<Topic> {
        self.snapshot().selected_topic.clone()
    }

    /// Whether any remote-backed action is in flight.
    #[must_use]
    pub fn is_loading(&self) -> bool {
        self.snapshot().is_loading()
    }

    /// Whether this exact operation is in flight.
    #[must_use]
    pub fn is_pending(&self, operation: &Operation) -> bool {
        self.snapshot().is_pending(operation)
    }

    /// Message of the most recent failure.
    #[must_use]
    pub fn last_error(&self) -> Option<String> {
        self.snapshot().last_error.clone()
    }

    // ----- Subscriptions ---------------------------------------------------

    /// Register `listener`; it is called synchronously after every committed transition.
    ///
    /// The listener receives the newest snapshot at the time it is called. When commits
    /// race (another thread, or a listener that itself mutates the store), intermediate
    /// snapshots can be skipped, but the last call a listener gets always reflects the
    /// final committed state.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&TopicState) + Send + Sync + 'static,
    {
        self.shared.listeners.register(Arc::new(listener))
    }

    /// Number of registered listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.shared.listeners.len()
    }

    /// Receiver that always holds the latest snapshot, for async consumers.
    #[must_use]
    pub fn watch(&self) -> watch::Receiver<Arc<TopicState>> {
        self.shared.state.subscribe()
    }

    // ----- Local actions ---------------------------------------------------

    /// Replace the whole collection.
    pub fn set_topics(&self, topics: Vec<Topic>) {
        self.shared.commit(|state| Some(state.replaced(topics)));
    }

    /// Prepend a topic.
    pub fn add_topic(&self, topic: Topic) {
        self.shared.commit(|state| Some(state.prepended(topic)));
    }

    /// Merge `patch` into the topic with `id` and into the selection if it matches.
    ///
    /// No-op when `id` is unknown.
    pub fn update_topic(&self, id: &TopicId, patch: &TopicPatch) {
        if patch.is_empty() {
            return;
        }
        self.shared.commit(|state| state.patched(id, patch));
    }

    /// Select a topic.
    pub fn select_topic(&self, topic: Topic) {
        self.shared.commit(|state| Some(state.selected(topic)));
    }

    /// Clear the selection.
    pub fn clear_selection(&self) {
        self.shared
            .commit(|state| state.selected_topic.is_some().then(|| state.unselected()));
    }

    /// Remove a topic locally, clearing the selection if it matched.
    pub fn delete_topic_local(&self, id: &TopicId) {
        self.shared.commit(|state| state.without(id));
    }
}

impl<G> Shared<G> {
    pub(crate) fn snapshot(&self) -> Arc<TopicState> {
        Arc::clone(&self.state.borrow())
    }

    /// Apply a transition and return the committed snapshot. `None` from `transition` means
    /// "nothing changed": no commit, no notification.
    pub(crate) fn commit<F>(&self, transition: F) -> Option<Arc<TopicState>>
    where
        F: FnOnce(&TopicState) -> Option<TopicState>,
    {
        let mut committed: Option<Arc<TopicState>> = None;
        self.state.send_if_modified(|current| match transition(current) {
            Some(next) => {
                let next = Arc::new(next);
                *current = Arc::clone(&next);
                committed = Some(next);
                true
            }
            None => false,
        });

        if committed.is_some() {
            self.listeners.notify(|| self.snapshot());
        }
        committed
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::model::TopicStatus;
    use crate::model::topic::fixtures::topic;

    fn store_with(topics: Vec<Topic>) -> TopicStore<()> {
        TopicStore::with_state((), TopicState::with_topics(topics))
    }

    fn ids(store: &TopicStore<()>) -> Vec<String> {
        store
            .topics()
            .into_iter()
            .map(|t| t.id.into_string())
            .collect()
    }

    #[test]
    fn test_add_prepends() {
        let store = store_with(vec![topic("a", "A")]);
        store.add_topic(topic("b", "B"));
        assert_eq!(ids(&store), ["b", "a"]);
    }

    #[test]
    fn test_set_topics_replaces() {
        let store = store_with(vec![topic("a", "A")]);
        store.set_topics(vec![topic("x", "X"), topic("y", "Y")]);
        assert_eq!(ids(&store), ["x", "y"]);
    }

    #[test]
    fn test_update_merges_into_topics_and_selection() {
        let store = store_with(vec![topic("a", "A"), topic("b", "B")]);
        store.select_topic(topic("a", "A"));
        let before = store.snapshot();

        store.update_topic(&topic("a", "").id, &TopicPatch::new().with_title("X"));

        let after = store.snapshot();
        assert_eq!(after.topics[0].title, "X");
        assert_eq!(
            Topic {
                title: "A".to_string(),
                ..after.topics[0].clone()
            },
            before.topics[0]
        );
        assert_eq!(after.topics[1], before.topics[1]);
        assert_eq!(
            store.selected_topic().map(|t| t.title),
            Some("X".to_string())
        );
    }

    #[test]
    fn test_update_unknown_id_does_not_notify() {
        let store = store_with(vec![topic("a", "A")]);
        let calls = Arc::new(Mutex::new(0_u32));
        let seen = Arc::clone(&calls);
        let _subscription = store.subscribe(move |_| {
            *seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner) += 1;
        });

        store.update_topic(
            &topic("zz", "").id,
            &TopicPatch::new().with_status(TopicStatus::Error),
        );
        store.clear_selection();

        assert_eq!(*calls.lock().unwrap_or_else(std::sync::PoisonError::into_inner), 0);
    }

    #[test]
    fn test_delete_local_clears_matching_selection() {
        let store = store_with(vec![topic("a", "A"), topic("b", "B")]);
        store.select_topic(topic("a", "A"));

        store.delete_topic_local(&topic("b", "").id);
        assert!(store.selected_topic().is_some());

        store.delete_topic_local(&topic("a", "").id);
        assert!(store.selected_topic().is_none());
        assert!(store.topics().is_empty());
    }

    #[test]
    fn test_listeners_see_committed_snapshots() {
        let store = store_with(Vec::new());
        let titles = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&titles);
        let subscription = store.subscribe(move |state| {
            let first = state.topics.first().map(|t| t.title.clone());
            sink.lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(first);
        });

        store.add_topic(topic("a", "A"));
        store.add_topic(topic("b", "B"));
        subscription.unsubscribe();
        store.add_topic(topic("c", "C"));

        let titles = titles.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(*titles, [Some("A".to_string()), Some("B".to_string())]);
        assert_eq!(store.listener_count(), 0);
    }

    #[test]
    fn test_listener_last_call_sees_final_state_when_a_listener_commits() {
        let store = store_with(vec![topic("a", "A")]);
        let handle = store.clone();
        let _clearer = store.subscribe(move |state| {
            if state.selected_topic.is_some() {
                handle.clear_selection();
            }
        });
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        let _recorder = store.subscribe(move |state| {
            sink.lock()
                .unwrap_or_else(std::sync::PoisonError::into_inner)
                .push(state.selected_topic.is_some());
        });

        store.select_topic(topic("a", "A"));

        assert_eq!(store.selected_topic(), None);
        let seen = seen.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        assert_eq!(seen.last(), Some(&false));
    }

    #[test]
    fn test_watch_receives_latest_snapshot() {
        let store = store_with(Vec::new());
        let mut receiver = store.watch();
        assert!(!receiver.has_changed().unwrap_or(true));

        store.add_topic(topic("a", "A"));

        assert!(receiver.has_changed().unwrap_or(false));
        assert_eq!(receiver.borrow_and_update().topics.len(), 1);
    }

    #[test]
    fn test_independent_instances() {
        let first = store_with(Vec::new());
        let second = store_with(Vec::new());
        first.add_topic(topic("a", "A"));
        assert!(second.topics().is_empty());
    }
}
