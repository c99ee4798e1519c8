//! Listener registration for store snapshots.

use std::sync::{Arc, Mutex, PoisonError, Weak};

use crate::store::state::TopicState;

type Listener = Arc<dyn Fn(&TopicState) + Send + Sync>;

#[derive(Default)]
struct Registry {
    next_id: u64,
    listeners: Vec<(u64, Listener)>,
}

/// Set of listeners notified after each committed transition.
#[derive(Clone, Default)]
pub(crate) struct Listeners {
    registry: Arc<Mutex<Registry>>,
}

impl Listeners {
    pub(crate) fn register(&self, listener: Listener) -> Subscription {
        let mut registry = self.registry.lock().unwrap_or_else(PoisonError::into_inner);
        registry.next_id += 1;
        let id = registry.next_id;
        registry.listeners.push((id, listener));
        Subscription {
            id,
            registry: Arc::downgrade(&self.registry),
            active: true,
        }
    }

    /// Call every listener with the snapshot `latest` returns at call time.
    ///
    /// Reading the latest snapshot per call means the last notification a listener gets is
    /// never older than the last commit, even when a listener commits or another thread
    /// commits while notification is running. Intermediate snapshots may be skipped.
    ///
    /// The registry lock is released before calling out, so a listener may read the store,
    /// subscribe or unsubscribe without deadlocking.
    pub(crate) fn notify<F>(&self, latest: F)
    where
        F: Fn() -> Arc<TopicState>,
    {
        let listeners: Vec<Listener> = self
            .registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();
        for listener in listeners {
            listener(&latest());
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.registry
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .listeners
            .len()
    }
}

/// Handle to a registered listener.
///
/// Dropping the handle unregisters the listener; call [`Subscription::detach`] to keep it
/// registered for the lifetime of the store.
#[must_use = "dropping a Subscription unregisters its listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Registry>>,
    active: bool,
}

impl Subscription {
    /// Registration id, unique per store.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.id
    }

    /// Unregister the listener now.
    pub fn unsubscribe(self) {
        drop(self);
    }

    /// Keep the listener registered after this handle is dropped.
    pub fn detach(mut self) {
        self.active = false;
    }

    fn cancel(&mut self) {
        if !self.active {
            return;
        }
        self.active = false;
        if let Some(registry) = self.registry.upgrade() {
            let mut registry = registry.lock().unwrap_or_else(PoisonError::into_inner);
            registry.listeners.retain(|(id, _)| *id != self.id);
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.cancel();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn counter(listeners: &Listeners) -> (Arc<AtomicUsize>, Subscription) {
        let calls = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&calls);
        let subscription = listeners.register(Arc::new(move |_: &TopicState| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));
        (calls, subscription)
    }

    #[test]
    fn test_notify_reaches_every_listener() {
        let listeners = Listeners::default();
        let (first, _a) = counter(&listeners);
        let (second, _b) = counter(&listeners);

        listeners.notify(Arc::<TopicState>::default);

        assert_eq!(first.load(Ordering::SeqCst), 1);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_unsubscribe_and_drop() {
        let listeners = Listeners::default();
        let (calls, subscription) = counter(&listeners);
        let (_, dropped) = counter(&listeners);
        assert_eq!(listeners.len(), 2);

        subscription.unsubscribe();
        drop(dropped);
        listeners.notify(Arc::<TopicState>::default);

        assert_eq!(calls.load(Ordering::SeqCst), 0);
        assert_eq!(listeners.len(), 0);
    }

    #[test]
    fn test_detach_keeps_listener() {
        let listeners = Listeners::default();
        let (calls, subscription) = counter(&listeners);
        subscription.detach();

        listeners.notify(Arc::<TopicState>::default);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_unsubscribe_itself_during_notify() {
        let listeners = Listeners::default();
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::default();
        let slot_in_listener = Arc::clone(&slot);
        let subscription = listeners.register(Arc::new(move |_: &TopicState| {
            slot_in_listener
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }));
        *slot.lock().unwrap_or_else(PoisonError::into_inner) = Some(subscription);

        listeners.notify(Arc::<TopicState>::default);
        assert_eq!(listeners.len(), 0);
    }
}
