use dashmap::DashMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::error;

use crate::types::InboxEvent;

type Listener = Arc<dyn Fn(&InboxEvent) + Send + Sync>;

/// Handle returned by [`ListenerRegistry::subscribe`]; pass it back to
/// `unsubscribe` to detach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// Fan-out bus for inbox domain events.
///
/// Delivery iterates a snapshot of the current subscribers, so a callback
/// that subscribes or unsubscribes mid-delivery cannot corrupt the in-flight
/// fan-out. A panicking subscriber is isolated and logged; the remaining
/// subscribers still receive the event.
pub struct ListenerRegistry {
    listeners: DashMap<u64, Listener>,
    next_id: AtomicU64,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self {
            listeners: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Register a callback for all inbox events.
    pub fn subscribe<F>(&self, callback: F) -> SubscriptionId
    where
        F: Fn(&InboxEvent) + Send + Sync + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.listeners.insert(id, Arc::new(callback));
        SubscriptionId(id)
    }

    /// Remove a subscription. Idempotent and safe to call during fan-out.
    pub fn unsubscribe(&self, id: SubscriptionId) {
        self.listeners.remove(&id.0);
    }

    /// Deliver an event to every current subscriber.
    pub fn publish(&self, event: &InboxEvent) {
        // Copy-before-iterate; subscription order for determinism.
        let mut snapshot: Vec<(u64, Listener)> = self
            .listeners
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();
        snapshot.sort_by_key(|(id, _)| *id);

        for (id, listener) in snapshot {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event)));
            if outcome.is_err() {
                error!(
                    subscription = id,
                    event = event.name(),
                    "notification subscriber panicked during fan-out"
                );
            }
        }
    }

    /// Number of active subscriptions.
    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }
}

impl Default for ListenerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_subscribe_and_publish() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        registry.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.publish(&InboxEvent::AllRead);
        registry.publish(&InboxEvent::AllRead);

        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_is_idempotent() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let hits_clone = hits.clone();
        let id = registry.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.unsubscribe(id);
        registry.unsubscribe(id);
        registry.publish(&InboxEvent::AllRead);

        assert_eq!(hits.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[test]
    fn test_panicking_subscriber_does_not_block_others() {
        let registry = ListenerRegistry::new();
        let hits = Arc::new(AtomicUsize::new(0));

        registry.subscribe(|_| panic!("bad subscriber"));

        let hits_clone = hits.clone();
        registry.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });

        registry.publish(&InboxEvent::AllRead);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        // Fan-out still works afterward.
        registry.publish(&InboxEvent::AllRead);
        assert_eq!(hits.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_unsubscribe_during_fanout() {
        let registry = Arc::new(ListenerRegistry::new());
        let hits = Arc::new(AtomicUsize::new(0));

        let registry_clone = registry.clone();
        let unsubscriber: Arc<std::sync::Mutex<Option<SubscriptionId>>> =
            Arc::new(std::sync::Mutex::new(None));
        let slot = unsubscriber.clone();
        let first = registry.subscribe(move |_| {
            // Detach the other subscriber mid-delivery; the snapshot still
            // carries this event to it.
            if let Some(id) = slot.lock().unwrap().take() {
                registry_clone.unsubscribe(id);
            }
        });

        let hits_clone = hits.clone();
        let second = registry.subscribe(move |_| {
            hits_clone.fetch_add(1, Ordering::SeqCst);
        });
        *unsubscriber.lock().unwrap() = Some(second);

        registry.publish(&InboxEvent::AllRead);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        registry.publish(&InboxEvent::AllRead);
        assert_eq!(hits.load(Ordering::SeqCst), 1);

        registry.unsubscribe(first);
    }
}
