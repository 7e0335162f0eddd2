//! Publish/subscribe signal for "the set of stored reports changed".
//!
//! Handed explicitly to whoever produces or consumes the signal; dropping a
//! [`Subscription`] unsubscribes it.

use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, MutexGuard, Weak};
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshEvent {
    ReportsChanged,
}

#[derive(Default)]
struct BusInner {
    next_id: u64,
    subscribers: HashMap<u64, Sender<RefreshEvent>>,
}

#[derive(Clone, Default)]
pub struct RefreshBus {
    inner: Arc<Mutex<BusInner>>,
}

impl RefreshBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> Subscription {
        let (tx, rx) = mpsc::channel();
        let mut inner = lock(&self.inner);
        let id = inner.next_id;
        inner.next_id += 1;
        inner.subscribers.insert(id, tx);
        debug!(subscriber = id, "refresh bus: subscribed");
        Subscription {
            id,
            rx,
            bus: Arc::downgrade(&self.inner),
        }
    }

    /// Deliver to every live subscriber. Returns how many received it.
    pub fn publish(&self, event: RefreshEvent) -> usize {
        let mut inner = lock(&self.inner);
        inner.subscribers.retain(|_, tx| tx.send(event).is_ok());
        debug!(?event, delivered = inner.subscribers.len(), "refresh bus: published");
        inner.subscribers.len()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        lock(&self.inner).subscribers.len()
    }
}

pub struct Subscription {
    id: u64,
    rx: Receiver<RefreshEvent>,
    bus: Weak<Mutex<BusInner>>,
}

impl Subscription {
    /// Drain pending events; true if any arrived since the last call.
    pub fn take_pending(&self) -> bool {
        self.rx.try_iter().count() > 0
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.bus.upgrade() {
            lock(&inner).subscribers.remove(&self.id);
            debug!(subscriber = self.id, "refresh bus: unsubscribed");
        }
    }
}

fn lock(inner: &Mutex<BusInner>) -> MutexGuard<'_, BusInner> {
    inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_publish_reaches_subscribers() {
        let bus = RefreshBus::new();
        let a = bus.subscribe();
        let b = bus.subscribe();
        assert_eq!(bus.publish(RefreshEvent::ReportsChanged), 2);
        assert!(a.take_pending());
        assert!(b.take_pending());
        assert!(!a.take_pending());
    }

    #[test]
    fn test_multiple_events_coalesce() {
        let bus = RefreshBus::new();
        let sub = bus.subscribe();
        bus.publish(RefreshEvent::ReportsChanged);
        bus.publish(RefreshEvent::ReportsChanged);
        assert!(sub.take_pending());
        assert!(!sub.take_pending());
    }

    #[test]
    fn test_drop_unsubscribes() {
        let bus = RefreshBus::new();
        let sub = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);
        drop(sub);
        assert_eq!(bus.subscriber_count(), 0);
        assert_eq!(bus.publish(RefreshEvent::ReportsChanged), 0);
    }

    #[test]
    fn test_clones_share_subscribers() {
        let bus = RefreshBus::new();
        let publisher = bus.clone();
        let sub = bus.subscribe();
        publisher.publish(RefreshEvent::ReportsChanged);
        assert!(sub.take_pending());
    }
}
