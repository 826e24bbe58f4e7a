//! Observable primitives backing the record caches.
//!
//! Subscriptions are explicit guard objects: dropping a subscription removes
//! its delivery buffer, so listener lifetime is deterministic. Publishing
//! never blocks — every subscriber owns an unbounded buffer, and a slow
//! consumer only grows its own backlog. Events are not replayed to late
//! subscribers.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

struct Senders<T> {
    next_id: u64,
    entries: Vec<(u64, UnboundedSender<T>)>,
}

impl<T> Senders<T> {
    fn prune(&mut self) {
        self.entries.retain(|(_, tx)| !tx.is_closed());
    }
}

/// Fan-out event stream with one unbounded buffer per subscriber.
pub struct EventStream<T> {
    senders: Arc<Mutex<Senders<T>>>,
}

impl<T> Default for EventStream<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for EventStream<T> {
    fn clone(&self) -> Self {
        Self {
            senders: Arc::clone(&self.senders),
        }
    }
}

impl<T> EventStream<T> {
    pub fn new() -> Self {
        Self {
            senders: Arc::new(Mutex::new(Senders {
                next_id: 0,
                entries: Vec::new(),
            })),
        }
    }

    /// Register a new subscriber. The returned subscription receives every
    /// event published from this point on, in publish order.
    pub fn subscribe(&self) -> EventSubscription<T> {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut senders = self.senders.lock().expect("subscriber list poisoned");
        let id = senders.next_id;
        senders.next_id += 1;
        senders.entries.push((id, tx));
        EventSubscription {
            rx,
            id,
            senders: Arc::clone(&self.senders),
        }
    }

    /// Whether at least one subscription is currently alive.
    pub fn has_subscribers(&self) -> bool {
        let mut senders = self.senders.lock().expect("subscriber list poisoned");
        senders.prune();
        !senders.entries.is_empty()
    }
}

impl<T: Clone> EventStream<T> {
    /// Deliver `value` to every active subscriber without blocking.
    pub fn publish(&self, value: T) {
        let mut senders = self.senders.lock().expect("subscriber list poisoned");
        senders
            .entries
            .retain(|(_, tx)| tx.send(value.clone()).is_ok());
    }
}

/// Receiving half of an [`EventStream`] subscription.
///
/// Dropping the subscription unsubscribes.
pub struct EventSubscription<T> {
    rx: UnboundedReceiver<T>,
    id: u64,
    senders: Arc<Mutex<Senders<T>>>,
}

impl<T> EventSubscription<T> {
    /// Await the next event. Returns `None` once the stream is gone and the
    /// buffer is drained.
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Take the next buffered event without waiting.
    pub fn try_recv(&mut self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(value) => Some(value),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }

    /// Drain every currently-buffered event.
    pub fn drain(&mut self) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(value) = self.try_recv() {
            out.push(value);
        }
        out
    }
}

impl<T> Drop for EventSubscription<T> {
    fn drop(&mut self) {
        if let Ok(mut senders) = self.senders.lock() {
            senders.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

/// A field transition delivered to field subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldChange<T> {
    pub from: T,
    pub to: T,
}

/// A single mutable value whose writes fan out to subscribers.
///
/// Every write notifies, including writes of an unchanged value: the
/// semantics are last-write-wins, not diffing. Delivery is synchronous in
/// the sense that the event is buffered with each subscriber before `set`
/// returns.
pub struct ObservableField<T> {
    value: Mutex<T>,
    changes: EventStream<FieldChange<T>>,
}

impl<T: Clone> ObservableField<T> {
    pub fn new(value: T) -> Self {
        Self {
            value: Mutex::new(value),
            changes: EventStream::new(),
        }
    }

    /// Current value.
    pub fn get(&self) -> T {
        self.value.lock().expect("field value poisoned").clone()
    }

    /// Replace the value and notify every subscriber with `(old, new)`.
    pub fn set(&self, new: T) {
        let old = {
            let mut value = self.value.lock().expect("field value poisoned");
            std::mem::replace(&mut *value, new.clone())
        };
        self.changes.publish(FieldChange { from: old, to: new });
    }

    /// Subscribe to future transitions of this field.
    pub fn subscribe(&self) -> EventSubscription<FieldChange<T>> {
        self.changes.subscribe()
    }

    pub fn has_subscribers(&self) -> bool {
        self.changes.has_subscribers()
    }
}

impl<T: Clone + fmt::Debug> fmt::Debug for ObservableField<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ObservableField").field(&self.get()).finish()
    }
}

/// Errors raised by [`ObservableCollection`] mutations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CollectionError<K: fmt::Debug + fmt::Display> {
    #[error("an entry with key {0} already exists")]
    AlreadyExists(K),

    #[error("no entry for key {0}")]
    NotFound(K),
}

/// A keyed container broadcasting add/remove events.
///
/// Keys are unique; iteration order is unspecified. The add and remove
/// streams carry keys only and observe the same delivery rules as
/// [`EventStream`].
pub struct ObservableCollection<K, V> {
    items: Mutex<HashMap<K, V>>,
    added: EventStream<K>,
    removed: EventStream<K>,
}

impl<K, V> ObservableCollection<K, V>
where
    K: Eq + Hash + Copy + Clone + fmt::Debug + fmt::Display,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            items: Mutex::new(HashMap::new()),
            added: EventStream::new(),
            removed: EventStream::new(),
        }
    }

    /// Insert `value` under `key`, then emit an add event.
    pub fn add(&self, key: K, value: V) -> Result<(), CollectionError<K>> {
        {
            let mut items = self.items.lock().expect("collection poisoned");
            if items.contains_key(&key) {
                return Err(CollectionError::AlreadyExists(key));
            }
            items.insert(key, value);
        }
        self.added.publish(key);
        Ok(())
    }

    /// Delete the entry under `key`, then emit a remove event.
    pub fn remove(&self, key: K) -> Result<V, CollectionError<K>> {
        let value = {
            let mut items = self.items.lock().expect("collection poisoned");
            items.remove(&key).ok_or(CollectionError::NotFound(key))?
        };
        self.removed.publish(key);
        Ok(value)
    }

    pub fn get(&self, key: K) -> Result<V, CollectionError<K>> {
        let items = self.items.lock().expect("collection poisoned");
        items.get(&key).cloned().ok_or(CollectionError::NotFound(key))
    }

    pub fn contains_key(&self, key: K) -> bool {
        self.items.lock().expect("collection poisoned").contains_key(&key)
    }

    /// Snapshot of the current mapping.
    pub fn items(&self) -> HashMap<K, V> {
        self.items.lock().expect("collection poisoned").clone()
    }

    pub fn keys(&self) -> Vec<K> {
        self.items
            .lock()
            .expect("collection poisoned")
            .keys()
            .copied()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().expect("collection poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn subscribe_added(&self) -> EventSubscription<K> {
        self.added.subscribe()
    }

    pub fn subscribe_removed(&self) -> EventSubscription<K> {
        self.removed.subscribe()
    }

    /// Whether the add stream or the remove stream has a live subscriber.
    pub fn has_observers(&self) -> bool {
        self.added.has_subscribers() || self.removed.has_subscribers()
    }
}

impl<K, V> Default for ObservableCollection<K, V>
where
    K: Eq + Hash + Copy + Clone + fmt::Debug + fmt::Display,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn publish_reaches_every_subscriber_in_order() {
        let stream: EventStream<u32> = EventStream::new();
        let mut a = stream.subscribe();
        let mut b = stream.subscribe();

        stream.publish(1);
        stream.publish(2);

        assert_eq!(a.drain(), vec![1, 2]);
        assert_eq!(b.drain(), vec![1, 2]);
    }

    #[tokio::test]
    async fn late_subscriber_sees_no_replay() {
        let stream: EventStream<u32> = EventStream::new();
        stream.publish(1);

        let mut late = stream.subscribe();
        assert_eq!(late.try_recv(), None);
    }

    #[tokio::test]
    async fn dropping_subscription_unsubscribes() {
        let stream: EventStream<u32> = EventStream::new();
        let sub = stream.subscribe();
        assert!(stream.has_subscribers());

        drop(sub);
        assert!(!stream.has_subscribers());
    }

    #[tokio::test]
    async fn field_set_notifies_with_old_and_new() {
        let field = ObservableField::new(String::from("a"));
        let mut sub = field.subscribe();

        field.set(String::from("b"));

        assert_eq!(
            sub.try_recv(),
            Some(FieldChange {
                from: String::from("a"),
                to: String::from("b"),
            })
        );
        assert_eq!(field.get(), "b");
    }

    #[tokio::test]
    async fn identical_writes_still_notify() {
        let field = ObservableField::new(5u32);
        let mut sub = field.subscribe();

        field.set(5);
        field.set(5);

        assert_eq!(sub.drain().len(), 2);
    }

    #[tokio::test]
    async fn collection_add_remove_round_trip() {
        let coll: ObservableCollection<u32, String> = ObservableCollection::new();
        let mut added = coll.subscribe_added();
        let mut removed = coll.subscribe_removed();

        coll.add(7, String::from("seven")).expect("add");
        assert_eq!(added.try_recv(), Some(7));
        assert_eq!(coll.get(7).expect("get"), "seven");

        assert_eq!(
            coll.add(7, String::from("again")),
            Err(CollectionError::AlreadyExists(7))
        );

        coll.remove(7).expect("remove");
        assert_eq!(removed.try_recv(), Some(7));
        assert_eq!(coll.remove(7), Err(CollectionError::NotFound(7)));
        assert_eq!(coll.get(7), Err(CollectionError::NotFound(7)));
    }

    #[tokio::test]
    async fn collection_observer_tracking() {
        let coll: ObservableCollection<u32, u32> = ObservableCollection::new();
        assert!(!coll.has_observers());

        let added = coll.subscribe_added();
        assert!(coll.has_observers());
        drop(added);

        let removed = coll.subscribe_removed();
        assert!(coll.has_observers());
        drop(removed);

        assert!(!coll.has_observers());
    }
}
