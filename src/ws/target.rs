//! Multi-listener event target with single-slot `on*` handlers layered on top.

use super::event::{Event, EventType};
use crate::base::lock;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A registered event callback.
pub type Listener = Arc<dyn Fn(&Event) + Send + Sync>;

/// Handle returned by [`EventTarget::add_event_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

struct Registered {
    id: ListenerId,
    kind: EventType,
    listener: Listener,
}

/// The listener currently installed through an `on*` property.
struct Slot {
    id: ListenerId,
    listener: Listener,
}

/// Ordered listener lists keyed by event type.
#[derive(Default)]
pub struct EventTarget {
    next_id: AtomicU64,
    listeners: Mutex<Vec<Registered>>,
    slots: Mutex<HashMap<EventType, Slot>>,
}

impl fmt::Debug for EventTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Slots are locked before listeners everywhere else; never hold both here.
        let slots: Vec<EventType> = lock(&self.slots).keys().copied().collect();
        let listeners = lock(&self.listeners).len();
        f.debug_struct("EventTarget")
            .field("listeners", &listeners)
            .field("slots", &slots)
            .finish()
    }
}

impl EventTarget {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a listener for `kind`. Listeners run in insertion order.
    pub fn add_event_listener<F>(&self, kind: EventType, listener: F) -> ListenerId
    where
        F: Fn(&Event) + Send + Sync + 'static,
    {
        self.add_listener(kind, Arc::new(listener))
    }

    /// Append an already shared listener for `kind`.
    pub fn add_listener(&self, kind: EventType, listener: Listener) -> ListenerId {
        let id = ListenerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        lock(&self.listeners).push(Registered { id, kind, listener });
        id
    }

    /// Remove a listener. Returns false if it was not attached.
    pub fn remove_event_listener(&self, id: ListenerId) -> bool {
        let mut listeners = lock(&self.listeners);
        let before = listeners.len();
        listeners.retain(|entry| entry.id != id);
        listeners.len() != before
    }

    /// Number of listeners attached for `kind`, slot listeners included.
    pub fn listener_count(&self, kind: EventType) -> usize {
        lock(&self.listeners).iter().filter(|entry| entry.kind == kind).count()
    }

    /// Invoke every listener for the event's type.
    ///
    /// The listener list is snapshotted first, so listeners may add or remove
    /// listeners (or close the client) without affecting this dispatch.
    pub fn dispatch_event(&self, event: &Event) {
        let kind = event.event_type();
        let snapshot: Vec<Listener> = lock(&self.listeners)
            .iter()
            .filter(|entry| entry.kind == kind)
            .map(|entry| Arc::clone(&entry.listener))
            .collect();

        for listener in snapshot {
            listener(event);
        }
    }

    /// Replace the single-slot handler for `kind`.
    ///
    /// The previous slot listener is detached first; `None` only detaches.
    /// Listeners added through [`add_event_listener`](Self::add_event_listener)
    /// are never touched.
    pub fn set_slot(&self, kind: EventType, listener: Option<Listener>) {
        let mut slots = lock(&self.slots);

        if let Some(previous) = slots.remove(&kind) {
            self.remove_event_listener(previous.id);
        }

        if let Some(listener) = listener {
            let id = self.add_listener(kind, Arc::clone(&listener));
            slots.insert(kind, Slot { id, listener });
        }
    }

    /// The last listener installed through the slot for `kind`.
    pub fn slot(&self, kind: EventType) -> Option<Listener> {
        lock(&self.slots).get(&kind).map(|slot| Arc::clone(&slot.listener))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ws::message::Message;
    use std::sync::atomic::AtomicUsize;

    fn counter() -> (Arc<AtomicUsize>, Listener) {
        let count = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&count);
        let listener: Listener = Arc::new(move |_: &Event| {
            c.fetch_add(1, Ordering::SeqCst);
        });
        (count, listener)
    }

    fn message() -> Event {
        Event::with_payload(EventType::Message, Message::from("x"))
    }

    #[test]
    fn test_dispatch_in_insertion_order() {
        let target = EventTarget::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = Arc::clone(&order);
            target.add_event_listener(EventType::Message, move |_| {
                order.lock().unwrap().push(i);
            });
        }
        target.add_event_listener(EventType::Open, |_| panic!("wrong type"));

        target.dispatch_event(&message());
        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_listener() {
        let target = EventTarget::new();
        let (count, listener) = counter();
        let id = target.add_listener(EventType::Message, listener);

        assert!(target.remove_event_listener(id));
        assert!(!target.remove_event_listener(id));

        target.dispatch_event(&message());
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_slot_replaces_previous() {
        let target = EventTarget::new();
        let (first, first_listener) = counter();
        let (second, second_listener) = counter();

        target.set_slot(EventType::Message, Some(first_listener));
        target.set_slot(EventType::Message, Some(second_listener));
        assert_eq!(target.listener_count(EventType::Message), 1);

        target.dispatch_event(&message());
        assert_eq!(first.load(Ordering::SeqCst), 0);
        assert_eq!(second.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_slot_leaves_general_listeners_alone() {
        let target = EventTarget::new();
        let (general, general_listener) = counter();
        let (_, slot_listener) = counter();

        target.add_listener(EventType::Message, general_listener);
        target.set_slot(EventType::Message, Some(slot_listener));
        target.set_slot(EventType::Message, None);

        assert!(target.slot(EventType::Message).is_none());
        assert_eq!(target.listener_count(EventType::Message), 1);

        target.dispatch_event(&message());
        assert_eq!(general.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_listener_may_remove_itself_during_dispatch() {
        let target = Arc::new(EventTarget::new());
        let (count, counting) = counter();
        let id_cell: Arc<Mutex<Option<ListenerId>>> = Arc::new(Mutex::new(None));

        let t = Arc::clone(&target);
        let cell = Arc::clone(&id_cell);
        let id = target.add_event_listener(EventType::Message, move |_| {
            if let Some(id) = *cell.lock().unwrap() {
                t.remove_event_listener(id);
            }
        });
        *id_cell.lock().unwrap() = Some(id);
        target.add_listener(EventType::Message, counting);

        target.dispatch_event(&message());
        target.dispatch_event(&message());

        assert_eq!(count.load(Ordering::SeqCst), 2);
        assert_eq!(target.listener_count(EventType::Message), 1);
    }
}
