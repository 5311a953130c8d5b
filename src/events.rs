//! Entity identity and synchronous lifecycle events.
//!
//! Every configuration entity carries an [`EventHub`], the registry through
//! which non-owning observers (references, collections, presentation code)
//! learn about externally observable mutations. Dispatch is synchronous and
//! single-threaded: an event is delivered to every listener before the
//! emitting call returns.
//!
//! The listener list is snapshotted before dispatch, so handlers may
//! subscribe or unsubscribe reentrantly. Handlers must not structurally
//! mutate the collection an event originated from; defer such work instead.

use std::cell::{Cell, RefCell};
use std::rc::{Rc, Weak};
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-unique, stable identity of a configuration entity.
///
/// Identities survive renames and collection moves; a duplicated entity gets
/// a fresh one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityId(u64);

impl EntityId {
    /// Allocates the next unused identity.
    pub fn next() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(1);
        EntityId(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl std::fmt::Display for EntityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Externally observable lifecycle events of a configuration entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityEvent {
    /// The entity's display name changed. References forward this to their
    /// holders so dependent presentation can refresh.
    Renamed,
    /// Another collection took ownership of the entity. The previous owner
    /// releases its handle silently; references stay valid.
    Claimed,
    /// The entity was removed from its owning collection and is considered
    /// destroyed. Fires at most once; every outstanding reference clears
    /// before the removing call returns.
    Deleted,
}

type Listener = Rc<dyn Fn(&EntityEvent)>;

/// Per-entity observer registry with synchronous, snapshot-based dispatch.
pub struct EventHub {
    listeners: RefCell<Vec<(u64, Listener)>>,
    next_token: Cell<u64>,
    deleted: Cell<bool>,
}

impl EventHub {
    /// Creates an empty hub behind an `Rc`, the form entities embed.
    pub fn new() -> Rc<Self> {
        Rc::new(EventHub {
            listeners: RefCell::new(Vec::new()),
            next_token: Cell::new(1),
            deleted: Cell::new(false),
        })
    }

    /// Registers a listener. Dropping the returned [`Subscription`]
    /// unregisters it.
    pub fn subscribe(self: &Rc<Self>, listener: impl Fn(&EntityEvent) + 'static) -> Subscription {
        let token = self.next_token.get();
        self.next_token.set(token + 1);
        self.listeners.borrow_mut().push((token, Rc::new(listener)));
        Subscription { hub: Rc::downgrade(self), token }
    }

    /// Delivers `event` to every currently registered listener.
    ///
    /// [`EntityEvent::Deleted`] is latched: the first emission wins and later
    /// ones are ignored, so invalidation notifications fire exactly once.
    pub fn emit(&self, event: &EntityEvent) {
        if *event == EntityEvent::Deleted {
            if self.deleted.get() {
                return;
            }
            self.deleted.set(true);
        }
        // Snapshot so listeners may (un)subscribe during dispatch.
        let snapshot: Vec<Listener> =
            self.listeners.borrow().iter().map(|(_, l)| Rc::clone(l)).collect();
        tracing::trace!(?event, listeners = snapshot.len(), "dispatching entity event");
        for listener in snapshot {
            listener(event);
        }
    }

    /// Whether [`EntityEvent::Deleted`] has already been emitted.
    pub fn is_deleted(&self) -> bool {
        self.deleted.get()
    }

    /// Re-arms the `Deleted` latch. Collections call this when they take
    /// ownership of a previously removed entity.
    pub(crate) fn revive(&self) {
        self.deleted.set(false);
    }

    fn unsubscribe(&self, token: u64) {
        self.listeners.borrow_mut().retain(|(t, _)| *t != token);
    }
}

impl std::fmt::Debug for EventHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventHub")
            .field("listeners", &self.listeners.borrow().len())
            .field("deleted", &self.deleted.get())
            .finish()
    }
}

/// RAII guard for a hub registration; unsubscribes on drop.
#[derive(Debug)]
pub struct Subscription {
    hub: Weak<EventHub>,
    token: u64,
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(hub) = self.hub.upgrade() {
            hub.unsubscribe(self.token);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_ids_are_unique_and_ordered() {
        let a = EntityId::next();
        let b = EntityId::next();
        assert_ne!(a, b);
        assert!(a < b);
    }

    #[test]
    fn listeners_receive_events_until_unsubscribed() {
        let hub = EventHub::new();
        let count = Rc::new(Cell::new(0u32));

        let c = Rc::clone(&count);
        let sub = hub.subscribe(move |_| c.set(c.get() + 1));

        hub.emit(&EntityEvent::Renamed);
        hub.emit(&EntityEvent::Renamed);
        assert_eq!(count.get(), 2);

        drop(sub);
        hub.emit(&EntityEvent::Renamed);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn deleted_is_latched_to_a_single_emission() {
        let hub = EventHub::new();
        let count = Rc::new(Cell::new(0u32));

        let c = Rc::clone(&count);
        let _sub = hub.subscribe(move |ev| {
            if *ev == EntityEvent::Deleted {
                c.set(c.get() + 1);
            }
        });

        hub.emit(&EntityEvent::Deleted);
        hub.emit(&EntityEvent::Deleted);
        assert_eq!(count.get(), 1);
        assert!(hub.is_deleted());
    }

    #[test]
    fn unsubscribing_during_dispatch_is_safe() {
        let hub = EventHub::new();
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));
        let fired = Rc::new(Cell::new(0u32));

        let s = Rc::clone(&slot);
        let f = Rc::clone(&fired);
        let sub = hub.subscribe(move |_| {
            f.set(f.get() + 1);
            // Drop our own subscription from within the handler.
            s.borrow_mut().take();
        });
        *slot.borrow_mut() = Some(sub);

        hub.emit(&EntityEvent::Renamed);
        hub.emit(&EntityEvent::Renamed);
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn subscribing_during_dispatch_takes_effect_next_emission() {
        let hub = EventHub::new();
        let fired = Rc::new(Cell::new(0u32));
        let keep: Rc<RefCell<Vec<Subscription>>> = Rc::new(RefCell::new(Vec::new()));

        let inner_hub = Rc::clone(&hub);
        let f = Rc::clone(&fired);
        let k = Rc::clone(&keep);
        let _sub = hub.subscribe(move |_| {
            let f2 = Rc::clone(&f);
            let sub = inner_hub.subscribe(move |_| f2.set(f2.get() + 100));
            k.borrow_mut().push(sub);
        });

        hub.emit(&EntityEvent::Renamed);
        assert_eq!(fired.get(), 0);
        // Second emission reaches the listener added during the first.
        hub.emit(&EntityEvent::Claimed);
        assert_eq!(fired.get(), 100);
    }
}
