//! Ordered, observable containers of configuration entities.
//!
//! A [`ConfigList`] owns the strong handles to its members; insertion order
//! is the canonical display and storage order. Adding an entity claims
//! ownership — if another list currently owns it, that list releases it
//! synchronously. Removing an entity destroys it: its `Deleted` event fires
//! and every outstanding reference clears before `remove` returns.
//!
//! Lists share their inner state (`Clone` is cheap), so presentation code
//! and the [`Config`](crate::Config) root can observe the same list.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{ConfigError, Result};
use crate::events::{EntityEvent, Subscription};
use crate::item::{ConfigItem, Handle};

/// Structural change notifications of a [`ConfigList`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEvent {
    /// An entity was inserted at the index.
    Added(usize),
    /// The entity at the index was removed (destroyed or claimed elsewhere).
    Removed(usize),
    /// The entity at the index changed in a display-relevant way.
    ItemChanged(usize),
}

struct Member<T: ConfigItem> {
    handle: Handle<T>,
    _watch: Subscription,
}

struct ListInner<T: ConfigItem> {
    items: Vec<Member<T>>,
    listeners: Vec<(u64, Rc<dyn Fn(&ListEvent)>)>,
    next_token: u64,
}

/// Ordered collection of entities of one family.
pub struct ConfigList<T: ConfigItem> {
    inner: Rc<RefCell<ListInner<T>>>,
    label: &'static str,
}

impl<T: ConfigItem + 'static> ConfigList<T> {
    /// Creates an empty list; `label` names it in logs and errors.
    pub fn new(label: &'static str) -> Self {
        ConfigList {
            inner: Rc::new(RefCell::new(ListInner {
                items: Vec::new(),
                listeners: Vec::new(),
                next_token: 1,
            })),
            label,
        }
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().items.is_empty()
    }

    /// Entity at the flat index. O(1).
    pub fn get(&self, index: usize) -> Option<Handle<T>> {
        self.inner.borrow().items.get(index).map(|m| Rc::clone(&m.handle))
    }

    /// Snapshot of all members in order; safe to iterate while mutating.
    pub fn items(&self) -> Vec<Handle<T>> {
        self.inner.borrow().items.iter().map(|m| Rc::clone(&m.handle)).collect()
    }

    /// Flat index of `item`, by identity.
    pub fn index_of(&self, item: &Handle<T>) -> Option<usize> {
        self.inner.borrow().items.iter().position(|m| Rc::ptr_eq(&m.handle, item))
    }

    /// Inserts `item` at `position` (append on `None`) and claims ownership;
    /// the previous owning list, if any, releases the entity synchronously.
    /// Returns the resulting index.
    pub fn add(&self, item: Handle<T>, position: Option<usize>) -> Result<usize> {
        let len = self.len();
        let index = position.unwrap_or(len);
        if index > len {
            return Err(ConfigError::validation(
                self.label,
                format!("insert position {index} out of range (len {len})"),
            ));
        }
        if self.index_of(&item).is_some() {
            return Err(ConfigError::validation(self.label, "entity is already a member"));
        }

        let hub = item.borrow().events();
        // Claim before we subscribe: exactly the previous owner reacts.
        hub.emit(&EntityEvent::Claimed);
        // A previously removed entity becomes deletable again once owned.
        hub.revive();

        let watch = {
            let weak_inner = Rc::downgrade(&self.inner);
            let weak_item = Rc::downgrade(&item);
            hub.subscribe(move |event| {
                Self::on_member_event(&weak_inner, &weak_item, event);
            })
        };

        self.inner.borrow_mut().items.insert(index, Member { handle: item, _watch: watch });
        tracing::trace!(list = self.label, index, "entity added");
        self.emit(&ListEvent::Added(index));
        Ok(index)
    }

    /// Removes and destroys the entity at `index`. Every outstanding
    /// reference to it is invalidated before this returns. The returned
    /// handle is the caller's to inspect; the entity is no longer part of
    /// the configuration.
    pub fn remove(&self, index: usize) -> Result<Handle<T>> {
        let member = {
            let mut inner = self.inner.borrow_mut();
            if index >= inner.items.len() {
                return Err(ConfigError::validation(
                    self.label,
                    format!("index {index} out of range (len {})", inner.items.len()),
                ));
            }
            inner.items.remove(index)
        };
        let hub = member.handle.borrow().events();
        drop(member._watch);
        hub.emit(&EntityEvent::Deleted);
        tracing::trace!(list = self.label, index, "entity removed");
        self.emit(&ListEvent::Removed(index));
        Ok(member.handle)
    }

    /// Removes every member, destroying each in order.
    pub fn clear(&self) {
        while !self.is_empty() {
            // Indices shift as we go; always removing 0 keeps order stable.
            let _ = self.remove(0);
        }
    }

    /// Registers a structural-change observer. Dropping the guard
    /// unregisters it.
    pub fn observe(&self, listener: impl Fn(&ListEvent) + 'static) -> ListObserver<T> {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.listeners.push((token, Rc::new(listener)));
        ListObserver { inner: Rc::downgrade(&self.inner), token }
    }

    fn emit(&self, event: &ListEvent) {
        let snapshot: Vec<_> =
            self.inner.borrow().listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
        for listener in snapshot {
            listener(event);
        }
    }

    fn on_member_event(
        weak_inner: &Weak<RefCell<ListInner<T>>>,
        weak_item: &Weak<RefCell<T>>,
        event: &EntityEvent,
    ) {
        let Some(inner) = weak_inner.upgrade() else { return };
        let position = inner
            .borrow()
            .items
            .iter()
            .position(|m| Weak::ptr_eq(&Rc::downgrade(&m.handle), weak_item));
        let Some(index) = position else { return };

        match event {
            // Another list claimed the entity: release silently, the entity
            // stays alive and references stay valid.
            EntityEvent::Claimed | EntityEvent::Deleted => {
                let listeners: Vec<_> = {
                    let mut guard = inner.borrow_mut();
                    guard.items.remove(index);
                    guard.listeners.iter().map(|(_, l)| Rc::clone(l)).collect()
                };
                for listener in listeners {
                    listener(&ListEvent::Removed(index));
                }
            }
            EntityEvent::Renamed => {
                let listeners: Vec<_> =
                    inner.borrow().listeners.iter().map(|(_, l)| Rc::clone(l)).collect();
                for listener in listeners {
                    listener(&ListEvent::ItemChanged(index));
                }
            }
        }
    }
}

/// Weak counterpart of [`ConfigList`]; breaks reference cycles when a list
/// observer needs the list itself.
pub(crate) struct WeakList<T: ConfigItem> {
    inner: Weak<RefCell<ListInner<T>>>,
    label: &'static str,
}

impl<T: ConfigItem> WeakList<T> {
    pub(crate) fn upgrade(&self) -> Option<ConfigList<T>> {
        self.inner.upgrade().map(|inner| ConfigList { inner, label: self.label })
    }
}

impl<T: ConfigItem> ConfigList<T> {
    pub(crate) fn downgrade(&self) -> WeakList<T> {
        WeakList { inner: Rc::downgrade(&self.inner), label: self.label }
    }
}

impl<T: ConfigItem> Clone for ConfigList<T> {
    fn clone(&self) -> Self {
        ConfigList { inner: Rc::clone(&self.inner), label: self.label }
    }
}

impl<T: ConfigItem> std::fmt::Debug for ConfigList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigList")
            .field("label", &self.label)
            .field("len", &self.inner.borrow().items.len())
            .finish()
    }
}

impl<T: ConfigItem> Drop for ListInner<T> {
    fn drop(&mut self) {
        // The configuration is going away; notify references of each member
        // so holders outside the dropped graph do not keep stale targets.
        for member in &self.items {
            let hub = member.handle.borrow().events();
            hub.emit(&EntityEvent::Deleted);
        }
    }
}

/// RAII guard for a list observer registration.
pub struct ListObserver<T: ConfigItem> {
    inner: Weak<RefCell<ListInner<T>>>,
    token: u64,
}

impl<T: ConfigItem> Drop for ListObserver<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().listeners.retain(|(t, _)| *t != self.token);
        }
    }
}
