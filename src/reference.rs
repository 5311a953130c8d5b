//! Non-owning, lifecycle-aware references between configuration entities.
//!
//! An [`EntityRef`] is the "channel points at a scan list" primitive: it holds
//! a weak, type-constrained handle to its target and subscribes to the
//! target's event hub. When the target is destroyed the reference clears to
//! unset and notifies its observers *before* the destroying call returns, so
//! a dangling target is never observable. When the target is renamed the
//! reference forwards a change notification without altering its target.
//!
//! [`RefList`] is the ordered-many counterpart used by zones, scan lists,
//! group lists and roaming zones.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::error::{ConfigError, Result};
use crate::events::{EntityEvent, Subscription};
use crate::item::{ConfigItem, Handle};

/// Notifications a reference delivers to its holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefEvent {
    /// The referenced entity was destroyed; the reference is now unset.
    Invalidated,
    /// The referenced entity changed in a display-relevant way (e.g. it was
    /// renamed). The target itself is unchanged.
    TargetChanged,
}

/// Runtime variant constraint: predicate plus the variant name it expects,
/// for type-mismatch reports.
type VariantFilter<T> = (fn(&T) -> bool, &'static str);

struct RefInner<T: ConfigItem> {
    target: Option<(Weak<RefCell<T>>, Subscription)>,
    listeners: Vec<(u64, Rc<dyn Fn(RefEvent)>)>,
    next_token: u64,
}

/// A typed, non-owning reference from one configuration entity to another.
pub struct EntityRef<T: ConfigItem> {
    inner: Rc<RefCell<RefInner<T>>>,
    filter: Option<VariantFilter<T>>,
}

impl<T: ConfigItem + 'static> EntityRef<T> {
    /// Creates an unset reference accepting any entity of type `T`.
    pub fn new() -> Self {
        Self::with_filter(None)
    }

    /// Creates an unset reference accepting only targets for which `accepts`
    /// holds; `expected` names the accepted variant in error reports.
    pub fn constrained(accepts: fn(&T) -> bool, expected: &'static str) -> Self {
        Self::with_filter(Some((accepts, expected)))
    }

    fn with_filter(filter: Option<VariantFilter<T>>) -> Self {
        EntityRef {
            inner: Rc::new(RefCell::new(RefInner {
                target: None,
                listeners: Vec::new(),
                next_token: 1,
            })),
            filter,
        }
    }

    /// Points the reference at `target`, or clears it on `None`.
    ///
    /// `None` is always legal; a non-`None` target must satisfy the
    /// reference's variant constraint, otherwise a type-mismatch error is
    /// reported and the reference keeps its previous target.
    pub fn set(&self, target: Option<&Handle<T>>) -> Result<()> {
        let Some(target) = target else {
            self.inner.borrow_mut().target = None;
            return Ok(());
        };

        if let Some((accepts, expected)) = self.filter {
            let item = target.borrow();
            if !accepts(&item) {
                return Err(ConfigError::type_mismatch(expected, item.type_name()));
            }
        }

        let hub = target.borrow().events();
        let weak_inner = Rc::downgrade(&self.inner);
        let subscription = hub.subscribe(move |event| {
            let Some(inner) = weak_inner.upgrade() else { return };
            match event {
                EntityEvent::Deleted => {
                    let listeners: Vec<_> = {
                        let mut guard = inner.borrow_mut();
                        guard.target = None;
                        guard.listeners.iter().map(|(_, f)| Rc::clone(f)).collect()
                    };
                    for listener in listeners {
                        listener(RefEvent::Invalidated);
                    }
                }
                EntityEvent::Renamed => {
                    let listeners: Vec<_> =
                        inner.borrow().listeners.iter().map(|(_, f)| Rc::clone(f)).collect();
                    for listener in listeners {
                        listener(RefEvent::TargetChanged);
                    }
                }
                EntityEvent::Claimed => {}
            }
        });

        self.inner.borrow_mut().target = Some((Rc::downgrade(target), subscription));
        Ok(())
    }

    /// Returns the current target, or `None` when unset.
    pub fn get(&self) -> Option<Handle<T>> {
        self.inner.borrow().target.as_ref().and_then(|(weak, _)| weak.upgrade())
    }

    /// Whether a live target is currently set.
    pub fn is_set(&self) -> bool {
        self.get().is_some()
    }

    /// Registers an observer for invalidation and target-change
    /// notifications. Dropping the returned guard unregisters it.
    pub fn observe(&self, listener: impl Fn(RefEvent) + 'static) -> RefObserver<T> {
        let mut inner = self.inner.borrow_mut();
        let token = inner.next_token;
        inner.next_token += 1;
        inner.listeners.push((token, Rc::new(listener)));
        RefObserver { inner: Rc::downgrade(&self.inner), token }
    }

    /// Re-points this reference at the current target of `other`.
    pub fn copy_target_from(&self, other: &EntityRef<T>) -> Result<()> {
        self.set(other.get().as_ref())
    }

    /// Produces an independent reference with the same constraint, pointing
    /// at the same target (not a copy of the target). Observers are not
    /// carried over.
    pub fn clone_pointing(&self) -> Self {
        let dup = Self::with_filter(self.filter);
        if let Some(target) = self.get() {
            // The target already passed this filter when it was set.
            let _ = dup.set(Some(&target));
        }
        dup
    }
}

impl<T: ConfigItem + 'static> Default for EntityRef<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ConfigItem> std::fmt::Debug for EntityRef<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let set = self.inner.borrow().target.is_some();
        f.debug_struct("EntityRef").field("set", &set).finish()
    }
}

/// RAII guard for a reference observer registration.
pub struct RefObserver<T: ConfigItem> {
    inner: Weak<RefCell<RefInner<T>>>,
    token: u64,
}

impl<T: ConfigItem> Drop for RefObserver<T> {
    fn drop(&mut self) {
        if let Some(inner) = self.inner.upgrade() {
            inner.borrow_mut().listeners.retain(|(t, _)| *t != self.token);
        }
    }
}

/// An ordered list of references sharing one variant constraint.
///
/// Entries whose target was destroyed become unset and are pruned on the
/// next mutation; accessors skip them, so a dangling member is never
/// observable.
pub struct RefList<T: ConfigItem> {
    refs: Vec<EntityRef<T>>,
    filter: Option<VariantFilter<T>>,
}

impl<T: ConfigItem + 'static> RefList<T> {
    /// Creates an empty list accepting any entity of type `T`.
    pub fn new() -> Self {
        RefList { refs: Vec::new(), filter: None }
    }

    /// Creates an empty list accepting only matching variants.
    pub fn constrained(accepts: fn(&T) -> bool, expected: &'static str) -> Self {
        RefList { refs: Vec::new(), filter: Some((accepts, expected)) }
    }

    /// Appends a reference to `target`, rejecting duplicates and variant
    /// mismatches. Returns the entry's index.
    pub fn add(&mut self, target: &Handle<T>) -> Result<usize> {
        self.compact();
        if self.refs.iter().any(|r| r.get().is_some_and(|h| Rc::ptr_eq(&h, target))) {
            return Err(ConfigError::validation("members", "entity is already a member"));
        }
        let reference = match self.filter {
            Some((accepts, expected)) => EntityRef::constrained(accepts, expected),
            None => EntityRef::new(),
        };
        reference.set(Some(target))?;
        self.refs.push(reference);
        Ok(self.refs.len() - 1)
    }

    /// Removes the entry pointing at `target`; reports whether one existed.
    pub fn remove(&mut self, target: &Handle<T>) -> bool {
        self.compact();
        let before = self.refs.len();
        self.refs.retain(|r| !r.get().is_some_and(|h| Rc::ptr_eq(&h, target)));
        self.refs.len() != before
    }

    /// Live targets, in insertion order.
    pub fn targets(&self) -> Vec<Handle<T>> {
        self.refs.iter().filter_map(|r| r.get()).collect()
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.refs.iter().filter(|r| r.is_set()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, target: &Handle<T>) -> bool {
        self.refs.iter().any(|r| r.get().is_some_and(|h| Rc::ptr_eq(&h, target)))
    }

    /// Independent list pointing at the same targets.
    pub fn clone_pointing(&self) -> Self {
        RefList {
            refs: self.refs.iter().filter(|r| r.is_set()).map(EntityRef::clone_pointing).collect(),
            filter: self.filter,
        }
    }

    fn compact(&mut self) {
        self.refs.retain(EntityRef::is_set);
    }
}

impl<T: ConfigItem + 'static> Default for RefList<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ConfigItem> std::fmt::Debug for RefList<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RefList").field("entries", &self.refs.len()).finish()
    }
}
