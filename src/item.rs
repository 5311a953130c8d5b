//! The configuration entity base: identity, naming, and the serialization
//! contract every concrete entity implements.
//!
//! Entities live behind [`Handle`]s (`Rc<RefCell<_>>`): collections own the
//! strong handles, references hold weak ones. The [`ConfigItem`] trait is the
//! seam the reference mechanism, collections and the serialization context
//! all work against.

use std::cell::RefCell;
use std::rc::Rc;

use serde_yaml_ng::Value;

use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::events::{EntityEvent, EntityId, EventHub};

/// Shared ownership handle to a configuration entity.
pub type Handle<T> = Rc<RefCell<T>>;

/// Wraps a freshly constructed entity into a [`Handle`].
pub fn handle<T>(item: T) -> Handle<T> {
    Rc::new(RefCell::new(item))
}

/// Common header embedded by every configuration entity.
#[derive(Debug)]
pub struct Meta {
    id: EntityId,
    name: String,
    events: Rc<EventHub>,
}

impl Meta {
    /// Creates a header with a fresh identity. The name is validated by the
    /// entity constructor before it gets here.
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Meta { id: EntityId::next(), name: name.into(), events: EventHub::new() }
    }
}

/// Behavior common to every configuration entity.
pub trait ConfigItem {
    /// Prefix of this entity family's serialization id space (`ch`, `cont`,
    /// `zone`, ...). Families have independent id spaces so cross-references
    /// resolve unambiguously.
    const ID_PREFIX: &'static str;

    fn meta(&self) -> &Meta;
    fn meta_mut(&mut self) -> &mut Meta;

    /// Human-readable concrete variant name, used in type-mismatch reports.
    fn type_name(&self) -> &'static str;

    /// Overwrites all fields and reference targets from `other`, which must
    /// be the same concrete variant. Identity, event hub and collection
    /// membership are preserved; on a variant mismatch nothing changes and a
    /// type-mismatch error is reported.
    ///
    /// Does not notify; use [`ItemExt::assign`] on a handle to apply edits to
    /// a live entity with notification.
    fn copy_from(&mut self, other: &Self) -> Result<()>
    where
        Self: Sized;

    /// Produces an independent entity of the same concrete variant with a
    /// fresh identity: scalars are deep-copied and every outgoing reference
    /// is re-pointed at the *same* target as the source.
    fn duplicate(&self) -> Self
    where
        Self: Sized;

    /// Emits this entity as a map node. Reference fields serialize as the
    /// target's stable identifier, assigned by `ctx` in first-seen order, and
    /// are omitted when unset.
    fn serialize(&self, ctx: &mut Context) -> Result<Value>;

    /// Reconstructs field values from a map node. Reference ids resolve
    /// through `ctx`; an unresolvable id or a missing/malformed required
    /// field aborts with an error, never a silent default.
    fn populate(&mut self, node: &Value, ctx: &Context) -> Result<()>;

    /// Stable identity of this entity.
    fn id(&self) -> EntityId {
        self.meta().id
    }

    /// Current display name.
    fn name(&self) -> &str {
        &self.meta().name
    }

    /// The entity's lifecycle event hub.
    fn events(&self) -> Rc<EventHub> {
        Rc::clone(&self.meta().events)
    }

    /// Validates and stores a new name without notifying. Observable renames
    /// go through [`ItemExt::rename`].
    fn set_name(&mut self, name: &str) -> Result<()> {
        if name.trim().is_empty() {
            return Err(ConfigError::validation("name", "name must not be empty"));
        }
        self.meta_mut().name = name.to_string();
        Ok(())
    }
}

/// Notifying mutations on entity handles.
///
/// These release the entity borrow before dispatching events, so observers
/// are free to read the entity from their handlers.
pub trait ItemExt<T: ConfigItem> {
    /// Renames the entity and notifies every observer.
    fn rename(&self, name: &str) -> Result<()>;

    /// Applies `copy_from(other)` and notifies observers of the
    /// display-relevant change. Used to push edits made on a scratch
    /// duplicate back onto the live entity.
    fn assign(&self, other: &T) -> Result<()>;
}

impl<T: ConfigItem> ItemExt<T> for Handle<T> {
    fn rename(&self, name: &str) -> Result<()> {
        let events = {
            let mut item = self.borrow_mut();
            item.set_name(name)?;
            item.events()
        };
        events.emit(&EntityEvent::Renamed);
        Ok(())
    }

    fn assign(&self, other: &T) -> Result<()> {
        let events = {
            let mut item = self.borrow_mut();
            item.copy_from(other)?;
            item.events()
        };
        events.emit(&EntityEvent::Renamed);
        Ok(())
    }
}
