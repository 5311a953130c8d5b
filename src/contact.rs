//! The contact family: DTMF (analog) and DMR (digital) contacts, plus the
//! contact list with its per-subtype index views.
//!
//! Most radios keep digital and DTMF contacts in separate tables although the
//! configuration holds them in one ordered list, so [`ContactList`] maintains
//! derived "digital only" and "DTMF only" orderings — stable sub-sequences of
//! the main order, queryable by their own zero-based index and invertible.
//! The views are rebuilt synchronously inside every mutation, so they are
//! never stale and no explicit resync step exists.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};

use crate::collection::{ConfigList, ListEvent, ListObserver};
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::events::EntityId;
use crate::item::{ConfigItem, Handle, Meta};
use crate::node;

/// Digits a DTMF number may contain.
const DTMF_ALPHABET: &[char] = &[
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', '*', '#',
];

/// Call type of a digital (DMR) contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CallType {
    PrivateCall,
    GroupCall,
    AllCall,
}

/// Variant-specific contact payload.
#[derive(Debug)]
pub enum ContactDetail {
    /// An analog contact: a DTMF number over `0-9 A B C D * #`.
    Dtmf { number: String },
    /// A digital contact: a DMR id plus call type.
    Digital { call_type: CallType, number: u32 },
}

/// A codeplug contact, analog (DTMF) or digital (DMR).
#[derive(Debug)]
pub struct Contact {
    meta: Meta,
    ring: bool,
    detail: ContactDetail,
}

impl Contact {
    /// Constructs a DTMF contact. The number must be a non-empty string over
    /// the DTMF alphabet.
    pub fn dtmf(name: &str, number: &str, ring: bool) -> Result<Self> {
        let mut contact = Self::blank_dtmf();
        contact.set_name(name)?;
        contact.set_dtmf_number(number)?;
        contact.ring = ring;
        Ok(contact)
    }

    /// Constructs a digital (DMR) contact. The number must fit the 24-bit
    /// DMR id space.
    pub fn digital(name: &str, call_type: CallType, number: u32, ring: bool) -> Result<Self> {
        let mut contact = Self::blank_digital();
        contact.set_name(name)?;
        contact.set_call_type(call_type)?;
        contact.set_digital_number(number)?;
        contact.ring = ring;
        Ok(contact)
    }

    pub(crate) fn blank_dtmf() -> Self {
        Contact {
            meta: Meta::new("unnamed"),
            ring: false,
            detail: ContactDetail::Dtmf { number: "0".to_string() },
        }
    }

    pub(crate) fn blank_digital() -> Self {
        Contact {
            meta: Meta::new("unnamed"),
            ring: false,
            detail: ContactDetail::Digital { call_type: CallType::PrivateCall, number: 1 },
        }
    }

    pub fn ring(&self) -> bool {
        self.ring
    }

    pub fn set_ring(&mut self, enable: bool) {
        self.ring = enable;
    }

    pub fn detail(&self) -> &ContactDetail {
        &self.detail
    }

    pub fn is_digital(&self) -> bool {
        matches!(self.detail, ContactDetail::Digital { .. })
    }

    pub fn is_dtmf(&self) -> bool {
        matches!(self.detail, ContactDetail::Dtmf { .. })
    }

    /// The DTMF number, if this is a DTMF contact.
    pub fn dtmf_number(&self) -> Option<&str> {
        match &self.detail {
            ContactDetail::Dtmf { number } => Some(number),
            _ => None,
        }
    }

    /// Replaces the DTMF number after validating the alphabet.
    pub fn set_dtmf_number(&mut self, number: &str) -> Result<()> {
        let ContactDetail::Dtmf { number: stored } = &mut self.detail else {
            return Err(ConfigError::type_mismatch("DTMF contact", self.type_name()));
        };
        if number.is_empty() {
            return Err(ConfigError::validation("number", "DTMF number must not be empty"));
        }
        if let Some(bad) = number.chars().find(|c| !DTMF_ALPHABET.contains(c)) {
            return Err(ConfigError::validation(
                "number",
                format!("invalid DTMF digit '{bad}' in '{number}'"),
            ));
        }
        *stored = number.to_string();
        Ok(())
    }

    /// The DMR id, if this is a digital contact.
    pub fn digital_number(&self) -> Option<u32> {
        match self.detail {
            ContactDetail::Digital { number, .. } => Some(number),
            _ => None,
        }
    }

    /// Replaces the DMR id after validating the 24-bit range.
    pub fn set_digital_number(&mut self, number: u32) -> Result<()> {
        let ContactDetail::Digital { number: stored, .. } = &mut self.detail else {
            return Err(ConfigError::type_mismatch("digital contact", self.type_name()));
        };
        if number >= 1 << 24 {
            return Err(ConfigError::validation(
                "number",
                format!("DMR id {number} exceeds the 24-bit id space"),
            ));
        }
        *stored = number;
        Ok(())
    }

    pub fn call_type(&self) -> Option<CallType> {
        match self.detail {
            ContactDetail::Digital { call_type, .. } => Some(call_type),
            _ => None,
        }
    }

    pub fn set_call_type(&mut self, call_type: CallType) -> Result<()> {
        let ContactDetail::Digital { call_type: stored, .. } = &mut self.detail else {
            return Err(ConfigError::type_mismatch("digital contact", self.type_name()));
        };
        *stored = call_type;
        Ok(())
    }
}

impl ConfigItem for Contact {
    const ID_PREFIX: &'static str = "cont";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        match self.detail {
            ContactDetail::Dtmf { .. } => "DTMF contact",
            ContactDetail::Digital { .. } => "digital contact",
        }
    }

    fn copy_from(&mut self, other: &Self) -> Result<()> {
        match (&mut self.detail, &other.detail) {
            (ContactDetail::Dtmf { number }, ContactDetail::Dtmf { number: src }) => {
                *number = src.clone();
            }
            (
                ContactDetail::Digital { call_type, number },
                ContactDetail::Digital { call_type: src_type, number: src_num },
            ) => {
                *call_type = *src_type;
                *number = *src_num;
            }
            _ => return Err(ConfigError::type_mismatch(self.type_name(), other.type_name())),
        }
        self.ring = other.ring;
        self.set_name(other.name())
    }

    fn duplicate(&self) -> Self {
        Contact {
            meta: Meta::new(self.name()),
            ring: self.ring,
            detail: match &self.detail {
                ContactDetail::Dtmf { number } => ContactDetail::Dtmf { number: number.clone() },
                ContactDetail::Digital { call_type, number } => {
                    ContactDetail::Digital { call_type: *call_type, number: *number }
                }
            },
        }
    }

    fn serialize(&self, ctx: &mut Context) -> Result<Value> {
        let mut map = Mapping::new();
        map.insert(node::key("id"), Value::String(ctx.id_for(self)));
        map.insert(node::key("name"), Value::String(self.name().to_string()));
        let tag = match &self.detail {
            ContactDetail::Dtmf { number } => {
                map.insert(node::key("number"), Value::String(number.clone()));
                "dtmf"
            }
            ContactDetail::Digital { call_type, number } => {
                map.insert(node::key("type"), serde_yaml_ng::to_value(call_type)?);
                map.insert(node::key("number"), Value::Number((*number).into()));
                "dmr"
            }
        };
        map.insert(node::key("ring"), Value::Bool(self.ring));

        let mut wrapper = Mapping::new();
        wrapper.insert(node::key(tag), Value::Mapping(map));
        Ok(Value::Mapping(wrapper))
    }

    fn populate(&mut self, node: &Value, _ctx: &Context) -> Result<()> {
        let wrapper = node::as_map(node, "contact")?;
        let (tag, expected) = match self.detail {
            ContactDetail::Dtmf { .. } => ("dtmf", "DTMF contact"),
            ContactDetail::Digital { .. } => ("dmr", "digital contact"),
        };
        let body = wrapper
            .get(node::key(tag))
            .ok_or_else(|| ConfigError::type_mismatch(expected, "other contact node"))?;
        let map = node::as_map(body, "contact")?;

        self.set_name(node::req_str(map, "name")?)?;
        self.ring = node::opt_bool(map, "ring", false)?;
        match self.detail {
            ContactDetail::Dtmf { .. } => {
                self.set_dtmf_number(node::req_str(map, "number")?)?;
            }
            ContactDetail::Digital { .. } => {
                let call_type: CallType = serde_yaml_ng::from_value(node::req(map, "type")?.clone())?;
                self.set_call_type(call_type)?;
                let number = node::req_u64(map, "number")?;
                let number = u32::try_from(number).map_err(|_| {
                    ConfigError::parse("number", format!("DMR id out of range: {number}"))
                })?;
                self.set_digital_number(number)?;
            }
        }
        Ok(())
    }
}

#[derive(Default)]
struct Views {
    digital: Vec<Handle<Contact>>,
    dtmf: Vec<Handle<Contact>>,
    digital_index: HashMap<EntityId, usize>,
    dtmf_index: HashMap<EntityId, usize>,
}

/// The list of all contacts, with derived digital-only and DTMF-only views.
pub struct ContactList {
    list: ConfigList<Contact>,
    views: Rc<RefCell<Views>>,
    _view_sync: ListObserver<Contact>,
}

impl ContactList {
    pub fn new() -> Self {
        let list = ConfigList::new("contacts");
        let views = Rc::new(RefCell::new(Views::default()));

        let view_sync = {
            let weak_list = list.downgrade();
            let weak_views = Rc::downgrade(&views);
            list.observe(move |event| {
                // Subtype membership is fixed per contact, so renames cannot
                // move an entry between views.
                if matches!(event, ListEvent::ItemChanged(_)) {
                    return;
                }
                if let (Some(list), Some(views)) = (weak_list.upgrade(), weak_views.upgrade()) {
                    Self::rebuild(&list, &views);
                }
            })
        };

        ContactList { list, views, _view_sync: view_sync }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Contact at the flat index.
    pub fn get(&self, index: usize) -> Option<Handle<Contact>> {
        self.list.get(index)
    }

    /// Snapshot of all contacts in canonical order.
    pub fn items(&self) -> Vec<Handle<Contact>> {
        self.list.items()
    }

    pub fn index_of(&self, contact: &Handle<Contact>) -> Option<usize> {
        self.list.index_of(contact)
    }

    /// Inserts at `position` (append on `None`), claiming ownership.
    pub fn add(&self, contact: Handle<Contact>, position: Option<usize>) -> Result<usize> {
        self.list.add(contact, position)
    }

    /// Removes and destroys the contact at the flat index.
    pub fn remove(&self, index: usize) -> Result<Handle<Contact>> {
        self.list.remove(index)
    }

    /// Registers a structural-change observer on the flat list.
    pub fn observe(&self, listener: impl Fn(&ListEvent) + 'static) -> ListObserver<Contact> {
        self.list.observe(listener)
    }

    pub fn digital_count(&self) -> usize {
        self.views.borrow().digital.len()
    }

    pub fn dtmf_count(&self) -> usize {
        self.views.borrow().dtmf.len()
    }

    /// Digital contact at `index` within the digital-only ordering. O(1).
    pub fn digital_contact(&self, index: usize) -> Option<Handle<Contact>> {
        self.views.borrow().digital.get(index).cloned()
    }

    /// DTMF contact at `index` within the DTMF-only ordering. O(1).
    pub fn dtmf_contact(&self, index: usize) -> Option<Handle<Contact>> {
        self.views.borrow().dtmf.get(index).cloned()
    }

    /// Index of `contact` within the digital-only ordering. O(1).
    pub fn index_of_digital(&self, contact: &Handle<Contact>) -> Option<usize> {
        self.views.borrow().digital_index.get(&contact.borrow().id()).copied()
    }

    /// Index of `contact` within the DTMF-only ordering. O(1).
    pub fn index_of_dtmf(&self, contact: &Handle<Contact>) -> Option<usize> {
        self.views.borrow().dtmf_index.get(&contact.borrow().id()).copied()
    }

    /// First digital contact whose DMR id equals `number`, in insertion
    /// order. `None` when no contact matches.
    pub fn find_digital_contact(&self, number: u32) -> Option<Handle<Contact>> {
        self.views
            .borrow()
            .digital
            .iter()
            .find(|c| c.borrow().digital_number() == Some(number))
            .cloned()
    }

    pub(crate) fn inner(&self) -> &ConfigList<Contact> {
        &self.list
    }

    fn rebuild(list: &ConfigList<Contact>, views: &Rc<RefCell<Views>>) {
        let mut rebuilt = Views::default();
        for contact in list.items() {
            let (id, digital) = {
                let c = contact.borrow();
                (c.id(), c.is_digital())
            };
            if digital {
                rebuilt.digital_index.insert(id, rebuilt.digital.len());
                rebuilt.digital.push(contact);
            } else {
                rebuilt.dtmf_index.insert(id, rebuilt.dtmf.len());
                rebuilt.dtmf.push(contact);
            }
        }
        *views.borrow_mut() = rebuilt;
    }
}

impl Default for ContactList {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ContactList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContactList")
            .field("len", &self.len())
            .field("digital", &self.digital_count())
            .field("dtmf", &self.dtmf_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{ItemExt, handle};

    fn digital(name: &str, number: u32) -> Handle<Contact> {
        handle(Contact::digital(name, CallType::GroupCall, number, false).unwrap())
    }

    fn dtmf(name: &str, number: &str) -> Handle<Contact> {
        handle(Contact::dtmf(name, number, false).unwrap())
    }

    #[test]
    fn dtmf_number_alphabet() {
        let mut c = Contact::dtmf("Gate", "0123456789ABCD*#", true).unwrap();
        assert!(c.set_dtmf_number("123*#AB").is_ok());
        assert_eq!(c.dtmf_number(), Some("123*#AB"));

        // Invalid digit leaves the stored number untouched.
        let err = c.set_dtmf_number("12E3").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { field: "number", .. }));
        assert_eq!(c.dtmf_number(), Some("123*#AB"));

        assert!(c.set_dtmf_number("").is_err());
        assert!(c.set_dtmf_number("abc").is_err());
    }

    #[test]
    fn digital_number_is_24_bit() {
        let mut c = Contact::digital("WW", CallType::GroupCall, 91, false).unwrap();
        assert!(c.set_digital_number((1 << 24) - 1).is_ok());
        assert!(c.set_digital_number(1 << 24).is_err());
        assert_eq!(c.digital_number(), Some((1 << 24) - 1));
    }

    #[test]
    fn variant_specific_setters_report_mismatch() {
        let mut c = Contact::dtmf("Gate", "123", false).unwrap();
        assert!(matches!(
            c.set_digital_number(91).unwrap_err(),
            ConfigError::TypeMismatch { .. }
        ));
        assert!(matches!(
            c.set_call_type(CallType::AllCall).unwrap_err(),
            ConfigError::TypeMismatch { .. }
        ));
    }

    #[test]
    fn copy_from_requires_same_variant() {
        let mut dst = Contact::digital("A", CallType::PrivateCall, 1, false).unwrap();
        let src_dtmf = Contact::dtmf("B", "42", true).unwrap();
        let err = dst.copy_from(&src_dtmf).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        // Destination unchanged.
        assert_eq!(dst.name(), "A");
        assert_eq!(dst.digital_number(), Some(1));

        let src = Contact::digital("B", CallType::GroupCall, 2621370, true).unwrap();
        dst.copy_from(&src).unwrap();
        assert_eq!(dst.name(), "B");
        assert_eq!(dst.call_type(), Some(CallType::GroupCall));
        assert_eq!(dst.digital_number(), Some(2621370));
        assert!(dst.ring());
    }

    #[test]
    fn duplicate_gets_fresh_identity_and_same_fields() {
        let original = Contact::digital("DM0TT", CallType::PrivateCall, 2621370, true).unwrap();
        let copy = original.duplicate();
        assert_ne!(original.id(), copy.id());
        assert_eq!(copy.name(), "DM0TT");
        assert_eq!(copy.digital_number(), Some(2621370));
        assert!(copy.ring());
    }

    #[test]
    fn derived_orderings_follow_the_main_order() {
        let list = ContactList::new();
        let d1 = digital("D1", 1);
        let f1 = dtmf("F1", "11");
        let d2 = digital("D2", 2);

        list.add(Rc::clone(&d1), None).unwrap();
        list.add(Rc::clone(&f1), None).unwrap();
        list.add(Rc::clone(&d2), None).unwrap();

        assert_eq!(list.digital_count(), 2);
        assert_eq!(list.dtmf_count(), 1);
        assert!(Rc::ptr_eq(&list.digital_contact(0).unwrap(), &d1));
        assert!(Rc::ptr_eq(&list.digital_contact(1).unwrap(), &d2));
        assert!(Rc::ptr_eq(&list.dtmf_contact(0).unwrap(), &f1));
        assert_eq!(list.index_of_digital(&d2), Some(1));
        assert_eq!(list.index_of_dtmf(&f1), Some(0));

        // Removing D1 promotes D2 to digital index 0, with no resync call.
        list.remove(0).unwrap();
        assert_eq!(list.digital_count(), 1);
        assert!(Rc::ptr_eq(&list.digital_contact(0).unwrap(), &d2));
        assert_eq!(list.index_of_digital(&d2), Some(0));
        assert_eq!(list.index_of_digital(&d1), None);
    }

    #[test]
    fn insertion_at_position_keeps_views_consistent() {
        let list = ContactList::new();
        let d1 = digital("D1", 1);
        let d2 = digital("D2", 2);
        let d3 = digital("D3", 3);

        list.add(Rc::clone(&d1), None).unwrap();
        list.add(Rc::clone(&d2), None).unwrap();
        // Insert ahead of both.
        assert_eq!(list.add(Rc::clone(&d3), Some(0)).unwrap(), 0);

        assert_eq!(list.index_of_digital(&d3), Some(0));
        assert_eq!(list.index_of_digital(&d1), Some(1));
        assert_eq!(list.index_of_digital(&d2), Some(2));
    }

    #[test]
    fn find_digital_contact_first_match_wins() {
        let list = ContactList::new();
        let a = digital("A", 91);
        let b = digital("B", 91);
        list.add(Rc::clone(&a), None).unwrap();
        list.add(Rc::clone(&b), None).unwrap();

        let found = list.find_digital_contact(91).unwrap();
        assert!(Rc::ptr_eq(&found, &a));
        assert!(list.find_digital_contact(92).is_none());
    }

    #[test]
    fn ownership_transfer_releases_previous_list() {
        let a = ContactList::new();
        let b = ContactList::new();
        let c = digital("Roamer", 123);

        a.add(Rc::clone(&c), None).unwrap();
        assert_eq!(a.len(), 1);

        // Adding to B claims the contact; A releases it synchronously and
        // the contact is not destroyed.
        b.add(Rc::clone(&c), None).unwrap();
        assert_eq!(a.len(), 0);
        assert_eq!(a.digital_count(), 0);
        assert_eq!(b.len(), 1);
        assert_eq!(b.index_of_digital(&c), Some(0));
        assert!(!c.borrow().events().is_deleted());
    }

    #[test]
    fn rename_notifies_list_observers() {
        let list = ContactList::new();
        let c = digital("Before", 5);
        list.add(Rc::clone(&c), None).unwrap();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = Rc::clone(&seen);
        let _obs = list.observe(move |ev| s.borrow_mut().push(*ev));

        c.rename("After").unwrap();
        assert_eq!(seen.borrow().as_slice(), &[ListEvent::ItemChanged(0)]);
        // The observer can read the new name from within its handler; here
        // we just confirm it after dispatch.
        assert_eq!(c.borrow().name(), "After");
    }

    #[test]
    fn contact_serialize_populate_round_trip() {
        let mut ctx = Context::new();
        let original = Contact::digital("DM0TT", CallType::PrivateCall, 2621370, true).unwrap();
        let node = original.serialize(&mut ctx).unwrap();

        let mut restored = Contact::blank_digital();
        restored.populate(&node, &Context::new()).unwrap();
        assert_eq!(restored.name(), "DM0TT");
        assert_eq!(restored.call_type(), Some(CallType::PrivateCall));
        assert_eq!(restored.digital_number(), Some(2621370));
        assert!(restored.ring());

        // Populating a DTMF blank from a digital node is a type mismatch.
        let mut wrong = Contact::blank_dtmf();
        assert!(matches!(
            wrong.populate(&node, &Context::new()).unwrap_err(),
            ConfigError::TypeMismatch { .. }
        ));
    }
}
