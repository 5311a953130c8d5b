//! RX group lists: the digital contacts a channel listens to.

use serde_yaml_ng::{Mapping, Value};

use crate::contact::Contact;
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::item::{ConfigItem, Meta};
use crate::node;
use crate::reference::RefList;

/// A named list of digital-contact references.
#[derive(Debug)]
pub struct GroupList {
    meta: Meta,
    contacts: RefList<Contact>,
}

impl GroupList {
    pub fn new(name: &str) -> Result<Self> {
        let mut list = Self::blank();
        list.set_name(name)?;
        Ok(list)
    }

    pub(crate) fn blank() -> Self {
        GroupList {
            meta: Meta::new("unnamed"),
            contacts: RefList::constrained(|c| c.is_digital(), "digital contact"),
        }
    }

    /// The member contact references; only digital contacts are accepted.
    pub fn contacts(&self) -> &RefList<Contact> {
        &self.contacts
    }

    pub fn contacts_mut(&mut self) -> &mut RefList<Contact> {
        &mut self.contacts
    }
}

impl ConfigItem for GroupList {
    const ID_PREFIX: &'static str = "grp";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "group list"
    }

    fn copy_from(&mut self, other: &Self) -> Result<()> {
        self.contacts = other.contacts.clone_pointing();
        self.set_name(other.name())
    }

    fn duplicate(&self) -> Self {
        GroupList { meta: Meta::new(self.name()), contacts: self.contacts.clone_pointing() }
    }

    fn serialize(&self, ctx: &mut Context) -> Result<Value> {
        let mut map = Mapping::new();
        map.insert(node::key("id"), Value::String(ctx.id_for(self)));
        map.insert(node::key("name"), Value::String(self.name().to_string()));
        let contacts: Vec<Value> = self
            .contacts
            .targets()
            .iter()
            .map(|c| Value::String(ctx.id_for(&*c.borrow())))
            .collect();
        map.insert(node::key("contacts"), Value::Sequence(contacts));
        Ok(Value::Mapping(map))
    }

    fn populate(&mut self, node: &Value, ctx: &Context) -> Result<()> {
        let map = node::as_map(node, "group list")?;
        self.set_name(node::req_str(map, "name")?)?;
        if let Some(contacts) = node::opt(map, "contacts") {
            let seq = contacts
                .as_sequence()
                .ok_or_else(|| ConfigError::parse("contacts", "expected a sequence"))?;
            for entry in seq {
                let id = entry
                    .as_str()
                    .ok_or_else(|| ConfigError::parse("contacts", "expected a contact id"))?;
                let contact =
                    ctx.contact(id).ok_or_else(|| ConfigError::unresolved("contacts", id))?;
                self.contacts.add(&contact)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::CallType;
    use crate::item::handle;

    #[test]
    fn only_digital_contacts_are_accepted() {
        let mut list = GroupList::new("Locals").unwrap();
        let digital = handle(Contact::digital("WW", CallType::GroupCall, 91, false).unwrap());
        let dtmf = handle(Contact::dtmf("Gate", "123", false).unwrap());

        assert_eq!(list.contacts_mut().add(&digital).unwrap(), 0);
        let err = list.contacts_mut().add(&dtmf).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert_eq!(list.contacts().len(), 1);
    }
}
