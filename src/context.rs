//! Identifier assignment and resolution for node-tree serialization.
//!
//! While serializing, the [`Context`] assigns each entity a stable string id
//! in first-seen order, scoped per entity family (`ch1…`, `cont1…`, `zone1…`),
//! so repeated serialization of an unmodified graph is byte-stable. While
//! populating, it is the id→entity table reference fields resolve through.

use std::collections::HashMap;

use crate::channel::Channel;
use crate::contact::Contact;
use crate::error::{ConfigError, Result};
use crate::events::EntityId;
use crate::grouplist::GroupList;
use crate::item::{ConfigItem, Handle};
use crate::positioning::PositioningSystem;
use crate::radioid::RadioId;
use crate::roaming::RoamingZone;
use crate::scanlist::ScanList;
use crate::zone::Zone;

/// Serialization id table: per-family counters plus resolution maps.
#[derive(Debug, Default)]
pub struct Context {
    counters: HashMap<&'static str, usize>,
    assigned: HashMap<EntityId, String>,

    channels: HashMap<String, Handle<Channel>>,
    contacts: HashMap<String, Handle<Contact>>,
    scan_lists: HashMap<String, Handle<ScanList>>,
    group_lists: HashMap<String, Handle<GroupList>>,
    zones: HashMap<String, Handle<Zone>>,
    roaming_zones: HashMap<String, Handle<RoamingZone>>,
    radio_ids: HashMap<String, Handle<RadioId>>,
    positioning: HashMap<String, Handle<PositioningSystem>>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the id assigned to `item`, minting the next one in its
    /// family's id space on first sight.
    pub fn id_for<T: ConfigItem>(&mut self, item: &T) -> String {
        if let Some(id) = self.assigned.get(&item.id()) {
            return id.clone();
        }
        let counter = self.counters.entry(T::ID_PREFIX).or_insert(0);
        *counter += 1;
        let id = format!("{}{}", T::ID_PREFIX, counter);
        self.assigned.insert(item.id(), id.clone());
        id
    }
}

macro_rules! family_table {
    ($register:ident, $lookup:ident, $field:ident, $ty:ty) => {
        impl Context {
            /// Registers a parsed entity under its serialized id, rejecting
            /// duplicates within the family's id space.
            pub fn $register(&mut self, id: &str, item: Handle<$ty>) -> Result<()> {
                if self.$field.insert(id.to_string(), item).is_some() {
                    return Err(ConfigError::DuplicateId { id: id.to_string() });
                }
                Ok(())
            }

            /// Looks up a registered entity by serialized id.
            pub fn $lookup(&self, id: &str) -> Option<Handle<$ty>> {
                self.$field.get(id).cloned()
            }
        }
    };
}

family_table!(register_channel, channel, channels, Channel);
family_table!(register_contact, contact, contacts, Contact);
family_table!(register_scan_list, scan_list, scan_lists, ScanList);
family_table!(register_group_list, group_list, group_lists, GroupList);
family_table!(register_zone, zone, zones, Zone);
family_table!(register_roaming_zone, roaming_zone, roaming_zones, RoamingZone);
family_table!(register_radio_id, radio_id, radio_ids, RadioId);
family_table!(register_positioning, positioning, positioning, PositioningSystem);

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::handle;

    #[test]
    fn ids_are_assigned_in_first_seen_order_per_family() {
        let mut ctx = Context::new();
        let c1 = Contact::digital("Alpha", crate::CallType::GroupCall, 91, false).unwrap();
        let c2 = Contact::dtmf("Gate", "1234", false).unwrap();
        let ch = Channel::analog("Local", 145.500, 145.500).unwrap();

        assert_eq!(ctx.id_for(&c1), "cont1");
        assert_eq!(ctx.id_for(&c2), "cont2");
        // Independent id space for channels.
        assert_eq!(ctx.id_for(&ch), "ch1");
        // Stable on repeat.
        assert_eq!(ctx.id_for(&c1), "cont1");
    }

    #[test]
    fn duplicate_registration_is_rejected() {
        let mut ctx = Context::new();
        let a = handle(Contact::digital("A", crate::CallType::PrivateCall, 1, false).unwrap());
        let b = handle(Contact::digital("B", crate::CallType::PrivateCall, 2, false).unwrap());

        ctx.register_contact("cont1", a).unwrap();
        let err = ctx.register_contact("cont1", b).unwrap_err();
        assert!(matches!(err, ConfigError::DuplicateId { .. }));
    }

    #[test]
    fn lookup_miss_is_none_not_error() {
        let ctx = Context::new();
        assert!(ctx.contact("cont99").is_none());
    }
}
