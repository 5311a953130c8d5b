//! The configuration root: one object owning every entity list, with whole-
//! codeplug serialization to and from a YAML node tree.
//!
//! Parsing is two-pass. The first pass constructs a blank entity of the right
//! concrete variant for every node and registers its serialized id with a
//! [`Context`]; the second pass populates fields, resolving cross-references
//! through that context. Forward references therefore need no declaration
//! order, and an id that resolves to nothing is an error, never a silently
//! dropped link.

use std::rc::Rc;

use serde_yaml_ng::{Mapping, Value};
use tracing::debug;

use crate::channel::{Channel, ChannelList};
use crate::collection::ConfigList;
use crate::contact::{Contact, ContactList};
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::grouplist::GroupList;
use crate::item::{handle, ConfigItem, Handle};
use crate::node;
use crate::positioning::PositioningSystem;
use crate::radioid::RadioId;
use crate::roaming::RoamingZone;
use crate::scanlist::ScanList;
use crate::zone::Zone;

/// The codeplug configuration: the root owner of all entities.
#[derive(Debug)]
pub struct Config {
    radio_ids: ConfigList<RadioId>,
    contacts: ContactList,
    group_lists: ConfigList<GroupList>,
    channels: ChannelList,
    zones: ConfigList<Zone>,
    scan_lists: ConfigList<ScanList>,
    positioning: ConfigList<PositioningSystem>,
    roaming: ConfigList<RoamingZone>,
}

impl Config {
    pub fn new() -> Self {
        Config {
            radio_ids: ConfigList::new("radio ids"),
            contacts: ContactList::new(),
            group_lists: ConfigList::new("group lists"),
            channels: ChannelList::new(),
            zones: ConfigList::new("zones"),
            scan_lists: ConfigList::new("scan lists"),
            positioning: ConfigList::new("positioning systems"),
            roaming: ConfigList::new("roaming zones"),
        }
    }

    pub fn radio_ids(&self) -> &ConfigList<RadioId> {
        &self.radio_ids
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    pub fn group_lists(&self) -> &ConfigList<GroupList> {
        &self.group_lists
    }

    pub fn channels(&self) -> &ChannelList {
        &self.channels
    }

    pub fn zones(&self) -> &ConfigList<Zone> {
        &self.zones
    }

    pub fn scan_lists(&self) -> &ConfigList<ScanList> {
        &self.scan_lists
    }

    pub fn positioning(&self) -> &ConfigList<PositioningSystem> {
        &self.positioning
    }

    pub fn roaming(&self) -> &ConfigList<RoamingZone> {
        &self.roaming
    }

    /// Removes every entity from every list. References into the removed
    /// entities invalidate as usual.
    pub fn clear(&self) {
        self.radio_ids.clear();
        self.contacts.inner().clear();
        self.group_lists.clear();
        self.channels.inner().clear();
        self.zones.clear();
        self.scan_lists.clear();
        self.positioning.clear();
        self.roaming.clear();
    }

    /// Serializes the whole configuration into a YAML node tree. Ids are
    /// assigned in first-seen order, so an unmodified graph serializes to the
    /// same tree every time.
    pub fn serialize(&self) -> Result<Value> {
        let mut ctx = Context::new();
        let mut root = Mapping::new();
        root.insert(node::key("radioIDs"), serialize_items(&self.radio_ids.items(), &mut ctx)?);
        root.insert(node::key("contacts"), serialize_items(&self.contacts.items(), &mut ctx)?);
        root.insert(node::key("groupLists"), serialize_items(&self.group_lists.items(), &mut ctx)?);
        root.insert(node::key("channels"), serialize_items(&self.channels.items(), &mut ctx)?);
        root.insert(node::key("zones"), serialize_items(&self.zones.items(), &mut ctx)?);
        root.insert(node::key("scanLists"), serialize_items(&self.scan_lists.items(), &mut ctx)?);
        root.insert(node::key("positioning"), serialize_items(&self.positioning.items(), &mut ctx)?);
        root.insert(node::key("roaming"), serialize_items(&self.roaming.items(), &mut ctx)?);
        debug!(
            channels = self.channels.len(),
            contacts = self.contacts.len(),
            "serialized configuration"
        );
        Ok(Value::Mapping(root))
    }

    /// Serializes the configuration to YAML text.
    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml_ng::to_string(&self.serialize()?)?)
    }

    /// Parses a configuration from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let root: Value = serde_yaml_ng::from_str(text)?;
        Self::from_value(&root)
    }

    /// Reconstructs a configuration from a YAML node tree.
    pub fn from_value(root: &Value) -> Result<Self> {
        let config = Config::new();
        let mut ctx = Context::new();
        let map = node::as_map(root, "configuration")?;

        // Pass 1: construct a blank of the right variant for every node and
        // register its id, so pass 2 can resolve references in any order.
        let radio_ids = construct(map, "radioIDs", |entry| {
            let (tag, body) = wrapper_body(entry, "radio id")?;
            if tag != "dmr" {
                return Err(ConfigError::parse("radio id", format!("unknown variant '{tag}'")));
            }
            let item = handle(RadioId::blank());
            ctx_register(&mut ctx, body, |ctx, id| {
                ctx.register_radio_id(id, Rc::clone(&item))
            })?;
            config.radio_ids.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let contacts = construct(map, "contacts", |entry| {
            let (tag, body) = wrapper_body(entry, "contact")?;
            let item = match tag {
                "dtmf" => handle(Contact::blank_dtmf()),
                "dmr" => handle(Contact::blank_digital()),
                other => {
                    return Err(ConfigError::parse("contact", format!("unknown variant '{other}'")))
                }
            };
            ctx_register(&mut ctx, body, |ctx, id| ctx.register_contact(id, Rc::clone(&item)))?;
            config.contacts.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let group_lists = construct(map, "groupLists", |entry| {
            let body = node::as_map(entry, "group list")?;
            let item = handle(GroupList::blank());
            ctx_register(&mut ctx, body, |ctx, id| {
                ctx.register_group_list(id, Rc::clone(&item))
            })?;
            config.group_lists.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let channels = construct(map, "channels", |entry| {
            let (tag, body) = wrapper_body(entry, "channel")?;
            let item = match tag {
                "analog" => handle(Channel::blank_analog()),
                "digital" => handle(Channel::blank_digital()),
                other => {
                    return Err(ConfigError::parse("channel", format!("unknown variant '{other}'")))
                }
            };
            ctx_register(&mut ctx, body, |ctx, id| ctx.register_channel(id, Rc::clone(&item)))?;
            config.channels.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let zones = construct(map, "zones", |entry| {
            let body = node::as_map(entry, "zone")?;
            let item = handle(Zone::blank());
            ctx_register(&mut ctx, body, |ctx, id| ctx.register_zone(id, Rc::clone(&item)))?;
            config.zones.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let scan_lists = construct(map, "scanLists", |entry| {
            let body = node::as_map(entry, "scan list")?;
            let item = handle(ScanList::blank());
            ctx_register(&mut ctx, body, |ctx, id| {
                ctx.register_scan_list(id, Rc::clone(&item))
            })?;
            config.scan_lists.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let positioning = construct(map, "positioning", |entry| {
            let (tag, body) = wrapper_body(entry, "positioning system")?;
            let item = match tag {
                "aprs" => handle(PositioningSystem::blank_aprs()),
                "dmr" => handle(PositioningSystem::blank_dmr()),
                other => {
                    return Err(ConfigError::parse(
                        "positioning system",
                        format!("unknown variant '{other}'"),
                    ))
                }
            };
            ctx_register(&mut ctx, body, |ctx, id| {
                ctx.register_positioning(id, Rc::clone(&item))
            })?;
            config.positioning.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        let roaming = construct(map, "roaming", |entry| {
            let body = node::as_map(entry, "roaming zone")?;
            let item = handle(RoamingZone::blank());
            ctx_register(&mut ctx, body, |ctx, id| {
                ctx.register_roaming_zone(id, Rc::clone(&item))
            })?;
            config.roaming.add(Rc::clone(&item), None)?;
            Ok(item)
        })?;

        // Pass 2: populate fields and resolve references.
        populate_all(&radio_ids, &ctx)?;
        populate_all(&contacts, &ctx)?;
        populate_all(&positioning, &ctx)?;
        populate_all(&group_lists, &ctx)?;
        populate_all(&channels, &ctx)?;
        populate_all(&zones, &ctx)?;
        populate_all(&scan_lists, &ctx)?;
        populate_all(&roaming, &ctx)?;

        debug!(
            channels = config.channels.len(),
            contacts = config.contacts.len(),
            zones = config.zones.len(),
            "parsed configuration"
        );
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

fn serialize_items<T: ConfigItem>(items: &[Handle<T>], ctx: &mut Context) -> Result<Value> {
    let mut seq = Vec::with_capacity(items.len());
    for item in items {
        seq.push(item.borrow().serialize(ctx)?);
    }
    Ok(Value::Sequence(seq))
}

/// Unwraps a single-entry variant wrapper like `{dmr: {...}}` into its tag
/// and body mapping.
fn wrapper_body<'a>(entry: &'a Value, context: &'static str) -> Result<(&'a str, &'a Mapping)> {
    let map = node::as_map(entry, context)?;
    if map.len() != 1 {
        return Err(ConfigError::parse(context, "expected a single-variant wrapper"));
    }
    let (tag, body) = map
        .iter()
        .next()
        .ok_or_else(|| ConfigError::parse(context, "expected a single-variant wrapper"))?;
    let tag = tag.as_str().ok_or_else(|| ConfigError::parse(context, "expected a string tag"))?;
    Ok((tag, node::as_map(body, context)?))
}

fn ctx_register(
    ctx: &mut Context,
    body: &Mapping,
    register: impl FnOnce(&mut Context, &str) -> Result<()>,
) -> Result<()> {
    register(ctx, node::req_str(body, "id")?)
}

/// Runs a per-entry constructor over an optional section, collecting the
/// (handle, node) pairs for the populate pass.
fn construct<'a, T>(
    map: &'a Mapping,
    section: &'static str,
    mut build: impl FnMut(&'a Value) -> Result<Handle<T>>,
) -> Result<Vec<(Handle<T>, &'a Value)>> {
    let Some(value) = node::opt(map, section) else { return Ok(Vec::new()) };
    let seq = value
        .as_sequence()
        .ok_or_else(|| ConfigError::parse(section, "expected a sequence"))?;
    let mut pending = Vec::with_capacity(seq.len());
    for entry in seq {
        pending.push((build(entry)?, entry));
    }
    Ok(pending)
}

fn populate_all<T: ConfigItem>(pending: &[(Handle<T>, &Value)], ctx: &Context) -> Result<()> {
    for (item, entry) in pending {
        item.borrow_mut().populate(entry, ctx)?;
    }
    Ok(())
}
