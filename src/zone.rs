//! Zones: named groups of channels selectable on the radio's dial.

use serde_yaml_ng::{Mapping, Value};

use crate::channel::Channel;
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::item::{ConfigItem, Meta};
use crate::node;
use crate::reference::RefList;

/// A named list of channel references.
#[derive(Debug)]
pub struct Zone {
    meta: Meta,
    channels: RefList<Channel>,
}

impl Zone {
    pub fn new(name: &str) -> Result<Self> {
        let mut zone = Self::blank();
        zone.set_name(name)?;
        Ok(zone)
    }

    pub(crate) fn blank() -> Self {
        Zone { meta: Meta::new("unnamed"), channels: RefList::new() }
    }

    pub fn channels(&self) -> &RefList<Channel> {
        &self.channels
    }

    pub fn channels_mut(&mut self) -> &mut RefList<Channel> {
        &mut self.channels
    }
}

impl ConfigItem for Zone {
    const ID_PREFIX: &'static str = "zone";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "zone"
    }

    fn copy_from(&mut self, other: &Self) -> Result<()> {
        self.channels = other.channels.clone_pointing();
        self.set_name(other.name())
    }

    fn duplicate(&self) -> Self {
        Zone { meta: Meta::new(self.name()), channels: self.channels.clone_pointing() }
    }

    fn serialize(&self, ctx: &mut Context) -> Result<Value> {
        let mut map = Mapping::new();
        map.insert(node::key("id"), Value::String(ctx.id_for(self)));
        map.insert(node::key("name"), Value::String(self.name().to_string()));
        let channels: Vec<Value> = self
            .channels
            .targets()
            .iter()
            .map(|ch| Value::String(ctx.id_for(&*ch.borrow())))
            .collect();
        map.insert(node::key("channels"), Value::Sequence(channels));
        Ok(Value::Mapping(map))
    }

    fn populate(&mut self, node: &Value, ctx: &Context) -> Result<()> {
        let map = node::as_map(node, "zone")?;
        self.set_name(node::req_str(map, "name")?)?;
        if let Some(channels) = node::opt(map, "channels") {
            let seq = channels
                .as_sequence()
                .ok_or_else(|| ConfigError::parse("channels", "expected a sequence"))?;
            for entry in seq {
                let id = entry
                    .as_str()
                    .ok_or_else(|| ConfigError::parse("channels", "expected a channel id"))?;
                let channel =
                    ctx.channel(id).ok_or_else(|| ConfigError::unresolved("channels", id))?;
                self.channels.add(&channel)?;
            }
        }
        Ok(())
    }
}
