//! Radio identities: the DMR ids a radio transmits under.

use serde_yaml_ng::{Mapping, Value};

use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::item::{ConfigItem, Meta};
use crate::node;

/// A named DMR identity.
#[derive(Debug)]
pub struct RadioId {
    meta: Meta,
    number: u32,
}

impl RadioId {
    pub fn new(name: &str, number: u32) -> Result<Self> {
        let mut id = Self::blank();
        id.set_name(name)?;
        id.set_number(number)?;
        Ok(id)
    }

    pub(crate) fn blank() -> Self {
        RadioId { meta: Meta::new("unnamed"), number: 1 }
    }

    pub fn number(&self) -> u32 {
        self.number
    }

    /// Replaces the DMR id after validating the 24-bit range.
    pub fn set_number(&mut self, number: u32) -> Result<()> {
        if number >= 1 << 24 {
            return Err(ConfigError::validation(
                "number",
                format!("DMR id {number} exceeds the 24-bit id space"),
            ));
        }
        self.number = number;
        Ok(())
    }
}

impl ConfigItem for RadioId {
    const ID_PREFIX: &'static str = "id";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        "radio id"
    }

    fn copy_from(&mut self, other: &Self) -> Result<()> {
        self.number = other.number;
        self.set_name(other.name())
    }

    fn duplicate(&self) -> Self {
        RadioId { meta: Meta::new(self.name()), number: self.number }
    }

    fn serialize(&self, ctx: &mut Context) -> Result<Value> {
        let mut map = Mapping::new();
        map.insert(node::key("id"), Value::String(ctx.id_for(self)));
        map.insert(node::key("name"), Value::String(self.name().to_string()));
        map.insert(node::key("number"), Value::Number(self.number.into()));

        let mut wrapper = Mapping::new();
        wrapper.insert(node::key("dmr"), Value::Mapping(map));
        Ok(Value::Mapping(wrapper))
    }

    fn populate(&mut self, node: &Value, _ctx: &Context) -> Result<()> {
        let wrapper = node::as_map(node, "radio id")?;
        let body = wrapper
            .get(node::key("dmr"))
            .ok_or_else(|| ConfigError::parse("radio id", "expected a 'dmr' entry"))?;
        let map = node::as_map(body, "radio id")?;
        self.set_name(node::req_str(map, "name")?)?;
        let number = node::req_u64(map, "number")?;
        let number = u32::try_from(number)
            .map_err(|_| ConfigError::parse("number", format!("DMR id out of range: {number}")))?;
        self.set_number(number)
    }
}
