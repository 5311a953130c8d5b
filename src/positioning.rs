//! Positioning systems: APRS (analog) and DMR (digital) position reporting.

use serde_yaml_ng::{Mapping, Value};

use crate::contact::Contact;
use crate::context::Context;
use crate::error::{ConfigError, Result};
use crate::item::{ConfigItem, Meta};
use crate::node;
use crate::reference::EntityRef;

/// Variant-specific positioning payload.
#[derive(Debug)]
pub enum PositioningMode {
    /// Analog APRS beaconing with source and destination calls.
    Aprs { source: String, destination: String },
    /// DMR position reports sent to a digital contact.
    Dmr { destination: EntityRef<Contact> },
}

/// A position-reporting system channels may reference.
#[derive(Debug)]
pub struct PositioningSystem {
    meta: Meta,
    /// Reporting period in seconds.
    period: u32,
    mode: PositioningMode,
}

impl PositioningSystem {
    /// Constructs an analog APRS system.
    pub fn aprs(name: &str, source: &str, destination: &str, period: u32) -> Result<Self> {
        let mut sys = Self::blank_aprs();
        sys.set_name(name)?;
        sys.set_period(period)?;
        if let PositioningMode::Aprs { source: s, destination: d } = &mut sys.mode {
            *s = source.to_string();
            *d = destination.to_string();
        }
        Ok(sys)
    }

    /// Constructs a DMR positioning system; the destination contact is set
    /// separately through [`PositioningSystem::dmr_destination`].
    pub fn dmr(name: &str, period: u32) -> Result<Self> {
        let mut sys = Self::blank_dmr();
        sys.set_name(name)?;
        sys.set_period(period)?;
        Ok(sys)
    }

    pub(crate) fn blank_aprs() -> Self {
        PositioningSystem {
            meta: Meta::new("unnamed"),
            period: 300,
            mode: PositioningMode::Aprs { source: String::new(), destination: String::new() },
        }
    }

    pub(crate) fn blank_dmr() -> Self {
        PositioningSystem {
            meta: Meta::new("unnamed"),
            period: 300,
            mode: PositioningMode::Dmr {
                destination: EntityRef::constrained(|c| c.is_digital(), "digital contact"),
            },
        }
    }

    pub fn period(&self) -> u32 {
        self.period
    }

    /// Sets the reporting period; zero would mean "never report" and is
    /// rejected.
    pub fn set_period(&mut self, period: u32) -> Result<()> {
        if period == 0 {
            return Err(ConfigError::validation("period", "reporting period must be positive"));
        }
        self.period = period;
        Ok(())
    }

    pub fn mode(&self) -> &PositioningMode {
        &self.mode
    }

    pub fn is_aprs(&self) -> bool {
        matches!(self.mode, PositioningMode::Aprs { .. })
    }

    pub fn is_dmr(&self) -> bool {
        matches!(self.mode, PositioningMode::Dmr { .. })
    }

    /// The destination contact reference, if this is a DMR system.
    pub fn dmr_destination(&self) -> Option<&EntityRef<Contact>> {
        match &self.mode {
            PositioningMode::Dmr { destination } => Some(destination),
            _ => None,
        }
    }
}

impl ConfigItem for PositioningSystem {
    const ID_PREFIX: &'static str = "aprs";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        match self.mode {
            PositioningMode::Aprs { .. } => "APRS system",
            PositioningMode::Dmr { .. } => "DMR positioning system",
        }
    }

    fn copy_from(&mut self, other: &Self) -> Result<()> {
        match (&mut self.mode, &other.mode) {
            (
                PositioningMode::Aprs { source, destination },
                PositioningMode::Aprs { source: src, destination: dst },
            ) => {
                *source = src.clone();
                *destination = dst.clone();
            }
            (
                PositioningMode::Dmr { destination },
                PositioningMode::Dmr { destination: src },
            ) => {
                destination.copy_target_from(src)?;
            }
            _ => return Err(ConfigError::type_mismatch(self.type_name(), other.type_name())),
        }
        self.period = other.period;
        self.set_name(other.name())
    }

    fn duplicate(&self) -> Self {
        PositioningSystem {
            meta: Meta::new(self.name()),
            period: self.period,
            mode: match &self.mode {
                PositioningMode::Aprs { source, destination } => PositioningMode::Aprs {
                    source: source.clone(),
                    destination: destination.clone(),
                },
                PositioningMode::Dmr { destination } => {
                    PositioningMode::Dmr { destination: destination.clone_pointing() }
                }
            },
        }
    }

    fn serialize(&self, ctx: &mut Context) -> Result<Value> {
        let mut map = Mapping::new();
        map.insert(node::key("id"), Value::String(ctx.id_for(self)));
        map.insert(node::key("name"), Value::String(self.name().to_string()));
        map.insert(node::key("period"), Value::Number(self.period.into()));
        let tag = match &self.mode {
            PositioningMode::Aprs { source, destination } => {
                map.insert(node::key("source"), Value::String(source.clone()));
                map.insert(node::key("destination"), Value::String(destination.clone()));
                "aprs"
            }
            PositioningMode::Dmr { destination } => {
                if let Some(contact) = destination.get() {
                    map.insert(
                        node::key("destination"),
                        Value::String(ctx.id_for(&*contact.borrow())),
                    );
                }
                "dmr"
            }
        };

        let mut wrapper = Mapping::new();
        wrapper.insert(node::key(tag), Value::Mapping(map));
        Ok(Value::Mapping(wrapper))
    }

    fn populate(&mut self, node: &Value, ctx: &Context) -> Result<()> {
        let wrapper = node::as_map(node, "positioning system")?;
        let tag = if self.is_aprs() { "aprs" } else { "dmr" };
        let body = wrapper
            .get(node::key(tag))
            .ok_or_else(|| ConfigError::type_mismatch(self.type_name(), "other positioning node"))?;
        let map = node::as_map(body, "positioning system")?;

        self.set_name(node::req_str(map, "name")?)?;
        let period = node::req_u64(map, "period")?;
        let period = u32::try_from(period)
            .map_err(|_| ConfigError::parse("period", format!("period out of range: {period}")))?;
        self.set_period(period)?;

        match &mut self.mode {
            PositioningMode::Aprs { source, destination } => {
                *source = node::req_str(map, "source")?.to_string();
                *destination = node::req_str(map, "destination")?.to_string();
            }
            PositioningMode::Dmr { destination } => {
                if let Some(id) = node::opt_str(map, "destination")? {
                    let contact = ctx
                        .contact(id)
                        .ok_or_else(|| ConfigError::unresolved("destination", id))?;
                    destination.set(Some(&contact))?;
                }
            }
        }
        Ok(())
    }
}
