//! The channel family: the shared channel record plus its analog and digital
//! variants, and the channel list with its find operations.
//!
//! A channel is a data record, not a protocol participant: the interesting
//! state transitions are the tri-state default/disabled/explicit fields
//! (power, timeout, VOX, squelch), each moved between states by dedicated
//! setters. Variant dispatch is a closed sum type ([`ChannelMode`]) instead
//! of runtime downcasts, so the set of concrete kinds is explicit.

use serde::{Deserialize, Serialize};
use serde_yaml_ng::{Mapping, Value};

use crate::collection::{ConfigList, ListEvent, ListObserver};
use crate::context::Context;
use crate::contact::Contact;
use crate::error::{ConfigError, Result};
use crate::grouplist::GroupList;
use crate::item::{ConfigItem, Handle, Meta};
use crate::node;
use crate::positioning::PositioningSystem;
use crate::radioid::RadioId;
use crate::reference::EntityRef;
use crate::roaming::RoamingZone;
use crate::scanlist::ScanList;
use crate::types::{ToneCode, Tristate};

/// Transmit power settings, strongest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Power {
    Max,
    High,
    Mid,
    Low,
    Min,
}

/// Admit criterion of an analog channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnalogAdmit {
    /// Transmit any time.
    Always,
    /// Transmit only when the channel is free.
    Free,
    /// Transmit only when the admit tone is present.
    Tone,
}

/// Admit criterion of a digital channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DigitalAdmit {
    Always,
    Free,
    /// Transmit only when free and the color code matches.
    ColorCode,
}

/// Bandwidth of an analog channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Bandwidth {
    /// 12.5 kHz.
    Narrow,
    /// 25 kHz.
    Wide,
}

/// DMR time slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSlot {
    TS1,
    TS2,
}

/// Fields specific to analog (FM) channels.
#[derive(Debug)]
pub struct AnalogSettings {
    admit: AnalogAdmit,
    squelch: Tristate<u8>,
    rx_tone: ToneCode,
    tx_tone: ToneCode,
    bandwidth: Bandwidth,
    aprs: EntityRef<PositioningSystem>,
}

impl AnalogSettings {
    fn new() -> Self {
        AnalogSettings {
            admit: AnalogAdmit::Always,
            squelch: Tristate::Default,
            rx_tone: ToneCode::None,
            tx_tone: ToneCode::None,
            bandwidth: Bandwidth::Narrow,
            aprs: EntityRef::constrained(|s| s.is_aprs(), "APRS system"),
        }
    }

    pub fn admit(&self) -> AnalogAdmit {
        self.admit
    }

    pub fn set_admit(&mut self, admit: AnalogAdmit) {
        self.admit = admit;
    }

    pub fn squelch(&self) -> Tristate<u8> {
        self.squelch
    }

    /// Sets an explicit squelch level in `[0, 10]`.
    pub fn set_squelch(&mut self, level: u8) -> Result<()> {
        if level > 10 {
            return Err(ConfigError::validation(
                "squelch",
                format!("squelch level {level} out of range [0, 10]"),
            ));
        }
        self.squelch = Tristate::Value(level);
        Ok(())
    }

    pub fn set_default_squelch(&mut self) {
        self.squelch = Tristate::Default;
    }

    pub fn disable_squelch(&mut self) {
        self.squelch = Tristate::Disabled;
    }

    pub fn rx_tone(&self) -> ToneCode {
        self.rx_tone
    }

    /// Tones are validated at construction, so assignment is infallible.
    pub fn set_rx_tone(&mut self, tone: ToneCode) {
        self.rx_tone = tone;
    }

    pub fn tx_tone(&self) -> ToneCode {
        self.tx_tone
    }

    pub fn set_tx_tone(&mut self, tone: ToneCode) {
        self.tx_tone = tone;
    }

    pub fn bandwidth(&self) -> Bandwidth {
        self.bandwidth
    }

    pub fn set_bandwidth(&mut self, bandwidth: Bandwidth) {
        self.bandwidth = bandwidth;
    }

    /// Reference to the APRS system used on this channel.
    pub fn aprs(&self) -> &EntityRef<PositioningSystem> {
        &self.aprs
    }
}

/// Fields specific to digital (DMR) channels.
#[derive(Debug)]
pub struct DigitalSettings {
    admit: DigitalAdmit,
    color_code: u8,
    time_slot: TimeSlot,
    group_list: EntityRef<GroupList>,
    contact: EntityRef<Contact>,
    positioning: EntityRef<PositioningSystem>,
    roaming: EntityRef<RoamingZone>,
    radio_id: EntityRef<RadioId>,
}

impl DigitalSettings {
    fn new() -> Self {
        DigitalSettings {
            admit: DigitalAdmit::Always,
            color_code: 1,
            time_slot: TimeSlot::TS1,
            group_list: EntityRef::new(),
            contact: EntityRef::constrained(|c| c.is_digital(), "digital contact"),
            positioning: EntityRef::new(),
            roaming: EntityRef::new(),
            radio_id: EntityRef::new(),
        }
    }

    pub fn admit(&self) -> DigitalAdmit {
        self.admit
    }

    pub fn set_admit(&mut self, admit: DigitalAdmit) {
        self.admit = admit;
    }

    pub fn color_code(&self) -> u8 {
        self.color_code
    }

    /// Sets the color code; DMR defines codes 0 through 15.
    pub fn set_color_code(&mut self, code: u8) -> Result<()> {
        if code > 15 {
            return Err(ConfigError::validation(
                "colorCode",
                format!("color code {code} out of range [0, 15]"),
            ));
        }
        self.color_code = code;
        Ok(())
    }

    pub fn time_slot(&self) -> TimeSlot {
        self.time_slot
    }

    pub fn set_time_slot(&mut self, slot: TimeSlot) {
        self.time_slot = slot;
    }

    /// Reference to the RX group list.
    pub fn group_list(&self) -> &EntityRef<GroupList> {
        &self.group_list
    }

    /// Reference to the default TX contact; only digital contacts are
    /// accepted.
    pub fn tx_contact(&self) -> &EntityRef<Contact> {
        &self.contact
    }

    /// Reference to the positioning system.
    pub fn positioning(&self) -> &EntityRef<PositioningSystem> {
        &self.positioning
    }

    /// Reference to the roaming zone.
    pub fn roaming(&self) -> &EntityRef<RoamingZone> {
        &self.roaming
    }

    /// Reference to the radio identity; unset means "use the default
    /// identity".
    pub fn radio_id(&self) -> &EntityRef<RadioId> {
        &self.radio_id
    }
}

/// Variant-specific channel payload.
#[derive(Debug)]
pub enum ChannelMode {
    Analog(AnalogSettings),
    Digital(DigitalSettings),
}

/// A codeplug channel, analog (FM) or digital (DMR).
#[derive(Debug)]
pub struct Channel {
    meta: Meta,
    rx_frequency: f64,
    tx_frequency: f64,
    power: Option<Power>,
    timeout: Tristate<u32>,
    rx_only: bool,
    vox: Tristate<u8>,
    scan_list: EntityRef<ScanList>,
    mode: ChannelMode,
}

impl Channel {
    /// Constructs an analog channel. Frequencies are in MHz and must be
    /// positive.
    pub fn analog(name: &str, rx_mhz: f64, tx_mhz: f64) -> Result<Self> {
        let mut channel = Self::blank_analog();
        channel.set_name(name)?;
        channel.set_rx_frequency(rx_mhz)?;
        channel.set_tx_frequency(tx_mhz)?;
        Ok(channel)
    }

    /// Constructs a digital (DMR) channel. Frequencies are in MHz and must
    /// be positive.
    pub fn digital(name: &str, rx_mhz: f64, tx_mhz: f64) -> Result<Self> {
        let mut channel = Self::blank_digital();
        channel.set_name(name)?;
        channel.set_rx_frequency(rx_mhz)?;
        channel.set_tx_frequency(tx_mhz)?;
        Ok(channel)
    }

    pub(crate) fn blank_analog() -> Self {
        Self::blank(ChannelMode::Analog(AnalogSettings::new()))
    }

    pub(crate) fn blank_digital() -> Self {
        Self::blank(ChannelMode::Digital(DigitalSettings::new()))
    }

    fn blank(mode: ChannelMode) -> Self {
        Channel {
            meta: Meta::new("unnamed"),
            rx_frequency: 145.0,
            tx_frequency: 145.0,
            power: None,
            timeout: Tristate::Default,
            rx_only: false,
            vox: Tristate::Default,
            scan_list: EntityRef::new(),
            mode,
        }
    }

    pub fn rx_frequency(&self) -> f64 {
        self.rx_frequency
    }

    pub fn set_rx_frequency(&mut self, mhz: f64) -> Result<()> {
        if !(mhz > 0.0) {
            return Err(ConfigError::validation(
                "rxFrequency",
                format!("frequency must be positive, got {mhz}"),
            ));
        }
        self.rx_frequency = mhz;
        Ok(())
    }

    pub fn tx_frequency(&self) -> f64 {
        self.tx_frequency
    }

    pub fn set_tx_frequency(&mut self, mhz: f64) -> Result<()> {
        if !(mhz > 0.0) {
            return Err(ConfigError::validation(
                "txFrequency",
                format!("frequency must be positive, got {mhz}"),
            ));
        }
        self.tx_frequency = mhz;
        Ok(())
    }

    /// The power setting; `None` means the radio-wide default applies.
    pub fn power(&self) -> Option<Power> {
        self.power
    }

    pub fn set_power(&mut self, power: Power) {
        self.power = Some(power);
    }

    pub fn set_default_power(&mut self) {
        self.power = None;
    }

    pub fn timeout(&self) -> Tristate<u32> {
        self.timeout
    }

    /// Sets an explicit transmit timeout in seconds; use
    /// [`Channel::disable_timeout`] rather than zero.
    pub fn set_timeout(&mut self, seconds: u32) -> Result<()> {
        if seconds == 0 {
            return Err(ConfigError::validation(
                "timeout",
                "timeout must be positive; disable it instead of setting zero",
            ));
        }
        self.timeout = Tristate::Value(seconds);
        Ok(())
    }

    pub fn set_default_timeout(&mut self) {
        self.timeout = Tristate::Default;
    }

    pub fn disable_timeout(&mut self) {
        self.timeout = Tristate::Disabled;
    }

    pub fn rx_only(&self) -> bool {
        self.rx_only
    }

    pub fn set_rx_only(&mut self, enable: bool) {
        self.rx_only = enable;
    }

    pub fn vox(&self) -> Tristate<u8> {
        self.vox
    }

    /// Sets an explicit VOX level in `[0, 10]`.
    pub fn set_vox(&mut self, level: u8) -> Result<()> {
        if level > 10 {
            return Err(ConfigError::validation(
                "vox",
                format!("VOX level {level} out of range [0, 10]"),
            ));
        }
        self.vox = Tristate::Value(level);
        Ok(())
    }

    pub fn set_default_vox(&mut self) {
        self.vox = Tristate::Default;
    }

    pub fn disable_vox(&mut self) {
        self.vox = Tristate::Disabled;
    }

    /// Reference to the scan list.
    pub fn scan_list(&self) -> &EntityRef<ScanList> {
        &self.scan_list
    }

    pub fn mode(&self) -> &ChannelMode {
        &self.mode
    }

    pub fn is_analog(&self) -> bool {
        matches!(self.mode, ChannelMode::Analog(_))
    }

    pub fn is_digital(&self) -> bool {
        matches!(self.mode, ChannelMode::Digital(_))
    }

    pub fn analog_settings(&self) -> Option<&AnalogSettings> {
        match &self.mode {
            ChannelMode::Analog(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn analog_settings_mut(&mut self) -> Option<&mut AnalogSettings> {
        match &mut self.mode {
            ChannelMode::Analog(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn digital_settings(&self) -> Option<&DigitalSettings> {
        match &self.mode {
            ChannelMode::Digital(settings) => Some(settings),
            _ => None,
        }
    }

    pub fn digital_settings_mut(&mut self) -> Option<&mut DigitalSettings> {
        match &mut self.mode {
            ChannelMode::Digital(settings) => Some(settings),
            _ => None,
        }
    }

    fn power_node(&self) -> Result<Value> {
        match self.power {
            None => Ok(Value::String("default".into())),
            Some(power) => Ok(serde_yaml_ng::to_value(power)?),
        }
    }

    fn power_from_node(node: &Value) -> Result<Option<Power>> {
        match node {
            Value::String(s) if s == "default" => Ok(None),
            other => Ok(Some(serde_yaml_ng::from_value(other.clone())?)),
        }
    }

    fn serialize_common(&self, ctx: &mut Context, map: &mut Mapping) -> Result<()> {
        map.insert(node::key("id"), Value::String(ctx.id_for(self)));
        map.insert(node::key("name"), Value::String(self.name().to_string()));
        map.insert(node::key("rxFrequency"), Value::Number(self.rx_frequency.into()));
        map.insert(node::key("txFrequency"), Value::Number(self.tx_frequency.into()));
        map.insert(node::key("power"), self.power_node()?);
        map.insert(node::key("timeout"), self.timeout.to_node());
        map.insert(node::key("rxOnly"), Value::Bool(self.rx_only));
        map.insert(node::key("vox"), self.vox.to_node());
        if let Some(scan_list) = self.scan_list.get() {
            map.insert(node::key("scanList"), Value::String(ctx.id_for(&*scan_list.borrow())));
        }
        Ok(())
    }

    fn populate_common(&mut self, map: &Mapping, ctx: &Context) -> Result<()> {
        self.set_name(node::req_str(map, "name")?)?;
        self.set_rx_frequency(node::req_f64(map, "rxFrequency")?)?;
        self.set_tx_frequency(node::req_f64(map, "txFrequency")?)?;
        self.power = match node::opt(map, "power") {
            None => None,
            Some(power) => Self::power_from_node(power)?,
        };
        self.timeout = match node::opt(map, "timeout") {
            None => Tristate::Default,
            Some(timeout) => Tristate::<u32>::from_node(timeout, "timeout")?,
        };
        self.rx_only = node::opt_bool(map, "rxOnly", false)?;
        self.vox = match node::opt(map, "vox") {
            None => Tristate::Default,
            Some(vox) => Tristate::<u8>::from_node(vox, "vox")?,
        };
        if let Some(id) = node::opt_str(map, "scanList")? {
            let scan_list =
                ctx.scan_list(id).ok_or_else(|| ConfigError::unresolved("scanList", id))?;
            self.scan_list.set(Some(&scan_list))?;
        }
        Ok(())
    }
}

impl ConfigItem for Channel {
    const ID_PREFIX: &'static str = "ch";

    fn meta(&self) -> &Meta {
        &self.meta
    }

    fn meta_mut(&mut self) -> &mut Meta {
        &mut self.meta
    }

    fn type_name(&self) -> &'static str {
        match self.mode {
            ChannelMode::Analog(_) => "analog channel",
            ChannelMode::Digital(_) => "digital channel",
        }
    }

    fn copy_from(&mut self, other: &Self) -> Result<()> {
        match (&mut self.mode, &other.mode) {
            (ChannelMode::Analog(dst), ChannelMode::Analog(src)) => {
                dst.admit = src.admit;
                dst.squelch = src.squelch;
                dst.rx_tone = src.rx_tone;
                dst.tx_tone = src.tx_tone;
                dst.bandwidth = src.bandwidth;
                dst.aprs.copy_target_from(&src.aprs)?;
            }
            (ChannelMode::Digital(dst), ChannelMode::Digital(src)) => {
                dst.admit = src.admit;
                dst.color_code = src.color_code;
                dst.time_slot = src.time_slot;
                dst.group_list.copy_target_from(&src.group_list)?;
                dst.contact.copy_target_from(&src.contact)?;
                dst.positioning.copy_target_from(&src.positioning)?;
                dst.roaming.copy_target_from(&src.roaming)?;
                dst.radio_id.copy_target_from(&src.radio_id)?;
            }
            _ => return Err(ConfigError::type_mismatch(self.type_name(), other.type_name())),
        }
        self.rx_frequency = other.rx_frequency;
        self.tx_frequency = other.tx_frequency;
        self.power = other.power;
        self.timeout = other.timeout;
        self.rx_only = other.rx_only;
        self.vox = other.vox;
        self.scan_list.copy_target_from(&other.scan_list)?;
        self.set_name(other.name())
    }

    fn duplicate(&self) -> Self {
        Channel {
            meta: Meta::new(self.name()),
            rx_frequency: self.rx_frequency,
            tx_frequency: self.tx_frequency,
            power: self.power,
            timeout: self.timeout,
            rx_only: self.rx_only,
            vox: self.vox,
            scan_list: self.scan_list.clone_pointing(),
            mode: match &self.mode {
                ChannelMode::Analog(src) => ChannelMode::Analog(AnalogSettings {
                    admit: src.admit,
                    squelch: src.squelch,
                    rx_tone: src.rx_tone,
                    tx_tone: src.tx_tone,
                    bandwidth: src.bandwidth,
                    aprs: src.aprs.clone_pointing(),
                }),
                ChannelMode::Digital(src) => ChannelMode::Digital(DigitalSettings {
                    admit: src.admit,
                    color_code: src.color_code,
                    time_slot: src.time_slot,
                    group_list: src.group_list.clone_pointing(),
                    contact: src.contact.clone_pointing(),
                    positioning: src.positioning.clone_pointing(),
                    roaming: src.roaming.clone_pointing(),
                    radio_id: src.radio_id.clone_pointing(),
                }),
            },
        }
    }

    fn serialize(&self, ctx: &mut Context) -> Result<Value> {
        let mut map = Mapping::new();
        self.serialize_common(ctx, &mut map)?;
        let tag = match &self.mode {
            ChannelMode::Analog(settings) => {
                map.insert(node::key("admit"), serde_yaml_ng::to_value(settings.admit)?);
                map.insert(node::key("squelch"), settings.squelch.to_node());
                map.insert(node::key("rxTone"), settings.rx_tone.to_node());
                map.insert(node::key("txTone"), settings.tx_tone.to_node());
                map.insert(node::key("bandwidth"), serde_yaml_ng::to_value(settings.bandwidth)?);
                if let Some(aprs) = settings.aprs.get() {
                    map.insert(node::key("aprs"), Value::String(ctx.id_for(&*aprs.borrow())));
                }
                "analog"
            }
            ChannelMode::Digital(settings) => {
                map.insert(node::key("admit"), serde_yaml_ng::to_value(settings.admit)?);
                map.insert(node::key("colorCode"), Value::Number(u32::from(settings.color_code).into()));
                map.insert(node::key("timeSlot"), serde_yaml_ng::to_value(settings.time_slot)?);
                if let Some(group_list) = settings.group_list.get() {
                    map.insert(
                        node::key("groupList"),
                        Value::String(ctx.id_for(&*group_list.borrow())),
                    );
                }
                if let Some(contact) = settings.contact.get() {
                    map.insert(node::key("contact"), Value::String(ctx.id_for(&*contact.borrow())));
                }
                if let Some(positioning) = settings.positioning.get() {
                    map.insert(
                        node::key("aprs"),
                        Value::String(ctx.id_for(&*positioning.borrow())),
                    );
                }
                if let Some(roaming) = settings.roaming.get() {
                    map.insert(node::key("roaming"), Value::String(ctx.id_for(&*roaming.borrow())));
                }
                if let Some(radio_id) = settings.radio_id.get() {
                    map.insert(node::key("radioId"), Value::String(ctx.id_for(&*radio_id.borrow())));
                }
                "digital"
            }
        };

        let mut wrapper = Mapping::new();
        wrapper.insert(node::key(tag), Value::Mapping(map));
        Ok(Value::Mapping(wrapper))
    }

    fn populate(&mut self, node: &Value, ctx: &Context) -> Result<()> {
        let wrapper = node::as_map(node, "channel")?;
        let tag = if self.is_analog() { "analog" } else { "digital" };
        let body = wrapper
            .get(node::key(tag))
            .ok_or_else(|| ConfigError::type_mismatch(self.type_name(), "other channel node"))?;
        let map = node::as_map(body, "channel")?;

        self.populate_common(map, ctx)?;
        match &mut self.mode {
            ChannelMode::Analog(settings) => {
                settings.admit = serde_yaml_ng::from_value(node::req(map, "admit")?.clone())?;
                settings.squelch = match node::opt(map, "squelch") {
                    None => Tristate::Default,
                    Some(squelch) => Tristate::<u8>::from_node(squelch, "squelch")?,
                };
                if let Some(tone) = node::opt(map, "rxTone") {
                    settings.rx_tone = ToneCode::from_node(tone, "rxTone")?;
                }
                if let Some(tone) = node::opt(map, "txTone") {
                    settings.tx_tone = ToneCode::from_node(tone, "txTone")?;
                }
                settings.bandwidth =
                    serde_yaml_ng::from_value(node::req(map, "bandwidth")?.clone())?;
                if let Some(id) = node::opt_str(map, "aprs")? {
                    let system = ctx
                        .positioning(id)
                        .ok_or_else(|| ConfigError::unresolved("aprs", id))?;
                    settings.aprs.set(Some(&system))?;
                }
            }
            ChannelMode::Digital(settings) => {
                settings.admit = serde_yaml_ng::from_value(node::req(map, "admit")?.clone())?;
                let color_code = node::req_u64(map, "colorCode")?;
                let color_code = u8::try_from(color_code).map_err(|_| {
                    ConfigError::parse("colorCode", format!("color code out of range: {color_code}"))
                })?;
                settings.set_color_code(color_code)?;
                settings.time_slot =
                    serde_yaml_ng::from_value(node::req(map, "timeSlot")?.clone())?;
                if let Some(id) = node::opt_str(map, "groupList")? {
                    let group_list = ctx
                        .group_list(id)
                        .ok_or_else(|| ConfigError::unresolved("groupList", id))?;
                    settings.group_list.set(Some(&group_list))?;
                }
                if let Some(id) = node::opt_str(map, "contact")? {
                    let contact =
                        ctx.contact(id).ok_or_else(|| ConfigError::unresolved("contact", id))?;
                    settings.contact.set(Some(&contact))?;
                }
                if let Some(id) = node::opt_str(map, "aprs")? {
                    let system = ctx
                        .positioning(id)
                        .ok_or_else(|| ConfigError::unresolved("aprs", id))?;
                    settings.positioning.set(Some(&system))?;
                }
                if let Some(id) = node::opt_str(map, "roaming")? {
                    let roaming = ctx
                        .roaming_zone(id)
                        .ok_or_else(|| ConfigError::unresolved("roaming", id))?;
                    settings.roaming.set(Some(&roaming))?;
                }
                if let Some(id) = node::opt_str(map, "radioId")? {
                    let radio_id = ctx
                        .radio_id(id)
                        .ok_or_else(|| ConfigError::unresolved("radioId", id))?;
                    settings.radio_id.set(Some(&radio_id))?;
                }
            }
        }
        Ok(())
    }
}

/// The list of all channels, analog and digital.
#[derive(Debug, Clone)]
pub struct ChannelList {
    list: ConfigList<Channel>,
}

impl ChannelList {
    pub fn new() -> Self {
        ChannelList { list: ConfigList::new("channels") }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Channel at the flat index.
    pub fn get(&self, index: usize) -> Option<Handle<Channel>> {
        self.list.get(index)
    }

    /// Snapshot of all channels in canonical order.
    pub fn items(&self) -> Vec<Handle<Channel>> {
        self.list.items()
    }

    pub fn index_of(&self, channel: &Handle<Channel>) -> Option<usize> {
        self.list.index_of(channel)
    }

    /// Inserts at `position` (append on `None`), claiming ownership.
    pub fn add(&self, channel: Handle<Channel>, position: Option<usize>) -> Result<usize> {
        self.list.add(channel, position)
    }

    /// Removes and destroys the channel at the index.
    pub fn remove(&self, index: usize) -> Result<Handle<Channel>> {
        self.list.remove(index)
    }

    /// Registers a structural-change observer.
    pub fn observe(&self, listener: impl Fn(&ListEvent) + 'static) -> ListObserver<Channel> {
        self.list.observe(listener)
    }

    /// First digital channel matching all four fields exactly, in insertion
    /// order. `None` when no channel matches.
    pub fn find_digital_channel(
        &self,
        rx_mhz: f64,
        tx_mhz: f64,
        time_slot: TimeSlot,
        color_code: u8,
    ) -> Option<Handle<Channel>> {
        self.list.items().into_iter().find(|handle| {
            let channel = handle.borrow();
            let Some(digital) = channel.digital_settings() else { return false };
            channel.rx_frequency == rx_mhz
                && channel.tx_frequency == tx_mhz
                && digital.time_slot == time_slot
                && digital.color_code == color_code
        })
    }

    /// First analog channel transmitting on `tx_mhz`, in insertion order.
    pub fn find_analog_channel_by_tx_freq(&self, tx_mhz: f64) -> Option<Handle<Channel>> {
        self.list.items().into_iter().find(|handle| {
            let channel = handle.borrow();
            channel.is_analog() && channel.tx_frequency == tx_mhz
        })
    }

    pub(crate) fn inner(&self) -> &ConfigList<Channel> {
        &self.list
    }
}

impl Default for ChannelList {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::handle;
    use std::rc::Rc;

    #[test]
    fn frequency_setters_validate_domain() {
        let mut ch = Channel::analog("Local", 145.500, 145.500).unwrap();
        assert!(ch.set_rx_frequency(439.563).is_ok());
        assert_eq!(ch.rx_frequency(), 439.563);

        assert!(ch.set_rx_frequency(0.0).is_err());
        assert!(ch.set_rx_frequency(-2.5).is_err());
        assert!(ch.set_rx_frequency(f64::NAN).is_err());
        // Unchanged after the failed sets.
        assert_eq!(ch.rx_frequency(), 439.563);
    }

    #[test]
    fn tri_state_power_and_timeout() {
        let mut ch = Channel::digital("TG91", 439.563, 431.963).unwrap();
        assert_eq!(ch.power(), None);
        ch.set_power(Power::High);
        assert_eq!(ch.power(), Some(Power::High));
        ch.set_default_power();
        assert_eq!(ch.power(), None);

        assert!(ch.timeout().is_default());
        ch.set_timeout(45).unwrap();
        assert_eq!(ch.timeout().value(), Some(45));
        assert!(ch.set_timeout(0).is_err());
        assert_eq!(ch.timeout().value(), Some(45));
        ch.disable_timeout();
        assert!(ch.timeout().is_disabled());
        ch.set_default_timeout();
        assert!(ch.timeout().is_default());
    }

    #[test]
    fn vox_and_squelch_levels_are_bounded() {
        let mut ch = Channel::analog("Local", 145.500, 145.500).unwrap();
        assert!(ch.set_vox(10).is_ok());
        assert!(ch.set_vox(11).is_err());
        assert_eq!(ch.vox().value(), Some(10));

        let analog = ch.analog_settings_mut().unwrap();
        assert!(analog.set_squelch(3).is_ok());
        assert!(analog.set_squelch(11).is_err());
        assert_eq!(analog.squelch().value(), Some(3));
        analog.disable_squelch();
        assert!(analog.squelch().is_disabled());
    }

    #[test]
    fn digital_contact_reference_rejects_dtmf() {
        use crate::contact::{CallType, Contact};

        let ch = Channel::digital("TG91", 439.563, 431.963).unwrap();
        let digital = handle(Contact::digital("WW", CallType::GroupCall, 91, false).unwrap());
        let dtmf = handle(Contact::dtmf("Gate", "123", false).unwrap());

        let settings = ch.digital_settings().unwrap();
        settings.tx_contact().set(Some(&digital)).unwrap();
        let err = settings.tx_contact().set(Some(&dtmf)).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        // The previous target survives a failed set.
        assert!(Rc::ptr_eq(&settings.tx_contact().get().unwrap(), &digital));
    }

    #[test]
    fn copy_from_requires_same_variant() {
        let mut analog = Channel::analog("A", 145.500, 145.500).unwrap();
        let digital = Channel::digital("D", 439.563, 431.963).unwrap();

        let err = analog.copy_from(&digital).unwrap_err();
        assert!(matches!(err, ConfigError::TypeMismatch { .. }));
        assert_eq!(analog.name(), "A");

        let mut other = Channel::analog("B", 430.200, 430.200).unwrap();
        other.analog_settings_mut().unwrap().set_admit(AnalogAdmit::Tone);
        other.set_power(Power::Min);
        analog.copy_from(&other).unwrap();
        assert_eq!(analog.name(), "B");
        assert_eq!(analog.rx_frequency(), 430.200);
        assert_eq!(analog.power(), Some(Power::Min));
        assert_eq!(analog.analog_settings().unwrap().admit(), AnalogAdmit::Tone);
    }

    #[test]
    fn duplicate_shares_reference_targets() {
        let scan = handle(crate::ScanList::new("Sweep").unwrap());
        let mut original = Channel::digital("TG91", 439.563, 431.963).unwrap();
        original.scan_list().set(Some(&scan)).unwrap();
        original.digital_settings_mut().unwrap().set_color_code(7).unwrap();

        let copy = original.duplicate();
        assert_ne!(original.id(), copy.id());
        assert_eq!(copy.name(), "TG91");
        assert_eq!(copy.digital_settings().unwrap().color_code(), 7);
        // Same target, not a duplicated target.
        assert!(Rc::ptr_eq(&copy.scan_list().get().unwrap(), &scan));
    }

    #[test]
    fn duplicate_serializes_identically_in_a_fresh_id_space() {
        let scan = handle(crate::ScanList::new("Sweep").unwrap());
        let mut original = Channel::analog("Local", 145.500, 145.500).unwrap();
        original.scan_list().set(Some(&scan)).unwrap();
        original.analog_settings_mut().unwrap().set_rx_tone(ToneCode::ctcss(67.0).unwrap());
        let copy = original.duplicate();

        // A fresh context assigns each graph the same first-seen ids, so the
        // trees match node for node despite the distinct identities.
        let a = original.serialize(&mut Context::new()).unwrap();
        let b = copy.serialize(&mut Context::new()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn find_digital_channel_matches_all_four_fields() {
        let list = ChannelList::new();
        let mut a = Channel::digital("A", 145.500, 145.500).unwrap();
        a.digital_settings_mut().unwrap().set_color_code(1).unwrap();
        a.digital_settings_mut().unwrap().set_time_slot(TimeSlot::TS1);
        let mut b = Channel::digital("B", 145.500, 145.500).unwrap();
        b.digital_settings_mut().unwrap().set_color_code(1).unwrap();
        b.digital_settings_mut().unwrap().set_time_slot(TimeSlot::TS1);
        let mut c = Channel::digital("C", 145.500, 145.500).unwrap();
        c.digital_settings_mut().unwrap().set_color_code(2).unwrap();

        let a = handle(a);
        list.add(Rc::clone(&a), None).unwrap();
        list.add(handle(b), None).unwrap();
        list.add(handle(c), None).unwrap();

        // First inserted match wins.
        let found = list.find_digital_channel(145.500, 145.500, TimeSlot::TS1, 1).unwrap();
        assert!(Rc::ptr_eq(&found, &a));
        assert!(list.find_digital_channel(145.500, 145.500, TimeSlot::TS2, 1).is_none());
        assert!(list.find_digital_channel(145.500, 145.500, TimeSlot::TS1, 3).is_none());
    }

    #[test]
    fn find_analog_channel_by_tx_freq() {
        let list = ChannelList::new();
        let analog = handle(Channel::analog("A", 145.500, 145.550).unwrap());
        let digital = handle(Channel::digital("D", 145.550, 145.550).unwrap());
        list.add(Rc::clone(&digital), None).unwrap();
        list.add(Rc::clone(&analog), None).unwrap();

        // The digital channel on the same frequency does not match.
        let found = list.find_analog_channel_by_tx_freq(145.550).unwrap();
        assert!(Rc::ptr_eq(&found, &analog));
        assert!(list.find_analog_channel_by_tx_freq(433.000).is_none());
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn valid_frequencies_round_trip(mhz in 0.001f64..3000.0) {
                let mut ch = Channel::analog("Prop", 145.0, 145.0).unwrap();
                prop_assert!(ch.set_rx_frequency(mhz).is_ok());
                prop_assert_eq!(ch.rx_frequency(), mhz);
            }

            #[test]
            fn invalid_frequencies_leave_state_unchanged(mhz in -3000.0f64..=0.0) {
                let mut ch = Channel::analog("Prop", 145.0, 145.0).unwrap();
                prop_assert!(ch.set_rx_frequency(mhz).is_err());
                prop_assert_eq!(ch.rx_frequency(), 145.0);
            }

            #[test]
            fn vox_levels_round_trip_or_reject(level in 0u8..=30) {
                let mut ch = Channel::analog("Prop", 145.0, 145.0).unwrap();
                if level <= 10 {
                    prop_assert!(ch.set_vox(level).is_ok());
                    prop_assert_eq!(ch.vox().value(), Some(level));
                } else {
                    prop_assert!(ch.set_vox(level).is_err());
                    prop_assert!(ch.vox().is_default());
                }
            }

            #[test]
            fn color_codes_round_trip_or_reject(code in 0u8..=40) {
                let mut ch = Channel::digital("Prop", 439.0, 431.0).unwrap();
                let settings = ch.digital_settings_mut().unwrap();
                if code <= 15 {
                    prop_assert!(settings.set_color_code(code).is_ok());
                    prop_assert_eq!(settings.color_code(), code);
                } else {
                    prop_assert!(settings.set_color_code(code).is_err());
                    prop_assert_eq!(settings.color_code(), 1);
                }
            }
        }
    }
}
