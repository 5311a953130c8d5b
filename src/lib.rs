//! Type-safe in-memory object model for radio codeplug configurations.
//!
//! Codeplug keeps a whole radio configuration — channels, contacts, zones,
//! scan lists, positioning systems, roaming zones and radio identities — as a
//! live object graph with first-class cross-references.
//!
//! # Features
//!
//! - **Closed entity variants**: analog/digital channels and DTMF/DMR
//!   contacts are sum types, not downcasts
//! - **Lifecycle-aware references**: destroying an entity invalidates every
//!   reference to it before the destroying call returns
//! - **Single ownership**: adding an entity to a second list releases it from
//!   the first, synchronously
//! - **YAML round trip**: id-based node-tree serialization with order-free
//!   cross-reference resolution
//!
//! # Quick Start
//!
//! ```rust
//! use codeplug::{CallType, Channel, Config, Contact, handle};
//!
//! fn main() -> codeplug::Result<()> {
//!     let config = Config::new();
//!
//!     let ww = handle(Contact::digital("Worldwide", CallType::GroupCall, 91, false)?);
//!     config.contacts().add(ww.clone(), None)?;
//!
//!     let mut channel = Channel::digital("TG91 Berlin", 439.563, 431.963)?;
//!     channel.digital_settings_mut().unwrap().tx_contact().set(Some(&ww))?;
//!     config.channels().add(handle(channel), None)?;
//!
//!     println!("{}", config.to_yaml()?);
//!     Ok(())
//! }
//! ```

// Core types and error handling
mod crc32;
mod error;
mod events;
mod item;
mod node;
pub mod types;

// Reference and collection machinery
mod collection;
mod context;
mod reference;

// Entity families
mod channel;
mod config;
mod contact;
mod grouplist;
mod positioning;
mod radioid;
mod roaming;
mod scanlist;
mod zone;

// Core exports
pub use crc32::Crc32;
pub use error::{ConfigError, Result};
pub use events::{EntityEvent, EntityId, EventHub, Subscription};
pub use item::{handle, ConfigItem, Handle, ItemExt, Meta};
pub use types::{ToneCode, Tristate};

// Reference and collection exports
pub use collection::{ConfigList, ListEvent, ListObserver};
pub use context::Context;
pub use reference::{EntityRef, RefEvent, RefList, RefObserver};

// Entity exports
pub use channel::{
    AnalogAdmit, AnalogSettings, Bandwidth, Channel, ChannelList, ChannelMode, DigitalAdmit,
    DigitalSettings, Power, TimeSlot,
};
pub use config::Config;
pub use contact::{CallType, Contact, ContactDetail, ContactList};
pub use grouplist::GroupList;
pub use positioning::{PositioningMode, PositioningSystem};
pub use radioid::RadioId;
pub use roaming::RoamingZone;
pub use scanlist::ScanList;
pub use zone::Zone;
