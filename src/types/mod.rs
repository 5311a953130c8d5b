//! Small value types shared across the entity families.

mod tone;
mod tristate;

pub use tone::ToneCode;
pub use tristate::Tristate;
