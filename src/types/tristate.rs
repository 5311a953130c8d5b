//! Three-way default/disabled/explicit field values.

use serde_yaml_ng::Value;

use crate::error::{ConfigError, Result};

/// A channel setting that either inherits the radio-wide default, is
/// explicitly disabled, or carries an explicit value.
///
/// Modeling the three states as a tagged value keeps "explicitly set to the
/// same value as the default" distinguishable from "inherits the default",
/// and leaves no numeric sentinel that could silently mean "default".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tristate<T> {
    /// Inherit the radio-wide default.
    #[default]
    Default,
    /// Explicitly disabled.
    Disabled,
    /// Explicit value.
    Value(T),
}

impl<T: Copy> Tristate<T> {
    pub fn is_default(&self) -> bool {
        matches!(self, Tristate::Default)
    }

    pub fn is_disabled(&self) -> bool {
        matches!(self, Tristate::Disabled)
    }

    /// Returns the explicit value, if one is set.
    pub fn value(&self) -> Option<T> {
        match self {
            Tristate::Value(v) => Some(*v),
            _ => None,
        }
    }
}

impl Tristate<u32> {
    /// Node-tree scalar form: `default`, `disabled`, or the number.
    pub fn to_node(self) -> Value {
        match self {
            Tristate::Default => Value::String("default".into()),
            Tristate::Disabled => Value::String("disabled".into()),
            Tristate::Value(v) => Value::Number(v.into()),
        }
    }

    /// Parses the scalar form; `field` names the source field in errors.
    pub fn from_node(node: &Value, field: &'static str) -> Result<Self> {
        match node {
            Value::String(s) if s == "default" => Ok(Tristate::Default),
            Value::String(s) if s == "disabled" => Ok(Tristate::Disabled),
            Value::Number(n) => n
                .as_u64()
                .and_then(|v| u32::try_from(v).ok())
                .map(Tristate::Value)
                .ok_or_else(|| {
                    ConfigError::parse(field, format!("value out of range: {n}"))
                }),
            other => Err(ConfigError::parse(
                field,
                format!("expected 'default', 'disabled' or a number, got {other:?}"),
            )),
        }
    }
}

impl Tristate<u8> {
    pub fn to_node(self) -> Value {
        match self {
            Tristate::Default => Value::String("default".into()),
            Tristate::Disabled => Value::String("disabled".into()),
            Tristate::Value(v) => Value::Number(u32::from(v).into()),
        }
    }

    pub fn from_node(node: &Value, field: &'static str) -> Result<Self> {
        match Tristate::<u32>::from_node(node, field)? {
            Tristate::Default => Ok(Tristate::Default),
            Tristate::Disabled => Ok(Tristate::Disabled),
            Tristate::Value(v) => u8::try_from(v).map(Tristate::Value).map_err(|_| {
                ConfigError::parse(field, format!("value out of range: {v}"))
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_predicates() {
        assert!(Tristate::<u32>::Default.is_default());
        assert!(Tristate::<u32>::Disabled.is_disabled());
        assert_eq!(Tristate::Value(45u32).value(), Some(45));
        assert_eq!(Tristate::<u32>::Default.value(), None);
    }

    #[test]
    fn explicit_value_equal_to_default_stays_explicit() {
        // The tag, not the number, carries the default-ness.
        let explicit = Tristate::Value(3u8);
        assert!(!explicit.is_default());
        assert_ne!(explicit, Tristate::Default);
    }

    #[test]
    fn scalar_round_trip() {
        for state in [Tristate::Default, Tristate::Disabled, Tristate::Value(120u32)] {
            let node = state.to_node();
            assert_eq!(Tristate::<u32>::from_node(&node, "timeout").unwrap(), state);
        }
    }

    #[test]
    fn malformed_scalars_are_rejected() {
        let bad = Value::String("sometimes".into());
        assert!(Tristate::<u32>::from_node(&bad, "timeout").is_err());

        let negative = serde_yaml_ng::from_str::<Value>("-3").unwrap();
        assert!(Tristate::<u32>::from_node(&negative, "timeout").is_err());

        let too_big = serde_yaml_ng::from_str::<Value>("300").unwrap();
        assert!(Tristate::<u8>::from_node(&too_big, "vox").is_err());
    }
}
