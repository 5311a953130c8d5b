//! CTCSS / DCS selective-call tone codes for analog channels.

use serde_yaml_ng::{Mapping, Value};

use crate::error::{ConfigError, Result};

/// A CTCSS sub-audible tone or DCS code. `None` (no tone) is itself a valid
/// code, not an error state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum ToneCode {
    /// No selective call configured.
    #[default]
    None,
    /// CTCSS sub-audible tone in Hz (e.g. 67.0, 88.5, 146.2).
    Ctcss(f32),
    /// DCS code with polarity.
    Dcs { code: u16, inverted: bool },
}

impl ToneCode {
    /// Validates a CTCSS frequency. Tones live well below 300 Hz.
    pub fn ctcss(freq: f32) -> Result<Self> {
        if freq > 0.0 && freq <= 300.0 {
            Ok(ToneCode::Ctcss(freq))
        } else {
            Err(ConfigError::validation("ctcss", format!("tone frequency out of range: {freq}")))
        }
    }

    /// Validates a DCS code (three octal digits on real radios).
    pub fn dcs(code: u16, inverted: bool) -> Result<Self> {
        if code > 0 && code <= 0o777 {
            Ok(ToneCode::Dcs { code, inverted })
        } else {
            Err(ConfigError::validation("dcs", format!("DCS code out of range: {code}")))
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, ToneCode::None)
    }

    /// Node-tree form: `{ctcss: <Hz>}`, `{dcs: <code>}` (negative when
    /// inverted), or the `!none` placeholder mapping `{}` when unset.
    pub fn to_node(self) -> Value {
        let mut map = Mapping::new();
        match self {
            ToneCode::None => {}
            ToneCode::Ctcss(freq) => {
                map.insert(Value::String("ctcss".into()), Value::Number(f64::from(freq).into()));
            }
            ToneCode::Dcs { code, inverted } => {
                let signed = if inverted { -i64::from(code) } else { i64::from(code) };
                map.insert(Value::String("dcs".into()), Value::Number(signed.into()));
            }
        }
        Value::Mapping(map)
    }

    /// Parses the node-tree form; `field` names the source field in errors.
    pub fn from_node(node: &Value, field: &'static str) -> Result<Self> {
        let map = node
            .as_mapping()
            .ok_or_else(|| ConfigError::parse(field, "expected a tone mapping"))?;
        if let Some(freq) = map.get(Value::String("ctcss".into())) {
            let freq = freq
                .as_f64()
                .ok_or_else(|| ConfigError::parse(field, "ctcss frequency must be a number"))?;
            return ToneCode::ctcss(freq as f32);
        }
        if let Some(code) = map.get(Value::String("dcs".into())) {
            let code = code
                .as_i64()
                .ok_or_else(|| ConfigError::parse(field, "dcs code must be an integer"))?;
            let inverted = code < 0;
            let magnitude = u16::try_from(code.unsigned_abs())
                .map_err(|_| ConfigError::parse(field, format!("dcs code out of range: {code}")))?;
            return ToneCode::dcs(magnitude, inverted);
        }
        if map.is_empty() {
            return Ok(ToneCode::None);
        }
        Err(ConfigError::parse(field, "expected a 'ctcss' or 'dcs' key"))
    }
}
