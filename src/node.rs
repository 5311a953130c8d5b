//! Internal helpers for reading node-tree mappings during populate.

use serde_yaml_ng::{Mapping, Value};

use crate::error::{ConfigError, Result};

pub(crate) fn key(name: &str) -> Value {
    Value::String(name.to_string())
}

pub(crate) fn as_map<'a>(node: &'a Value, context: &str) -> Result<&'a Mapping> {
    node.as_mapping().ok_or_else(|| ConfigError::parse(context, "expected a mapping"))
}

pub(crate) fn req<'a>(map: &'a Mapping, field: &'static str) -> Result<&'a Value> {
    map.get(key(field))
        .ok_or_else(|| ConfigError::parse(field, "required field is missing"))
}

pub(crate) fn req_str<'a>(map: &'a Mapping, field: &'static str) -> Result<&'a str> {
    req(map, field)?
        .as_str()
        .ok_or_else(|| ConfigError::parse(field, "expected a string"))
}

pub(crate) fn req_f64(map: &Mapping, field: &'static str) -> Result<f64> {
    req(map, field)?
        .as_f64()
        .ok_or_else(|| ConfigError::parse(field, "expected a number"))
}

pub(crate) fn req_u64(map: &Mapping, field: &'static str) -> Result<u64> {
    req(map, field)?
        .as_u64()
        .ok_or_else(|| ConfigError::parse(field, "expected a non-negative integer"))
}

pub(crate) fn opt<'a>(map: &'a Mapping, field: &str) -> Option<&'a Value> {
    map.get(key(field))
}

pub(crate) fn opt_bool(map: &Mapping, field: &'static str, default: bool) -> Result<bool> {
    match opt(map, field) {
        None => Ok(default),
        Some(v) => v.as_bool().ok_or_else(|| ConfigError::parse(field, "expected a boolean")),
    }
}

pub(crate) fn opt_str<'a>(map: &'a Mapping, field: &'static str) -> Result<Option<&'a str>> {
    match opt(map, field) {
        None => Ok(None),
        Some(v) => v
            .as_str()
            .map(Some)
            .ok_or_else(|| ConfigError::parse(field, "expected a string")),
    }
}
