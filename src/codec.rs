// bridge/src/codec.rs

//! Conversion between setting values and store entries.
//!
//! Decoding never fails loudly: `None` means "no usable value, fall back to
//! the default". Malformed list elements are dropped one at a time (colors
//! are replaced by opaque black) so one bad entry never costs the rest of
//! the list.

use toml::Value as Raw;
use tracing::debug;

use crate::{
    binding::{self, ButtonBinding, Color, KeyBinding},
    value::{SettingType, SettingValue, Value, ValueKind},
};

pub fn decode(raw: &Raw, ty: SettingType) -> Option<SettingValue> {
    match ty {
        SettingType::Scalar(kind) => decode_element(raw, kind).map(SettingValue::Scalar),
        SettingType::List(kind) => {
            let items = list_items(raw);
            if items.is_empty() {
                return None;
            }
            let decoded = items
                .iter()
                .filter_map(|item| match decode_element(item, kind) {
                    Some(v) => Some(v),
                    None if kind == ValueKind::Color => Some(Value::Color(Color::OPAQUE_BLACK)),
                    None => {
                        debug!(?kind, ?item, "skipping malformed list element");
                        None
                    }
                })
                .collect();
            Some(SettingValue::List(decoded))
        }
    }
}

pub fn encode(value: &SettingValue) -> Raw {
    match value {
        SettingValue::Scalar(v) => encode_element(v),
        SettingValue::List(items) => Raw::Array(items.iter().map(encode_element).collect()),
    }
}

fn decode_element(raw: &Raw, kind: ValueKind) -> Option<Value> {
    match kind {
        ValueKind::String => string_of(raw).map(Value::String),
        ValueKind::Match => string_of(raw).map(Value::Match),
        ValueKind::Int => int_of(raw).and_then(|i| i32::try_from(i).ok()).map(Value::Int),
        ValueKind::Float => float_of(raw).map(|f| Value::Float(f as f32)),
        ValueKind::Bool => bool_of(raw).map(Value::Bool),
        ValueKind::Bell => bool_of(raw).map(Value::Bell),
        ValueKind::Color => string_of(raw)?.parse::<Color>().ok().map(Value::Color),
        ValueKind::Key => string_of(raw)?.parse::<KeyBinding>().ok().map(Value::Key),
        ValueKind::Button => string_of(raw)?.parse::<ButtonBinding>().ok().map(Value::Button),
        ValueKind::Edge => string_of(raw).map(|s| Value::Edge(binding::parse_edges(&s))),
    }
}

fn encode_element(v: &Value) -> Raw {
    match v {
        Value::String(s) | Value::Match(s) => Raw::String(s.clone()),
        Value::Int(i) => Raw::Integer(i64::from(*i)),
        Value::Float(f) => Raw::Float(f64::from(*f)),
        Value::Bool(b) | Value::Bell(b) => Raw::Boolean(*b),
        Value::Color(c) => Raw::String(c.to_string()),
        Value::Key(k) => Raw::String(k.to_string()),
        Value::Button(b) => Raw::String(b.to_string()),
        Value::Edge(e) => Raw::String(binding::edges_to_string(*e)),
    }
}

/// Arrays as-is; a plain string is read as a comma-separated list.
fn list_items(raw: &Raw) -> Vec<Raw> {
    match raw {
        Raw::Array(items) => items.clone(),
        Raw::String(s) if s.trim().is_empty() => Vec::new(),
        Raw::String(s) => s.split(',').map(|p| Raw::String(p.trim().to_string())).collect(),
        other => vec![other.clone()],
    }
}

pub(crate) fn int_of(raw: &Raw) -> Option<i64> {
    match raw {
        Raw::Integer(i) => Some(*i),
        Raw::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn float_of(raw: &Raw) -> Option<f64> {
    match raw {
        Raw::Float(f) => Some(*f),
        Raw::Integer(i) => Some(*i as f64),
        Raw::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub(crate) fn bool_of(raw: &Raw) -> Option<bool> {
    match raw {
        Raw::Boolean(b) => Some(*b),
        Raw::Integer(i) => Some(*i != 0),
        Raw::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" | "on" => Some(true),
            "false" | "0" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub(crate) fn string_of(raw: &Raw) -> Option<String> {
    match raw {
        Raw::String(s) => Some(s.clone()),
        Raw::Integer(i) => Some(i.to_string()),
        Raw::Float(f) => Some(f.to_string()),
        Raw::Boolean(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn string_list_of(raw: &Raw) -> Option<Vec<String>> {
    match raw {
        Raw::Array(_) | Raw::String(_) => Some(list_items(raw).iter().filter_map(string_of).collect()),
        _ => None,
    }
}
