use serde::{Deserialize, Serialize};

use crate::binding::{ButtonBinding, Color, Edges, KeyBinding};

/// Element kind of a setting, shared by scalars and lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind { String, Match, Int, Float, Bool, Color, Key, Button, Edge, Bell }

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettingType {
    Scalar(ValueKind),
    /// Homogeneous ordered list; the element kind never changes.
    List(ValueKind),
}

impl SettingType {
    pub fn element(&self) -> ValueKind {
        match self {
            Self::Scalar(k) | Self::List(k) => *k,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    String(String),
    Match(String),
    Int(i32),
    Float(f32),
    Bool(bool),
    Color(Color),
    Key(KeyBinding),
    Button(ButtonBinding),
    Edge(Edges),
    Bell(bool),
}

impl Value {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::String(_) => ValueKind::String,
            Self::Match(_) => ValueKind::Match,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Bool(_) => ValueKind::Bool,
            Self::Color(_) => ValueKind::Color,
            Self::Key(_) => ValueKind::Key,
            Self::Button(_) => ValueKind::Button,
            Self::Edge(_) => ValueKind::Edge,
            Self::Bell(_) => ValueKind::Bell,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SettingValue {
    Scalar(Value),
    List(Vec<Value>),
}

impl SettingValue {
    pub fn conforms_to(&self, ty: SettingType) -> bool {
        match (self, ty) {
            (Self::Scalar(v), SettingType::Scalar(k)) => v.kind() == k,
            (Self::List(items), SettingType::List(k)) => items.iter().all(|v| v.kind() == k),
            _ => false,
        }
    }

    pub fn as_scalar(&self) -> Option<&Value> {
        match self {
            Self::Scalar(v) => Some(v),
            Self::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            Self::Scalar(_) => None,
        }
    }

    pub fn int_list(values: &[i32]) -> Self {
        Self::List(values.iter().copied().map(Value::Int).collect())
    }
}

impl From<Value> for SettingValue {
    fn from(v: Value) -> Self { Self::Scalar(v) }
}
