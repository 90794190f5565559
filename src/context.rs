// bridge/src/context.rs

//! The generic settings context the bridge reads into and writes from:
//! profile name, integration switch, and a tree of typed settings keyed by
//! `(plugin, name, scope)`.

use std::{collections::BTreeMap, fmt};

use crate::{
    binding::KeyBinding,
    error::{BridgeError, Result},
    value::{SettingType, SettingValue, Value, ValueKind},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Scope { Display, Screen(u32) }

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SettingId {
    pub plugin: String,
    pub name: String,
    pub scope: Scope,
}

impl SettingId {
    pub fn new(plugin: impl Into<String>, name: impl Into<String>, scope: Scope) -> Self {
        Self { plugin: plugin.into(), name: name.into(), scope }
    }

    pub fn display(plugin: impl Into<String>, name: impl Into<String>) -> Self {
        Self::new(plugin, name, Scope::Display)
    }

    pub fn screen(plugin: impl Into<String>, name: impl Into<String>, screen: u32) -> Self {
        Self::new(plugin, name, Scope::Screen(screen))
    }

    /// Primary-store group holding this setting: `<plugin>_display` or `<plugin>_screen<N>`.
    pub fn group(&self) -> String {
        match self.scope {
            Scope::Display => format!("{}_display", self.plugin),
            Scope::Screen(n) => format!("{}_screen{}", self.plugin, n),
        }
    }
}

impl fmt::Display for SettingId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.group(), self.name)
    }
}

#[derive(Clone, Debug)]
pub struct Setting {
    id: SettingId,
    ty: SettingType,
    default: SettingValue,
    value: SettingValue,
}

impl Setting {
    pub fn new(id: SettingId, ty: SettingType, default: SettingValue) -> Result<Self> {
        if !default.conforms_to(ty) {
            return Err(BridgeError::TypeMismatch { setting: id.to_string(), expected: ty });
        }
        Ok(Self { id, ty, value: default.clone(), default })
    }

    fn scalar(id: SettingId, v: Value) -> Self {
        let ty = SettingType::Scalar(v.kind());
        let default = SettingValue::Scalar(v);
        Self { id, ty, value: default.clone(), default }
    }

    pub fn int(id: SettingId, default: i32) -> Self { Self::scalar(id, Value::Int(default)) }
    pub fn bool(id: SettingId, default: bool) -> Self { Self::scalar(id, Value::Bool(default)) }
    pub fn string(id: SettingId, default: impl Into<String>) -> Self { Self::scalar(id, Value::String(default.into())) }
    pub fn key(id: SettingId, default: KeyBinding) -> Self { Self::scalar(id, Value::Key(default)) }

    pub fn int_list(id: SettingId, default: &[i32]) -> Self {
        let default = SettingValue::int_list(default);
        Self { id, ty: SettingType::List(ValueKind::Int), value: default.clone(), default }
    }

    pub fn id(&self) -> &SettingId { &self.id }
    pub fn ty(&self) -> SettingType { self.ty }
    pub fn value(&self) -> &SettingValue { &self.value }
    pub fn default_value(&self) -> &SettingValue { &self.default }
    pub fn is_default(&self) -> bool { self.value == self.default }

    /// Assigns `value` if it matches the declared type; returns whether it did.
    pub fn set(&mut self, value: SettingValue) -> bool {
        if !value.conforms_to(self.ty) {
            return false;
        }
        self.value = value;
        true
    }

    pub fn reset_to_default(&mut self) {
        self.value = self.default.clone();
    }

    pub fn as_int(&self) -> Option<i32> {
        match self.value.as_scalar()? {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.value.as_scalar()? {
            Value::Bool(b) | Value::Bell(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_key(&self) -> Option<&KeyBinding> {
        match self.value.as_scalar()? {
            Value::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_int_list(&self) -> Option<Vec<i32>> {
        self.value
            .as_list()?
            .iter()
            .map(|v| match v {
                Value::Int(i) => Some(*i),
                _ => None,
            })
            .collect()
    }

    pub fn default_int(&self) -> Option<i32> {
        match self.default.as_scalar()? {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn default_bool(&self) -> Option<bool> {
        match self.default.as_scalar()? {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct SettingsContext {
    profile: String,
    integration: bool,
    settings: BTreeMap<SettingId, Setting>,
}

impl SettingsContext {
    pub fn new(profile: impl Into<String>) -> Self {
        Self { profile: profile.into(), integration: true, settings: BTreeMap::new() }
    }

    pub fn profile(&self) -> &str { &self.profile }
    pub fn set_profile(&mut self, profile: impl Into<String>) { self.profile = profile.into(); }

    pub fn integration_enabled(&self) -> bool { self.integration }
    pub fn set_integration_enabled(&mut self, enabled: bool) { self.integration = enabled; }

    pub fn add(&mut self, setting: Setting) {
        self.settings.insert(setting.id.clone(), setting);
    }

    pub fn get(&self, id: &SettingId) -> Option<&Setting> { self.settings.get(id) }
    pub fn get_mut(&mut self, id: &SettingId) -> Option<&mut Setting> { self.settings.get_mut(id) }

    pub fn ids(&self) -> Vec<SettingId> { self.settings.keys().cloned().collect() }
    pub fn settings(&self) -> impl Iterator<Item = &Setting> { self.settings.values() }

    /// Read-only view over the other settings of one plugin in one scope.
    pub fn siblings<'a>(&'a self, plugin: &'a str, scope: Scope) -> Siblings<'a> {
        Siblings { ctx: self, plugin, scope }
    }
}

#[derive(Clone, Copy)]
pub struct Siblings<'a> {
    ctx: &'a SettingsContext,
    plugin: &'a str,
    scope: Scope,
}

impl<'a> Siblings<'a> {
    pub fn get(&self, name: &str) -> Option<&'a Setting> {
        self.ctx.get(&SettingId::new(self.plugin, name, self.scope))
    }

    pub fn bool(&self, name: &str) -> Option<bool> { self.get(name)?.as_bool() }
    pub fn int(&self, name: &str) -> Option<i32> { self.get(name)?.as_int() }
    pub fn int_list(&self, name: &str) -> Option<Vec<i32>> { self.get(name)?.as_int_list() }
}
