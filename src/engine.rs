// bridge/src/engine.rs

//! Per-setting read and write: route each setting either to the primary
//! store or, when it is integrated, to the desktop-session stores.

use tracing::{debug, trace};

use crate::{
    codec,
    context::{Setting, SettingId, SettingsContext},
    integration::{self, IntegratedOption, Kind},
    rules::{self, ReadIo, WriteIo},
    store::StoreSet,
    value::{SettingValue, Value},
};

enum Update {
    Keep,
    Reset,
    Set(SettingValue),
}

/// Refreshes one setting from the stores.
pub fn read_setting(stores: &StoreSet, ctx: &mut SettingsContext, id: &SettingId) {
    let Some(setting) = ctx.get(id) else {
        debug!(%id, "read of unknown setting");
        return;
    };
    let group = id.group();
    let update = match integration::integrated_option(ctx, id) {
        Some(option) => read_integrated(stores, &group, option, setting),
        None => read_plain(stores, &group, setting),
    };
    let Some(setting) = ctx.get_mut(id) else { return };
    match update {
        Update::Keep => {}
        Update::Reset => setting.reset_to_default(),
        Update::Set(value) => {
            if !setting.set(value) {
                debug!(%id, "derived value has the wrong type, keeping current");
            }
        }
    }
}

fn read_plain(stores: &StoreSet, group: &str, setting: &Setting) -> Update {
    let name = &setting.id().name;
    let Some(raw) = stores.primary().entry(group, name) else {
        return Update::Reset;
    };
    match codec::decode(raw, setting.ty()) {
        Some(value) => Update::Set(value),
        None => {
            debug!(id = %setting.id(), "unusable stored value, resetting to default");
            Update::Reset
        }
    }
}

fn read_integrated(stores: &StoreSet, group: &str, option: &IntegratedOption, setting: &Setting) -> Update {
    trace!(id = %setting.id(), kind = ?option.kind, "reading integrated setting");
    let value = match (option.kind, option.external_key) {
        (Kind::Int, Some(key)) => stores
            .session()
            .read_int(option.group, key)
            .and_then(|v| i32::try_from(v).ok())
            .or(setting.default_int())
            .map(|v| Value::Int(v).into()),
        (Kind::Bool, Some(key)) => stores
            .session()
            .read_bool(option.group, key)
            .or(setting.default_bool())
            .map(|v| Value::Bool(v).into()),
        (Kind::Key, Some(key)) => {
            rules::read_shortcut(stores, option.group, key).map(|k| Value::Key(k).into())
        }
        (Kind::Derived(rule), _) => rule.forward(&ReadIo { stores, group, option }, setting),
        (_, None) => None,
    };
    value.map_or(Update::Keep, Update::Set)
}

/// Pushes one setting out to the stores.
pub fn write_setting(stores: &mut StoreSet, ctx: &SettingsContext, id: &SettingId) {
    let Some(setting) = ctx.get(id) else {
        debug!(%id, "write of unknown setting");
        return;
    };
    let group = id.group();
    match integration::integrated_option(ctx, id) {
        Some(option) => write_integrated(stores, ctx, &group, option, setting),
        None => {
            stores.write_primary(&group, &id.name, codec::encode(setting.value()));
        }
    }
}

fn write_integrated(
    stores: &mut StoreSet,
    ctx: &SettingsContext,
    group: &str,
    option: &IntegratedOption,
    setting: &Setting,
) {
    match (option.kind, option.external_key) {
        (Kind::Int, Some(key)) => {
            if let Some(v) = setting.as_int() {
                stores.write_session(option.group, key, i64::from(v));
            }
        }
        (Kind::Bool, Some(key)) => {
            if let Some(v) = setting.as_bool() {
                stores.write_session(option.group, key, v);
            }
        }
        (Kind::Key, Some(key)) => {
            if let Some(binding) = setting.as_key() {
                rules::write_shortcut(stores, option.group, key, binding);
            }
        }
        (Kind::Derived(rule), _) => {
            if rule.read_only() {
                trace!(id = %setting.id(), "read-only setting, not written");
                return;
            }
            let id = setting.id();
            let siblings = ctx.siblings(&id.plugin, id.scope);
            rule.reverse(&mut WriteIo { stores, group, option }, setting, &siblings);
        }
        (_, None) => {}
    }
}
