// bridge/src/rules.rs

//! Derivation rules for integrated settings that are not a 1:1 copy of an
//! external key.
//!
//! `forward` computes a setting value from the external stores; `None`
//! leaves the setting as it is. `reverse` pushes a setting value (and, where
//! the rule needs them, its sibling settings) out to the external stores.

use tracing::debug;

use crate::{
    binding::KeyBinding,
    context::{Setting, Siblings},
    integration::IntegratedOption,
    store::StoreSet,
    value::{SettingValue, Value},
};

const WINDOWS: &str = "Windows";
const TAB_BOX: &str = "TabBox";
const PLACEMENTS: [&str; 5] = ["Cascade", "Centered", "Smart", "Maximizing", "Random"];

/// What a forward derivation may look at.
pub struct ReadIo<'a> {
    pub stores: &'a StoreSet,
    /// Primary-store group of the setting being derived.
    pub group: &'a str,
    pub option: &'a IntegratedOption,
}

/// What a reverse derivation may touch.
pub struct WriteIo<'a> {
    pub stores: &'a mut StoreSet,
    pub group: &'a str,
    pub option: &'a IntegratedOption,
}

pub trait Derivation: Sync {
    fn name(&self) -> &'static str;

    fn forward(&self, io: &ReadIo<'_>, setting: &Setting) -> Option<SettingValue>;

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, siblings: &Siblings<'_>);

    /// One-way rules are read from the session but never written back.
    fn read_only(&self) -> bool {
        false
    }
}

fn shadow_key(setting: &str) -> String {
    format!("{setting} (Integrated)")
}

fn session_int(stores: &StoreSet, key: &str) -> i64 {
    stores.session().read_int(WINDOWS, key).unwrap_or(0)
}

/// First chord of the active field of a key-binding entry.
pub fn read_shortcut(stores: &StoreSet, group: &str, key: &str) -> Option<KeyBinding> {
    let entry = stores.shortcuts().read_string_list(group, key)?;
    if entry.len() != 3 {
        debug!(group, key, len = entry.len(), "ignoring malformed shortcut entry");
        return None;
    }
    let first = entry[0].split(' ').next().unwrap_or("");
    KeyBinding::from_shortcut(first)
}

/// Replaces the first chord of the active field, leaving alternates and the
/// default and friendly fields alone. Returns whether the store changed.
pub fn write_shortcut(stores: &mut StoreSet, group: &str, key: &str, binding: &KeyBinding) -> bool {
    let chord = binding.to_shortcut();
    let entry = match stores.shortcuts().read_string_list(group, key) {
        None => vec![chord, "none".to_string(), key.to_string()],
        Some(mut entry) if entry.len() == 3 => {
            let active = {
                let mut chords: Vec<&str> = entry[0].split(' ').collect();
                chords[0] = &chord;
                chords.join(" ")
            };
            entry[0] = active;
            entry
        }
        Some(entry) => {
            debug!(group, key, len = entry.len(), "not rewriting malformed shortcut entry");
            return false;
        }
    };
    stores.write_shortcut(group, key, entry)
}

/// Key settings the desktop has no equivalent for: always read back as an
/// empty chord, whatever the default.
pub struct ClearedKey;

impl Derivation for ClearedKey {
    fn name(&self) -> &'static str { "cleared-key" }

    fn forward(&self, _io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        Some(Value::Key(KeyBinding::default()).into())
    }

    fn reverse(&self, _io: &mut WriteIo<'_>, _setting: &Setting, _siblings: &Siblings<'_>) {}

    fn read_only(&self) -> bool { true }
}

pub struct FixedString {
    pub value: &'static str,
}

impl Derivation for FixedString {
    fn name(&self) -> &'static str { "fixed-string" }

    fn forward(&self, _io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        Some(Value::String(self.value.to_string()).into())
    }

    fn reverse(&self, _io: &mut WriteIo<'_>, _setting: &Setting, _siblings: &Siblings<'_>) {}

    fn read_only(&self) -> bool { true }
}

pub struct ClickToFocus;

impl Derivation for ClickToFocus {
    fn name(&self) -> &'static str { "focus-policy" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let policy = io.stores.session().read_string(WINDOWS, "FocusPolicy");
        Some(Value::Bool(policy.as_deref() == Some("ClickToFocus")).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, _siblings: &Siblings<'_>) {
        let Some(click) = setting.as_bool() else { return };
        let policy = if click { "ClickToFocus" } else { "FocusFollowsMouse" };
        io.stores.write_session(WINDOWS, "FocusPolicy", policy);
    }
}

/// Resize mode: 0 normal, 1 outline, 2 rectangle, 3 stretch. The session
/// only knows opaque versus transparent, so the exact value lives in a
/// shadow key of the primary store.
pub struct ResizeMode;

impl Derivation for ResizeMode {
    fn name(&self) -> &'static str { "resize-mode" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let mode = io.stores.session().read_string(WINDOWS, "ResizeMode");
        let shadow = io.stores.primary().read_int(io.group, &shadow_key(io.option.setting));
        let value = match mode.as_deref() {
            Some("Opaque") if shadow == Some(3) => 3,
            Some("Transparent") if shadow == Some(2) => 2,
            Some("Transparent") => 1,
            _ => 0,
        };
        Some(Value::Int(value).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, _siblings: &Siblings<'_>) {
        let Some(value) = setting.as_int() else { return };
        let mode = if matches!(value, 1 | 2) { "Transparent" } else { "Opaque" };
        io.stores.write_session(WINDOWS, "ResizeMode", mode);
        io.stores.write_primary(io.group, &shadow_key(io.option.setting), i64::from(value));
    }
}

/// Writes both snap zones from the snap plugin's categories and distance.
fn write_snap_zones(io: &mut WriteIo<'_>, siblings: &Siblings<'_>) {
    let (Some(categories), Some(distance)) =
        (siblings.int_list("edges_categories"), siblings.int("resistance_distance"))
    else {
        debug!(group = io.group, "snap siblings missing, zones untouched");
        return;
    };
    let distance = i64::from(distance);
    let border = if categories.contains(&0) { distance } else { 0 };
    let window = if categories.contains(&1) { distance } else { 0 };
    io.stores.write_session(WINDOWS, "BorderSnapZone", border);
    io.stores.write_session(WINDOWS, "WindowSnapZone", window);
    io.stores.write_primary(io.group, &shadow_key("snap_distance"), distance);
}

pub struct SnapDistance {
    pub read_only: bool,
}

impl Derivation for SnapDistance {
    fn name(&self) -> &'static str { "snap-distance" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let zone = session_int(io.stores, "WindowSnapZone").max(session_int(io.stores, "BorderSnapZone"));
        let distance = if zone > 0 {
            zone
        } else {
            io.stores.primary().read_int(io.group, &shadow_key("snap_distance")).unwrap_or(0)
        };
        if distance <= 0 {
            return None;
        }
        i32::try_from(distance).ok().map(|d| Value::Int(d).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, _setting: &Setting, siblings: &Siblings<'_>) {
        write_snap_zones(io, siblings);
    }

    fn read_only(&self) -> bool { self.read_only }
}

/// Snap categories: 0 snaps to screen edges, 1 to other windows.
pub struct SnapCategories;

impl Derivation for SnapCategories {
    fn name(&self) -> &'static str { "snap-categories" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let mut categories = Vec::with_capacity(2);
        if session_int(io.stores, "BorderSnapZone") > 0 {
            categories.push(0);
        }
        if session_int(io.stores, "WindowSnapZone") > 0 {
            categories.push(1);
        }
        Some(SettingValue::int_list(&categories))
    }

    fn reverse(&self, io: &mut WriteIo<'_>, _setting: &Setting, siblings: &Siblings<'_>) {
        write_snap_zones(io, siblings);
    }
}

pub struct SnapType;

impl Derivation for SnapType {
    fn name(&self) -> &'static str { "snap-type" }

    fn forward(&self, _io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        Some(SettingValue::int_list(&[0, 1]))
    }

    fn reverse(&self, _io: &mut WriteIo<'_>, _setting: &Setting, _siblings: &Siblings<'_>) {}

    fn read_only(&self) -> bool { true }
}

/// `ElectricBorders`: 0 off, 1 only while moving a window, 2 always.
pub struct EdgeFlipPointer;

impl Derivation for EdgeFlipPointer {
    fn name(&self) -> &'static str { "edge-flip-pointer" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let key = io.option.external_key?;
        Some(Value::Bool(session_int(io.stores, key) > 1).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, siblings: &Siblings<'_>) {
        let (Some(key), Some(on)) = (io.option.external_key, setting.as_bool()) else { return };
        let value = if on {
            2
        } else {
            let window = siblings
                .bool("edge_flip_window")
                .or_else(|| siblings.bool("edgeflip_move"))
                .unwrap_or(false);
            i64::from(window)
        };
        io.stores.write_session(WINDOWS, key, value);
    }
}

pub struct EdgeFlipWindow;

impl Derivation for EdgeFlipWindow {
    fn name(&self) -> &'static str { "edge-flip-window" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let key = io.option.external_key?;
        Some(Value::Bool(session_int(io.stores, key) > 0).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, _siblings: &Siblings<'_>) {
        let (Some(key), Some(on)) = (io.option.external_key, setting.as_bool()) else { return };
        let value = if on { session_int(io.stores, key).max(1) } else { 0 };
        io.stores.write_session(WINDOWS, key, value);
    }
}

/// Window placement strategy, stored by name in the session.
pub struct Placement;

impl Derivation for Placement {
    fn name(&self) -> &'static str { "placement" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let key = io.option.external_key?;
        let name = io.stores.session().read_string(WINDOWS, key);
        let index = name
            .and_then(|n| PLACEMENTS.iter().position(|p| *p == n))
            .unwrap_or(0);
        i32::try_from(index).ok().map(|i| Value::Int(i).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, _siblings: &Siblings<'_>) {
        let (Some(key), Some(value)) = (io.option.external_key, setting.as_int()) else { return };
        let Some(name) = usize::try_from(value).ok().and_then(|i| PLACEMENTS.get(i)) else {
            debug!(value, "placement out of range, not written");
            return;
        };
        io.stores.write_session(WINDOWS, key, *name);
    }
}

/// Window-switcher keys. The chord itself is a shortcut entry; writing a
/// non-empty chord also selects the switcher style and desktop traversal.
pub struct AltTab {
    pub traverse_all: Option<bool>,
    pub style: &'static str,
}

impl AltTab {
    pub const CURRENT_DESKTOP: AltTab = AltTab { traverse_all: Some(false), style: "KDE" };
    pub const ALL_DESKTOPS: AltTab = AltTab { traverse_all: Some(true), style: "KDE" };
    pub const NO_POPUP: AltTab = AltTab { traverse_all: None, style: "CDE" };
}

impl Derivation for AltTab {
    fn name(&self) -> &'static str { "alt-tab" }

    fn forward(&self, io: &ReadIo<'_>, _setting: &Setting) -> Option<SettingValue> {
        let key = io.option.external_key?;
        read_shortcut(io.stores, io.option.group, key).map(|k| Value::Key(k).into())
    }

    fn reverse(&self, io: &mut WriteIo<'_>, setting: &Setting, _siblings: &Siblings<'_>) {
        let (Some(key), Some(binding)) = (io.option.external_key, setting.as_key()) else { return };
        if binding.is_empty() {
            return;
        }
        write_shortcut(io.stores, io.option.group, key, binding);
        if let Some(all) = self.traverse_all {
            io.stores.write_session(TAB_BOX, "TraverseAll", all);
        }
        io.stores.write_session(WINDOWS, "AltTabStyle", self.style);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        binding::Modifiers,
        context::{SettingId, SettingsContext},
        integration,
        store::ConfigFile,
    };
    use rstest::rstest;

    fn stores(dir: &std::path::Path) -> StoreSet {
        StoreSet::new(
            ConfigFile::open(dir.join("compizrc")).unwrap(),
            ConfigFile::open(dir.join("kwinrc")).unwrap(),
            ConfigFile::open(dir.join("kglobalshortcutsrc")).unwrap(),
        )
    }

    fn forward(stores: &StoreSet, plugin: &str, name: &str, setting: &Setting) -> Option<SettingValue> {
        let option = integration::lookup(plugin, name).unwrap();
        let integration::Kind::Derived(rule) = option.kind else { panic!("not derived") };
        let group = setting.id().group();
        rule.forward(&ReadIo { stores, group: &group, option }, setting)
    }

    fn reverse(stores: &mut StoreSet, ctx: &SettingsContext, id: &SettingId) {
        let option = integration::lookup(&id.plugin, &id.name).unwrap();
        let integration::Kind::Derived(rule) = option.kind else { panic!("not derived") };
        let group = id.group();
        let setting = ctx.get(id).unwrap();
        let siblings = ctx.siblings(&id.plugin, id.scope);
        rule.reverse(&mut WriteIo { stores, group: &group, option }, setting, &siblings);
    }

    #[rstest]
    #[case("Cascade", 0)]
    #[case("Centered", 1)]
    #[case("Smart", 2)]
    #[case("Maximizing", 3)]
    #[case("Random", 4)]
    #[case("Somewhere", 0)]
    fn placement_names_map_to_indices(#[case] name: &str, #[case] index: i32) {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        s.write_session(WINDOWS, "Placement", name);
        let setting = Setting::int(SettingId::screen("place", "mode", 0), 0);
        assert_eq!(forward(&s, "place", "mode", &setting), Some(Value::Int(index).into()));
    }

    #[test]
    fn placement_out_of_range_is_not_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let mut ctx = SettingsContext::new("");
        let id = SettingId::screen("place", "mode", 0);
        ctx.add(Setting::int(id.clone(), 7));
        reverse(&mut s, &ctx, &id);
        assert!(!s.session().has_key(WINDOWS, "Placement"));
        assert!(!s.is_modified());
    }

    #[rstest]
    #[case(true, false, 2)]
    #[case(false, true, 1)]
    #[case(false, false, 0)]
    fn edge_flip_pointer_writes(#[case] pointer: bool, #[case] window: bool, #[case] expected: i64) {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let mut ctx = SettingsContext::new("");
        let id = SettingId::screen("rotate", "edge_flip_pointer", 0);
        ctx.add(Setting::bool(id.clone(), pointer));
        ctx.add(Setting::bool(SettingId::screen("rotate", "edge_flip_window", 0), window));
        reverse(&mut s, &ctx, &id);
        assert_eq!(s.session().read_int(WINDOWS, "ElectricBorders"), Some(expected));
    }

    #[test]
    fn edge_flip_window_keeps_pointer_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        s.write_session(WINDOWS, "ElectricBorders", 2i64);
        let mut ctx = SettingsContext::new("");
        let id = SettingId::screen("wall", "edgeflip_move", 0);
        ctx.add(Setting::bool(id.clone(), true));
        reverse(&mut s, &ctx, &id);
        assert_eq!(s.session().read_int(WINDOWS, "ElectricBorders"), Some(2));

        ctx.get_mut(&id).unwrap().set(Value::Bool(false).into());
        reverse(&mut s, &ctx, &id);
        assert_eq!(s.session().read_int(WINDOWS, "ElectricBorders"), Some(0));
    }

    #[test]
    fn snap_distance_prefers_zones_then_shadow() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let setting = Setting::int(SettingId::screen("snap", "resistance_distance", 0), 20);
        assert_eq!(forward(&s, "snap", "resistance_distance", &setting), None);

        s.write_primary("snap_screen0", "snap_distance (Integrated)", 12i64);
        assert_eq!(forward(&s, "snap", "resistance_distance", &setting), Some(Value::Int(12).into()));

        s.write_session(WINDOWS, "BorderSnapZone", 4i64);
        s.write_session(WINDOWS, "WindowSnapZone", 9i64);
        assert_eq!(forward(&s, "snap", "resistance_distance", &setting), Some(Value::Int(9).into()));
    }

    #[test]
    fn snap_categories_follow_zone_magnitudes() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let setting = Setting::int_list(SettingId::screen("snap", "edges_categories", 0), &[]);
        s.write_session(WINDOWS, "BorderSnapZone", 0i64);
        s.write_session(WINDOWS, "WindowSnapZone", 5i64);
        assert_eq!(forward(&s, "snap", "edges_categories", &setting), Some(SettingValue::int_list(&[1])));
    }

    #[test]
    fn alt_tab_sets_style_only_for_real_chords() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let mut ctx = SettingsContext::new("");
        let id = SettingId::display("switcher", "next_all_key");
        ctx.add(Setting::key(id.clone(), KeyBinding::default()));
        reverse(&mut s, &ctx, &id);
        assert!(!s.is_modified());

        ctx.get_mut(&id).unwrap().set(Value::Key(KeyBinding::new("Tab", Modifiers::ALT)).into());
        reverse(&mut s, &ctx, &id);
        assert_eq!(
            s.shortcuts().read_string_list("kwin", "Walk Through Windows").unwrap(),
            vec!["Alt+Tab", "none", "Walk Through Windows"]
        );
        assert_eq!(s.session().read_bool(TAB_BOX, "TraverseAll"), Some(true));
        assert_eq!(s.session().read_string(WINDOWS, "AltTabStyle").as_deref(), Some("KDE"));
    }

    #[rstest]
    #[case("next_key", Some(false), "KDE")]
    #[case("prev_key", Some(false), "KDE")]
    #[case("prev_all_key", Some(true), "KDE")]
    #[case("next_no_popup_key", None, "CDE")]
    #[case("prev_no_popup_key", None, "CDE")]
    fn alt_tab_variants_set_traversal_and_style(
        #[case] name: &str,
        #[case] traverse_all: Option<bool>,
        #[case] style: &str,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let mut ctx = SettingsContext::new("");
        let id = SettingId::display("switcher", name);
        ctx.add(Setting::key(id.clone(), KeyBinding::new("Tab", Modifiers::ALT | Modifiers::SHIFT)));
        reverse(&mut s, &ctx, &id);
        assert!(s.is_modified());
        assert_eq!(s.session().read_bool(TAB_BOX, "TraverseAll"), traverse_all);
        assert_eq!(s.session().read_string(WINDOWS, "AltTabStyle").as_deref(), Some(style));
    }

    #[test]
    fn modifier_only_alt_tab_chord_is_written() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let mut ctx = SettingsContext::new("");
        let id = SettingId::display("switcher", "next_no_popup_key");
        let chord = KeyBinding { keysym: None, modifiers: Modifiers::SUPER };
        ctx.add(Setting::key(id.clone(), chord.clone()));
        reverse(&mut s, &ctx, &id);
        assert!(s.is_modified());
        assert_eq!(s.session().read_string(WINDOWS, "AltTabStyle").as_deref(), Some("CDE"));
        assert_eq!(
            s.shortcuts().read_string_list("kwin", "Walk Through Windows").unwrap(),
            vec!["Meta", "none", "Walk Through Windows"]
        );
        assert_eq!(read_shortcut(&s, "kwin", "Walk Through Windows"), Some(chord));
    }

    #[rstest]
    #[case(0, false, false)]
    #[case(1, false, true)]
    #[case(2, true, true)]
    fn edge_flip_thresholds(#[case] borders: i64, #[case] pointer: bool, #[case] window: bool) {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        s.write_session(WINDOWS, "ElectricBorders", borders);
        let p = Setting::bool(SettingId::screen("rotate", "edge_flip_pointer", 0), false);
        let w = Setting::bool(SettingId::screen("wall", "edgeflip_move", 0), false);
        assert_eq!(forward(&s, "rotate", "edge_flip_pointer", &p), Some(Value::Bool(pointer).into()));
        assert_eq!(forward(&s, "wall", "edgeflip_move", &w), Some(Value::Bool(window).into()));
    }

    #[test]
    fn cleared_key_ignores_default() {
        let dir = tempfile::tempdir().unwrap();
        let s = stores(dir.path());
        let setting = Setting::key(
            SettingId::display("core", "unmaximize_window_key"),
            KeyBinding::new("F5", Modifiers::ALT),
        );
        assert_eq!(
            forward(&s, "core", "unmaximize_window_key", &setting),
            Some(Value::Key(KeyBinding::default()).into())
        );
    }

    #[test]
    fn shortcut_write_keeps_alternates() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        let entry = vec!["Alt+F4 Ctrl+Q".to_string(), "Alt+F4".into(), "Close Window".into()];
        s.write_shortcut("kwin", "Window Close", entry);
        let binding = KeyBinding::new("F4", Modifiers::CONTROL | Modifiers::ALT);
        assert!(write_shortcut(&mut s, "kwin", "Window Close", &binding));
        assert_eq!(
            s.shortcuts().read_string_list("kwin", "Window Close").unwrap(),
            vec!["Ctrl+Alt+F4 Ctrl+Q", "Alt+F4", "Close Window"]
        );
        assert_eq!(read_shortcut(&s, "kwin", "Window Close"), Some(binding));
    }

    #[test]
    fn malformed_shortcut_entry_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = stores(dir.path());
        s.write_shortcut("kwin", "Window Close", vec!["Alt+F4".to_string()]);
        s.clear_modified();
        assert_eq!(read_shortcut(&s, "kwin", "Window Close"), None);
        assert!(!write_shortcut(&mut s, "kwin", "Window Close", &KeyBinding::new("q", Modifiers::CONTROL)));
        assert!(!s.is_modified());
    }
}
