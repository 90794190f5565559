// bridge/src/integration.rs

//! Which settings are mirrored from the desktop-session stores instead of
//! the primary store, and how.
//!
//! The table is ordered; when two rows name the same `(plugin, setting)`
//! the first one wins.

use once_cell::sync::Lazy;
use serde::Serialize;
use std::{collections::HashMap, fmt};

use crate::{
    context::{SettingId, SettingsContext},
    rules::{self, Derivation},
};

const CORE: &str = "core";
const KWIN: &str = "kwin";
const WINDOWS: &str = "Windows";
const DESKTOPS: &str = "Desktops";

#[derive(Clone, Copy)]
pub enum Kind {
    /// Integer copied 1:1 from the session-config store.
    Int,
    /// Boolean copied 1:1 from the session-config store.
    Bool,
    /// Key chord copied 1:1 from the key-binding store.
    Key,
    Derived(&'static dyn Derivation),
}

impl Kind {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Int => "int",
            Self::Bool => "bool",
            Self::Key => "key",
            Self::Derived(rule) => rule.name(),
        }
    }
}

impl fmt::Debug for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct IntegratedOption {
    pub setting: &'static str,
    pub plugin: &'static str,
    /// `None` only for rows that are pure logic with no 1:1 external key.
    pub external_key: Option<&'static str>,
    pub group: &'static str,
    pub kind: Kind,
}

impl IntegratedOption {
    pub fn read_only(&self) -> bool {
        matches!(self.kind, Kind::Derived(rule) if rule.read_only())
    }

    pub fn describe(&self) -> OptionRow {
        OptionRow {
            plugin: self.plugin,
            setting: self.setting,
            group: self.group,
            external_key: self.external_key,
            kind: self.kind.label(),
            read_only: self.read_only(),
        }
    }
}

/// Serializable view of one table row.
#[derive(Clone, Debug, Serialize)]
pub struct OptionRow {
    pub plugin: &'static str,
    pub setting: &'static str,
    pub group: &'static str,
    pub external_key: Option<&'static str>,
    pub kind: &'static str,
    pub read_only: bool,
}

const fn key(setting: &'static str, plugin: &'static str, name: &'static str) -> IntegratedOption {
    IntegratedOption { setting, plugin, external_key: Some(name), group: KWIN, kind: Kind::Key }
}

const fn boolean(setting: &'static str, plugin: &'static str, name: &'static str) -> IntegratedOption {
    IntegratedOption { setting, plugin, external_key: Some(name), group: WINDOWS, kind: Kind::Bool }
}

const fn int(setting: &'static str, plugin: &'static str, name: &'static str, group: &'static str) -> IntegratedOption {
    IntegratedOption { setting, plugin, external_key: Some(name), group, kind: Kind::Int }
}

const fn derived(
    setting: &'static str,
    plugin: &'static str,
    name: Option<&'static str>,
    group: &'static str,
    rule: &'static dyn Derivation,
) -> IntegratedOption {
    IntegratedOption { setting, plugin, external_key: name, group, kind: Kind::Derived(rule) }
}

pub static OPTIONS: &[IntegratedOption] = &[
    key("close_window_key", CORE, "Window Close"),
    key("lower_window_key", CORE, "Window Lower"),
    key("toggle_window_maximized_key", CORE, "Window Maximize"),
    key("minimize_window_key", CORE, "Window Minimize"),
    key("toggle_window_maximized_horizontally_key", CORE, "Window Maximize Horizontal"),
    key("toggle_window_maximized_vertically_key", CORE, "Window Maximize Vertical"),
    key("window_menu_key", CORE, "Window Operations Menu"),
    key("toggle_window_shaded_key", CORE, "Window Shade"),
    key("raise_window_key", CORE, "Window Raise"),
    key("toggle_window_fullscreen_key", CORE, "Window Fullscreen"),
    key("run_command11_key", "commands", "Kill Window"),
    key("initiate_key", "move", "Window Move"),
    key("initiate_key", "resize", "Window Resize"),
    key("rotate_right_key", "rotate", "Switch to Next Desktop"),
    key("rotate_left_key", "rotate", "Switch to Previous Desktop"),
    key("rotate_to_1_key", "rotate", "Switch to Desktop 1"),
    key("rotate_to_2_key", "rotate", "Switch to Desktop 2"),
    key("rotate_to_3_key", "rotate", "Switch to Desktop 3"),
    key("rotate_to_4_key", "rotate", "Switch to Desktop 4"),
    key("rotate_to_5_key", "rotate", "Switch to Desktop 5"),
    key("rotate_to_6_key", "rotate", "Switch to Desktop 6"),
    key("rotate_to_7_key", "rotate", "Switch to Desktop 7"),
    key("rotate_to_8_key", "rotate", "Switch to Desktop 8"),
    key("rotate_to_9_key", "rotate", "Switch to Desktop 9"),
    key("rotate_to_10_key", "rotate", "Switch to Desktop 10"),
    key("rotate_to_11_key", "rotate", "Switch to Desktop 11"),
    key("rotate_to_12_key", "rotate", "Switch to Desktop 12"),
    key("rotate_right_window_key", "rotate", "Window to Next Desktop"),
    key("rotate_left_window_key", "rotate", "Window to Previous Desktop"),
    key("rotate_to_1_window_key", "rotate", "Window to Desktop 1"),
    key("rotate_to_2_window_key", "rotate", "Window to Desktop 2"),
    key("rotate_to_3_window_key", "rotate", "Window to Desktop 3"),
    key("rotate_to_4_window_key", "rotate", "Window to Desktop 4"),
    key("rotate_to_5_window_key", "rotate", "Window to Desktop 5"),
    key("rotate_to_6_window_key", "rotate", "Window to Desktop 6"),
    key("rotate_to_7_window_key", "rotate", "Window to Desktop 7"),
    key("rotate_to_8_window_key", "rotate", "Window to Desktop 8"),
    key("rotate_to_9_window_key", "rotate", "Window to Desktop 9"),
    key("rotate_to_10_window_key", "rotate", "Window to Desktop 10"),
    key("rotate_to_11_window_key", "rotate", "Window to Desktop 11"),
    key("rotate_to_12_window_key", "rotate", "Window to Desktop 12"),
    key("next_key", "wall", "Switch to Next Desktop"),
    key("prev_key", "wall", "Switch to Previous Desktop"),
    key("right_window_key", "wall", "Window One Desktop to the Right"),
    key("left_window_key", "wall", "Window One Desktop to the Left"),
    key("up_window_key", "wall", "Window One Desktop Up"),
    key("down_window_key", "wall", "Window One Desktop Down"),
    key("up_key", "wall", "Switch One Desktop Up"),
    key("down_key", "wall", "Switch One Desktop Down"),
    key("left_key", "wall", "Switch One Desktop to the Left"),
    key("right_key", "wall", "Switch One Desktop to the Right"),
    key("switch_to_1_key", "vpswitch", "Switch to Desktop 1"),
    key("switch_to_2_key", "vpswitch", "Switch to Desktop 2"),
    key("switch_to_3_key", "vpswitch", "Switch to Desktop 3"),
    key("switch_to_4_key", "vpswitch", "Switch to Desktop 4"),
    key("switch_to_5_key", "vpswitch", "Switch to Desktop 5"),
    key("switch_to_6_key", "vpswitch", "Switch to Desktop 6"),
    key("switch_to_7_key", "vpswitch", "Switch to Desktop 7"),
    key("switch_to_8_key", "vpswitch", "Switch to Desktop 8"),
    key("switch_to_9_key", "vpswitch", "Switch to Desktop 9"),
    key("switch_to_10_key", "vpswitch", "Switch to Desktop 10"),
    key("switch_to_11_key", "vpswitch", "Switch to Desktop 11"),
    key("switch_to_12_key", "vpswitch", "Switch to Desktop 12"),
    key("initiate_key", "scale", "Expose"),
    key("initiate_all_key", "scale", "ExposeAll"),
    key("expo_key", "expo", "ShowDesktopGrid"),

    boolean("autoraise", CORE, "AutoRaise"),
    boolean("raise_on_click", CORE, "ClickRaise"),
    boolean("snapoff_maximized", "move", "MoveResizeMaximizedWindows"),
    boolean("always_show", "resizeinfo", "GeometryTip"),
    boolean("allow_wraparound", "wall", "RollOverDesktops"),

    int("autoraise_delay", CORE, "AutoRaiseInterval", WINDOWS),
    int("flip_time", "rotate", "ElectricBorderDelay", WINDOWS),
    int("number_of_desktops", CORE, "Number", DESKTOPS),

    derived("unmaximize_window_key", CORE, None, WINDOWS, &rules::ClearedKey),
    derived("maximize_window_key", CORE, None, WINDOWS, &rules::ClearedKey),
    derived("maximize_window_horizontally_key", CORE, None, WINDOWS, &rules::ClearedKey),
    derived("maximize_window_vertically_key", CORE, None, WINDOWS, &rules::ClearedKey),
    derived("command11", "commands", None, WINDOWS, &rules::FixedString { value: "xkill" }),
    derived("click_to_focus", CORE, None, WINDOWS, &rules::ClickToFocus),
    derived("mode", "resize", None, WINDOWS, &rules::ResizeMode),

    derived("snap_type", "snap", None, WINDOWS, &rules::SnapType),
    derived("edges_categories", "snap", None, WINDOWS, &rules::SnapCategories),
    derived("resistance_distance", "snap", None, WINDOWS, &rules::SnapDistance { read_only: false }),
    derived("attraction_distance", "snap", None, WINDOWS, &rules::SnapDistance { read_only: true }),

    derived("next_key", "switcher", Some("Walk Through Windows"), KWIN, &rules::AltTab::CURRENT_DESKTOP),
    derived("prev_key", "switcher", Some("Walk Through Windows (Reverse)"), KWIN, &rules::AltTab::CURRENT_DESKTOP),
    derived("next_all_key", "switcher", Some("Walk Through Windows"), KWIN, &rules::AltTab::ALL_DESKTOPS),
    derived("prev_all_key", "switcher", Some("Walk Through Windows (Reverse)"), KWIN, &rules::AltTab::ALL_DESKTOPS),
    derived("next_no_popup_key", "switcher", Some("Walk Through Windows"), KWIN, &rules::AltTab::NO_POPUP),
    derived("prev_no_popup_key", "switcher", Some("Walk Through Windows (Reverse)"), KWIN, &rules::AltTab::NO_POPUP),

    derived("edge_flip_pointer", "rotate", Some("ElectricBorders"), WINDOWS, &rules::EdgeFlipPointer),
    derived("edge_flip_window", "rotate", Some("ElectricBorders"), WINDOWS, &rules::EdgeFlipWindow),
    derived("edgeflip_pointer", "wall", Some("ElectricBorders"), WINDOWS, &rules::EdgeFlipPointer),
    derived("edgeflip_move", "wall", Some("ElectricBorders"), WINDOWS, &rules::EdgeFlipWindow),

    derived("mode", "place", Some("Placement"), WINDOWS, &rules::Placement),
];

static INDEX: Lazy<HashMap<&'static str, HashMap<&'static str, &'static IntegratedOption>>> = Lazy::new(|| {
    let mut index: HashMap<_, HashMap<_, _>> = HashMap::new();
    for option in OPTIONS {
        index.entry(option.plugin).or_default().entry(option.setting).or_insert(option);
    }
    index
});

/// Table row for `(plugin, setting)`, ignoring whether integration is on.
pub fn lookup(plugin: &str, setting: &str) -> Option<&'static IntegratedOption> {
    INDEX.get(plugin)?.get(setting).copied()
}

/// Table row for `id` when the context has integration enabled.
pub fn integrated_option(ctx: &SettingsContext, id: &SettingId) -> Option<&'static IntegratedOption> {
    if !ctx.integration_enabled() {
        return None;
    }
    lookup(&id.plugin, &id.name)
}

pub fn is_integrated(ctx: &SettingsContext, id: &SettingId) -> bool {
    integrated_option(ctx, id).is_some()
}

/// Integrated one-way settings: read from the session, never written back.
pub fn is_read_only(ctx: &SettingsContext, id: &SettingId) -> bool {
    integrated_option(ctx, id).is_some_and(IntegratedOption::read_only)
}
