// bridge/src/binding.rs

//! String encodings for the non-trivial scalar kinds: colors, key chords,
//! button chords and screen-edge masks, plus the desktop-session shortcut
//! notation (`Ctrl+Alt+F4`) used by the key-binding store.

use bitflags::bitflags;
use std::{fmt, str::FromStr};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseBindingError {
    #[error("unknown modifier <{0}>")]
    UnknownModifier(String),
    #[error("unterminated modifier in {0:?}")]
    Unterminated(String),
    #[error("invalid button {0:?}")]
    InvalidButton(String),
    #[error("invalid color {0:?}")]
    InvalidColor(String),
}

bitflags! {
    /// Modifier mask carried by key and button chords.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u32 {
        const SHIFT = 1 << 0;
        const LOCK = 1 << 1;
        const CONTROL = 1 << 2;
        const MOD1 = 1 << 3;
        const MOD2 = 1 << 4;
        const MOD3 = 1 << 5;
        const MOD4 = 1 << 6;
        const MOD5 = 1 << 7;
        const ALT = 1 << 16;
        const META = 1 << 17;
        const SUPER = 1 << 18;
        const HYPER = 1 << 19;
        const MODE_SWITCH = 1 << 20;
        const NUM_LOCK = 1 << 21;
        const SCROLL_LOCK = 1 << 22;
    }
}

const MODIFIER_NAMES: &[(&str, Modifiers)] = &[
    ("Shift", Modifiers::SHIFT),
    ("Lock", Modifiers::LOCK),
    ("Control", Modifiers::CONTROL),
    ("Mod1", Modifiers::MOD1),
    ("Mod2", Modifiers::MOD2),
    ("Mod3", Modifiers::MOD3),
    ("Mod4", Modifiers::MOD4),
    ("Mod5", Modifiers::MOD5),
    ("Alt", Modifiers::ALT),
    ("Meta", Modifiers::META),
    ("Super", Modifiers::SUPER),
    ("Hyper", Modifiers::HYPER),
    ("ModeSwitch", Modifiers::MODE_SWITCH),
    ("NumLock", Modifiers::NUM_LOCK),
    ("ScrollLock", Modifiers::SCROLL_LOCK),
];

const DISABLED: &str = "Disabled";

fn modifier_by_name(name: &str) -> Option<Modifiers> {
    MODIFIER_NAMES
        .iter()
        .find(|(n, _)| n.eq_ignore_ascii_case(name))
        .map(|(_, m)| *m)
}

fn write_modifiers(f: &mut fmt::Formatter<'_>, mods: Modifiers) -> fmt::Result {
    for (name, flag) in MODIFIER_NAMES {
        if mods.contains(*flag) {
            write!(f, "<{name}>")?;
        }
    }
    Ok(())
}

/// Strips leading `<Modifier>` tokens and returns the mask plus the remainder.
fn split_modifiers(s: &str) -> Result<(Modifiers, &str), ParseBindingError> {
    let mut mods = Modifiers::empty();
    let mut rest = s.trim();
    while let Some(stripped) = rest.strip_prefix('<') {
        let end = stripped
            .find('>')
            .ok_or_else(|| ParseBindingError::Unterminated(s.to_string()))?;
        let name = &stripped[..end];
        mods |= modifier_by_name(name)
            .ok_or_else(|| ParseBindingError::UnknownModifier(name.to_string()))?;
        rest = stripped[end + 1..].trim_start();
    }
    Ok((mods, rest.trim_end()))
}

/// A key chord: optional keysym name plus modifier mask.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct KeyBinding {
    pub keysym: Option<String>,
    pub modifiers: Modifiers,
}

impl KeyBinding {
    pub fn new(keysym: impl Into<String>, modifiers: Modifiers) -> Self {
        Self { keysym: Some(keysym.into()), modifiers }
    }

    pub fn is_empty(&self) -> bool {
        self.keysym.is_none() && self.modifiers.is_empty()
    }

    /// Desktop shortcut notation, e.g. `Ctrl+Alt+F4`; a modifier-only chord
    /// is just its prefixes (`Meta`), an empty one is `none`.
    pub fn to_shortcut(&self) -> String {
        if self.is_empty() {
            return "none".into();
        }
        let mut parts: Vec<String> = Vec::new();
        if self.modifiers.contains(Modifiers::SHIFT) { parts.push("Shift".into()); }
        if self.modifiers.contains(Modifiers::CONTROL) { parts.push("Ctrl".into()); }
        if self.modifiers.contains(Modifiers::ALT) { parts.push("Alt".into()); }
        if self.modifiers.contains(Modifiers::SUPER) { parts.push("Meta".into()); }
        if let Some(sym) = self.keysym.as_deref() {
            parts.push(desktop_key_name(sym));
        }
        if parts.is_empty() {
            return "none".into();
        }
        parts.join("+")
    }

    /// Parses one chord in desktop shortcut notation. `none` and the empty
    /// string yield an empty binding; unknown modifier words yield `None`.
    /// A trailing modifier word is a modifier-only chord.
    pub fn from_shortcut(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            return Some(Self::default());
        }
        let tokens: Vec<&str> = s.split('+').collect();
        let (key, prefix) = tokens.split_last()?;
        let mut modifiers = Modifiers::empty();
        for m in prefix {
            modifiers |= desktop_modifier(m)?;
        }
        if let Some(m) = desktop_modifier(key) {
            return Some(Self { keysym: None, modifiers: modifiers | m });
        }
        if key.is_empty() {
            return None;
        }
        Some(Self { keysym: Some(keysym_name(key)), modifiers })
    }
}

fn desktop_modifier(word: &str) -> Option<Modifiers> {
    match word.to_ascii_lowercase().as_str() {
        "shift" => Some(Modifiers::SHIFT),
        "ctrl" | "control" => Some(Modifiers::CONTROL),
        "alt" => Some(Modifiers::ALT),
        "meta" => Some(Modifiers::SUPER),
        _ => None,
    }
}

fn desktop_key_name(keysym: &str) -> String {
    match keysym {
        "space" => "Space".into(),
        s if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => s.to_ascii_uppercase(),
        s => s.to_string(),
    }
}

fn keysym_name(key: &str) -> String {
    match key {
        "Space" => "space".into(),
        s if s.len() == 1 && s.chars().all(|c| c.is_ascii_alphabetic()) => s.to_ascii_lowercase(),
        s => s.to_string(),
    }
}

impl fmt::Display for KeyBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(DISABLED);
        }
        write_modifiers(f, self.modifiers)?;
        if let Some(sym) = &self.keysym {
            f.write_str(sym)?;
        }
        Ok(())
    }
}

impl FromStr for KeyBinding {
    type Err = ParseBindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DISABLED) {
            return Ok(Self::default());
        }
        let (modifiers, rest) = split_modifiers(trimmed)?;
        let keysym = (!rest.is_empty()).then(|| rest.to_string());
        Ok(Self { keysym, modifiers })
    }
}

/// A pointer-button chord.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ButtonBinding {
    pub button: u32,
    pub modifiers: Modifiers,
}

impl ButtonBinding {
    pub fn is_empty(&self) -> bool {
        self.button == 0 && self.modifiers.is_empty()
    }
}

impl fmt::Display for ButtonBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return f.write_str(DISABLED);
        }
        write_modifiers(f, self.modifiers)?;
        if self.button != 0 {
            write!(f, "Button{}", self.button)?;
        }
        Ok(())
    }
}

impl FromStr for ButtonBinding {
    type Err = ParseBindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case(DISABLED) {
            return Ok(Self::default());
        }
        let (modifiers, rest) = split_modifiers(trimmed)?;
        let button = if rest.is_empty() {
            0
        } else {
            rest.strip_prefix("Button")
                .and_then(|n| n.parse::<u32>().ok())
                .ok_or_else(|| ParseBindingError::InvalidButton(rest.to_string()))?
        };
        Ok(Self { button, modifiers })
    }
}

bitflags! {
    /// Screen edges and corners.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Edges: u32 {
        const LEFT = 1 << 0;
        const RIGHT = 1 << 1;
        const TOP = 1 << 2;
        const BOTTOM = 1 << 3;
        const TOP_LEFT = 1 << 4;
        const TOP_RIGHT = 1 << 5;
        const BOTTOM_LEFT = 1 << 6;
        const BOTTOM_RIGHT = 1 << 7;
    }
}

const EDGE_NAMES: &[(&str, Edges)] = &[
    ("Left", Edges::LEFT),
    ("Right", Edges::RIGHT),
    ("Top", Edges::TOP),
    ("Bottom", Edges::BOTTOM),
    ("TopLeft", Edges::TOP_LEFT),
    ("TopRight", Edges::TOP_RIGHT),
    ("BottomLeft", Edges::BOTTOM_LEFT),
    ("BottomRight", Edges::BOTTOM_RIGHT),
];

pub fn edges_to_string(edges: Edges) -> String {
    EDGE_NAMES
        .iter()
        .filter(|(_, e)| edges.contains(*e))
        .map(|(n, _)| *n)
        .collect::<Vec<_>>()
        .join(" | ")
}

/// Unknown names are ignored, so this never fails.
pub fn parse_edges(s: &str) -> Edges {
    s.split('|')
        .map(str::trim)
        .filter_map(|name| EDGE_NAMES.iter().find(|(n, _)| *n == name).map(|(_, e)| *e))
        .fold(Edges::empty(), |acc, e| acc | e)
}

/// RGBA with 16-bit channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Color {
    pub red: u16,
    pub green: u16,
    pub blue: u16,
    pub alpha: u16,
}

impl Color {
    pub const OPAQUE_BLACK: Color = Color { red: 0, green: 0, blue: 0, alpha: 0xffff };

    pub const fn rgba(red: u16, green: u16, blue: u16, alpha: u16) -> Self {
        Self { red, green, blue, alpha }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:04x}{:04x}{:04x}{:04x}", self.red, self.green, self.blue, self.alpha)
    }
}

impl FromStr for Color {
    type Err = ParseBindingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseBindingError::InvalidColor(s.to_string());
        let hex = s.trim().strip_prefix('#').ok_or_else(invalid)?;
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid());
        }
        let channel = |i: usize, width: usize| -> Result<u16, ParseBindingError> {
            let v = u16::from_str_radix(&hex[i * width..(i + 1) * width], 16).map_err(|_| invalid())?;
            Ok(if width == 2 { v * 257 } else { v })
        };
        match hex.len() {
            16 => Ok(Color::rgba(channel(0, 4)?, channel(1, 4)?, channel(2, 4)?, channel(3, 4)?)),
            8 => Ok(Color::rgba(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, channel(3, 2)?)),
            6 => Ok(Color::rgba(channel(0, 2)?, channel(1, 2)?, channel(2, 2)?, 0xffff)),
            _ => Err(invalid()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_binding_text_form() {
        let k: KeyBinding = "<Control><Alt>F4".parse().unwrap();
        assert_eq!(k, KeyBinding::new("F4", Modifiers::CONTROL | Modifiers::ALT));
        assert_eq!(k.to_string(), "<Control><Alt>F4");
        assert!("Disabled".parse::<KeyBinding>().unwrap().is_empty());
        assert_eq!(KeyBinding::default().to_string(), "Disabled");
        assert!(matches!("<Bogus>a".parse::<KeyBinding>(), Err(ParseBindingError::UnknownModifier(_))));
        assert!(matches!("<Alt".parse::<KeyBinding>(), Err(ParseBindingError::Unterminated(_))));
    }

    #[test]
    fn modifier_only_chord_keeps_mask() {
        let k: KeyBinding = "<Super>".parse().unwrap();
        assert_eq!(k.keysym, None);
        assert_eq!(k.modifiers, Modifiers::SUPER);
        assert!(!k.is_empty());
    }

    #[test]
    fn desktop_shortcut_notation() {
        let k = KeyBinding::from_shortcut("Alt+F4").unwrap();
        assert_eq!(k, KeyBinding::new("F4", Modifiers::ALT));
        assert_eq!(k.to_shortcut(), "Alt+F4");

        let k = KeyBinding::from_shortcut("Ctrl+Meta+D").unwrap();
        assert_eq!(k, KeyBinding::new("d", Modifiers::CONTROL | Modifiers::SUPER));
        assert_eq!(k.to_shortcut(), "Ctrl+Meta+D");

        assert_eq!(KeyBinding::new("space", Modifiers::SHIFT).to_shortcut(), "Shift+Space");
        assert!(KeyBinding::from_shortcut("none").unwrap().is_empty());
        assert_eq!(KeyBinding::default().to_shortcut(), "none");
        assert!(KeyBinding::from_shortcut("Hyper+X").is_none());
    }

    #[test]
    fn modifier_only_shortcut_keeps_its_modifiers() {
        let k = KeyBinding { keysym: None, modifiers: Modifiers::SUPER };
        assert!(!k.is_empty());
        assert_eq!(k.to_shortcut(), "Meta");
        assert_eq!(KeyBinding::from_shortcut("Meta"), Some(k));

        let k = KeyBinding { keysym: None, modifiers: Modifiers::CONTROL | Modifiers::ALT };
        assert_eq!(k.to_shortcut(), "Ctrl+Alt");
        assert_eq!(KeyBinding::from_shortcut("Ctrl+Alt"), Some(k));
    }

    #[test]
    fn button_binding_text_form() {
        let b: ButtonBinding = "<Alt>Button1".parse().unwrap();
        assert_eq!(b, ButtonBinding { button: 1, modifiers: Modifiers::ALT });
        assert_eq!(b.to_string(), "<Alt>Button1");
        assert!("Disabled".parse::<ButtonBinding>().unwrap().is_empty());
        assert!("<Alt>Wheel".parse::<ButtonBinding>().is_err());
    }

    #[test]
    fn edges_ignore_unknown_names() {
        let e = parse_edges("Left | Bogus | BottomRight");
        assert_eq!(e, Edges::LEFT | Edges::BOTTOM_RIGHT);
        assert_eq!(edges_to_string(e), "Left | BottomRight");
        assert_eq!(parse_edges(""), Edges::empty());
        assert_eq!(edges_to_string(Edges::empty()), "");
    }

    #[test]
    fn color_forms() {
        let c: Color = "#ff00007f".parse().unwrap();
        assert_eq!(c, Color::rgba(0xffff, 0, 0, 0x7f7f));
        assert_eq!(c.to_string(), "#ffff000000007f7f");
        assert_eq!("#ffff000000007f7f".parse::<Color>().unwrap(), c);
        assert_eq!("#000000".parse::<Color>().unwrap(), Color::OPAQUE_BLACK);
        assert!("red".parse::<Color>().is_err());
        assert!("#12345".parse::<Color>().is_err());
    }
}
