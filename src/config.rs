// bridge/src/config.rs

use anyhow::{Context, Result};
use directories::{BaseDirs, ProjectDirs};
use serde::{Deserialize, Serialize};
use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};
use tracing::debug;

use crate::{error::BridgeError, profile::StoreLayout};

/// Overrides the directory holding the store files.
pub const DIR_ENV: &str = "KCONFIG_BRIDGE_DIR";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Directory of the store files; the user config directory when unset.
    pub config_dir: Option<PathBuf>,
    /// Primary store file name; profiles get `<basename>.<profile>`.
    pub primary_basename: String,
    pub session_file: String,
    pub shortcuts_file: String,
    /// Off for hosts that call `trigger` from their own event loop.
    pub watch_files: bool,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            config_dir: None,
            primary_basename: "compizrc".into(),
            session_file: "kwinrc".into(),
            shortcuts_file: "kglobalshortcutsrc".into(),
            watch_files: true,
        }
    }
}

/// One layer as written on disk; unset keys leave lower layers alone.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
struct PartialBridgeConfig {
    config_dir: Option<PathBuf>,
    primary_basename: Option<String>,
    session_file: Option<String>,
    shortcuts_file: Option<String>,
    watch_files: Option<bool>,
}

fn merge(a: &mut BridgeConfig, b: &PartialBridgeConfig) {
    let overlay = |dst: &mut String, src: &Option<String>| { if let Some(v) = src { *dst = v.clone(); } };
    if b.config_dir.is_some() { a.config_dir = b.config_dir.clone(); }
    overlay(&mut a.primary_basename, &b.primary_basename);
    overlay(&mut a.session_file, &b.session_file);
    overlay(&mut a.shortcuts_file, &b.shortcuts_file);
    if let Some(v) = b.watch_files { a.watch_files = v; }
}

/// System layer first, then the user layer.
pub fn layer_paths() -> Vec<PathBuf> {
    let mut paths = vec![PathBuf::from("/etc/kconfig-bridge/bridge.toml")];
    if let Some(proj) = ProjectDirs::from("org", "kconfig-bridge", "kconfig-bridge") {
        paths.push(proj.config_dir().join("bridge.toml"));
    }
    paths
}

impl BridgeConfig {
    pub fn with_dir(dir: impl Into<PathBuf>) -> Self {
        Self { config_dir: Some(dir.into()), ..Self::default() }
    }

    /// Defaults overlaid with whichever of the standard layers exist.
    pub fn load() -> Self {
        Self::load_layers(&layer_paths())
    }

    /// Missing or unparsable layers are skipped.
    pub fn load_layers(paths: &[PathBuf]) -> Self {
        let mut merged = Self::default();
        for path in paths {
            if let Some(layer) = read_layer(path) {
                debug!(path = %path.display(), "applying config layer");
                merge(&mut merged, &layer);
            }
        }
        merged
    }

    /// A single explicit file; unlike the standard layers it must exist and parse.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        let layer: PartialBridgeConfig =
            toml::from_str(&text).with_context(|| format!("parse {}", path.display()))?;
        let mut merged = Self::default();
        merge(&mut merged, &layer);
        Ok(merged)
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("serialize bridge config")
    }

    /// Explicit directory, then `KCONFIG_BRIDGE_DIR`, then the user config directory.
    pub fn resolve_dir(&self) -> std::result::Result<PathBuf, BridgeError> {
        self.resolve_dir_with(std::env::var_os(DIR_ENV))
    }

    fn resolve_dir_with(&self, env: Option<OsString>) -> std::result::Result<PathBuf, BridgeError> {
        if let Some(dir) = &self.config_dir {
            return Ok(dir.clone());
        }
        if let Some(dir) = env.filter(|d| !d.is_empty()) {
            return Ok(PathBuf::from(dir));
        }
        BaseDirs::new()
            .map(|b| b.config_dir().to_path_buf())
            .ok_or(BridgeError::NoConfigDir)
    }

    pub fn layout(&self) -> std::result::Result<StoreLayout, BridgeError> {
        Ok(StoreLayout {
            dir: self.resolve_dir()?,
            primary_basename: self.primary_basename.clone(),
            session_file: self.session_file.clone(),
            shortcuts_file: self.shortcuts_file.clone(),
        })
    }
}

fn read_layer(path: &Path) -> Option<PartialBridgeConfig> {
    let text = fs::read_to_string(path).ok()?;
    toml::from_str(&text).ok()
}
