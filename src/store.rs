// bridge/src/store.rs

use std::{
    fs,
    path::{Path, PathBuf},
};
use toml::{Table, Value};
use tracing::{debug, warn};

use crate::{
    codec,
    error::{BridgeError, Result},
};

/// A group/key configuration file held in memory.
///
/// Writes only touch the in-memory document; `sync` persists it. The text
/// last read from or written to disk is kept so a change notification for
/// a file that still holds that text can be recognised as our own.
#[derive(Debug)]
pub struct ConfigFile {
    path: PathBuf,
    data: Table,
    snapshot: String,
    dirty: bool,
}

impl ConfigFile {
    /// Opens `path`; a missing file is an empty document.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let mut me = Self { path, data: Table::new(), snapshot: String::new(), dirty: false };
        me.reparse()?;
        Ok(me)
    }

    /// Like `open`, but creates an empty file first if there is none.
    pub fn create(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        ensure_file(&path)?;
        Self::open(path)
    }

    pub fn path(&self) -> &Path { &self.path }
    pub fn is_dirty(&self) -> bool { self.dirty }

    /// Re-reads the file, dropping unsynced in-memory changes.
    pub fn reparse(&mut self) -> Result<()> {
        let text = read_text(&self.path)?;
        self.data = parse(&self.path, &text)?;
        self.snapshot = text;
        self.dirty = false;
        Ok(())
    }

    /// Writes the document back if anything changed since the last sync.
    pub fn sync(&mut self) -> Result<()> {
        if !self.dirty {
            return Ok(());
        }
        let text = toml::to_string_pretty(&self.data)
            .map_err(|source| BridgeError::Serialize { path: self.path.clone(), source })?;
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .map_err(|source| BridgeError::StoreUnavailable { path: dir.to_path_buf(), source })?;
        }
        fs::write(&self.path, &text)
            .map_err(|source| BridgeError::StoreUnavailable { path: self.path.clone(), source })?;
        debug!(path = %self.path.display(), "synced store");
        self.snapshot = text;
        self.dirty = false;
        Ok(())
    }

    /// Whether the file on disk differs from what this handle last saw.
    pub fn changed_on_disk(&self) -> bool {
        match read_text(&self.path) {
            Ok(text) => text != self.snapshot,
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "cannot read store");
                false
            }
        }
    }

    pub fn has_key(&self, group: &str, key: &str) -> bool {
        self.entry(group, key).is_some()
    }

    pub fn entry(&self, group: &str, key: &str) -> Option<&Value> {
        self.data.get(group)?.as_table()?.get(key)
    }

    /// Stores `value` under `group/key`; returns false when it was already there.
    pub fn set_entry(&mut self, group: &str, key: &str, value: Value) -> bool {
        if self.entry(group, key) == Some(&value) {
            return false;
        }
        let slot = self
            .data
            .entry(group.to_string())
            .or_insert_with(|| Value::Table(Table::new()));
        if !slot.is_table() {
            *slot = Value::Table(Table::new());
        }
        if let Value::Table(t) = slot {
            t.insert(key.to_string(), value);
        }
        self.dirty = true;
        true
    }

    pub fn read_int(&self, group: &str, key: &str) -> Option<i64> {
        codec::int_of(self.entry(group, key)?)
    }

    pub fn read_bool(&self, group: &str, key: &str) -> Option<bool> {
        codec::bool_of(self.entry(group, key)?)
    }

    pub fn read_string(&self, group: &str, key: &str) -> Option<String> {
        codec::string_of(self.entry(group, key)?)
    }

    pub fn read_string_list(&self, group: &str, key: &str) -> Option<Vec<String>> {
        codec::string_list_of(self.entry(group, key)?)
    }
}

/// The three stores one session works against.
///
/// Writes to the session and key-binding stores raise `modified` only when
/// an entry actually changes; that flag decides whether a reload request
/// goes out at the end of a write pass.
#[derive(Debug)]
pub struct StoreSet {
    pub(crate) primary: ConfigFile,
    pub(crate) session: ConfigFile,
    pub(crate) shortcuts: ConfigFile,
    modified: bool,
}

impl StoreSet {
    pub fn new(primary: ConfigFile, session: ConfigFile, shortcuts: ConfigFile) -> Self {
        Self { primary, session, shortcuts, modified: false }
    }

    pub fn primary(&self) -> &ConfigFile { &self.primary }
    pub fn session(&self) -> &ConfigFile { &self.session }
    pub fn shortcuts(&self) -> &ConfigFile { &self.shortcuts }

    pub fn is_modified(&self) -> bool { self.modified }
    pub(crate) fn clear_modified(&mut self) { self.modified = false; }

    pub fn write_primary(&mut self, group: &str, key: &str, value: impl Into<Value>) -> bool {
        self.primary.set_entry(group, key, value.into())
    }

    pub fn write_session(&mut self, group: &str, key: &str, value: impl Into<Value>) -> bool {
        let changed = self.session.set_entry(group, key, value.into());
        if changed {
            debug!(group, key, "session entry changed");
            self.modified = true;
        }
        changed
    }

    pub fn write_shortcut(&mut self, group: &str, key: &str, entry: Vec<String>) -> bool {
        let changed = self.shortcuts.set_entry(group, key, Value::from(entry));
        if changed {
            debug!(group, key, "shortcut entry changed");
            self.modified = true;
        }
        changed
    }

    pub(crate) fn all(&self) -> [&ConfigFile; 3] {
        [&self.primary, &self.session, &self.shortcuts]
    }

    pub(crate) fn reparse_all(&mut self) -> Result<()> {
        self.primary.reparse()?;
        self.session.reparse()?;
        self.shortcuts.reparse()
    }
}

/// Creates an empty file at `path` (and its directory) if none exists.
pub fn ensure_file(path: &Path) -> Result<()> {
    if path.exists() {
        return Ok(());
    }
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .map_err(|source| BridgeError::StoreUnavailable { path: dir.to_path_buf(), source })?;
    }
    fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| BridgeError::StoreUnavailable { path: path.to_path_buf(), source })?;
    Ok(())
}

fn read_text(path: &Path) -> Result<String> {
    match fs::read_to_string(path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(String::new()),
        Err(source) => Err(BridgeError::StoreUnavailable { path: path.to_path_buf(), source }),
    }
}

fn parse(path: &Path, text: &str) -> Result<Table> {
    text.parse::<Table>()
        .map_err(|source| BridgeError::Parse { path: path.to_path_buf(), source })
}
