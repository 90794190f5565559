// bridge/src/session.rs

use tracing::{debug, info, warn};

use crate::{
    error::{BridgeError, Result},
    profile::StoreLayout,
    reload_bus::{ReloadBus, ReloadRequest},
    store::{ConfigFile, StoreSet},
    watch::{FileWatcher, WatchId},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Pass {
    Idle,
    Read,
    Write,
}

#[derive(Clone, Copy, Debug)]
struct Watches {
    primary: WatchId,
    session: WatchId,
    shortcuts: WatchId,
}

impl Watches {
    fn all(&self) -> [WatchId; 3] {
        [self.primary, self.session, self.shortcuts]
    }
}

/// The three open stores, their change watches, and the pass protocol.
///
/// Watches are suspended for the whole of a read or write pass so the
/// bridge does not react to its own writes. A write pass flushes the
/// primary store unconditionally and the external stores only when
/// something in them changed, and only then asks for a session reload.
pub struct StoreSession {
    layout: StoreLayout,
    profile: String,
    stores: StoreSet,
    watcher: FileWatcher,
    watches: Watches,
    pass: Pass,
}

impl StoreSession {
    pub fn open(layout: StoreLayout, profile: &str, watcher: FileWatcher) -> Result<Self> {
        let primary_path = layout.primary_path(profile);
        let primary = ConfigFile::create(&primary_path)?;
        let session = ConfigFile::open(layout.session_path())?;
        let shortcuts = ConfigFile::open(layout.shortcuts_path())?;
        let watches = Watches {
            primary: watcher.add_watch(&primary_path)?,
            session: watcher.add_watch(&layout.session_path())?,
            shortcuts: watcher.add_watch(&layout.shortcuts_path())?,
        };
        info!(dir = %layout.dir.display(), profile, "store session opened");
        Ok(Self {
            layout,
            profile: profile.to_string(),
            stores: StoreSet::new(primary, session, shortcuts),
            watcher,
            watches,
            pass: Pass::Idle,
        })
    }

    pub fn layout(&self) -> &StoreLayout { &self.layout }
    pub fn profile(&self) -> &str { &self.profile }
    pub fn pass(&self) -> Pass { self.pass }
    pub fn stores(&self) -> &StoreSet { &self.stores }
    pub fn stores_mut(&mut self) -> &mut StoreSet { &mut self.stores }
    pub fn watcher(&self) -> &FileWatcher { &self.watcher }

    /// Reopens the primary store under `profile` if it is not the current one.
    fn switch_profile(&mut self, profile: &str) -> Result<()> {
        if profile == self.profile {
            return Ok(());
        }
        let path = self.layout.primary_path(profile);
        let primary = ConfigFile::create(&path)?;
        let watch = self.watcher.add_watch(&path)?;
        self.watcher.remove_watch(self.watches.primary);
        self.watches.primary = watch;
        self.stores.primary = primary;
        info!(from = %self.profile, to = profile, "switched profile");
        self.profile = profile.to_string();
        Ok(())
    }

    pub fn begin(&mut self, pass: Pass, profile: &str) -> Result<()> {
        if self.pass != Pass::Idle {
            return Err(BridgeError::PassActive);
        }
        self.switch_profile(profile)?;
        self.suspend_watches();
        self.pass = pass;
        debug!(?pass, "pass started");
        Ok(())
    }

    pub fn end_read(&mut self) {
        self.finish();
    }

    /// Flushes and notifies before watches come back on.
    pub fn end_write(&mut self, bus: &dyn ReloadBus) -> Result<()> {
        let flushed = self.flush(bus);
        self.finish();
        flushed
    }

    fn finish(&mut self) {
        self.resume_watches();
        debug!(pass = ?self.pass, "pass finished");
        self.pass = Pass::Idle;
    }

    fn flush(&mut self, bus: &dyn ReloadBus) -> Result<()> {
        self.stores.primary.sync()?;
        if !self.stores.is_modified() {
            return Ok(());
        }
        self.stores.session.sync()?;
        self.stores.shortcuts.sync()?;
        bus.request_reload(&ReloadRequest {
            profile: self.profile.clone(),
            files: vec![self.layout.session_path(), self.layout.shortcuts_path()],
        });
        info!(profile = %self.profile, "requested window manager reload");
        self.stores.clear_modified();
        Ok(())
    }

    pub fn suspend_watches(&self) {
        for id in self.watches.all() {
            self.watcher.disable(id);
        }
    }

    pub fn resume_watches(&self) {
        for id in self.watches.all() {
            self.watcher.enable(id);
        }
    }

    /// Drains fired watches; true when a store now differs from what we
    /// last read or wrote. Our own writes match the snapshot and are ignored.
    pub fn take_external_change(&mut self) -> bool {
        if self.watcher.take_pending().is_empty() {
            return false;
        }
        let changed = self.stores.all().iter().any(|f| f.changed_on_disk());
        if !changed {
            debug!("ignoring self notification");
        }
        changed
    }

    pub fn reparse_all(&mut self) -> Result<()> {
        self.stores.reparse_all()
    }
}

impl Drop for StoreSession {
    fn drop(&mut self) {
        for id in self.watches.all() {
            self.watcher.remove_watch(id);
        }
        if self.stores.primary.is_dirty() || self.stores.is_modified() {
            warn!(profile = %self.profile, "store session closed with unflushed changes");
        }
    }
}
