// bridge/src/backend.rs

//! The settings-backend surface a host drives: init, read and write passes,
//! integration predicates, and profile management.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::{
    config::BridgeConfig,
    context::{SettingId, SettingsContext},
    engine,
    error::Result,
    integration,
    profile::StoreLayout,
    reload_bus::ReloadBus,
    session::{Pass, StoreSession},
    store::StoreSet,
    watch::FileWatcher,
};

#[derive(Clone, Copy, Debug, Serialize)]
pub struct BackendInfo {
    pub name: &'static str,
    pub short_desc: &'static str,
    pub long_desc: &'static str,
    pub profiles: bool,
    pub integration: bool,
}

pub static INFO: BackendInfo = BackendInfo {
    name: "kconfig",
    short_desc: "KDE configuration backend",
    long_desc: "Stores settings in TOML files and mirrors window manager options to the KDE session",
    profiles: true,
    integration: true,
};

pub struct Backend {
    session: StoreSession,
    bus: Arc<dyn ReloadBus>,
}

impl Backend {
    /// Opens the stores for `ctx`'s profile and starts watching them.
    pub fn init(config: &BridgeConfig, ctx: &SettingsContext, bus: Arc<dyn ReloadBus>) -> Result<Self> {
        let layout = config.layout()?;
        let watcher = if config.watch_files { FileWatcher::new()? } else { FileWatcher::manual() };
        let session = StoreSession::open(layout, ctx.profile(), watcher)?;
        Ok(Self { session, bus })
    }

    pub fn fini(self) {
        info!(profile = %self.session.profile(), "backend shut down");
    }

    pub fn read_init(&mut self, ctx: &SettingsContext) -> Result<()> {
        self.session.begin(Pass::Read, ctx.profile())
    }

    pub fn read_setting(&mut self, ctx: &mut SettingsContext, id: &SettingId) {
        debug_assert_eq!(self.session.pass(), Pass::Read, "read_setting outside a read pass");
        if self.session.pass() != Pass::Read {
            warn!(%id, pass = ?self.session.pass(), "read_setting outside a read pass");
        }
        engine::read_setting(self.session.stores(), ctx, id);
    }

    pub fn read_done(&mut self) {
        self.session.end_read();
    }

    pub fn write_init(&mut self, ctx: &SettingsContext) -> Result<()> {
        self.session.begin(Pass::Write, ctx.profile())
    }

    pub fn write_setting(&mut self, ctx: &SettingsContext, id: &SettingId) {
        debug_assert_eq!(self.session.pass(), Pass::Write, "write_setting outside a write pass");
        if self.session.pass() != Pass::Write {
            warn!(%id, pass = ?self.session.pass(), "write_setting outside a write pass");
        }
        engine::write_setting(self.session.stores_mut(), ctx, id);
    }

    pub fn write_done(&mut self) -> Result<()> {
        self.session.end_write(self.bus.as_ref())
    }

    /// A full read pass over every setting in `ctx`.
    pub fn read_all(&mut self, ctx: &mut SettingsContext) -> Result<()> {
        self.read_init(ctx)?;
        for id in ctx.ids() {
            self.read_setting(ctx, &id);
        }
        self.read_done();
        Ok(())
    }

    /// A full write pass over every setting in `ctx`.
    pub fn write_all(&mut self, ctx: &SettingsContext) -> Result<()> {
        self.write_init(ctx)?;
        for id in ctx.ids() {
            self.write_setting(ctx, &id);
        }
        self.write_done()
    }

    /// Handles queued change notifications: when a store changed on disk,
    /// reparses all three and re-reads every setting. Returns whether it did.
    pub fn process_events(&mut self, ctx: &mut SettingsContext) -> Result<bool> {
        if self.session.pass() != Pass::Idle || !self.session.take_external_change() {
            return Ok(false);
        }
        info!("store changed on disk, reloading settings");
        self.session.suspend_watches();
        let reloaded = self.session.reparse_all();
        if reloaded.is_ok() {
            for id in ctx.ids() {
                engine::read_setting(self.session.stores(), ctx, &id);
            }
        }
        self.session.resume_watches();
        if let Err(e) = &reloaded {
            warn!(error = %e, "external reload failed, keeping previous values");
        }
        reloaded.map(|()| true)
    }

    pub fn is_integrated(&self, ctx: &SettingsContext, id: &SettingId) -> bool {
        integration::is_integrated(ctx, id)
    }

    pub fn is_read_only(&self, ctx: &SettingsContext, id: &SettingId) -> bool {
        integration::is_read_only(ctx, id)
    }

    pub fn list_profiles(&self) -> Vec<String> {
        self.session.layout().list_profiles()
    }

    pub fn delete_profile(&self, profile: &str) -> Result<()> {
        self.session.layout().delete_profile(profile)
    }

    pub fn is_modified(&self) -> bool { self.session.stores().is_modified() }
    pub fn profile(&self) -> &str { self.session.profile() }
    pub fn layout(&self) -> &StoreLayout { self.session.layout() }
    pub fn stores(&self) -> &StoreSet { self.session.stores() }
    pub fn watcher(&self) -> &FileWatcher { self.session.watcher() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::Setting, reload_bus::NullBus};

    fn backend(dir: &std::path::Path, ctx: &SettingsContext) -> Backend {
        let config = BridgeConfig { watch_files: false, ..BridgeConfig::with_dir(dir) };
        Backend::init(&config, ctx, Arc::new(NullBus)).unwrap()
    }

    #[test]
    fn passes_accept_their_own_calls() {
        let dir = tempfile::tempdir().unwrap();
        let id = SettingId::display("core", "hsize");
        let mut ctx = SettingsContext::new("");
        ctx.add(Setting::int(id.clone(), 4));
        let mut b = backend(dir.path(), &ctx);
        b.write_init(&ctx).unwrap();
        b.write_setting(&ctx, &id);
        b.write_done().unwrap();
        b.read_init(&ctx).unwrap();
        b.read_setting(&mut ctx, &id);
        b.read_done();
        assert_eq!(ctx.get(&id).unwrap().as_int(), Some(4));
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "write_setting outside a write pass")]
    fn write_outside_a_pass_is_caught() {
        let dir = tempfile::tempdir().unwrap();
        let id = SettingId::display("core", "hsize");
        let mut ctx = SettingsContext::new("");
        ctx.add(Setting::int(id.clone(), 4));
        let mut b = backend(dir.path(), &ctx);
        b.write_setting(&ctx, &id);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "read_setting outside a read pass")]
    fn read_inside_a_write_pass_is_caught() {
        let dir = tempfile::tempdir().unwrap();
        let id = SettingId::display("core", "hsize");
        let mut ctx = SettingsContext::new("");
        ctx.add(Setting::int(id.clone(), 4));
        let mut b = backend(dir.path(), &ctx);
        b.write_init(&ctx).unwrap();
        b.read_setting(&mut ctx, &id);
    }
}
