// bridge/src/watch.rs

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use parking_lot::Mutex;
use std::{
    collections::{BTreeMap, BTreeSet},
    path::{Path, PathBuf},
    sync::Arc,
};
use tracing::{debug, trace};

use crate::error::Result;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WatchId(u32);

#[derive(Debug)]
struct WatchEntry {
    path: PathBuf,
    canonical: Option<PathBuf>,
    enabled: bool,
}

impl WatchEntry {
    fn matches(&self, path: &Path) -> bool {
        self.path == path || self.canonical.as_deref() == Some(path)
    }
}

#[derive(Debug, Default)]
struct WatchTable {
    next: u32,
    entries: BTreeMap<WatchId, WatchEntry>,
    pending: BTreeSet<WatchId>,
}

impl WatchTable {
    fn fire(&mut self, path: &Path) {
        let Self { entries, pending, .. } = self;
        for (id, entry) in entries.iter() {
            if entry.matches(path) {
                if entry.enabled {
                    trace!(?id, path = %path.display(), "watch fired");
                    pending.insert(*id);
                } else {
                    trace!(?id, path = %path.display(), "suspended watch, event dropped");
                }
            }
        }
    }
}

struct OsWatcher {
    watcher: RecommendedWatcher,
    dirs: BTreeSet<PathBuf>,
}

/// File-change watches with per-watch enable/disable.
///
/// The OS notification thread only queues the ids of enabled watches that
/// fired; the owner drains them with [`FileWatcher::take_pending`] on its
/// own thread, so handlers never run concurrently with a read or write pass.
#[derive(Clone)]
pub struct FileWatcher {
    table: Arc<Mutex<WatchTable>>,
    os: Option<Arc<Mutex<OsWatcher>>>,
}

impl FileWatcher {
    /// Watcher fed by OS change notifications.
    pub fn new() -> Result<Self> {
        let table = Arc::new(Mutex::new(WatchTable::default()));
        let sink = table.clone();
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let Ok(event) = res else { return };
            if matches!(event.kind, EventKind::Access(_)) {
                return;
            }
            let mut table = sink.lock();
            for path in &event.paths {
                table.fire(path);
            }
        })?;
        let os = OsWatcher { watcher, dirs: BTreeSet::new() };
        Ok(Self { table, os: Some(Arc::new(Mutex::new(os))) })
    }

    /// Watcher that only fires through [`FileWatcher::trigger`].
    pub fn manual() -> Self {
        Self { table: Arc::new(Mutex::new(WatchTable::default())), os: None }
    }

    pub fn add_watch(&self, path: &Path) -> Result<WatchId> {
        if let Some(os) = &self.os {
            // Watch the directory: editors replace files rather than rewrite them.
            let dir = watch_dir(path);
            let mut os = os.lock();
            if !os.dirs.contains(dir) {
                os.watcher.watch(dir, RecursiveMode::NonRecursive)?;
                os.dirs.insert(dir.to_path_buf());
            }
        }
        let mut table = self.table.lock();
        let id = WatchId(table.next);
        table.next += 1;
        let entry = WatchEntry {
            path: path.to_path_buf(),
            canonical: path.canonicalize().ok(),
            enabled: true,
        };
        table.entries.insert(id, entry);
        debug!(?id, path = %path.display(), "watch added");
        Ok(id)
    }

    /// Drops the watch; its directory is unwatched once no other watch uses it.
    pub fn remove_watch(&self, id: WatchId) {
        let removed = {
            let mut table = self.table.lock();
            table.pending.remove(&id);
            let Some(entry) = table.entries.remove(&id) else { return };
            let dir = watch_dir(&entry.path).to_path_buf();
            let in_use = table.entries.values().any(|e| watch_dir(&e.path) == dir);
            (!in_use).then_some(dir)
        };
        let (Some(dir), Some(os)) = (removed, &self.os) else { return };
        let mut os = os.lock();
        if os.dirs.remove(&dir) {
            if let Err(e) = os.watcher.unwatch(&dir) {
                debug!(dir = %dir.display(), error = %e, "unwatch failed");
            }
        }
    }

    #[cfg(test)]
    fn watched_dirs(&self) -> Vec<PathBuf> {
        self.os.as_ref().map(|os| os.lock().dirs.iter().cloned().collect()).unwrap_or_default()
    }

    pub fn enable(&self, id: WatchId) {
        self.set_enabled(id, true);
    }

    pub fn disable(&self, id: WatchId) {
        self.set_enabled(id, false);
    }

    fn set_enabled(&self, id: WatchId, enabled: bool) {
        if let Some(entry) = self.table.lock().entries.get_mut(&id) {
            entry.enabled = enabled;
        }
    }

    pub fn is_enabled(&self, id: WatchId) -> bool {
        self.table.lock().entries.get(&id).is_some_and(|e| e.enabled)
    }

    /// Reports a change to `path` as if the OS had.
    pub fn trigger(&self, path: &Path) {
        self.table.lock().fire(path);
    }

    /// Watches that fired since the last call.
    pub fn take_pending(&self) -> Vec<WatchId> {
        std::mem::take(&mut self.table.lock().pending).into_iter().collect()
    }
}

fn watch_dir(path: &Path) -> &Path {
    path.parent().unwrap_or(Path::new("."))
}
