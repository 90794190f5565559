// bridge/src/reload_bus.rs

use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::debug;

/// Asks the running window manager to re-read its configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReloadRequest {
    pub profile: String,
    /// Session files that were rewritten.
    pub files: Vec<PathBuf>,
}

pub trait ReloadBus: Send + Sync {
    /// Fire-and-forget; delivery failures are not reported back.
    fn request_reload(&self, request: &ReloadRequest);
}

#[derive(Clone)]
pub struct BroadcastBus {
    tx: broadcast::Sender<ReloadRequest>,
}

impl BroadcastBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ReloadRequest> {
        self.tx.subscribe()
    }
}

impl Default for BroadcastBus {
    fn default() -> Self {
        Self::new(64)
    }
}

impl ReloadBus for BroadcastBus {
    fn request_reload(&self, request: &ReloadRequest) {
        let _ = self.tx.send(request.clone());
    }
}

/// For hosts with no session to notify.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullBus;

impl ReloadBus for NullBus {
    fn request_reload(&self, request: &ReloadRequest) {
        debug!(profile = %request.profile, "reload requested with no bus attached");
    }
}
