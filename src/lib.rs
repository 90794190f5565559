pub mod error;
pub mod binding;
pub mod value;
pub mod context;
pub mod codec;
pub mod store;
pub mod config;
pub mod profile;
pub mod watch;
pub mod reload_bus;
pub mod rules;
pub mod integration;
pub mod engine;
pub mod session;
pub mod backend;

pub use error::{BridgeError, Result};
pub use binding::{ButtonBinding, Color, Edges, KeyBinding, Modifiers};
pub use value::{SettingType, SettingValue, Value, ValueKind};
pub use context::{Scope, Setting, SettingId, SettingsContext};
pub use config::BridgeConfig;
pub use profile::StoreLayout;
pub use watch::{FileWatcher, WatchId};
pub use reload_bus::{BroadcastBus, NullBus, ReloadBus, ReloadRequest};
pub use backend::Backend;
