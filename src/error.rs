// bridge/src/error.rs

use std::path::PathBuf;
use thiserror::Error;

use crate::value::SettingType;

/// Failures that cross the backend boundary.
///
/// Missing keys and malformed values never show up here: the codec turns
/// them into "use the default" and the pass carries on.
#[derive(Debug, Error)]
pub enum BridgeError {
    #[error("store unavailable: {path}")]
    StoreUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse store {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("cannot serialize store {path}: {source}")]
    Serialize {
        path: PathBuf,
        #[source]
        source: toml::ser::Error,
    },

    #[error("profile not found: {0}")]
    ProfileNotFound(String),

    #[error("file watch failed: {0}")]
    Watch(#[from] notify::Error),

    #[error("no configuration directory available")]
    NoConfigDir,

    #[error("setting {setting}: value does not match declared type {expected:?}")]
    TypeMismatch { setting: String, expected: SettingType },

    #[error("a read or write pass is already active")]
    PassActive,
}

pub type Result<T> = std::result::Result<T, BridgeError>;
