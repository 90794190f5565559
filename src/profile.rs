// bridge/src/profile.rs

//! Where the store files live, and the named profiles of the primary store.
//!
//! The default profile (empty name) is `<basename>`; profile `p` is
//! `<basename>.<p>`.

use std::{
    fs,
    path::{Path, PathBuf},
};
use tracing::{info, warn};

use crate::error::{BridgeError, Result};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StoreLayout {
    pub dir: PathBuf,
    pub primary_basename: String,
    pub session_file: String,
    pub shortcuts_file: String,
}

impl StoreLayout {
    pub fn primary_file_name(&self, profile: &str) -> String {
        if profile.is_empty() {
            self.primary_basename.clone()
        } else {
            format!("{}.{}", self.primary_basename, profile)
        }
    }

    pub fn primary_path(&self, profile: &str) -> PathBuf {
        self.dir.join(self.primary_file_name(profile))
    }

    pub fn session_path(&self) -> PathBuf {
        self.dir.join(&self.session_file)
    }

    pub fn shortcuts_path(&self) -> PathBuf {
        self.dir.join(&self.shortcuts_file)
    }

    /// Named profiles found on disk, sorted; the default profile is not listed.
    pub fn list_profiles(&self) -> Vec<String> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(dir = %self.dir.display(), error = %e, "cannot list profiles");
                return Vec::new();
            }
        };
        let prefix = format!("{}.", self.primary_basename);
        let mut profiles: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_file()))
            .filter_map(|entry| entry.file_name().into_string().ok())
            .filter_map(|name| name.strip_prefix(&prefix).map(str::to_string))
            .filter(|profile| !profile.is_empty())
            .collect();
        profiles.sort();
        profiles
    }

    /// Removes a profile's file; the empty name removes the default
    /// profile's `<basename>`. Fails when the file does not exist.
    pub fn delete_profile(&self, profile: &str) -> Result<()> {
        let path = self.primary_path(profile);
        match fs::remove_file(&path) {
            Ok(()) => {
                info!(profile, "deleted profile");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(BridgeError::ProfileNotFound(profile.to_string()))
            }
            Err(source) => Err(BridgeError::StoreUnavailable { path, source }),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}
