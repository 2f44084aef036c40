//! Profile persistence.
//!
//! The store is a single JSON file holding the profile list in insertion
//! order. Profiles are identified by name; listings hand out a snapshot
//! sorted by name and never expose the stored list for in-place mutation.

use crate::profile::Profile;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors from loading or saving the profile store.
#[derive(Debug)]
pub enum StoreError {
    /// Store file could not be read.
    ReadFailed { path: PathBuf, source: std::io::Error },
    /// Store file could not be written.
    WriteFailed { path: PathBuf, source: std::io::Error },
    /// Store file is not valid profile JSON.
    InvalidFormat { path: PathBuf, reason: String },
    /// A profile with this name already exists.
    DuplicateName(String),
    /// No profile with this name exists.
    NotFound(String),
    /// Only named profiles can be stored.
    Unnamed,
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::ReadFailed { path, source } => {
                write!(f, "Failed to read profile store {}: {}", path.display(), source)
            }
            StoreError::WriteFailed { path, source } => {
                write!(f, "Failed to write profile store {}: {}", path.display(), source)
            }
            StoreError::InvalidFormat { path, reason } => {
                write!(f, "Invalid profile store {}: {}", path.display(), reason)
            }
            StoreError::DuplicateName(name) => {
                write!(f, "A profile named '{}' already exists", name)
            }
            StoreError::NotFound(name) => write!(f, "No profile named '{}'", name),
            StoreError::Unnamed => write!(f, "Cannot store a profile without a name"),
        }
    }
}

impl std::error::Error for StoreError {}

/// Owns the profile collection and its backing file.
#[derive(Debug)]
pub struct ProfileManager {
    path: PathBuf,
    profiles: Vec<Profile>,
}

impl ProfileManager {
    /// Loads the collection from `path`; a missing file is an empty store.
    pub fn load(path: PathBuf) -> Result<Self, StoreError> {
        if !path.exists() {
            return Ok(Self {
                path,
                profiles: Vec::new(),
            });
        }

        let text = fs::read_to_string(&path).map_err(|e| StoreError::ReadFailed {
            path: path.clone(),
            source: e,
        })?;
        let profiles: Vec<Profile> =
            serde_json::from_str(&text).map_err(|e| StoreError::InvalidFormat {
                path: path.clone(),
                reason: e.to_string(),
            })?;

        Ok(Self { path, profiles })
    }

    /// Writes the whole collection back to the store file.
    pub fn save(&self) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| StoreError::WriteFailed {
                path: self.path.clone(),
                source: e,
            })?;
        }

        let json =
            serde_json::to_string_pretty(&self.profiles).map_err(|e| StoreError::InvalidFormat {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        fs::write(&self.path, json).map_err(|e| StoreError::WriteFailed {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn store_path(&self) -> &Path {
        &self.path
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    /// Snapshot of the collection sorted by name. Recomputed per call so
    /// display order never leaks back into storage order.
    pub fn profiles(&self) -> Vec<Profile> {
        let mut snapshot = self.profiles.clone();
        snapshot.sort_by(|a, b| a.name.cmp(&b.name));
        snapshot
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles
            .iter()
            .find(|p| p.name.as_deref() == Some(name))
    }

    /// Adds a new named profile; names are unique within the store.
    pub fn add(&mut self, profile: Profile) -> Result<(), StoreError> {
        let name = profile.name.as_deref().ok_or(StoreError::Unnamed)?;
        if self.get(name).is_some() {
            return Err(StoreError::DuplicateName(name.to_string()));
        }
        self.profiles.push(profile);
        Ok(())
    }

    /// Replaces the profile with the same name, or appends it.
    pub fn upsert(&mut self, profile: Profile) -> Result<(), StoreError> {
        let name = profile.name.clone().ok_or(StoreError::Unnamed)?;
        match self
            .profiles
            .iter_mut()
            .find(|p| p.name.as_deref() == Some(name.as_str()))
        {
            Some(slot) => *slot = profile,
            None => self.profiles.push(profile),
        }
        Ok(())
    }

    /// Removes and returns the named profile.
    pub fn remove(&mut self, name: &str) -> Result<Profile, StoreError> {
        let index = self
            .profiles
            .iter()
            .position(|p| p.name.as_deref() == Some(name))
            .ok_or_else(|| StoreError::NotFound(name.to_string()))?;
        Ok(self.profiles.remove(index))
    }
}
