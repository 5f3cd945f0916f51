use fs2::FileExt;
use log::warn;
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};
use thiserror::Error;

use polyver_platform::write_atomic;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PreferenceError {
    #[error("Failed to {action} preferences at {}: {message}", path.display())]
    Io {
        action: &'static str,
        path: PathBuf,
        kind: std::io::ErrorKind,
        message: String,
    },

    #[error("Failed to encode preferences: {message}")]
    Encode { message: String },
}

impl PreferenceError {
    fn io(action: &'static str, path: &Path, error: &std::io::Error) -> Self {
        Self::Io {
            action,
            path: path.to_path_buf(),
            kind: error.kind(),
            message: error.to_string(),
        }
    }
}

/// String key/value storage that survives restarts.
pub trait PreferenceStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    /// # Errors
    /// Returns [`PreferenceError`] when the value cannot be persisted.
    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError>;

    /// Removing a missing key succeeds.
    ///
    /// # Errors
    /// Returns [`PreferenceError`] when the change cannot be persisted.
    fn remove(&self, key: &str) -> Result<(), PreferenceError>;
}

/// Preferences kept in a JSON object on disk.
///
/// Writers take an advisory lock on a sibling `.lock` file, re-read the file
/// so that concurrent processes do not drop each other's keys, then replace
/// it atomically.
#[derive(Debug)]
pub struct JsonPreferenceStore {
    path: PathBuf,
    lock_path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl JsonPreferenceStore {
    #[must_use]
    pub fn open(path: PathBuf) -> Self {
        let values = read_values(&path).unwrap_or_default();
        let lock_path = path.with_extension("lock");
        Self {
            path,
            lock_path,
            values: Mutex::new(values),
        }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn update(
        &self,
        apply: impl FnOnce(&mut BTreeMap<String, String>),
    ) -> Result<(), PreferenceError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|error| {
                PreferenceError::io("create directory for", &self.path, &error)
            })?;
        }

        let lock_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|error| PreferenceError::io("open lock for", &self.path, &error))?;
        lock_file
            .lock_exclusive()
            .map_err(|error| PreferenceError::io("lock", &self.path, &error))?;

        let mut guard = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        let mut values = read_values(&self.path).unwrap_or_else(|| guard.clone());
        apply(&mut values);

        let encoded =
            serde_json::to_vec_pretty(&values).map_err(|error| PreferenceError::Encode {
                message: error.to_string(),
            })?;
        write_atomic(&self.path, &encoded)
            .map_err(|error| PreferenceError::io("write", &self.path, &error))?;

        *guard = values;
        drop(guard);
        drop(lock_file);
        Ok(())
    }
}

fn read_values(path: &Path) -> Option<BTreeMap<String, String>> {
    let content = std::fs::read_to_string(path).ok()?;
    match serde_json::from_str(&content) {
        Ok(values) => Some(values),
        Err(error) => {
            warn!("Ignoring malformed preferences {}: {error}", path.display());
            None
        }
    }
}

impl PreferenceStore for JsonPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.update(|values| {
            values.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        if self.get(key).is_none() {
            return Ok(());
        }
        self.update(|values| {
            values.remove(key);
        })
    }
}

#[derive(Debug, Default)]
pub struct MemoryPreferenceStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryPreferenceStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PreferenceError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(key);
        Ok(())
    }
}
