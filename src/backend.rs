//! Storage ports and their backing adapters.
//!
//! The entry store talks to two interchangeable key-value ports: an
//! asynchronous primary holding native [`Entry`] records and a synchronous
//! fallback (the mirror) holding JSON-serialized copies. Production uses
//! the file adapters; tests and embedders can substitute the in-memory
//! ones.

use std::{
    collections::HashMap,
    fs,
    io::Write,
    path::{Path, PathBuf},
    sync::Mutex,
};

use log::{debug, error, trace, warn};
use tempfile::NamedTempFile;
use walkdir::WalkDir;

use crate::{DaybookError, Entry, Result};

/// Asynchronous key-value port for native entry records.
///
/// Keys are opaque namespaced strings (`entry:<id>`); the adapter decides
/// how they map onto its medium. A missing key is `Ok(None)`, never an
/// error.
#[allow(async_fn_in_trait)]
pub trait PrimaryStore {
    async fn get(&self, key: &str) -> Result<Option<Entry>>;
    async fn put(&self, key: &str, entry: &Entry) -> Result<()>;
    async fn remove(&self, key: &str) -> Result<()>;
    async fn keys(&self) -> Result<Vec<String>>;
}

/// Synchronous key-value port for JSON-serialized entry copies.
///
/// Reads are infallible by design: a fallback that cannot be read simply
/// has nothing to offer, which the store treats as absence.
pub trait FallbackStore {
    fn get_raw(&self, key: &str) -> Option<String>;
    fn set_raw(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
    fn keys(&self) -> Vec<String>;
}

/// Maps a namespaced key to a filesystem-safe file name.
///
/// Keys contain a single `:` separator, which is not portable in file
/// names; ids themselves are timestamp-dash-alphanumeric, so `__` cannot
/// occur and the mapping is reversible.
fn key_to_filename(key: &str) -> String {
    format!("{}.json", key.replace(':', "__"))
}

fn filename_to_key(name: &str) -> Option<String> {
    name.strip_suffix(".json")
        .map(|stem| stem.replace("__", ":"))
}

fn list_key_files(dir: &Path) -> Vec<String> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .filter_map(|e| filename_to_key(&e.file_name().to_string_lossy()))
        .collect()
}

/// Primary adapter: one JSON file per key in a flat data directory.
///
/// Writes go through a temporary file in the same directory and an atomic
/// rename, so a crash mid-write never leaves a truncated record behind.
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Creates the adapter, ensuring the data directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            debug!("Data directory does not exist, creating: {}", dir.display());
            fs::create_dir_all(&dir).map_err(|e| {
                error!("Failed to create data directory {}: {}", dir.display(), e);
                DaybookError::Io(e)
            })?;
        }
        Ok(FileStore { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key_to_filename(key))
    }
}

impl PrimaryStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<Entry>> {
        // A missing data directory is an unavailable store, not a miss.
        if !self.dir.exists() {
            return Err(DaybookError::StorageFailed {
                message: format!("data directory missing: {}", self.dir.display()),
            });
        }

        let path = self.path_for(key);
        if !path.exists() {
            trace!("No record at {}", path.display());
            return Ok(None);
        }

        let raw = fs::read_to_string(&path)?;
        let entry: Entry = serde_json::from_str(&raw)?;
        Ok(Some(entry))
    }

    async fn put(&self, key: &str, entry: &Entry) -> Result<()> {
        let path = self.path_for(key);
        debug!("Writing record to {}", path.display());

        let json = serde_json::to_string_pretty(entry)?;

        let mut temp_file = NamedTempFile::new_in(&self.dir).map_err(|e| {
            error!("Failed to create temporary file: {}", e);
            DaybookError::Io(e)
        })?;
        temp_file.write_all(json.as_bytes())?;
        temp_file.flush()?;

        temp_file.persist(&path).map_err(|e| {
            error!("Failed to persist record {}: {}", path.display(), e.error);
            DaybookError::Io(e.error)
        })?;

        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
            debug!("Removed record {}", path.display());
        }
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Err(DaybookError::StorageFailed {
                message: format!("data directory missing: {}", self.dir.display()),
            });
        }
        Ok(list_key_files(&self.dir))
    }
}

/// Fallback adapter: one file per key holding the raw JSON text, written
/// with plain synchronous I/O. This is the durable mirror consulted when
/// the primary is unavailable.
pub struct FileMirror {
    dir: PathBuf,
}

impl FileMirror {
    /// Creates the adapter, ensuring the mirror directory exists.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        if !dir.exists() {
            debug!(
                "Mirror directory does not exist, creating: {}",
                dir.display()
            );
            fs::create_dir_all(&dir).map_err(|e| {
                error!(
                    "Failed to create mirror directory {}: {}",
                    dir.display(),
                    e
                );
                DaybookError::Io(e)
            })?;
        }
        Ok(FileMirror { dir })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(key_to_filename(key))
    }
}

impl FallbackStore for FileMirror {
    fn get_raw(&self, key: &str) -> Option<String> {
        fs::read_to_string(self.path_for(key)).ok()
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let path = self.path_for(key);
        fs::write(&path, value).map_err(|e| {
            warn!("Failed to write mirror record {}: {}", path.display(), e);
            DaybookError::Io(e)
        })
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path_for(key);
        if path.exists() {
            fs::remove_file(&path)?;
        }
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        if !self.dir.exists() {
            return Vec::new();
        }
        list_key_files(&self.dir)
    }
}

/// In-memory primary, the substitutable fake from the design notes. Also
/// handy for embedders that want a throwaway store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, Entry>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn locked(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Entry>>> {
        self.records
            .lock()
            .map_err(|_| DaybookError::ApplicationError {
                message: "memory store lock poisoned".to_string(),
            })
    }
}

impl PrimaryStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Entry>> {
        Ok(self.locked()?.get(key).cloned())
    }

    async fn put(&self, key: &str, entry: &Entry) -> Result<()> {
        self.locked()?.insert(key.to_string(), entry.clone());
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.locked()?.remove(key);
        Ok(())
    }

    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.locked()?.keys().cloned().collect())
    }
}

/// In-memory fallback counterpart of [`MemoryStore`].
#[derive(Debug, Default)]
pub struct MemoryMirror {
    records: Mutex<HashMap<String, String>>,
}

impl MemoryMirror {
    pub fn new() -> Self {
        Self::default()
    }
}

impl FallbackStore for MemoryMirror {
    fn get_raw(&self, key: &str) -> Option<String> {
        match self.records.lock() {
            Ok(records) => records.get(key).cloned(),
            Err(e) => {
                warn!("Failed to acquire lock on mirror records: {}", e);
                None
            }
        }
    }

    fn set_raw(&self, key: &str, value: &str) -> Result<()> {
        let mut records =
            self.records
                .lock()
                .map_err(|_| DaybookError::ApplicationError {
                    message: "memory mirror lock poisoned".to_string(),
                })?;
        records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut records =
            self.records
                .lock()
                .map_err(|_| DaybookError::ApplicationError {
                    message: "memory mirror lock poisoned".to_string(),
                })?;
        records.remove(key);
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        match self.records.lock() {
            Ok(records) => records.keys().cloned().collect(),
            Err(e) => {
                warn!("Failed to acquire lock on mirror records: {}", e);
                Vec::new()
            }
        }
    }
}
