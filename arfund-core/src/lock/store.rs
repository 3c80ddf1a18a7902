//! Single-slot storage for the weekly lock.
//!
//! The slot is read and written wholesale as JSON. `FileLockStore` backs the
//! real dashboard; `MemoryLockStore` lets the lock logic run without a
//! filesystem. Neither guards against concurrent writers.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;

use super::record::LockRecord;

#[derive(Debug, Error)]
pub enum LockError {
    #[error("lock file I/O at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("lock slot is corrupt: {0}")]
    Corrupt(String),

    #[error("failed to serialize lock record: {0}")]
    Serialize(String),
}

/// A durable slot holding at most one [`LockRecord`].
pub trait LockStore: Send + Sync {
    /// Read the slot. `Ok(None)` when nothing has been written yet.
    fn load(&self) -> Result<Option<LockRecord>, LockError>;

    /// Replace the slot's contents.
    fn save(&self, record: &LockRecord) -> Result<(), LockError>;

    /// Empty the slot.
    fn clear(&self) -> Result<(), LockError>;
}

fn parse(raw: &str) -> Result<LockRecord, LockError> {
    LockRecord::from_json(raw).map_err(|e| LockError::Corrupt(e.to_string()))
}

fn render(record: &LockRecord) -> Result<String, LockError> {
    record
        .to_json()
        .map_err(|e| LockError::Serialize(e.to_string()))
}

/// In-memory slot holding the raw JSON text.
#[derive(Debug, Default)]
pub struct MemoryLockStore {
    slot: Mutex<Option<String>>,
    writes: Mutex<usize>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-seed the slot with raw text (which need not be valid).
    pub fn with_raw(raw: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(raw.into())),
            writes: Mutex::new(0),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<String>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Current raw slot contents.
    pub fn raw(&self) -> Option<String> {
        self.slot().clone()
    }

    /// Number of successful saves.
    pub fn write_count(&self) -> usize {
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LockStore for MemoryLockStore {
    fn load(&self) -> Result<Option<LockRecord>, LockError> {
        self.slot().as_deref().map(parse).transpose()
    }

    fn save(&self, record: &LockRecord) -> Result<(), LockError> {
        let json = render(record)?;
        *self.slot() = Some(json);
        *self.writes.lock().unwrap_or_else(PoisonError::into_inner) += 1;
        Ok(())
    }

    fn clear(&self) -> Result<(), LockError> {
        *self.slot() = None;
        Ok(())
    }
}

/// JSON file slot. Writes go to a `.tmp` sibling and are renamed into place.
#[derive(Debug, Clone)]
pub struct FileLockStore {
    path: PathBuf,
}

impl FileLockStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> LockError {
        LockError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl LockStore for FileLockStore {
    fn load(&self) -> Result<Option<LockRecord>, LockError> {
        match fs::read_to_string(&self.path) {
            Ok(raw) => parse(&raw).map(Some),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    fn save(&self, record: &LockRecord) -> Result<(), LockError> {
        let json = render(record)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            let _ = fs::remove_file(&tmp);
            self.io_err(e)
        })
    }

    fn clear(&self) -> Result<(), LockError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(self.io_err(e)),
        }
    }
}
