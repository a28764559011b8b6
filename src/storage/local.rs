//! Local filesystem state store.
//!
//! Writes go to a sibling `.tmp` file which is then renamed over the target,
//! so a crash mid-write leaves the previous record intact.
//!
//! A store opened with `open_exclusive` holds an advisory lock on a sibling
//! `.lock` file until dropped; a second process opening the same state file
//! gets `PersistError::Locked`.

use std::ffi::OsString;
use std::fs::{File, TryLockError};
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::PersistError;
use crate::models::KnownState;
use crate::storage::StateStore;

/// JSON file backend for `KnownState`.
#[derive(Debug)]
pub struct LocalStateStore {
    path: PathBuf,
    /// Held for the store's lifetime when opened exclusively
    _lock: Option<File>,
}

impl LocalStateStore {
    /// Create an unlocked store backed by the file at `path`.
    ///
    /// Suitable for read-only inspection; writers use `open_exclusive`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            _lock: None,
        }
    }

    /// Create a store that owns the state file until dropped.
    pub async fn open_exclusive(path: impl Into<PathBuf>) -> Result<Self, PersistError> {
        let mut store = Self::new(path);
        store.ensure_dir().await?;

        let lock_path = store.lock_path();
        let file = tokio::fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&lock_path)
            .await?
            .into_std()
            .await;

        match file.try_lock() {
            Ok(()) => {}
            Err(TryLockError::WouldBlock) => {
                return Err(PersistError::Locked { path: lock_path });
            }
            Err(TryLockError::Error(e)) => return Err(e.into()),
        }
        log::debug!("Locked {}", lock_path.display());

        store._lock = Some(file);
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// `<state file>.lock`
    pub fn lock_path(&self) -> PathBuf {
        let mut name = OsString::from(self.path.as_os_str());
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<(), PersistError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<(), PersistError> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> std::io::Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> KnownState {
        let bytes = match self.read_bytes().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                log::info!(
                    "No state file at {}, starting empty",
                    self.path.display()
                );
                return KnownState::new();
            }
            Err(e) => {
                log::warn!(
                    "Failed to read state file {}: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                return KnownState::new();
            }
        };

        match KnownState::from_json(&bytes) {
            Ok(state) => {
                log::info!(
                    "Loaded {} known items from {}",
                    state.len(),
                    self.path.display()
                );
                state
            }
            Err(e) => {
                log::warn!(
                    "State file {} is malformed: {}. Starting empty.",
                    self.path.display(),
                    e
                );
                KnownState::new()
            }
        }
    }

    async fn save(&self, state: &KnownState) -> Result<(), PersistError> {
        let bytes = state.to_json()?;
        self.write_bytes(&bytes).await?;
        log::debug!(
            "Saved {} known items to {}",
            state.len(),
            self.path.display()
        );
        Ok(())
    }
}
