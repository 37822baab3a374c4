//! Filesystem preference substrate
//!
//! The whole key space is one JSON object in one file. Commits are atomic:
//! - a sibling temporary file is opened with the configured mode (unix)
//! - the next document is written to it and flushed
//! - the temporary file is renamed over the document
//!
//! The temporary file is removed if any step fails.
//!
//! A reader therefore sees either the previous or the next document, never a
//! partial one.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use pulse_core::{
    PreferenceStorageEffects, Preferences, PreferencesMutation, PreferencesStream, StorageError,
};
use serde::{Deserialize, Serialize};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use super::cell::{PreferenceCell, SnapshotState};

/// What to do with a document that exists but cannot be parsed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CorruptionPolicy {
    /// Report the corruption to every subscriber and refuse edits
    #[default]
    Fail,
    /// Discard the document and continue from an empty snapshot
    ReplaceWithEmpty,
}

/// Configuration for the filesystem substrate
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilesystemPreferenceConfig {
    /// Handling of unparseable documents
    pub corruption: CorruptionPolicy,
    /// File permissions mode applied to each committed document (unix only)
    pub file_permissions: u32,
    /// Create the parent directory on open if it does not exist
    pub create_parent_dirs: bool,
}

impl Default for FilesystemPreferenceConfig {
    fn default() -> Self {
        Self {
            corruption: CorruptionPolicy::Fail,
            file_permissions: 0o600, // Owner read/write only
            create_parent_dirs: true,
        }
    }
}

impl FilesystemPreferenceConfig {
    /// Create config with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the corruption policy
    pub fn with_corruption_policy(mut self, policy: CorruptionPolicy) -> Self {
        self.corruption = policy;
        self
    }

    /// Set the permissions mode for committed documents
    pub fn with_file_permissions(mut self, mode: u32) -> Self {
        self.file_permissions = mode;
        self
    }
}

/// Durable preference substrate backed by a single JSON document.
///
/// The document is read once on `open` (and again on `reload`); afterwards
/// the in-memory snapshot is authoritative for this instance.
#[derive(Debug)]
pub struct FilesystemPreferenceHandler {
    path: PathBuf,
    config: FilesystemPreferenceConfig,
    cell: PreferenceCell,
}

impl FilesystemPreferenceHandler {
    /// Open the document at `path`, creating nothing until the first commit.
    pub async fn open(
        path: impl Into<PathBuf>,
        config: FilesystemPreferenceConfig,
    ) -> Result<Self, StorageError> {
        let path = path.into();
        if config.create_parent_dirs {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).await.map_err(|e| {
                    StorageError::configuration(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    ))
                })?;
            }
        }

        let initial = load_document(&path, &config).await;
        info!(path = %path.display(), readable = initial.is_ok(), "Opened preference store");

        Ok(Self {
            path,
            config,
            cell: PreferenceCell::new(initial),
        })
    }

    /// Re-read the document from disk and publish it to subscribers.
    ///
    /// Picks up changes made by other writers of the same file. The returned
    /// error mirrors what subscribers receive.
    pub async fn reload(&self) -> Result<(), StorageError> {
        self.cell
            .replace(|| load_document(&self.path, &self.config))
            .await;
        self.cell.current().map(|_| ())
    }

    /// Path of the backing document
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl PreferenceStorageEffects for FilesystemPreferenceHandler {
    fn data(&self) -> PreferencesStream {
        self.cell.subscribe()
    }

    async fn edit(&self, mutation: PreferencesMutation) -> Result<Preferences, StorageError> {
        let committed = self
            .cell
            .commit(mutation, |next| {
                write_document(&self.path, self.config.file_permissions, next)
            })
            .await?;
        debug!(path = %self.path.display(), keys = committed.len(), "Committed preferences");
        Ok(committed)
    }
}

/// Read the document and apply the corruption policy.
async fn load_document(path: &Path, config: &FilesystemPreferenceConfig) -> SnapshotState {
    match read_document(path).await {
        Err(StorageError::Corrupted { reason })
            if config.corruption == CorruptionPolicy::ReplaceWithEmpty =>
        {
            warn!(path = %path.display(), %reason, "Replacing corrupted preference document");
            let empty = Preferences::new();
            write_document(path, config.file_permissions, empty.clone()).await?;
            Ok(empty)
        }
        other => other,
    }
}

async fn read_document(path: &Path) -> SnapshotState {
    match fs::read(path).await {
        Ok(bytes) => serde_json::from_slice(&bytes).map_err(|e| {
            StorageError::corrupted(format!("{}: {e}", path.display()))
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Preferences::new()),
        Err(e) => Err(StorageError::ReadFailed(format!(
            "Failed to read {}: {e}",
            path.display()
        ))),
    }
}

async fn write_document(path: &Path, mode: u32, prefs: Preferences) -> Result<(), StorageError> {
    let bytes = serde_json::to_vec_pretty(&prefs)
        .map_err(|e| StorageError::WriteFailed(format!("Failed to encode document: {e}")))?;

    let tmp_path = temp_path(path);
    let result = match write_temp_file(&tmp_path, mode, &bytes).await {
        Ok(()) => fs::rename(&tmp_path, path).await.map_err(|e| {
            StorageError::WriteFailed(format!("Failed to replace {}: {e}", path.display()))
        }),
        Err(error) => Err(error),
    };

    if result.is_err() {
        if let Err(e) = fs::remove_file(&tmp_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!(path = %tmp_path.display(), error = %e, "Failed to remove temp file");
            }
        }
    }
    result
}

/// Write `bytes` to `tmp_path`, restricted to `mode` before any data lands.
async fn write_temp_file(tmp_path: &Path, mode: u32, bytes: &[u8]) -> Result<(), StorageError> {
    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    options.mode(mode);

    let mut file = options
        .open(tmp_path)
        .await
        .map_err(|e| StorageError::WriteFailed(format!("Failed to create temp file: {e}")))?;

    // A stale temp file keeps its old mode; `mode` only applies on creation
    set_permissions(tmp_path, mode).await?;

    file.write_all(bytes)
        .await
        .map_err(|e| StorageError::WriteFailed(format!("Failed to write temp file: {e}")))?;
    file.sync_all()
        .await
        .map_err(|e| StorageError::WriteFailed(format!("Failed to sync temp file: {e}")))
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(unix)]
async fn set_permissions(path: &Path, mode: u32) -> Result<(), StorageError> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(path, std::fs::Permissions::from_mode(mode))
        .await
        .map_err(|e| StorageError::WriteFailed(format!("Failed to set permissions: {e}")))
}

#[cfg(not(unix))]
async fn set_permissions(_path: &Path, _mode: u32) -> Result<(), StorageError> {
    Ok(())
}
