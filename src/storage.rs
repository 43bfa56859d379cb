//! Project persistence.
//!
//! The project document is the camelCase JSON form of [`Project`]. It is
//! used in two places:
//!
//! - **Snapshots**: the last auto-saved state, kept in a [`SnapshotStore`]
//!   (a JSON file on disk, or memory in tests). A snapshot is refused when
//!   its serialized form exceeds [`SNAPSHOT_LIMIT`] characters; the store
//!   keeps its previous content.
//! - **Project files**: explicit export/import of a `.json` file, with no
//!   size limit.
//!
//! ## Validation
//!
//! Deliberately shallow. A document must be a JSON object with a `scenes`
//! array; anything else is a [`StorageError::Format`]. Inner fields that
//! are missing take their defaults, and an out-of-range
//! `currentSceneIndex` is repaired on load (see [`Project::repair`]).
//!
//! Nothing here schedules saves; debouncing lives in
//! [`session`](crate::session).

use crate::project::Project;
use serde_json::Value;
use sha2::{Digest, Sha256};
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Largest snapshot accepted, in serialized characters.
pub const SNAPSHOT_LIMIT: usize = 5_000_000;

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Invalid project document: {0}")]
    Format(String),
    #[error("Project too large to snapshot ({size} characters, limit {limit})")]
    Capacity { size: usize, limit: usize },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Somewhere to keep the latest snapshot payload.
pub trait SnapshotStore {
    fn read(&self) -> io::Result<Option<String>>;
    fn write(&mut self, payload: &str) -> io::Result<()>;
}

/// Snapshot kept in a single JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotStore for FileStore {
    fn read(&self) -> io::Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    fn write(&mut self, payload: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        // write-then-rename so a crash never leaves half a snapshot
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, payload)?;
        fs::rename(&tmp, &self.path)
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    payload: Option<String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn payload(&self) -> Option<&str> {
        self.payload.as_deref()
    }
}

impl SnapshotStore for MemoryStore {
    fn read(&self) -> io::Result<Option<String>> {
        Ok(self.payload.clone())
    }

    fn write(&mut self, payload: &str) -> io::Result<()> {
        self.payload = Some(payload.to_string());
        Ok(())
    }
}

/// Identifies a stored snapshot: SHA-256 of its payload, hex encoded.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SnapshotHandle(String);

impl SnapshotHandle {
    fn of(payload: &str) -> Self {
        Self(format!("{:x}", Sha256::digest(payload.as_bytes())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SnapshotHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Store a snapshot of `project`.
///
/// Fails with [`StorageError::Capacity`] without touching the store when
/// the document is over [`SNAPSHOT_LIMIT`].
pub fn save(store: &mut impl SnapshotStore, project: &Project) -> Result<SnapshotHandle, StorageError> {
    let payload = serde_json::to_string(project)?;
    let size = payload.chars().count();
    if size > SNAPSHOT_LIMIT {
        return Err(StorageError::Capacity {
            size,
            limit: SNAPSHOT_LIMIT,
        });
    }
    store.write(&payload)?;
    Ok(SnapshotHandle::of(&payload))
}

/// The last stored snapshot, or `None` when nothing was saved yet.
pub fn load(store: &impl SnapshotStore) -> Result<Option<Project>, StorageError> {
    store
        .read()?
        .map(|payload| parse(payload.as_bytes()))
        .transpose()
}

/// Serialize a project as a standalone, human-readable file.
///
/// A project with no scenes exports too: the project file is the working
/// document the CLI edits, and `init` starts it empty. Exporting a *site*
/// still refuses empty projects ([`GenerateError::NoScenes`]).
///
/// [`GenerateError::NoScenes`]: crate::generate::GenerateError::NoScenes
pub fn export_to_file(project: &Project) -> Result<Vec<u8>, StorageError> {
    Ok(serde_json::to_vec_pretty(project)?)
}

/// Parse a project file produced by [`export_to_file`] (or by hand).
pub fn import_from_file(bytes: &[u8]) -> Result<Project, StorageError> {
    parse(bytes)
}

fn parse(bytes: &[u8]) -> Result<Project, StorageError> {
    let value: Value =
        serde_json::from_slice(bytes).map_err(|e| StorageError::Format(e.to_string()))?;
    if !value.get("scenes").is_some_and(Value::is_array) {
        return Err(StorageError::Format("missing \"scenes\" array".to_string()));
    }
    let mut project: Project =
        serde_json::from_value(value).map_err(|e| StorageError::Format(e.to_string()))?;
    project.repair();
    Ok(project)
}
