//! Persisted set of bridged event ids.
//!
//! The store is a JSON array of event id strings. Every update rewrites the
//! whole set to a temporary file in the same directory and renames it over
//! the store path, so a crash mid-write leaves the previous file intact.

use std::collections::HashSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::common::error::PersistenceError;

/// Set of event ids that have been published to the target.
#[derive(Debug)]
pub struct DedupStore {
    path: PathBuf,
    ids: Mutex<HashSet<String>>,
    /// Serializes file rewrites so a newer snapshot is never replaced by an older one.
    write_lock: Mutex<()>,
}

impl DedupStore {
    /// Load the store from `path`.
    ///
    /// A missing file is a cold start and yields an empty set. A file that
    /// exists but cannot be read or parsed is an error: starting empty would
    /// re-bridge the author's history.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self, PersistenceError> {
        let path = path.into();

        let ids = match std::fs::read(&path) {
            Ok(bytes) => {
                let list: Vec<String> =
                    serde_json::from_slice(&bytes).map_err(|source| PersistenceError::Corrupt {
                        path: path.display().to_string(),
                        source,
                    })?;
                info!(
                    "Loaded {} processed event ids from {}",
                    list.len(),
                    path.display()
                );
                list.into_iter().collect()
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "No processed events file at {}, starting with an empty set",
                    path.display()
                );
                HashSet::new()
            }
            Err(source) => {
                return Err(PersistenceError::Read {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        Ok(Self {
            path,
            ids: Mutex::new(ids),
            write_lock: Mutex::new(()),
        })
    }

    pub fn is_processed(&self, id: &str) -> bool {
        self.ids().contains(id)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.ids().len()
    }

    /// Record `id` as bridged and persist the full set before returning.
    ///
    /// The id is kept in memory even if the write fails, so this process
    /// never bridges it twice. Recording an id already present is a no-op.
    pub fn mark_processed(&self, id: &str) -> Result<(), PersistenceError> {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let snapshot = {
            let mut ids = self.ids();
            if !ids.insert(id.to_string()) {
                return Ok(());
            }
            let mut list: Vec<String> = ids.iter().cloned().collect();
            list.sort_unstable();
            list
        };

        let staged = stage_snapshot(&self.path, &snapshot)?;
        commit_snapshot(staged, &self.path)?;
        debug!(event_id = id, "Persisted {} processed event ids", snapshot.len());
        Ok(())
    }

    fn ids(&self) -> MutexGuard<'_, HashSet<String>> {
        self.ids.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Write `ids` to a synced temporary file next to `path`.
fn stage_snapshot(path: &Path, ids: &[String]) -> Result<NamedTempFile, PersistenceError> {
    let write_err = |message: String| PersistenceError::Write {
        path: path.display().to_string(),
        message,
    };

    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut staged = NamedTempFile::new_in(dir)
        .map_err(|e| write_err(format!("cannot create temp file: {}", e)))?;
    let json = serde_json::to_vec(ids).map_err(|e| write_err(e.to_string()))?;
    staged
        .as_file_mut()
        .write_all(&json)
        .map_err(|e| write_err(format!("cannot write temp file: {}", e)))?;
    staged
        .as_file()
        .sync_all()
        .map_err(|e| write_err(format!("cannot sync temp file: {}", e)))?;

    Ok(staged)
}

/// Atomically rename a staged snapshot over `path`.
fn commit_snapshot(staged: NamedTempFile, path: &Path) -> Result<(), PersistenceError> {
    staged
        .persist(path)
        .map_err(|e| PersistenceError::Write {
            path: path.display().to_string(),
            message: format!("cannot rename temp file: {}", e.error),
        })?;
    Ok(())
}
