use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;
use watchdog_core::VersionSet;
use watchdog_logging::{watch_debug, watch_info};

use crate::persist::{AtomicFileWriter, PersistError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Version file corrupt: {path:?}: {message}")]
    Corrupt { path: PathBuf, message: String },
    #[error("failed to read version file {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to serialize versions: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write version file: {0}")]
    Persist(#[from] PersistError),
}

/// Snapshot of the last version set that produced an alert, kept as a
/// pretty-printed JSON array.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing snapshot is a first run and loads as an empty set.
    pub fn load(&self) -> Result<VersionSet, StoreError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                watch_info!("No version file at {:?}; starting fresh", self.path);
                return Ok(VersionSet::new());
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        let versions: VersionSet =
            serde_json::from_str(&content).map_err(|err| StoreError::Corrupt {
                path: self.path.clone(),
                message: err.to_string(),
            })?;
        watch_debug!("Loaded {} versions from {:?}", versions.len(), self.path);
        Ok(versions)
    }

    pub fn save(&self, versions: &VersionSet) -> Result<(), StoreError> {
        let content = serde_json::to_string_pretty(versions)?;
        AtomicFileWriter::new(self.path.clone()).write(&content)?;
        watch_debug!("Saved {} versions to {:?}", versions.len(), self.path);
        Ok(())
    }
}
