//! Session progress persistence
//!
//! A small JSON record of the active level and its progress. Writing goes
//! through a temp file and a rename so a crash never leaves a torn save.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::sim::ProgressStats;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("save file I/O failed for {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("save data is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// What gets written to disk
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct SaveRecord {
    #[serde(rename = "level")]
    pub level_index: usize,
    /// Progress at save time; informational, not restored
    #[serde(default)]
    pub stats: ProgressStats,
}

impl SaveRecord {
    pub fn to_json(&self) -> Result<String, PersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<Self, PersistenceError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Write the record, replacing any previous save
    pub fn save_to(&self, path: &Path) -> Result<(), PersistenceError> {
        let io_err = |source| PersistenceError::Io {
            path: path.display().to_string(),
            source,
        };

        if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir).map_err(io_err)?;
        }
        let tmp = path.with_extension("tmp");
        std::fs::write(&tmp, self.to_json()?).map_err(io_err)?;
        std::fs::rename(&tmp, path).map_err(io_err)?;

        log::info!("Game saved (level {})", self.level_index + 1);
        Ok(())
    }

    /// Read a record; `Ok(None)` when no save exists yet
    pub fn load_from(path: &Path) -> Result<Option<Self>, PersistenceError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::info!("No saved game at {}", path.display());
                return Ok(None);
            }
            Err(source) => {
                return Err(PersistenceError::Io {
                    path: path.display().to_string(),
                    source,
                });
            }
        };
        let record = Self::from_json(&text)?;
        log::info!("Found saved game at level {}", record.level_index + 1);
        Ok(Some(record))
    }
}
