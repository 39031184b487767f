//! Level definition providers

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

/// Built-in levels, embedded at compile time
const BUILTIN_LEVELS: &str = include_str!("../../levels/builtin.json");

/// Supplies raw (unvalidated) level definitions by index
pub trait LevelSource {
    /// Raw definition for `index`, or `None` if out of range
    fn get(&self, index: usize) -> Option<&Value>;
    /// Number of levels available
    fn count(&self) -> usize;
}

#[derive(Debug, Error)]
pub enum PackError {
    #[error("could not read level pack {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid level pack JSON: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("level pack must be a JSON list of level definitions")]
    NotAList,
}

/// An ordered list of raw level definitions, typically read from JSON
#[derive(Debug, Clone, Default)]
pub struct LevelPack {
    levels: Vec<Value>,
}

impl LevelPack {
    pub fn new(levels: Vec<Value>) -> Self {
        Self { levels }
    }

    /// Parse a pack from a JSON list; entries are not validated here
    pub fn from_json(json: &str) -> Result<Self, PackError> {
        match serde_json::from_str(json)? {
            Value::Array(levels) => Ok(Self::new(levels)),
            _ => Err(PackError::NotAList),
        }
    }

    pub fn read(path: &Path) -> Result<Self, PackError> {
        let text = std::fs::read_to_string(path).map_err(|source| PackError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&text)
    }

    /// The levels shipped with the game
    pub fn builtin() -> Self {
        match Self::from_json(BUILTIN_LEVELS) {
            Ok(pack) => pack,
            Err(e) => {
                log::error!("Built-in level pack is broken: {e}");
                Self::default()
            }
        }
    }
}

impl LevelSource for LevelPack {
    fn get(&self, index: usize) -> Option<&Value> {
        self.levels.get(index)
    }

    fn count(&self) -> usize {
        self.levels.len()
    }
}
