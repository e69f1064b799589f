//! Persisted ramp state.
//!
//! Ramps are stored as a JSON array of [`RampPath`] under a fixed key:
//!
//! ```json
//! [{"id": "path1", "color": "orange",
//!   "points": {"start": {"x": 0, "y": 400}, "cp1": {...}, "cp2": {...}, "end": {...}}}]
//! ```

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::error::Result;
use crate::geometry::RampPath;

/// Key under which ramps are persisted.
pub const STORAGE_KEY: &str = "physics-visualizer-paths";

/// Somewhere ramps can be saved and restored.
pub trait RampStore: Send {
    /// Reads the raw persisted document, `None` when nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be read.
    fn read(&self) -> Result<Option<String>>;

    /// Writes the raw document.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be written.
    fn write(&mut self, document: &str) -> Result<()>;

    /// Forgets the persisted document.
    ///
    /// # Errors
    ///
    /// Returns an error when the backing medium cannot be modified.
    fn clear(&mut self) -> Result<()>;

    /// Serializes and writes `ramps`.
    ///
    /// # Errors
    ///
    /// Returns an error when encoding or writing fails.
    fn save(&mut self, ramps: &[RampPath]) -> Result<()> {
        let document = encode_ramps(ramps)?;
        self.write(&document)?;
        debug!(ramps = ramps.len(), "Ramps saved");
        Ok(())
    }

    /// Loads persisted ramps.
    ///
    /// Missing, unreadable or malformed state yields `None` and a warning;
    /// callers fall back to defaults.
    fn load(&self) -> Option<Vec<RampPath>> {
        let document = match self.read() {
            Ok(Some(document)) => document,
            Ok(None) => {
                debug!("No saved ramps");
                return None;
            }
            Err(e) => {
                warn!(error = %e, "Could not read saved ramps, using defaults");
                return None;
            }
        };
        match decode_ramps(&document) {
            Ok(ramps) => {
                debug!(ramps = ramps.len(), "Saved ramps loaded");
                Some(ramps)
            }
            Err(e) => {
                warn!(error = %e, "Error loading saved ramps, using defaults");
                None
            }
        }
    }
}

/// Encodes ramps as the persisted JSON document.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] if serialization fails.
pub fn encode_ramps(ramps: &[RampPath]) -> Result<String> {
    Ok(serde_json::to_string_pretty(ramps)?)
}

/// Decodes the persisted JSON document.
///
/// # Errors
///
/// Returns [`crate::Error::Json`] for malformed documents.
pub fn decode_ramps(document: &str) -> Result<Vec<RampPath>> {
    Ok(serde_json::from_str(document)?)
}

/// Stores ramps in `<dir>/physics-visualizer-paths.json`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    /// A store inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            path: dir.as_ref().join(format!("{STORAGE_KEY}.json")),
        }
    }

    /// A store at an explicit file path.
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl RampStore for JsonFileStore {
    fn read(&self) -> Result<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(s) => Ok(Some(s)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, document: &str) -> Result<()> {
        if let Some(parent) = self.path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, document)?;
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Keeps documents in memory, keyed like browser local storage.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-seeded with a raw document.
    pub fn with_document(document: impl Into<String>) -> Self {
        let mut entries = HashMap::new();
        entries.insert(STORAGE_KEY.to_string(), document.into());
        Self { entries }
    }
}

impl RampStore for MemoryStore {
    fn read(&self) -> Result<Option<String>> {
        Ok(self.entries.get(STORAGE_KEY).cloned())
    }

    fn write(&mut self, document: &str) -> Result<()> {
        self.entries.insert(STORAGE_KEY.to_string(), document.to_string());
        Ok(())
    }

    fn clear(&mut self) -> Result<()> {
        self.entries.remove(STORAGE_KEY);
        Ok(())
    }
}
