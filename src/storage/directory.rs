use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::debug;

use super::{KeyValueStore, PersistenceError};

/// Store that keeps each key in `<dir>/<key>.json`.
///
/// Writes go through a temporary file in the same directory and are renamed
/// into place, so a crash mid-write never leaves a truncated value behind.
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    dir: PathBuf,
}

impl DirectoryStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Default location under the platform data directory
    #[must_use]
    pub fn default_dir() -> Option<PathBuf> {
        dirs::data_dir().map(|dir| dir.join("cafe-gestor"))
    }

    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> Result<PathBuf, PersistenceError> {
        if key.is_empty()
            || key.contains(['/', '\\'])
            || key.contains("..")
            || key.chars().any(char::is_control)
        {
            return Err(PersistenceError::Unavailable(format!(
                "invalid storage key '{key}'"
            )));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl KeyValueStore for DirectoryStore {
    fn load(&self, key: &str) -> Result<Option<String>, PersistenceError> {
        let path = self.path_for(key)?;
        match std::fs::read_to_string(&path) {
            Ok(text) => Ok(Some(text)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(source) => Err(PersistenceError::Read {
                key: key.to_string(),
                source,
            }),
        }
    }

    fn save(&self, key: &str, value: &str) -> Result<(), PersistenceError> {
        let path = self.path_for(key)?;
        let write_error = |source| PersistenceError::Write {
            key: key.to_string(),
            source,
        };

        std::fs::create_dir_all(&self.dir).map_err(write_error)?;
        let mut file = NamedTempFile::new_in(&self.dir).map_err(write_error)?;
        file.write_all(value.as_bytes()).map_err(write_error)?;
        file.persist(&path).map_err(|e| write_error(e.error))?;

        debug!("Saved {} bytes to {}", value.len(), path.display());
        Ok(())
    }
}
