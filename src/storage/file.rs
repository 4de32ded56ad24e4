//! File-backed store.
//!
//! Every key is kept in one TOML document of string values. The whole document is
//! rewritten on each `put`, which is fine for the handful of small keys stored here.
//! An unreadable or malformed file is treated as empty so a corrupt store never blocks startup.

use super::KeyValueStore;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    values: Mutex<BTreeMap<String, String>>,
}

impl FileStore {
    /// Opens the store at `path`, loading any existing contents.
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        let path = path.as_ref().to_path_buf();
        let values = match std::fs::read_to_string(&path) {
            Ok(contents) => toml::from_str(&contents).unwrap_or_else(|e| {
                warn!("Ignoring malformed store file {:?}: {}", path, e);
                BTreeMap::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("Store file {:?} does not exist yet, starting empty", path);
                BTreeMap::new()
            }
            Err(e) => {
                warn!("Failed to read store file {:?}: {}", path, e);
                BTreeMap::new()
            }
        };

        Self {
            path,
            values: Mutex::new(values),
        }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(&self, values: &BTreeMap<String, String>) -> Result<()> {
        let contents = toml::to_string(values).map_err(|e| Error::Storage {
            message: format!("Failed to serialize store: {e}"),
        })?;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, contents)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut values = self.values.lock().map_err(|e| Error::Storage {
            message: format!("File store lock poisoned: {e}"),
        })?;
        match value {
            Some(value) => values.insert(key.to_string(), value.to_string()),
            None => values.remove(key),
        };
        self.flush(&values)
    }
}
