use super::KeyValueStore;
use crate::errors::{Error, Result};
use std::collections::BTreeMap;
use std::sync::Mutex;

/// Process-local store, used by tests and when no store path is configured.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: Mutex<BTreeMap<String, String>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.values.lock().ok()?.get(key).cloned()
    }

    fn put(&self, key: &str, value: Option<&str>) -> Result<()> {
        let mut values = self.values.lock().map_err(|e| Error::Storage {
            message: format!("Memory store lock poisoned: {e}"),
        })?;
        match value {
            Some(value) => values.insert(key.to_string(), value.to_string()),
            None => values.remove(key),
        };
        Ok(())
    }
}
