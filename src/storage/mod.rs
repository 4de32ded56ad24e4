//! Local key-value persistence.
//!
//! All state lives under a small set of string keys. [`KeyValueStore`] is the seam
//! between the repositories and the storage mechanics; [`PreferencesStorage`] wraps a
//! store with typed load/save helpers built on the flat codecs.

/// Single-file TOML backed store
pub mod file;
/// In-memory store
pub mod memory;
/// Typed accessors over a store
pub mod preferences;

pub use file::FileStore;
pub use memory::MemoryStore;
pub use preferences::PreferencesStorage;

use crate::errors::Result;

/// Minimal string key-value store.
///
/// Writing `None` removes the key.
pub trait KeyValueStore: Send + Sync {
    /// Returns the stored value for `key`, if any.
    fn get(&self, key: &str) -> Option<String>;

    /// Stores or removes the value for `key`.
    fn put(&self, key: &str, value: Option<&str>) -> Result<()>;
}
