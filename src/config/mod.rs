/// Application settings loaded from config.toml and the environment
pub mod app;

/// Restaurant and menu catalog loaded from catalog.toml
pub mod catalog;

pub use app::{AppConfig, DeliveryConfig, Paths, StorageConfig, load_config};
pub use catalog::{Catalog, load_catalog};
