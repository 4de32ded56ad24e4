//! Application settings loaded from config.toml
//!
//! Every section is optional; a missing file yields the defaults. File locations come
//! from the environment (after `.env` has been loaded):
//!
//! - `DASHCART_CONFIG` - settings file, default `config.toml`
//! - `DASHCART_CATALOG` - catalog file, default `catalog.toml`
//! - `DASHCART_STORE` - overrides `[storage] path`

use crate::core::delivery::{DEFAULT_MAX_DELAY_SECS, DEFAULT_MIN_DELAY_SECS, DeliveryTiming};
use crate::core::pricing::{FeeSettings, PromoBook, PromoDefinition, PromoKind};
use crate::errors::{Error, Result};
use serde::Deserialize;
use std::env::VarError;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

const CONFIG_ENV: &str = "DASHCART_CONFIG";
const CATALOG_ENV: &str = "DASHCART_CATALOG";
const STORE_ENV: &str = "DASHCART_STORE";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Deserialize, Clone, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Flat fees and tax rate charged on non-empty carts
    pub fees: FeeSettings,
    /// Per-stage delay bounds of the delivery simulation
    pub delivery: DeliveryConfig,
    /// Known promo codes; empty means the built-in set
    pub promos: Vec<PromoDefinition>,
    /// Where persisted state lives
    pub storage: StorageConfig,
}

/// Delivery simulation settings
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Lower bound of the per-stage delay, in seconds
    pub min_delay_secs: u32,
    /// Upper bound of the per-stage delay, in seconds (inclusive)
    pub max_delay_secs: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            min_delay_secs: DEFAULT_MIN_DELAY_SECS,
            max_delay_secs: DEFAULT_MAX_DELAY_SECS,
        }
    }
}

/// Storage settings
#[derive(Debug, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(default)]
pub struct StorageConfig {
    /// Store file; `None` keeps state in memory only
    pub path: Option<PathBuf>,
}

impl AppConfig {
    /// Checks value ranges that serde cannot express.
    ///
    /// # Errors
    /// Returns `Error::Config` when the delay bounds are inverted, a fee or the tax
    /// rate is negative, or a promo has a blank code or an out-of-range value.
    pub fn validate(&self) -> Result<()> {
        if self.delivery.min_delay_secs > self.delivery.max_delay_secs {
            return Err(Error::Config {
                message: format!(
                    "delivery.min_delay_secs ({}) exceeds delivery.max_delay_secs ({})",
                    self.delivery.min_delay_secs, self.delivery.max_delay_secs
                ),
            });
        }
        if self.fees.delivery_fee_cents < 0 || self.fees.service_fee_cents < 0 {
            return Err(Error::Config {
                message: "fees must not be negative".to_string(),
            });
        }
        if !self.fees.tax_rate.is_finite() || self.fees.tax_rate < 0.0 {
            return Err(Error::Config {
                message: format!("fees.tax_rate must be a non-negative number, got {}", self.fees.tax_rate),
            });
        }
        for promo in &self.promos {
            validate_promo(promo)?;
        }
        Ok(())
    }

    #[must_use]
    pub fn delivery_timing(&self) -> DeliveryTiming {
        DeliveryTiming::new(self.delivery.min_delay_secs, self.delivery.max_delay_secs)
    }

    /// The configured promo codes, or the built-in set when none are configured.
    #[must_use]
    pub fn promo_book(&self) -> PromoBook {
        if self.promos.is_empty() {
            PromoBook::default()
        } else {
            PromoBook::new(self.promos.iter().cloned())
        }
    }
}

fn validate_promo(promo: &PromoDefinition) -> Result<()> {
    if promo.code.trim().is_empty() {
        return Err(Error::Config {
            message: "promo code must not be blank".to_string(),
        });
    }
    let in_range = match promo.kind {
        PromoKind::PercentOff => (0..=100).contains(&promo.value),
        PromoKind::FixedCentsOff => promo.value >= 0,
    };
    if !in_range {
        return Err(Error::Config {
            message: format!("promo {} has out-of-range value {}", promo.code, promo.value),
        });
    }
    Ok(())
}

/// Loads application settings from a TOML file
///
/// # Arguments
/// * `path` - Path to the config.toml file
///
/// # Returns
/// * `Ok(AppConfig)` - Parsed and validated settings, or the defaults if the file is missing
/// * `Err(Error)` - Failed to read, parse or validate the file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Attempting to load configuration from: {:?}", path);

    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!("No config file at {:?}, using defaults", path);
            return Ok(AppConfig::default());
        }
        Err(e) => {
            return Err(Error::Config {
                message: format!("Failed to read config file {path:?}: {e}"),
            });
        }
    };

    let config: AppConfig = toml::from_str(&contents).map_err(|e| Error::Config {
        message: format!("Failed to parse {path:?}: {e}"),
    })?;
    config.validate()?;
    Ok(config)
}

/// File locations resolved from the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paths {
    pub config: PathBuf,
    pub catalog: PathBuf,
    pub store_override: Option<PathBuf>,
}

impl Paths {
    /// Reads `DASHCART_CONFIG`, `DASHCART_CATALOG` and `DASHCART_STORE`.
    ///
    /// # Errors
    /// Returns `Error::EnvVar` when a variable is set but not valid unicode.
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            config: optional_var(CONFIG_ENV)?.map_or_else(|| "config.toml".into(), PathBuf::from),
            catalog: optional_var(CATALOG_ENV)?.map_or_else(|| "catalog.toml".into(), PathBuf::from),
            store_override: optional_var(STORE_ENV)?.map(PathBuf::from),
        })
    }

    /// Store path to use: the environment override, then the config file's setting.
    #[must_use]
    pub fn store_path(&self, config: &AppConfig) -> Option<PathBuf> {
        self.store_override
            .clone()
            .or_else(|| config.storage.path.clone())
    }
}

fn optional_var(name: &str) -> Result<Option<String>> {
    match std::env::var(name) {
        Ok(value) if value.trim().is_empty() => Ok(None),
        Ok(value) => Ok(Some(value)),
        Err(VarError::NotPresent) => Ok(None),
        Err(e) => Err(e.into()),
    }
}
