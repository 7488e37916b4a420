//! Application configuration.
//!
//! Values come from built-in defaults, then an optional TOML file, then
//! `FLEETRENT_*` environment variables (`FLEETRENT_PRICING__LATE_FEE_PER_DAY=60`).

use std::{
    fs,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

use crate::{fleet::FleetPolicy, pricing::PricingPolicy, storage::FleetStore};

/// Directory under the user's config dir holding `config.toml`.
pub const CONFIG_DIR: &str = "fleetrent";
/// Configuration file name.
pub const CONFIG_FILE: &str = "config.toml";
/// Prefix for environment overrides.
pub const ENV_PREFIX: &str = "FLEETRENT";

const DEFAULT_CONFIG: &str = r#"# fleetrent configuration

[storage]
# Directory holding the data files; relative paths resolve against the working directory.
data_dir = "."
vehicle_file = "vehicles.txt"
rental_file = "rentals.txt"
log_file = "system.log"

[pricing]
late_fee_per_day = 50.0
allowed_rental_days = 3

[fleet]
# Vehicles older than this many years are dropped by "Remove Old Vehicles".
retirement_age_years = 10

[display]
currency = "₪"
"#;

/// Top-level settings.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Where data and log files live.
    pub storage: StorageConfig,
    /// Late fee parameters.
    pub pricing: PricingPolicy,
    /// Fleet maintenance parameters.
    pub fleet: FleetPolicy,
    /// Presentation settings.
    pub display: DisplayConfig,
}

/// File locations.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Base directory for the other entries.
    pub data_dir: PathBuf,
    /// Vehicle file name.
    pub vehicle_file: String,
    /// Rental file name.
    pub rental_file: String,
    /// Action/error log file name.
    pub log_file: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            vehicle_file: crate::storage::VEHICLE_FILE.to_string(),
            rental_file: crate::storage::RENTAL_FILE.to_string(),
            log_file: "system.log".to_string(),
        }
    }
}

impl StorageConfig {
    /// Full path of the vehicle file.
    pub fn vehicle_path(&self) -> PathBuf {
        self.data_dir.join(&self.vehicle_file)
    }

    /// Full path of the rental file.
    pub fn rental_path(&self) -> PathBuf {
        self.data_dir.join(&self.rental_file)
    }

    /// Full path of the log file.
    pub fn log_path(&self) -> PathBuf {
        self.data_dir.join(&self.log_file)
    }

    /// Build the store for these locations.
    pub fn store(&self) -> FleetStore {
        FleetStore::new(self.vehicle_path(), self.rental_path())
    }
}

/// Presentation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Symbol printed before amounts.
    pub currency: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            currency: "₪".to_string(),
        }
    }
}

impl AppConfig {
    /// Default configuration file location.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(CONFIG_DIR)
            .join(CONFIG_FILE)
    }

    /// Load from the default location.
    pub fn load() -> Result<Self> {
        Self::load_from(Self::default_path())
    }

    /// Load from `path` (optional) layered under environment overrides.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let settings = Config::builder()
            .add_source(
                File::from(path)
                    .format(FileFormat::Toml)
                    .required(false),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .with_context(|| format!("failed to read configuration {}", path.display()))?;
        settings
            .try_deserialize()
            .with_context(|| format!("failed to parse configuration {}", path.display()))
    }
}

/// Write the default configuration file if none exists yet.
pub fn ensure_default_config() -> Result<PathBuf> {
    ensure_default_config_at(AppConfig::default_path())
}

/// Write the default configuration to `path` unless it already exists.
pub fn ensure_default_config_at(path: impl Into<PathBuf>) -> Result<PathBuf> {
    let path = path.into();
    if path.exists() {
        return Ok(path);
    }
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("failed to create config directory {}", parent.display()))?;
    }
    fs::write(&path, DEFAULT_CONFIG)
        .with_context(|| format!("failed to write config {}", path.display()))?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_yields_defaults() -> Result<()> {
        let dir = tempdir()?;
        let config = AppConfig::load_from(dir.path().join("absent.toml"))?;
        assert_eq!(config.pricing, PricingPolicy::default());
        assert_eq!(config.fleet.retirement_age_years, 10);
        assert_eq!(config.storage.vehicle_path(), PathBuf::from("./vehicles.txt"));
        assert_eq!(config.display.currency, "₪");
        Ok(())
    }

    #[test]
    fn default_file_matches_built_in_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = ensure_default_config_at(dir.path().join("fleetrent").join(CONFIG_FILE))?;
        assert!(path.exists());
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config, AppConfig::default());
        Ok(())
    }

    #[test]
    fn file_values_override_defaults() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(
            &path,
            "[storage]\ndata_dir = \"/srv/fleet\"\n\n[pricing]\nlate_fee_per_day = 75\n",
        )?;
        let config = AppConfig::load_from(&path)?;
        assert_eq!(config.pricing.late_fee_per_day, 75.0);
        assert_eq!(config.pricing.allowed_rental_days, 3);
        assert_eq!(
            config.storage.rental_path(),
            PathBuf::from("/srv/fleet/rentals.txt")
        );
        Ok(())
    }

    #[test]
    fn existing_config_is_left_alone() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join(CONFIG_FILE);
        fs::write(&path, "[display]\ncurrency = \"$\"\n")?;
        ensure_default_config_at(&path)?;
        assert_eq!(AppConfig::load_from(&path)?.display.currency, "$");
        Ok(())
    }
}
