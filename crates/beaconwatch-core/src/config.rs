//! Application configuration management.
//!
//! Handles loading, saving, and validating beaconwatch configuration:
//! - The beacon family UUID to track
//! - The identifier of the always-monitored main region

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Identifier used for the main region unless configured otherwise.
pub const DEFAULT_MAIN_REGION_IDENTIFIER: &str = "MainRegion";

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Beacon family UUID to track. Replace with your deployment's family.
    pub beacon_uuid: String,

    /// Identifier of the coarse main region.
    #[serde(default = "default_main_region_identifier")]
    pub main_region_identifier: String,
}

fn default_main_region_identifier() -> String {
    DEFAULT_MAIN_REGION_IDENTIFIER.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            beacon_uuid: "90dc5409-c9f4-4854-bc38-94367885850e".to_string(),
            main_region_identifier: default_main_region_identifier(),
        }
    }
}

impl Config {
    /// Load configuration from the default path, falling back to defaults
    /// when no file exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read, parsed, or
    /// validated.
    pub fn load_or_default() -> Result<Self> {
        let path = Self::config_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigNotFound`] when the file does not exist,
    /// [`Error::ConfigParse`] when it is not valid TOML, and a validation
    /// error when the contents are invalid.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::ConfigNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self =
            toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to an explicit path, creating parent directories.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| Error::ConfigParse(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Parse the configured family UUID.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBeaconUuid`] when the string does not parse.
    pub fn family_uuid(&self) -> Result<Uuid> {
        self.beacon_uuid
            .parse::<Uuid>()
            .map_err(|source| Error::InvalidBeaconUuid {
                value: self.beacon_uuid.clone(),
                source,
            })
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBeaconUuid`] or [`Error::ConfigValidation`]
    /// when a value is unusable.
    pub fn validate(&self) -> Result<()> {
        self.family_uuid()?;
        if self.main_region_identifier.trim().is_empty() {
            return Err(Error::ConfigValidation(
                "main_region_identifier cannot be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Get the configuration file path.
    fn config_path() -> Result<PathBuf> {
        // On deployment targets: /etc/beaconwatch/config.toml
        // For development: platform config dir, e.g. ~/.config/beaconwatch/
        #[cfg(target_os = "linux")]
        {
            Ok(PathBuf::from("/etc/beaconwatch/config.toml"))
        }
        #[cfg(not(target_os = "linux"))]
        {
            let dirs = directories::ProjectDirs::from("", "", "beaconwatch").ok_or_else(|| {
                Error::ConfigValidation("Cannot determine config directory".into())
            })?;
            Ok(dirs.config_dir().join("config.toml"))
        }
    }
}
