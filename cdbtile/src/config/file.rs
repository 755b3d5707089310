//! Configuration file handling for ~/.cdbtile/config.ini.
//!
//! Loads and saves user configuration with defaults. Parsing lives in
//! [`super::parser`], serialization in [`super::writer`].

use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

use super::settings::ConfigFile;

/// Configuration file errors.
#[derive(Debug, Error)]
pub enum ConfigFileError {
    /// Failed to read config file
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] ini::Error),

    /// Failed to write config file
    #[error("Failed to write config file: {0}")]
    WriteError(String),

    /// Invalid configuration value
    #[error("Invalid configuration: {section}.{key} = '{value}' - {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    /// Failed to create config directory
    #[error("Failed to create config directory: {0}")]
    DirectoryError(std::io::Error),
}

impl ConfigFile {
    /// Loads configuration from the default path (~/.cdbtile/config.ini).
    ///
    /// A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigFileError> {
        Self::load_from(&config_file_path())
    }

    /// Loads configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigFileError> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path)?;
        super::parser::parse_ini(&ini)
    }

    /// Saves configuration to the default path.
    pub fn save(&self) -> Result<(), ConfigFileError> {
        self.save_to(&config_file_path())
    }

    /// Saves configuration to a specific path, creating parent directories.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigFileError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(ConfigFileError::DirectoryError)?;
        }

        let content = super::writer::to_config_string(self);
        std::fs::write(path, content).map_err(|e| ConfigFileError::WriteError(e.to_string()))
    }

    /// Creates the default config file if it doesn't exist.
    ///
    /// Returns the path to the config file.
    pub fn ensure_exists() -> Result<PathBuf, ConfigFileError> {
        let path = config_file_path();
        if !path.exists() {
            Self::default().save_to(&path)?;
        }
        Ok(path)
    }
}

/// Path to the config directory (~/.cdbtile).
pub fn config_directory() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".cdbtile")
}

/// Path to the config file (~/.cdbtile/config.ini).
pub fn config_file_path() -> PathBuf {
    config_directory().join("config.ini")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DEFAULT_MAX_LOD, DEFAULT_NEGATIVE_LODS};
    use crate::coord::DEFAULT_TILE_SIZE;
    use crate::profile::DataLimits;
    use crate::raster::DriverPreferences;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = ConfigFile::default();

        assert!(config.cdb.root_dir.is_none());
        assert!(config.cdb.cache_dir.is_none());
        assert_eq!(config.cdb.tile_size, DEFAULT_TILE_SIZE);
        assert_eq!(config.cdb.max_lod, DEFAULT_MAX_LOD);
        assert_eq!(config.cdb.negative_lods, DEFAULT_NEGATIVE_LODS);
        assert_eq!(config.drivers, DriverPreferences::default());
        assert_eq!(config.logging.file, "cdbtile.log");
    }

    #[test]
    fn test_load_nonexistent_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigFile::load_from(&temp_dir.path().join("nonexistent.ini")).unwrap();
        assert_eq!(config, ConfigFile::default());
    }

    #[test]
    fn test_save_and_reload() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("config.ini");

        let mut config = ConfigFile::default();
        config.cdb.root_dir = Some(PathBuf::from("/data/cdb"));
        config.cdb.cache_dir = Some(PathBuf::from("/data/cache"));
        config.cdb.tile_size = 256;
        config.cdb.max_lod = 10;
        config.cdb.negative_lods = 2;
        config.cdb.limits = Some(DataLimits::parse("-120,30,-110,40").unwrap());
        config.drivers = DriverPreferences::geotiff_only();
        config.logging.directory = PathBuf::from("/var/log/cdbtile");

        config.save_to(&path).unwrap();
        let loaded = ConfigFile::load_from(&path).unwrap();
        assert_eq!(loaded, config);
    }
}
