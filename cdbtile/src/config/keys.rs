//! Configuration key access and validation.
//!
//! Type-safe get/set of configuration values by `section.key` name, used by
//! the `config` CLI command.

use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

use super::parser::{
    expand_tilde, optional_path, parse_max_lod, parse_negative_lods, parse_tile_size,
};
use super::settings::ConfigFile;
use super::writer::path_to_string;
use crate::profile::DataLimits;
use crate::raster::DriverPreferences;

/// Errors that can occur when getting or setting configuration values.
#[derive(Debug, Error)]
pub enum ConfigKeyError {
    /// Unknown configuration key.
    #[error("Unknown configuration key '{0}'")]
    UnknownKey(String),

    /// Validation failed for the value.
    #[error("Invalid value for {key}: {reason}")]
    ValidationFailed { key: String, reason: String },
}

/// Supported configuration keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    // CDB settings
    CdbRootDir,
    CdbCacheDir,
    CdbTileSize,
    CdbMaxLod,
    CdbNegativeLods,
    CdbLimits,

    // Driver settings
    DriversImagery,
    DriversGeotiff,
    DriversElevationCache,

    // Logging settings
    LoggingDirectory,
    LoggingFile,
}

impl FromStr for ConfigKey {
    type Err = ConfigKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .copied()
            .find(|key| key.name().eq_ignore_ascii_case(s))
            .ok_or_else(|| ConfigKeyError::UnknownKey(s.to_string()))
    }
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        &[
            ConfigKey::CdbRootDir,
            ConfigKey::CdbCacheDir,
            ConfigKey::CdbTileSize,
            ConfigKey::CdbMaxLod,
            ConfigKey::CdbNegativeLods,
            ConfigKey::CdbLimits,
            ConfigKey::DriversImagery,
            ConfigKey::DriversGeotiff,
            ConfigKey::DriversElevationCache,
            ConfigKey::LoggingDirectory,
            ConfigKey::LoggingFile,
        ]
    }

    /// Canonical key name (e.g. "cdb.root_dir").
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::CdbRootDir => "cdb.root_dir",
            ConfigKey::CdbCacheDir => "cdb.cache_dir",
            ConfigKey::CdbTileSize => "cdb.tile_size",
            ConfigKey::CdbMaxLod => "cdb.max_lod",
            ConfigKey::CdbNegativeLods => "cdb.negative_lods",
            ConfigKey::CdbLimits => "cdb.limits",
            ConfigKey::DriversImagery => "drivers.imagery",
            ConfigKey::DriversGeotiff => "drivers.geotiff",
            ConfigKey::DriversElevationCache => "drivers.elevation_cache",
            ConfigKey::LoggingDirectory => "logging.directory",
            ConfigKey::LoggingFile => "logging.file",
        }
    }

    /// Section name (e.g. "cdb").
    pub fn section(&self) -> &'static str {
        self.name().split('.').next().unwrap_or("")
    }

    /// Key name within the section (e.g. "root_dir").
    pub fn key_name(&self) -> &'static str {
        self.name().split('.').nth(1).unwrap_or(self.name())
    }

    /// Current value as a string; unset values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        let display = |p: Option<&Path>| p.map(path_to_string).unwrap_or_default();
        match self {
            ConfigKey::CdbRootDir => display(config.cdb.root_dir.as_deref()),
            ConfigKey::CdbCacheDir => display(config.cdb.cache_dir.as_deref()),
            ConfigKey::CdbTileSize => config.cdb.tile_size.to_string(),
            ConfigKey::CdbMaxLod => config.cdb.max_lod.to_string(),
            ConfigKey::CdbNegativeLods => config.cdb.negative_lods.to_string(),
            ConfigKey::CdbLimits => config
                .cdb
                .limits
                .map(|l| l.to_string())
                .unwrap_or_default(),
            ConfigKey::DriversImagery => config.drivers.imagery.join(", "),
            ConfigKey::DriversGeotiff => config.drivers.geotiff.join(", "),
            ConfigKey::DriversElevationCache => config.drivers.elevation_cache.join(", "),
            ConfigKey::LoggingDirectory => path_to_string(&config.logging.directory),
            ConfigKey::LoggingFile => config.logging.file.clone(),
        }
    }

    /// Validates `value` and stores it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigKeyError> {
        let fail = |reason: &str| ConfigKeyError::ValidationFailed {
            key: self.name().to_string(),
            reason: reason.to_string(),
        };

        match self {
            ConfigKey::CdbRootDir => config.cdb.root_dir = optional_path(value),
            ConfigKey::CdbCacheDir => config.cdb.cache_dir = optional_path(value),
            ConfigKey::CdbTileSize => {
                config.cdb.tile_size =
                    parse_tile_size(value).ok_or_else(|| fail("must be a positive integer"))?;
            }
            ConfigKey::CdbMaxLod => {
                config.cdb.max_lod =
                    parse_max_lod(value).ok_or_else(|| fail("must be an integer from 0 to 23"))?;
            }
            ConfigKey::CdbNegativeLods => {
                config.cdb.negative_lods = parse_negative_lods(value)
                    .ok_or_else(|| fail("must be an integer from 0 to 10"))?;
            }
            ConfigKey::CdbLimits => {
                let value = value.trim();
                config.cdb.limits = if value.is_empty() {
                    None
                } else {
                    Some(DataLimits::parse(value).map_err(|e| fail(&e.to_string()))?)
                };
            }
            ConfigKey::DriversImagery
            | ConfigKey::DriversGeotiff
            | ConfigKey::DriversElevationCache => {
                let names = DriverPreferences::parse_list(value);
                if names.is_empty() {
                    return Err(fail("must list at least one driver name"));
                }
                match self {
                    ConfigKey::DriversImagery => config.drivers.imagery = names,
                    ConfigKey::DriversGeotiff => config.drivers.geotiff = names,
                    _ => config.drivers.elevation_cache = names,
                }
            }
            ConfigKey::LoggingDirectory => {
                let value = value.trim();
                if value.is_empty() {
                    return Err(fail("must not be empty"));
                }
                config.logging.directory = expand_tilde(value);
            }
            ConfigKey::LoggingFile => {
                let value = value.trim();
                if value.is_empty() || value.contains(['/', '\\']) {
                    return Err(fail("must be a plain file name"));
                }
                config.logging.file = value.to_string();
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_key_names() {
        assert_eq!("cdb.root_dir".parse::<ConfigKey>().unwrap(), ConfigKey::CdbRootDir);
        assert_eq!(
            "DRIVERS.Imagery".parse::<ConfigKey>().unwrap(),
            ConfigKey::DriversImagery
        );
        assert!(matches!(
            "cdb.nope".parse::<ConfigKey>(),
            Err(ConfigKeyError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_every_key_round_trips_its_name() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
            assert_eq!(format!("{}.{}", key.section(), key.key_name()), key.name());
        }
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::CdbRootDir.set(&mut config, "/data/cdb").unwrap();
        assert_eq!(config.cdb.root_dir, Some(PathBuf::from("/data/cdb")));
        assert_eq!(ConfigKey::CdbRootDir.get(&config), "/data/cdb");

        ConfigKey::CdbTileSize.set(&mut config, "256").unwrap();
        assert_eq!(ConfigKey::CdbTileSize.get(&config), "256");

        ConfigKey::DriversImagery.set(&mut config, "GTiff").unwrap();
        assert_eq!(config.drivers.imagery, vec!["GTiff"]);

        ConfigKey::CdbLimits.set(&mut config, "0,0,4,4").unwrap();
        assert_eq!(ConfigKey::CdbLimits.get(&config), "0,0,4,4");
        ConfigKey::CdbLimits.set(&mut config, "").unwrap();
        assert!(config.cdb.limits.is_none());

        ConfigKey::CdbCacheDir.set(&mut config, "").unwrap();
        assert_eq!(ConfigKey::CdbCacheDir.get(&config), "");
    }

    #[test]
    fn test_set_rejects_invalid_values() {
        let mut config = ConfigFile::default();

        assert!(ConfigKey::CdbTileSize.set(&mut config, "-1").is_err());
        assert!(ConfigKey::CdbMaxLod.set(&mut config, "abc").is_err());
        assert!(ConfigKey::CdbLimits.set(&mut config, "1,2,3").is_err());
        assert!(ConfigKey::DriversGeotiff.set(&mut config, " , ").is_err());
        assert!(ConfigKey::LoggingFile.set(&mut config, "logs/x.log").is_err());

        let err = ConfigKey::CdbNegativeLods.set(&mut config, "99").unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid value for cdb.negative_lods: must be an integer from 0 to 10"
        );
        assert_eq!(config, ConfigFile::default());
    }
}
