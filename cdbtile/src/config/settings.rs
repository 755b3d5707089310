//! Settings structs backing `config.ini`, with their defaults.

use std::path::PathBuf;

use crate::coord::DEFAULT_TILE_SIZE;
use crate::profile::DataLimits;
use crate::raster::DriverPreferences;

/// Finest CDB level served by default.
pub const DEFAULT_MAX_LOD: i32 = 14;

/// Cache levels used for the top of a limited profile by default.
pub const DEFAULT_NEGATIVE_LODS: u32 = 0;

/// Default log file name.
pub const DEFAULT_LOG_FILE: &str = "cdbtile.log";

/// Everything stored in `config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub cdb: CdbSettings,
    pub drivers: DriverPreferences,
    pub logging: LoggingSettings,
}

/// `[cdb]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct CdbSettings {
    /// Dataset root (the directory holding `Tiles/`)
    pub root_dir: Option<PathBuf>,
    /// Cache store; caching is off when unset
    pub cache_dir: Option<PathBuf>,
    /// Square pixel size of unhinted tiles
    pub tile_size: usize,
    /// Requests finer than this level return no data
    pub max_lod: i32,
    pub negative_lods: u32,
    /// Served area; whole earth when unset
    pub limits: Option<DataLimits>,
}

impl Default for CdbSettings {
    fn default() -> Self {
        Self {
            root_dir: None,
            cache_dir: None,
            tile_size: DEFAULT_TILE_SIZE,
            max_lod: DEFAULT_MAX_LOD,
            negative_lods: DEFAULT_NEGATIVE_LODS,
            limits: None,
        }
    }
}

/// `[logging]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct LoggingSettings {
    pub directory: PathBuf,
    pub file: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            directory: super::file::config_directory().join("logs"),
            file: DEFAULT_LOG_FILE.to_string(),
        }
    }
}
