//! User configuration
//!
//! `~/.cdbtile/config.ini` holds the dataset location, cache directory,
//! tiling parameters, raster driver preferences and logging destination.
//!
//! # Example
//!
//! ```
//! use cdbtile::config::{ConfigFile, ConfigKey};
//!
//! let mut config = ConfigFile::default();
//! ConfigKey::CdbTileSize.set(&mut config, "512").unwrap();
//! assert_eq!(config.cdb.tile_size, 512);
//! ```

mod file;
mod keys;
mod parser;
mod settings;
mod writer;

pub use file::{config_directory, config_file_path, ConfigFileError};
pub use keys::{ConfigKey, ConfigKeyError};
pub use settings::{
    CdbSettings, ConfigFile, LoggingSettings, DEFAULT_LOG_FILE, DEFAULT_MAX_LOD,
    DEFAULT_NEGATIVE_LODS,
};
