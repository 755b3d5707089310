//! Options for opening a CDB dataset.

use std::path::{Path, PathBuf};

use crate::config::{ConfigFile, DEFAULT_MAX_LOD, DEFAULT_NEGATIVE_LODS};
use crate::coord::DEFAULT_TILE_SIZE;
use crate::profile::DataLimits;
use crate::raster::DriverPreferences;

use super::SourceError;

/// Highest level a CDB dataset can hold.
pub const MAX_CDB_LOD: i32 = 23;

/// Dataset location, tiling parameters and codec preferences.
#[derive(Debug, Clone, PartialEq)]
pub struct CdbOptions {
    /// Directory containing `Tiles/`
    pub root_dir: PathBuf,
    /// Composite cache; `None` disables caching
    pub cache_dir: Option<PathBuf>,
    pub tile_size: usize,
    /// Finest level served
    pub max_lod: i32,
    pub negative_lods: u32,
    /// Served area; `None` is the whole earth
    pub limits: Option<DataLimits>,
    pub drivers: DriverPreferences,
}

impl CdbOptions {
    /// Options for `root_dir` with every other setting at its default.
    pub fn new(root_dir: impl Into<PathBuf>) -> Self {
        Self {
            root_dir: root_dir.into(),
            cache_dir: None,
            tile_size: DEFAULT_TILE_SIZE,
            max_lod: DEFAULT_MAX_LOD,
            negative_lods: DEFAULT_NEGATIVE_LODS,
            limits: None,
            drivers: DriverPreferences::default(),
        }
    }

    /// Builds options from the user configuration.
    ///
    /// Fails with [`SourceError::MissingRoot`] when no root directory is set.
    pub fn from_config(config: &ConfigFile) -> Result<Self, SourceError> {
        let root_dir = config
            .cdb
            .root_dir
            .clone()
            .ok_or(SourceError::MissingRoot)?;

        Ok(Self {
            root_dir,
            cache_dir: config.cdb.cache_dir.clone(),
            tile_size: config.cdb.tile_size,
            max_lod: config.cdb.max_lod,
            negative_lods: config.cdb.negative_lods,
            limits: config.cdb.limits,
            drivers: config.drivers.clone(),
        })
    }

    pub fn with_cache_dir(mut self, cache_dir: impl Into<PathBuf>) -> Self {
        self.cache_dir = Some(cache_dir.into());
        self
    }

    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size;
        self
    }

    pub fn with_max_lod(mut self, max_lod: i32) -> Self {
        self.max_lod = max_lod;
        self
    }

    pub fn with_limits(mut self, limits: DataLimits, negative_lods: u32) -> Self {
        self.limits = Some(limits);
        self.negative_lods = negative_lods;
        self
    }

    pub fn with_drivers(mut self, drivers: DriverPreferences) -> Self {
        self.drivers = drivers;
        self
    }

    /// True when composites are written to a cache directory.
    pub fn caching(&self) -> bool {
        self.cache_dir.is_some()
    }

    /// Checks the options against the filesystem.
    pub(super) fn validate(&self) -> Result<(), SourceError> {
        if !is_dir(&self.root_dir) {
            return Err(SourceError::RootNotFound(self.root_dir.clone()));
        }
        if self.tile_size == 0 {
            return Err(SourceError::Config("tile size must be positive".to_string()));
        }
        if !(0..=MAX_CDB_LOD).contains(&self.max_lod) {
            return Err(SourceError::Config(format!(
                "max LOD {} is outside 0..={}",
                self.max_lod, MAX_CDB_LOD
            )));
        }
        if let Some(cache_dir) = &self.cache_dir {
            if cache_dir.exists() && !is_dir(cache_dir) {
                return Err(SourceError::Config(format!(
                    "cache path {} is not a directory",
                    cache_dir.display()
                )));
            }
        }
        Ok(())
    }
}

fn is_dir(path: &Path) -> bool {
    std::fs::metadata(path).map(|m| m.is_dir()).unwrap_or(false)
}
