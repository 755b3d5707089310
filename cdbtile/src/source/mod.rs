//! Request entry point
//!
//! [`CdbTileSource`] turns a geographic request into pixels. It decides per
//! request whether a single dataset file answers it, whether a cached
//! composite exists, or whether a composite has to be built:
//!
//! | Level                        | Path                                          |
//! |------------------------------|-----------------------------------------------|
//! | above `max_lod`              | no data                                       |
//! | `>= 0`, narrower than a tile | earth tile composite (cached when enabled)   |
//! | `>= 0`                       | direct load                                   |
//! | `< 0`                        | cache hit, else region probe then composite   |
//!
//! "No content" is `Ok(None)`; errors are reserved for files that exist but
//! cannot be read.

mod options;

pub use options::{CdbOptions, MAX_CDB_LOD};

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::address::ContentType;
use crate::cache::CacheWriter;
use crate::composite::{build_cache_tile, build_earth_tile};
use crate::coord::{lon_step, tiles_per_geocell, GeoExtent, DEGREE_EPSILON};
use crate::probe::{probe_region, ProbeError};
use crate::profile::{GeodeticProfile, ProfileError};
use crate::raster::{init_global_registry, BuiltinDriverManager, DriverInitError, DriverRegistry};
use crate::tile::{HeightField, ImageBuffer, Tile, TileContext, TileError, TileState};

/// Errors from opening a dataset or serving a request.
#[derive(Debug, Error)]
pub enum SourceError {
    /// A codec family could not be resolved
    #[error(transparent)]
    Init(#[from] DriverInitError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("No CDB root directory configured")]
    MissingRoot,

    #[error("CDB root directory not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error(transparent)]
    Profile(#[from] ProfileError),

    #[error(transparent)]
    Tile(#[from] TileError),

    #[error(transparent)]
    Probe(#[from] ProbeError),
}

/// An opened CDB dataset.
#[derive(Debug)]
pub struct CdbTileSource {
    options: CdbOptions,
    context: TileContext,
    profile: GeodeticProfile,
}

impl CdbTileSource {
    /// Opens a dataset using the process-wide driver registry.
    ///
    /// The registry is initialized from `options.drivers` with the built-in
    /// drivers on first use.
    pub fn new(options: CdbOptions) -> Result<Self, SourceError> {
        let registry = init_global_registry(&BuiltinDriverManager::new(), &options.drivers)?;
        Self::with_registry(options, registry)
    }

    /// Opens a dataset with an explicit driver registry.
    pub fn with_registry(
        options: CdbOptions,
        registry: Arc<DriverRegistry>,
    ) -> Result<Self, SourceError> {
        options.validate()?;

        let profile = match &options.limits {
            Some(limits) => GeodeticProfile::from_limits(limits, options.negative_lods)?,
            None => GeodeticProfile::whole_earth(),
        };

        let mut context =
            TileContext::new(&options.root_dir, registry).with_tile_size(options.tile_size);
        if let Some(cache_dir) = &options.cache_dir {
            context = context.with_cache_dir(cache_dir);
        }

        tracing::info!(
            root = %options.root_dir.display(),
            cache = options.cache_dir.as_ref().map(|p| p.display().to_string()).unwrap_or_default(),
            tile_size = options.tile_size,
            max_lod = options.max_lod,
            "Opened CDB dataset"
        );

        Ok(Self {
            options,
            context,
            profile,
        })
    }

    pub fn options(&self) -> &CdbOptions {
        &self.options
    }

    pub fn context(&self) -> &TileContext {
        &self.context
    }

    /// Served area and top-level tile grid.
    pub fn profile(&self) -> &GeodeticProfile {
        &self.profile
    }

    /// Highest level a consumer should request from this dataset.
    pub fn max_level(&self) -> u32 {
        self.profile
            .max_data_level(self.options.max_lod.max(0) as u32)
    }

    /// Imagery for `extent`, or `None` where the dataset has none.
    pub fn create_image(&self, extent: &GeoExtent) -> Result<Option<ImageBuffer>, SourceError> {
        Ok(self
            .fetch_tile(extent, ContentType::Imagery, None)?
            .and_then(|tile| tile.to_image_buffer()))
    }

    /// Elevation for `extent`, or `None` where the dataset has none.
    pub fn create_height_field(
        &self,
        extent: &GeoExtent,
    ) -> Result<Option<HeightField>, SourceError> {
        Ok(self
            .fetch_tile(extent, ContentType::Elevation, None)?
            .and_then(|tile| tile.to_height_field()))
    }

    /// True if content exists for the request without decoding anything.
    ///
    /// Cache-level requests report a cache hit or any geocell of the region
    /// holding content.
    pub fn has_content(
        &self,
        extent: &GeoExtent,
        content: ContentType,
    ) -> Result<bool, SourceError> {
        let tile = Tile::new(&self.context, content, *extent, None)?;
        if tile.exists() {
            return Ok(true);
        }
        if tile.address().is_cache_level() {
            let found = probe_region(
                tile.lod(),
                tile.address().base,
                content.source_variant(),
                self.context.root(),
            )?;
            return Ok(found);
        }
        if self.is_earth_request(&tile) {
            let extent = crate::composite::earth_tile_extent(extent, tile.lod());
            let cover = Tile::new(&self.context, content.source_variant(), extent, None)?;
            return Ok(cover.exists());
        }
        Ok(false)
    }

    /// Loads or builds the tile for a request.
    ///
    /// # Returns
    ///
    /// A loaded tile, or `None` when nothing in the dataset covers the request.
    pub fn fetch_tile(
        &self,
        extent: &GeoExtent,
        content: ContentType,
        level_hint: Option<u8>,
    ) -> Result<Option<Tile>, SourceError> {
        if self.options.limits.is_some() && !self.profile.extent.overlaps(extent) {
            tracing::debug!(%extent, "Request outside the served area");
            return Ok(None);
        }

        let mut tile = Tile::new(&self.context, content, *extent, level_hint)?;
        let lod = tile.lod();

        if lod > self.options.max_lod {
            tracing::debug!(lod, max_lod = self.options.max_lod, "Request above max LOD");
            return Ok(None);
        }

        if tile.address().is_cache_level() {
            return self.fetch_cache_level(tile);
        }

        if self.is_earth_request(&tile) {
            return self.fetch_earth_tile(extent, content);
        }

        if !tile.exists() {
            tracing::debug!(tile = %tile.name(), "No tile for request");
            return Ok(None);
        }
        tile.load()?;
        Ok(Some(tile))
    }

    fn fetch_cache_level(&self, mut tile: Tile) -> Result<Option<Tile>, SourceError> {
        if tile.exists() {
            tracing::debug!(tile = %tile.name(), "Cache hit");
            tile.load()?;
            return Ok(Some(tile));
        }

        let source = tile.content().source_variant();
        let origin = tile.address().base;
        if !probe_region(tile.lod(), origin, source, self.context.root())? {
            tracing::debug!(tile = %tile.name(), "Region has no content");
            return Ok(None);
        }

        let outcome = build_cache_tile(&mut tile, self.options.caching())?;
        tracing::debug!(
            tile = %tile.name(),
            candidates = outcome.candidates,
            contributed = outcome.contributed,
            saved = outcome.saved,
            "Built cache tile"
        );
        Ok(loaded(tile))
    }

    fn fetch_earth_tile(
        &self,
        extent: &GeoExtent,
        content: ContentType,
    ) -> Result<Option<Tile>, SourceError> {
        let caching = self.options.caching();
        let dest_content = if caching {
            content.cache_variant()
        } else {
            content.source_variant()
        };
        let mut dest = Tile::new(&self.context, dest_content, *extent, None)?;

        if caching && dest.exists() {
            tracing::debug!(tile = %dest.name(), "Cache hit");
            dest.load()?;
            return Ok(Some(dest));
        }

        let outcome = build_earth_tile(&mut dest)?;
        if caching && dest.state() == TileState::Loaded {
            if let Err(e) = CacheWriter::persist(&mut dest) {
                tracing::warn!(tile = %dest.name(), error = %e, "Failed to write cache tile");
            }
        }
        tracing::debug!(
            tile = %dest.name(),
            contributed = outcome.contributed,
            "Built earth tile"
        );
        Ok(loaded(dest))
    }

    /// True when the request is narrower than the CDB tile that holds it.
    fn is_earth_request(&self, tile: &Tile) -> bool {
        let lod = tile.lod();
        if lod < 0 {
            return false;
        }
        let extent = tile.extent();
        let tile_width = f64::from(lon_step(extent.south)) / f64::from(tiles_per_geocell(lod));
        extent.lon_span() < tile_width - DEGREE_EPSILON
    }
}

fn loaded(tile: Tile) -> Option<Tile> {
    (tile.state() == TileState::Loaded).then_some(tile)
}
