//! CDB tile lifecycle
//!
//! A [`Tile`] is one raster file of the dataset (or of the cache) together
//! with its decoded pixels. It moves through three states:
//!
//! ```text
//! Created --open()--> Opened --read()--> Loaded
//!    ^                  |                  |
//!    +----close()-------+------close()-----+
//! ```
//!
//! `free()` drops the pixels and steps back to `Opened` (handle still open)
//! or `Created`. Handles and buffers are plain owned values, so every exit
//! path releases them.

mod buffer;
mod output;
mod sample;

pub use buffer::{TileBuffer, IMAGERY_FILL};
pub use output::{HeightField, ImageBuffer, RowOrder, NO_DATA_VALUE};
pub use sample::{sample_height, sample_rgb, PixelCoord};

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;

use crate::address::{resolve, ContentType, TileAddress};
use crate::coord::{GeoExtent, DEFAULT_TILE_SIZE, DEGREE_EPSILON};
use crate::probe::{self, ProbeError};
use crate::raster::{
    CreateSpec, DriverRegistry, GeoTransform, RasterDataset, RasterError, SpatialRef,
};

/// Lifecycle state of a tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileState {
    /// Address resolved, nothing open
    Created,
    /// Dataset handle open
    Opened,
    /// Pixels decoded
    Loaded,
}

impl fmt::Display for TileState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TileState::Created => write!(f, "created"),
            TileState::Opened => write!(f, "opened"),
            TileState::Loaded => write!(f, "loaded"),
        }
    }
}

/// Errors raised by tile operations.
#[derive(Debug, Error)]
pub enum TileError {
    #[error("Tile not found: {0}")]
    NotFound(PathBuf),

    #[error("Tile {0} has no open dataset")]
    NotOpen(String),

    #[error("Tile {0} has no decoded data")]
    NotLoaded(String),

    #[error("Cannot {operation} {content} tiles")]
    UnsupportedContent {
        content: ContentType,
        operation: &'static str,
    },

    #[error("No cache directory configured for {0}")]
    NoCacheDirectory(String),

    #[error(transparent)]
    Codec(#[from] RasterError),

    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Where tiles live and how they are decoded.
///
/// Cheap to clone; every tile of a request shares one context.
#[derive(Debug, Clone)]
pub struct TileContext {
    root: PathBuf,
    cache_root: Option<PathBuf>,
    registry: Arc<DriverRegistry>,
    tile_size: usize,
}

impl TileContext {
    /// Context for the dataset at `root` with no cache and default tile size.
    pub fn new(root: impl Into<PathBuf>, registry: Arc<DriverRegistry>) -> Self {
        Self {
            root: root.into(),
            cache_root: None,
            registry,
            tile_size: DEFAULT_TILE_SIZE,
        }
    }

    pub fn with_cache_dir(mut self, cache_root: impl Into<PathBuf>) -> Self {
        self.cache_root = Some(cache_root.into());
        self
    }

    /// Pixel size used for tiles resolved without a level hint.
    pub fn with_tile_size(mut self, tile_size: usize) -> Self {
        self.tile_size = tile_size.max(1);
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn cache_root(&self) -> Option<&Path> {
        self.cache_root.as_deref()
    }

    pub fn registry(&self) -> &Arc<DriverRegistry> {
        &self.registry
    }

    pub fn tile_size(&self) -> usize {
        self.tile_size
    }
}

/// One CDB raster tile.
pub struct Tile {
    context: TileContext,
    extent: GeoExtent,
    address: TileAddress,
    path: Option<PathBuf>,
    exists: bool,
    width: usize,
    height: usize,
    state: TileState,
    buffer: Option<TileBuffer>,
    dataset: Option<Box<dyn RasterDataset>>,
    geo_transform: Option<GeoTransform>,
}

impl Tile {
    /// Resolves the tile covering `extent` and checks whether its file exists.
    ///
    /// Cache content reads the cache store, everything else the dataset root.
    ///
    /// # Arguments
    ///
    /// * `context` - Dataset root, cache directory and codecs
    /// * `content` - Requested content; negative levels promote it to the cache variant
    /// * `extent` - Requested extent
    /// * `level_hint` - Optional sub-base level for one-degree requests
    pub fn new(
        context: &TileContext,
        content: ContentType,
        extent: GeoExtent,
        level_hint: Option<u8>,
    ) -> Result<Self, TileError> {
        let address = resolve(
            &extent,
            content,
            level_hint,
            context.root(),
            context.cache_root(),
        );
        let path = address.tile_path().map(Path::to_path_buf);
        let exists = match &path {
            Some(path) => probe::exists(path)?,
            None => false,
        };
        let size = if address.hinted {
            address.tile_size
        } else {
            context.tile_size()
        };

        tracing::trace!(
            file = %address.file_name(address.content),
            lod = address.lod,
            exists,
            "Tile created"
        );

        Ok(Self {
            context: context.clone(),
            extent,
            address,
            path,
            exists,
            width: size,
            height: size,
            state: TileState::Created,
            buffer: None,
            dataset: None,
            geo_transform: None,
        })
    }

    pub fn content(&self) -> ContentType {
        self.address.content
    }

    pub fn context(&self) -> &TileContext {
        &self.context
    }

    pub fn extent(&self) -> &GeoExtent {
        &self.extent
    }

    pub fn address(&self) -> &TileAddress {
        &self.address
    }

    pub fn lod(&self) -> i32 {
        self.address.lod
    }

    /// File this tile reads and writes; `None` for cache content without a cache store.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Result of the existence probe (updated after a successful cache write).
    pub fn exists(&self) -> bool {
        self.exists
    }

    pub fn state(&self) -> TileState {
        self.state
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn buffer(&self) -> Option<&TileBuffer> {
        self.buffer.as_ref()
    }

    /// Geotransform captured on open.
    pub fn geo_transform(&self) -> Option<GeoTransform> {
        self.geo_transform
    }

    /// Filename used in log and error messages.
    pub fn name(&self) -> String {
        self.address.file_name(self.address.content)
    }

    fn require_path(&self) -> Result<PathBuf, TileError> {
        self.path
            .clone()
            .ok_or_else(|| TileError::NoCacheDirectory(self.name()))
    }

    /// Opens the tile's file read-only with the codec for its content.
    ///
    /// Does nothing if a handle is already open. Adopts the file's raster size
    /// when it differs from the configured one.
    pub fn open(&mut self) -> Result<(), TileError> {
        if self.dataset.is_some() {
            return Ok(());
        }
        let path = self.require_path()?;
        let content = self.content();
        let driver = Arc::clone(self.context.registry().for_content(content));

        let dataset = driver.open(&path)?;
        let (width, height) = (dataset.width(), dataset.height());
        if (width, height) != (self.width, self.height) {
            tracing::debug!(
                path = %path.display(),
                configured = self.width,
                width,
                height,
                "Adopting dataset raster size"
            );
            self.width = width;
            self.height = height;
            self.buffer = None;
        }

        self.geo_transform = Some(
            dataset
                .geo_transform()
                .unwrap_or_else(|| GeoTransform::from_extent(&self.extent, width, height)),
        );
        self.dataset = Some(dataset);
        if self.state == TileState::Created {
            self.state = TileState::Opened;
        }

        tracing::trace!(path = %path.display(), driver = driver.name(), "Tile opened");
        Ok(())
    }

    /// Decodes every band of the open dataset.
    ///
    /// On failure the previous buffer and state are kept.
    pub fn read(&mut self) -> Result<(), TileError> {
        let buffer = self.decode()?;
        self.buffer = Some(buffer);
        self.state = TileState::Loaded;
        Ok(())
    }

    /// Decodes into a fresh buffer without touching the tile's state.
    fn decode(&mut self) -> Result<TileBuffer, TileError> {
        let name = self.name();
        let content = self.content();
        let dataset = self.dataset.as_mut().ok_or(TileError::NotOpen(name))?;

        let mut buffer = TileBuffer::allocate(content, self.width, self.height);
        match &mut buffer {
            TileBuffer::Image { planes, .. } => {
                for (band, plane) in planes.iter_mut().enumerate() {
                    dataset.read_band_u8(band, plane)?;
                }
            }
            TileBuffer::Elevation { heights, .. } => dataset.read_band_f32(0, heights)?,
        }
        Ok(buffer)
    }

    /// Opens the file and decodes it into a seed buffer, leaving the state
    /// at `Opened`.
    pub(crate) fn seed(&mut self) -> Result<(), TileError> {
        self.open()?;
        let buffer = self.decode()?;
        self.buffer = Some(buffer);
        Ok(())
    }

    /// Opens and reads the tile; a no-op when already loaded.
    pub fn load(&mut self) -> Result<(), TileError> {
        if self.state == TileState::Loaded {
            return Ok(());
        }
        if !self.exists {
            let path = self
                .path
                .clone()
                .unwrap_or_else(|| self.address.primary_path.clone());
            return Err(TileError::NotFound(path));
        }
        self.open()?;
        self.read()
    }

    /// Replaces the pixels with the "no coverage" value of the content.
    pub fn fill(&mut self) {
        self.buffer = Some(TileBuffer::filled(self.content(), self.width, self.height));
    }

    /// Writes the buffer into the open dataset, band by band, then flushes.
    ///
    /// The first failing band aborts the write; earlier bands stay written.
    pub fn write(&mut self) -> Result<(), TileError> {
        let name = self.name();
        let buffer = self
            .buffer
            .as_ref()
            .ok_or_else(|| TileError::NotLoaded(name.clone()))?;
        let dataset = self.dataset.as_mut().ok_or(TileError::NotOpen(name))?;
        write_bands(buffer, dataset.as_mut())?;
        dataset.flush()?;
        Ok(())
    }

    /// Writes the pixels to a new cache file.
    ///
    /// Only cache content can be saved. Any open read handle is released
    /// first; missing parent directories are created. The file is georeferenced
    /// to the tile's extent in WGS 84. On success the new file becomes the
    /// tile's open dataset.
    pub fn save(&mut self) -> Result<(), TileError> {
        let content = self.content();
        if !content.is_cache() {
            return Err(TileError::UnsupportedContent {
                content,
                operation: "save",
            });
        }
        let path = self.require_path()?;
        let (width, height) = match self.buffer.as_ref() {
            Some(buffer) => (buffer.width(), buffer.height()),
            None => return Err(TileError::NotLoaded(self.name())),
        };

        self.dataset = None;
        if self.state == TileState::Opened {
            self.state = TileState::Created;
        }

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|source| TileError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let spec = CreateSpec {
            width,
            height,
            bands: content.band_count(),
            band_type: content.band_type(),
        };
        let driver = Arc::clone(self.context.registry().for_content(content));
        let transform = GeoTransform::from_extent(&self.extent, width, height);
        let mut dataset = driver.create(&path, &spec)?;
        dataset.set_geo_transform(transform)?;
        dataset.set_spatial_ref(SpatialRef::WGS84)?;

        self.dataset = Some(dataset);
        self.geo_transform = Some(transform);
        if self.state == TileState::Created {
            self.state = TileState::Opened;
        }
        self.write()?;

        tracing::info!(
            path = %path.display(),
            driver = driver.name(),
            width,
            height,
            "Saved cache tile"
        );
        Ok(())
    }

    /// Drops the pixels; the state falls back to `Opened` or `Created`.
    pub fn free(&mut self) {
        self.buffer = None;
        if self.state == TileState::Loaded {
            self.state = if self.dataset.is_some() {
                TileState::Opened
            } else {
                TileState::Created
            };
        }
    }

    /// Drops the dataset handle.
    pub fn close(&mut self) {
        self.dataset = None;
        self.state = TileState::Created;
    }

    /// Drops both pixels and handle.
    pub fn release(&mut self) {
        self.free();
        self.close();
    }

    /// Maps a geographic point to this tile's pixel space.
    ///
    /// `None` until the tile has been opened. Coordinates within `1e-9` of a
    /// whole pixel snap to it.
    pub fn map_to_pixel(&self, lon: f64, lat: f64) -> Option<PixelCoord> {
        if self.state == TileState::Created {
            return None;
        }
        let (x, y) = self.geo_transform?.to_pixel(lon, lat);
        Some(PixelCoord::new(snap_pixel(x), snap_pixel(y)))
    }

    /// Bilinear RGB sample at a pixel position.
    pub fn sample_image(&self, pixel: PixelCoord) -> Option<[u8; 3]> {
        sample_rgb(self.buffer.as_ref()?, pixel)
    }

    /// Bilinear elevation sample at a pixel position.
    pub fn sample_elevation(&self, pixel: PixelCoord) -> Option<f32> {
        sample_height(self.buffer.as_ref()?, pixel)
    }

    /// Interleaved copy of decoded imagery, row 0 north.
    pub fn to_image_buffer(&self) -> Option<ImageBuffer> {
        let buffer = self.buffer.as_ref()?;
        let planes = buffer.planes()?;
        Some(ImageBuffer::from_planes(
            buffer.width(),
            buffer.height(),
            planes,
        ))
    }

    /// Decoded elevation as a height field, row 0 south.
    pub fn to_height_field(&self) -> Option<HeightField> {
        let buffer = self.buffer.as_ref()?;
        let heights = buffer.heights()?;
        Some(HeightField::from_north_up(
            buffer.width(),
            buffer.height(),
            heights,
        ))
    }

    pub(crate) fn buffer_mut(&mut self) -> Option<&mut TileBuffer> {
        self.buffer.as_mut()
    }

    pub(crate) fn mark_loaded(&mut self) {
        self.state = TileState::Loaded;
    }

    pub(crate) fn mark_exists(&mut self) {
        self.exists = true;
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("name", &self.name())
            .field("extent", &self.extent)
            .field("path", &self.path)
            .field("exists", &self.exists)
            .field("state", &self.state)
            .field("size", &(self.width, self.height))
            .finish()
    }
}

fn write_bands(buffer: &TileBuffer, dataset: &mut dyn RasterDataset) -> Result<(), TileError> {
    match buffer {
        TileBuffer::Image { planes, .. } => {
            for (band, plane) in planes.iter().enumerate() {
                dataset.write_band_u8(band, plane)?;
            }
        }
        TileBuffer::Elevation { heights, .. } => dataset.write_band_f32(0, heights)?,
    }
    Ok(())
}

fn snap_pixel(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < DEGREE_EPSILON {
        nearest
    } else {
        value
    }
}
