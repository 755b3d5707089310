//! Raster codec contract
//!
//! Tiles never talk to a file format directly. They resolve a
//! [`RasterDriver`] from the [`DriverRegistry`] by content type and work
//! through the [`RasterDataset`] it opens or creates.
//!
//! # Design Principles
//!
//! - **Pluggable codecs**: drivers are looked up by name from a
//!   [`DriverManager`]; embedders register JPEG 2000 or ERDAS Imagine backends
//!   alongside the built-in GeoTIFF driver
//! - **Band-oriented I/O**: each band is read or written as one plane
//! - **Georeferenced**: datasets carry a geotransform and spatial reference

mod geotiff;
mod manager;
mod registry;

pub use geotiff::{GeoTiffDataset, GeoTiffDriver, GEOTIFF_DRIVER_NAME};
pub use manager::{BuiltinDriverManager, DriverManager};
pub use registry::{
    global_registry, init_global_registry, DriverFamily, DriverInitError, DriverPreferences,
    DriverRegistry, DEFAULT_ELEVATION_CACHE_DRIVERS, DEFAULT_GEOTIFF_DRIVERS,
    DEFAULT_IMAGERY_DRIVERS,
};

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::coord::GeoExtent;

/// Sample type of a raster band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BandType {
    Byte,
    Float32,
}

impl fmt::Display for BandType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BandType::Byte => write!(f, "Byte"),
            BandType::Float32 => write!(f, "Float32"),
        }
    }
}

/// Affine transform from pixel space to geographic space.
///
/// Laid out like the classic six-coefficient form: for pixel `(col, row)`,
/// `lon = origin_x + col * pixel_width + row * row_rotation` and
/// `lat = origin_y + col * col_rotation + row * pixel_height`.
/// For north-up rasters `pixel_height` is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoTransform {
    pub origin_x: f64,
    pub pixel_width: f64,
    pub row_rotation: f64,
    pub origin_y: f64,
    pub col_rotation: f64,
    pub pixel_height: f64,
}

impl GeoTransform {
    /// North-up transform placing `width` × `height` pixels over `extent`.
    pub fn from_extent(extent: &GeoExtent, width: usize, height: usize) -> Self {
        Self {
            origin_x: extent.west,
            pixel_width: extent.lon_span() / width.max(1) as f64,
            row_rotation: 0.0,
            origin_y: extent.north,
            col_rotation: 0.0,
            pixel_height: -(extent.lat_span() / height.max(1) as f64),
        }
    }

    /// Coefficients in `[origin_x, pixel_width, row_rotation, origin_y, col_rotation, pixel_height]` order.
    pub fn to_array(&self) -> [f64; 6] {
        [
            self.origin_x,
            self.pixel_width,
            self.row_rotation,
            self.origin_y,
            self.col_rotation,
            self.pixel_height,
        ]
    }

    pub fn from_array(coefficients: [f64; 6]) -> Self {
        Self {
            origin_x: coefficients[0],
            pixel_width: coefficients[1],
            row_rotation: coefficients[2],
            origin_y: coefficients[3],
            col_rotation: coefficients[4],
            pixel_height: coefficients[5],
        }
    }

    /// Fractional pixel position of a geographic point (rotation terms ignored).
    pub fn to_pixel(&self, lon: f64, lat: f64) -> (f64, f64) {
        let col = (lon - self.origin_x) / self.pixel_width;
        let row = (self.origin_y - lat) / self.pixel_height.abs();
        (col, row)
    }
}

/// Spatial reference identified by EPSG code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpatialRef {
    epsg: u16,
}

impl SpatialRef {
    /// Geographic WGS 84.
    pub const WGS84: SpatialRef = SpatialRef { epsg: 4326 };

    pub const fn from_epsg(epsg: u16) -> Self {
        Self { epsg }
    }

    pub const fn epsg(&self) -> u16 {
        self.epsg
    }
}

impl fmt::Display for SpatialRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg)
    }
}

/// Shape of a dataset to create.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateSpec {
    pub width: usize,
    pub height: usize,
    pub bands: usize,
    pub band_type: BandType,
}

/// Errors raised by raster codecs.
#[derive(Debug, Error)]
pub enum RasterError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Codec error on {path}: {message}")]
    Codec { path: PathBuf, message: String },

    #[error("Unsupported raster layout in {path}: {detail}")]
    Unsupported { path: PathBuf, detail: String },

    #[error("Band {band} out of range (dataset has {count} bands)")]
    BandOutOfRange { band: usize, count: usize },

    #[error("Band type mismatch: dataset holds {dataset}, requested {requested}")]
    BandTypeMismatch {
        dataset: BandType,
        requested: BandType,
    },

    #[error("Buffer holds {actual} samples, band needs {expected}")]
    BufferSize { expected: usize, actual: usize },

    #[error("Dataset {0} is read-only")]
    ReadOnly(PathBuf),

    #[error("Driver {0} cannot create datasets")]
    CreateUnsupported(String),
}

impl RasterError {
    pub(crate) fn io(path: &Path, source: io::Error) -> Self {
        RasterError::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// An open raster file.
pub trait RasterDataset: Send {
    fn width(&self) -> usize;

    fn height(&self) -> usize;

    fn band_count(&self) -> usize;

    fn band_type(&self) -> BandType;

    /// Georeferencing stored in the file, if any.
    fn geo_transform(&self) -> Option<GeoTransform>;

    fn set_geo_transform(&mut self, transform: GeoTransform) -> Result<(), RasterError>;

    fn spatial_ref(&self) -> Option<SpatialRef>;

    fn set_spatial_ref(&mut self, srs: SpatialRef) -> Result<(), RasterError>;

    /// Reads band `band` (zero based) into `buf`, row 0 first.
    fn read_band_u8(&mut self, band: usize, buf: &mut [u8]) -> Result<(), RasterError>;

    fn read_band_f32(&mut self, band: usize, buf: &mut [f32]) -> Result<(), RasterError>;

    fn write_band_u8(&mut self, band: usize, data: &[u8]) -> Result<(), RasterError>;

    fn write_band_f32(&mut self, band: usize, data: &[f32]) -> Result<(), RasterError>;

    /// Persists pending writes.
    fn flush(&mut self) -> Result<(), RasterError>;
}

/// A named codec able to open and optionally create raster files.
pub trait RasterDriver: Send + Sync {
    /// Short driver name used in preference lists (e.g. `GTiff`).
    fn name(&self) -> &str;

    /// True if the driver can open existing files.
    fn can_open(&self) -> bool {
        true
    }

    /// True if the driver can create new files.
    fn can_create(&self) -> bool;

    fn open(&self, path: &Path) -> Result<Box<dyn RasterDataset>, RasterError>;

    fn create(&self, path: &Path, spec: &CreateSpec) -> Result<Box<dyn RasterDataset>, RasterError>;
}
