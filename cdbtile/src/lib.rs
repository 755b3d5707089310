//! cdbtile - Tile addressing and raster composition for CDB datasets
//!
//! Maps geographic requests onto the Common Database (CDB) directory and
//! naming convention, checks for content without reading files, and builds
//! synthetic rasters by resampling dataset tiles when no single file answers
//! a request. Composites can be written back to a cache directory.
//!
//! # High-Level API
//!
//! [`source::CdbTileSource`] serves whole requests:
//!
//! ```ignore
//! use cdbtile::coord::GeoExtent;
//! use cdbtile::source::{CdbOptions, CdbTileSource};
//!
//! let options = CdbOptions::new("/data/cdb").with_cache_dir("/data/cdb-cache");
//! let source = CdbTileSource::new(options)?;
//!
//! let extent = GeoExtent::new(48.0, 44.0, -120.0, -124.0)?;
//! if let Some(image) = source.create_image(&extent)? {
//!     image.to_rgba_image().save("tile.png")?;
//! }
//! ```

pub mod address;
pub mod cache;
pub mod composite;
pub mod config;
pub mod coord;
pub mod logging;
pub mod probe;
pub mod profile;
pub mod raster;
pub mod source;
pub mod tile;

/// Version of the cdbtile library and CLI.
///
/// Synchronized across the workspace from `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
