//! Common types and utilities shared across CLI commands.

use std::path::PathBuf;

use clap::{Args, ValueEnum};
use cdbtile::address::ContentType;
use cdbtile::coord::GeoExtent;

use crate::error::CliError;

/// Geographic rectangle of a request.
#[derive(Debug, Clone, Args)]
pub struct ExtentArgs {
    /// Northern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub north: f64,

    /// Southern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub south: f64,

    /// Eastern edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub east: f64,

    /// Western edge in degrees
    #[arg(long, allow_hyphen_values = true)]
    pub west: f64,
}

impl ExtentArgs {
    /// Validated extent.
    pub fn to_extent(&self) -> Result<GeoExtent, CliError> {
        GeoExtent::new(self.north, self.south, self.east, self.west)
            .map_err(|e| CliError::InvalidArgs(e.to_string()))
    }
}

/// Dataset overrides for the configuration file.
#[derive(Debug, Clone, Default, Args)]
pub struct DatasetArgs {
    /// CDB root directory (overrides cdb.root_dir)
    #[arg(long)]
    pub root: Option<PathBuf>,

    /// Cache directory (overrides cdb.cache_dir)
    #[arg(long, conflicts_with = "no_cache")]
    pub cache_dir: Option<PathBuf>,

    /// Do not read or write the cache
    #[arg(long)]
    pub no_cache: bool,

    /// Tile size in pixels (overrides cdb.tile_size)
    #[arg(long)]
    pub tile_size: Option<usize>,
}

/// Content selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq, Eq)]
pub enum ContentArg {
    /// Dataset imagery (JPEG 2000)
    Imagery,
    /// Dataset elevation (GeoTIFF)
    Elevation,
    /// Composited imagery (GeoTIFF)
    ImageryCache,
    /// Composited elevation
    ElevationCache,
}

impl From<ContentArg> for ContentType {
    fn from(arg: ContentArg) -> Self {
        match arg {
            ContentArg::Imagery => ContentType::Imagery,
            ContentArg::Elevation => ContentType::Elevation,
            ContentArg::ImageryCache => ContentType::ImageryCache,
            ContentArg::ElevationCache => ContentType::ElevationCache,
        }
    }
}

/// Format a byte count for display.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.0 GB");
    }

    #[test]
    fn test_extent_args_validate() {
        let args = ExtentArgs {
            north: 1.0,
            south: 0.0,
            east: 1.0,
            west: 0.0,
        };
        assert!(args.to_extent().is_ok());

        let flipped = ExtentArgs {
            north: 0.0,
            ..args
        };
        assert!(matches!(flipped.to_extent(), Err(CliError::InvalidArgs(_))));
    }

    #[test]
    fn test_content_conversion() {
        assert_eq!(
            ContentType::from(ContentArg::ElevationCache),
            ContentType::ElevationCache
        );
    }
}
