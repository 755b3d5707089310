//! Content types served from a CDB dataset.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::raster::{BandType, DriverFamily};

/// Raster content addressed by the resolver.
///
/// The cache variants hold composites coarser than one geocell and are stored
/// with a different codec than their source counterparts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentType {
    Imagery,
    Elevation,
    ImageryCache,
    ElevationCache,
}

impl ContentType {
    /// CDB layer directory name.
    pub fn layer(&self) -> &'static str {
        match self {
            ContentType::Imagery | ContentType::ImageryCache => "004_Imagery",
            ContentType::Elevation | ContentType::ElevationCache => "001_Elevation",
        }
    }

    /// Dataset/selector tag embedded in tile filenames.
    pub fn dataset_tag(&self) -> &'static str {
        match self {
            ContentType::Imagery | ContentType::ImageryCache => "_D004_S001_T001_",
            ContentType::Elevation | ContentType::ElevationCache => "_D001_S001_T001_",
        }
    }

    /// File extension including the leading dot.
    pub fn extension(&self) -> &'static str {
        match self {
            ContentType::Imagery => ".jp2",
            ContentType::ImageryCache => ".tif",
            ContentType::Elevation => ".tif",
            ContentType::ElevationCache => ".img",
        }
    }

    /// The cache variant of this content type.
    pub fn cache_variant(&self) -> ContentType {
        match self {
            ContentType::Imagery | ContentType::ImageryCache => ContentType::ImageryCache,
            ContentType::Elevation | ContentType::ElevationCache => ContentType::ElevationCache,
        }
    }

    /// The source variant of this content type.
    pub fn source_variant(&self) -> ContentType {
        match self {
            ContentType::Imagery | ContentType::ImageryCache => ContentType::Imagery,
            ContentType::Elevation | ContentType::ElevationCache => ContentType::Elevation,
        }
    }

    #[inline]
    pub fn is_cache(&self) -> bool {
        matches!(self, ContentType::ImageryCache | ContentType::ElevationCache)
    }

    #[inline]
    pub fn is_imagery(&self) -> bool {
        matches!(self, ContentType::Imagery | ContentType::ImageryCache)
    }

    /// Number of raster bands stored for this content.
    pub fn band_count(&self) -> usize {
        if self.is_imagery() {
            3
        } else {
            1
        }
    }

    /// Sample type of each band.
    pub fn band_type(&self) -> BandType {
        if self.is_imagery() {
            BandType::Byte
        } else {
            BandType::Float32
        }
    }

    /// Codec family used to open and create files of this content.
    pub fn driver_family(&self) -> DriverFamily {
        match self {
            ContentType::Imagery => DriverFamily::Imagery,
            ContentType::ImageryCache | ContentType::Elevation => DriverFamily::GeoTiff,
            ContentType::ElevationCache => DriverFamily::ElevationCache,
        }
    }

    /// All content types.
    pub fn all() -> &'static [ContentType] {
        &[
            ContentType::Imagery,
            ContentType::Elevation,
            ContentType::ImageryCache,
            ContentType::ElevationCache,
        ]
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ContentType::Imagery => "imagery",
            ContentType::Elevation => "elevation",
            ContentType::ImageryCache => "imagery-cache",
            ContentType::ElevationCache => "elevation-cache",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ContentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "imagery" => Ok(ContentType::Imagery),
            "elevation" => Ok(ContentType::Elevation),
            "imagery-cache" | "imagery_cache" => Ok(ContentType::ImageryCache),
            "elevation-cache" | "elevation_cache" => Ok(ContentType::ElevationCache),
            other => Err(format!("unknown content type '{}'", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_layer_and_extension_table() {
        assert_eq!(ContentType::Imagery.layer(), "004_Imagery");
        assert_eq!(ContentType::Imagery.extension(), ".jp2");
        assert_eq!(ContentType::ImageryCache.extension(), ".tif");
        assert_eq!(ContentType::Elevation.layer(), "001_Elevation");
        assert_eq!(ContentType::Elevation.extension(), ".tif");
        assert_eq!(ContentType::ElevationCache.extension(), ".img");
    }

    #[test]
    fn test_variants_are_idempotent() {
        for content in ContentType::all() {
            assert_eq!(content.cache_variant().cache_variant(), content.cache_variant());
            assert_eq!(content.source_variant().cache_variant(), content.cache_variant());
            assert_eq!(content.layer(), content.cache_variant().layer());
            assert_eq!(content.dataset_tag(), content.source_variant().dataset_tag());
        }
    }

    #[test]
    fn test_driver_family_mapping() {
        assert_eq!(ContentType::Imagery.driver_family(), DriverFamily::Imagery);
        assert_eq!(ContentType::ImageryCache.driver_family(), DriverFamily::GeoTiff);
        assert_eq!(ContentType::Elevation.driver_family(), DriverFamily::GeoTiff);
        assert_eq!(
            ContentType::ElevationCache.driver_family(),
            DriverFamily::ElevationCache
        );
    }

    #[test]
    fn test_parse_round_trip() {
        for content in ContentType::all() {
            let parsed: ContentType = content.to_string().parse().unwrap();
            assert_eq!(parsed, *content);
        }
        assert!("terrain".parse::<ContentType>().is_err());
    }
}
