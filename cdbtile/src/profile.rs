//! Geodetic tiling profile of a CDB dataset.
//!
//! A consumer that tiles the globe needs to know the area served and how many
//! top-level tiles divide it. Limits are snapped to geocell boundaries and
//! widened so the top level is a whole number of cache tiles.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::coord::GeoExtent;

/// Top-level tiles across the whole earth.
pub const WORLD_TILES_X: u32 = 90;
pub const WORLD_TILES_Y: u32 = 45;

/// Errors parsing data limits.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ProfileError {
    #[error("Invalid limits '{0}': expected min_lon,min_lat,max_lon,max_lat")]
    InvalidFormat(String),

    #[error("Invalid limits '{0}': area is empty after rounding to geocells")]
    EmptyArea(String),
}

/// Area of a dataset as `min_lon,min_lat,max_lon,max_lat` in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DataLimits {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl DataLimits {
    /// Parses `min_lon,min_lat,max_lon,max_lat`.
    pub fn parse(value: &str) -> Result<Self, ProfileError> {
        let invalid = || ProfileError::InvalidFormat(value.to_string());
        let parts: Vec<f64> = value
            .split(',')
            .map(|p| p.trim().parse::<f64>())
            .collect::<Result<_, _>>()
            .map_err(|_| invalid())?;

        match parts.as_slice() {
            [min_lon, min_lat, max_lon, max_lat] if parts.iter().all(|v| v.is_finite()) => {
                Ok(Self {
                    min_lon: *min_lon,
                    min_lat: *min_lat,
                    max_lon: *max_lon,
                    max_lat: *max_lat,
                })
            }
            _ => Err(invalid()),
        }
    }

    /// Limits rounded to the nearest whole degrees.
    pub fn rounded(&self) -> Self {
        Self {
            min_lon: self.min_lon.round(),
            min_lat: self.min_lat.round(),
            max_lon: self.max_lon.round(),
            max_lat: self.max_lat.round(),
        }
    }
}

impl FromStr for DataLimits {
    type Err = ProfileError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for DataLimits {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.min_lon, self.min_lat, self.max_lon, self.max_lat
        )
    }
}

/// Served area and top-level tile grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeodeticProfile {
    pub extent: GeoExtent,
    pub tiles_x: u32,
    pub tiles_y: u32,
    /// Levels coarser than one geocell the profile is built for
    pub negative_lods: u32,
}

impl GeodeticProfile {
    /// The whole earth in 90 × 45 top-level tiles.
    pub fn whole_earth() -> Self {
        Self {
            extent: GeoExtent::new_unchecked(90.0, -90.0, 180.0, -180.0),
            tiles_x: WORLD_TILES_X,
            tiles_y: WORLD_TILES_Y,
            negative_lods: 1,
        }
    }

    /// Builds a profile over `limits`.
    ///
    /// Limits are rounded to whole degrees, then each span is widened
    /// eastward or northward to a multiple of `2 << negative_lods` geocells.
    /// Each top-level tile covers that many geocells per side.
    pub fn from_limits(limits: &DataLimits, negative_lods: u32) -> Result<Self, ProfileError> {
        let r = limits.rounded();
        if r.max_lon <= r.min_lon || r.max_lat <= r.min_lat {
            return Err(ProfileError::EmptyArea(limits.to_string()));
        }

        let subfact = 2u32 << negative_lods.min(30);
        let (tiles_x, max_lon) = expand_span(r.min_lon, r.max_lon, subfact);
        let (tiles_y, max_lat) = expand_span(r.min_lat, r.max_lat, subfact);

        let profile = Self {
            extent: GeoExtent::new_unchecked(max_lat, r.min_lat, max_lon, r.min_lon),
            tiles_x,
            tiles_y,
            negative_lods,
        };

        tracing::info!(
            min_lon = r.min_lon,
            min_lat = r.min_lat,
            max_lon,
            max_lat,
            tiles_x,
            tiles_y,
            negative_lods,
            subfact,
            "Limited CDB profile"
        );
        Ok(profile)
    }

    /// Highest level a consumer should request for a dataset whose finest
    /// level is `max_lod`.
    pub fn max_data_level(&self, max_lod: u32) -> u32 {
        max_lod + self.negative_lods + 1
    }
}

impl Default for GeodeticProfile {
    fn default() -> Self {
        Self::whole_earth()
    }
}

/// Widens `[min, max]` to a multiple of `subfact`; returns tiles and new max.
fn expand_span(min: f64, max: f64, subfact: u32) -> (u32, f64) {
    let mut cells = (max - min) as u32;
    let mut max = max;
    if cells % subfact != 0 {
        cells = ((cells + subfact) / subfact) * subfact;
        max = min + f64::from(cells);
    }
    (cells / subfact, max)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_limits() {
        let limits = DataLimits::parse("-120.2, 30.6,-110,41").unwrap();
        assert_eq!(limits.min_lon, -120.2);
        assert_eq!(limits.max_lat, 41.0);
        assert_eq!("1,2,3,4".parse::<DataLimits>().unwrap().max_lon, 3.0);
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(DataLimits::parse("1,2,3").is_err());
        assert!(DataLimits::parse("1,2,3,x").is_err());
        assert!(DataLimits::parse("1,2,3,4,5").is_err());
        assert!(DataLimits::parse("nan,2,3,4").is_err());
    }

    #[test]
    fn test_profile_expands_to_subfactor() {
        // subfact = 2 << 1 = 4
        let limits = DataLimits::parse("-120.2,30.6,-110,41").unwrap();
        let profile = GeodeticProfile::from_limits(&limits, 1).unwrap();

        // 10 x 10 geocells widen to 12 x 12
        assert_eq!(profile.extent.west, -120.0);
        assert_eq!(profile.extent.east, -108.0);
        assert_eq!(profile.extent.south, 31.0);
        assert_eq!(profile.extent.north, 43.0);
        assert_eq!((profile.tiles_x, profile.tiles_y), (3, 3));
    }

    #[test]
    fn test_profile_keeps_aligned_span() {
        let limits = DataLimits::parse("0,0,8,4").unwrap();
        let profile = GeodeticProfile::from_limits(&limits, 0).unwrap();
        assert_eq!(profile.extent.east, 8.0);
        assert_eq!((profile.tiles_x, profile.tiles_y), (4, 2));
        assert_eq!(profile.max_data_level(14), 15);
    }

    #[test]
    fn test_profile_rejects_empty_area() {
        let limits = DataLimits::parse("10.2,0,10.4,5").unwrap();
        assert!(matches!(
            GeodeticProfile::from_limits(&limits, 0),
            Err(ProfileError::EmptyArea(_))
        ));
    }

    #[test]
    fn test_whole_earth_default() {
        let profile = GeodeticProfile::default();
        assert_eq!((profile.tiles_x, profile.tiles_y), (90, 45));
        assert_eq!(profile.max_data_level(14), 16);
    }
}
