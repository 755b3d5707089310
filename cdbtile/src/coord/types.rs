//! Coordinate type definitions

use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};

/// Valid latitude range
pub const MIN_LAT: f64 = -90.0;
pub const MAX_LAT: f64 = 90.0;

/// Valid longitude range
pub const MIN_LON: f64 = -180.0;
pub const MAX_LON: f64 = 180.0;

/// Geographic rectangle in WGS84 degrees (unprojected).
///
/// The invariant `north > south` and `east > west` is checked by [`GeoExtent::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GeoExtent {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl GeoExtent {
    /// Creates a validated extent.
    ///
    /// # Arguments
    ///
    /// * `north` - Northern edge in degrees
    /// * `south` - Southern edge in degrees
    /// * `east` - Eastern edge in degrees
    /// * `west` - Western edge in degrees
    ///
    /// # Returns
    ///
    /// The extent, or `CoordError::InvalidExtent` if it has no area or any edge
    /// is not a finite number.
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> Result<Self, CoordError> {
        let finite = [north, south, east, west].iter().all(|v| v.is_finite());
        if !finite || north <= south || east <= west {
            return Err(CoordError::InvalidExtent {
                north,
                south,
                east,
                west,
            });
        }
        Ok(Self {
            north,
            south,
            east,
            west,
        })
    }

    /// Creates an extent without validation.
    ///
    /// Used internally where edges are derived from an already valid extent.
    #[inline]
    pub const fn new_unchecked(north: f64, south: f64, east: f64, west: f64) -> Self {
        Self {
            north,
            south,
            east,
            west,
        }
    }

    /// Creates an extent from a south-west corner and a size in degrees.
    #[inline]
    pub fn from_corner(south: f64, west: f64, lat_span: f64, lon_span: f64) -> Self {
        Self::new_unchecked(south + lat_span, south, west + lon_span, west)
    }

    /// Latitude span in degrees.
    #[inline]
    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    /// Longitude span in degrees.
    #[inline]
    pub fn lon_span(&self) -> f64 {
        self.east - self.west
    }

    /// Returns true if the two extents share a region of non-zero area.
    ///
    /// Extents that only touch along an edge or a corner do not overlap.
    pub fn overlaps(&self, other: &GeoExtent) -> bool {
        !(other.north <= self.south
            || other.south >= self.north
            || other.east <= self.west
            || other.west >= self.east)
    }

    /// Returns true if `other` lies entirely within this extent (edges inclusive).
    pub fn covers(&self, other: &GeoExtent) -> bool {
        self.north >= other.north
            && self.south <= other.south
            && self.east >= other.east
            && self.west <= other.west
    }
}

impl fmt::Display for GeoExtent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "N{} S{} E{} W{}",
            self.north, self.south, self.east, self.west
        )
    }
}

/// Integer address of a one-degree-latitude geocell.
///
/// `lat` is the southern edge and `lon` the western edge, both in whole degrees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct BaseCell {
    pub lat: i32,
    pub lon: i32,
}

impl BaseCell {
    #[inline]
    pub const fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    /// Latitude directory label, e.g. `N00` or `S09`.
    pub fn lat_label(&self) -> String {
        let hemisphere = if self.lat < 0 { 'S' } else { 'N' };
        format!("{}{:02}", hemisphere, self.lat.unsigned_abs())
    }

    /// Longitude directory label, e.g. `E000` or `W120`.
    pub fn lon_label(&self) -> String {
        let hemisphere = if self.lon < 0 { 'W' } else { 'E' };
        format!("{}{:03}", hemisphere, self.lon.unsigned_abs())
    }
}

impl fmt::Display for BaseCell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.lat_label(), self.lon_label())
    }
}

/// Level-of-detail label as it appears in CDB paths and filenames.
///
/// Non-negative levels format as `L07`, negative (cache) levels as `LC03`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LodLabel(i32);

impl LodLabel {
    #[inline]
    pub const fn new(lod: i32) -> Self {
        Self(lod)
    }

    /// The signed level this label encodes.
    #[inline]
    pub const fn lod(&self) -> i32 {
        self.0
    }

    /// True for `LC` labels.
    #[inline]
    pub const fn is_cache_level(&self) -> bool {
        self.0 < 0
    }
}

impl fmt::Display for LodLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0 < 0 {
            write!(f, "LC{:02}", self.0.unsigned_abs())
        } else {
            write!(f, "L{:02}", self.0)
        }
    }
}

impl FromStr for LodLabel {
    type Err = CoordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || CoordError::InvalidLodLabel(s.to_string());

        let (negative, digits) = match s.strip_prefix("LC") {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('L').ok_or_else(invalid)?),
        };

        if digits.len() < 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        let magnitude: i32 = digits.parse().map_err(|_| invalid())?;

        if negative {
            if magnitude == 0 {
                return Err(invalid());
            }
            Ok(Self(-magnitude))
        } else {
            Ok(Self(magnitude))
        }
    }
}

impl Serialize for LodLabel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Errors that can occur while building coordinates.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordError {
    /// Extent has no area or contains a non-finite edge
    InvalidExtent {
        north: f64,
        south: f64,
        east: f64,
        west: f64,
    },
    /// String is not an `L##` or `LC##` label
    InvalidLodLabel(String),
}

impl fmt::Display for CoordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CoordError::InvalidExtent {
                north,
                south,
                east,
                west,
            } => write!(
                f,
                "Invalid extent: N{} S{} E{} W{} (north must exceed south and east must exceed west)",
                north, south, east, west
            ),
            CoordError::InvalidLodLabel(label) => {
                write!(f, "Invalid LOD label: '{}' (expected L## or LC##)", label)
            }
        }
    }
}

impl std::error::Error for CoordError {}
