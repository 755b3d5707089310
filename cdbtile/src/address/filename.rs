//! CDB tile filename parsing.
//!
//! Parses filenames of the form
//! `<LAT><LON>_D<ddd>_S<sss>_T<ttt>_<LodLabel>_U<row>_R<col>.<ext>`
//!
//! Examples:
//! - `N00E000_D004_S001_T001_L00_U0_R0.jp2` (imagery, base level)
//! - `S34E151_D001_S001_T001_L03_U5_R2.tif` (elevation, LOD 3)
//! - `N60E050_D001_S001_T001_LC02_U0_R0.img` (elevation cache composite)

use regex::Regex;
use std::sync::OnceLock;

use super::ContentType;
use crate::coord::{BaseCell, LodLabel};

/// Parsed CDB tile filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TileFilename {
    pub base: BaseCell,
    /// Dataset code (`D004` is imagery, `D001` elevation)
    pub dataset: u16,
    pub selector1: u16,
    pub selector2: u16,
    pub lod: LodLabel,
    pub uref: u32,
    pub rref: u32,
    /// Extension without the leading dot
    pub extension: String,
}

impl TileFilename {
    /// Content type implied by the dataset code and extension, if recognised.
    pub fn content(&self) -> Option<ContentType> {
        match (self.dataset, self.extension.to_ascii_lowercase().as_str()) {
            (4, "jp2") => Some(ContentType::Imagery),
            (4, "tif") => Some(ContentType::ImageryCache),
            (1, "tif") => Some(ContentType::Elevation),
            (1, "img") => Some(ContentType::ElevationCache),
            _ => None,
        }
    }
}

/// Error parsing a CDB tile filename.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Filename doesn't match expected pattern
    InvalidPattern,
    /// Latitude or longitude component out of range
    InvalidCell(String),
    /// Numeric component does not fit
    InvalidNumber(String),
}

impl std::fmt::Display for ParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParseError::InvalidPattern => write!(f, "Filename doesn't match CDB tile pattern"),
            ParseError::InvalidCell(s) => write!(f, "Invalid geocell: {}", s),
            ParseError::InvalidNumber(s) => write!(f, "Invalid number: {}", s),
        }
    }
}

impl std::error::Error for ParseError {}

/// Get the CDB tile filename regex.
///
/// We capture:
/// - Groups 1-4: hemisphere and degrees for latitude then longitude
/// - Groups 5-7: dataset and selector codes
/// - Group 8: LOD label (`L##` or `LC##`)
/// - Groups 9-10: UREF and RREF
/// - Group 11: extension
fn tile_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(
            r"^([NS])(\d{2})([EW])(\d{3})_D(\d{3})_S(\d{3})_T(\d{3})_(LC\d{2}|L\d{2})_U(\d+)_R(\d+)\.([A-Za-z0-9]+)$",
        )
        .expect("tile filename pattern is valid")
    })
}

/// Parse a CDB tile filename.
///
/// Accepts a bare filename or a path; only the final component is parsed.
pub fn parse_tile_filename(filename: &str) -> Result<TileFilename, ParseError> {
    let name = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);

    let caps = tile_pattern()
        .captures(name)
        .ok_or(ParseError::InvalidPattern)?;

    let number = |index: usize| -> Result<u32, ParseError> {
        caps[index]
            .parse::<u32>()
            .map_err(|_| ParseError::InvalidNumber(caps[index].to_string()))
    };

    let lat = number(2)? as i32;
    let lon = number(4)? as i32;
    if lat > 90 || lon > 180 {
        return Err(ParseError::InvalidCell(format!("{}{}", &caps[1], &caps[3])));
    }
    let lat = if &caps[1] == "S" { -lat } else { lat };
    let lon = if &caps[3] == "W" { -lon } else { lon };

    let lod: LodLabel = caps[8]
        .parse()
        .map_err(|_| ParseError::InvalidNumber(caps[8].to_string()))?;

    Ok(TileFilename {
        base: BaseCell::new(lat, lon),
        dataset: number(5)? as u16,
        selector1: number(6)? as u16,
        selector2: number(7)? as u16,
        lod,
        uref: number(9)?,
        rref: number(10)?,
        extension: caps[11].to_string(),
    })
}
