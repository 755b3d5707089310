//! Mapping from request extents to CDB directory layout.

use std::path::{Path, PathBuf};

use serde::Serialize;

use super::ContentType;
use crate::coord::{
    derive_lod, floor_degree, lon_step, snap_to_step, tile_size_for_hint, BaseCell, GeoExtent,
    LodLabel,
};

/// Directory under the dataset root holding all tiled layers.
pub const TILES_DIR: &str = "Tiles";

/// Directory holding sub-base-resolution assets of a geocell.
pub const LC_DIR: &str = "LC";

/// Canonical address of a tile within a CDB dataset.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TileAddress {
    /// Signed level of detail
    pub lod: i32,
    /// Geocell containing the tile's south-west corner
    pub base: BaseCell,
    pub lod_label: LodLabel,
    /// Sub-tile row within the geocell (0 at LOD <= 0)
    pub uref: u32,
    /// Sub-tile column within the geocell (0 at LOD <= 0)
    pub rref: u32,
    /// Square pixel size of the tile
    pub tile_size: usize,
    /// Content after cache promotion
    pub content: ContentType,
    /// True when a level hint selected a sub-base asset
    pub hinted: bool,
    /// File in the primary store
    pub primary_path: PathBuf,
    /// File in the cache store, when one is configured
    pub cache_path: Option<PathBuf>,
}

impl TileAddress {
    /// `U<row>` directory and filename component.
    pub fn uref_label(&self) -> String {
        format!("U{}", self.uref)
    }

    /// `R<col>` filename component.
    pub fn rref_label(&self) -> String {
        format!("R{}", self.rref)
    }

    /// Filename of this tile stored as `content`.
    pub fn file_name(&self, content: ContentType) -> String {
        tile_file_name(
            self.base,
            content,
            self.lod_label,
            self.uref,
            self.rref,
        )
    }

    /// The file a tile of this address reads and writes.
    ///
    /// Cache content lives only in the cache store, so this is `None` for a
    /// cache variant when no cache directory is configured.
    pub fn tile_path(&self) -> Option<&Path> {
        if self.content.is_cache() {
            self.cache_path.as_deref()
        } else {
            Some(&self.primary_path)
        }
    }

    /// True for composites of several geocells.
    #[inline]
    pub fn is_cache_level(&self) -> bool {
        self.lod < 0 && !self.hinted
    }
}

/// Resolves an extent to its CDB address.
///
/// # Arguments
///
/// * `extent` - Requested rectangle (must satisfy the `GeoExtent` invariant)
/// * `content` - Requested content
/// * `level_hint` - Optional sub-base level; `Some(0)` is treated as no hint
/// * `root` - Dataset root directory
/// * `cache_root` - Optional cache directory
///
/// # Returns
///
/// The full address including both store paths. Pure: touches no files.
pub fn resolve(
    extent: &GeoExtent,
    content: ContentType,
    level_hint: Option<u8>,
    root: &Path,
    cache_root: Option<&Path>,
) -> TileAddress {
    let lat_span = extent.lat_span();
    let lon_span = extent.lon_span();

    let lod = derive_lod(lat_span, level_hint);
    let hinted = lod != derive_lod(lat_span, None);

    let content = if lod < 0 && !hinted {
        content.cache_variant()
    } else {
        content
    };

    let base_lat = floor_degree(extent.south);
    let base_lon = if lod >= 0 {
        snap_to_step(extent.west, lon_step(base_lat))
    } else {
        floor_degree(extent.west)
    };
    let base = BaseCell::new(base_lat as i32, base_lon as i32);

    let (uref, rref) = if lod > 0 {
        let uref = ((extent.south - base_lat) / lat_span).round().max(0.0) as u32;
        let rref = ((extent.west - base_lon) / lon_span).round().max(0.0) as u32;
        (uref, rref)
    } else {
        (0, 0)
    };

    let lod_label = LodLabel::new(lod);
    let tile_size = tile_size_for_hint(if hinted { level_hint } else { None });

    let primary_path = nested_path(
        root,
        base,
        content.source_variant(),
        lod_label,
        uref,
        rref,
        content.source_variant(),
    );

    let cache_path = cache_root.map(|cache| {
        let cache_content = content.cache_variant();
        if lod < 0 {
            cache
                .join(cache_content.layer())
                .join(tile_file_name(base, cache_content, lod_label, uref, rref))
        } else {
            nested_path(cache, base, cache_content, lod_label, uref, rref, cache_content)
        }
    });

    TileAddress {
        lod,
        base,
        lod_label,
        uref,
        rref,
        tile_size,
        content,
        hinted,
        primary_path,
        cache_path,
    }
}

/// Path of the LOD 0 source tile of a geocell.
pub fn geocell_path(root: &Path, cell: BaseCell, content: ContentType) -> PathBuf {
    let content = content.source_variant();
    nested_path(root, cell, content, LodLabel::new(0), 0, 0, content)
}

fn nested_path(
    root: &Path,
    base: BaseCell,
    layer_content: ContentType,
    lod_label: LodLabel,
    uref: u32,
    rref: u32,
    file_content: ContentType,
) -> PathBuf {
    let lod_dir = if lod_label.is_cache_level() {
        LC_DIR.to_string()
    } else {
        lod_label.to_string()
    };

    root.join(TILES_DIR)
        .join(base.lat_label())
        .join(base.lon_label())
        .join(layer_content.layer())
        .join(lod_dir)
        .join(format!("U{}", uref))
        .join(tile_file_name(base, file_content, lod_label, uref, rref))
}

fn tile_file_name(
    base: BaseCell,
    content: ContentType,
    lod_label: LodLabel,
    uref: u32,
    rref: u32,
) -> String {
    format!(
        "{}{}{}{}_U{}_R{}{}",
        base.lat_label(),
        base.lon_label(),
        content.dataset_tag(),
        lod_label,
        uref,
        rref,
        content.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn root() -> PathBuf {
        PathBuf::from("/cdb")
    }

    fn extent(north: f64, south: f64, east: f64, west: f64) -> GeoExtent {
        GeoExtent::new(north, south, east, west).unwrap()
    }

    #[test]
    fn test_one_degree_equatorial_tile() {
        let address = resolve(
            &extent(1.0, 0.0, 1.0, 0.0),
            ContentType::Imagery,
            None,
            &root(),
            None,
        );

        assert_eq!(address.lod, 0);
        assert_eq!(address.base.lat_label(), "N00");
        assert_eq!(address.base.lon_label(), "E000");
        assert_eq!(address.uref_label(), "U0");
        assert_eq!(address.rref_label(), "R0");
        assert_eq!(address.content, ContentType::Imagery);
        assert_eq!(address.tile_size, 1024);
        assert_eq!(
            address.primary_path,
            root()
                .join("Tiles")
                .join("N00")
                .join("E000")
                .join("004_Imagery")
                .join("L00")
                .join("U0")
                .join("N00E000_D004_S001_T001_L00_U0_R0.jp2")
        );
        assert!(address.cache_path.is_none());
    }

    #[test]
    fn test_subtile_indices() {
        // LOD 2 tile in the north-east quarter of N10W020
        let address = resolve(
            &extent(11.0, 10.75, -19.0, -19.25),
            ContentType::Elevation,
            None,
            &root(),
            None,
        );

        assert_eq!(address.lod, 2);
        assert_eq!(address.base, BaseCell::new(10, -20));
        assert_eq!(address.uref, 3);
        assert_eq!(address.rref, 3);
        assert_eq!(
            address.file_name(ContentType::Elevation),
            "N10W020_D001_S001_T001_L02_U3_R3.tif"
        );
    }

    #[test]
    fn test_high_latitude_snaps_west_to_step() {
        // Step is 2 at 60N, so a tile starting at 51E belongs to the E050 geocell
        let address = resolve(
            &extent(60.5, 60.0, 52.0, 51.0),
            ContentType::Imagery,
            None,
            &root(),
            None,
        );

        assert_eq!(address.lod, 1);
        assert_eq!(address.base, BaseCell::new(60, 50));
        assert_eq!(address.uref, 0);
        assert_eq!(address.rref, 1);
    }

    #[test]
    fn test_western_hemisphere_snaps_further_west() {
        let address = resolve(
            &extent(71.0, 70.0, -3.0, -6.0),
            ContentType::Imagery,
            None,
            &root(),
            None,
        );

        assert_eq!(address.lod, 0);
        assert_eq!(address.base.lon_label(), "W006");

        let address = resolve(
            &extent(71.0, 70.5, -4.5, -6.0),
            ContentType::Imagery,
            None,
            &root(),
            None,
        );
        assert_eq!(address.base.lon, -6, "-6 is already a multiple of 3");
    }

    #[test]
    fn test_southern_hemisphere_floors_toward_pole() {
        let address = resolve(
            &extent(-33.5, -34.0, 151.5, 151.0),
            ContentType::Imagery,
            None,
            &root(),
            None,
        );

        assert_eq!(address.lod, 1);
        assert_eq!(address.base.lat_label(), "S34");
        assert_eq!(address.base.lon_label(), "E151");
        assert_eq!(address.uref, 1);
        assert_eq!(address.rref, 0);
    }

    #[test]
    fn test_cache_level_promotes_content_and_uses_flat_cache_path() {
        let cache = PathBuf::from("/cache");
        let address = resolve(
            &extent(4.0, 0.0, 4.0, 0.0),
            ContentType::Elevation,
            None,
            &root(),
            Some(&cache),
        );

        assert_eq!(address.lod, -2);
        assert_eq!(address.lod_label.to_string(), "LC02");
        assert_eq!(address.content, ContentType::ElevationCache);
        assert!(address.is_cache_level());
        assert_eq!(
            address.cache_path.as_deref(),
            Some(
                cache
                    .join("001_Elevation")
                    .join("N00E000_D001_S001_T001_LC02_U0_R0.img")
                    .as_path()
            )
        );
        assert_eq!(address.tile_path(), address.cache_path.as_deref());
    }

    #[test]
    fn test_cache_level_without_cache_dir_has_no_tile_path() {
        let address = resolve(
            &extent(4.0, 0.0, 4.0, 0.0),
            ContentType::Imagery,
            None,
            &root(),
            None,
        );
        assert!(address.tile_path().is_none());
    }

    #[test]
    fn test_hinted_request_uses_lc_directory() {
        let address = resolve(
            &extent(1.0, 0.0, 1.0, 0.0),
            ContentType::Imagery,
            Some(2),
            &root(),
            None,
        );

        assert_eq!(address.lod, -2);
        assert!(address.hinted);
        assert!(!address.is_cache_level());
        assert_eq!(address.content, ContentType::Imagery);
        assert_eq!(address.tile_size, 256);
        assert_eq!(
            address.primary_path,
            root()
                .join("Tiles")
                .join("N00")
                .join("E000")
                .join("004_Imagery")
                .join("LC")
                .join("U0")
                .join("N00E000_D004_S001_T001_LC02_U0_R0.jp2")
        );
    }

    #[test]
    fn test_per_tile_cache_uses_nested_layout() {
        let cache = PathBuf::from("/cache");
        let address = resolve(
            &extent(61.0, 60.0, 52.0, 50.0),
            ContentType::Imagery,
            None,
            &root(),
            Some(&cache),
        );

        assert_eq!(
            address.cache_path,
            Some(
                cache
                    .join("Tiles")
                    .join("N60")
                    .join("E050")
                    .join("004_Imagery")
                    .join("L00")
                    .join("U0")
                    .join("N60E050_D004_S001_T001_L00_U0_R0.tif")
            )
        );
    }

    #[test]
    fn test_address_serializes_labels() {
        let address = resolve(
            &extent(1.0, 0.0, 1.0, 0.0),
            ContentType::Elevation,
            None,
            &root(),
            None,
        );

        let json = serde_json::to_value(&address).unwrap();
        assert_eq!(json["lod"], 0);
        assert_eq!(json["lod_label"], "L00");
        assert_eq!(json["content"], "elevation");
        assert!(json["cache_path"].is_null());
    }

    #[test]
    fn test_geocell_path() {
        let path = geocell_path(&root(), BaseCell::new(-1, -1), ContentType::ElevationCache);
        assert_eq!(
            path,
            root()
                .join("Tiles")
                .join("S01")
                .join("W001")
                .join("001_Elevation")
                .join("L00")
                .join("U0")
                .join("S01W001_D001_S001_T001_L00_U0_R0.tif")
        );
    }
}
