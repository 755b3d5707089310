//! Coordinate primitives for the CDB geocell grid
//!
//! Provides the latitude-banded longitude step, level-of-detail derivation and
//! the epsilon-tolerant rounding used to turn request extents into geocell
//! addresses.

mod types;

pub use types::{BaseCell, CoordError, GeoExtent, LodLabel, MAX_LAT, MAX_LON, MIN_LAT, MIN_LON};

/// Tiles-per-degree below which a request is treated as a multi-geocell cache level.
///
/// Empirical threshold: a span slightly wider than one degree still resolves
/// to LOD 0, anything wider than ~1.01 degrees becomes a cache level.
pub const CACHE_LOD_THRESHOLD: f64 = 0.99;

/// Tolerance used when snapping floating point degrees to whole numbers.
pub const DEGREE_EPSILON: f64 = 1e-9;

/// Pixel sizes by level hint, finest first.
pub const TILE_SIZES: [usize; 11] = [1024, 512, 256, 128, 64, 32, 16, 8, 4, 2, 1];

/// Default square tile size in pixels.
pub const DEFAULT_TILE_SIZE: usize = TILE_SIZES[0];

/// Returns the longitude width in degrees of a geocell whose southern edge is `lat`.
///
/// Bands widen toward the poles. In the southern hemisphere the band boundaries
/// are inclusive on the equator side, so the geocell just south of a boundary
/// takes the wider step.
#[inline]
pub fn lon_step(lat: f64) -> u32 {
    let test = lat.abs();
    if lat >= 0.0 {
        match test {
            t if t < 50.0 => 1,
            t if t < 70.0 => 2,
            t if t < 75.0 => 3,
            t if t < 80.0 => 4,
            t if t < 89.0 => 6,
            _ => 12,
        }
    } else {
        match test {
            t if t <= 50.0 => 1,
            t if t <= 70.0 => 2,
            t if t <= 75.0 => 3,
            t if t <= 80.0 => 4,
            t if t <= 89.0 => 6,
            _ => 12,
        }
    }
}

/// Floors a degree value, snapping to the nearest integer first when within
/// [`DEGREE_EPSILON`] of it.
///
/// Negative values floor toward more-negative, so `-0.5` becomes `-1`.
#[inline]
pub fn floor_degree(value: f64) -> f64 {
    let nearest = value.round();
    if (value - nearest).abs() < DEGREE_EPSILON {
        nearest
    } else {
        value.floor()
    }
}

/// Snaps a western edge down to the nearest lower multiple of `step` degrees.
#[inline]
pub fn snap_to_step(west: f64, step: u32) -> f64 {
    let step = f64::from(step.max(1));
    floor_degree(west / step) * step
}

/// Derives the signed CDB level of detail from a latitude span.
///
/// # Arguments
///
/// * `lat_span` - Latitude span of the request in degrees (must be positive)
/// * `level_hint` - Optional sub-base pixel level; takes effect only when the
///   span resolves to the base level
///
/// # Returns
///
/// The LOD: positive for subdivisions of a geocell, zero for one geocell,
/// negative for cache aggregations or hinted sub-base assets.
pub fn derive_lod(lat_span: f64, level_hint: Option<u8>) -> i32 {
    let tiles_per_degree = 1.0 / lat_span;

    if tiles_per_degree < CACHE_LOD_THRESHOLD {
        let mut tiles = (lat_span / 2.0).round() as i64;
        let mut lod = -1;
        while tiles > 1 {
            tiles /= 2;
            lod -= 1;
        }
        return lod;
    }

    let mut tiles = tiles_per_degree.round() as i64;

    if let Some(hint) = level_hint.filter(|h| *h > 0) {
        if tiles <= 1 {
            return -i32::from(clamp_hint(hint));
        }
    }

    let mut lod = 0;
    while tiles > 1 {
        tiles /= 2;
        lod += 1;
    }
    lod
}

/// Pixel size for a level hint, or the default size when no hint applies.
#[inline]
pub fn tile_size_for_hint(level_hint: Option<u8>) -> usize {
    match level_hint.filter(|h| *h > 0) {
        Some(hint) => TILE_SIZES[clamp_hint(hint) as usize],
        None => DEFAULT_TILE_SIZE,
    }
}

#[inline]
fn clamp_hint(hint: u8) -> u8 {
    hint.min((TILE_SIZES.len() - 1) as u8)
}

/// Number of sub-tiles along one edge of a geocell at `lod` (1 for `lod <= 0`).
#[inline]
pub fn tiles_per_geocell(lod: i32) -> u32 {
    if lod > 0 {
        1u32 << lod.min(31)
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lon_step_equatorial_band() {
        assert_eq!(lon_step(0.0), 1);
        assert_eq!(lon_step(49.5), 1);
        assert_eq!(lon_step(-49.0), 1);
        assert_eq!(lon_step(-50.0), 1, "south boundary is inclusive");
    }

    #[test]
    fn test_lon_step_northern_breakpoints() {
        assert_eq!(lon_step(50.0), 2);
        assert_eq!(lon_step(69.0), 2);
        assert_eq!(lon_step(70.0), 3);
        assert_eq!(lon_step(75.0), 4);
        assert_eq!(lon_step(80.0), 6);
        assert_eq!(lon_step(88.0), 6);
        assert_eq!(lon_step(89.0), 12);
    }

    #[test]
    fn test_lon_step_southern_breakpoints() {
        assert_eq!(lon_step(-51.0), 2);
        assert_eq!(lon_step(-70.0), 2);
        assert_eq!(lon_step(-71.0), 3);
        assert_eq!(lon_step(-75.0), 3);
        assert_eq!(lon_step(-76.0), 4);
        assert_eq!(lon_step(-81.0), 6);
        assert_eq!(lon_step(-89.0), 6);
        assert_eq!(lon_step(-90.0), 12);
    }

    #[test]
    fn test_lon_step_symmetric_away_from_breakpoints() {
        for lat in [10.5, 55.5, 72.5, 77.5, 85.5, 89.5] {
            assert_eq!(
                lon_step(lat),
                lon_step(-lat),
                "step at {} should match its mirror",
                lat
            );
        }
    }

    #[test]
    fn test_floor_degree_snaps_near_integers() {
        assert_eq!(floor_degree(1.0 - 1e-12), 1.0);
        assert_eq!(floor_degree(-1.0 + 1e-12), -1.0);
        assert_eq!(floor_degree(0.5), 0.0);
        assert_eq!(floor_degree(-0.5), -1.0);
        assert_eq!(floor_degree(-179.25), -180.0);
    }

    #[test]
    fn test_snap_to_step_is_sign_aware() {
        assert_eq!(snap_to_step(51.0, 2), 50.0);
        assert_eq!(snap_to_step(50.0, 2), 50.0);
        assert_eq!(snap_to_step(-3.0, 2), -4.0);
        assert_eq!(snap_to_step(-2.5, 2), -4.0);
        assert_eq!(snap_to_step(-7.0, 6), -12.0);
        assert_eq!(snap_to_step(13.0, 1), 13.0);
    }

    #[test]
    fn test_derive_lod_base_level() {
        assert_eq!(derive_lod(1.0, None), 0);
    }

    #[test]
    fn test_derive_lod_subdivisions() {
        for k in 1..=10 {
            let span = 1.0 / f64::from(1u32 << k);
            assert_eq!(derive_lod(span, None), k, "span 1/2^{} should be LOD {}", k, k);
        }
    }

    #[test]
    fn test_derive_lod_cache_levels() {
        assert_eq!(derive_lod(2.0, None), -1);
        assert_eq!(derive_lod(4.0, None), -2);
        assert_eq!(derive_lod(8.0, None), -3);
        assert_eq!(derive_lod(32.0, None), -5);
        assert_eq!(derive_lod(180.0, None), -7);
    }

    #[test]
    fn test_derive_lod_threshold_boundary() {
        // 1/1.0101 tiles per degree still sits on the base side of the threshold
        assert_eq!(derive_lod(1.0 / CACHE_LOD_THRESHOLD - 1e-6, None), 0);
        assert_eq!(derive_lod(1.0 / CACHE_LOD_THRESHOLD + 1e-3, None), -1);
    }

    #[test]
    fn test_derive_lod_hint_applies_only_at_base() {
        assert_eq!(derive_lod(1.0, Some(3)), -3);
        assert_eq!(derive_lod(0.5, Some(3)), 1, "hint ignored above base level");
        assert_eq!(derive_lod(4.0, Some(3)), -2, "hint ignored for cache spans");
        assert_eq!(derive_lod(1.0, Some(0)), 0, "zero hint means no hint");
    }

    #[test]
    fn test_tile_size_for_hint() {
        assert_eq!(tile_size_for_hint(None), 1024);
        assert_eq!(tile_size_for_hint(Some(0)), 1024);
        assert_eq!(tile_size_for_hint(Some(1)), 512);
        assert_eq!(tile_size_for_hint(Some(10)), 1);
        assert_eq!(tile_size_for_hint(Some(42)), 1);
    }

    #[test]
    fn test_tiles_per_geocell() {
        assert_eq!(tiles_per_geocell(-3), 1);
        assert_eq!(tiles_per_geocell(0), 1);
        assert_eq!(tiles_per_geocell(4), 16);
    }

    #[test]
    fn test_lod_label_format() {
        assert_eq!(LodLabel::new(7).to_string(), "L07");
        assert_eq!(LodLabel::new(0).to_string(), "L00");
        assert_eq!(LodLabel::new(-3).to_string(), "LC03");
        assert_eq!(LodLabel::new(12).to_string(), "L12");
    }

    #[test]
    fn test_lod_label_parse() {
        let positive: LodLabel = "L07".parse().unwrap();
        assert_eq!(positive.lod(), 7);
        assert!(!positive.is_cache_level());

        let negative: LodLabel = "LC03".parse().unwrap();
        assert_eq!(negative.lod(), -3);
        assert!(negative.is_cache_level());
    }

    #[test]
    fn test_lod_label_parse_rejects_malformed() {
        for bad in ["", "L", "LC", "L7", "LC00", "X07", "L0a", "LC-3"] {
            assert!(
                bad.parse::<LodLabel>().is_err(),
                "'{}' should not parse as a LOD label",
                bad
            );
        }
    }

    #[test]
    fn test_base_cell_labels() {
        assert_eq!(BaseCell::new(0, 0).lat_label(), "N00");
        assert_eq!(BaseCell::new(0, 0).lon_label(), "E000");
        assert_eq!(BaseCell::new(-9, -120).to_string(), "S09W120");
        assert_eq!(BaseCell::new(89, 179).to_string(), "N89E179");
    }

    #[test]
    fn test_extent_validation() {
        assert!(GeoExtent::new(1.0, 0.0, 1.0, 0.0).is_ok());
        assert!(matches!(
            GeoExtent::new(0.0, 1.0, 1.0, 0.0),
            Err(CoordError::InvalidExtent { .. })
        ));
        assert!(GeoExtent::new(1.0, 0.0, 0.0, 0.0).is_err());
        assert!(GeoExtent::new(f64::NAN, 0.0, 1.0, 0.0).is_err());
    }

    #[test]
    fn test_extent_overlap_excludes_shared_edges() {
        let a = GeoExtent::new_unchecked(1.0, 0.0, 1.0, 0.0);
        let east = GeoExtent::new_unchecked(1.0, 0.0, 2.0, 1.0);
        let inner = GeoExtent::new_unchecked(0.75, 0.25, 0.75, 0.25);

        assert!(!a.overlaps(&east), "edge-sharing extents do not overlap");
        assert!(a.overlaps(&inner));
        assert!(a.covers(&inner));
        assert!(!inner.covers(&a));
        assert!(a.covers(&a));
    }

    #[test]
    fn test_coord_error_display() {
        let err = CoordError::InvalidLodLabel("X1".to_string());
        assert!(err.to_string().contains("X1"));
    }

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn test_lon_step_symmetric_away_from_breakpoints(lat in 0.0..89.9_f64) {
                let breakpoints = [50.0, 70.0, 75.0, 80.0, 89.0];
                prop_assume!(breakpoints.iter().all(|b| (lat - b).abs() > 1e-6));
                prop_assert_eq!(lon_step(lat), lon_step(-lat));
            }

            #[test]
            fn test_lon_step_monotonic(a in 0.0..90.0_f64, b in 0.0..90.0_f64) {
                let (low, high) = if a <= b { (a, b) } else { (b, a) };
                prop_assert!(lon_step(low) <= lon_step(high));
            }

            #[test]
            fn test_power_of_two_spans(k in 0i32..=10) {
                let span = 1.0 / f64::from(1u32 << k);
                prop_assert_eq!(derive_lod(span, None), k);
                prop_assert_eq!(tiles_per_geocell(k), 1u32 << k);
            }

            #[test]
            fn test_lod_label_round_trip(lod in -10i32..=23) {
                let label = LodLabel::new(lod);
                let parsed: LodLabel = label.to_string().parse().unwrap();
                prop_assert_eq!(parsed.lod(), lod);
            }

            #[test]
            fn test_floor_degree_never_exceeds_value(value in -180.0..180.0_f64) {
                let floored = floor_degree(value);
                prop_assert!(floored <= value + DEGREE_EPSILON);
                prop_assert!(value - floored < 1.0);
            }
        }
    }
}
