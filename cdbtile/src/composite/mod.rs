//! Raster composition
//!
//! Builds a destination tile by resampling source tiles into it. Used when
//! no single file answers a request: cache levels spanning many geocells, and
//! high-latitude requests narrower than the CDB tile that holds them.
//!
//! Each destination pixel's north-west corner is mapped to a geographic
//! point, then into the source's pixel space, then sampled bilinearly.
//! Sources are applied in order and later sources overwrite earlier ones.

use crate::cache::CacheWriter;
use crate::coord::{floor_degree, lon_step, tiles_per_geocell, GeoExtent, DEGREE_EPSILON};
use crate::probe::GridWalk;
use crate::tile::{Tile, TileBuffer, TileError, TileState};

/// How much of a destination a source can fill.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Contribution {
    /// Disjoint, or touching only along an edge
    None,
    /// Overlapping part of the destination
    Partial,
    /// Covering the whole destination
    Full,
}

/// Classifies what `source` can contribute to `dest`.
pub fn contribution(source: &GeoExtent, dest: &GeoExtent) -> Contribution {
    if !source.overlaps(dest) {
        Contribution::None
    } else if source.covers(dest) {
        Contribution::Full
    } else {
        Contribution::Partial
    }
}

/// Summary of one composition pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CompositeOutcome {
    /// Sources considered
    pub candidates: usize,
    /// Sources whose pixels were written
    pub contributed: usize,
    /// Overlapping sources that failed to load
    pub skipped: usize,
    /// True if the result was written to the cache
    pub saved: bool,
}

impl CompositeOutcome {
    pub fn has_contribution(&self) -> bool {
        self.contributed > 0
    }
}

/// Inclusive destination pixel rectangle touched by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelWindow {
    sx: usize,
    ex: usize,
    sy: usize,
    ey: usize,
}

impl PixelWindow {
    fn locate(source: &GeoExtent, dest: &GeoExtent, width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        let xres = dest.lon_span() / width as f64;
        let yres = dest.lat_span() / height as f64;
        let last_x = (width - 1) as f64;
        let last_y = (height - 1) as f64;

        let sy = floor_degree((dest.north - source.north) / yres).max(0.0);
        let ey = floor_degree((dest.north - source.south) / yres).min(last_y);
        let sx = floor_degree((source.west - dest.west) / xres).max(0.0);
        let ex = floor_degree((source.east - dest.west) / xres).min(last_x);

        if sx > ex || sy > ey {
            return None;
        }
        Some(Self {
            sx: sx as usize,
            ex: ex as usize,
            sy: sy as usize,
            ey: ey as usize,
        })
    }
}

/// Resamples `sources` into `dest`.
///
/// When `from_scratch` is false and the destination file exists, its current
/// pixels seed the result and the destination is left `Opened`; otherwise the
/// destination is filled with its content's no-coverage value. Sources that
/// fail to load are logged and skipped. Every source is released before
/// returning.
///
/// The destination becomes `Loaded` only if at least one source contributed.
pub fn build_from_tiles(
    dest: &mut Tile,
    sources: &mut [Tile],
    from_scratch: bool,
) -> CompositeOutcome {
    let mut outcome = CompositeOutcome {
        candidates: sources.len(),
        ..Default::default()
    };

    seed_destination(dest, from_scratch);

    let dest_extent = *dest.extent();
    for source in sources.iter_mut() {
        let class = contribution(source.extent(), &dest_extent);
        if class == Contribution::None {
            source.release();
            continue;
        }

        if let Err(e) = source.load() {
            tracing::warn!(
                source = %source.name(),
                dest = %dest.name(),
                error = %e,
                "Skipping source tile"
            );
            outcome.skipped += 1;
            source.release();
            continue;
        }

        if resample(source, dest) {
            outcome.contributed += 1;
        }
        tracing::trace!(
            source = %source.name(),
            dest = %dest.name(),
            contribution = ?class,
            "Composited source tile"
        );
        source.release();
    }

    if outcome.contributed > 0 {
        dest.mark_loaded();
    }

    tracing::debug!(
        dest = %dest.name(),
        candidates = outcome.candidates,
        contributed = outcome.contributed,
        skipped = outcome.skipped,
        "Composite complete"
    );
    outcome
}

fn seed_destination(dest: &mut Tile, from_scratch: bool) {
    if !from_scratch && dest.exists() && dest.state() != TileState::Loaded {
        match dest.seed() {
            Ok(()) => return,
            Err(e) => tracing::warn!(
                dest = %dest.name(),
                error = %e,
                "Cannot seed from existing tile, starting from scratch"
            ),
        }
    }
    if from_scratch || dest.buffer().is_none() {
        dest.fill();
    }
}

/// Copies the loaded `source` into `dest`; returns false if nothing was written.
fn resample(source: &Tile, dest: &mut Tile) -> bool {
    let dest_extent = *dest.extent();
    let (width, height) = (dest.width(), dest.height());
    let Some(window) = PixelWindow::locate(source.extent(), &dest_extent, width, height) else {
        return false;
    };
    let Some(buffer) = dest.buffer_mut() else {
        return false;
    };

    let imagery = matches!(buffer, TileBuffer::Image { .. });
    let xres = dest_extent.lon_span() / width as f64;
    let yres = dest_extent.lat_span() / height as f64;
    let mut written = false;

    for iy in window.sy..=window.ey {
        let lat = dest_extent.north - iy as f64 * yres;
        for ix in window.sx..=window.ex {
            let lon = dest_extent.west + ix as f64 * xres;
            let Some(pixel) = source.map_to_pixel(lon, lat) else {
                continue;
            };
            if imagery {
                if let Some(rgb) = source.sample_image(pixel) {
                    buffer.set_rgb(ix, iy, rgb);
                    written = true;
                }
            } else if let Some(h) = source.sample_elevation(pixel) {
                buffer.set_height(ix, iy, h);
                written = true;
            }
        }
    }
    written
}

/// Builds a cache-level tile from the LOD 0 tiles of its geocells.
///
/// Walks the geocells of the destination extent north-west first and keeps
/// those whose source tile exists. When `save` is set and the result is
/// loaded it is written to the cache; a failed write is logged and the
/// composited pixels are still returned in `dest`.
///
/// # Returns
///
/// The composite outcome; zero candidates means the region has no content.
pub fn build_cache_tile(dest: &mut Tile, save: bool) -> Result<CompositeOutcome, TileError> {
    let content = dest.content().source_variant();
    let context = dest.context().clone();
    let walk = GridWalk::geocells(dest.extent());

    let mut sources = Vec::new();
    for cell in walk.iter() {
        let tile = Tile::new(&context, content, cell.extent(), None)?;
        if tile.exists() {
            sources.push(tile);
        }
    }

    if sources.is_empty() {
        tracing::debug!(dest = %dest.name(), "No source tiles for cache tile");
        return Ok(CompositeOutcome::default());
    }

    let mut outcome = build_from_tiles(dest, &mut sources, false);

    if save && dest.state() == TileState::Loaded {
        match CacheWriter::persist(dest) {
            Ok(()) => outcome.saved = true,
            Err(e) => tracing::warn!(dest = %dest.name(), error = %e, "Failed to write cache tile"),
        }
    }
    Ok(outcome)
}

/// Extent of the CDB tile at `lod` holding the south-west corner of `extent`.
///
/// The latitude span is kept; the west edge is snapped down to the tile
/// width `lon_step / 2^lod` of the extent's latitude band.
pub fn earth_tile_extent(extent: &GeoExtent, lod: i32) -> GeoExtent {
    let step = f64::from(lon_step(extent.south)) / f64::from(tiles_per_geocell(lod.max(0)));
    let west = ((extent.west / step) + DEGREE_EPSILON).floor() * step;
    GeoExtent::new_unchecked(extent.north, extent.south, west + step, west)
}

/// Builds a tile narrower than the CDB tile that contains it.
///
/// Used above 50° latitude, where CDB tiles are wider than requested. The
/// covering tile is composited into `dest` from scratch.
pub fn build_earth_tile(dest: &mut Tile) -> Result<CompositeOutcome, TileError> {
    let content = dest.content().source_variant();
    let extent = earth_tile_extent(dest.extent(), dest.lod());
    let source = Tile::new(dest.context(), content, extent, None)?;

    tracing::debug!(
        dest = %dest.name(),
        source = %source.name(),
        exists = source.exists(),
        "Building earth tile"
    );

    if !source.exists() {
        return Ok(CompositeOutcome::default());
    }
    Ok(build_from_tiles(dest, &mut [source], true))
}
