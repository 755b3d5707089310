//! Existence probing for CDB tiles
//!
//! Answers "is there content here?" with filesystem metadata only, so the
//! compositor never allocates buffers for empty regions. A missing file is a
//! normal answer (`Ok(false)`); only other I/O failures are errors.

mod grid;

pub use grid::{GridCell, GridCells, GridWalk, MAX_GRID_LOD};

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::address::{geocell_path, ContentType};
use crate::coord::BaseCell;

/// Errors raised while probing the filesystem.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// The filesystem refused to report on a path
    #[error("Failed to probe {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Tests whether a file exists without opening it.
///
/// # Returns
///
/// `Ok(false)` when the file or any parent directory is missing, `Err` for
/// other I/O failures such as permission errors.
pub fn exists(path: &Path) -> Result<bool, ProbeError> {
    match path.try_exists() {
        Ok(found) => Ok(found),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(source) => Err(ProbeError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// Finds the first geocell of a cache-level region holding base-level content.
///
/// Walks the `2^|lod|` square grid whose south-west cell is `origin`,
/// north-west first, checking each cell's LOD 0 source tile.
///
/// # Returns
///
/// The first cell found, or `None` after the whole grid has been checked.
pub fn find_in_region(
    lod: i32,
    origin: BaseCell,
    content: ContentType,
    root: &Path,
) -> Result<Option<GridCell>, ProbeError> {
    let scan = scan_region(&GridWalk::for_lod(lod, origin), content, root)?;
    match scan.hit {
        Some(cell) => tracing::debug!(
            lod,
            origin = %origin,
            hit = %cell.cell,
            probed = scan.probed,
            "Region has content"
        ),
        None => tracing::debug!(lod, origin = %origin, probed = scan.probed, "Region is empty"),
    }
    Ok(scan.hit)
}

/// Result of walking a region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RegionScan {
    hit: Option<GridCell>,
    /// Cells whose source tile was checked
    probed: usize,
}

fn scan_region(
    walk: &GridWalk,
    content: ContentType,
    root: &Path,
) -> Result<RegionScan, ProbeError> {
    let mut probed = 0usize;
    for cell in walk {
        probed += 1;
        if exists(&geocell_path(root, cell.cell, content))? {
            return Ok(RegionScan {
                hit: Some(cell),
                probed,
            });
        }
    }
    Ok(RegionScan { hit: None, probed })
}

/// Returns true if any geocell of a cache-level region holds base-level content.
///
/// See [`find_in_region`] for the walk order.
pub fn probe_region(
    lod: i32,
    origin: BaseCell,
    content: ContentType,
    root: &Path,
) -> Result<bool, ProbeError> {
    Ok(find_in_region(lod, origin, content, root)?.is_some())
}
