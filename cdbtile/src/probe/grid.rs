//! Lazy walk over geocell grids.
//!
//! Both the region prober and the cache-tile builder visit a rectangle of
//! geocells row by row, starting at the north-west cell. [`GridWalk`] is the
//! single description of such a rectangle; [`GridWalk::iter`] can be called
//! any number of times to restart the walk.

use crate::coord::{floor_degree, lon_step, snap_to_step, BaseCell, GeoExtent, DEGREE_EPSILON};

/// Deepest cache level a uniform walk expands; 2^8 degrees spans the globe.
pub const MAX_GRID_LOD: u32 = 8;

/// One cell visited by a [`GridWalk`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridCell {
    /// South-west corner of the cell
    pub cell: BaseCell,
    /// Longitude width of the cell in degrees
    pub lon_step: u32,
    /// Row index, 0 at the northern edge of the walk
    pub row: u32,
    /// Column index within the row, 0 at the western edge
    pub col: u32,
}

impl GridCell {
    /// Geographic extent covered by this cell.
    pub fn extent(&self) -> GeoExtent {
        GeoExtent::from_corner(
            f64::from(self.cell.lat),
            f64::from(self.cell.lon),
            1.0,
            f64::from(self.lon_step),
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Shape {
    /// Square block of one-degree cells
    Uniform { origin: BaseCell, size: u32 },
    /// Geocells covering an extent, with latitude-dependent width
    Geocells { extent: GeoExtent, top: i32, rows: u32 },
}

/// A finite, restartable, row-major walk over a grid of geocells.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridWalk {
    shape: Shape,
}

impl GridWalk {
    /// Square grid of `size` × `size` one-degree cells whose south-west cell is `origin`.
    pub fn uniform(origin: BaseCell, size: u32) -> Self {
        Self {
            shape: Shape::Uniform { origin, size },
        }
    }

    /// The `2^|lod|` square grid of one-degree cells addressed by a cache level.
    ///
    /// Non-negative levels cover a single cell. Levels below
    /// `-MAX_GRID_LOD` are clamped to it.
    pub fn for_lod(lod: i32, origin: BaseCell) -> Self {
        let size = if lod < 0 {
            1u32 << lod.unsigned_abs().min(MAX_GRID_LOD)
        } else {
            1
        };
        Self::uniform(origin, size)
    }

    /// All geocells intersecting `extent`, each as wide as the longitude step of its row.
    ///
    /// Rows are aligned to whole degrees and columns to multiples of the row's step.
    pub fn geocells(extent: &GeoExtent) -> Self {
        let mut top = floor_degree(extent.north);
        if (extent.north - top).abs() < DEGREE_EPSILON {
            top -= 1.0;
        }
        let bottom = floor_degree(extent.south);
        let rows = if top >= bottom {
            (top - bottom) as u32 + 1
        } else {
            0
        };

        Self {
            shape: Shape::Geocells {
                extent: *extent,
                top: top as i32,
                rows,
            },
        }
    }

    /// Number of rows in the walk.
    pub fn rows(&self) -> u32 {
        match self.shape {
            Shape::Uniform { size, .. } => size,
            Shape::Geocells { rows, .. } => rows,
        }
    }

    /// Starts a new pass over the grid.
    pub fn iter(&self) -> GridCells {
        GridCells {
            walk: *self,
            row: 0,
            col: 0,
        }
    }

    /// Latitude, first longitude and step of a row.
    fn row_origin(&self, row: u32) -> (i32, i32, u32) {
        match self.shape {
            Shape::Uniform { origin, size } => {
                (origin.lat + (size - 1 - row) as i32, origin.lon, 1)
            }
            Shape::Geocells { extent, top, .. } => {
                let lat = top - row as i32;
                let step = lon_step(f64::from(lat));
                (lat, snap_to_step(extent.west, step) as i32, step)
            }
        }
    }

    fn column_in_row(&self, col: u32, lon: i32) -> bool {
        match self.shape {
            Shape::Uniform { size, .. } => col < size,
            Shape::Geocells { extent, .. } => f64::from(lon) < extent.east - DEGREE_EPSILON,
        }
    }
}

impl<'a> IntoIterator for &'a GridWalk {
    type Item = GridCell;
    type IntoIter = GridCells;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterator over the cells of a [`GridWalk`].
#[derive(Debug, Clone)]
pub struct GridCells {
    walk: GridWalk,
    row: u32,
    col: u32,
}

impl Iterator for GridCells {
    type Item = GridCell;

    fn next(&mut self) -> Option<Self::Item> {
        while self.row < self.walk.rows() {
            let (lat, first_lon, step) = self.walk.row_origin(self.row);
            let lon = first_lon + (self.col * step) as i32;

            if self.walk.column_in_row(self.col, lon) {
                let cell = GridCell {
                    cell: BaseCell::new(lat, lon),
                    lon_step: step,
                    row: self.row,
                    col: self.col,
                };
                self.col += 1;
                return Some(cell);
            }

            self.row += 1;
            self.col = 0;
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uniform_walk_starts_north_west() {
        let walk = GridWalk::uniform(BaseCell::new(10, 20), 2);
        let cells: Vec<BaseCell> = walk.iter().map(|c| c.cell).collect();

        assert_eq!(
            cells,
            vec![
                BaseCell::new(11, 20),
                BaseCell::new(11, 21),
                BaseCell::new(10, 20),
                BaseCell::new(10, 21),
            ]
        );
    }

    #[test]
    fn test_for_lod_sizes() {
        let origin = BaseCell::new(-90, -180);
        assert_eq!(GridWalk::for_lod(-5, origin).iter().count(), 1024);
        assert_eq!(GridWalk::for_lod(-1, origin).iter().count(), 4);
        assert_eq!(GridWalk::for_lod(0, origin).iter().count(), 1);
    }

    #[test]
    fn test_for_lod_clamps_deep_levels() {
        let origin = BaseCell::new(-90, -180);
        for lod in [-9, -31, -32, i32::MIN] {
            let walk = GridWalk::for_lod(lod, origin);
            assert_eq!(walk.rows(), 1 << MAX_GRID_LOD);
            let first = walk.iter().next().unwrap();
            assert_eq!(first.cell, BaseCell::new(-90 + 255, -180));
        }
    }

    #[test]
    fn test_walk_is_restartable() {
        let walk = GridWalk::for_lod(-2, BaseCell::new(0, 0));
        let first: Vec<GridCell> = walk.iter().collect();
        let second: Vec<GridCell> = (&walk).into_iter().collect();
        assert_eq!(first, second);
        assert_eq!(first.len(), 16);
    }

    #[test]
    fn test_row_and_column_indices() {
        let walk = GridWalk::uniform(BaseCell::new(0, 0), 3);
        let last = walk.iter().last().unwrap();
        assert_eq!((last.row, last.col), (2, 2));
        assert_eq!(last.cell, BaseCell::new(0, 2));
    }

    #[test]
    fn test_geocells_equatorial() {
        let extent = GeoExtent::new(2.0, 0.0, 2.0, 0.0).unwrap();
        let cells: Vec<GridCell> = GridWalk::geocells(&extent).iter().collect();

        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].cell, BaseCell::new(1, 0));
        assert!(cells.iter().all(|c| c.lon_step == 1));
    }

    #[test]
    fn test_geocells_use_row_step() {
        // 48..52N spans the 50 degree breakpoint
        let extent = GeoExtent::new(52.0, 48.0, 4.0, 0.0).unwrap();
        let cells: Vec<GridCell> = GridWalk::geocells(&extent).iter().collect();

        let row_51: Vec<i32> = cells
            .iter()
            .filter(|c| c.cell.lat == 51)
            .map(|c| c.cell.lon)
            .collect();
        let row_48: Vec<i32> = cells
            .iter()
            .filter(|c| c.cell.lat == 48)
            .map(|c| c.cell.lon)
            .collect();

        assert_eq!(row_51, vec![0, 2]);
        assert_eq!(row_48, vec![0, 1, 2, 3]);
        assert_eq!(cells.len(), 2 + 2 + 4 + 4);
    }

    #[test]
    fn test_geocells_snap_west_edge() {
        let extent = GeoExtent::new(61.0, 60.0, 4.0, 1.0).unwrap();
        let cells: Vec<GridCell> = GridWalk::geocells(&extent).iter().collect();
        let lons: Vec<i32> = cells.iter().map(|c| c.cell.lon).collect();
        assert_eq!(lons, vec![0, 2]);
        assert_eq!(cells[0].extent(), GeoExtent::new(61.0, 60.0, 2.0, 0.0).unwrap());
    }

    #[test]
    fn test_geocells_fractional_extent() {
        let extent = GeoExtent::new(0.5, 0.25, 0.5, 0.25).unwrap();
        let cells: Vec<GridCell> = GridWalk::geocells(&extent).iter().collect();
        assert_eq!(cells.len(), 1);
        assert_eq!(cells[0].cell, BaseCell::new(0, 0));
    }
}
