//! Hand-off types for decoded tiles.

use image::{Rgba, RgbaImage};
use serde::Serialize;

/// Value marking an elevation post with no data.
pub const NO_DATA_VALUE: f32 = f32::MIN;

/// Which edge row 0 of an image sits on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RowOrder {
    /// Row 0 is the north edge (raster convention)
    NorthUp,
    /// Row 0 is the south edge (texture convention)
    SouthUp,
}

impl RowOrder {
    fn flipped(self) -> Self {
        match self {
            RowOrder::NorthUp => RowOrder::SouthUp,
            RowOrder::SouthUp => RowOrder::NorthUp,
        }
    }
}

/// Pixel-interleaved RGB image.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBuffer {
    pub width: usize,
    pub height: usize,
    /// `width * height * 3` bytes
    pub rgb: Vec<u8>,
    pub row_order: RowOrder,
}

impl ImageBuffer {
    /// Interleaves three byte planes into an image.
    pub fn from_planes(width: usize, height: usize, planes: &[Vec<u8>; 3]) -> Self {
        let mut rgb = Vec::with_capacity(width * height * 3);
        for i in 0..width * height {
            rgb.push(planes[0][i]);
            rgb.push(planes[1][i]);
            rgb.push(planes[2][i]);
        }
        Self {
            width,
            height,
            rgb,
            row_order: RowOrder::NorthUp,
        }
    }

    /// RGB value at `(x, y)` in the current row order.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 3;
        Some([self.rgb[i], self.rgb[i + 1], self.rgb[i + 2]])
    }

    /// Reverses the row order in place.
    pub fn flip_vertical(&mut self) {
        let stride = self.width * 3;
        if stride == 0 {
            return;
        }
        let rows = self.height;
        for y in 0..rows / 2 {
            let (top, bottom) = self.rgb.split_at_mut((rows - 1 - y) * stride);
            top[y * stride..(y + 1) * stride].swap_with_slice(&mut bottom[..stride]);
        }
        self.row_order = self.row_order.flipped();
    }

    /// Opaque RGBA copy with row 0 north, for encoding with the `image` crate.
    pub fn to_rgba_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width as u32, self.height as u32, |x, y| {
            let row = match self.row_order {
                RowOrder::NorthUp => y as usize,
                RowOrder::SouthUp => self.height - 1 - y as usize,
            };
            let [r, g, b] = self.pixel(x as usize, row).unwrap_or([0, 0, 0]);
            Rgba([r, g, b, 255])
        })
    }
}

/// Grid of elevation posts, row 0 at the south edge.
#[derive(Debug, Clone, PartialEq)]
pub struct HeightField {
    pub width: usize,
    pub height: usize,
    pub heights: Vec<f32>,
    pub no_data: f32,
}

impl HeightField {
    /// Builds a field from a north-up plane by reversing its rows.
    pub fn from_north_up(width: usize, height: usize, plane: &[f32]) -> Self {
        let mut heights = Vec::with_capacity(width * height);
        for row in plane.chunks_exact(width.max(1)).rev() {
            heights.extend_from_slice(row);
        }
        Self {
            width,
            height,
            heights,
            no_data: NO_DATA_VALUE,
        }
    }

    /// Post at column `x`, row `y` counted from the south.
    pub fn get(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(self.heights[y * self.width + x])
    }

    /// Smallest and largest posts that carry data.
    pub fn min_max(&self) -> Option<(f32, f32)> {
        self.valid().fold(None, |acc, h| match acc {
            None => Some((h, h)),
            Some((lo, hi)) => Some((lo.min(h), hi.max(h))),
        })
    }

    /// Mean of the posts that carry data.
    pub fn mean(&self) -> Option<f64> {
        let (sum, count) = self
            .valid()
            .fold((0.0f64, 0usize), |(s, n), h| (s + f64::from(h), n + 1));
        (count > 0).then(|| sum / count as f64)
    }

    fn valid(&self) -> impl Iterator<Item = f32> + '_ {
        let no_data = self.no_data;
        self.heights
            .iter()
            .copied()
            .filter(move |h| *h != no_data && h.is_finite())
    }
}
