//! Bilinear sampling over a tile buffer.
//!
//! The 2×2 neighbourhood is anchored at the floor of the pixel position.
//! Neighbours beyond the last column or row replicate the border.

use super::TileBuffer;

/// Fractional pixel position within a tile, origin at the north-west corner.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelCoord {
    pub x: f64,
    pub y: f64,
}

impl PixelCoord {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

struct Neighbourhood {
    x0: usize,
    y0: usize,
    x1: usize,
    y1: usize,
    fx: f32,
    fy: f32,
}

impl Neighbourhood {
    fn locate(pixel: PixelCoord, width: usize, height: usize) -> Option<Self> {
        if width == 0 || height == 0 || !pixel.x.is_finite() || !pixel.y.is_finite() {
            return None;
        }
        let tx = pixel.x.floor();
        let ty = pixel.y.floor();
        if tx < 0.0 || ty < 0.0 || tx > (width - 1) as f64 || ty > (height - 1) as f64 {
            return None;
        }

        let (x0, y0) = (tx as usize, ty as usize);
        Some(Self {
            x0,
            y0,
            x1: (x0 + 1).min(width - 1),
            y1: (y0 + 1).min(height - 1),
            fx: (pixel.x - tx) as f32,
            fy: (pixel.y - ty) as f32,
        })
    }

    fn blend(&self, p00: f32, p10: f32, p01: f32, p11: f32) -> f32 {
        let top = p00 * (1.0 - self.fx) + p10 * self.fx;
        let bottom = p01 * (1.0 - self.fx) + p11 * self.fx;
        top * (1.0 - self.fy) + bottom * self.fy
    }
}

/// Bilinear RGB sample; `None` outside the raster or for elevation buffers.
pub fn sample_rgb(buffer: &TileBuffer, pixel: PixelCoord) -> Option<[u8; 3]> {
    let planes = buffer.planes()?;
    let width = buffer.width();
    let n = Neighbourhood::locate(pixel, width, buffer.height())?;

    let mut out = [0u8; 3];
    for (value, plane) in out.iter_mut().zip(planes.iter()) {
        let at = |x: usize, y: usize| f32::from(plane[y * width + x]);
        let v = n.blend(at(n.x0, n.y0), at(n.x1, n.y0), at(n.x0, n.y1), at(n.x1, n.y1));
        *value = v.round().clamp(0.0, 255.0) as u8;
    }
    Some(out)
}

/// Bilinear elevation sample; `None` outside the raster or for imagery buffers.
pub fn sample_height(buffer: &TileBuffer, pixel: PixelCoord) -> Option<f32> {
    let heights = buffer.heights()?;
    let width = buffer.width();
    let n = Neighbourhood::locate(pixel, width, buffer.height())?;

    let at = |x: usize, y: usize| heights[y * width + x];
    Some(n.blend(at(n.x0, n.y0), at(n.x1, n.y0), at(n.x0, n.y1), at(n.x1, n.y1)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::address::ContentType;

    fn gradient() -> TileBuffer {
        let mut buffer = TileBuffer::allocate(ContentType::Elevation, 2, 2);
        buffer.set_height(0, 0, 0.0);
        buffer.set_height(1, 0, 10.0);
        buffer.set_height(0, 1, 20.0);
        buffer.set_height(1, 1, 30.0);
        buffer
    }

    #[test]
    fn test_sample_exact_pixel() {
        let buffer = gradient();
        assert_eq!(sample_height(&buffer, PixelCoord::new(1.0, 0.0)), Some(10.0));
        assert_eq!(sample_height(&buffer, PixelCoord::new(0.0, 1.0)), Some(20.0));
    }

    #[test]
    fn test_sample_centre_blends_all_four() {
        let buffer = gradient();
        assert_eq!(sample_height(&buffer, PixelCoord::new(0.5, 0.5)), Some(15.0));
    }

    #[test]
    fn test_last_index_returns_pixel_itself() {
        let buffer = gradient();
        assert_eq!(sample_height(&buffer, PixelCoord::new(1.0, 1.0)), Some(30.0));

        // Past the last index within the final pixel the border is replicated
        assert_eq!(sample_height(&buffer, PixelCoord::new(1.5, 1.5)), Some(30.0));
    }

    #[test]
    fn test_outside_raster() {
        let buffer = gradient();
        assert_eq!(sample_height(&buffer, PixelCoord::new(-0.5, 0.0)), None);
        assert_eq!(sample_height(&buffer, PixelCoord::new(0.0, 2.0)), None);
        assert_eq!(sample_height(&buffer, PixelCoord::new(f64::NAN, 0.0)), None);
    }

    #[test]
    fn test_rgb_rounds_and_keeps_range() {
        let mut buffer = TileBuffer::allocate(ContentType::Imagery, 2, 1);
        buffer.set_rgb(0, 0, [0, 255, 100]);
        buffer.set_rgb(1, 0, [1, 255, 101]);

        assert_eq!(
            sample_rgb(&buffer, PixelCoord::new(0.5, 0.0)),
            Some([1, 255, 101])
        );
        assert_eq!(
            sample_rgb(&buffer, PixelCoord::new(0.25, 0.0)),
            Some([0, 255, 100])
        );
    }

    #[test]
    fn test_wrong_buffer_kind() {
        let image = TileBuffer::allocate(ContentType::Imagery, 2, 2);
        assert_eq!(sample_height(&image, PixelCoord::new(0.0, 0.0)), None);
        assert_eq!(sample_rgb(&gradient(), PixelCoord::new(0.0, 0.0)), None);
    }
}
