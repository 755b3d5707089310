//! Decoded raster storage for a tile.

use crate::address::ContentType;

/// Grey used for imagery with no source coverage.
pub const IMAGERY_FILL: u8 = 127;

/// Decoded pixels, row 0 at the north edge.
///
/// Imagery is held as three separate byte planes (red, green, blue) so each
/// band can be handed to a codec without reshuffling. Elevation is a single
/// `f32` plane.
#[derive(Debug, Clone, PartialEq)]
pub enum TileBuffer {
    Image {
        width: usize,
        height: usize,
        planes: [Vec<u8>; 3],
    },
    Elevation {
        width: usize,
        height: usize,
        heights: Vec<f32>,
    },
}

impl TileBuffer {
    /// Zeroed buffer shaped for `content`.
    pub fn allocate(content: ContentType, width: usize, height: usize) -> Self {
        let len = width * height;
        if content.is_imagery() {
            TileBuffer::Image {
                width,
                height,
                planes: [vec![0; len], vec![0; len], vec![0; len]],
            }
        } else {
            TileBuffer::Elevation {
                width,
                height,
                heights: vec![0.0; len],
            }
        }
    }

    /// Buffer holding the "no coverage" value of `content`.
    ///
    /// Source imagery fills mid-grey, cached imagery black, elevation zero.
    pub fn filled(content: ContentType, width: usize, height: usize) -> Self {
        let mut buffer = Self::allocate(content, width, height);
        if content == ContentType::Imagery {
            if let TileBuffer::Image { planes, .. } = &mut buffer {
                for plane in planes.iter_mut() {
                    plane.fill(IMAGERY_FILL);
                }
            }
        }
        buffer
    }

    pub fn width(&self) -> usize {
        match self {
            TileBuffer::Image { width, .. } | TileBuffer::Elevation { width, .. } => *width,
        }
    }

    pub fn height(&self) -> usize {
        match self {
            TileBuffer::Image { height, .. } | TileBuffer::Elevation { height, .. } => *height,
        }
    }

    /// Red, green and blue planes, if this is imagery.
    pub fn planes(&self) -> Option<&[Vec<u8>; 3]> {
        match self {
            TileBuffer::Image { planes, .. } => Some(planes),
            TileBuffer::Elevation { .. } => None,
        }
    }

    /// Elevation plane, if this is elevation.
    pub fn heights(&self) -> Option<&[f32]> {
        match self {
            TileBuffer::Elevation { heights, .. } => Some(heights),
            TileBuffer::Image { .. } => None,
        }
    }

    /// RGB value at `(x, y)`; `None` for elevation or out of range.
    pub fn rgb(&self, x: usize, y: usize) -> Option<[u8; 3]> {
        match self {
            TileBuffer::Image {
                width,
                height,
                planes,
            } if x < *width && y < *height => {
                let i = y * width + x;
                Some([planes[0][i], planes[1][i], planes[2][i]])
            }
            _ => None,
        }
    }

    /// Elevation at `(x, y)`; `None` for imagery or out of range.
    pub fn height_at(&self, x: usize, y: usize) -> Option<f32> {
        match self {
            TileBuffer::Elevation {
                width,
                height,
                heights,
            } if x < *width && y < *height => Some(heights[y * width + x]),
            _ => None,
        }
    }

    pub(crate) fn set_rgb(&mut self, x: usize, y: usize, rgb: [u8; 3]) {
        if let TileBuffer::Image {
            width,
            height,
            planes,
        } = self
        {
            if x < *width && y < *height {
                let i = y * *width + x;
                planes[0][i] = rgb[0];
                planes[1][i] = rgb[1];
                planes[2][i] = rgb[2];
            }
        }
    }

    pub(crate) fn set_height(&mut self, x: usize, y: usize, value: f32) {
        if let TileBuffer::Elevation {
            width,
            height,
            heights,
        } = self
        {
            if x < *width && y < *height {
                heights[y * *width + x] = value;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_shapes() {
        let image = TileBuffer::allocate(ContentType::ImageryCache, 4, 2);
        let planes = image.planes().unwrap();
        assert!(planes.iter().all(|p| p.len() == 8));
        assert!(image.heights().is_none());

        let elevation = TileBuffer::allocate(ContentType::Elevation, 4, 2);
        assert_eq!(elevation.heights().unwrap().len(), 8);
        assert_eq!((elevation.width(), elevation.height()), (4, 2));
    }

    #[test]
    fn test_fill_values() {
        assert_eq!(
            TileBuffer::filled(ContentType::Imagery, 2, 2).rgb(1, 1),
            Some([127, 127, 127])
        );
        assert_eq!(
            TileBuffer::filled(ContentType::ImageryCache, 2, 2).rgb(0, 0),
            Some([0, 0, 0])
        );
        assert_eq!(
            TileBuffer::filled(ContentType::ElevationCache, 2, 2).height_at(1, 0),
            Some(0.0)
        );
    }

    #[test]
    fn test_set_and_get() {
        let mut image = TileBuffer::allocate(ContentType::Imagery, 3, 3);
        image.set_rgb(2, 1, [1, 2, 3]);
        assert_eq!(image.rgb(2, 1), Some([1, 2, 3]));
        assert_eq!(image.rgb(3, 1), None);

        // Writes outside the raster are ignored
        image.set_rgb(5, 5, [9, 9, 9]);

        let mut elevation = TileBuffer::allocate(ContentType::Elevation, 3, 3);
        elevation.set_height(0, 2, -12.5);
        assert_eq!(elevation.height_at(0, 2), Some(-12.5));
        assert_eq!(elevation.rgb(0, 2), None);
    }
}
