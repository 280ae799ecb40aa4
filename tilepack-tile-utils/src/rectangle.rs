//! Inclusive rectangular ranges of tiles at a single zoom level.

use crate::{Bounds, TileCoord, tile_index};

/// A rectangular region in tile coordinate space, inclusive of both corners.
///
/// ```
/// # use tilepack_tile_utils::TileRect;
/// let rect = TileRect::new(10, 0, 0, 255, 255);
/// assert_eq!(rect.size(), 256 * 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TileRect {
    pub zoom: u8,
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl TileRect {
    /// Creates a rectangle from two corners given in any order.
    #[must_use]
    pub fn new(zoom: u8, x1: u32, y1: u32, x2: u32, y2: u32) -> Self {
        Self {
            zoom,
            min_x: x1.min(x2),
            min_y: y1.min(y2),
            max_x: x1.max(x2),
            max_y: y1.max(y2),
        }
    }

    /// All tiles at `zoom` touched by the bounding box.
    ///
    /// This is a bounding-box cover: tiles inside the box but outside of the
    /// geometry that produced it are included as well.
    ///
    /// ```
    /// # use tilepack_tile_utils::{Bounds, TileRect};
    /// let rect = TileRect::from_bounds(&Bounds::new(-10.0, -10.0, 10.0, 10.0), 1);
    /// assert_eq!(rect.size(), 4);
    /// ```
    #[must_use]
    pub fn from_bounds(bounds: &Bounds, zoom: u8) -> Self {
        let (x1, y1) = tile_index(bounds.left, bounds.top, zoom);
        let (x2, y2) = tile_index(bounds.right, bounds.bottom, zoom);
        Self::new(zoom, x1, y1, x2, y2)
    }

    /// Two rectangles overlap if they share the zoom level and both coordinate ranges intersect.
    #[must_use]
    pub fn is_overlapping(&self, other: &Self) -> bool {
        self.zoom == other.zoom
            && self.min_x <= other.max_x
            && self.max_x >= other.min_x
            && self.min_y <= other.max_y
            && self.max_y >= other.min_y
    }

    #[must_use]
    pub fn contains(&self, coord: TileCoord) -> bool {
        coord.z == self.zoom
            && (self.min_x..=self.max_x).contains(&coord.x)
            && (self.min_y..=self.max_y).contains(&coord.y)
    }

    /// Total number of tiles contained in this rectangle.
    #[must_use]
    pub fn size(&self) -> u64 {
        u64::from(self.max_x - self.min_x + 1) * u64::from(self.max_y - self.min_y + 1)
    }

    /// Iterates over the tiles row by row, top to bottom.
    pub fn iter(&self) -> impl Iterator<Item = TileCoord> + use<> {
        let Self {
            zoom,
            min_x,
            min_y,
            max_x,
            max_y,
        } = *self;
        (min_y..=max_y).flat_map(move |y| (min_x..=max_x).map(move |x| TileCoord { z: zoom, x, y }))
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[test]
    fn size() {
        assert_eq!(1, TileRect::new(0, 0, 0, 0, 0).size());
        assert_eq!(4, TileRect::new(0, 0, 0, 1, 1).size());
        assert_eq!(15, TileRect::new(0, 2, 3, 4, 7).size());
    }

    #[test]
    fn corners_are_normalized() {
        assert_eq!(TileRect::new(3, 5, 1, 2, 6), TileRect::new(3, 2, 1, 5, 6));
        assert_eq!(TileRect::new(3, 5, 6, 2, 1).size(), 4 * 6);
    }

    #[test]
    fn overlapping() {
        let center = TileRect::new(0, 4, 4, 6, 6);

        assert!(center.is_overlapping(&TileRect::new(0, 3, 5, 5, 5)));
        assert!(center.is_overlapping(&TileRect::new(0, 5, 3, 5, 5)));
        assert!(center.is_overlapping(&TileRect::new(0, 5, 5, 7, 5)));
        assert!(center.is_overlapping(&TileRect::new(0, 5, 5, 5, 7)));

        assert!(!center.is_overlapping(&TileRect::new(0, 3, 5, 3, 5)));
        assert!(!center.is_overlapping(&TileRect::new(0, 5, 7, 5, 7)));
        assert!(!center.is_overlapping(&TileRect::new(1, 5, 5, 5, 5)));
    }

    #[test]
    fn iterates_every_tile_once() {
        let rect = TileRect::new(2, 1, 2, 2, 3);
        let tiles: Vec<_> = rect.iter().map(|c| (c.x, c.y)).collect();
        assert_eq!(tiles, vec![(1, 2), (2, 2), (1, 3), (2, 3)]);
        assert!(rect.iter().all(|c| rect.contains(c)));
        assert!(!rect.contains(TileCoord { z: 2, x: 0, y: 2 }));
    }

    #[rstest]
    #[case(Bounds::new(10.0, 10.0, 10.0, 10.0), 0, TileRect::new(0, 0, 0, 0, 0))]
    #[case(Bounds::new(10.0, 10.0, 10.0, 10.0), 1, TileRect::new(1, 1, 0, 1, 0))]
    #[case(Bounds::new(-10.0, -10.0, 10.0, 10.0), 1, TileRect::new(1, 0, 0, 1, 1))]
    #[case(Bounds::new(-1e-6, -1e-6, 80.0, 60.0), 2, TileRect::new(2, 1, 1, 2, 2))]
    #[case(Bounds::new(-180.0, -90.0, 180.0, 90.0), 3, TileRect::new(3, 0, 0, 7, 7))]
    fn rect_from_bounds(#[case] bounds: Bounds, #[case] zoom: u8, #[case] expected: TileRect) {
        assert_eq!(TileRect::from_bounds(&bounds, zoom), expected);
    }
}
