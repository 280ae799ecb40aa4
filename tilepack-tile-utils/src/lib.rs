#![doc = "Tile coordinate math, Hilbert tile ids and compression helpers shared by the tilepack archive builder and its readers."]
#![forbid(unsafe_code)]

use std::f64::consts::PI;
use std::fmt::{Display, Formatter};

mod compression;
pub use compression::{Compression, ParseCompressionError, decode_gzip, encode_gzip};

mod hilbert;
pub use hilbert::{TileId, zoom_base_id};

mod rectangle;
pub use rectangle::TileRect;

pub use tilejson::Bounds;

/// Highest zoom level an archive may address.
pub const MAX_ZOOM: u8 = 22;

/// Latitude limit of the Web-Mercator projection, in degrees.
pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TileCoordError {
    #[error("Zoom level {0} is larger than the maximum supported zoom {MAX_ZOOM}")]
    InvalidZoom(u8),

    #[error("Tile {0} is outside of the tile grid for its zoom level")]
    OutOfGrid(String),

    #[error("Tile id {0} is beyond the largest id of zoom {MAX_ZOOM}")]
    InvalidTileId(u64),
}

/// A tile address in the XYZ ("slippy map") scheme, with `y = 0` at the top.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// Creates a tile coordinate, making sure it lies on the grid of its zoom level.
    pub fn new(z: u8, x: u32, y: u32) -> Result<Self, TileCoordError> {
        if z > MAX_ZOOM {
            return Err(TileCoordError::InvalidZoom(z));
        }
        if !Self::is_on_grid(z, x, y) {
            return Err(TileCoordError::OutOfGrid(format!("{z}/{x}/{y}")));
        }
        Ok(Self { z, x, y })
    }

    /// Checks that `x` and `y` are both below `2^z`.
    #[must_use]
    pub fn is_on_grid(z: u8, x: u32, y: u32) -> bool {
        let side = 1_u64 << z;
        u64::from(x) < side && u64::from(y) < side
    }

    /// Geographic bounds of this tile, in degrees.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        tile_bounds(*self)
    }
}

impl Display for TileCoord {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        if f.alternate() {
            write!(f, "{}/{}/{}", self.z, self.x, self.y)
        } else {
            write!(f, "{},{},{}", self.z, self.x, self.y)
        }
    }
}

/// Number of tiles along one side of the grid at `zoom`.
///
/// Defined for every `u8`, although only zooms up to [`MAX_ZOOM`] address real tiles.
#[must_use]
pub fn tiles_per_side(zoom: u8) -> f64 {
    2_f64.powi(i32::from(zoom))
}

/// Fractional Web-Mercator position of a longitude/latitude pair,
/// scaled so that the whole world spans `0.0..tiles_per_side(zoom)` on both axes.
#[must_use]
pub fn lng_lat_to_tile_space(lon: f64, lat: f64, zoom: u8) -> (f64, f64) {
    let n = tiles_per_side(zoom);
    let lat = lat.clamp(-MAX_LATITUDE, MAX_LATITUDE);
    let x = (lon + 180.0) / 360.0 * n;
    let y = (1.0 - lat.to_radians().tan().asinh() / PI) / 2.0 * n;
    (x, y)
}

/// Index of the tile containing the given longitude/latitude at `zoom`.
///
/// Positions outside of the projection are clamped to the edge tiles.
/// Above zoom 32 the indexes saturate at `u32::MAX`.
#[must_use]
pub fn tile_index(lon: f64, lat: f64, zoom: u8) -> (u32, u32) {
    let max = tiles_per_side(zoom) - 1.0;
    let (x, y) = lng_lat_to_tile_space(lon, lat, zoom);
    (x.floor().clamp(0.0, max) as u32, y.floor().clamp(0.0, max) as u32)
}

/// Geographic bounds of a tile.
#[must_use]
pub fn tile_bounds(coord: TileCoord) -> Bounds {
    let n = tiles_per_side(coord.z);
    let lon = |x: f64| x / n * 360.0 - 180.0;
    let lat = |y: f64| (PI * (1.0 - 2.0 * y / n)).sinh().atan().to_degrees();
    let x = f64::from(coord.x);
    let y = f64::from(coord.y);
    Bounds::new(lon(x), lat(y + 1.0), lon(x + 1.0), lat(y))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(0, 1.0)]
    #[case(1, 2.0)]
    #[case(MAX_ZOOM, 4_194_304.0)]
    #[case(32, 4_294_967_296.0)]
    #[case(u8::MAX, 2_f64.powi(255))]
    fn grid_side(#[case] zoom: u8, #[case] expected: f64) {
        assert_eq!(tiles_per_side(zoom), expected);
    }

    #[test]
    fn zoom_beyond_grid_does_not_overflow() {
        assert_eq!(tile_index(180.0, -90.0, 40), (u32::MAX, u32::MAX));
        assert_eq!(tile_index(-180.0, 90.0, 40), (0, 0));
        let (x, y) = lng_lat_to_tile_space(0.0, 0.0, 64);
        assert_eq!((x, y), (2_f64.powi(63), 2_f64.powi(63)));
    }

    #[test]
    fn coord_display() {
        let coord = TileCoord::new(3, 2, 5).unwrap();
        assert_eq!(coord.to_string(), "3,2,5");
        assert_eq!(format!("{coord:#}"), "3/2/5");
    }

    #[test]
    fn coord_validation() {
        assert!(TileCoord::new(0, 0, 0).is_ok());
        assert!(TileCoord::new(1, 1, 1).is_ok());
        assert_eq!(
            TileCoord::new(1, 2, 0),
            Err(TileCoordError::OutOfGrid("1/2/0".to_string()))
        );
        assert_eq!(
            TileCoord::new(23, 0, 0),
            Err(TileCoordError::InvalidZoom(23))
        );
    }

    #[rstest]
    #[case(0.0, 0.0, 0, (0, 0))]
    #[case(10.0, 10.0, 0, (0, 0))]
    #[case(-0.1, 0.1, 1, (0, 0))]
    #[case(0.1, -0.1, 1, (1, 1))]
    #[case(180.0, -90.0, 2, (3, 3))]
    #[case(-180.0, 90.0, 2, (0, 0))]
    #[case(45.0, 45.0, 2, (2, 1))]
    fn lng_lat_tile_index(
        #[case] lon: f64,
        #[case] lat: f64,
        #[case] zoom: u8,
        #[case] expected: (u32, u32),
    ) {
        assert_eq!(tile_index(lon, lat, zoom), expected);
    }

    #[test]
    fn world_tile_bounds() {
        let b = tile_bounds(TileCoord { z: 0, x: 0, y: 0 });
        assert_relative_eq!(b.left, -180.0);
        assert_relative_eq!(b.right, 180.0);
        assert_relative_eq!(b.top, MAX_LATITUDE, epsilon = 1e-9);
        assert_relative_eq!(b.bottom, -MAX_LATITUDE, epsilon = 1e-9);
    }

    #[test]
    fn quadrant_tile_bounds() {
        let b = tile_bounds(TileCoord { z: 1, x: 1, y: 0 });
        assert_relative_eq!(b.left, 0.0);
        assert_relative_eq!(b.right, 180.0);
        assert_relative_eq!(b.bottom, 0.0, epsilon = 1e-9);
        assert_relative_eq!(b.top, MAX_LATITUDE, epsilon = 1e-9);
    }

    #[test]
    fn tile_bounds_contain_their_index() {
        for (lon, lat) in [(10.0, 10.0), (-73.98, 40.75), (151.2, -33.86)] {
            for zoom in 0..=MAX_ZOOM {
                let (x, y) = tile_index(lon, lat, zoom);
                let b = TileCoord { z: zoom, x, y }.bounds();
                assert!(b.left <= lon && lon <= b.right, "{lon} at z{zoom}");
                assert!(b.bottom <= lat && lat <= b.top, "{lat} at z{zoom}");
            }
        }
    }
}
