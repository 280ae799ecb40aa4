use std::fmt::{Display, Formatter};

use crate::{MAX_ZOOM, TileCoord, TileCoordError};

/// First tile id of `zoom`, equal to the number of tiles on all lower zoom levels.
#[must_use]
pub fn zoom_base_id(zoom: u8) -> u64 {
    ((1_u64 << (2 * u32::from(zoom))) - 1) / 3
}

/// Position of a tile along the zoom-ordered Hilbert curve.
///
/// Ids are dense: zoom 0 has id 0, zoom 1 ids 1..=4, zoom 2 ids 5..=20, and so on.
/// Within a zoom level, neighbouring ids are neighbouring tiles.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileId(u64);

impl TileId {
    /// Wraps a raw id, rejecting ids beyond the last tile of [`MAX_ZOOM`].
    pub fn new(value: u64) -> Result<Self, TileCoordError> {
        if value >= zoom_base_id(MAX_ZOOM + 1) {
            return Err(TileCoordError::InvalidTileId(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    /// Tile coordinate this id refers to.
    #[must_use]
    pub fn coord(self) -> TileCoord {
        let mut z = 0;
        while z < MAX_ZOOM && zoom_base_id(z + 1) <= self.0 {
            z += 1;
        }
        let mut d = self.0 - zoom_base_id(z);
        let n = 1_u64 << z;
        let (mut x, mut y) = (0_u64, 0_u64);
        let mut s = 1_u64;
        while s < n {
            let rx = 1 & (d / 2);
            let ry = 1 & (d ^ rx);
            rotate(s, &mut x, &mut y, rx, ry);
            x += s * rx;
            y += s * ry;
            d /= 4;
            s *= 2;
        }
        TileCoord {
            z,
            x: x as u32,
            y: y as u32,
        }
    }
}

impl From<TileCoord> for TileId {
    fn from(coord: TileCoord) -> Self {
        let z = u32::from(coord.z);
        let n = 1_u64 << z;
        let (mut x, mut y) = (u64::from(coord.x), u64::from(coord.y));
        let mut acc = zoom_base_id(coord.z);
        for k in (0..z).rev() {
            let rx = (x >> k) & 1;
            let ry = (y >> k) & 1;
            acc += ((3 * rx) ^ ry) << (2 * k);
            if ry == 0 {
                if rx == 1 {
                    x = n - 1 - x;
                    y = n - 1 - y;
                }
                std::mem::swap(&mut x, &mut y);
            }
        }
        Self(acc)
    }
}

impl From<TileId> for u64 {
    fn from(id: TileId) -> Self {
        id.0
    }
}

impl Display for TileId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn rotate(s: u64, x: &mut u64, y: &mut u64, rx: u64, ry: u64) {
    if ry == 0 {
        if rx == 1 {
            *x = s - 1 - *x;
            *y = s - 1 - *y;
        }
        std::mem::swap(x, y);
    }
}
