use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use tilepack_tile_utils::{TileCoord, lng_lat_to_tile_space};

use crate::feature::Geometry;

/// Lines shorter than this, and rings with a smaller area, are removed after projection.
pub const DEGENERATE_THRESHOLD: f64 = 0.5;

/// Projects longitude/latitude degrees into the integer grid of a single tile,
/// with `(0, 0)` at the top left corner and `(extent, extent)` at the bottom right.
#[derive(Debug, Clone, Copy)]
pub struct TileProjector {
    coord: TileCoord,
    extent: f64,
}

impl TileProjector {
    #[must_use]
    pub fn new(coord: TileCoord, extent: u32) -> Self {
        Self {
            coord,
            extent: f64::from(extent),
        }
    }

    #[must_use]
    pub fn project_coord(&self, c: Coord) -> Coord<i32> {
        let (x, y) = lng_lat_to_tile_space(c.x, c.y, self.coord.z);
        Coord {
            x: ((x - f64::from(self.coord.x)) * self.extent).round() as i32,
            y: ((y - f64::from(self.coord.y)) * self.extent).round() as i32,
        }
    }

    /// Projects every coordinate, merging runs of coordinates that land on the same unit.
    #[must_use]
    pub fn project(&self, geometry: &Geometry) -> Geometry<i32> {
        match geometry {
            Geometry::Point(p) => Geometry::Point(Point(self.project_coord(p.0))),
            Geometry::MultiPoint(mp) => Geometry::MultiPoint(MultiPoint(
                mp.iter().map(|p| Point(self.project_coord(p.0))).collect(),
            )),
            Geometry::LineString(ls) => Geometry::LineString(self.project_line(ls)),
            Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
                mls.iter().map(|ls| self.project_line(ls)).collect(),
            )),
            Geometry::Polygon(p) => Geometry::Polygon(self.project_polygon(p)),
            Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(MultiPolygon(
                mp.iter().map(|p| self.project_polygon(p)).collect(),
            )),
        }
    }

    fn project_line(&self, ls: &LineString) -> LineString<i32> {
        let mut coords: Vec<_> = ls.0.iter().map(|c| self.project_coord(*c)).collect();
        coords.dedup();
        LineString(coords)
    }

    fn project_polygon(&self, p: &Polygon) -> Polygon<i32> {
        Polygon::new(
            self.project_line(p.exterior()),
            p.interiors().iter().map(|r| self.project_line(r)).collect(),
        )
    }
}

/// Removes parts too small to be visible, returning `None` if nothing is left.
///
/// A polygon goes away with its exterior ring; small holes are simply dropped.
#[must_use]
pub fn drop_degenerate(geometry: Geometry<i32>) -> Option<Geometry<i32>> {
    match geometry {
        g @ Geometry::Point(_) => Some(g),
        Geometry::MultiPoint(mp) => (!mp.0.is_empty()).then_some(Geometry::MultiPoint(mp)),
        Geometry::LineString(ls) => is_visible_line(&ls).then_some(Geometry::LineString(ls)),
        Geometry::MultiLineString(mls) => {
            let lines: Vec<_> = mls.0.into_iter().filter(is_visible_line).collect();
            (!lines.is_empty()).then(|| Geometry::MultiLineString(MultiLineString(lines)))
        }
        Geometry::Polygon(p) => visible_polygon(p).map(Geometry::Polygon),
        Geometry::MultiPolygon(mp) => {
            let polygons: Vec<_> = mp.0.into_iter().filter_map(visible_polygon).collect();
            (!polygons.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
    }
}

fn is_visible_line(ls: &LineString<i32>) -> bool {
    let length: f64 = ls
        .0
        .windows(2)
        .map(|w| {
            let dx = f64::from(w[1].x - w[0].x);
            let dy = f64::from(w[1].y - w[0].y);
            dx.hypot(dy)
        })
        .sum();
    length >= DEGENERATE_THRESHOLD
}

fn is_visible_ring(ring: &LineString<i32>) -> bool {
    ring.0.len() >= 4 && ring_area(ring).abs() >= DEGENERATE_THRESHOLD
}

fn visible_polygon(p: Polygon<i32>) -> Option<Polygon<i32>> {
    let (exterior, interiors) = p.into_inner();
    if !is_visible_ring(&exterior) {
        return None;
    }
    let interiors = interiors.into_iter().filter(is_visible_ring).collect();
    Some(Polygon::new(exterior, interiors))
}

/// Signed area using the shoelace formula. In tile space, with `y` pointing down,
/// clockwise rings have a positive area.
#[must_use]
pub fn ring_area(ring: &LineString<i32>) -> f64 {
    let twice: i64 = ring
        .0
        .windows(2)
        .map(|w| i64::from(w[0].x) * i64::from(w[1].y) - i64::from(w[1].x) * i64::from(w[0].y))
        .sum();
    twice as f64 / 2.0
}
