use geo::{Coord, Intersects as _, Polygon};
use tilepack_tile_utils::Bounds;

use crate::feature::Geometry;

/// Decides whether a geometry should be rendered into the tile with the given bounds.
///
/// Points and polygons are tested against the tile area. Line strings only go through the
/// bounding box test, so a line passing near a tile corner may still be assigned to it and
/// then be removed by clipping.
#[must_use]
pub fn geometry_intersects_tile(geometry: &Geometry, tile: &Bounds) -> bool {
    let Some(bbox) = geometry.bounds() else {
        return false;
    };
    if bbox.right < tile.left
        || bbox.left > tile.right
        || bbox.top < tile.bottom
        || bbox.bottom > tile.top
    {
        return false;
    }

    match geometry {
        Geometry::Point(p) => contains(tile, p.0),
        Geometry::MultiPoint(mp) => mp.iter().any(|p| contains(tile, p.0)),
        Geometry::Polygon(p) => polygon_intersects(p, tile),
        Geometry::MultiPolygon(mp) => mp.iter().any(|p| polygon_intersects(p, tile)),
        Geometry::LineString(_) | Geometry::MultiLineString(_) => true,
    }
}

fn contains(tile: &Bounds, c: Coord) -> bool {
    (tile.left..=tile.right).contains(&c.x) && (tile.bottom..=tile.top).contains(&c.y)
}

fn polygon_intersects(polygon: &Polygon, tile: &Bounds) -> bool {
    let vertex_inside = std::iter::once(polygon.exterior())
        .chain(polygon.interiors())
        .flat_map(|ring| ring.coords())
        .any(|c| contains(tile, *c));
    if vertex_inside {
        return true;
    }

    let corners = [
        Coord { x: tile.left, y: tile.bottom },
        Coord { x: tile.right, y: tile.bottom },
        Coord { x: tile.right, y: tile.top },
        Coord { x: tile.left, y: tile.top },
    ];
    if corners.iter().any(|c| polygon.intersects(c)) {
        return true;
    }

    // the tile is entirely inside the polygon
    let center = Coord {
        x: (tile.left + tile.right) / 2.0,
        y: (tile.bottom + tile.top) / 2.0,
    };
    polygon.intersects(&center)
}
