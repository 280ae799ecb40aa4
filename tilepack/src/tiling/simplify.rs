use geo::{LineString, MultiLineString, Simplify as _};

use crate::feature::Geometry;

/// Douglas-Peucker tolerance in degrees for a zoom level.
///
/// Geometries are left untouched from zoom 14 on.
#[must_use]
pub fn simplify_epsilon(zoom: u8) -> f64 {
    match zoom {
        14.. => 0.0,
        10..=13 => 0.000_01,
        6..=9 => 0.000_1,
        4..=5 => 0.000_5,
        _ => 0.001,
    }
}

/// Simplifies lines and polygons with the tolerance of `zoom`. Points pass through.
#[must_use]
pub fn simplify_geometry(geometry: Geometry, zoom: u8) -> Geometry {
    let epsilon = simplify_epsilon(zoom);
    if epsilon <= 0.0 {
        return geometry;
    }
    match geometry {
        g @ (Geometry::Point(_) | Geometry::MultiPoint(_)) => g,
        Geometry::LineString(ls) => Geometry::LineString(simplify_line(ls, epsilon)),
        Geometry::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.0
                .into_iter()
                .map(|ls| simplify_line(ls, epsilon))
                .collect(),
        )),
        Geometry::Polygon(p) => Geometry::Polygon(p.simplify(&epsilon)),
        Geometry::MultiPolygon(mp) => Geometry::MultiPolygon(mp.simplify(&epsilon)),
    }
}

// too short to simplify, degenerate lines are removed after projection
fn simplify_line(ls: LineString, epsilon: f64) -> LineString {
    if ls.0.len() < 3 {
        ls
    } else {
        ls.simplify(&epsilon)
    }
}
