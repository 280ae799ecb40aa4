//! Clipping of geographic geometries to a tile's bounding box.
//!
//! Every coordinate produced here lies within the bounds, so clipping a clipped
//! geometry again leaves it unchanged.

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Polygon};
use tilepack_tile_utils::Bounds;

use crate::feature::Geometry;

/// Clips a geometry to `bounds`, returning `None` if nothing remains.
///
/// A line string leaving and re-entering the bounds becomes a multi line string.
#[must_use]
pub fn clip_geometry(geometry: Geometry, bounds: &Bounds) -> Option<Geometry> {
    match geometry {
        Geometry::Point(p) => contains(bounds, p.0).then_some(Geometry::Point(p)),
        Geometry::MultiPoint(mp) => {
            let points: Vec<_> = mp.0.into_iter().filter(|p| contains(bounds, p.0)).collect();
            (!points.is_empty()).then(|| Geometry::MultiPoint(MultiPoint(points)))
        }
        Geometry::LineString(ls) => {
            let mut parts = clip_line(&ls, bounds);
            match parts.len() {
                0 => None,
                1 => parts.pop().map(Geometry::LineString),
                _ => Some(Geometry::MultiLineString(MultiLineString(parts))),
            }
        }
        Geometry::MultiLineString(mls) => {
            let parts: Vec<_> = mls.iter().flat_map(|ls| clip_line(ls, bounds)).collect();
            (!parts.is_empty()).then(|| Geometry::MultiLineString(MultiLineString(parts)))
        }
        Geometry::Polygon(p) => clip_polygon(&p, bounds).map(Geometry::Polygon),
        Geometry::MultiPolygon(mp) => {
            let polygons: Vec<_> = mp.iter().filter_map(|p| clip_polygon(p, bounds)).collect();
            (!polygons.is_empty()).then(|| Geometry::MultiPolygon(MultiPolygon(polygons)))
        }
    }
}

fn contains(b: &Bounds, c: Coord) -> bool {
    (b.left..=b.right).contains(&c.x) && (b.bottom..=b.top).contains(&c.y)
}

fn clamp(b: &Bounds, c: Coord) -> Coord {
    Coord {
        x: c.x.clamp(b.left, b.right),
        y: c.y.clamp(b.bottom, b.top),
    }
}

/// Splits a line string into the parts lying inside the bounds.
fn clip_line(ls: &LineString, b: &Bounds) -> Vec<LineString> {
    let mut parts = Vec::new();
    let mut current: Vec<Coord> = Vec::new();
    for segment in ls.0.windows(2) {
        let Some((start, end)) = clip_segment(segment[0], segment[1], b) else {
            continue;
        };
        if start == end {
            continue;
        }
        if current.last() != Some(&start) {
            if current.len() >= 2 {
                parts.push(LineString(std::mem::take(&mut current)));
            }
            current.clear();
            current.push(start);
        }
        current.push(end);
    }
    if current.len() >= 2 {
        parts.push(LineString(current));
    }
    parts
}

/// Liang-Barsky clipping of a single segment.
fn clip_segment(p0: Coord, p1: Coord, b: &Bounds) -> Option<(Coord, Coord)> {
    let dx = p1.x - p0.x;
    let dy = p1.y - p0.y;
    let (mut t0, mut t1) = (0.0_f64, 1.0_f64);
    let (mut enter, mut exit) = (None, None);
    for (p, q, edge) in [
        (-dx, p0.x - b.left, Edge::Left(b.left)),
        (dx, b.right - p0.x, Edge::Right(b.right)),
        (-dy, p0.y - b.bottom, Edge::Bottom(b.bottom)),
        (dy, b.top - p0.y, Edge::Top(b.top)),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else if p < 0.0 {
            let r = q / p;
            if r > t0 {
                t0 = r;
                enter = Some(edge);
            }
        } else {
            let r = q / p;
            if r < t1 {
                t1 = r;
                exit = Some(edge);
            }
        }
    }
    if t0 > t1 {
        return None;
    }
    // endpoints inside the bounds are kept bit-exact, crossings land exactly on the edge
    let at = |t: f64, edge: Edge| {
        clamp(
            b,
            edge.snap(Coord {
                x: p0.x + t * dx,
                y: p0.y + t * dy,
            }),
        )
    };
    let start = enter.map_or(p0, |edge| at(t0, edge));
    let end = exit.map_or(p1, |edge| at(t1, edge));
    Some((start, end))
}

#[derive(Clone, Copy)]
enum Edge {
    Left(f64),
    Right(f64),
    Bottom(f64),
    Top(f64),
}

impl Edge {
    fn inside(self, c: Coord) -> bool {
        match self {
            Self::Left(v) => c.x >= v,
            Self::Right(v) => c.x <= v,
            Self::Bottom(v) => c.y >= v,
            Self::Top(v) => c.y <= v,
        }
    }

    fn snap(self, c: Coord) -> Coord {
        match self {
            Self::Left(v) | Self::Right(v) => Coord { x: v, y: c.y },
            Self::Bottom(v) | Self::Top(v) => Coord { x: c.x, y: v },
        }
    }

    fn intersect(self, a: Coord, b: Coord) -> Coord {
        match self {
            Self::Left(v) | Self::Right(v) => {
                let t = (v - a.x) / (b.x - a.x);
                Coord {
                    x: v,
                    y: a.y + t * (b.y - a.y),
                }
            }
            Self::Bottom(v) | Self::Top(v) => {
                let t = (v - a.y) / (b.y - a.y);
                Coord {
                    x: a.x + t * (b.x - a.x),
                    y: v,
                }
            }
        }
    }
}

/// Sutherland-Hodgman clipping of a polygon, dropping it if the exterior collapses.
fn clip_polygon(polygon: &Polygon, b: &Bounds) -> Option<Polygon> {
    let exterior = clip_ring(polygon.exterior(), b)?;
    let interiors = polygon
        .interiors()
        .iter()
        .filter_map(|ring| clip_ring(ring, b))
        .collect();
    Some(Polygon::new(exterior, interiors))
}

fn clip_ring(ring: &LineString, b: &Bounds) -> Option<LineString> {
    let mut coords = ring.0.clone();
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    let edges = [
        Edge::Left(b.left),
        Edge::Right(b.right),
        Edge::Bottom(b.bottom),
        Edge::Top(b.top),
    ];
    for edge in edges {
        if coords.is_empty() {
            break;
        }
        let mut output = Vec::with_capacity(coords.len() + 4);
        let mut prev = coords[coords.len() - 1];
        for &cur in &coords {
            match (edge.inside(prev), edge.inside(cur)) {
                (true, true) => output.push(cur),
                (true, false) => output.push(clamp(b, edge.intersect(prev, cur))),
                (false, true) => {
                    output.push(clamp(b, edge.intersect(prev, cur)));
                    output.push(cur);
                }
                (false, false) => {}
            }
            prev = cur;
        }
        output.dedup();
        coords = output;
    }
    if coords.len() > 1 && coords.first() == coords.last() {
        coords.pop();
    }
    if coords.len() < 3 {
        return None;
    }
    coords.push(coords[0]);
    Some(LineString(coords))
}
