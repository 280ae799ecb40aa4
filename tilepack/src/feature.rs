//! Features flowing through the tiling pipeline.
//!
//! Coordinates are `f64` longitude/latitude degrees while reading, clipping and simplifying,
//! and `i32` tile-local units once projected into a tile.

use geo::{
    BoundingRect as _, CoordNum, LineString, MultiLineString, MultiPoint, MultiPolygon, Point,
    Polygon, Rect,
};
use tilepack_tile_utils::Bounds;

/// Insertion-ordered property map of a feature.
pub type Properties = serde_json::Map<String, serde_json::Value>;

/// Every geometry kind a feature can carry.
///
/// Geometry collections are rejected while reading, so every consumer can match exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum Geometry<T: CoordNum = f64> {
    Point(Point<T>),
    MultiPoint(MultiPoint<T>),
    LineString(LineString<T>),
    MultiLineString(MultiLineString<T>),
    Polygon(Polygon<T>),
    MultiPolygon(MultiPolygon<T>),
}

impl<T: CoordNum> Geometry<T> {
    /// GeoJSON name of the geometry kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Point(_) => "Point",
            Self::MultiPoint(_) => "MultiPoint",
            Self::LineString(_) => "LineString",
            Self::MultiLineString(_) => "MultiLineString",
            Self::Polygon(_) => "Polygon",
            Self::MultiPolygon(_) => "MultiPolygon",
        }
    }

    /// Smallest rectangle containing every coordinate, `None` for an empty geometry.
    #[must_use]
    pub fn bounding_rect(&self) -> Option<Rect<T>> {
        match self {
            Self::Point(p) => Some(p.bounding_rect()),
            Self::MultiPoint(mp) => mp.bounding_rect(),
            Self::LineString(ls) => ls.bounding_rect(),
            Self::MultiLineString(mls) => mls.bounding_rect(),
            Self::Polygon(p) => p.bounding_rect(),
            Self::MultiPolygon(mp) => mp.bounding_rect(),
        }
    }
}

impl Geometry {
    /// Bounding box in degrees, in the form used by tile math.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        self.bounding_rect().map(|r| {
            let (min, max) = (r.min(), r.max());
            Bounds::new(min.x, min.y, max.x, max.y)
        })
    }
}

/// A geometry with an optional numeric id and its properties.
///
/// `Clone` produces a fully independent copy: each tile works on its own clones, and the
/// features read from the input are never modified.
#[derive(Debug, Clone, PartialEq)]
pub struct Feature<T: CoordNum = f64> {
    pub id: Option<u64>,
    pub geometry: Geometry<T>,
    pub properties: Properties,
}

impl<T: CoordNum> Feature<T> {
    #[must_use]
    pub fn new(geometry: Geometry<T>) -> Self {
        Self {
            id: None,
            geometry,
            properties: Properties::new(),
        }
    }

    #[must_use]
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = Some(id);
        self
    }

    #[must_use]
    pub fn with_property(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(key.into(), value.into());
        self
    }

    /// Replaces the geometry, keeping the id and properties.
    #[must_use]
    pub fn map_geometry<U: CoordNum>(
        self,
        f: impl FnOnce(Geometry<T>) -> Geometry<U>,
    ) -> Feature<U> {
        Feature {
            id: self.id,
            geometry: f(self.geometry),
            properties: self.properties,
        }
    }
}

#[cfg(test)]
mod tests {
    use geo::{coord, line_string, point, polygon};

    use super::*;

    #[test]
    fn bounds_of_each_kind() {
        let p = Geometry::Point(point!(x: 10.0, y: 20.0));
        let b = p.bounds().unwrap();
        assert_eq!((b.left, b.bottom, b.right, b.top), (10.0, 20.0, 10.0, 20.0));

        let ls = Geometry::LineString(line_string![(x: -5.0, y: 1.0), (x: 3.0, y: -2.0)]);
        let b = ls.bounds().unwrap();
        assert_eq!((b.left, b.bottom, b.right, b.top), (-5.0, -2.0, 3.0, 1.0));

        let poly = Geometry::Polygon(polygon![
            (x: 0.0, y: 0.0), (x: 4.0, y: 0.0), (x: 4.0, y: 3.0), (x: 0.0, y: 0.0)
        ]);
        let b = poly.bounds().unwrap();
        assert_eq!((b.left, b.bottom, b.right, b.top), (0.0, 0.0, 4.0, 3.0));

        let empty = Geometry::MultiPoint(MultiPoint::<f64>(vec![]));
        assert!(empty.bounds().is_none());
    }

    #[test]
    fn clones_are_independent() {
        let original = Feature::new(Geometry::LineString(line_string![
            (x: 0.0, y: 0.0),
            (x: 1.0, y: 1.0)
        ]))
        .with_property("name", "a");

        let mut copy = original.clone();
        if let Geometry::LineString(ls) = &mut copy.geometry {
            ls.0[0] = coord! { x: 9.0, y: 9.0 };
        }
        copy.properties.insert("name".to_string(), "b".into());

        assert_eq!(
            original.geometry,
            Geometry::LineString(line_string![(x: 0.0, y: 0.0), (x: 1.0, y: 1.0)])
        );
        assert_eq!(original.properties["name"], "a");
    }

    #[test]
    fn map_geometry_keeps_attributes() {
        let feature = Feature::new(Geometry::Point(point!(x: 1.5, y: 2.5)))
            .with_id(7)
            .with_property("kind", "shop");
        let mapped = feature.map_geometry(|g| match g {
            Geometry::Point(p) => Geometry::Point(Point::new(p.x() as i32, p.y() as i32)),
            other => panic!("unexpected {}", other.kind()),
        });
        assert_eq!(mapped.id, Some(7));
        assert_eq!(mapped.properties["kind"], "shop");
        assert_eq!(mapped.geometry, Geometry::Point(Point::new(1, 2)));
    }
}
