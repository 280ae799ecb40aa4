use std::io::Read;
use std::path::Path;

use geo::{Coord, LineString, MultiLineString, MultiPoint, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, Value};
use tracing::{debug, warn};

use crate::feature::{Feature, Geometry};
use crate::{TpError, TpResult};

/// Reads GeoJSON features from a file.
///
/// See [`read_features`] for the accepted documents.
pub fn read_features_from_path(path: &Path) -> TpResult<Vec<Feature>> {
    let file = std::fs::File::open(path).map_err(|e| TpError::IoError(e, path.to_path_buf()))?;
    let mut text = String::new();
    std::io::BufReader::new(file)
        .read_to_string(&mut text)
        .map_err(|e| TpError::IoError(e, path.to_path_buf()))?;
    parse_features(&text, &path.display().to_string())
}

/// Reads a `FeatureCollection`, a single `Feature`, or a bare geometry.
///
/// Features without geometry are skipped. Geometry collections and invalid positions
/// fail the whole read.
pub fn read_features(mut reader: impl Read) -> TpResult<Vec<Feature>> {
    let mut text = String::new();
    reader
        .read_to_string(&mut text)
        .map_err(|e| TpError::IoError(e, "<stream>".into()))?;
    parse_features(&text, "<stream>")
}

fn parse_features(text: &str, source: &str) -> TpResult<Vec<Feature>> {
    if text.trim().is_empty() {
        return Err(TpError::InputEmpty);
    }
    let geojson = text
        .parse::<GeoJson>()
        .map_err(|e| TpError::InvalidGeoJson(e, source.to_string()))?;

    let input = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features,
        GeoJson::Feature(f) => vec![f],
        GeoJson::Geometry(g) => vec![geojson::Feature {
            bbox: None,
            geometry: Some(g),
            id: None,
            properties: None,
            foreign_members: None,
        }],
    };

    let total = input.len();
    let mut features = Vec::with_capacity(total);
    for (idx, feature) in input.into_iter().enumerate() {
        let Some(geometry) = feature.geometry else {
            warn!("Skipping feature #{idx} from {source} because it has no geometry");
            continue;
        };
        features.push(Feature {
            id: feature.id.and_then(|id| match id {
                geojson::feature::Id::Number(n) => n.as_u64(),
                geojson::feature::Id::String(_) => None,
            }),
            geometry: convert_geometry(&geometry.value, idx)?,
            properties: feature.properties.unwrap_or_default(),
        });
    }
    debug!("Read {} of {total} features from {source}", features.len());
    Ok(features)
}

fn convert_geometry(value: &Value, idx: usize) -> TpResult<Geometry> {
    Ok(match value {
        Value::Point(p) => Geometry::Point(Point(coord(p, idx)?)),
        Value::MultiPoint(ps) => Geometry::MultiPoint(MultiPoint(
            ps.iter()
                .map(|p| coord(p, idx).map(Point))
                .collect::<TpResult<_>>()?,
        )),
        Value::LineString(ls) => Geometry::LineString(line(ls, idx)?),
        Value::MultiLineString(mls) => Geometry::MultiLineString(MultiLineString(
            mls.iter().map(|ls| line(ls, idx)).collect::<TpResult<_>>()?,
        )),
        Value::Polygon(rings) => Geometry::Polygon(polygon(rings, idx)?),
        Value::MultiPolygon(polys) => Geometry::MultiPolygon(MultiPolygon(
            polys
                .iter()
                .map(|rings| polygon(rings, idx))
                .collect::<TpResult<_>>()?,
        )),
        Value::GeometryCollection(_) => {
            return Err(TpError::UnsupportedGeometry("GeometryCollection".to_string()));
        }
    })
}

fn coord(position: &[f64], idx: usize) -> TpResult<Coord> {
    match position {
        [x, y, ..] if x.is_finite() && y.is_finite() => Ok(Coord { x: *x, y: *y }),
        _ => Err(TpError::InvalidPosition(idx)),
    }
}

fn line(positions: &[Vec<f64>], idx: usize) -> TpResult<LineString> {
    positions
        .iter()
        .map(|p| coord(p, idx))
        .collect::<TpResult<Vec<_>>>()
        .map(LineString)
}

fn polygon(rings: &[Vec<Vec<f64>>], idx: usize) -> TpResult<Polygon> {
    let mut rings = rings.iter().map(|r| line(r, idx));
    let exterior = rings.next().transpose()?.unwrap_or_else(|| LineString(vec![]));
    let interiors = rings.collect::<TpResult<Vec<_>>>()?;
    Ok(Polygon::new(exterior, interiors))
}
