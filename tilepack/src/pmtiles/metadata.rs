use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tilejson::VectorLayer;
use tilepack_tile_utils::Compression;

use crate::config::TileConfig;
use crate::feature::Feature;
use crate::{TpError, TpResult};

/// JSON metadata section of an archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchiveMetadata {
    pub name: String,
    pub format: String,
    /// Compression of the tile payloads.
    pub compression: Compression,
    pub minzoom: u8,
    pub maxzoom: u8,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub vector_layers: Vec<VectorLayer>,
}

impl ArchiveMetadata {
    /// Describes the single layer built from `features` with `config`.
    #[must_use]
    pub fn new(config: &TileConfig, features: &[Feature]) -> Self {
        let mut layer = VectorLayer::new(config.layer.clone(), property_fields(features));
        layer.minzoom = Some(config.min_zoom);
        layer.maxzoom = Some(config.max_zoom);
        Self {
            name: config.layer.clone(),
            format: "pbf".to_string(),
            compression: config.tile_compression,
            minzoom: config.min_zoom,
            maxzoom: config.max_zoom,
            vector_layers: vec![layer],
        }
    }

    pub fn to_bytes(&self, compression: Compression) -> TpResult<Vec<u8>> {
        let json = serde_json::to_vec(self)?;
        compression.compress(&json).map_err(TpError::CompressionError)
    }

    pub fn from_bytes(data: &[u8], compression: Compression) -> TpResult<Self> {
        let json = compression
            .decompress(data)
            .map_err(TpError::CompressionError)?;
        Ok(serde_json::from_slice(&json)?)
    }
}

/// Property names of all features with their vector tile type.
/// When a property changes its type between features, the last one wins.
fn property_fields(features: &[Feature]) -> BTreeMap<String, String> {
    let mut fields = BTreeMap::new();
    for feature in features {
        for (key, value) in &feature.properties {
            if let Some(kind) = property_type(value) {
                fields.insert(key.clone(), kind.to_string());
            }
        }
    }
    fields
}

fn property_type(value: &serde_json::Value) -> Option<&'static str> {
    if value.is_null() {
        return None;
    }
    Some(match value {
        serde_json::Value::Number(n) => {
            if n.is_u64() {
                "unsigned integer"
            } else if n.is_i64() {
                "signed integer"
            } else {
                "double"
            }
        }
        serde_json::Value::Bool(_) => "boolean",
        _ => "string",
    })
}

#[cfg(test)]
mod tests {
    use geo::point;
    use insta::assert_json_snapshot;

    use super::*;
    use crate::feature::Geometry;

    fn features() -> Vec<Feature> {
        let p = || Geometry::Point(point!(x: 0.0, y: 0.0));
        vec![
            Feature::new(p())
                .with_property("name", "a")
                .with_property("population", 12)
                .with_property("nothing", serde_json::Value::Null),
            Feature::new(p())
                .with_property("elevation", -3)
                .with_property("area", 1.5)
                .with_property("capital", true)
                .with_property("tags", serde_json::json!(["x"])),
        ]
    }

    #[test]
    fn metadata_json() {
        let config = TileConfig::new("cities").with_zoom_range(2, 9);
        let meta = ArchiveMetadata::new(&config, &features());
        assert_json_snapshot!(meta, @r#"
        {
          "name": "cities",
          "format": "pbf",
          "compression": "gzip",
          "minzoom": 2,
          "maxzoom": 9,
          "vector_layers": [
            {
              "id": "cities",
              "fields": {
                "area": "double",
                "capital": "boolean",
                "elevation": "signed integer",
                "name": "string",
                "population": "unsigned integer",
                "tags": "string"
              },
              "maxzoom": 9,
              "minzoom": 2
            }
          ]
        }
        "#);
    }

    #[test]
    fn compressed_round_trip() {
        let config = TileConfig::new("cities").with_compression(Compression::None, Compression::Gzip);
        let meta = ArchiveMetadata::new(&config, &features());
        let data = meta.to_bytes(Compression::Gzip).unwrap();
        assert_eq!(&data[..2], &[0x1f, 0x8b]);
        let parsed = ArchiveMetadata::from_bytes(&data, Compression::Gzip).unwrap();
        assert_eq!(parsed, meta);
        assert_eq!(parsed.compression, Compression::None);

        let plain = meta.to_bytes(Compression::None).unwrap();
        assert!(plain.starts_with(br#"{"name":"cities","format":"pbf""#));
    }
}
