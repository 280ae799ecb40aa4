mod geometry_encoding;

pub use geometry_encoding::encode_geometry;
use geozero::mvt::{Message as _, TagsBuilder, Tile, TileValue, tile};
use tilepack_tile_utils::Compression;

use crate::feature::Feature;

#[derive(thiserror::Error, Debug)]
pub enum EncodeError {
    #[error("A {0} does not have enough coordinates to be encoded")]
    TooFewCoordinates(&'static str),

    #[error("Unable to compress the tile: {0}")]
    Compression(#[source] std::io::Error),
}

/// Accumulates projected features of a single vector tile layer.
pub struct LayerBuilder {
    name: String,
    tag_builder: TagsBuilder<String>,
    features: Vec<tile::Feature>,
    extent: u32,
}

impl LayerBuilder {
    #[must_use]
    pub fn new(name: String, extent: u32) -> Self {
        Self {
            name,
            tag_builder: TagsBuilder::new(),
            features: Vec::new(),
            extent,
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    pub fn add_feature(&mut self, feature: &Feature<i32>) -> Result<(), EncodeError> {
        let (geom_type, geometry) = encode_geometry(&feature.geometry)?;

        let mut tags = Vec::with_capacity(feature.properties.len() * 2);
        for (key, value) in &feature.properties {
            // null has no vector tile representation
            if value.is_null() {
                continue;
            }
            let (key_idx, val_idx) = self
                .tag_builder
                .insert(key.clone(), tilevalue_from_json(value));
            tags.push(key_idx);
            tags.push(val_idx);
        }

        self.features.push(tile::Feature {
            id: feature.id,
            tags,
            r#type: Some(geom_type as i32),
            geometry,
        });
        Ok(())
    }

    #[must_use]
    pub fn build(self) -> tile::Layer {
        let (keys, values) = self.tag_builder.into_tags();
        let values = values.into_iter().map(Into::into).collect();
        tile::Layer {
            name: self.name,
            features: self.features,
            version: 2,
            extent: Some(self.extent),
            keys,
            values,
        }
    }
}

/// Serializes a single layer tile and compresses it.
pub fn encode_tile(layer: tile::Layer, compression: Compression) -> Result<Vec<u8>, EncodeError> {
    let tile = Tile {
        layers: vec![layer],
    };
    compression
        .compress(&tile.encode_to_vec())
        .map_err(EncodeError::Compression)
}

fn tilevalue_from_json(value: &serde_json::Value) -> TileValue {
    match value {
        serde_json::Value::String(s) => TileValue::Str(s.clone()),
        serde_json::Value::Number(n) => {
            if let Some(v) = n.as_i64() {
                TileValue::Int(v)
            } else if let Some(v) = n.as_u64() {
                TileValue::Uint(v)
            } else {
                TileValue::Double(n.as_f64().unwrap_or(f64::NAN))
            }
        }
        serde_json::Value::Bool(b) => TileValue::Bool(*b),
        _ => TileValue::Str(value.to_string()),
    }
}
