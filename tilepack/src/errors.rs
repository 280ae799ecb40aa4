use std::path::PathBuf;

use tilepack_tile_utils::{Compression, TileCoord, TileCoordError};

use crate::pmtiles::HeaderError;

#[derive(thiserror::Error, Debug)]
pub enum TpError {
    #[error("The input does not contain any GeoJSON data")]
    InputEmpty,

    #[error("Unable to parse GeoJSON from {1}: {0}")]
    InvalidGeoJson(#[source] geojson::Error, String),

    #[error("Geometry type {0} is not supported, expected a point, line string or polygon")]
    UnsupportedGeometry(String),

    #[error(
        "Feature #{0} has a position with fewer than two ordinates or a non-finite ordinate"
    )]
    InvalidPosition(usize),

    #[error("Compression {0} is not supported, only none and gzip can be written")]
    UnsupportedCompression(Compression),

    #[error("Invalid zoom range {min}..={max}, min zoom must not exceed max zoom, and max zoom must be at most {}", tilepack_tile_utils::MAX_ZOOM)]
    InvalidZoomRange { min: u8, max: u8 },

    #[error("Tile extent must be a positive number of units")]
    InvalidExtent,

    #[error("Layer name must not be empty")]
    EmptyLayerName,

    #[error("Unable to encode tile {0:#}: {1}")]
    TileEncoding(TileCoord, String),

    #[error("No tiles to write, none of the features produced any tile content")]
    NoTilesToWrite,

    #[error("IO error {err}: {path}", err = .0, path = .1.display())]
    IoError(#[source] std::io::Error, PathBuf),

    #[error("Unable to compress or decompress archive data: {0}")]
    CompressionError(#[source] std::io::Error),

    #[error(transparent)]
    JsonSerdeError(#[from] serde_json::Error),

    #[error("Unable to parse configuration: {0}")]
    ConfigError(#[from] serde_yaml::Error),

    #[error(transparent)]
    InvalidHeader(#[from] HeaderError),

    #[error("Invalid archive directory: {0}")]
    InvalidDirectory(String),

    #[error(transparent)]
    InvalidTile(#[from] TileCoordError),
}

pub type TpResult<T> = Result<T, TpError>;
