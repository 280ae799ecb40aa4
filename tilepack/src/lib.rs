#![doc = "Builds single-layer vector tile archives in the PMTiles v3 format from GeoJSON features."]
#![allow(clippy::missing_errors_doc)]

mod build;
pub use build::{build, build_to_file};

mod config;
pub use config::{DEFAULT_EXTENT, DEFAULT_MAX_ZOOM, TileConfig};

mod errors;
pub use errors::{TpError, TpResult};

pub mod feature;
pub use feature::{Feature, Geometry, Properties};

mod input;
pub use input::{read_features, read_features_from_path};

#[cfg(feature = "cli")]
pub mod logging;

pub mod mvt;
pub mod pmtiles;

mod progress;
pub use progress::{NoProgress, Progress, ProgressSink, ProgressTracker};

pub mod tiling;

// Re-export tile helpers so users do not need a separate dependency
pub use tilepack_tile_utils::{Bounds, Compression, TileCoord, TileId, TileRect};
