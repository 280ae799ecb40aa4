//! Turning features into encoded vector tiles, one zoom level at a time.

pub mod clip;
pub mod intersect;
pub mod pipeline;
pub mod project;
pub mod simplify;

pub use clip::clip_geometry;
pub use intersect::geometry_intersects_tile;
pub use pipeline::{TileMap, Tiler};
pub use project::{DEGENERATE_THRESHOLD, TileProjector, drop_degenerate};
pub use simplify::{simplify_epsilon, simplify_geometry};
