use std::path::Path;

use tilepack_tile_utils::{Bounds, MAX_LATITUDE};
use tracing::info;

use crate::config::TileConfig;
use crate::feature::Feature;
use crate::pmtiles::{ArchiveMetadata, assemble_archive, write_archive};
use crate::progress::ProgressSink;
use crate::tiling::Tiler;
use crate::tiling::pipeline::TILING_DONE_PERCENT;
use crate::{TpError, TpResult};

/// Builds a complete archive from already parsed features.
///
/// The configuration is validated before any tile is processed. Fails with
/// [`TpError::NoTilesToWrite`] when no feature produced any tile content.
pub fn build(
    features: &[Feature],
    config: &TileConfig,
    progress: &mut dyn ProgressSink,
) -> TpResult<Vec<u8>> {
    config.validate()?;
    progress.report(0, "Starting");
    info!(
        "Building layer {} from {} features for zoom {}..={}",
        config.layer,
        features.len(),
        config.min_zoom,
        config.max_zoom
    );

    let tiles = Tiler::new(config).run(features, progress);
    if tiles.is_empty() {
        return Err(TpError::NoTilesToWrite);
    }

    progress.report(TILING_DONE_PERCENT + 5, "Writing archive");
    let metadata = ArchiveMetadata::new(config, features);
    let bounds = features_bounds(features).unwrap_or_else(world_bounds);
    let archive = assemble_archive(&tiles, &metadata, config, &bounds)?;
    info!(
        "Built archive with {} tiles, {} bytes",
        tiles.len(),
        archive.len()
    );
    progress.report(100, "Done");
    Ok(archive)
}

/// Builds an archive and writes it to `path`. The file is only created when the
/// build succeeds.
pub fn build_to_file(
    features: &[Feature],
    config: &TileConfig,
    path: &Path,
    progress: &mut dyn ProgressSink,
) -> TpResult<usize> {
    let archive = build(features, config, progress)?;
    write_archive(path, &archive)?;
    Ok(archive.len())
}

/// Union of all feature bounding boxes, clamped to the projection limits.
fn features_bounds(features: &[Feature]) -> Option<Bounds> {
    let bounds = features
        .iter()
        .filter_map(|f| f.geometry.bounds())
        .reduce(|a, b| {
            Bounds::new(
                a.left.min(b.left),
                a.bottom.min(b.bottom),
                a.right.max(b.right),
                a.top.max(b.top),
            )
        })?;
    Some(Bounds::new(
        bounds.left.clamp(-180.0, 180.0),
        bounds.bottom.clamp(-MAX_LATITUDE, MAX_LATITUDE),
        bounds.right.clamp(-180.0, 180.0),
        bounds.top.clamp(-MAX_LATITUDE, MAX_LATITUDE),
    ))
}

fn world_bounds() -> Bounds {
    Bounds::new(-180.0, -MAX_LATITUDE, 180.0, MAX_LATITUDE)
}
