use std::io::Write as _;
use std::path::Path;

use tempfile::NamedTempFile;
use tilepack_tile_utils::{Bounds, TileId};
use tracing::{debug, info};

use crate::config::TileConfig;
use crate::pmtiles::{
    ArchiveMetadata, HEADER_SIZE, Header, TileType, build_entries, serialize_directory,
};
use crate::tiling::pipeline::TileMap;
use crate::{TpError, TpResult};

/// Assembles a complete single-directory archive in memory.
///
/// Sections follow each other without gaps: header, root directory, metadata, tile data.
pub fn assemble_archive(
    tiles: &TileMap,
    metadata: &ArchiveMetadata,
    config: &TileConfig,
    bounds: &Bounds,
) -> TpResult<Vec<u8>> {
    if tiles.is_empty() {
        return Err(TpError::NoTilesToWrite);
    }

    let mut sorted: Vec<(TileId, &[u8])> = tiles
        .iter()
        .map(|(coord, data)| (TileId::from(*coord), data.as_slice()))
        .collect();
    sorted.sort_unstable_by_key(|(id, _)| *id);

    let entries = build_entries(sorted.iter().copied())?;
    let root = serialize_directory(&entries, config.internal_compression)?;
    let meta = metadata.to_bytes(config.internal_compression)?;
    let data_length: u64 = entries.iter().map(|e| u64::from(e.length)).sum();

    let root_offset = HEADER_SIZE as u64;
    let metadata_offset = root_offset + root.len() as u64;
    let data_offset = metadata_offset + meta.len() as u64;
    let count = entries.len() as u64;

    let mut header = Header {
        root_offset,
        root_length: root.len() as u64,
        metadata_offset,
        metadata_length: meta.len() as u64,
        leaf_offset: 0,
        leaf_length: 0,
        data_offset,
        data_length,
        // no deduplication, so every entry is a distinct payload
        addressed_tiles: count,
        tile_entries: count,
        tile_contents: count,
        clustered: true,
        internal_compression: config.internal_compression,
        tile_compression: config.tile_compression,
        tile_type: TileType::Mvt,
        min_zoom: config.min_zoom,
        max_zoom: config.max_zoom,
        min_lon_e7: 0,
        min_lat_e7: 0,
        max_lon_e7: 0,
        max_lat_e7: 0,
        center_zoom: 0,
        center_lon_e7: 0,
        center_lat_e7: 0,
    };
    header.set_bounds(bounds);
    header.set_center(
        (bounds.left + bounds.right) / 2.0,
        (bounds.bottom + bounds.top) / 2.0,
        config.min_zoom,
    );
    debug!(
        "Archive sections: directory {} bytes, metadata {} bytes, {count} tiles with {data_length} bytes",
        root.len(),
        meta.len()
    );

    let mut archive = Vec::with_capacity(data_offset as usize + data_length as usize);
    archive.extend_from_slice(&header.to_bytes());
    archive.extend_from_slice(&root);
    archive.extend_from_slice(&meta);
    for (_, data) in &sorted {
        archive.extend_from_slice(data);
    }
    Ok(archive)
}

/// Writes archive bytes to `path`, replacing any existing file only once
/// everything has been written. On failure, no file is left behind.
pub fn write_archive(path: &Path, data: &[u8]) -> TpResult<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    let io_err = |e| TpError::IoError(e, path.to_path_buf());

    let mut file = NamedTempFile::new_in(dir).map_err(|e| TpError::IoError(e, dir.to_path_buf()))?;
    file.write_all(data).map_err(io_err)?;
    file.as_file().sync_all().map_err(io_err)?;
    file.persist(path).map_err(|e| io_err(e.error))?;

    info!("Wrote {} bytes to {}", data.len(), path.display());
    Ok(())
}
