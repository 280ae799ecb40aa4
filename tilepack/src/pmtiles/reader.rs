use tilepack_tile_utils::{TileCoord, TileId};

use crate::pmtiles::{ArchiveMetadata, DirEntry, Header, deserialize_directory, parse_header};
use crate::{TpError, TpResult};

/// Read access to an archive held in memory.
///
/// Only the root directory is consulted; archives with leaf directories are rejected.
pub struct ArchiveReader<'a> {
    data: &'a [u8],
    header: Header,
    entries: Vec<DirEntry>,
}

impl<'a> ArchiveReader<'a> {
    pub fn new(data: &'a [u8]) -> TpResult<Self> {
        let header = parse_header(data)?;
        if header.leaf_length > 0 {
            return Err(TpError::InvalidDirectory(
                "leaf directories are not supported".to_string(),
            ));
        }
        let root = section(data, header.root_offset, header.root_length, "root directory")?;
        let entries = deserialize_directory(root, header.internal_compression)?;
        if entries.windows(2).any(|w| w[0].tile_id >= w[1].tile_id) {
            return Err(TpError::InvalidDirectory(
                "entries are not sorted by tile id".to_string(),
            ));
        }
        Ok(Self {
            data,
            header,
            entries,
        })
    }

    #[must_use]
    pub fn header(&self) -> &Header {
        &self.header
    }

    #[must_use]
    pub fn entries(&self) -> &[DirEntry] {
        &self.entries
    }

    pub fn metadata(&self) -> TpResult<ArchiveMetadata> {
        let data = section(
            self.data,
            self.header.metadata_offset,
            self.header.metadata_length,
            "metadata",
        )?;
        ArchiveMetadata::from_bytes(data, self.header.internal_compression)
    }

    /// Like [`ArchiveReader::get_tile`], validating the coordinate first.
    pub fn get_tile_zxy(&self, z: u8, x: u32, y: u32) -> TpResult<Option<&'a [u8]>> {
        self.get_tile(TileCoord::new(z, x, y)?)
    }

    /// Raw tile payload, still compressed with the archive's tile compression.
    pub fn get_tile(&self, coord: TileCoord) -> TpResult<Option<&'a [u8]>> {
        let tile_id = TileId::from(coord).value();
        let idx = self.entries.partition_point(|e| e.tile_id <= tile_id);
        let Some(entry) = idx.checked_sub(1).map(|i| &self.entries[i]) else {
            return Ok(None);
        };
        if !entry.contains(tile_id) {
            return Ok(None);
        }
        let tiles = section(
            self.data,
            self.header.data_offset,
            self.header.data_length,
            "tile data",
        )?;
        entry
            .end()
            .and_then(|end| tiles.get(entry.offset as usize..end as usize))
            .map(Some)
            .ok_or_else(|| {
                TpError::InvalidDirectory(format!(
                    "tile {coord:#} points past the tile data section"
                ))
            })
    }
}

fn section<'a>(data: &'a [u8], offset: u64, length: u64, name: &str) -> TpResult<&'a [u8]> {
    offset
        .checked_add(length)
        .and_then(|end| data.get(offset as usize..end as usize))
        .ok_or_else(|| {
            TpError::InvalidDirectory(format!(
                "{name} section {offset}+{length} is outside of the {} byte archive",
                data.len()
            ))
        })
}
