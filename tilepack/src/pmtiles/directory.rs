//! Root directory entries and their column-oriented varint serialization.

use tilepack_tile_utils::{Compression, TileId};

use crate::{TpError, TpResult};

/// Location of one tile, or a run of identical tiles, in the tile data section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct DirEntry {
    pub tile_id: u64,
    /// Offset relative to the start of the tile data section.
    pub offset: u64,
    pub length: u32,
    pub run_length: u32,
}

impl DirEntry {
    /// End of the payload, `None` if it lies beyond the addressable range.
    #[must_use]
    pub fn end(&self) -> Option<u64> {
        self.offset.checked_add(u64::from(self.length))
    }

    /// Whether `tile_id` is covered by this entry's run.
    #[must_use]
    pub fn contains(&self, tile_id: u64) -> bool {
        tile_id >= self.tile_id && tile_id - self.tile_id < u64::from(self.run_length)
    }
}

/// Lays out payloads back to back, in the order given.
///
/// Tiles must already be sorted by id; every entry gets a run length of 1.
pub fn build_entries<'a>(
    tiles: impl IntoIterator<Item = (TileId, &'a [u8])>,
) -> TpResult<Vec<DirEntry>> {
    let mut entries: Vec<DirEntry> = Vec::new();
    let mut offset = 0;
    for (tile_id, data) in tiles {
        let tile_id = tile_id.value();
        if entries.last().is_some_and(|e| e.tile_id >= tile_id) {
            return Err(TpError::InvalidDirectory(format!(
                "tile id {tile_id} is not in ascending order"
            )));
        }
        let length = u32::try_from(data.len()).map_err(|_| {
            TpError::InvalidDirectory(format!(
                "tile {tile_id} has {} bytes, more than a directory entry can address",
                data.len()
            ))
        })?;
        entries.push(DirEntry {
            tile_id,
            offset,
            length,
            run_length: 1,
        });
        offset += u64::from(length);
    }
    Ok(entries)
}

pub fn write_varint(buf: &mut Vec<u8>, mut value: u64) {
    while value >= 0x80 {
        buf.push((value & 0x7f) as u8 | 0x80);
        value >>= 7;
    }
    buf.push(value as u8);
}

/// Reads unsigned LEB128 varints from a byte slice.
pub struct VarintReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> VarintReader<'a> {
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn read(&mut self) -> TpResult<u64> {
        let mut value = 0_u64;
        for shift in (0..64).step_by(7) {
            let Some(&byte) = self.data.get(self.pos) else {
                return Err(TpError::InvalidDirectory(
                    "unexpected end of varint data".to_string(),
                ));
            };
            self.pos += 1;
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
        }
        Err(TpError::InvalidDirectory(
            "varint is longer than 64 bits".to_string(),
        ))
    }

    fn read_u32(&mut self, what: &str) -> TpResult<u32> {
        let value = self.read()?;
        u32::try_from(value)
            .map_err(|_| TpError::InvalidDirectory(format!("{what} {value} does not fit in 32 bits")))
    }
}

/// Serializes entries column by column: count, delta-encoded tile ids, run lengths,
/// lengths, then offsets. An offset directly following the previous entry is written
/// as 0, any other offset as `offset + 1`.
pub fn serialize_directory(entries: &[DirEntry], compression: Compression) -> TpResult<Vec<u8>> {
    let mut buf = Vec::with_capacity(entries.len() * 8 + 8);
    write_varint(&mut buf, entries.len() as u64);

    let mut last_id = 0;
    for entry in entries {
        write_varint(&mut buf, entry.tile_id - last_id);
        last_id = entry.tile_id;
    }
    for entry in entries {
        write_varint(&mut buf, u64::from(entry.run_length));
    }
    for entry in entries {
        write_varint(&mut buf, u64::from(entry.length));
    }
    let mut previous: Option<&DirEntry> = None;
    for entry in entries {
        if previous.is_some_and(|p| p.end() == Some(entry.offset)) {
            write_varint(&mut buf, 0);
        } else {
            write_varint(&mut buf, entry.offset + 1);
        }
        previous = Some(entry);
    }

    compression.compress(&buf).map_err(TpError::CompressionError)
}

/// Reverses [`serialize_directory`].
pub fn deserialize_directory(data: &[u8], compression: Compression) -> TpResult<Vec<DirEntry>> {
    let buf = compression
        .decompress(data)
        .map_err(TpError::CompressionError)?;
    let mut reader = VarintReader::new(&buf);

    let count = reader.read()?;
    // every entry takes at least one byte per column
    if count > buf.len() as u64 {
        return Err(TpError::InvalidDirectory(format!(
            "{count} entries cannot fit in {} bytes",
            buf.len()
        )));
    }
    let count = count as usize;

    let mut entries = Vec::with_capacity(count);
    let mut last_id = 0_u64;
    for _ in 0..count {
        last_id = last_id
            .checked_add(reader.read()?)
            .ok_or_else(|| TpError::InvalidDirectory("tile id overflow".to_string()))?;
        entries.push(DirEntry {
            tile_id: last_id,
            offset: 0,
            length: 0,
            run_length: 0,
        });
    }
    for entry in &mut entries {
        entry.run_length = reader.read_u32("run length")?;
    }
    for entry in &mut entries {
        entry.length = reader.read_u32("length")?;
    }
    let mut previous_end = None;
    for entry in &mut entries {
        entry.offset = match (reader.read()?, previous_end) {
            (0, Some(end)) => end,
            (0, None) => {
                return Err(TpError::InvalidDirectory(
                    "first entry has no offset".to_string(),
                ));
            }
            (value, _) => value - 1,
        };
        previous_end = Some(entry.end().ok_or_else(|| {
            TpError::InvalidDirectory(format!(
                "entry for tile {} ends beyond the addressable range",
                entry.tile_id
            ))
        })?);
    }

    if !reader.is_empty() {
        return Err(TpError::InvalidDirectory(
            "trailing bytes after the last entry".to_string(),
        ));
    }
    Ok(entries)
}
