//! Reading and writing of PMTiles v3 archives with a single root directory.

mod directory;
mod header;
mod metadata;
mod reader;
mod writer;

pub use directory::{
    DirEntry, VarintReader, build_entries, deserialize_directory, serialize_directory,
    write_varint,
};
pub use header::{HEADER_SIZE, Header, HeaderError, MAGIC, TileType, VERSION, parse_header};
pub use metadata::ArchiveMetadata;
pub use reader::ArchiveReader;
pub use tilepack_tile_utils::Compression;
pub use writer::{assemble_archive, write_archive};
