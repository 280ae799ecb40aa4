use enum_display::EnumDisplay;
use serde::{Deserialize, Serialize};
use tilepack_tile_utils::{Bounds, Compression};

/// Size of the fixed archive header, in bytes.
pub const HEADER_SIZE: usize = 127;

pub const MAGIC: &[u8; 7] = b"PMTiles";

pub const VERSION: u8 = 3;

/// Kind of content stored in every tile of an archive.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay)]
#[serde(rename_all = "lowercase")]
#[enum_display(case = "Lower")]
#[repr(u8)]
pub enum TileType {
    Unknown = 0,
    Mvt = 1,
    Png = 2,
    Jpeg = 3,
    Webp = 4,
    Avif = 5,
}

impl TileType {
    #[must_use]
    pub fn from_header_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::Mvt),
            2 => Some(Self::Png),
            3 => Some(Self::Jpeg),
            4 => Some(Self::Webp),
            5 => Some(Self::Avif),
            _ => None,
        }
    }
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Archive header needs {HEADER_SIZE} bytes, but only {0} are available")]
    TooShort(usize),

    #[error("Archive does not start with the PMTiles magic bytes")]
    InvalidMagic,

    #[error("Archive version {0} is not supported, expected version {VERSION}")]
    UnsupportedVersion(u8),

    #[error("Unknown compression byte {0} in archive header")]
    InvalidCompression(u8),

    #[error("Unknown tile type byte {0} in archive header")]
    InvalidTileType(u8),
}

/// The fixed-size record at the start of every archive.
///
/// Offsets are absolute positions from the start of the file. Coordinates are stored
/// as fixed-point integers in units of 1e-7 degrees.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub root_offset: u64,
    pub root_length: u64,
    pub metadata_offset: u64,
    pub metadata_length: u64,
    pub leaf_offset: u64,
    pub leaf_length: u64,
    pub data_offset: u64,
    pub data_length: u64,
    pub addressed_tiles: u64,
    pub tile_entries: u64,
    pub tile_contents: u64,
    pub clustered: bool,
    pub internal_compression: Compression,
    pub tile_compression: Compression,
    pub tile_type: TileType,
    pub min_zoom: u8,
    pub max_zoom: u8,
    pub min_lon_e7: i32,
    pub min_lat_e7: i32,
    pub max_lon_e7: i32,
    pub max_lat_e7: i32,
    pub center_zoom: u8,
    pub center_lon_e7: i32,
    pub center_lat_e7: i32,
}

fn to_e7(degrees: f64) -> i32 {
    (degrees * 10_000_000.0) as i32
}

fn from_e7(value: i32) -> f64 {
    f64::from(value) / 10_000_000.0
}

impl Header {
    /// Geographic bounds covered by the archive.
    #[must_use]
    pub fn bounds(&self) -> Bounds {
        Bounds::new(
            from_e7(self.min_lon_e7),
            from_e7(self.min_lat_e7),
            from_e7(self.max_lon_e7),
            from_e7(self.max_lat_e7),
        )
    }

    pub fn set_bounds(&mut self, bounds: &Bounds) {
        self.min_lon_e7 = to_e7(bounds.left);
        self.min_lat_e7 = to_e7(bounds.bottom);
        self.max_lon_e7 = to_e7(bounds.right);
        self.max_lat_e7 = to_e7(bounds.top);
    }

    /// Center as `(longitude, latitude)` degrees.
    #[must_use]
    pub fn center(&self) -> (f64, f64) {
        (from_e7(self.center_lon_e7), from_e7(self.center_lat_e7))
    }

    pub fn set_center(&mut self, lon: f64, lat: f64, zoom: u8) {
        self.center_lon_e7 = to_e7(lon);
        self.center_lat_e7 = to_e7(lat);
        self.center_zoom = zoom;
    }

    /// Serializes the header into its little-endian on-disk layout.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; HEADER_SIZE] {
        let mut buf = [0_u8; HEADER_SIZE];
        buf[0..7].copy_from_slice(MAGIC);
        buf[7] = VERSION;

        let u64_fields = [
            self.root_offset,
            self.root_length,
            self.metadata_offset,
            self.metadata_length,
            self.leaf_offset,
            self.leaf_length,
            self.data_offset,
            self.data_length,
            self.addressed_tiles,
            self.tile_entries,
            self.tile_contents,
        ];
        for (idx, value) in u64_fields.into_iter().enumerate() {
            let at = 8 + idx * 8;
            buf[at..at + 8].copy_from_slice(&value.to_le_bytes());
        }

        buf[96] = u8::from(self.clustered);
        buf[97] = self.internal_compression as u8;
        buf[98] = self.tile_compression as u8;
        buf[99] = self.tile_type as u8;
        buf[100] = self.min_zoom;
        buf[101] = self.max_zoom;
        buf[102..106].copy_from_slice(&self.min_lon_e7.to_le_bytes());
        buf[106..110].copy_from_slice(&self.min_lat_e7.to_le_bytes());
        buf[110..114].copy_from_slice(&self.max_lon_e7.to_le_bytes());
        buf[114..118].copy_from_slice(&self.max_lat_e7.to_le_bytes());
        buf[118] = self.center_zoom;
        buf[119..123].copy_from_slice(&self.center_lon_e7.to_le_bytes());
        buf[123..127].copy_from_slice(&self.center_lat_e7.to_le_bytes());
        buf
    }
}

/// Parses the header at the start of `data`. Bytes past the header are ignored.
pub fn parse_header(data: &[u8]) -> Result<Header, HeaderError> {
    if data.len() < HEADER_SIZE {
        return Err(HeaderError::TooShort(data.len()));
    }
    if &data[0..7] != MAGIC {
        return Err(HeaderError::InvalidMagic);
    }
    if data[7] != VERSION {
        return Err(HeaderError::UnsupportedVersion(data[7]));
    }

    let u64_at = |at: usize| {
        let mut b = [0_u8; 8];
        b.copy_from_slice(&data[at..at + 8]);
        u64::from_le_bytes(b)
    };
    let i32_at = |at: usize| {
        let mut b = [0_u8; 4];
        b.copy_from_slice(&data[at..at + 4]);
        i32::from_le_bytes(b)
    };
    let compression_at = |at: usize| {
        Compression::from_header_byte(data[at]).ok_or(HeaderError::InvalidCompression(data[at]))
    };

    Ok(Header {
        root_offset: u64_at(8),
        root_length: u64_at(16),
        metadata_offset: u64_at(24),
        metadata_length: u64_at(32),
        leaf_offset: u64_at(40),
        leaf_length: u64_at(48),
        data_offset: u64_at(56),
        data_length: u64_at(64),
        addressed_tiles: u64_at(72),
        tile_entries: u64_at(80),
        tile_contents: u64_at(88),
        clustered: data[96] == 1,
        internal_compression: compression_at(97)?,
        tile_compression: compression_at(98)?,
        tile_type: TileType::from_header_byte(data[99])
            .ok_or(HeaderError::InvalidTileType(data[99]))?,
        min_zoom: data[100],
        max_zoom: data[101],
        min_lon_e7: i32_at(102),
        min_lat_e7: i32_at(106),
        max_lon_e7: i32_at(110),
        max_lat_e7: i32_at(114),
        center_zoom: data[118],
        center_lon_e7: i32_at(119),
        center_lat_e7: i32_at(123),
    })
}
