use std::fmt::{Display, Formatter};
use std::io::{Read as _, Write as _};
use std::str::FromStr;

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use serde::{Deserialize, Serialize};

/// Compression applied to tiles or to the directory and metadata sections of an archive.
///
/// The discriminants are the byte values stored in the archive header.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u8)]
pub enum Compression {
    Unknown = 0,
    None = 1,
    #[default]
    Gzip = 2,
    Brotli = 3,
    Zstd = 4,
}

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown compression `{0}`, expected one of none, gzip, brotli, zstd")]
pub struct ParseCompressionError(pub String);

impl Compression {
    /// Name used in metadata and on the command line.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::None => "none",
            Self::Gzip => "gzip",
            Self::Brotli => "brotli",
            Self::Zstd => "zstd",
        }
    }

    /// Only uncompressed and gzip data can be produced by the archive writer.
    #[must_use]
    pub fn is_supported(&self) -> bool {
        matches!(self, Self::None | Self::Gzip)
    }

    #[must_use]
    pub fn from_header_byte(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Unknown),
            1 => Some(Self::None),
            2 => Some(Self::Gzip),
            3 => Some(Self::Brotli),
            4 => Some(Self::Zstd),
            _ => None,
        }
    }

    /// Compresses `data`, failing with [`std::io::ErrorKind::Unsupported`]
    /// for anything other than `none` and `gzip`.
    pub fn compress(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => encode_gzip(data),
            Self::Unknown | Self::Brotli | Self::Zstd => Err(self.unsupported()),
        }
    }

    /// Reverses [`Compression::compress`].
    pub fn decompress(&self, data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
        match self {
            Self::None => Ok(data.to_vec()),
            Self::Gzip => decode_gzip(data),
            Self::Unknown | Self::Brotli | Self::Zstd => Err(self.unsupported()),
        }
    }

    fn unsupported(self) -> std::io::Error {
        std::io::Error::new(
            std::io::ErrorKind::Unsupported,
            format!("{self} compression is not supported"),
        )
    }
}

impl Display for Compression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Compression {
    type Err = ParseCompressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "gzip" | "gz" => Ok(Self::Gzip),
            "brotli" | "br" => Ok(Self::Brotli),
            "zstd" => Ok(Self::Zstd),
            _ => Err(ParseCompressionError(s.to_string())),
        }
    }
}

pub fn decode_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut decoder = GzDecoder::new(data);
    let mut decompressed = Vec::new();
    decoder.read_to_end(&mut decompressed)?;
    Ok(decompressed)
}

pub fn encode_gzip(data: &[u8]) -> Result<Vec<u8>, std::io::Error> {
    let mut encoder = GzEncoder::new(Vec::new(), flate2::Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case("none", Compression::None)]
    #[case("GZIP", Compression::Gzip)]
    #[case("gz", Compression::Gzip)]
    #[case("brotli", Compression::Brotli)]
    #[case("zstd", Compression::Zstd)]
    fn parse(#[case] value: &str, #[case] expected: Compression) {
        assert_eq!(value.parse::<Compression>(), Ok(expected));
    }

    #[test]
    fn parse_unknown() {
        assert_eq!(
            "lz4".parse::<Compression>(),
            Err(ParseCompressionError("lz4".to_string()))
        );
    }

    #[test]
    fn gzip_has_magic_and_restores() {
        let data = b"tile data tile data tile data";
        let packed = Compression::Gzip.compress(data).unwrap();
        assert_eq!(&packed[0..2], b"\x1f\x8b");
        assert_eq!(Compression::Gzip.decompress(&packed).unwrap(), data);
    }

    #[test]
    fn none_is_passthrough() {
        let data = b"raw";
        assert_eq!(Compression::None.compress(data).unwrap(), data);
    }

    #[test]
    fn brotli_is_unsupported() {
        let err = Compression::Brotli.compress(b"x").unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::Unsupported);
        assert!(!Compression::Brotli.is_supported());
        assert!(Compression::Gzip.is_supported());
    }

    #[test]
    fn header_bytes() {
        for c in [
            Compression::Unknown,
            Compression::None,
            Compression::Gzip,
            Compression::Brotli,
            Compression::Zstd,
        ] {
            assert_eq!(Compression::from_header_byte(c as u8), Some(c));
        }
        assert_eq!(Compression::from_header_byte(5), None);
    }
}
