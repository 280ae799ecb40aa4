use std::path::Path;

use serde::{Deserialize, Serialize};
use tilepack_tile_utils::{Compression, MAX_ZOOM};

use crate::{TpError, TpResult};

/// Vector tile extent, in units per tile side.
pub const DEFAULT_EXTENT: u32 = 4096;

pub const DEFAULT_MAX_ZOOM: u8 = 14;

/// Settings of a single archive build.
///
/// Can be loaded from a YAML file:
///
/// ```yaml
/// layer: roads
/// min-zoom: 2
/// max-zoom: 12
/// tile-compression: gzip
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields)]
pub struct TileConfig {
    /// Name of the single vector layer written into every tile.
    pub layer: String,
    #[serde(default)]
    pub min_zoom: u8,
    #[serde(default = "default_max_zoom")]
    pub max_zoom: u8,
    #[serde(default = "default_extent")]
    pub extent: u32,
    /// Compression of each tile payload.
    #[serde(default)]
    pub tile_compression: Compression,
    /// Compression of the directory and the metadata sections.
    #[serde(default)]
    pub internal_compression: Compression,
}

fn default_max_zoom() -> u8 {
    DEFAULT_MAX_ZOOM
}

fn default_extent() -> u32 {
    DEFAULT_EXTENT
}

impl TileConfig {
    #[must_use]
    pub fn new(layer: impl Into<String>) -> Self {
        Self {
            layer: layer.into(),
            min_zoom: 0,
            max_zoom: DEFAULT_MAX_ZOOM,
            extent: DEFAULT_EXTENT,
            tile_compression: Compression::Gzip,
            internal_compression: Compression::Gzip,
        }
    }

    #[must_use]
    pub fn with_zoom_range(mut self, min_zoom: u8, max_zoom: u8) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self
    }

    #[must_use]
    pub fn with_compression(mut self, tile: Compression, internal: Compression) -> Self {
        self.tile_compression = tile;
        self.internal_compression = internal;
        self
    }

    pub fn from_yaml(yaml: &str) -> TpResult<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    pub fn from_path(path: &Path) -> TpResult<Self> {
        let yaml =
            std::fs::read_to_string(path).map_err(|e| TpError::IoError(e, path.to_path_buf()))?;
        Self::from_yaml(&yaml)
    }

    /// Rejects settings the archive writer cannot honor.
    ///
    /// Must pass before any tile is processed.
    pub fn validate(&self) -> TpResult<()> {
        if self.layer.trim().is_empty() {
            return Err(TpError::EmptyLayerName);
        }
        if self.min_zoom > self.max_zoom || self.max_zoom > MAX_ZOOM {
            return Err(TpError::InvalidZoomRange {
                min: self.min_zoom,
                max: self.max_zoom,
            });
        }
        if self.extent == 0 {
            return Err(TpError::InvalidExtent);
        }
        for compression in [self.tile_compression, self.internal_compression] {
            if !compression.is_supported() {
                return Err(TpError::UnsupportedCompression(compression));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use insta::assert_yaml_snapshot;
    use rstest::rstest;

    use super::*;

    #[test]
    fn yaml_defaults() {
        let cfg = TileConfig::from_yaml("layer: roads").unwrap();
        assert_eq!(cfg, TileConfig::new("roads"));
        assert_yaml_snapshot!(cfg, @r"
        layer: roads
        min-zoom: 0
        max-zoom: 14
        extent: 4096
        tile-compression: gzip
        internal-compression: gzip
        ");
    }

    #[test]
    fn yaml_overrides() {
        let cfg = TileConfig::from_yaml(
            "layer: water\nmin-zoom: 3\nmax-zoom: 9\ninternal-compression: none\n",
        )
        .unwrap();
        assert_eq!(cfg.min_zoom, 3);
        assert_eq!(cfg.max_zoom, 9);
        assert_eq!(cfg.internal_compression, Compression::None);
        assert_eq!(cfg.tile_compression, Compression::Gzip);
    }

    #[test]
    fn yaml_rejects_unknown_keys() {
        let err = TileConfig::from_yaml("layer: a\nminzoom: 3").unwrap_err();
        assert!(matches!(err, TpError::ConfigError(_)), "{err}");
    }

    #[rstest]
    #[case(TileConfig::new("a"))]
    #[case(TileConfig::new("a").with_zoom_range(22, 22))]
    #[case(TileConfig::new("a").with_compression(Compression::None, Compression::None))]
    fn valid(#[case] cfg: TileConfig) {
        cfg.validate().unwrap();
    }

    #[test]
    fn invalid_zoom_range() {
        let err = TileConfig::new("a")
            .with_zoom_range(5, 4)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TpError::InvalidZoomRange { min: 5, max: 4 }));

        let err = TileConfig::new("a")
            .with_zoom_range(0, 23)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TpError::InvalidZoomRange { min: 0, max: 23 }));
    }

    #[test]
    fn empty_layer() {
        let err = TileConfig::new("  ").validate().unwrap_err();
        assert!(matches!(err, TpError::EmptyLayerName));
    }

    #[rstest]
    #[case(Compression::Brotli, Compression::Gzip)]
    #[case(Compression::Gzip, Compression::Zstd)]
    #[case(Compression::Unknown, Compression::None)]
    fn unsupported_compression(#[case] tile: Compression, #[case] internal: Compression) {
        let err = TileConfig::new("a")
            .with_compression(tile, internal)
            .validate()
            .unwrap_err();
        assert!(matches!(err, TpError::UnsupportedCompression(_)), "{err}");
    }
}
