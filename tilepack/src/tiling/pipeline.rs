use std::collections::BTreeMap;

use rayon::prelude::*;
use tilepack_tile_utils::{TileCoord, TileRect};
use tracing::{debug, trace, warn};

use crate::config::TileConfig;
use crate::errors::TpError;
use crate::feature::Feature;
use crate::mvt::{EncodeError, LayerBuilder, encode_tile};
use crate::progress::ProgressSink;
use crate::tiling::{
    TileProjector, clip_geometry, drop_degenerate, geometry_intersects_tile, simplify_geometry,
};

/// Encoded tile payloads keyed by their coordinate.
pub type TileMap = BTreeMap<TileCoord, Vec<u8>>;

/// Progress percentage reached once every zoom level is tiled.
pub const TILING_DONE_PERCENT: u8 = 90;
const TILING_START_PERCENT: u8 = 5;

/// Cuts features into vector tiles for every zoom level of a [`TileConfig`].
///
/// Input features are only read. Every tile works on its own copies, so tiles
/// can be rendered in any order, or concurrently, with identical results.
pub struct Tiler<'a> {
    config: &'a TileConfig,
}

impl<'a> Tiler<'a> {
    #[must_use]
    pub fn new(config: &'a TileConfig) -> Self {
        Self { config }
    }

    /// Tiles all configured zoom levels, reporting progress after each one.
    pub fn run(&self, features: &[Feature], progress: &mut dyn ProgressSink) -> TileMap {
        let zooms = self.config.min_zoom..=self.config.max_zoom;
        let count = usize::from(self.config.max_zoom - self.config.min_zoom) + 1;
        progress.report(TILING_START_PERCENT, "Tiling features");

        let mut tiles = TileMap::new();
        for (idx, zoom) in zooms.enumerate() {
            let zoom_tiles = self.tile_zoom(features, zoom);
            debug!("Zoom {zoom} produced {} tiles", zoom_tiles.len());
            // zoom is part of the key, so levels never overwrite each other
            tiles.extend(zoom_tiles);

            let span = usize::from(TILING_DONE_PERCENT - TILING_START_PERCENT);
            let percent = usize::from(TILING_START_PERCENT) + span * (idx + 1) / count;
            progress.report(
                u8::try_from(percent).unwrap_or(TILING_DONE_PERCENT),
                &format!("Tiled zoom {zoom}"),
            );
        }
        tiles
    }

    /// Renders every non-empty tile of a single zoom level.
    ///
    /// Tiles that fail to encode are logged and left out.
    #[must_use]
    pub fn tile_zoom(&self, features: &[Feature], zoom: u8) -> TileMap {
        let mut candidates: BTreeMap<TileCoord, Vec<&Feature>> = BTreeMap::new();
        for feature in features {
            let Some(bbox) = feature.geometry.bounds() else {
                continue;
            };
            for coord in TileRect::from_bounds(&bbox, zoom).iter() {
                candidates.entry(coord).or_default().push(feature);
            }
        }
        trace!("Zoom {zoom} has {} candidate tiles", candidates.len());

        let rendered: Vec<_> = candidates
            .into_par_iter()
            .map(|(coord, features)| (coord, self.render_tile(coord, features)))
            .collect();

        // failures are reported from the calling thread to stay inside its span
        rendered
            .into_iter()
            .filter_map(|(coord, result)| match result {
                Ok(Some(data)) => Some((coord, data)),
                Ok(None) => None,
                Err(e) => {
                    warn!("{}", TpError::TileEncoding(coord, e.to_string()));
                    None
                }
            })
            .collect()
    }

    /// Renders a single tile from the given candidate features,
    /// returning `None` if no geometry is left to draw.
    pub fn render_tile<'f>(
        &self,
        coord: TileCoord,
        features: impl IntoIterator<Item = &'f Feature>,
    ) -> Result<Option<Vec<u8>>, EncodeError> {
        let bounds = coord.bounds();
        let projector = TileProjector::new(coord, self.config.extent);
        let mut layer = LayerBuilder::new(self.config.layer.clone(), self.config.extent);

        for feature in features {
            if !geometry_intersects_tile(&feature.geometry, &bounds) {
                continue;
            }
            let Feature {
                id,
                geometry,
                properties,
            } = feature.clone();
            let simplified = simplify_geometry(geometry, coord.z);
            let Some(clipped) = clip_geometry(simplified, &bounds) else {
                continue;
            };
            let Some(geometry) = drop_degenerate(projector.project(&clipped)) else {
                continue;
            };
            layer.add_feature(&Feature {
                id,
                geometry,
                properties,
            })?;
        }

        if layer.is_empty() {
            return Ok(None);
        }
        encode_tile(layer.build(), self.config.tile_compression).map(Some)
    }
}

#[cfg(test)]
mod tests {
    use geo::{line_string, point, polygon};
    use geozero::mvt::{Message as _, Tile};
    use tilepack_tile_utils::{Compression, decode_gzip};

    use super::*;
    use crate::feature::Geometry;
    use crate::progress::NoProgress;

    fn decode(data: &[u8]) -> Tile {
        Tile::decode(decode_gzip(data).unwrap().as_slice()).unwrap()
    }

    fn coord(z: u8, x: u32, y: u32) -> TileCoord {
        TileCoord { z, x, y }
    }

    #[test]
    fn single_point_world_tile() {
        let config = TileConfig::new("points").with_zoom_range(0, 0);
        let features = vec![Feature::new(Geometry::Point(point!(x: 10.0, y: 10.0)))];
        let tiles = Tiler::new(&config).run(&features, &mut NoProgress);
        assert_eq!(tiles.keys().copied().collect::<Vec<_>>(), vec![coord(0, 0, 0)]);

        let tile = decode(&tiles[&coord(0, 0, 0)]);
        assert_eq!(tile.layers[0].name, "points");
        assert_eq!(tile.layers[0].features.len(), 1);
    }

    #[test]
    fn polygon_only_covering_one_of_four_candidates() {
        let config = TileConfig::new("areas").with_zoom_range(2, 2);
        let triangle = polygon![
            (x: 80.0, y: -0.000_001),
            (x: -0.000_001, y: 60.0),
            (x: 80.0, y: 60.0),
            (x: 80.0, y: -0.000_001),
        ];
        let features = vec![Feature::new(Geometry::Polygon(triangle))];
        let bbox = features[0].geometry.bounds().unwrap();
        assert_eq!(TileRect::from_bounds(&bbox, 2).size(), 4);

        // the vertices just past the tile edges let 2/1/1 and 2/2/2 pass the intersection
        // test, their slivers are dropped after projection
        let g = &features[0].geometry;
        assert!(geometry_intersects_tile(g, &coord(2, 1, 1).bounds()));
        assert!(geometry_intersects_tile(g, &coord(2, 2, 2).bounds()));
        assert!(!geometry_intersects_tile(g, &coord(2, 1, 2).bounds()));

        let tiles = Tiler::new(&config).tile_zoom(&features, 2);
        assert_eq!(tiles.keys().copied().collect::<Vec<_>>(), vec![coord(2, 2, 1)]);
    }

    #[test]
    fn bbox_corner_tile_is_not_rendered() {
        // the hypotenuse x + y = 10 passes between the polygon and tile 2/1/2
        let triangle = polygon![
            (x: -10.0, y: 20.0),
            (x: 20.0, y: 20.0),
            (x: 20.0, y: -10.0),
            (x: -10.0, y: 20.0),
        ];
        let geometry = Geometry::Polygon(triangle);
        let bbox = geometry.bounds().unwrap();
        let candidates: Vec<_> = TileRect::from_bounds(&bbox, 2).iter().collect();
        assert_eq!(
            candidates,
            vec![coord(2, 1, 1), coord(2, 2, 1), coord(2, 1, 2), coord(2, 2, 2)]
        );
        let intersecting: Vec<_> = candidates
            .iter()
            .map(|c| geometry_intersects_tile(&geometry, &c.bounds()))
            .collect();
        assert_eq!(intersecting, vec![true, true, false, true]);

        let config = TileConfig::new("areas").with_zoom_range(2, 2);
        let tiles = Tiler::new(&config).tile_zoom(&[Feature::new(geometry)], 2);
        assert_eq!(
            tiles.keys().copied().collect::<Vec<_>>(),
            vec![coord(2, 1, 1), coord(2, 2, 1), coord(2, 2, 2)]
        );
    }

    #[test]
    #[tracing_test::traced_test]
    fn failed_tiles_are_logged_and_dropped() {
        // validate() would reject brotli, the tiler itself does not check
        let config = TileConfig::new("points")
            .with_zoom_range(0, 0)
            .with_compression(Compression::Brotli, Compression::Gzip);
        let features = vec![Feature::new(Geometry::Point(point!(x: 1.0, y: 1.0)))];
        let tiles = Tiler::new(&config).tile_zoom(&features, 0);
        assert!(tiles.is_empty());
        assert!(logs_contain("Unable to encode tile 0/0/0"));
    }

    #[test]
    fn identical_features_are_kept_apart() {
        let config = TileConfig::new("dupes").with_zoom_range(0, 0);
        let feature = Feature::new(Geometry::Point(point!(x: 1.0, y: 1.0))).with_property("a", 1);
        let features = vec![feature.clone(), feature];
        let tiles = Tiler::new(&config).run(&features, &mut NoProgress);
        assert_eq!(tiles.len(), 1);
        let tile = decode(&tiles[&coord(0, 0, 0)]);
        let layer = &tile.layers[0];
        assert_eq!(layer.features.len(), 2);
        assert_eq!(layer.features[0], layer.features[1]);
    }

    #[test]
    fn tiles_do_not_depend_on_render_order() {
        let config = TileConfig::new("roads").with_zoom_range(1, 1);
        let road = Feature::new(Geometry::LineString(line_string![
            (x: -40.0, y: 20.0),
            (x: 40.0, y: 20.0),
            (x: 40.0, y: -20.0),
        ]))
        .with_property("name", "ring road");
        let features = vec![road];
        let tiler = Tiler::new(&config);
        let (west, east) = (coord(1, 0, 0), coord(1, 1, 0));

        let west_first = tiler.render_tile(west, &features).unwrap().unwrap();
        let east_second = tiler.render_tile(east, &features).unwrap().unwrap();
        let east_first = tiler.render_tile(east, &features).unwrap().unwrap();
        let west_second = tiler.render_tile(west, &features).unwrap().unwrap();
        assert_eq!(west_first, west_second);
        assert_eq!(east_first, east_second);
        assert_ne!(west_first, east_first);

        let all = tiler.tile_zoom(&features, 1);
        assert_eq!(all[&west], west_first);
        assert_eq!(all[&east], east_first);
        // input is never modified
        assert_eq!(features[0].geometry.bounds().unwrap().left, -40.0);
    }

    #[test]
    fn runs_are_deterministic() {
        let config = TileConfig::new("mixed").with_zoom_range(0, 4);
        let features = vec![
            Feature::new(Geometry::Point(point!(x: 12.5, y: 41.9))).with_id(1),
            Feature::new(Geometry::LineString(line_string![
                (x: -120.0, y: 45.0),
                (x: -70.0, y: 40.0),
                (x: 2.3, y: 48.8),
            ]))
            .with_id(2),
            Feature::new(Geometry::Polygon(polygon![
                (x: -10.0, y: -10.0),
                (x: 30.0, y: -10.0),
                (x: 30.0, y: 30.0),
                (x: -10.0, y: 30.0),
                (x: -10.0, y: -10.0),
            ]))
            .with_id(3),
        ];
        let first = Tiler::new(&config).run(&features, &mut NoProgress);
        let second = Tiler::new(&config).run(&features, &mut NoProgress);
        assert_eq!(first, second);
        assert!(first.keys().all(|c| c.z <= 4));
        assert!(first.contains_key(&coord(0, 0, 0)));
    }

    #[test]
    fn reports_every_zoom() {
        let config = TileConfig::new("points").with_zoom_range(3, 5);
        let features = vec![Feature::new(Geometry::Point(point!(x: 0.5, y: 0.5)))];
        let mut reports = Vec::new();
        let mut sink = |percent: u8, status: &str| reports.push((percent, status.to_string()));
        let tiles = Tiler::new(&config).run(&features, &mut sink);
        assert_eq!(tiles.len(), 3);
        assert_eq!(
            reports,
            vec![
                (5, "Tiling features".to_string()),
                (33, "Tiled zoom 3".to_string()),
                (61, "Tiled zoom 4".to_string()),
                (90, "Tiled zoom 5".to_string()),
            ]
        );
    }
}
