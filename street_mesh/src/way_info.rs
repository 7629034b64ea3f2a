use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::Tags;

use crate::raw::{GeoGraph, GeoWay, WayIdx};
use crate::{Color, MeshConfig, MeshError};

/// Ways that get a quad strip and take part in junctions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoadType {
    Street,
    Path,
    Wall,
}

impl RoadType {
    /// None for ways that aren't linear roads at all, like buildings or forests.
    pub fn classify(tags: &Tags) -> Option<RoadType> {
        if tags.is_truthy("area") {
            return None;
        }
        if tags.is_any(
            "barrier",
            vec!["wall", "fence", "retaining_wall", "city_wall", "guard_rail"],
        ) {
            return Some(RoadType::Wall);
        }
        if tags.is_any(
            "highway",
            vec![
                "footway",
                "path",
                "cycleway",
                "pedestrian",
                "steps",
                "track",
                "bridleway",
            ],
        ) {
            return Some(RoadType::Path);
        }
        if tags.contains_key("highway") || tags.is_truthy("raceway") {
            return Some(RoadType::Street);
        }
        None
    }
}

/// The bands of a cross-section, from the centerline outwards.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Band {
    Sidewalk,
    Curb2,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BandDeletion {
    pub left: bool,
    pub right: bool,
}

impl BandDeletion {
    fn parse(tags: &Tags, prefix: &str) -> BandDeletion {
        let both = tags.is_truthy(prefix);
        BandDeletion {
            left: both || tags.is_truthy(&format!("{}_left", prefix)),
            right: both || tags.is_truthy(&format!("{}_right", prefix)),
        }
    }

    /// `left` is relative to the way's own node order.
    pub fn is_deleted(&self, left: bool) -> bool {
        if left {
            self.left
        } else {
            self.right
        }
    }
}

/// Constants derived once from a way's tags.
#[derive(Clone, Debug)]
pub struct WayInfo {
    pub way: WayIdx,
    pub road_type: RoadType,
    /// World-space, curb to curb including every band
    pub width: f64,
    pub lanes: usize,
    pub layer: i32,
    /// World-space offset of the layer from the ground
    pub layer_height: f64,
    pub curb_alpha: f64,
    pub curb2_alpha: f64,
    pub color: Color,
    pub sidewalk_color: Color,
    pub curb2_color: Color,
    pub delete_sidewalk: BandDeletion,
    pub delete_curb2: BandDeletion,
    /// Place one instance of this model per edge instead of generating geometry
    pub model: Option<String>,
    pub bind_height: bool,
    /// Racing lines get their own waypoints down the centerline
    pub explicit_waypoints: bool,
    pub oneway: bool,
}

impl WayInfo {
    /// None for ways that aren't roads, or that sit on a layer with no configured height. Fails
    /// for curb alphas out of order.
    pub fn new(idx: WayIdx, way: &GeoWay, cfg: &MeshConfig) -> Result<Option<WayInfo>> {
        let road_type = match RoadType::classify(&way.tags) {
            Some(rt) => rt,
            None => {
                return Ok(None);
            }
        };

        let layer = way
            .tags
            .get("layer")
            .and_then(|x| x.trim().parse::<i32>().ok())
            .unwrap_or(0);
        let layer_height = match cfg.layer_heights.interpolate(layer) {
            Some(h) => h * cfg.scale,
            None => {
                debug!("Skipping {}, layer {} is out of range", way.id, layer);
                return Ok(None);
            }
        };

        let lane_width = cfg.lane_width * cfg.scale;
        let explicit_lanes = way
            .tags
            .get("lanes")
            .and_then(|x| x.trim().parse::<usize>().ok())
            .filter(|n| *n > 0);
        let width = if let Some(w) = way.tags.get_f64("width").filter(|w| *w > 0.0) {
            w * cfg.scale
        } else if let Some(n) = explicit_lanes {
            (n as f64) * lane_width
        } else {
            cfg.scale
                * match road_type {
                    RoadType::Street => cfg.default_street_width,
                    RoadType::Path => cfg.default_path_width,
                    RoadType::Wall => cfg.default_wall_width,
                }
        };
        let lanes = explicit_lanes.unwrap_or_else(|| ((width / lane_width).round() as usize).max(1));

        // Only streets have sidewalks by default
        let (default_curb, default_curb2) = if road_type == RoadType::Street {
            (cfg.curb_alpha, cfg.curb2_alpha)
        } else {
            (1.0, 1.0)
        };
        let curb_alpha = way.tags.get_f64("curb_alpha").unwrap_or(default_curb);
        let curb2_alpha = way
            .tags
            .get_f64("curb2_alpha")
            .unwrap_or_else(|| default_curb2.max(curb_alpha));
        check_curb_alphas(&way.id.0, curb_alpha, curb2_alpha)?;

        let base_color = match road_type {
            RoadType::Street => cfg.street_color,
            RoadType::Path => cfg.path_color,
            RoadType::Wall => cfg.wall_color,
        };
        let color = way
            .tags
            .get("color")
            .or_else(|| way.tags.get("colour"))
            .and_then(|x| Color::parse(x))
            .unwrap_or(base_color);

        Ok(Some(WayInfo {
            way: idx,
            road_type,
            width,
            lanes,
            layer,
            layer_height,
            curb_alpha,
            curb2_alpha,
            color,
            sidewalk_color: cfg.sidewalk_color,
            curb2_color: cfg.curb2_color,
            delete_sidewalk: BandDeletion::parse(&way.tags, "curb_delete"),
            delete_curb2: BandDeletion::parse(&way.tags, "curb2_delete"),
            model: way.tags.get("model").cloned(),
            bind_height: !way.tags.is("bind_height", "no"),
            explicit_waypoints: way.tags.is_truthy("raceway") || way.tags.is("highway", "raceway"),
            oneway: way.tags.is_truthy("oneway"),
        }))
    }

    /// Fractions of the half-width where each level ends: road surface, sidewalk, outer band.
    pub fn level_alphas(&self) -> [f64; 3] {
        [self.curb_alpha, self.curb2_alpha, 1.0]
    }

    pub fn half_width(&self, level: usize) -> f64 {
        self.level_alphas()[level] * self.width / 2.0
    }

    pub fn has_band(&self, band: Band) -> bool {
        match band {
            Band::Sidewalk => self.curb_alpha < self.curb2_alpha,
            Band::Curb2 => self.curb2_alpha < 1.0,
        }
    }

    /// `left` is relative to the way's own node order.
    pub fn band_deleted(&self, band: Band, left: bool) -> bool {
        match band {
            Band::Sidewalk => self.delete_sidewalk.is_deleted(left),
            Band::Curb2 => self.delete_curb2.is_deleted(left),
        }
    }

    /// True if the band exists on this side.
    pub fn draws_band(&self, band: Band, left: bool) -> bool {
        self.has_band(band) && !self.band_deleted(band, left)
    }

    pub fn band_color(&self, band: Band) -> Color {
        match band {
            Band::Sidewalk => self.sidewalk_color,
            Band::Curb2 => self.curb2_color,
        }
    }
}

pub fn check_curb_alphas(way: &str, curb_alpha: f64, curb2_alpha: f64) -> Result<(), MeshError> {
    if curb_alpha > 0.0 && curb_alpha <= curb2_alpha && curb2_alpha <= 1.0 {
        Ok(())
    } else {
        Err(MeshError::InvalidCurbAlpha {
            way: way.to_string(),
            curb_alpha,
            curb2_alpha,
        })
    }
}

/// Per-way info, indexed like `GeoGraph::ways`. None for ways that aren't roads.
pub struct WayInfos {
    infos: Vec<Option<WayInfo>>,
}

impl WayInfos {
    pub fn new(graph: &GeoGraph, cfg: &MeshConfig) -> Result<WayInfos> {
        let mut infos = Vec::new();
        for (idx, way) in graph.all_ways() {
            infos.push(WayInfo::new(idx, way, cfg)?);
        }
        Ok(WayInfos { infos })
    }

    pub fn get(&self, way: WayIdx) -> Option<&WayInfo> {
        self.infos[way.0].as_ref()
    }

    /// Only call for ways known to be roads.
    pub fn must_get(&self, way: WayIdx) -> &WayInfo {
        self.get(way).unwrap()
    }

    pub fn roads(&self) -> impl Iterator<Item = &WayInfo> {
        self.infos.iter().flatten()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::{GeoGraph, RawGraph};
    use geom::Pt2D;

    fn way_info(tags: Vec<(&str, &str)>) -> Result<Option<WayInfo>> {
        let mut raw = RawGraph::new();
        raw.add_node("1", Pt2D::new(0.0, 0.0), Tags::empty());
        raw.add_node("2", Pt2D::new(10.0, 0.0), Tags::empty());
        raw.add_way("w", vec!["1", "2"], tags.into_iter().collect());
        let graph = GeoGraph::new(raw).unwrap();
        WayInfo::new(WayIdx(0), &graph.ways[0], &MeshConfig::default())
    }

    #[test]
    fn test_width_sources() {
        let explicit = way_info(vec![("highway", "primary"), ("width", "7 m")])
            .unwrap()
            .unwrap();
        assert_eq!(explicit.width, 7.0);
        assert_eq!(explicit.lanes, 2);

        let from_lanes = way_info(vec![("highway", "primary"), ("lanes", "4")])
            .unwrap()
            .unwrap();
        assert_eq!(from_lanes.width, 12.0);
        assert_eq!(from_lanes.lanes, 4);

        let path = way_info(vec![("highway", "footway")]).unwrap().unwrap();
        assert_eq!(path.road_type, RoadType::Path);
        assert_eq!(path.width, 2.0);
        assert_eq!(path.curb_alpha, 1.0);
        assert_eq!(path.curb2_alpha, 1.0);
    }

    #[test]
    fn test_not_roads() {
        assert!(way_info(vec![("building", "yes")]).unwrap().is_none());
        assert!(way_info(vec![("highway", "pedestrian"), ("area", "yes")])
            .unwrap()
            .is_none());
        // Out of the layer table
        assert!(way_info(vec![("highway", "primary"), ("layer", "5")])
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_curb_alphas() {
        let info = way_info(vec![("highway", "primary"), ("curb_alpha", "0.5")])
            .unwrap()
            .unwrap();
        assert!(0.0 < info.curb_alpha && info.curb_alpha <= info.curb2_alpha);
        assert!(info.curb2_alpha <= 1.0);

        let err = way_info(vec![
            ("highway", "primary"),
            ("curb_alpha", "0.8"),
            ("curb2_alpha", "0.6"),
        ])
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<MeshError>(),
            Some(MeshError::InvalidCurbAlpha { .. })
        ));
        assert!(check_curb_alphas("w", 0.0, 0.5).is_err());
        assert!(check_curb_alphas("w", 0.5, 1.5).is_err());
        assert!(check_curb_alphas("w", 1.0, 1.0).is_ok());
    }

    #[test]
    fn test_band_deletion() {
        let info = way_info(vec![("highway", "primary"), ("curb_delete_left", "yes")])
            .unwrap()
            .unwrap();
        assert!(!info.draws_band(Band::Sidewalk, true));
        assert!(info.draws_band(Band::Sidewalk, false));
        assert!(info.draws_band(Band::Curb2, true));
    }
}
