use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::way_info::check_curb_alphas;
use crate::{Color, MeshError};

/// Which side of the road vehicles keep to. This decides the orientation of the two lanes
/// generated per street edge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrivingDirection {
    /// One shared bidirectional lane down the middle
    Center,
    Left,
    Right,
}

impl FromStr for DrivingDirection {
    type Err = MeshError;

    fn from_str(x: &str) -> Result<DrivingDirection, MeshError> {
        match x.to_lowercase().as_ref() {
            "center" => Ok(DrivingDirection::Center),
            "left" => Ok(DrivingDirection::Left),
            "right" => Ok(DrivingDirection::Right),
            _ => Err(MeshError::UnknownDrivingDirection(x.to_string())),
        }
    }
}

/// Everything tunable about mesh generation. Distances are in meters and get multiplied by
/// `scale` to reach world-space.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct MeshConfig {
    /// World-space units per meter
    pub scale: f64,
    pub default_street_width: f64,
    pub default_path_width: f64,
    pub default_wall_width: f64,
    pub lane_width: f64,
    pub uv_scale: UvScale,

    /// Where the road surface ends, as a fraction of the half-width. Only applies to streets;
    /// paths and walls default to 1.
    pub curb_alpha: f64,
    /// Where the sidewalk ends, as a fraction of the half-width.
    pub curb2_alpha: f64,
    pub street_color: Color,
    pub path_color: Color,
    pub sidewalk_color: Color,
    pub curb2_color: Color,
    pub crossing_color: Color,
    pub wall_color: Color,
    pub building_color: Color,
    pub water_color: Color,
    pub terrain_color: Color,

    /// "center", "left", or "right". Parsed when the pipeline starts, so a typo is a hard error.
    pub driving_direction: String,
    pub layer_heights: LayerHeights,
    pub extrude: ExtrusionConfig,
    pub steiner: SteinerConfig,
    pub street_lights: StreetLightConfig,

    /// 0 samples the height field directly everywhere. Otherwise, heights at street nodes are
    /// blended towards their neighbors by this factor before being applied.
    pub street_node_smoothness: f64,
    pub smoothing_iterations: usize,
    /// Length of the crossing strip at the end of a street entering a junction
    pub crossing_width: f64,
}

impl Default for MeshConfig {
    fn default() -> Self {
        MeshConfig {
            scale: 1.0,
            default_street_width: 10.0,
            default_path_width: 2.0,
            default_wall_width: 0.3,
            lane_width: 3.0,
            uv_scale: UvScale::default(),
            curb_alpha: 0.7,
            curb2_alpha: 0.9,
            street_color: Color::rgb(80, 80, 80),
            path_color: Color::rgb(160, 140, 110),
            sidewalk_color: Color::rgb(180, 180, 180),
            curb2_color: Color::rgb(90, 150, 70),
            crossing_color: Color::rgb(240, 240, 240),
            wall_color: Color::rgb(150, 120, 100),
            building_color: Color::rgb(200, 190, 170),
            water_color: Color::rgb(60, 100, 180),
            terrain_color: Color::rgb(110, 160, 80),
            driving_direction: "right".to_string(),
            layer_heights: LayerHeights::default(),
            extrude: ExtrusionConfig::default(),
            steiner: SteinerConfig::default(),
            street_lights: StreetLightConfig::default(),
            street_node_smoothness: 0.0,
            smoothing_iterations: 50,
            crossing_width: 2.0,
        }
    }
}

impl MeshConfig {
    pub fn driving_direction(&self) -> Result<DrivingDirection> {
        Ok(self.driving_direction.parse::<DrivingDirection>()?)
    }

    /// Edges shorter than this can't be meshed.
    pub fn min_edge_length(&self) -> f64 {
        0.1 * self.scale
    }

    pub fn validate(&self) -> Result<()> {
        self.driving_direction()?;
        if !(self.scale > 0.0) {
            bail!("scale must be positive, not {}", self.scale);
        }
        check_curb_alphas("(defaults)", self.curb_alpha, self.curb2_alpha)?;
        if !(0.0..=1.0).contains(&self.street_node_smoothness) {
            bail!(
                "street_node_smoothness must be in [0, 1], not {}",
                self.street_node_smoothness
            );
        }
        Ok(())
    }
}

/// How many meters one repetition of a texture covers, per kind of surface.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct UvScale {
    pub street: f64,
    pub path: f64,
    pub wall: f64,
    pub sidewalk: f64,
    pub area: f64,
}

impl Default for UvScale {
    fn default() -> Self {
        UvScale {
            street: 10.0,
            path: 4.0,
            wall: 2.0,
            sidewalk: 2.0,
            area: 20.0,
        }
    }
}

/// Maps OSM `layer` values to a height offset in meters by linear interpolation. Layers outside
/// the table's range aren't meshed at all.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LayerHeights(pub Vec<(i32, f64)>);

impl Default for LayerHeights {
    fn default() -> Self {
        LayerHeights(vec![(-2, -10.0), (0, 0.0), (2, 10.0)])
    }
}

impl LayerHeights {
    pub fn interpolate(&self, layer: i32) -> Option<f64> {
        if layer == 0 {
            return Some(0.0);
        }
        let mut table = self.0.clone();
        table.sort_by_key(|(l, _)| *l);
        for pair in table.windows(2) {
            let ((l1, h1), (l2, h2)) = (pair[0], pair[1]);
            if layer >= l1 && layer <= l2 {
                if l1 == l2 {
                    return Some(h1);
                }
                let pct = f64::from(layer - l1) / f64::from(l2 - l1);
                return Some(h1 + pct * (h2 - h1));
            }
        }
        match table.as_slice() {
            [(l, h)] if *l == layer => Some(*h),
            _ => None,
        }
    }
}

/// Heights in meters for the different kinds of side walls.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtrusionConfig {
    /// Sidewalks sit this far above the road
    pub curb: f64,
    /// Parapets along the edges of bridges
    pub air_curb: f64,
    pub wall: f64,
    /// The outer band past the sidewalk
    pub grass: f64,
    /// Water surfaces sit this far below the terrain
    pub water_floor: f64,
    /// Thickness of a bridge deck
    pub street: f64,
    /// Height of tunnel walls
    pub air_support: f64,
    pub building: f64,
}

impl Default for ExtrusionConfig {
    fn default() -> Self {
        ExtrusionConfig {
            curb: 0.15,
            air_curb: 1.0,
            wall: 2.0,
            grass: 0.05,
            water_floor: 0.5,
            street: 0.5,
            air_support: 4.5,
            building: 8.0,
        }
    }
}

/// Extra interior points for the terrain triangulator.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SteinerConfig {
    /// (distance from the road's edge, spacing along the road), both in meters. Spacing usually
    /// grows with the distance.
    pub road_curve: Vec<(f64, f64)>,
    pub wall_spacing: f64,
    pub forest_spacing: f64,
}

impl Default for SteinerConfig {
    fn default() -> Self {
        SteinerConfig {
            road_curve: vec![(1.0, 5.0), (5.0, 10.0), (20.0, 30.0)],
            wall_spacing: 5.0,
            forest_spacing: 8.0,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct StreetLightConfig {
    pub enabled: bool,
    /// Meters between lights along one side of a street
    pub spacing: f64,
    pub model: String,
}

impl Default for StreetLightConfig {
    fn default() -> Self {
        StreetLightConfig {
            enabled: false,
            spacing: 25.0,
            model: "street_light".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driving_direction() {
        assert_eq!(
            "LEFT".parse::<DrivingDirection>().unwrap(),
            DrivingDirection::Left
        );
        assert_eq!(
            "sideways".parse::<DrivingDirection>(),
            Err(MeshError::UnknownDrivingDirection("sideways".to_string()))
        );
        let cfg = MeshConfig {
            driving_direction: "sideways".to_string(),
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_layer_heights() {
        let heights = LayerHeights::default();
        assert_eq!(heights.interpolate(0), Some(0.0));
        assert_eq!(heights.interpolate(1), Some(5.0));
        assert_eq!(heights.interpolate(-2), Some(-10.0));
        assert_eq!(heights.interpolate(3), None);
        assert_eq!(LayerHeights(Vec::new()).interpolate(1), None);
    }

    #[test]
    fn test_config_from_json() {
        let cfg: MeshConfig =
            serde_json::from_str(r#"{"scale": 2.0, "extrude": {"curb": 0.2}}"#).unwrap();
        assert_eq!(cfg.scale, 2.0);
        assert_eq!(cfg.extrude.curb, 0.2);
        assert_eq!(cfg.extrude.wall, 2.0);
        assert_eq!(cfg.min_edge_length(), 0.2);
        cfg.validate().unwrap();
    }

    #[test]
    fn test_bad_curb_defaults() {
        let cfg = MeshConfig {
            curb_alpha: 0.95,
            curb2_alpha: 0.9,
            ..Default::default()
        };
        assert!(cfg.validate().is_err());
    }
}
