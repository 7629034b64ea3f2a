//! Closed ways that describe a surface instead of a road: buildings, water, vegetation, and
//! pedestrian plazas.

use anyhow::Result;

use abstutil::{Tags, Timer};
use geom::{Pt2D, Ring, Tessellation, Triangle};

use crate::raw::{GeoGraph, GeoWay, WayIdx};
use crate::{Color, MeshConfig, MeshError, MeshLayer};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AreaKind {
    Building,
    Water,
    /// Forests also get tree Steiner points
    Forest,
    Grass,
    Plaza,
}

impl AreaKind {
    pub fn classify(tags: &Tags) -> Option<AreaKind> {
        if tags.contains_key("building") {
            return Some(AreaKind::Building);
        }
        if tags.is("natural", "water") || tags.contains_key("water") {
            return Some(AreaKind::Water);
        }
        if tags.is("natural", "wood") || tags.is("landuse", "forest") {
            return Some(AreaKind::Forest);
        }
        if tags.is_any("landuse", vec!["grass", "meadow"]) || tags.is("leisure", "park") {
            return Some(AreaKind::Grass);
        }
        if tags.is("area", "yes") && tags.contains_key("highway") {
            return Some(AreaKind::Plaza);
        }
        None
    }

    pub fn layer(self) -> MeshLayer {
        match self {
            AreaKind::Building => MeshLayer::Building,
            AreaKind::Water => MeshLayer::Water,
            AreaKind::Forest | AreaKind::Grass => MeshLayer::Terrain,
            AreaKind::Plaza => MeshLayer::Path,
        }
    }

    pub fn default_color(self, cfg: &MeshConfig) -> Color {
        match self {
            AreaKind::Building => cfg.building_color,
            AreaKind::Water => cfg.water_color,
            AreaKind::Forest | AreaKind::Grass => cfg.terrain_color,
            AreaKind::Plaza => cfg.path_color,
        }
    }
}

/// A triangulated area, not yet placed at any height.
#[derive(Debug)]
pub struct Area {
    pub way: WayIdx,
    pub kind: AreaKind,
    pub ring: Ring,
    pub color: Color,
    /// Counter-clockwise
    pub triangles: Vec<Triangle>,
}

/// Triangulates one area way. Ok(None) for ways that aren't areas. An open building is an error;
/// any other open area is skipped with a warning. Failing to triangulate is an error naming the
/// place it happened.
pub fn make_area(
    graph: &GeoGraph,
    idx: WayIdx,
    way: &GeoWay,
    cfg: &MeshConfig,
    timer: &mut Timer,
) -> Result<Option<Area>> {
    let kind = match AreaKind::classify(&way.tags) {
        Some(kind) => kind,
        None => {
            return Ok(None);
        }
    };
    if !way.is_closed() {
        if kind == AreaKind::Building {
            return Err(MeshError::UnclosedArea {
                way: way.id.0.clone(),
            }
            .into());
        }
        timer.warn(format!("{} isn't closed, skipping the {:?}", way.id, kind));
        return Ok(None);
    }

    let pts: Vec<Pt2D> = way.nodes.iter().map(|n| graph.pt(*n)).collect();
    let fail = |reason: String| -> anyhow::Error {
        MeshError::Triangulation {
            way: way.id.0.clone(),
            location: graph.describe(pts[0]),
            reason,
        }
        .into()
    };
    let ring = Ring::deduping_new(pts.clone()).map_err(|err| fail(err.to_string()))?;
    let tessellation = Tessellation::from_ring(&ring).map_err(|err| fail(err.to_string()))?;
    let triangles = tessellation
        .triangles()
        .into_iter()
        .map(|t| t.to_ccw())
        .filter(|t| t.signed_area() > 0.0)
        .collect();

    let color = way
        .tags
        .get("color")
        .and_then(|c| Color::parse(c))
        .unwrap_or_else(|| kind.default_color(cfg));

    Ok(Some(Area {
        way: idx,
        kind,
        ring,
        color,
        triangles,
    }))
}
