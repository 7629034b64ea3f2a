use std::collections::BTreeMap;

use ordered_float::NotNan;

use geom::{Pt2D, Triangle};

use crate::raw::WayIdx;
use crate::Color;

/// Orders the vertices around a junction's hole. Level 0 is the edge of a road surface, ±1 the
/// outer edge of the sidewalk, ±2 the outer edge of the outermost band. Positive levels are on
/// the left of the road leaving the junction at `angle`, negative ones on its right.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AngleCurb {
    pub angle: NotNan<f64>,
    pub curb: i8,
}

impl AngleCurb {
    /// Angles come from `atan2` of real points, so they're never NaN.
    pub fn new(angle: f64, curb: i8) -> AngleCurb {
        AngleCurb {
            angle: NotNan::new(angle).unwrap(),
            curb,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeHoleVertex {
    pub pt: Pt2D,
    pub way: WayIdx,
    pub color: Color,
    /// Height offset of the junction, not counting any band's raise
    pub z: f64,
}

/// What a road contributes to the ring, besides its vertices.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RingRoad {
    pub way: WayIdx,
    pub curb_alpha: f64,
    /// Per band (sidewalk, outer), whether it's deleted on the left and right of the road
    /// leaving the junction
    pub deleted_left: [bool; 2],
    pub deleted_right: [bool; 2],
    pub band_colors: [Color; 2],
    /// Per band, where its inner edge was cut across on the left and right. None for a band
    /// with no width.
    pub left_cuts: [Option<Pt2D>; 2],
    pub right_cuts: [Option<Pt2D>; 2],
}

/// Everything known about the hole in the middle of one junction.
#[derive(Clone, Debug, Default)]
pub struct HoleRing {
    pub vertices: BTreeMap<AngleCurb, NodeHoleVertex>,
    pub roads: BTreeMap<NotNan<f64>, RingRoad>,
}

impl HoleRing {
    /// The first vertex registered for a key wins.
    pub fn insert(&mut self, key: AngleCurb, vertex: NodeHoleVertex) {
        self.vertices.entry(key).or_insert(vertex);
    }

    pub fn add_road(&mut self, angle: f64, road: RingRoad) {
        self.roads.entry(AngleCurb::new(angle, 0).angle).or_insert(road);
    }

    pub fn get(&self, angle: NotNan<f64>, curb: i8) -> Option<&NodeHoleVertex> {
        self.vertices.get(&AngleCurb { angle, curb })
    }

    /// The road surface's corners, counter-clockwise
    pub fn surface_vertices(&self) -> Vec<NodeHoleVertex> {
        self.vertices
            .iter()
            .filter(|(k, _)| k.curb == 0)
            .map(|(_, v)| *v)
            .collect()
    }
}

/// A triangle closing the hole, with its color and height offset per corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FanTriangle {
    pub corners: [NodeHoleVertex; 3],
}

/// The centroid, when a fan was needed, plus the triangles. A ring with fewer than 3 surface
/// vertices produces nothing. Exactly 3 from roads without sidewalks make one triangle;
/// otherwise, every consecutive pair of surface vertices makes a triangle with the centroid.
pub fn close_hole(ring: &HoleRing) -> (Option<NodeHoleVertex>, Vec<FanTriangle>) {
    let surface = ring.surface_vertices();
    if surface.len() < 3 {
        return (None, Vec::new());
    }

    let no_sidewalks = ring.roads.values().all(|r| r.curb_alpha == 1.0);
    if surface.len() == 3 && no_sidewalks {
        let tri = orient([surface[0], surface[1], surface[2]]);
        return (None, tri.into_iter().collect());
    }

    let pts: Vec<Pt2D> = surface.iter().map(|v| v.pt).collect();
    let colors: Vec<Color> = surface.iter().map(|v| v.color).collect();
    let centroid = NodeHoleVertex {
        pt: Pt2D::center(&pts),
        way: surface[0].way,
        color: Color::mean(&colors),
        z: surface.iter().map(|v| v.z).sum::<f64>() / (surface.len() as f64),
    };
    let mut triangles = Vec::new();
    for (idx, v1) in surface.iter().enumerate() {
        let v2 = surface[(idx + 1) % surface.len()];
        if let Some(tri) = orient([centroid, *v1, v2]) {
            triangles.push(tri);
        }
    }
    (Some(centroid), triangles)
}

/// Counter-clockwise, or None if there's no area.
fn orient(corners: [NodeHoleVertex; 3]) -> Option<FanTriangle> {
    let tri = Triangle {
        pt1: corners[0].pt,
        pt2: corners[1].pt,
        pt3: corners[2].pt,
    };
    let area = tri.signed_area();
    if area.abs() < geom::EPSILON_DIST * geom::EPSILON_DIST {
        return None;
    }
    if area > 0.0 {
        Some(FanTriangle { corners })
    } else {
        Some(FanTriangle {
            corners: [corners[0], corners[2], corners[1]],
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vertex(x: f64, y: f64) -> NodeHoleVertex {
        NodeHoleVertex {
            pt: Pt2D::new(x, y),
            way: WayIdx(0),
            color: Color::WHITE,
            z: 0.0,
        }
    }

    fn road(curb_alpha: f64) -> RingRoad {
        RingRoad {
            way: WayIdx(0),
            curb_alpha,
            deleted_left: [false; 2],
            deleted_right: [false; 2],
            band_colors: [Color::WHITE; 2],
            left_cuts: [None; 2],
            right_cuts: [None; 2],
        }
    }

    fn ring(curb_alpha: f64, pts: Vec<(f64, f64)>) -> HoleRing {
        let mut ring = HoleRing::default();
        for (idx, (x, y)) in pts.into_iter().enumerate() {
            let angle = idx as f64;
            ring.insert(AngleCurb::new(angle, 0), vertex(x, y));
            ring.insert(AngleCurb::new(angle, 1), vertex(x * 2.0, y * 2.0));
            ring.add_road(angle, road(curb_alpha));
        }
        ring
    }

    #[test]
    fn test_single_triangle() {
        let ring = ring(1.0, vec![(1.0, 0.0), (0.0, 1.0), (-1.0, -1.0)]);
        let (centroid, triangles) = close_hole(&ring);
        assert!(centroid.is_none());
        assert_eq!(triangles.len(), 1);
    }

    #[test]
    fn test_fan() {
        let ring = ring(0.5, vec![(1.0, 0.0), (0.0, 1.0), (-1.0, 0.0), (0.0, -1.0)]);
        let (centroid, triangles) = close_hole(&ring);
        let centroid = centroid.unwrap();
        assert_eq!(centroid.pt, Pt2D::new(0.0, 0.0));
        assert_eq!(triangles.len(), 4);
        let surface = ring.surface_vertices();
        for tri in &triangles {
            for corner in &tri.corners {
                assert!(*corner == centroid || surface.contains(corner));
            }
        }
    }

    #[test]
    fn test_too_small() {
        let ring = ring(1.0, vec![(1.0, 0.0), (0.0, 1.0)]);
        let (centroid, triangles) = close_hole(&ring);
        assert!(centroid.is_none());
        assert!(triangles.is_empty());
    }

    #[test]
    fn test_first_vertex_wins() {
        let mut ring = HoleRing::default();
        ring.insert(AngleCurb::new(0.5, 0), vertex(1.0, 0.0));
        ring.insert(AngleCurb::new(0.5, 0), vertex(2.0, 0.0));
        assert_eq!(ring.vertices.len(), 1);
        assert_eq!(ring.surface_vertices()[0].pt, Pt2D::new(1.0, 0.0));
    }
}
