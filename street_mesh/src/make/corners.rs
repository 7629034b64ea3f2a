use ordered_float::NotNan;

use geom::{Pt2D, EPSILON_DIST};

use crate::make::junction::{HoleRing, NodeHoleVertex, RingRoad};
use crate::way_info::Band;

/// Fills one band between two angularly consecutive roads at a junction. Vertices go around
/// counter-clockwise.
#[derive(Clone, Debug, PartialEq)]
pub struct CornerPatch {
    pub band: Band,
    pub vertices: Vec<NodeHoleVertex>,
}

/// Between each road and the next one counter-clockwise, patches the sidewalk and outer bands.
/// Both roads' bands are cut across level with the corner where their outer edges meet, so the
/// patch runs from the corner of the level inside, along the first cut, to the outer corner,
/// and back along the second cut. Where the roads turn away from each other, the bands miter
/// and the patch has no area. A patch is also skipped when the first road deleted the band on
/// its left and the second on its right.
pub fn corner_patches(ring: &HoleRing) -> Vec<CornerPatch> {
    let roads: Vec<(NotNan<f64>, RingRoad)> = ring.roads.iter().map(|(a, r)| (*a, *r)).collect();
    let mut patches = Vec::new();
    if roads.len() < 2 {
        return patches;
    }

    for idx in 0..roads.len() {
        let (angle_i, road_i) = roads[idx];
        let (angle_j, road_j) = roads[(idx + 1) % roads.len()];
        let shared = match ring.get(angle_i, 0) {
            Some(v) => *v,
            None => continue,
        };

        // Levels with no width fall back to the level inside them
        let left_of_i = |level: i8| -> NodeHoleVertex {
            (1..=level)
                .rev()
                .find_map(|l| ring.get(angle_i, l).cloned())
                .unwrap_or(shared)
        };
        let right_of_j = |level: i8| -> NodeHoleVertex {
            (1..=level)
                .rev()
                .find_map(|l| ring.get(angle_j, -l).cloned())
                .unwrap_or(shared)
        };

        for (band_idx, band) in [Band::Sidewalk, Band::Curb2].into_iter().enumerate() {
            if road_i.deleted_left[band_idx] && road_j.deleted_right[band_idx] {
                continue;
            }
            let level = (band_idx + 1) as i8;
            let cut = |pt: Option<Pt2D>, fallback: NodeHoleVertex| -> NodeHoleVertex {
                match pt {
                    Some(pt) => NodeHoleVertex { pt, ..fallback },
                    None => fallback,
                }
            };
            let mut vertices = vec![
                left_of_i(level - 1),
                cut(road_i.left_cuts[band_idx], left_of_i(level - 1)),
                left_of_i(level),
                right_of_j(level),
                cut(road_j.right_cuts[band_idx], right_of_j(level - 1)),
                right_of_j(level - 1),
            ];
            let color = road_i.band_colors[band_idx];
            for v in &mut vertices {
                v.color = color;
                v.way = road_i.way;
            }
            if let Some(vertices) = clean_polygon(vertices) {
                patches.push(CornerPatch { band, vertices });
            }
        }
    }
    patches
}

/// Removes repeated points, then makes the winding counter-clockwise. None if fewer than 3
/// points remain or there's no area.
fn clean_polygon(input: Vec<NodeHoleVertex>) -> Option<Vec<NodeHoleVertex>> {
    let mut vertices: Vec<NodeHoleVertex> = Vec::new();
    for v in input {
        if !vertices.iter().any(|x| x.pt.approx_eq(v.pt, EPSILON_DIST)) {
            vertices.push(v);
        }
    }
    if vertices.len() < 3 {
        return None;
    }

    let pts: Vec<Pt2D> = vertices.iter().map(|v| v.pt).collect();
    let mut area = 0.0;
    for i in 0..pts.len() {
        let (p, q) = (pts[i], pts[(i + 1) % pts.len()]);
        area += p.x() * q.y() - q.x() * p.y();
    }
    if area.abs() / 2.0 < EPSILON_DIST * EPSILON_DIST {
        return None;
    }
    if area < 0.0 {
        vertices.reverse();
    }
    Some(vertices)
}
