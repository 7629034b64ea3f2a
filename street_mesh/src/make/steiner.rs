use serde::{Deserialize, Serialize};

use geom::{Line, Pt2D, Ring};

/// Why a Steiner point exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SteinerKind {
    /// Keeps the terrain dense close to roads
    RoadDistance,
    /// On the outline of a forest
    Forest,
    Wall,
    /// Somewhere inside a forest
    Tree,
}

/// An extra point for the terrain triangulator.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SteinerPointInfo {
    pub pt: Pt2D,
    pub kind: SteinerKind,
}

/// Samples both sides of a road edge. Each (distance from the road's edge, spacing along it)
/// pair of `curve` makes one row of points per side.
pub fn road_samples(
    line: &Line,
    half_width: f64,
    curve: &[(f64, f64)],
    scale: f64,
) -> Vec<SteinerPointInfo> {
    let mut results = Vec::new();
    for (dist, spacing) in curve {
        let step = spacing * scale;
        if step <= 0.0 {
            continue;
        }
        let offset = half_width + dist * scale;
        for shifted in [line.shift_left(offset), line.shift_left(-offset)] {
            for pt in spaced_along(&shifted, step) {
                results.push(SteinerPointInfo {
                    pt,
                    kind: SteinerKind::RoadDistance,
                });
            }
        }
    }
    results
}

pub fn wall_samples(line: &Line, spacing: f64) -> Vec<SteinerPointInfo> {
    if spacing <= 0.0 {
        return Vec::new();
    }
    spaced_along(line, spacing)
        .into_iter()
        .map(|pt| SteinerPointInfo {
            pt,
            kind: SteinerKind::Wall,
        })
        .collect()
}

/// The outline, and a grid of trees inside.
pub fn forest_samples(ring: &Ring, spacing: f64) -> Vec<SteinerPointInfo> {
    let mut results = Vec::new();
    if spacing <= 0.0 {
        return results;
    }
    for pt in ring.sample_perimeter(spacing) {
        results.push(SteinerPointInfo {
            pt,
            kind: SteinerKind::Forest,
        });
    }

    let bounds = ring.get_bounds();
    let mut y = bounds.min_y + spacing / 2.0;
    while y < bounds.max_y {
        let mut x = bounds.min_x + spacing / 2.0;
        while x < bounds.max_x {
            let pt = Pt2D::new(x, y);
            if ring.contains_pt(pt) {
                results.push(SteinerPointInfo {
                    pt,
                    kind: SteinerKind::Tree,
                });
            }
            x += spacing;
        }
        y += spacing;
    }
    results
}

/// Includes the start, but not the end, which is the start of the next edge.
fn spaced_along(line: &Line, step: f64) -> Vec<Pt2D> {
    let n = (line.length() / step).ceil().max(1.0) as usize;
    (0..n)
        .map(|i| line.percent_along((i as f64) / (n as f64)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_road_samples() {
        let line = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(20.0, 0.0));
        let samples = road_samples(&line, 5.0, &[(1.0, 5.0), (10.0, 10.0)], 1.0);
        // 4 per side for the near row, 2 per side for the far one
        assert_eq!(samples.len(), 12);
        assert!(samples
            .iter()
            .all(|s| s.pt.y().abs() == 6.0 || s.pt.y().abs() == 15.0));
    }

    #[test]
    fn test_forest() {
        let ring = Ring::deduping_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(20.0, 0.0),
            Pt2D::new(20.0, 20.0),
            Pt2D::new(0.0, 20.0),
        ])
        .unwrap();
        let samples = forest_samples(&ring, 10.0);
        let trees = samples
            .iter()
            .filter(|s| s.kind == SteinerKind::Tree)
            .count();
        assert_eq!(trees, 4);
        assert_eq!(samples.len() - trees, 8);
    }
}
