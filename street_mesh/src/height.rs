//! Binding vertex elevation to an external height field.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use geom::{HashablePt2D, Pt2D};

use crate::raw::{NodeIdx, WayIdx};

/// Anything that can report the ground's elevation. None outside of its domain.
pub trait HeightField {
    fn height(&self, pt: Pt2D) -> Option<f64>;
}

/// A regular grid of samples, bilinearly interpolated. Rows go along y, columns along x.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HeightGrid {
    pub origin: Pt2D,
    pub cell_size: f64,
    pub columns: usize,
    pub rows: usize,
    /// Row-major, `rows * columns` values
    pub values: Vec<f64>,
}

impl HeightGrid {
    pub fn flat(origin: Pt2D, cell_size: f64, columns: usize, rows: usize, z: f64) -> HeightGrid {
        HeightGrid {
            origin,
            cell_size,
            columns,
            rows,
            values: vec![z; columns * rows],
        }
    }

    fn get(&self, col: usize, row: usize) -> f64 {
        self.values[row * self.columns + col]
    }
}

impl HeightField for HeightGrid {
    fn height(&self, pt: Pt2D) -> Option<f64> {
        if self.columns < 2 || self.rows < 2 || self.values.len() != self.columns * self.rows {
            return None;
        }
        let fx = (pt.x() - self.origin.x()) / self.cell_size;
        let fy = (pt.y() - self.origin.y()) / self.cell_size;
        let max_x = (self.columns - 1) as f64;
        let max_y = (self.rows - 1) as f64;
        if !(0.0..=max_x).contains(&fx) || !(0.0..=max_y).contains(&fy) {
            return None;
        }

        let col = (fx.floor() as usize).min(self.columns - 2);
        let row = (fy.floor() as usize).min(self.rows - 2);
        let tx = fx - col as f64;
        let ty = fy - row as f64;
        let top = self.get(col, row) * (1.0 - tx) + self.get(col + 1, row) * tx;
        let bottom = self.get(col, row + 1) * (1.0 - tx) + self.get(col + 1, row + 1) * tx;
        Some(top * (1.0 - ty) + bottom * ty)
    }
}

/// Which vertices take their height from a road node instead of sampling the field themselves.
#[derive(Clone, Debug, Default)]
pub struct HeightBindings {
    vertices: HashMap<HashablePt2D, NodeIdx>,
    anchors: HashMap<HashablePt2D, NodeIdx>,
    /// Every bound node, and one of the ways it belongs to
    pub node_ways: BTreeMap<NodeIdx, WayIdx>,
}

impl HeightBindings {
    pub fn new() -> HeightBindings {
        HeightBindings::default()
    }

    /// The first binding for a position wins.
    pub fn bind(&mut self, pt: Pt2D, node: NodeIdx, way: WayIdx) {
        self.vertices.entry(pt.to_hashable()).or_insert(node);
        self.node_ways.entry(node).or_insert(way);
    }

    /// Junction centers always follow their node, even if something else bound the position first.
    pub fn anchor(&mut self, pt: Pt2D, node: NodeIdx, way: WayIdx) {
        self.anchors.insert(pt.to_hashable(), node);
        self.node_ways.entry(node).or_insert(way);
    }

    pub fn get(&self, pt: Pt2D) -> Option<NodeIdx> {
        let key = pt.to_hashable();
        self.anchors
            .get(&key)
            .or_else(|| self.vertices.get(&key))
            .cloned()
    }

    pub fn is_bound(&self, node: NodeIdx) -> bool {
        self.node_ways.contains_key(&node)
    }
}

/// Smoothed node heights along the road graph. `neighbors` lists the road neighbors of each
/// bound node; `raw` is the field sampled at each node.
pub fn smooth_node_heights(
    raw: &BTreeMap<NodeIdx, Option<f64>>,
    neighbors: &BTreeMap<NodeIdx, Vec<(NodeIdx, f64)>>,
    smoothness: f64,
    iterations: usize,
) -> BTreeMap<NodeIdx, Option<f64>> {
    let mut current = raw.clone();
    if smoothness == 0.0 {
        return current;
    }
    for _ in 0..iterations {
        let mut next = BTreeMap::new();
        for (node, h0) in raw {
            let h0 = match h0 {
                Some(h) => *h,
                None => {
                    next.insert(*node, None);
                    continue;
                }
            };
            let mut sum = 0.0;
            let mut total_weight = 0.0;
            for (other, dist) in neighbors.get(node).into_iter().flatten() {
                if let Some(Some(h)) = current.get(other) {
                    let weight = 1.0 / dist.max(geom::EPSILON_DIST);
                    sum += weight * h;
                    total_weight += weight;
                }
            }
            let h = if total_weight == 0.0 {
                h0
            } else {
                (1.0 - smoothness) * h0 + smoothness * sum / total_weight
            };
            next.insert(*node, Some(h));
        }
        current = next;
    }
    current
}
