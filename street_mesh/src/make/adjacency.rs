use std::collections::BTreeMap;

use abstutil::Timer;

use crate::raw::{GeoGraph, NodeIdx, WayIdx};
use crate::way_info::{RoadType, WayInfo, WayInfos};

/// One outgoing edge at a node.
#[derive(Clone, Debug, PartialEq)]
pub struct AngleWay {
    /// Cartesian angle from the node towards `neighbor`, in radians from `atan2`
    pub angle: f64,
    pub neighbor: NodeIdx,
    pub way: WayIdx,
    pub width: f64,
    pub lanes: usize,
    pub road_type: RoadType,
    pub layer: i32,
    /// Every undirected edge is seen twice, once from each end. Geometry is only generated from
    /// the end where this is false, which is the way's own node order.
    pub is_second_occurrence: bool,
}

/// The reverse lookup of an `AngleWay`, keyed by the neighbor.
#[derive(Clone, Debug, PartialEq)]
pub struct NeighborWay {
    pub angle: f64,
    pub width: f64,
    pub way: WayIdx,
}

/// For every node, its outgoing edges sorted counter-clockwise by angle.
pub struct AdjacencyIndex {
    angle_ways: Vec<Vec<AngleWay>>,
    neighbor_ways: Vec<BTreeMap<NodeIdx, NeighborWay>>,
}

impl AdjacencyIndex {
    /// Indexes every way whose road type passes `filter`.
    pub fn new<F: Fn(RoadType) -> bool>(
        graph: &GeoGraph,
        infos: &WayInfos,
        filter: F,
        timer: &mut Timer,
    ) -> AdjacencyIndex {
        let mut index = AdjacencyIndex {
            angle_ways: vec![Vec::new(); graph.nodes.len()],
            neighbor_ways: vec![BTreeMap::new(); graph.nodes.len()],
        };
        for (idx, way) in graph.all_ways() {
            let info = match infos.get(idx) {
                Some(info) if filter(info.road_type) => info,
                _ => continue,
            };
            for (a, b) in way.edges() {
                if index.neighbor_ways[a.0].contains_key(&b) {
                    timer.warn(format!(
                        "{} duplicates the edge between {} and {}, skipping it",
                        way.id,
                        graph.node(a).id,
                        graph.node(b).id
                    ));
                    continue;
                }
                let (pt1, pt2) = (graph.pt(a), graph.pt(b));
                if pt1.to_hashable() == pt2.to_hashable() {
                    timer.warn(format!(
                        "{} has two nodes at the same place, {} and {}",
                        way.id,
                        graph.node(a).id,
                        graph.node(b).id
                    ));
                    continue;
                }
                let angle = (pt2.y() - pt1.y()).atan2(pt2.x() - pt1.x());
                let reverse_angle = (pt1.y() - pt2.y()).atan2(pt1.x() - pt2.x());
                index.insert(a, b, angle, info, false);
                index.insert(b, a, reverse_angle, info, true);
            }
        }
        index
    }

    fn insert(
        &mut self,
        node: NodeIdx,
        neighbor: NodeIdx,
        angle: f64,
        info: &WayInfo,
        is_second_occurrence: bool,
    ) {
        let list = &mut self.angle_ways[node.0];
        // Ties keep insertion order
        let pos = list.partition_point(|aw| aw.angle <= angle);
        list.insert(
            pos,
            AngleWay {
                angle,
                neighbor,
                way: info.way,
                width: info.width,
                lanes: info.lanes,
                road_type: info.road_type,
                layer: info.layer,
                is_second_occurrence,
            },
        );
        self.neighbor_ways[node.0].insert(
            neighbor,
            NeighborWay {
                angle,
                width: info.width,
                way: info.way,
            },
        );
    }

    /// Counter-clockwise
    pub fn angle_ways(&self, node: NodeIdx) -> &[AngleWay] {
        &self.angle_ways[node.0]
    }

    pub fn neighbor_ways(&self, node: NodeIdx) -> &BTreeMap<NodeIdx, NeighborWay> {
        &self.neighbor_ways[node.0]
    }

    pub fn degree(&self, node: NodeIdx) -> usize {
        self.angle_ways[node.0].len()
    }

    pub fn is_junction(&self, node: NodeIdx) -> bool {
        self.degree(node) >= 3
    }

    pub fn get(&self, node: NodeIdx, neighbor: NodeIdx) -> Option<&AngleWay> {
        self.angle_ways[node.0]
            .iter()
            .find(|aw| aw.neighbor == neighbor)
    }

    fn position(&self, node: NodeIdx, neighbor: NodeIdx) -> Option<usize> {
        self.angle_ways[node.0]
            .iter()
            .position(|aw| aw.neighbor == neighbor)
    }

    /// Standing at `center` and looking towards `neighbor`, the edges angularly next to it: left
    /// is the next one counter-clockwise, right is the previous one. Wraps around, so a node with
    /// only one edge returns that edge for both.
    pub fn get_left_right_neighbors(
        &self,
        center: NodeIdx,
        neighbor: NodeIdx,
    ) -> Option<(&AngleWay, &AngleWay)> {
        let list = &self.angle_ways[center.0];
        let idx = self.position(center, neighbor)? as isize;
        Some((
            abstutil::wraparound_get(list, idx + 1),
            abstutil::wraparound_get(list, idx - 1),
        ))
    }

    /// Every edge exactly once, in the way's own direction.
    pub fn canonical_edges(&self) -> impl Iterator<Item = (NodeIdx, &AngleWay)> {
        self.angle_ways.iter().enumerate().flat_map(|(idx, list)| {
            list.iter()
                .filter(|aw| !aw.is_second_occurrence)
                .map(move |aw| (NodeIdx(idx), aw))
        })
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = NodeIdx> + '_ {
        (0..self.angle_ways.len())
            .map(NodeIdx)
            .filter(move |n| !self.angle_ways[n.0].is_empty())
    }
}

#[cfg(test)]
mod tests {
    use std::f64::consts::PI;

    use super::*;
    use crate::raw::RawGraph;
    use crate::MeshConfig;
    use abstutil::Tags;
    use geom::Pt2D;

    fn star() -> GeoGraph {
        let mut raw = RawGraph::new();
        let street: Tags = vec![("highway", "residential")].into_iter().collect();
        raw.add_node("c", Pt2D::new(0.0, 0.0), Tags::empty());
        raw.add_node("e", Pt2D::new(50.0, 0.0), Tags::empty());
        raw.add_node("n", Pt2D::new(0.0, 50.0), Tags::empty());
        raw.add_node("w", Pt2D::new(-50.0, 0.0), Tags::empty());
        raw.add_way("1", vec!["c", "e"], street.clone());
        raw.add_way("2", vec!["n", "c"], street.clone());
        raw.add_way("3", vec!["c", "w"], street.clone());
        // Duplicates way 1
        raw.add_way("4", vec!["e", "c"], street);
        GeoGraph::new(raw).unwrap()
    }

    fn index(graph: &GeoGraph) -> AdjacencyIndex {
        let infos = WayInfos::new(graph, &MeshConfig::default()).unwrap();
        AdjacencyIndex::new(graph, &infos, |_| true, &mut Timer::throwaway())
    }

    #[test]
    fn test_sorted_and_inverse() {
        let graph = star();
        let adj = index(&graph);
        let c = graph.lookup(&crate::raw::NodeID("c".to_string())).unwrap();
        let angles: Vec<f64> = adj.angle_ways(c).iter().map(|aw| aw.angle).collect();
        assert_eq!(angles, vec![0.0, PI / 2.0, PI]);

        for node in adj.all_nodes() {
            assert_eq!(adj.angle_ways(node).len(), adj.neighbor_ways(node).len());
            for aw in adj.angle_ways(node) {
                let back = &adj.neighbor_ways(aw.neighbor)[&node];
                let diff = (back.angle - (aw.angle + PI)).rem_euclid(2.0 * PI);
                assert!(diff < 1e-9 || (2.0 * PI - diff) < 1e-9);
                assert_eq!(back.way, aw.way);
            }
        }
        assert_eq!(adj.canonical_edges().count(), 3);
    }

    #[test]
    fn test_left_right() {
        let graph = star();
        let adj = index(&graph);
        let id = |x: &str| graph.lookup(&crate::raw::NodeID(x.to_string())).unwrap();
        let (left, right) = adj.get_left_right_neighbors(id("c"), id("e")).unwrap();
        assert_eq!(left.neighbor, id("n"));
        // Wraps around
        assert_eq!(right.neighbor, id("w"));

        let (left, right) = adj.get_left_right_neighbors(id("e"), id("c")).unwrap();
        assert_eq!(left.neighbor, id("c"));
        assert_eq!(right.neighbor, id("c"));
        assert!(adj.get_left_right_neighbors(id("e"), id("n")).is_none());
    }

    #[test]
    fn test_ties_keep_insertion_order() {
        let mut raw = RawGraph::new();
        let street: Tags = vec![("highway", "residential")].into_iter().collect();
        raw.add_node("a", Pt2D::new(0.0, 0.0), Tags::empty());
        raw.add_node("b", Pt2D::new(10.0, 0.0), Tags::empty());
        raw.add_node("c", Pt2D::new(20.0, 0.0), Tags::empty());
        raw.add_way("1", vec!["a", "c"], street.clone());
        raw.add_way("2", vec!["a", "b"], street);
        let graph = GeoGraph::new(raw).unwrap();
        let adj = index(&graph);
        let a = graph.lookup(&crate::raw::NodeID("a".to_string())).unwrap();
        let order: Vec<&str> = adj
            .angle_ways(a)
            .iter()
            .map(|aw| graph.way(aw.way).id.0.as_str())
            .collect();
        assert_eq!(order, vec!["1", "2"]);
    }
}
