use std::collections::{BTreeMap, HashMap};

use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::{EdgeRef, IntoEdgeReferences};
use serde::{Deserialize, Serialize};

use geom::{HashablePt3D, Pt3D};

/// Who gets to use a waypoint graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum WayPointLocation {
    /// Vehicle lanes on streets
    Street,
    /// Sidewalks and paths
    Sidewalk,
    /// Racing lines, following the way's nodes exactly
    Explicit,
}

/// One lane segment. `alpha` is the slice of the cross-section the lane occupies, in the way's own
/// direction: for street lanes, (0, 1) spans the road surface from the right curb to the left
/// one. Sidewalks use fractions of the half-width instead, negated on the right side.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StreetWayPoint {
    pub alpha: (f64, f64),
    pub from: Pt3D,
    pub to: Pt3D,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WayPointEdge {
    pub alpha: (f64, f64),
    /// Length in world-space
    pub cost: f64,
}

/// A routable graph of 3D points. Points that coincide exactly are the same node.
#[derive(Clone, Default)]
pub struct WayPointGraph {
    graph: StableDiGraph<Pt3D, WayPointEdge>,
    lookup: HashMap<HashablePt3D, NodeIndex>,
}

impl WayPointGraph {
    pub fn new() -> WayPointGraph {
        WayPointGraph::default()
    }

    pub fn add_node(&mut self, pt: Pt3D) -> NodeIndex {
        if let Some(idx) = self.lookup.get(&pt.to_hashable()) {
            return *idx;
        }
        let idx = self.graph.add_node(pt);
        self.lookup.insert(pt.to_hashable(), idx);
        idx
    }

    /// Doesn't add the same directed edge twice. Degenerate edges are ignored.
    pub fn add_waypoint(&mut self, wp: StreetWayPoint, bidirectional: bool) {
        if wp.from.to_hashable() == wp.to.to_hashable() {
            return;
        }
        let from = self.add_node(wp.from);
        let to = self.add_node(wp.to);
        let cost = wp.from.dist_to(wp.to);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(
                from,
                to,
                WayPointEdge {
                    alpha: wp.alpha,
                    cost,
                },
            );
        }
        if bidirectional && self.graph.find_edge(to, from).is_none() {
            self.graph.add_edge(
                to,
                from,
                WayPointEdge {
                    alpha: wp.alpha,
                    cost,
                },
            );
        }
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn contains(&self, pt: Pt3D) -> bool {
        self.lookup.contains_key(&pt.to_hashable())
    }

    pub fn has_edge(&self, from: Pt3D, to: Pt3D) -> bool {
        match (
            self.lookup.get(&from.to_hashable()),
            self.lookup.get(&to.to_hashable()),
        ) {
            (Some(a), Some(b)) => self.graph.find_edge(*a, *b).is_some(),
            _ => false,
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = Pt3D> + '_ {
        self.graph.node_indices().map(move |idx| self.graph[idx])
    }

    pub fn edges(&self) -> impl Iterator<Item = (Pt3D, Pt3D, &WayPointEdge)> + '_ {
        self.graph
            .edge_references()
            .map(move |e| (self.graph[e.source()], self.graph[e.target()], e.weight()))
    }

    /// Moves every node, then recalculates edge costs. Nodes mapped to None are removed along
    /// with their edges.
    pub fn update_positions<F: FnMut(Pt3D) -> Option<Pt3D>>(&mut self, mut f: F) {
        let indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        for idx in indices {
            match f(self.graph[idx]) {
                Some(pt) => {
                    self.graph[idx] = pt;
                }
                None => {
                    self.graph.remove_node(idx);
                }
            }
        }

        let edges: Vec<_> = self.graph.edge_indices().collect();
        for e in edges {
            if let Some((a, b)) = self.graph.edge_endpoints(e) {
                let cost = self.graph[a].dist_to(self.graph[b]);
                self.graph[e].cost = cost;
            }
        }

        self.lookup = self
            .graph
            .node_indices()
            .map(|idx| (self.graph[idx].to_hashable(), idx))
            .collect();
    }

    /// The cheapest route between two existing points, with its total cost.
    pub fn pathfind(&self, from: Pt3D, to: Pt3D) -> Option<(f64, Vec<Pt3D>)> {
        let start = *self.lookup.get(&from.to_hashable())?;
        let goal = *self.lookup.get(&to.to_hashable())?;
        let (cost, path) = petgraph::algo::astar(
            &self.graph,
            start,
            |n| n == goal,
            |e| e.weight().cost,
            |n| self.graph[n].dist_to(to),
        )?;
        Some((cost, path.into_iter().map(|n| self.graph[n]).collect()))
    }
}

/// One graph per location.
#[derive(Clone, Default)]
pub struct WayPointGraphs {
    graphs: BTreeMap<WayPointLocation, WayPointGraph>,
}

impl WayPointGraphs {
    pub fn new() -> WayPointGraphs {
        WayPointGraphs::default()
    }

    /// Empty if nothing was ever added for this location.
    pub fn get(&self, location: WayPointLocation) -> Option<&WayPointGraph> {
        self.graphs.get(&location)
    }

    pub fn get_mut(&mut self, location: WayPointLocation) -> &mut WayPointGraph {
        self.graphs
            .entry(location)
            .or_insert_with(WayPointGraph::new)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&WayPointLocation, &WayPointGraph)> {
        self.graphs.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&WayPointLocation, &mut WayPointGraph)> {
        self.graphs.iter_mut()
    }

    pub fn edge_count(&self, location: WayPointLocation) -> usize {
        self.get(location).map(|g| g.edge_count()).unwrap_or(0)
    }
}
