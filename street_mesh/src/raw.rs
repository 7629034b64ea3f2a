//! The input graph, as it comes out of parsing an OSM-style vector map, and `GeoGraph`, the same
//! thing rearranged into dense arenas for the rest of the pipeline.

use std::collections::HashMap;
use std::fmt;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::Tags;
use geom::{Bounds, GPSBounds, Pt2D};

use crate::MeshError;

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeID(pub String);

impl fmt::Display for NodeID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "node {}", self.0)
    }
}

#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WayID(pub String);

impl fmt::Display for WayID {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "way {}", self.0)
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawNode {
    pub id: NodeID,
    pub pt: Pt2D,
    #[serde(default = "Tags::empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RawWay {
    pub id: WayID,
    /// Closed when the first and last node are the same
    pub nodes: Vec<NodeID>,
    #[serde(default = "Tags::empty")]
    pub tags: Tags,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct RawGraph {
    pub nodes: Vec<RawNode>,
    pub ways: Vec<RawWay>,
    /// When present, errors describe locations in longitude/latitude, and the map edge comes from
    /// here instead of the extent of the nodes.
    #[serde(default)]
    pub gps_bounds: Option<GPSBounds>,
}

impl RawGraph {
    pub fn new() -> RawGraph {
        RawGraph::default()
    }

    pub fn add_node(&mut self, id: &str, pt: Pt2D, tags: Tags) {
        self.nodes.push(RawNode {
            id: NodeID(id.to_string()),
            pt,
            tags,
        });
    }

    pub fn add_way(&mut self, id: &str, nodes: Vec<&str>, tags: Tags) {
        self.ways.push(RawWay {
            id: WayID(id.to_string()),
            nodes: nodes.into_iter().map(|n| NodeID(n.to_string())).collect(),
            tags,
        });
    }
}

/// An index into `GeoGraph::nodes`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct NodeIdx(pub usize);

/// An index into `GeoGraph::ways`
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug, Serialize, Deserialize)]
pub struct WayIdx(pub usize);

pub struct GeoNode {
    pub id: NodeID,
    pub pt: Pt2D,
    pub tags: Tags,
}

pub struct GeoWay {
    pub id: WayID,
    pub nodes: Vec<NodeIdx>,
    pub tags: Tags,
}

impl GeoWay {
    pub fn is_closed(&self) -> bool {
        self.nodes.len() >= 3 && self.nodes[0] == *self.nodes.last().unwrap()
    }

    /// Consecutive pairs of nodes
    pub fn edges(&self) -> impl Iterator<Item = (NodeIdx, NodeIdx)> + '_ {
        self.nodes.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Immutable after construction.
pub struct GeoGraph {
    pub nodes: Vec<GeoNode>,
    pub ways: Vec<GeoWay>,
    pub gps_bounds: Option<GPSBounds>,
    lookup: HashMap<NodeID, NodeIdx>,
    bounds: Bounds,
}

impl GeoGraph {
    /// Fails if a way references an undefined node or a node is defined twice.
    pub fn new(raw: RawGraph) -> Result<GeoGraph> {
        let mut nodes = Vec::new();
        let mut lookup = HashMap::new();
        let mut bounds = Bounds::new();
        for node in raw.nodes {
            let idx = NodeIdx(nodes.len());
            if lookup.insert(node.id.clone(), idx).is_some() {
                return Err(MeshError::DuplicateNode(node.id.0).into());
            }
            bounds.update(node.pt);
            nodes.push(GeoNode {
                id: node.id,
                pt: node.pt,
                tags: node.tags,
            });
        }

        let mut ways = Vec::new();
        for way in raw.ways {
            let mut indices: Vec<NodeIdx> = Vec::new();
            for id in &way.nodes {
                let idx = *lookup.get(id).ok_or_else(|| MeshError::MissingNode {
                    way: way.id.0.clone(),
                    node: id.0.clone(),
                })?;
                // Repeated nodes would make zero-length edges
                if indices.last() != Some(&idx) {
                    indices.push(idx);
                }
            }
            ways.push(GeoWay {
                id: way.id,
                nodes: indices,
                tags: way.tags,
            });
        }

        if let Some(ref gps) = raw.gps_bounds {
            bounds = gps.to_bounds();
        }

        Ok(GeoGraph {
            nodes,
            ways,
            gps_bounds: raw.gps_bounds,
            lookup,
            bounds,
        })
    }

    pub fn node(&self, idx: NodeIdx) -> &GeoNode {
        &self.nodes[idx.0]
    }

    pub fn way(&self, idx: WayIdx) -> &GeoWay {
        &self.ways[idx.0]
    }

    pub fn pt(&self, idx: NodeIdx) -> Pt2D {
        self.nodes[idx.0].pt
    }

    pub fn lookup(&self, id: &NodeID) -> Option<NodeIdx> {
        self.lookup.get(id).cloned()
    }

    pub fn all_ways(&self) -> impl Iterator<Item = (WayIdx, &GeoWay)> {
        self.ways.iter().enumerate().map(|(idx, w)| (WayIdx(idx), w))
    }

    /// The map edge
    pub fn get_bounds(&self) -> &Bounds {
        &self.bounds
    }

    /// Names a world-space point for humans, in longitude/latitude when possible.
    pub fn describe(&self, pt: Pt2D) -> String {
        match self.gps_bounds {
            Some(ref gps) => gps.convert_back(pt).to_string(),
            None => pt.to_string(),
        }
    }
}
