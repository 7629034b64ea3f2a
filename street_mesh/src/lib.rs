//! Generates 3D street geometry from a graph of tagged nodes and ways: road surfaces mitered into
//! each other, sidewalks raised on curbs, junctions closed with fans and corner patches, areas,
//! and the waypoint graphs vehicles and pedestrians route along. `StreetMesh::new` runs the whole
//! pipeline.

#[macro_use]
extern crate anyhow;
#[macro_use]
extern crate log;

mod config;
mod error;
pub mod extrude;
mod height;
mod instances;
pub mod make;
mod mesh;
mod raw;
mod way_info;
mod waypoints;

pub use crate::config::{
    DrivingDirection, ExtrusionConfig, LayerHeights, MeshConfig, SteinerConfig,
    StreetLightConfig, UvScale,
};
pub use crate::error::MeshError;
pub use crate::height::{smooth_node_heights, HeightBindings, HeightField, HeightGrid};
pub use crate::instances::{Instance, InstancePlacer, NoInstances};
pub use crate::make::{MeshStats, SteinerKind, SteinerPointInfo, StreetMesh};
pub use crate::mesh::{Color, MeshLayer, MeshList, TriangleList, Vertex};
pub use crate::raw::{
    GeoGraph, GeoNode, GeoWay, NodeID, NodeIdx, RawGraph, RawNode, RawWay, WayID, WayIdx,
};
pub use crate::way_info::{check_curb_alphas, Band, BandDeletion, RoadType, WayInfo, WayInfos};
pub use crate::waypoints::{
    StreetWayPoint, WayPointEdge, WayPointGraph, WayPointGraphs, WayPointLocation,
};
