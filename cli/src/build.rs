use std::collections::BTreeMap;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

use abstutil::Timer;
use geom::Pt3D;
use street_mesh::{
    HeightField, HeightGrid, Instance, MeshConfig, MeshList, MeshStats, RawGraph,
    SteinerPointInfo, StreetMesh, WayPointEdge, WayPointLocation,
};

#[derive(Serialize)]
struct Output {
    meshes: MeshList,
    waypoints: BTreeMap<WayPointLocation, Vec<(Pt3D, Pt3D, WayPointEdge)>>,
    steiner_points: Vec<SteinerPointInfo>,
    instances: Vec<Instance>,
    stats: MeshStats,
}

pub fn run(
    graph_path: String,
    config_path: Option<String>,
    heights_path: Option<String>,
    output_path: String,
) -> Result<()> {
    let mut timer = Timer::new(&format!("mesh {}", graph_path));
    let (raw, cfg) = load_inputs(&graph_path, config_path)?;
    let heights: Option<HeightGrid> = match heights_path {
        Some(path) => Some(read_json(&path)?),
        None => None,
    };

    let mut instances: Vec<Instance> = Vec::new();
    let mesh = StreetMesh::new(
        raw,
        &cfg,
        heights.as_ref().map(|h| h as &dyn HeightField),
        &mut instances,
        &mut timer,
    )?;

    let waypoints = mesh
        .waypoints
        .iter()
        .map(|(location, graph)| {
            let edges = graph
                .edges()
                .map(|(from, to, edge)| (from, to, *edge))
                .collect();
            (*location, edges)
        })
        .collect();
    let output = Output {
        meshes: mesh.meshes,
        waypoints,
        steiner_points: mesh.steiner_points,
        instances,
        stats: mesh.stats,
    };
    timer.start("write output");
    let file = fs_err::File::create(&output_path)?;
    serde_json::to_writer(std::io::BufWriter::new(file), &output)?;
    timer.stop("write output");
    info!("Wrote {}", output_path);
    Ok(())
}

/// The road graph, and the config, falling back to defaults.
pub fn load_inputs(graph_path: &str, config_path: Option<String>) -> Result<(RawGraph, MeshConfig)> {
    let raw: RawGraph = read_json(graph_path)?;
    let cfg = match config_path {
        Some(path) => read_json(&path)?,
        None => MeshConfig::default(),
    };
    Ok((raw, cfg))
}

fn read_json<T: DeserializeOwned>(path: &str) -> Result<T> {
    let contents = fs_err::read_to_string(path)?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path))
}
