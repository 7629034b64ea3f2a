use anyhow::Result;
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, Value};

use abstutil::Timer;
use geom::{GPSBounds, Pt2D};
use street_mesh::{NoInstances, StreetMesh};

use crate::build::load_inputs;

pub fn run(graph_path: String, config_path: Option<String>, output_path: String) -> Result<()> {
    let mut timer = Timer::new(&format!("mesh {} to GeoJSON", graph_path));
    let (raw, cfg) = load_inputs(&graph_path, config_path)?;
    let gps_bounds = raw.gps_bounds.clone();
    let mesh = StreetMesh::new(raw, &cfg, None, &mut NoInstances, &mut timer)?;

    let mut features = Vec::new();
    for (layer, list) in mesh.meshes.iter() {
        for tri in &list.triangles {
            let mut ring: Vec<Vec<f64>> = tri
                .iter()
                .map(|v| position(v.pt2d(), gps_bounds.as_ref()))
                .collect();
            ring.push(ring[0].clone());

            let mut properties = serde_json::Map::new();
            properties.insert("layer".to_string(), layer.to_string().into());
            properties.insert("color".to_string(), tri[0].color.as_hex().into());
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::Polygon(vec![ring]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }
    for (location, graph) in mesh.waypoints.iter() {
        for (from, to, edge) in graph.edges() {
            let mut properties = serde_json::Map::new();
            properties.insert("waypoints".to_string(), format!("{:?}", location).into());
            properties.insert("cost".to_string(), edge.cost.into());
            features.push(Feature {
                bbox: None,
                geometry: Some(Geometry::new(Value::LineString(vec![
                    position(from.to_2d(), gps_bounds.as_ref()),
                    position(to.to_2d(), gps_bounds.as_ref()),
                ]))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            });
        }
    }

    let num_features = features.len();
    let gj = GeoJson::FeatureCollection(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    });
    fs_err::write(&output_path, gj.to_string())?;
    info!("Wrote {} features to {}", num_features, output_path);
    Ok(())
}

/// Longitude and latitude when the graph knows where it is, otherwise world-space.
fn position(pt: Pt2D, gps_bounds: Option<&GPSBounds>) -> Vec<f64> {
    match gps_bounds {
        Some(gps) => {
            let lonlat = gps.convert_back(pt);
            vec![lonlat.longitude, lonlat.latitude]
        }
        None => vec![pt.x(), pt.y()],
    }
}
