use abstutil::{Tags, Timer};
use geom::{Pt2D, Pt3D};
use street_mesh::{
    HeightField, HeightGrid, Instance, MeshConfig, MeshLayer, NoInstances, RawGraph, StreetMesh,
    WayPointLocation,
};

fn tags(kv: Vec<(&str, &str)>) -> Tags {
    kv.into_iter().collect()
}

fn plain_street() -> Tags {
    tags(vec![
        ("highway", "residential"),
        ("width", "10"),
        ("lanes", "2"),
        ("curb_alpha", "1"),
        ("curb2_alpha", "1"),
    ])
}

fn build(raw: RawGraph, cfg: &MeshConfig, heights: Option<&dyn HeightField>) -> StreetMesh {
    StreetMesh::new(raw, cfg, heights, &mut NoInstances, &mut Timer::throwaway()).unwrap()
}

fn straight_street() -> RawGraph {
    let mut raw = RawGraph::new();
    raw.add_node("a", Pt2D::new(0.0, 0.0), Tags::empty());
    raw.add_node("b", Pt2D::new(100.0, 0.0), Tags::empty());
    raw.add_way("street", vec!["a", "b"], plain_street());
    raw
}

#[test]
fn single_street_is_one_quad() {
    let mesh = build(straight_street(), &MeshConfig::default(), None);

    let street = mesh.meshes.get(MeshLayer::Street);
    assert_eq!(street.len(), 2);
    let mut corners: Vec<(f64, f64)> = street
        .vertices()
        .map(|v| (v.pos.x, v.pos.y))
        .collect();
    corners.sort_by(|a, b| a.partial_cmp(b).unwrap());
    corners.dedup();
    assert_eq!(
        corners,
        vec![(0.0, -5.0), (0.0, 5.0), (100.0, -5.0), (100.0, 5.0)]
    );

    // No junctions, sidewalks, or side walls
    assert_eq!(mesh.stats.junction_triangles, 0);
    assert_eq!(mesh.meshes.total_triangles(), 2);
    assert_eq!(mesh.waypoints.edge_count(WayPointLocation::Street), 2);
    assert_eq!(mesh.waypoints.edge_count(WayPointLocation::Sidewalk), 0);
}

#[test]
fn three_way_junction_without_sidewalks() {
    let mut raw = RawGraph::new();
    raw.add_node("center", Pt2D::new(0.0, 0.0), Tags::empty());
    raw.add_node("east", Pt2D::new(50.0, 0.0), Tags::empty());
    raw.add_node("north", Pt2D::new(0.0, 50.0), Tags::empty());
    raw.add_node("southwest", Pt2D::new(-40.0, -40.0), Tags::empty());
    for end in ["east", "north", "southwest"] {
        raw.add_way(end, vec!["center", end], plain_street());
    }
    let mesh = build(raw, &MeshConfig::default(), None);

    assert_eq!(mesh.stats.skipped_edges, 0);
    assert_eq!(mesh.stats.junctions, 1);
    assert_eq!(mesh.stats.junction_triangles, 1);
    assert_eq!(mesh.stats.corner_patches, 0);
    assert_eq!(mesh.meshes.get(MeshLayer::Street).len(), 3 * 2 + 1);
    assert!(mesh.meshes.get(MeshLayer::Sidewalk).is_empty());

    // The three edges are connected through the junction, without U-turns
    let lanes = mesh.waypoints.get(WayPointLocation::Street).unwrap();
    assert_eq!(lanes.edge_count(), 3 * 2 + 3 * 2);
}

/// Streets from the origin out to each end, with the default sidewalks.
fn sidewalked_junction(ends: Vec<(&str, f64, f64)>) -> RawGraph {
    let mut raw = RawGraph::new();
    raw.add_node("center", Pt2D::new(0.0, 0.0), Tags::empty());
    for (id, x, y) in ends {
        raw.add_node(id, Pt2D::new(x, y), Tags::empty());
        raw.add_way(
            id,
            vec!["center", id],
            tags(vec![("highway", "residential"), ("width", "14")]),
        );
    }
    raw
}

/// True when two triangles share more than an edge or a corner.
fn interiors_overlap(t1: [Pt2D; 3], t2: [Pt2D; 3]) -> bool {
    for tri in [t1, t2] {
        for i in 0..3 {
            let (p, q) = (tri[i], tri[(i + 1) % 3]);
            let axis = (p.y() - q.y(), q.x() - p.x());
            let len = (axis.0 * axis.0 + axis.1 * axis.1).sqrt();
            if len == 0.0 {
                continue;
            }
            let project = |t: [Pt2D; 3]| {
                let vals = t.map(|pt| (pt.x() * axis.0 + pt.y() * axis.1) / len);
                (
                    vals.iter().cloned().fold(f64::MAX, f64::min),
                    vals.iter().cloned().fold(f64::MIN, f64::max),
                )
            };
            let ((min1, max1), (min2, max2)) = (project(t1), project(t2));
            if max1.min(max2) - min1.max(min2) <= 1e-6 {
                return false;
            }
        }
    }
    true
}

fn check_sidewalked_junction(mesh: &StreetMesh) {
    assert_eq!(mesh.stats.skipped_edges, 0);
    assert_eq!(mesh.stats.extrusion_failures, 0);
    assert!(!mesh.meshes.get(MeshLayer::Curb).is_empty());
    assert!(!mesh.meshes.get(MeshLayer::Extrusion).is_empty());

    for layer in [MeshLayer::Sidewalk, MeshLayer::Curb2] {
        let triangles: Vec<[Pt2D; 3]> = mesh
            .meshes
            .get(layer)
            .triangles
            .iter()
            .map(|tri| tri.map(|v| v.pt2d()))
            .collect();
        for (i, t1) in triangles.iter().enumerate() {
            for t2 in &triangles[i + 1..] {
                assert!(
                    !interiors_overlap(*t1, *t2),
                    "{} triangles overlap: {:?} and {:?}",
                    layer,
                    t1,
                    t2
                );
            }
        }
    }
}

#[test]
fn four_way_junction_with_sidewalks() {
    let raw = sidewalked_junction(vec![
        ("east", 50.0, 0.0),
        ("north", 0.0, 50.0),
        ("west", -50.0, 0.0),
        ("south", 0.0, -50.0),
    ]);
    let mesh = build(raw, &MeshConfig::default(), None);
    check_sidewalked_junction(&mesh);
    // The sidewalk and outer band around each corner
    assert_eq!(mesh.stats.corner_patches, 4 * 2);
    // Each road has both bands on both sides, and each patch is a quad
    assert_eq!(mesh.meshes.get(MeshLayer::Sidewalk).len(), 4 * 2 * 2 + 4 * 2);

    // The sidewalks meet at (6.3, 6.3), and the patch fills the square inside that
    let sidewalk = mesh.meshes.get(MeshLayer::Sidewalk);
    assert!(sidewalk
        .vertices()
        .any(|v| v.pt2d().approx_eq(Pt2D::new(6.3, 6.3), 1e-6)));
    assert!(sidewalk
        .vertices()
        .any(|v| v.pt2d().approx_eq(Pt2D::new(6.3, 4.9), 1e-6)));
}

#[test]
fn three_way_junction_with_sidewalks() {
    let raw = sidewalked_junction(vec![
        ("east", 50.0, 0.0),
        ("north", 0.0, 50.0),
        ("west", -50.0, 0.0),
    ]);
    let mesh = build(raw, &MeshConfig::default(), None);
    check_sidewalked_junction(&mesh);
    // Only the two corners on the north side need patches; the south side runs straight on
    assert_eq!(mesh.stats.corner_patches, 2 * 2);
}

#[test]
fn bridges_rise_above_the_ground() {
    let mut raw = RawGraph::new();
    for (id, x) in [("a", 0.0), ("b", 50.0), ("c", 100.0), ("d", 150.0)] {
        raw.add_node(id, Pt2D::new(x, 0.0), Tags::empty());
    }
    raw.add_way("approach", vec!["a", "b"], plain_street());
    let mut bridge = plain_street();
    bridge.insert("layer", "1");
    raw.add_way("bridge", vec!["b", "c"], bridge);
    raw.add_way("exit", vec!["c", "d"], plain_street());
    let cfg = MeshConfig::default();
    let mesh = build(raw, &cfg, None);
    let height = cfg.layer_heights.interpolate(1).unwrap();
    assert!(height > 0.0);

    // The bridge is level, and the roads on either side ramp up to it
    for v in mesh.meshes.get(MeshLayer::Street).vertices() {
        if v.pos.x >= 50.0 && v.pos.x <= 100.0 {
            assert_eq!(v.pos.z, height);
        } else {
            assert_eq!(v.pos.z, 0.0);
        }
    }

    // A deck on all four sides, and parapets only along the two long sides
    assert_eq!(mesh.stats.extrusion_failures, 0);
    let extrusion = mesh.meshes.get(MeshLayer::Extrusion);
    assert_eq!(extrusion.len(), 4 * 2 + 2 * 2);
    let top = extrusion.vertices().map(|v| v.pos.z).fold(f64::MIN, f64::max);
    assert_eq!(top, height + cfg.extrude.air_curb);
}

#[test]
fn driving_direction_picks_the_lane_side() {
    let mut cfg = MeshConfig::default();
    cfg.driving_direction = "right".to_string();
    let right = build(straight_street(), &cfg, None);
    let lanes = right.waypoints.get(WayPointLocation::Street).unwrap();
    assert!(lanes.has_edge(Pt3D::new(0.0, -2.5, 0.0), Pt3D::new(100.0, -2.5, 0.0)));
    assert!(lanes.has_edge(Pt3D::new(100.0, 2.5, 0.0), Pt3D::new(0.0, 2.5, 0.0)));

    cfg.driving_direction = "left".to_string();
    let left = build(straight_street(), &cfg, None);
    let lanes = left.waypoints.get(WayPointLocation::Street).unwrap();
    assert!(lanes.has_edge(Pt3D::new(0.0, 2.5, 0.0), Pt3D::new(100.0, 2.5, 0.0)));
    assert!(lanes.has_edge(Pt3D::new(100.0, -2.5, 0.0), Pt3D::new(0.0, -2.5, 0.0)));
    assert!(!lanes.has_edge(Pt3D::new(0.0, -2.5, 0.0), Pt3D::new(100.0, -2.5, 0.0)));
    assert_eq!(lanes.edge_count(), 2);
}

#[test]
fn unknown_driving_direction_fails() {
    let mut cfg = MeshConfig::default();
    cfg.driving_direction = "sideways".to_string();
    let result = StreetMesh::new(
        straight_street(),
        &cfg,
        None,
        &mut NoInstances,
        &mut Timer::throwaway(),
    );
    assert!(result.is_err());
}

#[test]
fn uncovered_vertices_are_excised() {
    let mut raw = RawGraph::new();
    raw.add_node("a", Pt2D::new(0.0, 0.0), Tags::empty());
    raw.add_node("b", Pt2D::new(50.0, 0.0), Tags::empty());
    raw.add_node("c", Pt2D::new(100.0, 0.0), Tags::empty());
    raw.add_way("street", vec!["a", "b", "c"], plain_street());
    // Covers x in [-10, 80]
    let grid = HeightGrid::flat(Pt2D::new(-10.0, -10.0), 10.0, 10, 3, 5.0);
    let mesh = build(raw, &MeshConfig::default(), Some(&grid));

    let street = mesh.meshes.get(MeshLayer::Street);
    assert_eq!(street.len(), 2);
    assert_eq!(mesh.stats.excised_triangles, 2);
    for v in street.vertices() {
        assert!(v.pos.x <= 50.0);
        assert_eq!(v.pos.z, 5.0);
    }

    let lanes = mesh.waypoints.get(WayPointLocation::Street).unwrap();
    assert!(lanes.nodes().all(|pt| pt.x <= 50.0 && pt.z == 5.0));
    assert_eq!(lanes.edge_count(), 2);
}

#[test]
fn sidewalks_are_raised_and_curbed() {
    let mut raw = RawGraph::new();
    raw.add_node("a", Pt2D::new(0.0, 0.0), Tags::empty());
    raw.add_node("b", Pt2D::new(100.0, 0.0), Tags::empty());
    raw.add_way(
        "street",
        vec!["a", "b"],
        tags(vec![
            ("highway", "residential"),
            ("width", "20"),
            ("curb_alpha", "0.5"),
            ("curb2_alpha", "1"),
            ("curb_delete_right", "yes"),
        ]),
    );
    let cfg = MeshConfig::default();
    let mesh = build(raw, &cfg, None);

    let sidewalk = mesh.meshes.get(MeshLayer::Sidewalk);
    // Only the left side survives
    assert_eq!(sidewalk.len(), 2);
    for v in sidewalk.vertices() {
        assert!(v.pos.y >= 5.0 && v.pos.y <= 10.0);
        assert_eq!(v.pos.z, cfg.extrude.curb);
    }
    // The long sides get curbs; the ends are dead ends on the edge of the map, so they don't
    assert_eq!(mesh.meshes.get(MeshLayer::Curb).len(), 4);
    assert_eq!(mesh.waypoints.edge_count(WayPointLocation::Sidewalk), 2);
}

#[test]
fn models_replace_geometry() {
    let mut raw = RawGraph::new();
    raw.add_node("a", Pt2D::new(0.0, 0.0), Tags::empty());
    raw.add_node("b", Pt2D::new(100.0, 0.0), Tags::empty());
    let mut street = plain_street();
    street.insert("model", "bridge_42");
    raw.add_way("street", vec!["a", "b"], street);

    let mut placed: Vec<Instance> = Vec::new();
    let mesh = StreetMesh::new(
        raw,
        &MeshConfig::default(),
        None,
        &mut placed,
        &mut Timer::throwaway(),
    )
    .unwrap();
    assert_eq!(mesh.meshes.total_triangles(), 0);
    assert_eq!(placed.len(), 1);
    assert_eq!(placed[0].model, "bridge_42");
    assert_eq!(placed[0].pos, Pt3D::new(50.0, 0.0, 0.0));
}

#[test]
fn buildings_must_be_closed() {
    let mut raw = straight_street();
    raw.add_node("c", Pt2D::new(0.0, 20.0), Tags::empty());
    raw.add_node("d", Pt2D::new(10.0, 20.0), Tags::empty());
    raw.add_node("e", Pt2D::new(10.0, 30.0), Tags::empty());
    raw.add_way("house", vec!["c", "d", "e"], tags(vec![("building", "yes")]));
    let result = StreetMesh::new(
        raw,
        &MeshConfig::default(),
        None,
        &mut NoInstances,
        &mut Timer::throwaway(),
    );
    let err = result.err().unwrap();
    assert_eq!(
        err.downcast_ref::<street_mesh::MeshError>(),
        Some(&street_mesh::MeshError::UnclosedArea {
            way: "house".to_string()
        })
    );
}

#[test]
fn closed_buildings_get_walls() {
    let mut raw = straight_street();
    raw.add_node("c", Pt2D::new(0.0, 20.0), Tags::empty());
    raw.add_node("d", Pt2D::new(10.0, 20.0), Tags::empty());
    raw.add_node("e", Pt2D::new(10.0, 30.0), Tags::empty());
    raw.add_node("f", Pt2D::new(0.0, 30.0), Tags::empty());
    raw.add_way(
        "house",
        vec!["c", "d", "e", "f", "c"],
        tags(vec![("building", "yes")]),
    );
    let cfg = MeshConfig::default();
    let mesh = build(raw, &cfg, None);

    let building = mesh.meshes.get(MeshLayer::Building);
    // A roof of 2 triangles and 4 walls of 2 each
    assert_eq!(building.len(), 2 + 4 * 2);
    assert_eq!(mesh.stats.areas, 1);
    let top = building
        .vertices()
        .map(|v| v.pos.z)
        .fold(f64::MIN, f64::max);
    assert_eq!(top, cfg.extrude.building);
}
