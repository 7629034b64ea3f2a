use std::collections::HashMap;
use std::f64::consts::PI;

use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;

use abstutil::{Tags, Timer};
use geom::{HashablePt2D, Pt2D};
use street_mesh::make::AdjacencyIndex;
use street_mesh::{
    check_curb_alphas, GeoGraph, HeightGrid, MeshConfig, MeshLayer, NoInstances, RawGraph,
    RoadType, StreetMesh, WayInfos,
};

fn rng() -> XorShiftRng {
    XorShiftRng::seed_from_u64(42)
}

/// `count` streets leaving the origin, roughly evenly spread out.
fn star(rng: &mut XorShiftRng, count: usize, street: &Tags) -> RawGraph {
    let mut raw = RawGraph::new();
    raw.add_node("center", Pt2D::new(0.0, 0.0), Tags::empty());
    let spread = 2.0 * PI / (count as f64);
    for i in 0..count {
        let angle = (i as f64) * spread + rng.gen_range(-spread / 6.0..spread / 6.0);
        let dist = rng.gen_range(60.0..100.0);
        let id = format!("end{}", i);
        raw.add_node(
            &id,
            Pt2D::new(dist * angle.cos(), dist * angle.sin()),
            Tags::empty(),
        );
        raw.add_way(&format!("street{}", i), vec!["center", &id], street.clone());
    }
    raw
}

fn no_sidewalks() -> Tags {
    vec![
        ("highway", "residential"),
        ("width", "10"),
        ("curb_alpha", "1"),
        ("curb2_alpha", "1"),
    ]
    .into_iter()
    .collect()
}

fn with_sidewalks() -> Tags {
    vec![("highway", "residential"), ("width", "14")]
        .into_iter()
        .collect()
}

#[test]
fn left_and_right_neighbors_are_inverses() {
    let mut rng = rng();
    for count in 1..8 {
        let graph = GeoGraph::new(star(&mut rng, count, &no_sidewalks())).unwrap();
        let cfg = MeshConfig::default();
        let infos = WayInfos::new(&graph, &cfg).unwrap();
        let adj = AdjacencyIndex::new(
            &graph,
            &infos,
            |rt| rt != RoadType::Wall,
            &mut Timer::throwaway(),
        );
        for node in adj.all_nodes() {
            for aw in adj.angle_ways(node) {
                let (left, right) = adj.get_left_right_neighbors(node, aw.neighbor).unwrap();
                let (_, right_of_left) = adj
                    .get_left_right_neighbors(node, left.neighbor)
                    .unwrap();
                let (left_of_right, _) = adj
                    .get_left_right_neighbors(node, right.neighbor)
                    .unwrap();
                assert_eq!(right_of_left.neighbor, aw.neighbor);
                assert_eq!(left_of_right.neighbor, aw.neighbor);
            }
        }
    }
}

#[test]
fn curb_alphas_must_be_ordered() {
    let mut rng = rng();
    for _ in 0..200 {
        let curb: f64 = rng.gen_range(-0.5..1.5);
        let curb2: f64 = rng.gen_range(-0.5..1.5);
        let valid = curb > 0.0 && curb <= curb2 && curb2 <= 1.0;
        assert_eq!(check_curb_alphas("x", curb, curb2).is_ok(), valid);
    }
}

#[test]
fn junctions_close_with_fans() {
    let mut rng = rng();
    for count in 3..7 {
        let raw = star(&mut rng, count, &no_sidewalks());
        let mesh = StreetMesh::new(
            raw,
            &MeshConfig::default(),
            None,
            &mut NoInstances,
            &mut Timer::throwaway(),
        )
        .unwrap();
        assert_eq!(mesh.stats.skipped_edges, 0);
        let expected = if count == 3 { 1 } else { count };
        assert_eq!(mesh.stats.junction_triangles, expected);
        assert_eq!(
            mesh.meshes.get(MeshLayer::Street).len(),
            2 * count + expected
        );

        // Everything faces up
        for tri in &mesh.meshes.get(MeshLayer::Street).triangles {
            let (a, b, c) = (tri[0].pt2d(), tri[1].pt2d(), tri[2].pt2d());
            let cross = (b.x() - a.x()) * (c.y() - a.y()) - (c.x() - a.x()) * (b.y() - a.y());
            assert!(cross > 0.0);
        }
    }
}

fn random_grid(rng: &mut XorShiftRng) -> HeightGrid {
    let mut grid = HeightGrid::flat(Pt2D::new(-200.0, -200.0), 20.0, 21, 21, 0.0);
    for value in &mut grid.values {
        *value = rng.gen_range(0.0..30.0);
    }
    grid
}

fn sorted_positions(mesh: &StreetMesh) -> Vec<(f64, f64, f64)> {
    let mut pts: Vec<(f64, f64, f64)> = mesh
        .meshes
        .iter()
        .flat_map(|(_, list)| list.vertices().map(|v| (v.pos.x, v.pos.y, v.pos.z)))
        .collect();
    pts.sort_by(|a, b| a.partial_cmp(b).unwrap());
    pts
}

#[test]
fn height_binding_is_deterministic() {
    let mut rng = rng();
    let raw = star(&mut rng, 4, &with_sidewalks());
    let grid = random_grid(&mut rng);
    let mut cfg = MeshConfig::default();
    cfg.street_node_smoothness = 0.5;

    let build = || {
        StreetMesh::new(
            raw.clone(),
            &cfg,
            Some(&grid),
            &mut NoInstances,
            &mut Timer::throwaway(),
        )
        .unwrap()
    };
    let first = build();
    let second = build();
    assert!(first.meshes.total_triangles() > 0);
    assert_eq!(sorted_positions(&first), sorted_positions(&second));
}

#[test]
fn bound_road_surface_has_no_cracks() {
    let mut rng = rng();
    let raw = star(&mut rng, 5, &with_sidewalks());
    let grid = random_grid(&mut rng);
    let mesh = StreetMesh::new(
        raw,
        &MeshConfig::default(),
        Some(&grid),
        &mut NoInstances,
        &mut Timer::throwaway(),
    )
    .unwrap();

    let mut heights: HashMap<HashablePt2D, f64> = HashMap::new();
    for v in mesh.meshes.get(MeshLayer::Street).vertices() {
        let z = *heights.entry(v.pt2d().to_hashable()).or_insert(v.pos.z);
        assert_eq!(z, v.pos.z);
    }
}
