//! Turns a tagged road graph into triangle lists and waypoint graphs. Every road edge is solved
//! as nested quads mitered into its neighbors; junctions are closed with fans and corner patches
//! afterwards, then raised parts get side walls and everything is placed on the height field.

mod adjacency;
mod areas;
mod corners;
mod cross_section;
mod junction;
mod lanes;
mod rectangle;
mod steiner;

use std::collections::{BTreeMap, HashMap, HashSet};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use abstutil::{prettyprint_usize, Timer};
use geom::{HashablePt2D, Line, Pt2D};

pub use self::adjacency::{AdjacencyIndex, AngleWay, NeighborWay};
pub use self::areas::{make_area, Area, AreaKind};
pub use self::corners::{corner_patches, CornerPatch};
pub use self::cross_section::{CrossSection, EdgeNeighborhood, FlankingEdge};
pub use self::junction::{close_hole, AngleCurb, FanTriangle, HoleRing, NodeHoleVertex, RingRoad};
pub use self::lanes::{junction_turns, lane_ends, sidewalk_lane, street_lanes, Lane, LaneEnd};
pub use self::rectangle::{Flank, OsmRectangle2D};
pub use self::steiner::{SteinerKind, SteinerPointInfo};

use crate::extrude::{connected_components, extrude};
use crate::height::smooth_node_heights;
use crate::raw::{GeoGraph, NodeIdx, RawGraph};
use crate::way_info::{Band, RoadType, WayInfo, WayInfos};
use crate::waypoints::{StreetWayPoint, WayPointGraphs, WayPointLocation};
use crate::{
    Color, DrivingDirection, HeightBindings, HeightField, Instance, InstancePlacer, MeshConfig,
    MeshLayer, MeshList, TriangleList, Vertex,
};

/// Crossings sit slightly above the road, so they win the depth test.
const CROSSING_LIFT: f64 = 0.01;

/// Counts of what happened while meshing, for logging and tests.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct MeshStats {
    pub road_edges: usize,
    /// Degenerate edges that produced no geometry
    pub skipped_edges: usize,
    pub junctions: usize,
    pub junction_triangles: usize,
    pub corner_patches: usize,
    pub crossings: usize,
    pub areas: usize,
    pub extrusion_failures: usize,
    /// Triangles dropped because the height field didn't cover them
    pub excised_triangles: usize,
}

/// Everything generated from one road graph.
pub struct StreetMesh {
    pub meshes: MeshList,
    pub waypoints: WayPointGraphs,
    pub steiner_points: Vec<SteinerPointInfo>,
    pub height_bindings: HeightBindings,
    pub stats: MeshStats,
}

impl StreetMesh {
    /// Runs the whole pipeline. Without a height field, vertex heights stay as offsets from the
    /// ground. Model instances go to `placer` once their heights are final.
    ///
    /// Fails on malformed input: missing or repeated nodes, bad curb alphas, an unknown driving
    /// direction, open buildings, or areas that can't be triangulated. Problems confined to one
    /// edge or one extrusion are recorded as warnings on the `timer` instead.
    pub fn new(
        raw: RawGraph,
        cfg: &MeshConfig,
        heights: Option<&dyn HeightField>,
        placer: &mut dyn InstancePlacer,
        timer: &mut Timer,
    ) -> Result<StreetMesh> {
        cfg.validate()?;
        let direction = cfg.driving_direction()?;

        timer.start("index the road graph");
        let graph = GeoGraph::new(raw)?;
        let infos = WayInfos::new(&graph, cfg)?;
        let roads = AdjacencyIndex::new(&graph, &infos, |rt| rt != RoadType::Wall, timer);
        let walls = AdjacencyIndex::new(&graph, &infos, |rt| rt == RoadType::Wall, timer);
        timer.stop("index the road graph");

        let mut builder = Builder::new(&graph, &infos, cfg, direction);
        timer.start("mesh roads");
        builder.mesh_edges(&roads, timer);
        builder.mesh_edges(&walls, timer);
        builder.close_junctions();
        builder.connect_lanes();
        timer.stop("mesh roads");

        timer.start("mesh areas");
        builder.mesh_areas(timer)?;
        timer.stop("mesh areas");

        timer.start("extrude");
        builder.extrude_all(timer);
        timer.stop("extrude");

        if let Some(field) = heights {
            timer.start("bind heights");
            builder.bind_heights(field, &roads);
            timer.stop("bind heights");
        }

        let mesh = builder.finish(placer);
        info!(
            "Meshed {} road edges and {} junctions into {} triangles",
            prettyprint_usize(mesh.stats.road_edges),
            prettyprint_usize(mesh.stats.junctions),
            prettyprint_usize(mesh.meshes.total_triangles())
        );
        Ok(mesh)
    }
}

struct Builder<'a> {
    graph: &'a GeoGraph,
    infos: &'a WayInfos,
    cfg: &'a MeshConfig,
    direction: DrivingDirection,

    meshes: MeshList,
    waypoints: WayPointGraphs,
    bindings: HeightBindings,
    steiner_points: Vec<SteinerPointInfo>,
    instances: Vec<Instance>,
    stats: MeshStats,

    holes: BTreeMap<NodeIdx, HoleRing>,
    wall_holes: BTreeMap<NodeIdx, HoleRing>,
    lane_ends: BTreeMap<(NodeIdx, WayPointLocation), Vec<LaneEnd>>,
    /// Copies of the road surface above and below ground
    bridges: TriangleList,
    tunnels: TriangleList,
    /// The ends of dead ends on the edge of the map. The map just continues there.
    not_to_connect: HashSet<(HashablePt2D, HashablePt2D)>,
    /// Where a bridge or tunnel continues into another road. Parapets and tunnel walls leave
    /// these open.
    layer_joints: HashSet<(HashablePt2D, HashablePt2D)>,
}

impl<'a> Builder<'a> {
    fn new(
        graph: &'a GeoGraph,
        infos: &'a WayInfos,
        cfg: &'a MeshConfig,
        direction: DrivingDirection,
    ) -> Builder<'a> {
        Builder {
            graph,
            infos,
            cfg,
            direction,
            meshes: MeshList::new(),
            waypoints: WayPointGraphs::new(),
            bindings: HeightBindings::new(),
            steiner_points: Vec::new(),
            instances: Vec::new(),
            stats: MeshStats::default(),
            holes: BTreeMap::new(),
            wall_holes: BTreeMap::new(),
            lane_ends: BTreeMap::new(),
            bridges: TriangleList::new(),
            tunnels: TriangleList::new(),
            not_to_connect: HashSet::new(),
            layer_joints: HashSet::new(),
        }
    }

    fn mesh_edges(&mut self, adj: &AdjacencyIndex, timer: &mut Timer) {
        let node_z = node_offsets(self.graph, self.infos, adj);
        timer.start_iter("mesh edges", adj.canonical_edges().count());
        for (a, aw) in adj.canonical_edges() {
            timer.next();
            self.mesh_edge(adj, &node_z, a, aw, timer);
        }
    }

    fn mesh_edge(
        &mut self,
        adj: &AdjacencyIndex,
        node_z: &[f64],
        a: NodeIdx,
        aw: &AngleWay,
        timer: &mut Timer,
    ) {
        let (graph, infos, cfg) = (self.graph, self.infos, self.cfg);
        let b = aw.neighbor;
        let info = infos.must_get(aw.way);
        let (pt_a, pt_b) = (graph.pt(a), graph.pt(b));
        let (za, zb) = (node_z[a.0], node_z[b.0]);

        if let Some(ref model) = info.model {
            self.instances.push(Instance {
                model: model.clone(),
                pos: pt_a.lerp(pt_b, 0.5).to_3d((za + zb) / 2.0),
                angle: pt_a.angle_to(pt_b),
                scale: cfg.scale,
            });
            return;
        }

        // A dead end has nothing to miter against
        let flanks = |center: NodeIdx, towards: NodeIdx| -> (Option<AngleWay>, Option<AngleWay>) {
            if adj.degree(center) < 2 {
                return (None, None);
            }
            match adj.get_left_right_neighbors(center, towards) {
                Some((left, right)) => (Some(left.clone()), Some(right.clone())),
                None => (None, None),
            }
        };
        let (a_left, a_right) = flanks(a, b);
        let (b_left, b_right) = flanks(b, a);
        let to_flank = |aw: &Option<AngleWay>| {
            aw.as_ref().map(|aw| FlankingEdge {
                pt: graph.pt(aw.neighbor),
                way: aw.way,
            })
        };
        let edge = EdgeNeighborhood {
            a: pt_a,
            b: pt_b,
            a_right: to_flank(&a_right),
            a_left: to_flank(&a_left),
            b_left: to_flank(&b_left),
            b_right: to_flank(&b_right),
            a_is_junction: adj.is_junction(a),
            b_is_junction: adj.is_junction(b),
        };
        let cs = match cross_section::solve(&edge, info, infos, cfg.min_edge_length()) {
            Some(cs) => cs,
            None => {
                timer.warn(format!(
                    "Skipping degenerate edge of {} between {} and {}",
                    graph.way(aw.way).id,
                    graph.node(a).id,
                    graph.node(b).id
                ));
                self.stats.skipped_edges += 1;
                return;
            }
        };
        self.stats.road_edges += 1;
        let length = pt_a.dist_to(pt_b);
        let raise = self.surface_raise(info);

        // The road surface
        let surface = *cs.surface();
        let (layer, uv_scale) = match info.road_type {
            RoadType::Street => (MeshLayer::Street, cfg.uv_scale.street),
            RoadType::Path => (MeshLayer::Path, cfg.uv_scale.path),
            RoadType::Wall => (MeshLayer::Wall, cfg.uv_scale.wall),
        };
        let quad = edge_quad(
            [surface.p00, surface.p10, surface.p11, surface.p01],
            za + raise,
            zb + raise,
            info.color,
            uv_scale * cfg.scale,
            length,
        );
        push_quad(self.meshes.get_mut(layer), quad);
        if info.road_type != RoadType::Wall && info.layer != 0 {
            if info.layer > 0 {
                push_quad(&mut self.bridges, quad);
            } else {
                push_quad(&mut self.tunnels, quad);
            }
            if adj.degree(a) > 1 {
                self.layer_joints
                    .insert((surface.p00.to_hashable(), surface.p01.to_hashable()));
            }
            if adj.degree(b) > 1 {
                self.layer_joints
                    .insert((surface.p11.to_hashable(), surface.p10.to_hashable()));
            }
        }

        // Bands on both sides. `left` is relative to the way, which runs a -> b here.
        for (idx, band) in [Band::Sidewalk, Band::Curb2].into_iter().enumerate() {
            for left in [false, true] {
                if !info.draws_band(band, left) {
                    continue;
                }
                let z = raise + self.band_raise(band);
                let quad = edge_quad(
                    cs.band_quad(idx + 1, left),
                    za + z,
                    zb + z,
                    info.band_color(band),
                    cfg.uv_scale.sidewalk * cfg.scale,
                    length,
                );
                let layer = match band {
                    Band::Sidewalk => MeshLayer::Sidewalk,
                    Band::Curb2 => MeshLayer::Curb2,
                };
                push_quad(self.meshes.get_mut(layer), quad);
            }
        }

        if info.bind_height {
            for level in &cs.levels {
                for pt in [level.p00, level.p01] {
                    self.bindings.bind(pt, a, info.way);
                }
                for pt in [level.p10, level.p11] {
                    self.bindings.bind(pt, b, info.way);
                }
            }
            for band in 1..3 {
                for left in [false, true] {
                    self.bindings.bind(cs.inner_corner(band, left, false), a, info.way);
                    self.bindings.bind(cs.inner_corner(band, left, true), b, info.way);
                }
            }
        }

        let on_map_edge = |node: NodeIdx| {
            adj.degree(node) == 1 && graph.get_bounds().on_edge(graph.pt(node), cfg.scale)
        };
        if on_map_edge(a) {
            self.not_to_connect.extend(cap_edges(&cs.levels));
        }
        if on_map_edge(b) {
            let levels = cs.levels.map(|l| l.relabeled());
            self.not_to_connect.extend(cap_edges(&levels));
        }

        // Register with the junctions on either end
        let wall = info.road_type == RoadType::Wall;
        if let (true, Some(right)) = (edge.a_is_junction, &a_right) {
            let cuts = [1, 2].map(|band| {
                (
                    cs.inner_corner(band, true, false),
                    cs.inner_corner(band, false, false),
                )
            });
            self.register_end(wall, a, aw.angle, right.angle, cs.levels, cuts, info, za, true);
            self.crossing(&surface, false, za, info, a);
        }
        if let (true, Some(right), Some(back)) = (edge.b_is_junction, &b_right, adj.get(b, a)) {
            let levels = cs.levels.map(|l| l.relabeled());
            // Leaving from b, the road's left is the way's right
            let cuts = [1, 2].map(|band| {
                (
                    cs.inner_corner(band, false, true),
                    cs.inner_corner(band, true, true),
                )
            });
            self.register_end(wall, b, back.angle, right.angle, levels, cuts, info, zb, false);
            self.crossing(&surface, true, zb, info, b);
        }

        // Waypoints
        match info.road_type {
            RoadType::Street => {
                for lane in street_lanes(&surface, za, zb, info.lanes, self.direction, info.oneway)
                {
                    self.add_lane(WayPointLocation::Street, lane, adj, a, b, info);
                }
                for left in [false, true] {
                    if !info.draws_band(Band::Sidewalk, left) {
                        continue;
                    }
                    let (inner, outer, alpha) = if left {
                        (
                            (cs.levels[0].p01, cs.levels[0].p11),
                            (cs.levels[1].p01, cs.levels[1].p11),
                            (info.curb_alpha, info.curb2_alpha),
                        )
                    } else {
                        (
                            (cs.levels[0].p00, cs.levels[0].p10),
                            (cs.levels[1].p00, cs.levels[1].p10),
                            (-info.curb2_alpha, -info.curb_alpha),
                        )
                    };
                    let z = self.band_raise(Band::Sidewalk);
                    let lane = sidewalk_lane(inner, outer, za + z, zb + z, alpha);
                    self.street_lights(&lane, left);
                    self.add_lane(WayPointLocation::Sidewalk, lane, adj, a, b, info);
                }
            }
            RoadType::Path => {
                let lane = sidewalk_lane(
                    (surface.p00, surface.p10),
                    (surface.p01, surface.p11),
                    za,
                    zb,
                    (0.0, 1.0),
                );
                self.add_lane(WayPointLocation::Sidewalk, lane, adj, a, b, info);
            }
            RoadType::Wall => {}
        }
        if info.explicit_waypoints {
            let lane = Lane {
                waypoint: StreetWayPoint {
                    alpha: (0.5, 0.5),
                    from: pt_a.to_3d(za),
                    to: pt_b.to_3d(zb),
                },
                forwards: true,
                bidirectional: !info.oneway,
            };
            self.add_lane(WayPointLocation::Explicit, lane, adj, a, b, info);
        }

        // Steiner points
        if let Some(line) = Line::new(pt_a, pt_b) {
            if wall {
                self.steiner_points.extend(steiner::wall_samples(
                    &line,
                    cfg.steiner.wall_spacing * cfg.scale,
                ));
            } else {
                self.steiner_points.extend(steiner::road_samples(
                    &line,
                    info.width / 2.0,
                    &cfg.steiner.road_curve,
                    cfg.scale,
                ));
            }
        }
    }

    fn surface_raise(&self, info: &WayInfo) -> f64 {
        match info.road_type {
            RoadType::Wall => self.cfg.extrude.wall * self.cfg.scale,
            _ => 0.0,
        }
    }

    fn band_raise(&self, band: Band) -> f64 {
        self.cfg.scale
            * match band {
                Band::Sidewalk => self.cfg.extrude.curb,
                Band::Curb2 => self.cfg.extrude.grass,
            }
    }

    /// `levels` are described leaving `node`, and `from_a` says if that's the way's own
    /// direction. `cuts` has the left and right inner corners of each band at this end.
    #[allow(clippy::too_many_arguments)]
    fn register_end(
        &mut self,
        wall: bool,
        node: NodeIdx,
        angle: f64,
        right_angle: f64,
        levels: [OsmRectangle2D; 3],
        cuts: [(Pt2D, Pt2D); 2],
        info: &WayInfo,
        z: f64,
        from_a: bool,
    ) {
        let holes = if wall {
            &mut self.wall_holes
        } else {
            &mut self.holes
        };
        let ring = holes.entry(node).or_default();
        let vertex = |pt: Pt2D| NodeHoleVertex {
            pt,
            way: info.way,
            color: info.color,
            z,
        };

        ring.insert(AngleCurb::new(angle, 0), vertex(levels[0].p01));
        ring.insert(AngleCurb::new(right_angle, 0), vertex(levels[0].p00));
        let alphas = info.level_alphas();
        for level in 1..3 {
            if alphas[level] == alphas[level - 1] {
                continue;
            }
            ring.insert(AngleCurb::new(angle, level as i8), vertex(levels[level].p01));
            ring.insert(
                AngleCurb::new(angle, -(level as i8)),
                vertex(levels[level].p00),
            );
        }

        let has_band = |level: usize| alphas[level] != alphas[level - 1];
        let left_cuts = [1, 2].map(|level| Some(cuts[level - 1].0).filter(|_| has_band(level)));
        let right_cuts = [1, 2].map(|level| Some(cuts[level - 1].1).filter(|_| has_band(level)));

        // Leaving from b, the road's left is the way's right
        let left = from_a;
        ring.add_road(
            angle,
            RingRoad {
                way: info.way,
                curb_alpha: info.curb_alpha,
                deleted_left: [
                    !info.draws_band(Band::Sidewalk, left),
                    !info.draws_band(Band::Curb2, left),
                ],
                deleted_right: [
                    !info.draws_band(Band::Sidewalk, !left),
                    !info.draws_band(Band::Curb2, !left),
                ],
                band_colors: [info.sidewalk_color, info.curb2_color],
                left_cuts,
                right_cuts,
            },
        );
    }

    /// A strip across the street where it meets a junction, for streets with sidewalks.
    fn crossing(
        &mut self,
        surface: &OsmRectangle2D,
        at_b: bool,
        z: f64,
        info: &WayInfo,
        node: NodeIdx,
    ) {
        if info.road_type != RoadType::Street || !info.has_band(Band::Sidewalk) {
            return;
        }
        let width = self.cfg.crossing_width * self.cfg.scale;
        let pct_right = width / surface.p00.dist_to(surface.p10);
        let pct_left = width / surface.p01.dist_to(surface.p11);
        // The crossing would take up most of a short edge
        if !(pct_right < 0.5 && pct_left < 0.5) {
            return;
        }
        let corners = if at_b {
            [
                surface.p00.lerp(surface.p10, 1.0 - pct_right),
                surface.p10,
                surface.p11,
                surface.p01.lerp(surface.p11, 1.0 - pct_left),
            ]
        } else {
            [
                surface.p00,
                surface.p00.lerp(surface.p10, pct_right),
                surface.p01.lerp(surface.p11, pct_left),
                surface.p01,
            ]
        };
        let z = z + CROSSING_LIFT * self.cfg.scale;
        let quad = edge_quad(
            corners,
            z,
            z,
            self.cfg.crossing_color,
            self.cfg.uv_scale.street * self.cfg.scale,
            width,
        );
        push_quad(self.meshes.get_mut(MeshLayer::Crossing), quad);
        if info.bind_height {
            for pt in corners {
                self.bindings.bind(pt, node, info.way);
            }
        }
        self.stats.crossings += 1;
    }

    fn add_lane(
        &mut self,
        location: WayPointLocation,
        lane: Lane,
        adj: &AdjacencyIndex,
        a: NodeIdx,
        b: NodeIdx,
        info: &WayInfo,
    ) {
        self.waypoints
            .get_mut(location)
            .add_waypoint(lane.waypoint, lane.bidirectional);
        for (node, end) in lane_ends(&lane, a, b) {
            if info.bind_height {
                self.bindings.bind(end.pt.to_2d(), node, info.way);
            }
            if adj.is_junction(node) {
                self.lane_ends.entry((node, location)).or_default().push(end);
            }
        }
    }

    /// Along the middle of a sidewalk, facing the road.
    fn street_lights(&mut self, lane: &Lane, left: bool) {
        let cfg = &self.cfg.street_lights;
        if !cfg.enabled {
            return;
        }
        let (from, to) = (lane.waypoint.from, lane.waypoint.to);
        let line = match Line::new(from.to_2d(), to.to_2d()) {
            Some(l) => l,
            None => return,
        };
        let spacing = cfg.spacing * self.cfg.scale;
        if spacing <= 0.0 {
            return;
        }
        let angle = line.angle().rotate_degs(if left { -90.0 } else { 90.0 });
        let count = (line.length() / spacing).floor() as usize;
        for i in 0..count {
            let pct = ((i as f64) + 0.5) * spacing / line.length();
            self.instances.push(Instance {
                model: cfg.model.clone(),
                pos: line.percent_along(pct).to_3d(from.z + (to.z - from.z) * pct),
                angle,
                scale: self.cfg.scale,
            });
        }
    }

    /// Fans over the middle of every junction, then corner patches for the bands.
    fn close_junctions(&mut self) {
        let infos = self.infos;
        for (node, ring) in std::mem::take(&mut self.holes) {
            let any_street = ring
                .roads
                .values()
                .any(|r| infos.must_get(r.way).road_type == RoadType::Street);
            let layer = if any_street {
                MeshLayer::Street
            } else {
                MeshLayer::Path
            };
            self.fill_hole(node, &ring, layer, 0.0);

            for patch in corner_patches(&ring) {
                let z = self.band_raise(patch.band);
                let layer = match patch.band {
                    Band::Sidewalk => MeshLayer::Sidewalk,
                    Band::Curb2 => MeshLayer::Curb2,
                };
                let uv_size = self.cfg.uv_scale.sidewalk * self.cfg.scale;
                let list = self.meshes.get_mut(layer);
                let v = |x: &NodeHoleVertex| {
                    Vertex::new(x.pt, x.z + z, x.color, planar_uv(x.pt, uv_size))
                };
                for pair in patch.vertices[1..].windows(2) {
                    list.push(v(&patch.vertices[0]), v(&pair[0]), v(&pair[1]));
                }
                self.stats.corner_patches += 1;
            }
        }

        let raise = self.cfg.extrude.wall * self.cfg.scale;
        for (node, ring) in std::mem::take(&mut self.wall_holes) {
            self.fill_hole(node, &ring, MeshLayer::Wall, raise);
        }
    }

    fn fill_hole(&mut self, node: NodeIdx, ring: &HoleRing, layer: MeshLayer, raise: f64) {
        let (centroid, triangles) = close_hole(ring);
        self.stats.junctions += 1;
        self.stats.junction_triangles += triangles.len();
        let uv_size = self.cfg.uv_scale.street * self.cfg.scale;
        let list = self.meshes.get_mut(layer);
        for tri in &triangles {
            let [p, q, r] = tri
                .corners
                .map(|c| Vertex::new(c.pt, c.z + raise, c.color, planar_uv(c.pt, uv_size)));
            list.push(p, q, r);
        }
        if let Some(centroid) = centroid {
            if self.bindings.is_bound(node) {
                self.bindings.anchor(centroid.pt, node, centroid.way);
            }
        }
    }

    fn connect_lanes(&mut self) {
        for ((_, location), ends) in std::mem::take(&mut self.lane_ends) {
            let graph = self.waypoints.get_mut(location);
            for turn in junction_turns(&ends) {
                graph.add_waypoint(turn, false);
            }
        }
    }

    fn mesh_areas(&mut self, timer: &mut Timer) -> Result<()> {
        let (graph, infos, cfg) = (self.graph, self.infos, self.cfg);
        let no_clamp = HashSet::new();
        for (idx, way) in graph.all_ways() {
            if infos.get(idx).is_some() {
                continue;
            }
            let area = match make_area(graph, idx, way, cfg, timer)? {
                Some(area) => area,
                None => continue,
            };
            let (z, wall_height) = match area.kind {
                AreaKind::Building => (
                    cfg.extrude.building * cfg.scale,
                    -cfg.extrude.building * cfg.scale,
                ),
                AreaKind::Water => (
                    -cfg.extrude.water_floor * cfg.scale,
                    cfg.extrude.water_floor * cfg.scale,
                ),
                AreaKind::Forest | AreaKind::Grass | AreaKind::Plaza => (0.0, 0.0),
            };

            let uv_size = cfg.uv_scale.area * cfg.scale;
            let mut list = TriangleList::new();
            for tri in &area.triangles {
                let v = |pt: Pt2D| Vertex::new(pt, z, area.color, planar_uv(pt, uv_size));
                list.push(v(tri.pt1), v(tri.pt2), v(tri.pt3));
            }

            // Roofs stay flat, following the height of their first node
            if area.kind == AreaKind::Building {
                for pt in area.ring.points() {
                    self.bindings.bind(*pt, way.nodes[0], idx);
                }
            }
            if area.kind == AreaKind::Forest {
                self.steiner_points.extend(steiner::forest_samples(
                    &area.ring,
                    cfg.steiner.forest_spacing * cfg.scale,
                ));
            }

            let layer = area.kind.layer();
            if let Err(err) = extrude(
                self.meshes.get_mut(layer),
                &[&list],
                wall_height,
                &no_clamp,
                &self.not_to_connect,
            ) {
                timer.warn(format!("Couldn't extrude {}: {}", way.id, err));
                self.stats.extrusion_failures += 1;
            }
            self.meshes.get_mut(layer).extend(list);
            self.stats.areas += 1;
        }
        Ok(())
    }

    fn extrude_all(&mut self, timer: &mut Timer) {
        let cfg = self.cfg;
        let no_clamp = HashSet::new();
        let map_edge = self.not_to_connect.clone();

        // Sidewalks and the outer band drop down to the road
        let sidewalks = self.meshes.get(MeshLayer::Sidewalk).clone();
        self.extrude_components(
            &sidewalks,
            MeshLayer::Curb,
            -cfg.extrude.curb * cfg.scale,
            &no_clamp,
            &map_edge,
            timer,
        );
        let curb2 = self.meshes.get(MeshLayer::Curb2).clone();
        self.extrude_components(
            &curb2,
            MeshLayer::Extrusion,
            -cfg.extrude.grass * cfg.scale,
            &no_clamp,
            &map_edge,
            timer,
        );
        let walls = self.meshes.get(MeshLayer::Wall).clone();
        self.extrude_components(
            &walls,
            MeshLayer::Wall,
            -cfg.extrude.wall * cfg.scale,
            &no_clamp,
            &map_edge,
            timer,
        );

        // Bridges get a deck underneath and parapets on top; tunnels get walls. Where they touch
        // the ground, the walls taper off. Parapets and tunnel walls stay open where the road
        // carries on.
        let open: HashSet<(HashablePt2D, HashablePt2D)> =
            map_edge.union(&self.layer_joints).cloned().collect();
        let bridges = std::mem::take(&mut self.bridges);
        let clamped = on_ground(&bridges);
        self.extrude_components(
            &bridges,
            MeshLayer::Extrusion,
            -cfg.extrude.street * cfg.scale,
            &clamped,
            &map_edge,
            timer,
        );
        self.extrude_components(
            &bridges,
            MeshLayer::Extrusion,
            cfg.extrude.air_curb * cfg.scale,
            &clamped,
            &open,
            timer,
        );
        let tunnels = std::mem::take(&mut self.tunnels);
        let clamped = on_ground(&tunnels);
        self.extrude_components(
            &tunnels,
            MeshLayer::Extrusion,
            cfg.extrude.air_support * cfg.scale,
            &clamped,
            &open,
            timer,
        );
    }

    /// One failing piece doesn't stop the others.
    fn extrude_components(
        &mut self,
        source: &TriangleList,
        dest: MeshLayer,
        height: f64,
        clamped: &HashSet<HashablePt2D>,
        not_to_connect: &HashSet<(HashablePt2D, HashablePt2D)>,
        timer: &mut Timer,
    ) {
        for component in connected_components(source) {
            if let Err(err) = extrude(
                self.meshes.get_mut(dest),
                &[&component],
                height,
                clamped,
                not_to_connect,
            ) {
                timer.warn(format!("Couldn't extrude part of the {} layer: {}", dest, err));
                self.stats.extrusion_failures += 1;
            }
        }
    }

    /// Bound vertices follow their node's (possibly smoothed) height; everything else samples
    /// the field directly. Existing z values are kept as offsets on top. Anything the field
    /// doesn't cover disappears.
    fn bind_heights(&mut self, field: &dyn HeightField, roads: &AdjacencyIndex) {
        let graph = self.graph;
        let raw: BTreeMap<NodeIdx, Option<f64>> = self
            .bindings
            .node_ways
            .keys()
            .map(|n| (*n, field.height(graph.pt(*n))))
            .collect();
        let mut neighbors = BTreeMap::new();
        for node in raw.keys() {
            let pt = graph.pt(*node);
            let list: Vec<(NodeIdx, f64)> = roads
                .angle_ways(*node)
                .iter()
                .filter(|aw| raw.contains_key(&aw.neighbor))
                .map(|aw| (aw.neighbor, pt.dist_to(graph.pt(aw.neighbor))))
                .collect();
            neighbors.insert(*node, list);
        }
        let node_heights = smooth_node_heights(
            &raw,
            &neighbors,
            self.cfg.street_node_smoothness,
            self.cfg.smoothing_iterations,
        );

        let bindings = &self.bindings;
        let mut cache: HashMap<HashablePt2D, Option<f64>> = HashMap::new();
        let mut base = |pt: Pt2D| -> Option<f64> {
            *cache
                .entry(pt.to_hashable())
                .or_insert_with(|| match bindings.get(pt) {
                    Some(node) => node_heights.get(&node).cloned().flatten(),
                    None => field.height(pt),
                })
        };

        for (_, list) in self.meshes.iter_mut() {
            let before = list.len();
            let mut kept = Vec::new();
            for mut tri in list.triangles.drain(..) {
                let heights: Option<Vec<f64>> = tri.iter().map(|v| base(v.pt2d())).collect();
                if let Some(heights) = heights {
                    for (v, h) in tri.iter_mut().zip(heights) {
                        v.pos = v.pos.offset_z(h);
                    }
                    kept.push(tri);
                }
            }
            self.stats.excised_triangles += before - kept.len();
            list.triangles = kept;
        }

        for (_, waypoints) in self.waypoints.iter_mut() {
            waypoints.update_positions(|pt| base(pt.to_2d()).map(|h| pt.offset_z(h)));
        }

        self.instances = std::mem::take(&mut self.instances)
            .into_iter()
            .filter_map(|mut instance| {
                let h = base(instance.pos.to_2d())?;
                instance.pos = instance.pos.offset_z(h);
                Some(instance)
            })
            .collect();
    }

    fn finish(mut self, placer: &mut dyn InstancePlacer) -> StreetMesh {
        for (_, list) in self.meshes.iter_mut() {
            list.recompute_normals();
        }
        for instance in self.instances {
            placer.place(instance);
        }
        StreetMesh {
            meshes: self.meshes,
            waypoints: self.waypoints,
            steiner_points: self.steiner_points,
            height_bindings: self.bindings,
            stats: self.stats,
        }
    }
}

/// Every node sits at the layer height of the ways off the ground meeting there, so roads on the
/// ground ramp up onto bridges and down into tunnels. When those ways disagree, or all of them
/// are on the ground, the node stays on the ground.
fn node_offsets(graph: &GeoGraph, infos: &WayInfos, adj: &AdjacencyIndex) -> Vec<f64> {
    let mut offsets = vec![0.0; graph.nodes.len()];
    for node in adj.all_nodes() {
        let mut heights = adj
            .angle_ways(node)
            .iter()
            .map(|aw| infos.must_get(aw.way).layer_height)
            .filter(|h| *h != 0.0);
        if let Some(first) = heights.next() {
            if heights.all(|h| h == first) {
                offsets[node.0] = first;
            }
        }
    }
    offsets
}

/// Corners at a, b, b, a. Texture coordinates run across the quad in u, and along it in v.
fn edge_quad(
    corners: [Pt2D; 4],
    za: f64,
    zb: f64,
    color: Color,
    uv_size: f64,
    length: f64,
) -> [Vertex; 4] {
    let v = length / uv_size;
    [
        Vertex::new(corners[0], za, color, [0.0, 0.0]),
        Vertex::new(corners[1], zb, color, [0.0, v]),
        Vertex::new(corners[2], zb, color, [1.0, v]),
        Vertex::new(corners[3], za, color, [1.0, 0.0]),
    ]
}

fn push_quad(list: &mut TriangleList, quad: [Vertex; 4]) {
    let [p00, p10, p11, p01] = quad;
    list.push_quad(p00, p10, p11, p01);
}

/// Every edge across the end at a: the road surface, then each band on both sides.
fn cap_edges(levels: &[OsmRectangle2D; 3]) -> Vec<(HashablePt2D, HashablePt2D)> {
    let mut edges = vec![(levels[0].p00.to_hashable(), levels[0].p01.to_hashable())];
    for pair in levels.windows(2) {
        edges.push((pair[0].p00.to_hashable(), pair[1].p00.to_hashable()));
        edges.push((pair[0].p01.to_hashable(), pair[1].p01.to_hashable()));
    }
    edges
}

fn planar_uv(pt: Pt2D, uv_size: f64) -> [f64; 2] {
    [pt.x() / uv_size, pt.y() / uv_size]
}

fn on_ground(list: &TriangleList) -> HashSet<HashablePt2D> {
    list.vertices()
        .filter(|v| v.pos.z == 0.0)
        .map(|v| v.pt2d().to_hashable())
        .collect()
}
