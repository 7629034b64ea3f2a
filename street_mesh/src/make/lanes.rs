//! Lane-level waypoints along streets and sidewalks, and the turns connecting them at junctions.

use geom::{Pt2D, Pt3D};

use crate::config::DrivingDirection;
use crate::make::rectangle::OsmRectangle2D;
use crate::raw::NodeIdx;
use crate::waypoints::StreetWayPoint;

/// One lane along an edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Lane {
    pub waypoint: StreetWayPoint,
    /// Starts at a, going towards b
    pub forwards: bool,
    pub bidirectional: bool,
}

/// Where a lane touches a junction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LaneEnd {
    pub pt: Pt3D,
    /// The other end of the edge the lane came from
    pub neighbor: NodeIdx,
    /// Traffic arrives at the junction here. Bidirectional lanes leave two ends.
    pub inbound: bool,
    pub alpha: (f64, f64),
}

/// Vehicle lanes on the road surface of the edge a -> b. Without a center lane, two lanes go in
/// opposite directions on either side of the middle; a wider road uses the two lanes nearest the
/// middle. `za` and `zb` are the height offsets at both ends.
pub fn street_lanes(
    surface: &OsmRectangle2D,
    za: f64,
    zb: f64,
    lanes: usize,
    direction: DrivingDirection,
    oneway: bool,
) -> Vec<Lane> {
    let lane = |lo: f64, hi: f64, forwards: bool, bidirectional: bool| -> Lane {
        let s = (lo + hi) / 2.0;
        let at_a = surface.across(false, s).to_3d(za);
        let at_b = surface.across(true, s).to_3d(zb);
        let (from, to) = if forwards { (at_a, at_b) } else { (at_b, at_a) };
        Lane {
            waypoint: StreetWayPoint {
                alpha: (lo, hi),
                from,
                to,
            },
            forwards,
            bidirectional,
        }
    };

    if oneway {
        return vec![lane(0.0, 1.0, true, false)];
    }
    let n = lanes.max(2) as f64;
    let inner = 0.5 - 1.0 / n;
    match direction {
        DrivingDirection::Center => vec![lane(0.0, 1.0, true, true)],
        DrivingDirection::Right => vec![
            lane(inner, 0.5, true, false),
            lane(0.5, 1.0 - inner, false, false),
        ],
        DrivingDirection::Left => vec![
            lane(0.5, 1.0 - inner, true, false),
            lane(inner, 0.5, false, false),
        ],
    }
}

/// A bidirectional sidewalk down the middle of the band between `inner` and `outer`, which are
/// the band's edges at both ends: (at a, at b).
pub fn sidewalk_lane(
    inner: (Pt2D, Pt2D),
    outer: (Pt2D, Pt2D),
    za: f64,
    zb: f64,
    alpha: (f64, f64),
) -> Lane {
    Lane {
        waypoint: StreetWayPoint {
            alpha,
            from: inner.0.lerp(outer.0, 0.5).to_3d(za),
            to: inner.1.lerp(outer.1, 0.5).to_3d(zb),
        },
        forwards: true,
        bidirectional: true,
    }
}

/// The ends of a lane on the edge a -> b, as seen from node a and node b.
pub fn lane_ends(lane: &Lane, a: NodeIdx, b: NodeIdx) -> Vec<(NodeIdx, LaneEnd)> {
    let wp = &lane.waypoint;
    let (from_node, to_node) = if lane.forwards { (a, b) } else { (b, a) };
    // The neighbor is whatever's at the other end
    let (from_neighbor, to_neighbor) = (to_node, from_node);
    let mut ends = vec![
        (
            from_node,
            LaneEnd {
                pt: wp.from,
                neighbor: from_neighbor,
                inbound: false,
                alpha: wp.alpha,
            },
        ),
        (
            to_node,
            LaneEnd {
                pt: wp.to,
                neighbor: to_neighbor,
                inbound: true,
                alpha: wp.alpha,
            },
        ),
    ];
    if lane.bidirectional {
        let reversed: Vec<(NodeIdx, LaneEnd)> = ends
            .iter()
            .map(|(node, end)| {
                (
                    *node,
                    LaneEnd {
                        inbound: !end.inbound,
                        ..*end
                    },
                )
            })
            .collect();
        ends.extend(reversed);
    }
    ends
}

/// Every way of arriving connects to every way of leaving towards a different neighbor.
pub fn junction_turns(ends: &[LaneEnd]) -> Vec<StreetWayPoint> {
    let mut turns = Vec::new();
    for from in ends.iter().filter(|e| e.inbound) {
        for to in ends.iter().filter(|e| !e.inbound) {
            if from.neighbor == to.neighbor {
                continue;
            }
            turns.push(StreetWayPoint {
                alpha: from.alpha,
                from: from.pt,
                to: to.pt,
            });
        }
    }
    turns
}

#[cfg(test)]
mod tests {
    use super::*;

    fn surface() -> OsmRectangle2D {
        OsmRectangle2D {
            p00: Pt2D::new(0.0, -4.0),
            p10: Pt2D::new(20.0, -4.0),
            p01: Pt2D::new(0.0, 4.0),
            p11: Pt2D::new(20.0, 4.0),
        }
    }

    #[test]
    fn test_right_and_left_swap() {
        let right = street_lanes(&surface(), 0.0, 0.0, 2, DrivingDirection::Right, false);
        let left = street_lanes(&surface(), 0.0, 0.0, 2, DrivingDirection::Left, false);
        assert_eq!(right.len(), 2);
        assert_eq!(left.len(), 2);

        // Going a -> b, on the right at 25% of the width
        assert_eq!(right[0].waypoint.from, Pt3D::new(0.0, -2.0, 0.0));
        assert_eq!(right[0].waypoint.to, Pt3D::new(20.0, -2.0, 0.0));
        assert_eq!(right[1].waypoint.from, Pt3D::new(20.0, 2.0, 0.0));
        assert_eq!(left[0].waypoint.from, Pt3D::new(0.0, 2.0, 0.0));
        assert_eq!(left[1].waypoint.from, Pt3D::new(20.0, -2.0, 0.0));
        assert!(right.iter().chain(left.iter()).all(|l| !l.bidirectional));
    }

    #[test]
    fn test_center_and_wide() {
        let center = street_lanes(&surface(), 0.0, 0.0, 2, DrivingDirection::Center, false);
        assert_eq!(center.len(), 1);
        assert!(center[0].bidirectional);
        assert_eq!(center[0].waypoint.from, Pt3D::new(0.0, 0.0, 0.0));

        let wide = street_lanes(&surface(), 0.0, 0.0, 4, DrivingDirection::Right, false);
        assert_eq!(wide[0].waypoint.alpha, (0.25, 0.5));
        assert_eq!(wide[0].waypoint.from, Pt3D::new(0.0, -1.0, 0.0));
    }

    #[test]
    fn test_junction_turns() {
        let (a, b, c) = (NodeIdx(0), NodeIdx(1), NodeIdx(2));
        let lanes1 = street_lanes(&surface(), 0.0, 0.0, 2, DrivingDirection::Right, false);
        let mut ends_at_b = Vec::new();
        for lane in &lanes1 {
            for (node, end) in lane_ends(lane, a, b) {
                if node == b {
                    ends_at_b.push(end);
                }
            }
        }
        // Another road from c arriving at b
        ends_at_b.push(LaneEnd {
            pt: Pt3D::new(20.0, 10.0, 0.0),
            neighbor: c,
            inbound: true,
            alpha: (0.0, 0.5),
        });
        ends_at_b.push(LaneEnd {
            pt: Pt3D::new(21.0, 10.0, 0.0),
            neighbor: c,
            inbound: false,
            alpha: (0.5, 1.0),
        });
        let turns = junction_turns(&ends_at_b);
        // a -> c and c -> a; no U-turns
        assert_eq!(turns.len(), 2);
        assert!(turns.iter().all(|t| t.from != t.to));
    }
}
