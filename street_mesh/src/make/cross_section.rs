use geom::{Pt2D, EPSILON_DIST};

use crate::make::rectangle::{Flank, OsmRectangle2D};
use crate::raw::WayIdx;
use crate::way_info::{WayInfo, WayInfos};

/// An edge angularly next to the one being solved, at one of its endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlankingEdge {
    pub pt: Pt2D,
    pub way: WayIdx,
}

/// Everything needed to solve the cross-section of one edge a -> b. Flanks follow the
/// conventions of `OsmRectangle2D::from_line`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeNeighborhood {
    pub a: Pt2D,
    pub b: Pt2D,
    pub a_right: Option<FlankingEdge>,
    pub a_left: Option<FlankingEdge>,
    pub b_left: Option<FlankingEdge>,
    pub b_right: Option<FlankingEdge>,
    pub a_is_junction: bool,
    pub b_is_junction: bool,
}

/// Nested quads for one edge: the road surface, then the outer edges of the sidewalk and the
/// outermost band. A band with no width repeats the level inside it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CrossSection {
    pub levels: [OsmRectangle2D; 3],
    /// At junction ends, bands are cut straight across and the corner is left to a patch.
    cut_a: bool,
    cut_b: bool,
}

impl CrossSection {
    pub fn surface(&self) -> &OsmRectangle2D {
        &self.levels[0]
    }

    /// Between consecutive levels, the band's quad on one side, counter-clockwise. `band` is 1
    /// for the sidewalk and 2 for the outermost band.
    pub fn band_quad(&self, band: usize, left: bool) -> [Pt2D; 4] {
        let outer = &self.levels[band];
        if left {
            [
                self.inner_corner(band, true, false),
                self.inner_corner(band, true, true),
                outer.p11,
                outer.p01,
            ]
        } else {
            [
                outer.p00,
                outer.p10,
                self.inner_corner(band, false, true),
                self.inner_corner(band, false, false),
            ]
        }
    }

    /// Where the inner edge of a band starts, at end a or b. Normally that's the corner of the
    /// level inside it. At a junction end, when the band's outer corner sits further along the
    /// road, the inner edge is cut at that distance instead.
    pub fn inner_corner(&self, band: usize, left: bool, at_b: bool) -> Pt2D {
        let (inner, outer) = (&self.levels[band - 1], &self.levels[band]);
        let (p, q, outer_corner) = match (left, at_b) {
            (true, false) => (inner.p01, inner.p11, outer.p01),
            (true, true) => (inner.p11, inner.p01, outer.p11),
            (false, false) => (inner.p00, inner.p10, outer.p00),
            (false, true) => (inner.p10, inner.p00, outer.p10),
        };
        let cut = if at_b { self.cut_b } else { self.cut_a };
        let len = p.dist_to(q);
        if !cut || len == 0.0 {
            return p;
        }
        let d = ((q.x() - p.x()) / len, (q.y() - p.y()) / len);
        let t = (outer_corner.x() - p.x()) * d.0 + (outer_corner.y() - p.y()) * d.1;
        if t <= EPSILON_DIST {
            return p;
        }
        Pt2D::new(p.x() + t * d.0, p.y() + t * d.1)
    }
}

/// Solves every level with the neighbors' matching widths, so bands miter into each other the
/// same way the surfaces do. When a band is too sharp to miter at a junction, it stops square at
/// the setback of the road surface's corner instead.
pub fn solve(
    edge: &EdgeNeighborhood,
    info: &WayInfo,
    infos: &WayInfos,
    min_length: f64,
) -> Option<CrossSection> {
    let solve_level = |level: usize, square_junctions: bool| -> Option<OsmRectangle2D> {
        let flank = |f: Option<FlankingEdge>, at_junction: bool| -> Option<Flank> {
            if level > 0 && square_junctions && at_junction {
                return None;
            }
            f.map(|f| Flank {
                pt: f.pt,
                half_width: infos.must_get(f.way).half_width(level),
            })
        };
        OsmRectangle2D::from_line(
            flank(edge.a_right, edge.a_is_junction),
            flank(edge.a_left, edge.a_is_junction),
            edge.a,
            edge.b,
            flank(edge.b_left, edge.b_is_junction),
            flank(edge.b_right, edge.b_is_junction),
            info.half_width(level),
            min_length,
        )
    };

    let surface = solve_level(0, false)?;
    let mut levels = [surface; 3];
    let alphas = info.level_alphas();
    for level in 1..3 {
        if alphas[level] == alphas[level - 1] {
            levels[level] = levels[level - 1];
            continue;
        }
        if let Some(rect) = solve_level(level, false) {
            levels[level] = rect;
            continue;
        }
        if !edge.a_is_junction && !edge.b_is_junction {
            return None;
        }
        let mut rect = solve_level(level, true)?;
        let h = info.half_width(level);
        if edge.a_is_junction {
            rect.p00 = square_corner(edge.a, edge.b, surface.p00, -h);
            rect.p01 = square_corner(edge.a, edge.b, surface.p01, h);
        }
        if edge.b_is_junction {
            rect.p10 = square_corner(edge.a, edge.b, surface.p10, -h);
            rect.p11 = square_corner(edge.a, edge.b, surface.p11, h);
        }
        levels[level] = rect;
    }
    Some(CrossSection {
        levels,
        cut_a: edge.a_is_junction,
        cut_b: edge.b_is_junction,
    })
}

/// The point `offset` to the left of the line a -> b, at the same distance along it as
/// `surface_corner`.
fn square_corner(a: Pt2D, b: Pt2D, surface_corner: Pt2D, offset: f64) -> Pt2D {
    let len = a.dist_to(b);
    let d = ((b.x() - a.x()) / len, (b.y() - a.y()) / len);
    let t = (surface_corner.x() - a.x()) * d.0 + (surface_corner.y() - a.y()) * d.1;
    Pt2D::new(a.x() + t * d.0 - offset * d.1, a.y() + t * d.1 + offset * d.0)
}
