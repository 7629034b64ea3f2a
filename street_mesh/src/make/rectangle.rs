use geom::Pt2D;

/// The road surface of one directed edge a -> b. The first digit says which end (0 at a, 1 at
/// b), the second which side (0 right, 1 left, looking from a to b). Going p00, p10, p11, p01
/// walks around it counter-clockwise.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OsmRectangle2D {
    pub p00: Pt2D,
    pub p10: Pt2D,
    pub p01: Pt2D,
    pub p11: Pt2D,
}

/// An edge leaving one of the endpoints, angularly next to the edge being solved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Flank {
    /// Any point along the flanking edge; usually its other node
    pub pt: Pt2D,
    pub half_width: f64,
}

/// Past this ratio of setback to width, the miter is too spiky to use.
const MITER_LIMIT: f64 = 10.0;
/// Sine of the smallest angle between two edges that's still solved as a miter
const MIN_SIN: f64 = 1e-6;

impl OsmRectangle2D {
    /// Solves the quad for a -> b. `a_right` and `a_left` flank `a` when looking towards `b`;
    /// `b_left` and `b_right` flank `b` when looking back towards `a`. A missing flank means a
    /// dead end, which gets a square cap. Each corner lies where this edge's side meets the facing
    /// side of the flanking edge, so neighboring quads share corners exactly.
    ///
    /// None for degenerate input: a short edge, a flank overlapping this edge, a too-sharp miter,
    /// or a quad that would turn itself inside out.
    #[allow(clippy::too_many_arguments)]
    pub fn from_line(
        a_right: Option<Flank>,
        a_left: Option<Flank>,
        a: Pt2D,
        b: Pt2D,
        b_left: Option<Flank>,
        b_right: Option<Flank>,
        half_width: f64,
        min_length: f64,
    ) -> Option<OsmRectangle2D> {
        let length = a.dist_to(b);
        if !(length >= min_length) || !(half_width > 0.0) {
            return None;
        }
        let d = ((b.x() - a.x()) / length, (b.y() - a.y()) / length);
        let back = (-d.0, -d.1);

        let p00 = corner(a, d, half_width, a_right, -1.0)?;
        let p01 = corner(a, d, half_width, a_left, 1.0)?;
        // Seen from b, the sides swap
        let p10 = corner(b, back, half_width, b_left, 1.0)?;
        let p11 = corner(b, back, half_width, b_right, -1.0)?;

        // Both sides have to make progress from a to b
        let progress = |p: Pt2D, q: Pt2D| (q.x() - p.x()) * d.0 + (q.y() - p.y()) * d.1;
        if progress(p00, p10) <= 0.0 || progress(p01, p11) <= 0.0 {
            return None;
        }
        Some(OsmRectangle2D { p00, p10, p01, p11 })
    }

    /// The same quad, described from b -> a.
    pub fn relabeled(&self) -> OsmRectangle2D {
        OsmRectangle2D {
            p00: self.p11,
            p10: self.p01,
            p01: self.p10,
            p11: self.p00,
        }
    }

    /// Counter-clockwise
    pub fn corners(&self) -> [Pt2D; 4] {
        [self.p00, self.p10, self.p11, self.p01]
    }

    /// From the right side (0) to the left side (1), at end a (false) or b (true).
    pub fn across(&self, at_b: bool, pct: f64) -> Pt2D {
        if at_b {
            self.p10.lerp(self.p11, pct)
        } else {
            self.p00.lerp(self.p01, pct)
        }
    }
}

/// Where the side of the road leaving `c` in direction `d` ends. `side` is 1 for the left side,
/// -1 for the right.
fn corner(c: Pt2D, d: (f64, f64), h: f64, flank: Option<Flank>, side: f64) -> Option<Pt2D> {
    // Left normal
    let n = (-d.1, d.0);
    let t = match flank {
        None => 0.0,
        Some(flank) => {
            let len = c.dist_to(flank.pt);
            if len == 0.0 {
                return None;
            }
            let e = ((flank.pt.x() - c.x()) / len, (flank.pt.y() - c.y()) / len);
            let n_e = (-e.1, e.0);
            let cross = d.0 * e.1 - d.1 * e.0;
            if cross.abs() < MIN_SIN {
                if d.0 * e.0 + d.1 * e.1 < 0.0 {
                    // The road continues straight on
                    0.0
                } else {
                    return None;
                }
            } else {
                // c + side*h*n + t*d == c - side*h2*n_e + s*e
                let rhs = (
                    -side * (flank.half_width * n_e.0 + h * n.0),
                    -side * (flank.half_width * n_e.1 + h * n.1),
                );
                let det = -cross;
                let t = (-rhs.0 * e.1 + e.0 * rhs.1) / det;
                if t.abs() > MITER_LIMIT * h.max(flank.half_width) {
                    return None;
                }
                t
            }
        }
    };
    Pt2D::checked(c.x() + side * h * n.0 + t * d.0, c.y() + side * h * n.1 + t * d.1)
}
