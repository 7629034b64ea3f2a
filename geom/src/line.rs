use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Angle, Pt2D, EPSILON_DIST};

/// A line segment.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Line(Pt2D, Pt2D);

impl Line {
    /// Creates a line segment between two points, which must not be the same
    pub fn new(pt1: Pt2D, pt2: Pt2D) -> Option<Line> {
        if pt1.dist_to(pt2) <= EPSILON_DIST {
            return None;
        }
        Some(Line(pt1, pt2))
    }

    /// Equivalent to `Line::new(pt1, pt2).unwrap()`. Use this to effectively document an
    /// assertion at the call-site.
    pub fn must_new(pt1: Pt2D, pt2: Pt2D) -> Line {
        Line::new(pt1, pt2).unwrap()
    }

    pub fn pt1(&self) -> Pt2D {
        self.0
    }

    pub fn pt2(&self) -> Pt2D {
        self.1
    }

    pub fn length(&self) -> f64 {
        self.pt1().dist_to(self.pt2())
    }

    pub fn angle(&self) -> Angle {
        self.pt1().angle_to(self.pt2())
    }

    pub fn reversed(&self) -> Line {
        Line(self.pt2(), self.pt1())
    }

    /// Unit vector pointing from pt1 to pt2.
    pub fn direction(&self) -> (f64, f64) {
        let len = self.length();
        (
            (self.1.x() - self.0.x()) / len,
            (self.1.y() - self.0.y()) / len,
        )
    }

    pub fn percent_along(&self, percent: f64) -> Pt2D {
        self.pt1().lerp(self.pt2(), percent)
    }

    /// Shifts the segment perpendicularly. Positive widths go left (counter-clockwise) of the
    /// direction of travel.
    pub fn shift_left(&self, width: f64) -> Line {
        let angle = self.angle().rotate_degs(90.0);
        Line(
            self.pt1().project_away(width, angle),
            self.pt2().project_away(width, angle),
        )
    }

    /// Where this segment's projection of `pt` lands, as a fraction of its length. Not clamped.
    pub fn percent_of_projection(&self, pt: Pt2D) -> f64 {
        let (dx, dy) = (self.1.x() - self.0.x(), self.1.y() - self.0.y());
        let len_sq = dx * dx + dy * dy;
        ((pt.x() - self.0.x()) * dx + (pt.y() - self.0.y()) * dy) / len_sq
    }

    /// True if the segments cross somewhere other than a shared endpoint.
    pub fn crosses(&self, other: &Line) -> bool {
        let shares_endpoint = [self.0, self.1]
            .iter()
            .any(|a| [other.0, other.1].iter().any(|b| a.is_close(*b)));
        if shares_endpoint {
            return false;
        }
        is_counter_clockwise(self.pt1(), other.pt1(), other.pt2())
            != is_counter_clockwise(self.pt2(), other.pt1(), other.pt2())
            && is_counter_clockwise(self.pt1(), self.pt2(), other.pt1())
                != is_counter_clockwise(self.pt1(), self.pt2(), other.pt2())
    }

    pub fn intersection(&self, other: &Line) -> Option<Pt2D> {
        if !self.crosses(other) {
            return None;
        }
        let (x1, y1, x2, y2) = (self.0.x(), self.0.y(), self.1.x(), self.1.y());
        let (x3, y3, x4, y4) = (other.0.x(), other.0.y(), other.1.x(), other.1.y());
        let denom = (x1 - x2) * (y3 - y4) - (y1 - y2) * (x3 - x4);
        if denom == 0.0 {
            return None;
        }
        let t = ((x1 - x3) * (y3 - y4) - (y1 - y3) * (x3 - x4)) / denom;
        Pt2D::checked(x1 + t * (x2 - x1), y1 + t * (y2 - y1))
    }
}

impl fmt::Display for Line {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Line::new(")?;
        writeln!(f, "  Pt2D::new({}, {}),", self.0.x(), self.0.y())?;
        writeln!(f, "  Pt2D::new({}, {}),", self.1.x(), self.1.y())?;
        write!(f, ")")
    }
}

fn is_counter_clockwise(pt1: Pt2D, pt2: Pt2D, pt3: Pt2D) -> bool {
    (pt3.y() - pt1.y()) * (pt2.x() - pt1.x()) > (pt2.y() - pt1.y()) * (pt3.x() - pt1.x())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crossing() {
        let l1 = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 10.0));
        let l2 = Line::must_new(Pt2D::new(0.0, 10.0), Pt2D::new(10.0, 0.0));
        assert_eq!(l1.intersection(&l2), Some(Pt2D::new(5.0, 5.0)));

        // Touching at an endpoint doesn't count
        let l3 = Line::must_new(Pt2D::new(10.0, 10.0), Pt2D::new(20.0, 0.0));
        assert!(!l1.crosses(&l3));
    }

    #[test]
    fn test_shift_and_projection() {
        let l = Line::must_new(Pt2D::new(0.0, 0.0), Pt2D::new(10.0, 0.0));
        let shifted = l.shift_left(2.0);
        assert!(shifted.pt1().approx_eq(Pt2D::new(0.0, 2.0), 1e-6));
        assert!((l.percent_of_projection(Pt2D::new(2.5, 7.0)) - 0.25).abs() < 1e-9);
        assert!(Line::new(Pt2D::new(1.0, 1.0), Pt2D::new(1.0, 1.0)).is_none());
    }
}
