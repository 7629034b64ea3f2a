use std::fmt;

use anyhow::Result;
use geo::Contains;
use serde::{Deserialize, Serialize};

use crate::{Bounds, Pt2D, EPSILON_DIST};

/// Maybe a misnomer, but like a PolyLine, but closed.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Ring {
    // first equals last
    pts: Vec<Pt2D>,
}

impl Ring {
    pub fn new(pts: Vec<Pt2D>) -> Result<Ring> {
        if pts.len() < 4 {
            bail!("Can't make a ring with < 4 points");
        }
        if pts[0] != *pts.last().unwrap() {
            bail!("Can't make a ring with mismatching first/last points");
        }
        if let Some(pair) = pts.windows(2).find(|pair| pair[0].approx_eq(pair[1], EPSILON_DIST)) {
            bail!("Ring has duplicate adjacent points near {}", pair[0]);
        }

        Ok(Ring { pts })
    }

    /// Closes the loop if needed and removes near-duplicate points first.
    pub fn deduping_new(mut pts: Vec<Pt2D>) -> Result<Ring> {
        pts = Pt2D::approx_dedupe(pts, EPSILON_DIST);
        if pts.len() >= 2 && pts[0].approx_eq(*pts.last().unwrap(), EPSILON_DIST) {
            pts.pop();
        }
        if let Some(first) = pts.first().cloned() {
            pts.push(first);
        }
        Ring::new(pts)
    }

    pub fn points(&self) -> &Vec<Pt2D> {
        &self.pts
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.pts)
    }

    /// Positive when the points go counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        let mut sum = 0.0;
        for pair in self.pts.windows(2) {
            sum += pair[0].x() * pair[1].y() - pair[1].x() * pair[0].y();
        }
        sum / 2.0
    }

    pub fn contains_pt(&self, pt: Pt2D) -> bool {
        geo::Polygon::from(self).contains(&geo::Point::new(pt.x(), pt.y()))
    }

    /// Points spaced at most `step` apart along the whole perimeter, excluding the closing point.
    pub fn sample_perimeter(&self, step: f64) -> Vec<Pt2D> {
        let mut result = Vec::new();
        for pair in self.pts.windows(2) {
            let len = pair[0].dist_to(pair[1]);
            let n = (len / step).ceil().max(1.0) as usize;
            for i in 0..n {
                result.push(pair[0].lerp(pair[1], (i as f64) / (n as f64)));
            }
        }
        result
    }
}

impl fmt::Display for Ring {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        writeln!(f, "Ring::new(vec![")?;
        for pt in &self.pts {
            writeln!(f, "  Pt2D::new({}, {}),", pt.x(), pt.y())?;
        }
        write!(f, "])")
    }
}

impl From<&Ring> for geo::Polygon<f64> {
    fn from(ring: &Ring) -> Self {
        let coords: Vec<geo::Coordinate<f64>> = ring
            .pts
            .iter()
            .map(|pt| geo::Coordinate { x: pt.x(), y: pt.y() })
            .collect();
        geo::Polygon::new(geo::LineString::from(coords), Vec::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Ring {
        Ring::deduping_new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(10.0, 0.0),
            Pt2D::new(10.0, 10.0),
            Pt2D::new(0.0, 10.0),
        ])
        .unwrap()
    }

    #[test]
    fn test_square() {
        let ring = square();
        assert_eq!(ring.points().len(), 5);
        assert!((ring.signed_area() - 100.0).abs() < 1e-9);
        assert!(ring.contains_pt(Pt2D::new(5.0, 5.0)));
        assert!(!ring.contains_pt(Pt2D::new(15.0, 5.0)));
        assert_eq!(ring.sample_perimeter(5.0).len(), 8);
    }

    #[test]
    fn test_invalid() {
        assert!(Ring::new(vec![Pt2D::new(0.0, 0.0), Pt2D::new(1.0, 0.0)]).is_err());
        assert!(Ring::new(vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(1.0, 0.0),
            Pt2D::new(1.0, 1.0),
            Pt2D::new(0.0, 1.0),
        ])
        .is_err());
    }
}
