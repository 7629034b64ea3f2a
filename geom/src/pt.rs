use std::fmt;

use ordered_float::NotNan;
use serde::{Deserialize, Serialize};

use crate::{trim_f64, Angle, EPSILON_DIST};

/// This represents world-space; one unit is `1 / scale` meters.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt2D {
    x: f64,
    y: f64,
}

impl Pt2D {
    pub fn new(x: f64, y: f64) -> Pt2D {
        if !x.is_finite() || !y.is_finite() {
            panic!("Bad Pt2D {}, {}", x, y);
        }

        Pt2D {
            x: trim_f64(x),
            y: trim_f64(y),
        }
    }

    /// Like `new`, but None for NaN or infinite coordinates, which degenerate geometry can
    /// produce.
    pub fn checked(x: f64, y: f64) -> Option<Pt2D> {
        if x.is_finite() && y.is_finite() {
            Some(Pt2D::new(x, y))
        } else {
            None
        }
    }

    pub fn zero() -> Pt2D {
        Pt2D::new(0.0, 0.0)
    }

    pub fn x(self) -> f64 {
        self.x
    }

    pub fn y(self) -> f64 {
        self.y
    }

    pub fn approx_eq(self, other: Pt2D, threshold: f64) -> bool {
        self.dist_to(other) <= threshold
    }

    pub fn dist_to(self, to: Pt2D) -> f64 {
        ((self.x - to.x).powi(2) + (self.y - to.y).powi(2)).sqrt()
    }

    pub fn project_away(self, dist: f64, theta: Angle) -> Pt2D {
        let (sin, cos) = theta.radians().sin_cos();
        Pt2D::new(self.x + dist * cos, self.y + dist * sin)
    }

    /// Cartesian, counter-clockwise from the positive x axis.
    pub fn angle_to(self, to: Pt2D) -> Angle {
        Angle::new_rads((to.y - self.y).atan2(to.x - self.x))
    }

    pub fn offset(self, dx: f64, dy: f64) -> Pt2D {
        Pt2D::new(self.x + dx, self.y + dy)
    }

    pub fn lerp(self, other: Pt2D, pct: f64) -> Pt2D {
        Pt2D::new(
            self.x + pct * (other.x - self.x),
            self.y + pct * (other.y - self.y),
        )
    }

    pub fn center(pts: &[Pt2D]) -> Pt2D {
        if pts.is_empty() {
            return Pt2D::zero();
        }
        let mut x = 0.0;
        let mut y = 0.0;
        for pt in pts {
            x += pt.x;
            y += pt.y;
        }
        let len = pts.len() as f64;
        Pt2D::new(x / len, y / len)
    }

    /// Removes consecutive points closer than `threshold`.
    pub fn approx_dedupe(pts: Vec<Pt2D>, threshold: f64) -> Vec<Pt2D> {
        let mut result: Vec<Pt2D> = Vec::new();
        for pt in pts {
            if result.is_empty() || !result.last().unwrap().approx_eq(pt, threshold) {
                result.push(pt);
            }
        }
        result
    }

    pub fn to_hashable(self) -> HashablePt2D {
        HashablePt2D::new(self.x, self.y)
    }

    pub fn to_3d(self, z: f64) -> Pt3D {
        Pt3D::new(self.x, self.y, z)
    }

    pub fn is_close(self, other: Pt2D) -> bool {
        self.approx_eq(other, EPSILON_DIST)
    }
}

impl fmt::Display for Pt2D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt2D({0}, {1})", self.x, self.y)
    }
}

/// A vertex position after height has been applied. `z` points up.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Pt3D {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Pt3D {
    pub fn new(x: f64, y: f64, z: f64) -> Pt3D {
        if !x.is_finite() || !y.is_finite() || !z.is_finite() {
            panic!("Bad Pt3D {}, {}, {}", x, y, z);
        }
        Pt3D {
            x: trim_f64(x),
            y: trim_f64(y),
            z: trim_f64(z),
        }
    }

    pub fn to_2d(self) -> Pt2D {
        Pt2D::new(self.x, self.y)
    }

    pub fn offset_z(self, dz: f64) -> Pt3D {
        Pt3D::new(self.x, self.y, self.z + dz)
    }

    pub fn dist_to(self, to: Pt3D) -> f64 {
        ((self.x - to.x).powi(2) + (self.y - to.y).powi(2) + (self.z - to.z).powi(2)).sqrt()
    }

    pub fn to_hashable(self) -> HashablePt3D {
        HashablePt3D {
            x_nan: NotNan::new(self.x).unwrap(),
            y_nan: NotNan::new(self.y).unwrap(),
            z_nan: NotNan::new(self.z).unwrap(),
        }
    }
}

impl fmt::Display for Pt3D {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Pt3D({0}, {1}, {2})", self.x, self.y, self.z)
    }
}

/// This isn't opinionated about what the (x, y) represents. Only construct from finite values;
/// `Pt2D` guarantees that.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HashablePt2D {
    x_nan: NotNan<f64>,
    y_nan: NotNan<f64>,
}

impl HashablePt2D {
    fn new(x: f64, y: f64) -> HashablePt2D {
        HashablePt2D {
            x_nan: NotNan::new(x).unwrap(),
            y_nan: NotNan::new(y).unwrap(),
        }
    }
}

impl From<Pt2D> for HashablePt2D {
    fn from(pt: Pt2D) -> Self {
        pt.to_hashable()
    }
}

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord)]
pub struct HashablePt3D {
    x_nan: NotNan<f64>,
    y_nan: NotNan<f64>,
    z_nan: NotNan<f64>,
}

impl HashablePt3D {
    pub fn to_2d(self) -> HashablePt2D {
        HashablePt2D {
            x_nan: self.x_nan,
            y_nan: self.y_nan,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trimmed_points_hash_equal() {
        let a = Pt2D::new(1.0 / 3.0, 2.0);
        let b = Pt2D::new(0.333_333_333_1, 2.000_000_01);
        assert_eq!(a.to_hashable(), b.to_hashable());
    }

    #[test]
    fn test_checked() {
        assert!(Pt2D::checked(f64::NAN, 0.0).is_none());
        assert!(Pt2D::checked(1.0, f64::INFINITY).is_none());
        assert_eq!(Pt2D::checked(1.0, 2.0), Some(Pt2D::new(1.0, 2.0)));
    }

    #[test]
    fn test_center_and_dedupe() {
        let pts = vec![
            Pt2D::new(0.0, 0.0),
            Pt2D::new(0.001, 0.0),
            Pt2D::new(2.0, 0.0),
            Pt2D::new(2.0, 2.0),
        ];
        let deduped = Pt2D::approx_dedupe(pts, 0.01);
        assert_eq!(deduped.len(), 3);
        assert_eq!(
            Pt2D::center(&[Pt2D::new(0.0, 0.0), Pt2D::new(2.0, 4.0)]),
            Pt2D::new(1.0, 2.0)
        );
    }
}
