use std::f64::consts::PI;
use std::fmt;

use serde::{Deserialize, Serialize};

/// An angle, stored in radians.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Angle(f64);

impl Angle {
    pub const ZERO: Angle = Angle(0.0);

    pub fn new_rads(rads: f64) -> Angle {
        Angle(rads)
    }

    pub fn degrees(degs: f64) -> Angle {
        Angle(degs.to_radians())
    }

    pub fn opposite(self) -> Angle {
        Angle(self.0 + PI)
    }

    pub fn rotate_degs(self, degrees: f64) -> Angle {
        Angle(self.0 + degrees.to_radians())
    }

    /// The raw value, in (-pi, pi] if this came from `atan2`.
    pub fn radians(self) -> f64 {
        self.0
    }

    /// Returns [0, 2pi)
    pub fn normalized_radians(self) -> f64 {
        let r = self.0.rem_euclid(2.0 * PI);
        if r >= 2.0 * PI {
            0.0
        } else {
            r
        }
    }

    /// Returns [0, 360)
    pub fn normalized_degrees(self) -> f64 {
        self.normalized_radians().to_degrees()
    }

    /// Absolute difference in [0, pi], ignoring which way around the circle is shorter.
    pub fn approx_diff(self, other: Angle) -> f64 {
        let d = (self.normalized_radians() - other.normalized_radians()).abs();
        d.min(2.0 * PI - d)
    }
}

impl fmt::Display for Angle {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Angle({} degrees)", self.normalized_degrees())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized() {
        assert!((Angle::degrees(-90.0).normalized_degrees() - 270.0).abs() < 1e-9);
        assert!((Angle::degrees(450.0).normalized_degrees() - 90.0).abs() < 1e-9);
        assert!((Angle::degrees(10.0).approx_diff(Angle::degrees(350.0)) - 20f64.to_radians()).abs() < 1e-9);
    }
}
