//! Plain 2D/3D geometry used while meshing a street graph. Everything is in world-space units;
//! `GPSBounds` maps back to longitude/latitude when a message needs to name a real place.

#[macro_use]
extern crate anyhow;

mod angle;
mod bounds;
mod gps;
mod line;
mod pt;
mod ring;
mod tessellation;

pub use crate::angle::Angle;
pub use crate::bounds::Bounds;
pub use crate::gps::{GPSBounds, LonLat};
pub use crate::line::Line;
pub use crate::pt::{HashablePt2D, HashablePt3D, Pt2D, Pt3D};
pub use crate::ring::Ring;
pub use crate::tessellation::{Tessellation, Triangle};

/// Some geometry operations can't be done with perfect precision. Points closer than this are
/// treated as the same.
pub const EPSILON_DIST: f64 = 0.01;

/// Reduce the precision of an f64. Points computed independently from both sides of a shared
/// edge then hash to the same value.
pub fn trim_f64(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}
