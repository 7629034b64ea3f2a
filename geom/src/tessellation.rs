use anyhow::Result;

use crate::{Bounds, Pt2D, Ring};

/// A tessellated polygon, ready for rendering.
#[derive(Clone, Debug)]
pub struct Tessellation {
    /// These points aren't in any meaningful order. It's not generally possible to reconstruct a
    /// `Ring` from this.
    points: Vec<Pt2D>,
    /// Groups of three indices make up the triangles
    indices: Vec<usize>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub pt1: Pt2D,
    pub pt2: Pt2D,
    pub pt3: Pt2D,
}

impl Triangle {
    /// Positive when the points go counter-clockwise.
    pub fn signed_area(&self) -> f64 {
        ((self.pt2.x() - self.pt1.x()) * (self.pt3.y() - self.pt1.y())
            - (self.pt3.x() - self.pt1.x()) * (self.pt2.y() - self.pt1.y()))
            / 2.0
    }

    /// The same triangle, wound counter-clockwise.
    pub fn to_ccw(self) -> Triangle {
        if self.signed_area() < 0.0 {
            Triangle {
                pt1: self.pt1,
                pt2: self.pt3,
                pt3: self.pt2,
            }
        } else {
            self
        }
    }
}

impl Tessellation {
    /// Triangulates the ring with earcut. Fails when earcut gives up, which happens for badly
    /// degenerate input; the caller knows enough to describe where that happened.
    pub fn from_ring(ring: &Ring) -> Result<Tessellation> {
        // Earcut doesn't want the closing point
        let pts = &ring.points()[..ring.points().len() - 1];
        let mut vertices = Vec::new();
        for pt in pts {
            vertices.push(pt.x());
            vertices.push(pt.y());
        }
        let indices = earcutr::earcut(&vertices, &Vec::new(), 2)?;
        if indices.is_empty() {
            bail!("earcut produced no triangles for {} points", pts.len());
        }

        Ok(Tessellation {
            points: pts.to_vec(),
            indices,
        })
    }

    pub fn triangles(&self) -> Vec<Triangle> {
        let mut triangles: Vec<Triangle> = Vec::new();
        for slice in self.indices.chunks_exact(3) {
            triangles.push(Triangle {
                pt1: self.points[slice[0]],
                pt2: self.points[slice[1]],
                pt3: self.points[slice[2]],
            });
        }
        triangles
    }

    pub fn get_bounds(&self) -> Bounds {
        Bounds::from(&self.points)
    }
}
