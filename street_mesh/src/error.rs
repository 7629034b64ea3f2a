use std::{error, fmt};

use geom::Pt3D;

/// Problems that abort building the whole mesh. These travel inside `anyhow::Error`; callers that
/// care about the specific problem can `downcast_ref::<MeshError>()`.
#[derive(Clone, Debug, PartialEq)]
pub enum MeshError {
    /// A way references a node that was never defined
    MissingNode { way: String, node: String },
    DuplicateNode(String),
    /// Buildings must be closed polygons
    UnclosedArea { way: String },
    InvalidCurbAlpha {
        way: String,
        curb_alpha: f64,
        curb2_alpha: f64,
    },
    UnknownDrivingDirection(String),
    /// The open boundary handed to extrusion crosses itself or is wound inconsistently
    Boundary { from: Pt3D, to: Pt3D },
    /// The triangulator rejected an area. `location` names a real-world place when GPS bounds are
    /// known.
    Triangulation {
        way: String,
        location: String,
        reason: String,
    },
}

impl fmt::Display for MeshError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            MeshError::MissingNode { way, node } => {
                write!(f, "way {} references missing node {}", way, node)
            }
            MeshError::DuplicateNode(id) => write!(f, "node {} is defined twice", id),
            MeshError::UnclosedArea { way } => {
                write!(f, "way {} must be closed, but its first and last nodes differ", way)
            }
            MeshError::InvalidCurbAlpha {
                way,
                curb_alpha,
                curb2_alpha,
            } => write!(
                f,
                "way {} needs 0 < curb_alpha <= curb2_alpha <= 1, but has curb_alpha={}, \
                 curb2_alpha={}",
                way, curb_alpha, curb2_alpha
            ),
            MeshError::UnknownDrivingDirection(x) => {
                write!(f, "unknown driving direction {:?}; use center, left, or right", x)
            }
            MeshError::Boundary { from, to } => {
                write!(f, "bad extrusion boundary edge from {} to {}", from, to)
            }
            MeshError::Triangulation {
                way,
                location,
                reason,
            } => write!(
                f,
                "couldn't triangulate way {} near {}: {}",
                way, location, reason
            ),
        }
    }
}

impl error::Error for MeshError {}
