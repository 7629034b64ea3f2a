use serde::{Deserialize, Serialize};

use geom::{Angle, Pt3D};

/// A copy of some externally loaded model, placed in the world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Instance {
    pub model: String,
    pub pos: Pt3D,
    /// Rotation around the z axis
    pub angle: Angle,
    pub scale: f64,
}

/// Receives every model instance once meshing is done and heights are final.
pub trait InstancePlacer {
    fn place(&mut self, instance: Instance);
}

impl InstancePlacer for Vec<Instance> {
    fn place(&mut self, instance: Instance) {
        self.push(instance);
    }
}

/// Throws everything away.
pub struct NoInstances;

impl InstancePlacer for NoInstances {
    fn place(&mut self, _: Instance) {}
}
