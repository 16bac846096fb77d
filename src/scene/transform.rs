//! Local transform of a renderable node relative to its parent frame.

use glam::{Mat4, Quat, Vec3};

/// Position, orientation and per-axis scale of a node.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub position: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl LocalTransform {
    /// Convert to a 4x4 matrix (scale, then rotate, then translate).
    pub fn to_mat4(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}
