//! Transform placer: aligns the rendered surface with the grid origin.
//!
//! The surface primitive is centered on its own origin while the grid
//! origin is its bottom-left corner, so the node is shifted by half the
//! grid extent and scaled so that one primitive unit spans one cell.

use crate::core::types::Vec3;
use crate::scene::LocalTransform;

use super::message::GridInfo;

/// Quaternion norms further than this from 1.0 are reported.
const NORM_TOLERANCE: f64 = 1e-3;

/// Compute the node transform for `info`.
pub fn place(info: &GridInfo) -> LocalTransform {
    let origin = &info.origin;
    let norm = origin.orientation.norm();
    if (norm - 1.0).abs() > NORM_TOLERANCE {
        log::warn!(
            "Grid origin orientation is not a unit quaternion (norm {:.4}); using it as-is",
            norm
        );
    }

    let resolution = info.resolution as f64;
    let position = Vec3::new(
        ((info.width as f64 * resolution) / 2.0 + origin.position.x) as f32,
        ((info.height as f64 * resolution) / 2.0 + origin.position.y) as f32,
        origin.position.z as f32,
    );

    LocalTransform {
        position,
        rotation: origin.orientation.to_quat(),
        scale: Vec3::splat(info.resolution),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::message::{Point, Quaternion};
    use glam::Quat;

    #[test]
    fn test_recentering() {
        let mut info = GridInfo::new(4, 2, 0.5);
        info.origin.position = Point::new(1.0, 1.0, 0.0);
        let t = place(&info);
        assert_eq!(t.position, Vec3::new(2.0, 1.5, 0.0));
        assert_eq!(t.scale, Vec3::splat(0.5));
        assert_eq!(t.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_z_passthrough() {
        let mut info = GridInfo::new(10, 10, 0.1);
        info.origin.position = Point::new(-5.0, -5.0, 0.25);
        let t = place(&info);
        assert!((t.position - Vec3::new(-4.5, -4.5, 0.25)).length() < 1e-6);
    }

    #[test]
    fn test_orientation_copied_verbatim() {
        let mut info = GridInfo::new(1, 1, 1.0);
        let half = std::f64::consts::FRAC_1_SQRT_2;
        info.origin.orientation = Quaternion::new(0.0, 0.0, half, half);
        let t = place(&info);
        assert!((t.rotation.z - half as f32).abs() < 1e-7);
        assert!((t.rotation.w - half as f32).abs() < 1e-7);

        // non-unit input is not renormalized
        info.origin.orientation = Quaternion::new(0.0, 0.0, 0.0, 2.0);
        assert_eq!(place(&info).rotation.w, 2.0);
    }
}
