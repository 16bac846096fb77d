//! Optional post-update pass that dims markers hidden behind scene geometry.
//!
//! Only instance colors change; matrices and instance count stay as the
//! last update left them.

use glam::Vec3;

use crate::core::types::Result;
use crate::math::{Aabb, Ray};

use super::backend::RenderBackend;
use super::node::OccupancyGridNode;

/// Hits closer than the marker by less than this fraction of the distance
/// are treated as the marker itself.
const HIT_TOLERANCE: f32 = 1e-4;

/// Scene intersection query supplied by the scene-graph collaborator.
pub trait OcclusionQuery {
    /// Distance along `ray` to the nearest scene hit, if any.
    fn first_hit(&self, ray: &Ray) -> Option<f32>;
}

/// Occluders given as world-space boxes.
#[derive(Clone, Debug, Default)]
pub struct AabbOccluders {
    pub boxes: Vec<Aabb>,
}

impl AabbOccluders {
    pub fn new(boxes: Vec<Aabb>) -> Self {
        Self { boxes }
    }
}

impl OcclusionQuery for AabbOccluders {
    fn first_hit(&self, ray: &Ray) -> Option<f32> {
        self.boxes
            .iter()
            .filter_map(|aabb| ray.intersects_aabb(aabb).map(|(t_near, _)| t_near))
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl<B: RenderBackend> OccupancyGridNode<B> {
    /// Dim every marker whose line of sight from `eye` is blocked.
    ///
    /// Markers that are visible get their class color back, so the pass can
    /// be repeated after the eye moves. Returns the number of occluded
    /// markers; marks the instance buffer dirty if any color changed.
    pub fn apply_occlusion(
        &mut self,
        eye: Vec3,
        query: &dyn OcclusionQuery,
        dim: f32,
    ) -> Result<usize> {
        self.ensure_live()?;
        let world = self.transform().to_mat4();

        let pool = self.state_mut().instances_mut();
        let mut occluded = 0;
        let mut changed = false;

        for index in 0..pool.len() {
            let instance = pool.instances()[index];
            let center = world.transform_point3(instance.translation());
            let base = pool.base_color(pool.class_at(index));

            let hidden = match Ray::towards(eye, center) {
                Some((ray, distance)) => query
                    .first_hit(&ray)
                    .is_some_and(|t| t < distance * (1.0 - HIT_TOLERANCE)),
                None => false,
            };
            let color = if hidden {
                occluded += 1;
                [base[0] * dim, base[1] * dim, base[2] * dim, base[3]]
            } else {
                base
            };

            if instance.color != color {
                pool.set_color(index, color);
                changed = true;
            }
        }

        if changed {
            self.state_mut().mark_instances_dirty();
        }
        log::debug!("Occlusion pass: {} markers hidden", occluded);
        Ok(occluded)
    }
}
