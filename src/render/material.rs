//! Surface material parameters

use bytemuck::{Pod, Zeroable};

use crate::grid::GridConfig;

/// Material settings derived from the grid configuration.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MaterialParams {
    pub base_color: [f32; 4],
    pub opacity: f32,
    pub shininess: f32,
    pub displacement_scale: f32,
}

impl MaterialParams {
    pub fn from_config(config: &GridConfig) -> Self {
        Self {
            base_color: config.color.to_f32(),
            opacity: config.opacity,
            shininess: config.shininess,
            displacement_scale: config.displacement_scale,
        }
    }

    pub fn to_uniform(&self) -> MaterialUniform {
        MaterialUniform {
            base_color: self.base_color,
            opacity: self.opacity,
            shininess: self.shininess,
            displacement_scale: self.displacement_scale,
            _pad: 0.0,
        }
    }
}

/// Material uniform data for GPU (must match shader struct exactly)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    /// Base color (16 bytes, offset 0)
    pub base_color: [f32; 4],
    /// Opacity (4 bytes, offset 16)
    pub opacity: f32,
    /// Specular exponent (4 bytes, offset 20)
    pub shininess: f32,
    /// Displacement map multiplier (4 bytes, offset 24)
    pub displacement_scale: f32,
    /// Padding to 32 bytes (4 bytes, offset 28)
    pub _pad: f32,
}
