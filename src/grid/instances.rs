//! Instance-space marker pool: one rigid instance per grid cell.
//!
//! Instances are laid out with stride `width` (`row * width + col`), in the
//! same top-to-bottom row order as the texture buffers. Positions are in
//! cell units around the grid center; the node transform scales them into
//! world space.

use std::f32::consts::PI;

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Quat, Vec3};

use super::cell::CellClass;

/// Per-instance GPU data (must match the instanced vertex attributes)
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceData {
    /// Column-major model matrix (64 bytes, offset 0)
    pub model: [[f32; 4]; 4],
    /// Linear RGBA color (16 bytes, offset 64)
    pub color: [f32; 4],
}

impl InstanceData {
    const ATTRIBUTES: [wgpu::VertexAttribute; 5] = wgpu::vertex_attr_array![
        3 => Float32x4,
        4 => Float32x4,
        5 => Float32x4,
        6 => Float32x4,
        7 => Float32x4,
    ];

    /// Vertex buffer layout for the instance step.
    pub fn layout<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceData>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &Self::ATTRIBUTES,
        }
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::from_slice(&self.model[3][..3])
    }
}

/// Fixed-capacity pool of marker instances.
#[derive(Clone, Debug)]
pub struct InstancePool {
    width: u32,
    height: u32,
    /// Half span of the larger grid axis, in cells.
    offset: f32,
    z_offset: f32,
    alert_color: [f32; 4],
    neutral_color: [f32; 4],
    instances: Vec<InstanceData>,
    classes: Vec<CellClass>,
}

impl InstancePool {
    pub fn new(
        width: u32,
        height: u32,
        z_offset: f32,
        alert_color: [f32; 4],
        neutral_color: [f32; 4],
    ) -> Self {
        let amount = width.max(height);
        let capacity = width as usize * height as usize;
        Self {
            width,
            height,
            offset: (amount as f32 - 1.0) / 2.0,
            z_offset,
            alert_color,
            neutral_color,
            instances: vec![InstanceData::zeroed(); capacity],
            classes: vec![CellClass::Unknown; capacity],
        }
    }

    pub fn len(&self) -> usize {
        self.instances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instances.is_empty()
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    #[inline]
    pub fn index(&self, row: u32, col: u32) -> usize {
        row as usize * self.width as usize + col as usize
    }

    pub fn instances(&self) -> &[InstanceData] {
        &self.instances
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.instances)
    }

    pub fn get(&self, row: u32, col: u32) -> &InstanceData {
        &self.instances[self.index(row, col)]
    }

    pub fn class_at(&self, index: usize) -> CellClass {
        self.classes[index]
    }

    /// Marker color for a cell class before any post-pass tinting.
    pub fn base_color(&self, class: CellClass) -> [f32; 4] {
        if class.is_blocking() {
            self.alert_color
        } else {
            self.neutral_color
        }
    }

    /// Place the marker of texture-space cell `(row, col)`.
    ///
    /// Blocking markers sit below the surface flipped about X; free markers
    /// sit above it unrotated, so the two layers never z-fight.
    pub(crate) fn set_cell(&mut self, row: u32, col: u32, class: CellClass) {
        let x = -self.offset + col as f32;
        let y = self.offset - row as f32;
        let (z, rotation) = if class.is_blocking() {
            (-self.z_offset, Quat::from_rotation_x(PI))
        } else {
            (self.z_offset, Quat::IDENTITY)
        };
        let model = Mat4::from_rotation_translation(rotation, Vec3::new(x, y, z));

        let index = self.index(row, col);
        self.instances[index] = InstanceData {
            model: model.to_cols_array_2d(),
            color: self.base_color(class),
        };
        self.classes[index] = class;
    }

    pub(crate) fn set_color(&mut self, index: usize, color: [f32; 4]) {
        self.instances[index].color = color;
    }
}
