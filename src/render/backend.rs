//! Seam between the grid node and the scene-graph/rendering collaborator.
//!
//! A backend owns the actual GPU-resident objects. The node acquires one
//! geometry, two textures, one material and one instance buffer through it,
//! pushes re-uploads when its host buffers change, and hands every handle
//! back exactly once.

use std::borrow::Cow;

use crate::core::types::Result;
use crate::grid::{InstancePool, PixelLayout};

use super::geometry::Mesh;
use super::material::MaterialParams;

/// Description of a per-cell texture.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TextureDesc {
    pub label: &'static str,
    pub width: u32,
    pub height: u32,
    /// Layout of the host pixels handed to the backend.
    pub layout: PixelLayout,
}

/// GPU resource allocator and uploader.
pub trait RenderBackend {
    type Geometry;
    type Texture;
    type Material;
    type Instances;

    fn create_geometry(&mut self, mesh: &Mesh) -> Result<Self::Geometry>;

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<Self::Texture>;

    fn create_material(
        &mut self,
        params: &MaterialParams,
        color: &Self::Texture,
        displacement: &Self::Texture,
    ) -> Result<Self::Material>;

    /// Instanced marker batch: shared `marker` shape, one instance per pool entry.
    fn create_instances(&mut self, marker: &Mesh, pool: &InstancePool) -> Result<Self::Instances>;

    /// Replace the full contents of a texture.
    fn write_texture(&mut self, texture: &Self::Texture, pixels: &[u8]);

    /// Replace the full contents of an instance buffer.
    fn write_instances(&mut self, instances: &Self::Instances, pool: &InstancePool);

    fn release_geometry(&mut self, geometry: Self::Geometry);

    fn release_texture(&mut self, texture: Self::Texture);

    fn release_material(&mut self, material: Self::Material);

    fn release_instances(&mut self, instances: Self::Instances);
}

/// Widen host pixels to RGBA8, the only 8-bit color layout GPUs sample.
pub fn expand_to_rgba(pixels: &[u8], layout: PixelLayout) -> Cow<'_, [u8]> {
    match layout {
        PixelLayout::Rgba8 => Cow::Borrowed(pixels),
        PixelLayout::Rgb8 => Cow::Owned(
            pixels
                .chunks_exact(3)
                .flat_map(|p| [p[0], p[1], p[2], 255])
                .collect(),
        ),
    }
}
