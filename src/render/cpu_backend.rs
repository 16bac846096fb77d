//! Host-memory backend.
//!
//! Keeps every "uploaded" resource in plain vectors and counts acquisitions,
//! releases and uploads. Clones share the same store, so a caller can keep a
//! clone to inspect what a node did with its backend, including after the
//! node is dropped. Used by the preview tool and in headless tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use crate::core::types::Result;
use crate::grid::{InstanceData, InstancePool};

use super::backend::{expand_to_rgba, RenderBackend, TextureDesc};
use super::geometry::Mesh;
use super::material::MaterialParams;

/// Resource category tracked by the ledger.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Geometry,
    Texture,
    Material,
    Instances,
}

/// Opaque handle into a [`CpuBackend`] store.
#[derive(Debug, PartialEq, Eq)]
pub struct CpuHandle(u64);

impl CpuHandle {
    pub fn id(&self) -> u64 {
        self.0
    }
}

/// Per-kind counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct KindCounts {
    pub geometry: usize,
    pub texture: usize,
    pub material: usize,
    pub instances: usize,
}

impl KindCounts {
    fn bump(&mut self, kind: ResourceKind) {
        match kind {
            ResourceKind::Geometry => self.geometry += 1,
            ResourceKind::Texture => self.texture += 1,
            ResourceKind::Material => self.material += 1,
            ResourceKind::Instances => self.instances += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.geometry + self.texture + self.material + self.instances
    }
}

/// Acquisition and upload ledger.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ResourceStats {
    pub created: KindCounts,
    pub released: KindCounts,
    /// Releases of handles that were not live (double release or wrong kind).
    pub invalid_releases: usize,
    pub texture_uploads: usize,
    pub instance_uploads: usize,
}

enum CpuResource {
    Geometry { triangles: usize },
    Texture { desc: TextureDesc, pixels: Vec<u8> },
    Material { params: MaterialParams },
    Instances { marker_triangles: usize, data: Vec<InstanceData> },
}

impl CpuResource {
    fn kind(&self) -> ResourceKind {
        match self {
            CpuResource::Geometry { .. } => ResourceKind::Geometry,
            CpuResource::Texture { .. } => ResourceKind::Texture,
            CpuResource::Material { .. } => ResourceKind::Material,
            CpuResource::Instances { .. } => ResourceKind::Instances,
        }
    }
}

#[derive(Default)]
struct CpuStore {
    next_id: u64,
    live: HashMap<u64, CpuResource>,
    stats: ResourceStats,
}

impl CpuStore {
    fn insert(&mut self, resource: CpuResource) -> CpuHandle {
        let id = self.next_id;
        self.next_id += 1;
        self.stats.created.bump(resource.kind());
        self.live.insert(id, resource);
        CpuHandle(id)
    }

    fn release(&mut self, handle: CpuHandle, kind: ResourceKind) {
        if self.live.get(&handle.0).map(CpuResource::kind) == Some(kind) {
            self.live.remove(&handle.0);
            self.stats.released.bump(kind);
        } else {
            log::warn!("Invalid release of {:?} handle {}", kind, handle.0);
            self.stats.invalid_releases += 1;
        }
    }
}

/// Backend that keeps resources in host memory.
#[derive(Clone, Default)]
pub struct CpuBackend {
    store: Rc<RefCell<CpuStore>>,
}

impl CpuBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stats(&self) -> ResourceStats {
        self.store.borrow().stats
    }

    /// Number of resources acquired and not yet released.
    pub fn live_count(&self) -> usize {
        self.store.borrow().live.len()
    }

    pub fn texture_desc(&self, handle: &CpuHandle) -> Option<TextureDesc> {
        match self.store.borrow().live.get(&handle.0) {
            Some(CpuResource::Texture { desc, .. }) => Some(*desc),
            _ => None,
        }
    }

    /// Current texture contents widened to RGBA8.
    pub fn texture_rgba(&self, handle: &CpuHandle) -> Option<Vec<u8>> {
        match self.store.borrow().live.get(&handle.0) {
            Some(CpuResource::Texture { desc, pixels }) => {
                Some(expand_to_rgba(pixels, desc.layout).into_owned())
            }
            _ => None,
        }
    }

    pub fn instance_data(&self, handle: &CpuHandle) -> Option<Vec<InstanceData>> {
        match self.store.borrow().live.get(&handle.0) {
            Some(CpuResource::Instances { data, .. }) => Some(data.clone()),
            _ => None,
        }
    }

    pub fn marker_triangles(&self, handle: &CpuHandle) -> Option<usize> {
        match self.store.borrow().live.get(&handle.0) {
            Some(CpuResource::Instances { marker_triangles, .. }) => Some(*marker_triangles),
            _ => None,
        }
    }

    pub fn geometry_triangles(&self, handle: &CpuHandle) -> Option<usize> {
        match self.store.borrow().live.get(&handle.0) {
            Some(CpuResource::Geometry { triangles }) => Some(*triangles),
            _ => None,
        }
    }

    pub fn material_params(&self, handle: &CpuHandle) -> Option<MaterialParams> {
        match self.store.borrow().live.get(&handle.0) {
            Some(CpuResource::Material { params }) => Some(*params),
            _ => None,
        }
    }
}

impl RenderBackend for CpuBackend {
    type Geometry = CpuHandle;
    type Texture = CpuHandle;
    type Material = CpuHandle;
    type Instances = CpuHandle;

    fn create_geometry(&mut self, mesh: &Mesh) -> Result<CpuHandle> {
        Ok(self.store.borrow_mut().insert(CpuResource::Geometry {
            triangles: mesh.triangle_count(),
        }))
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<CpuHandle> {
        Ok(self.store.borrow_mut().insert(CpuResource::Texture {
            desc: *desc,
            pixels: pixels.to_vec(),
        }))
    }

    fn create_material(
        &mut self,
        params: &MaterialParams,
        _color: &CpuHandle,
        _displacement: &CpuHandle,
    ) -> Result<CpuHandle> {
        Ok(self.store.borrow_mut().insert(CpuResource::Material { params: *params }))
    }

    fn create_instances(&mut self, marker: &Mesh, pool: &InstancePool) -> Result<CpuHandle> {
        Ok(self.store.borrow_mut().insert(CpuResource::Instances {
            marker_triangles: marker.triangle_count(),
            data: pool.instances().to_vec(),
        }))
    }

    fn write_texture(&mut self, texture: &CpuHandle, pixels: &[u8]) {
        let mut guard = self.store.borrow_mut();
        let store = &mut *guard;
        if let Some(CpuResource::Texture { pixels: stored, .. }) = store.live.get_mut(&texture.0) {
            stored.copy_from_slice(pixels);
            store.stats.texture_uploads += 1;
        } else {
            log::warn!("Upload to unknown texture {}", texture.0);
        }
    }

    fn write_instances(&mut self, instances: &CpuHandle, pool: &InstancePool) {
        let mut guard = self.store.borrow_mut();
        let store = &mut *guard;
        if let Some(CpuResource::Instances { data, .. }) = store.live.get_mut(&instances.0) {
            data.copy_from_slice(pool.instances());
            store.stats.instance_uploads += 1;
        } else {
            log::warn!("Upload to unknown instance buffer {}", instances.0);
        }
    }

    fn release_geometry(&mut self, geometry: CpuHandle) {
        self.store.borrow_mut().release(geometry, ResourceKind::Geometry);
    }

    fn release_texture(&mut self, texture: CpuHandle) {
        self.store.borrow_mut().release(texture, ResourceKind::Texture);
    }

    fn release_material(&mut self, material: CpuHandle) {
        self.store.borrow_mut().release(material, ResourceKind::Material);
    }

    fn release_instances(&mut self, instances: CpuHandle) {
        self.store.borrow_mut().release(instances, ResourceKind::Instances);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::PixelLayout;

    fn desc(layout: PixelLayout) -> TextureDesc {
        TextureDesc {
            label: "test",
            width: 1,
            height: 2,
            layout,
        }
    }

    #[test]
    fn test_create_and_release() {
        let mut backend = CpuBackend::new();
        let observer = backend.clone();
        let tex = backend.create_texture(&desc(PixelLayout::Rgba8), &[0; 8]).unwrap();
        assert_eq!(observer.live_count(), 1);
        backend.release_texture(tex);
        assert_eq!(observer.live_count(), 0);
        assert_eq!(observer.stats().created.texture, 1);
        assert_eq!(observer.stats().released.texture, 1);
        assert_eq!(observer.stats().invalid_releases, 0);
    }

    #[test]
    fn test_wrong_kind_release_is_invalid() {
        let mut backend = CpuBackend::new();
        let tex = backend.create_texture(&desc(PixelLayout::Rgba8), &[0; 8]).unwrap();
        backend.release_geometry(tex);
        assert_eq!(backend.stats().invalid_releases, 1);
        assert_eq!(backend.live_count(), 1);
    }

    #[test]
    fn test_texture_upload_and_expand() {
        let mut backend = CpuBackend::new();
        let tex = backend.create_texture(&desc(PixelLayout::Rgb8), &[0; 6]).unwrap();
        backend.write_texture(&tex, &[1, 2, 3, 4, 5, 6]);
        assert_eq!(backend.texture_rgba(&tex).unwrap(), vec![1, 2, 3, 255, 4, 5, 6, 255]);
        assert_eq!(backend.stats().texture_uploads, 1);
    }
}
