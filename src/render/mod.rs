//! GPU-facing side of the grid: meshes, material, backends and the node

pub mod backend;
pub mod cpu_backend;
pub mod geometry;
pub mod material;
pub mod node;
pub mod occlusion;
pub mod wgpu_backend;

pub use backend::{RenderBackend, TextureDesc};
pub use cpu_backend::{CpuBackend, CpuHandle, ResourceStats};
pub use geometry::{Mesh, Vertex};
pub use material::{MaterialParams, MaterialUniform};
pub use node::{GridResources, OccupancyGridNode};
pub use occlusion::{AabbOccluders, OcclusionQuery};
pub use wgpu_backend::WgpuBackend;
