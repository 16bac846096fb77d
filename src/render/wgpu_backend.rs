//! wgpu-backed resources for the grid surface and markers.

use wgpu::util::DeviceExt;

use crate::core::error::Error;
use crate::core::types::Result;
use crate::grid::InstancePool;

use super::backend::{expand_to_rgba, RenderBackend, TextureDesc};
use super::geometry::Mesh;
use super::material::MaterialParams;

/// Vertex and index buffers of a static mesh.
pub struct WgpuGeometry {
    pub vertex_buffer: wgpu::Buffer,
    pub index_buffer: wgpu::Buffer,
    pub index_count: u32,
}

/// Per-cell texture (always Rgba8Unorm on the GPU).
pub struct WgpuTexture {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    pub desc: TextureDesc,
}

/// Material uniform and the bind group tying it to both textures.
pub struct WgpuMaterial {
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
}

/// Marker shape plus per-instance data.
pub struct WgpuInstances {
    pub marker: WgpuGeometry,
    pub instance_buffer: wgpu::Buffer,
    pub instance_count: u32,
}

/// Fail with [`Error::Gpu`] if a texture side exceeds the device limit.
pub fn check_texture_limits(desc: &TextureDesc, limits: &wgpu::Limits) -> Result<()> {
    let max = limits.max_texture_dimension_2d;
    if desc.width > max || desc.height > max {
        return Err(Error::Gpu(format!(
            "{} texture {}x{} exceeds the device limit of {} texels per side",
            desc.label, desc.width, desc.height, max
        )));
    }
    Ok(())
}

/// Fail with [`Error::Gpu`] if a buffer of `size` bytes exceeds the device limit.
pub fn check_buffer_size(label: &str, size: u64, limits: &wgpu::Limits) -> Result<()> {
    if size > limits.max_buffer_size {
        return Err(Error::Gpu(format!(
            "{} buffer of {} bytes exceeds the device limit of {} bytes",
            label, size, limits.max_buffer_size
        )));
    }
    Ok(())
}

/// Backend creating resources on a wgpu device.
pub struct WgpuBackend {
    device: wgpu::Device,
    queue: wgpu::Queue,
    limits: wgpu::Limits,
    material_layout: wgpu::BindGroupLayout,
    sampler: wgpu::Sampler,
}

impl WgpuBackend {
    /// Create a backend on an existing device.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("grid_material_bind_group_layout"),
            entries: &[
                // Material uniform
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: None,
                    },
                    count: None,
                },
                // Color map
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                // Displacement map, sampled in the vertex stage
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::VERTEX,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 3,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        // One texel per cell; never blend neighbours
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("grid_cell_sampler"),
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let limits = device.limits();
        Self {
            device,
            queue,
            limits,
            material_layout,
            sampler,
        }
    }

    /// Create a backend on a fresh device without a surface.
    pub fn headless() -> Result<Self> {
        pollster::block_on(Self::request_headless())
    }

    async fn request_headless() -> Result<Self> {
        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::default(),
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .map_err(|e| Error::Gpu(format!("No suitable adapter found: {:?}", e)))?;

        let (device, queue) = adapter
            .request_device(&wgpu::DeviceDescriptor {
                label: Some("occugrid_device"),
                required_features: wgpu::Features::empty(),
                required_limits: wgpu::Limits::default(),
                memory_hints: wgpu::MemoryHints::Performance,
                experimental_features: Default::default(),
                trace: Default::default(),
            })
            .await
            .map_err(|e| Error::Gpu(e.to_string()))?;

        log::info!("Headless GPU backend on {}", adapter.get_info().name);
        Ok(Self::new(device, queue))
    }

    /// Layout of [`WgpuMaterial::bind_group`], for building the render pipeline.
    pub fn material_layout(&self) -> &wgpu::BindGroupLayout {
        &self.material_layout
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }

    fn upload_mesh(&self, label: &str, mesh: &Mesh) -> Result<WgpuGeometry> {
        let vertex_bytes: &[u8] = bytemuck::cast_slice(&mesh.vertices);
        let index_bytes: &[u8] = bytemuck::cast_slice(&mesh.indices);
        check_buffer_size(label, vertex_bytes.len() as u64, &self.limits)?;
        check_buffer_size(label, index_bytes.len() as u64, &self.limits)?;

        let vertex_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_vertices", label)),
            contents: vertex_bytes,
            usage: wgpu::BufferUsages::VERTEX,
        });
        let index_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}_indices", label)),
            contents: index_bytes,
            usage: wgpu::BufferUsages::INDEX,
        });
        Ok(WgpuGeometry {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }

    fn destroy_geometry(geometry: WgpuGeometry) {
        geometry.vertex_buffer.destroy();
        geometry.index_buffer.destroy();
    }
}

impl RenderBackend for WgpuBackend {
    type Geometry = WgpuGeometry;
    type Texture = WgpuTexture;
    type Material = WgpuMaterial;
    type Instances = WgpuInstances;

    fn create_geometry(&mut self, mesh: &Mesh) -> Result<WgpuGeometry> {
        self.upload_mesh("grid_plane", mesh)
    }

    fn create_texture(&mut self, desc: &TextureDesc, pixels: &[u8]) -> Result<WgpuTexture> {
        check_texture_limits(desc, &self.limits)?;
        let texture = self.device.create_texture(&wgpu::TextureDescriptor {
            label: Some(desc.label),
            size: wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let texture = WgpuTexture {
            texture,
            view,
            desc: *desc,
        };
        self.write_texture(&texture, pixels);
        Ok(texture)
    }

    fn create_material(
        &mut self,
        params: &MaterialParams,
        color: &WgpuTexture,
        displacement: &WgpuTexture,
    ) -> Result<WgpuMaterial> {
        let uniform_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_material_uniform"),
            contents: bytemuck::bytes_of(&params.to_uniform()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("grid_material_bind_group"),
            layout: &self.material_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: uniform_buffer.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&color.view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::TextureView(&displacement.view),
                },
                wgpu::BindGroupEntry {
                    binding: 3,
                    resource: wgpu::BindingResource::Sampler(&self.sampler),
                },
            ],
        });

        Ok(WgpuMaterial {
            uniform_buffer,
            bind_group,
        })
    }

    fn create_instances(&mut self, marker: &Mesh, pool: &InstancePool) -> Result<WgpuInstances> {
        check_buffer_size("grid_marker_instances", pool.as_bytes().len() as u64, &self.limits)?;
        let marker = self.upload_mesh("grid_marker", marker)?;
        let instance_buffer = self.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("grid_marker_instances"),
            contents: pool.as_bytes(),
            usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        });
        Ok(WgpuInstances {
            marker,
            instance_buffer,
            instance_count: pool.len() as u32,
        })
    }

    fn write_texture(&mut self, texture: &WgpuTexture, pixels: &[u8]) {
        let desc = texture.desc;
        let rgba = expand_to_rgba(pixels, desc.layout);
        self.queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &texture.texture,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &rgba,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(desc.width * 4),
                rows_per_image: Some(desc.height),
            },
            wgpu::Extent3d {
                width: desc.width,
                height: desc.height,
                depth_or_array_layers: 1,
            },
        );
        log::trace!("Uploaded {} texture ({}x{})", desc.label, desc.width, desc.height);
    }

    fn write_instances(&mut self, instances: &WgpuInstances, pool: &InstancePool) {
        self.queue.write_buffer(&instances.instance_buffer, 0, pool.as_bytes());
        log::trace!("Uploaded {} marker instances", pool.len());
    }

    fn release_geometry(&mut self, geometry: WgpuGeometry) {
        Self::destroy_geometry(geometry);
    }

    fn release_texture(&mut self, texture: WgpuTexture) {
        texture.texture.destroy();
    }

    fn release_material(&mut self, material: WgpuMaterial) {
        material.uniform_buffer.destroy();
    }

    fn release_instances(&mut self, instances: WgpuInstances) {
        Self::destroy_geometry(instances.marker);
        instances.instance_buffer.destroy();
    }
}
