//! Renderable occupancy grid node.
//!
//! Construction binds the grid dimensions, fills every host buffer and
//! acquires the GPU-resident resources through a [`RenderBackend`]. Each
//! later message rewrites the host buffers in place and raises dirty flags;
//! [`OccupancyGridNode::flush_uploads`] pushes the dirty buffers to the
//! backend. Resources are handed back exactly once, by
//! [`OccupancyGridNode::dispose`] or on drop.

use crate::core::error::Error;
use crate::core::types::Result;
use crate::grid::{
    place, CellStyle, DirtyFlags, GridConfig, GridMessage, PixelLayout, RenderState, ScaledColor,
};
use crate::scene::LocalTransform;

use super::backend::{RenderBackend, TextureDesc};
use super::geometry;
use super::material::MaterialParams;

/// GPU-resident resources owned by one node.
pub struct GridResources<B: RenderBackend> {
    pub geometry: B::Geometry,
    pub color_texture: B::Texture,
    pub displacement_texture: B::Texture,
    pub material: B::Material,
    pub instances: B::Instances,
}

impl<B: RenderBackend> GridResources<B> {
    fn acquire(backend: &mut B, state: &RenderState) -> Result<Self> {
        let config = state.config();
        let (width, height) = (state.width(), state.height());

        let plane = geometry::plane(width as f32, height as f32, config.plane_segments);
        let geometry = backend.create_geometry(&plane)?;

        let color_desc = TextureDesc {
            label: "grid_color",
            width,
            height,
            layout: PixelLayout::Rgba8,
        };
        let color_texture = match backend.create_texture(&color_desc, state.buffers().color()) {
            Ok(texture) => texture,
            Err(e) => {
                backend.release_geometry(geometry);
                return Err(e);
            }
        };

        let displacement_desc = TextureDesc {
            label: "grid_displacement",
            width,
            height,
            layout: state.buffers().displacement_layout(),
        };
        let displacement_texture =
            match backend.create_texture(&displacement_desc, state.buffers().displacement()) {
                Ok(texture) => texture,
                Err(e) => {
                    backend.release_geometry(geometry);
                    backend.release_texture(color_texture);
                    return Err(e);
                }
            };

        let params = MaterialParams::from_config(config);
        let material =
            match backend.create_material(&params, &color_texture, &displacement_texture) {
                Ok(material) => material,
                Err(e) => {
                    backend.release_geometry(geometry);
                    backend.release_texture(color_texture);
                    backend.release_texture(displacement_texture);
                    return Err(e);
                }
            };

        let marker = geometry::icosphere(config.marker_radius, config.marker_subdivisions);
        let instances = match backend.create_instances(&marker, state.instances()) {
            Ok(instances) => instances,
            Err(e) => {
                backend.release_geometry(geometry);
                backend.release_texture(color_texture);
                backend.release_texture(displacement_texture);
                backend.release_material(material);
                return Err(e);
            }
        };

        Ok(Self {
            geometry,
            color_texture,
            displacement_texture,
            material,
            instances,
        })
    }

    fn release(self, backend: &mut B) {
        backend.release_geometry(self.geometry);
        backend.release_texture(self.color_texture);
        backend.release_texture(self.displacement_texture);
        backend.release_material(self.material);
        backend.release_instances(self.instances);
    }
}

/// A single occupancy grid rendered as a textured surface plus per-cell markers.
pub struct OccupancyGridNode<B: RenderBackend> {
    backend: B,
    state: RenderState,
    transform: LocalTransform,
    /// `None` once disposed.
    resources: Option<GridResources<B>>,
}

impl<B: RenderBackend> OccupancyGridNode<B> {
    /// Build a node that colors free cells by scaling `config.color`.
    pub fn new(backend: B, message: &GridMessage, config: GridConfig) -> Result<Self> {
        let style = Box::new(ScaledColor::new(config.color));
        Self::with_style(backend, message, config, style)
    }

    /// Build a node with custom cell value/color hooks.
    pub fn with_style(
        mut backend: B,
        message: &GridMessage,
        config: GridConfig,
        style: Box<dyn CellStyle>,
    ) -> Result<Self> {
        let state = RenderState::new(message, config, style)?;
        let transform = place(&message.info);
        let resources = GridResources::acquire(&mut backend, &state)?;

        let counts = state.counts();
        log::info!(
            "Created occupancy grid node {}x{} at {:.3} m/cell ({} free, {} occupied, {} unknown)",
            state.width(),
            state.height(),
            message.info.resolution,
            counts.free,
            counts.occupied,
            counts.unknown
        );

        Ok(Self {
            backend,
            state,
            transform,
            resources: Some(resources),
        })
    }

    /// Apply a new message with the same dimensions.
    ///
    /// Host buffers are rewritten in place and marked dirty; nothing is
    /// uploaded until [`flush_uploads`](Self::flush_uploads).
    pub fn update(&mut self, message: &GridMessage) -> Result<()> {
        self.ensure_live()?;
        self.state.apply(message)?;
        self.transform = place(&message.info);

        let counts = self.state.counts();
        log::debug!(
            "Updated grid {}x{}: {} free, {} occupied, {} unknown",
            self.state.width(),
            self.state.height(),
            counts.free,
            counts.occupied,
            counts.unknown
        );
        Ok(())
    }

    /// Re-upload every dirty resource and clear the flags.
    ///
    /// Returns the flags that were pending.
    pub fn flush_uploads(&mut self) -> Result<DirtyFlags> {
        let resources = self.resources.as_ref().ok_or(Error::UseAfterDispose)?;
        let dirty = self.state.take_dirty();

        if dirty.color {
            self.backend
                .write_texture(&resources.color_texture, self.state.buffers().color());
        }
        if dirty.displacement {
            self.backend.write_texture(
                &resources.displacement_texture,
                self.state.buffers().displacement(),
            );
        }
        if dirty.instances {
            self.backend
                .write_instances(&resources.instances, self.state.instances());
        }

        if dirty.any() {
            log::debug!("Flushed grid uploads: {:?}", dirty);
        }
        Ok(dirty)
    }

    /// Release every GPU-resident resource.
    ///
    /// Fails with [`Error::UseAfterDispose`] if already disposed.
    pub fn dispose(&mut self) -> Result<()> {
        let resources = self.resources.take().ok_or(Error::UseAfterDispose)?;
        resources.release(&mut self.backend);
        log::info!(
            "Disposed occupancy grid node {}x{}",
            self.state.width(),
            self.state.height()
        );
        Ok(())
    }

    pub fn is_disposed(&self) -> bool {
        self.resources.is_none()
    }

    pub(crate) fn ensure_live(&self) -> Result<()> {
        if self.resources.is_none() {
            return Err(Error::UseAfterDispose);
        }
        Ok(())
    }

    /// Position, orientation and scale of the node in world space.
    pub fn transform(&self) -> &LocalTransform {
        &self.transform
    }

    pub fn state(&self) -> &RenderState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut RenderState {
        &mut self.state
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn resources(&self) -> Result<&GridResources<B>> {
        self.resources.as_ref().ok_or(Error::UseAfterDispose)
    }

    pub fn width(&self) -> u32 {
        self.state.width()
    }

    pub fn height(&self) -> u32 {
        self.state.height()
    }
}

impl<B: RenderBackend> Drop for OccupancyGridNode<B> {
    fn drop(&mut self) {
        if let Some(resources) = self.resources.take() {
            log::debug!("Releasing grid resources on drop");
            resources.release(&mut self.backend);
        }
    }
}
