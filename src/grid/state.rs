//! Render state and the in-place update coordinator.

use crate::core::error::Error;
use crate::core::types::Result;

use super::buffers::GridBuffers;
use super::builder::{BufferBuilder, CellCounts};
use super::cell::CellStyle;
use super::config::GridConfig;
use super::instances::InstancePool;
use super::message::GridMessage;

/// Host-side resources that need re-upload.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DirtyFlags {
    pub color: bool,
    pub displacement: bool,
    pub instances: bool,
}

impl DirtyFlags {
    pub fn all() -> Self {
        Self {
            color: true,
            displacement: true,
            instances: true,
        }
    }

    pub fn any(&self) -> bool {
        self.color || self.displacement || self.instances
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// Buffers bound to one grid's dimensions for its whole lifetime.
pub struct RenderState {
    width: u32,
    height: u32,
    config: GridConfig,
    builder: BufferBuilder,
    style: Box<dyn CellStyle>,
    buffers: GridBuffers,
    instances: InstancePool,
    counts: CellCounts,
    dirty: DirtyFlags,
}

impl RenderState {
    /// Validate `message` and `config`, then allocate and fill every buffer.
    pub fn new(
        message: &GridMessage,
        config: GridConfig,
        style: Box<dyn CellStyle>,
    ) -> Result<Self> {
        config.validate()?;
        message.validate()?;

        let (width, height) = (message.width(), message.height());
        let builder = BufferBuilder::new(width, height, config.clone());
        let (buffers, instances, counts) = builder.build(&message.data, style.as_ref())?;

        Ok(Self {
            width,
            height,
            config,
            builder,
            style,
            buffers,
            instances,
            counts,
            dirty: DirtyFlags::default(),
        })
    }

    /// Rewrite all buffers from `message` without reallocating them.
    ///
    /// Fails before touching any buffer if the message is malformed or its
    /// dimensions differ from the bound ones.
    pub fn apply(&mut self, message: &GridMessage) -> Result<()> {
        message.validate()?;
        if message.width() != self.width || message.height() != self.height {
            return Err(Error::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: message.width(),
                height: message.height(),
            });
        }

        self.counts = self.builder.write_cells(
            &message.data,
            self.style.as_ref(),
            &mut self.buffers,
            &mut self.instances,
        )?;
        self.dirty = DirtyFlags::all();
        Ok(())
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn config(&self) -> &GridConfig {
        &self.config
    }

    pub fn buffers(&self) -> &GridBuffers {
        &self.buffers
    }

    pub fn instances(&self) -> &InstancePool {
        &self.instances
    }

    pub(crate) fn instances_mut(&mut self) -> &mut InstancePool {
        &mut self.instances
    }

    pub fn counts(&self) -> CellCounts {
        self.counts
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub(crate) fn mark_instances_dirty(&mut self) {
        self.dirty.instances = true;
    }

    pub(crate) fn take_dirty(&mut self) -> DirtyFlags {
        let dirty = self.dirty;
        self.dirty.clear();
        dirty
    }
}

impl std::fmt::Debug for RenderState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderState")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("counts", &self.counts)
            .field("dirty", &self.dirty)
            .finish_non_exhaustive()
    }
}
