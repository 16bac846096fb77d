//! Occupancy grid encoding: messages, configuration, per-cell
//! classification and the texture/instance buffers derived from them.

pub mod buffers;
pub mod builder;
pub mod cell;
pub mod config;
pub mod instances;
pub mod message;
pub mod palette;
pub mod placement;
pub mod state;

pub use buffers::GridBuffers;
pub use builder::{BufferBuilder, CellCounts};
pub use cell::{CellClass, CellRef, CellStyle, ScaledColor};
pub use config::{GridConfig, PixelLayout, Rgba};
pub use instances::{InstanceData, InstancePool};
pub use message::{GridInfo, GridMessage, Point, Pose, Quaternion};
pub use palette::{RampStyle, ValueRamp};
pub use placement::place;
pub use state::{DirtyFlags, RenderState};
