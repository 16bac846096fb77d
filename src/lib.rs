//! Occugrid - occupancy grids as live, renderable surfaces
//!
//! Converts 2D occupancy grid messages into a color texture, a displacement
//! texture and one marker instance per cell, and keeps them in sync as new
//! messages arrive.

pub mod core;
pub mod math;
pub mod scene;
pub mod grid;
pub mod render;
