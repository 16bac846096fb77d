//! Scene-facing transform types

pub mod transform;

pub use transform::LocalTransform;
