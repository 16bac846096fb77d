//! Display configuration bound at node construction.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::Result;

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::new(255, 255, 255, 255);
    pub const TRANSPARENT: Rgba = Rgba::new(0, 0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Normalized float channels.
    pub fn to_f32(self) -> [f32; 4] {
        [
            self.r as f32 / 255.0,
            self.g as f32 / 255.0,
            self.b as f32 / 255.0,
            self.a as f32 / 255.0,
        ]
    }
}

impl Default for Rgba {
    fn default() -> Self {
        Self::WHITE
    }
}

/// Byte layout of a per-cell texel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelLayout {
    #[default]
    Rgba8,
    Rgb8,
}

impl PixelLayout {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelLayout::Rgba8 => 4,
            PixelLayout::Rgb8 => 3,
        }
    }
}

/// Configuration for one visualized grid.
///
/// Unlisted JSON fields keep their defaults.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    /// Base color of free cells.
    pub color: Rgba,
    /// Material opacity (0.0 transparent, 1.0 opaque).
    pub opacity: f32,
    /// Cells with a value at or above this are occupied.
    pub occupied_threshold: i8,
    /// Texel layout of the displacement buffer.
    pub displacement_layout: PixelLayout,
    /// Marker color for occupied and unknown cells.
    pub alert_color: [f32; 4],
    /// Marker color for free cells.
    pub neutral_color: [f32; 4],
    /// Z separation between occupied and free marker layers, in cell units.
    pub marker_z_offset: f32,
    /// Subdivisions per axis of the surface plane.
    pub plane_segments: u32,
    /// Icosphere refinement level of the marker shape.
    pub marker_subdivisions: u32,
    /// Marker radius in cell units.
    pub marker_radius: f32,
    /// Material specular exponent.
    pub shininess: f32,
    /// Multiplier applied to the displacement texture.
    pub displacement_scale: f32,
    /// Whether the textured surface should be drawn.
    pub show_surface: bool,
    /// Whether the per-cell markers should be drawn.
    pub show_markers: bool,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            color: Rgba::WHITE,
            opacity: 1.0,
            occupied_threshold: 100,
            displacement_layout: PixelLayout::Rgba8,
            alert_color: [1.0, 0.0, 0.0, 1.0],
            neutral_color: [1.0, 1.0, 1.0, 1.0],
            marker_z_offset: 0.01,
            plane_segments: 100,
            marker_subdivisions: 2,
            marker_radius: 0.5,
            shininess: 0.0,
            displacement_scale: 1.0,
            show_surface: true,
            show_markers: true,
        }
    }
}

/// Icosphere levels above this produce more triangles than a marker needs.
pub const MAX_MARKER_SUBDIVISIONS: u32 = 5;

/// Plane subdivisions per axis; keeps vertex indices well inside `u32`.
pub const MAX_PLANE_SEGMENTS: u32 = 4096;

impl GridConfig {
    /// Default configuration with a different base color.
    pub fn with_color(color: Rgba) -> Self {
        Self {
            color,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(Error::InvalidConfig(format!(
                "opacity must be within [0, 1], got {}",
                self.opacity
            )));
        }
        if !(1..=100).contains(&self.occupied_threshold) {
            return Err(Error::InvalidConfig(format!(
                "occupied_threshold must be within [1, 100], got {}",
                self.occupied_threshold
            )));
        }
        if self.plane_segments == 0 {
            return Err(Error::InvalidConfig("plane_segments must be at least 1".into()));
        }
        if self.plane_segments > MAX_PLANE_SEGMENTS {
            return Err(Error::InvalidConfig(format!(
                "plane_segments must be at most {}, got {}",
                MAX_PLANE_SEGMENTS, self.plane_segments
            )));
        }
        if self.marker_subdivisions > MAX_MARKER_SUBDIVISIONS {
            return Err(Error::InvalidConfig(format!(
                "marker_subdivisions must be at most {}, got {}",
                MAX_MARKER_SUBDIVISIONS, self.marker_subdivisions
            )));
        }
        if !self.marker_radius.is_finite() || self.marker_radius <= 0.0 {
            return Err(Error::InvalidConfig(format!(
                "marker_radius must be positive, got {}",
                self.marker_radius
            )));
        }
        if !self.marker_z_offset.is_finite() {
            return Err(Error::InvalidConfig("marker_z_offset must be finite".into()));
        }
        Ok(())
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}
