//! Decoded occupancy grid messages.
//!
//! The shapes mirror the ROS `nav_msgs/OccupancyGrid` message so that JSON
//! produced by a bridge can be deserialized directly.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::core::error::Error;
use crate::core::types::{Quat, Result};

/// Cell value meaning "never observed".
pub const UNKNOWN_CELL: i8 = -1;

/// Highest occupancy probability a cell may carry.
pub const MAX_OCCUPANCY: i8 = 100;

/// 3D point in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Point {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }
}

/// Orientation quaternion, `w` last.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Quaternion {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub w: f64,
}

impl Default for Quaternion {
    fn default() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0, w: 1.0 }
    }
}

impl Quaternion {
    pub fn new(x: f64, y: f64, z: f64, w: f64) -> Self {
        Self { x, y, z, w }
    }

    /// Copies the components as-is; no renormalization.
    pub fn to_quat(self) -> Quat {
        Quat::from_xyzw(self.x as f32, self.y as f32, self.z as f32, self.w as f32)
    }

    pub fn norm(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z + self.w * self.w).sqrt()
    }
}

/// Pose of the grid's bottom-left corner in world coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    pub position: Point,
    pub orientation: Quaternion,
}

/// Grid metadata.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridInfo {
    /// Cells along X.
    pub width: u32,
    /// Cells along Y.
    pub height: u32,
    /// World units per cell.
    pub resolution: f32,
    pub origin: Pose,
}

impl GridInfo {
    pub fn new(width: u32, height: u32, resolution: f32) -> Self {
        Self {
            width,
            height,
            resolution,
            origin: Pose::default(),
        }
    }

    /// Number of cells, or `None` if it does not fit in memory indices.
    pub fn cell_count(&self) -> Option<usize> {
        (self.width as usize).checked_mul(self.height as usize)
    }

    fn validate(&self) -> Result<usize> {
        if self.width == 0 || self.height == 0 {
            return Err(Error::MalformedMessage(format!(
                "grid dimensions must be positive, got {}x{}",
                self.width, self.height
            )));
        }
        if !self.resolution.is_finite() || self.resolution <= 0.0 {
            return Err(Error::MalformedMessage(format!(
                "resolution must be a positive finite number, got {}",
                self.resolution
            )));
        }
        let p = self.origin.position;
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(Error::MalformedMessage("origin position is not finite".into()));
        }
        let q = self.origin.orientation;
        if !(q.x.is_finite() && q.y.is_finite() && q.z.is_finite() && q.w.is_finite()) {
            return Err(Error::MalformedMessage("origin orientation is not finite".into()));
        }
        self.cell_count().ok_or_else(|| {
            Error::MalformedMessage(format!(
                "grid {}x{} overflows the addressable cell count",
                self.width, self.height
            ))
        })
    }
}

/// An occupancy grid message: metadata plus row-major cell values, bottom row first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridMessage {
    pub info: GridInfo,
    /// `-1` for unknown, otherwise occupancy probability in `0..=100`.
    pub data: Vec<i8>,
}

impl GridMessage {
    pub fn new(info: GridInfo, data: Vec<i8>) -> Self {
        Self { info, data }
    }

    /// Grid of the given size with every cell set to `value`.
    pub fn filled(width: u32, height: u32, resolution: f32, value: i8) -> Self {
        let info = GridInfo::new(width, height, resolution);
        let count = info.cell_count().unwrap_or(0);
        Self::new(info, vec![value; count])
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    /// Check every structural precondition of buffer construction.
    pub fn validate(&self) -> Result<()> {
        let expected = self.info.validate()?;
        if self.data.len() != expected {
            return Err(Error::MalformedMessage(format!(
                "data has {} cells, expected {}x{} = {}",
                self.data.len(),
                self.info.width,
                self.info.height,
                expected
            )));
        }
        if let Some((index, value)) = self
            .data
            .iter()
            .enumerate()
            .find(|(_, v)| !(**v == UNKNOWN_CELL || (0..=MAX_OCCUPANCY).contains(*v)))
        {
            return Err(Error::MalformedMessage(format!(
                "cell {} has value {}, expected -1 or 0..=100",
                index, value
            )));
        }
        Ok(())
    }

    /// Decode a message. Missing fields and out-of-range cell values are
    /// reported as [`Error::MalformedMessage`].
    pub fn from_json_str(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::MalformedMessage(e.to_string()))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_filled_grid_is_valid() {
        let msg = GridMessage::filled(4, 3, 0.05, 0);
        assert_eq!(msg.data.len(), 12);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_length_mismatch_rejected() {
        let mut msg = GridMessage::filled(4, 3, 0.05, 0);
        msg.data.pop();
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_zero_dimension_rejected() {
        let msg = GridMessage::new(GridInfo::new(0, 3, 0.05), vec![]);
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_bad_resolution_rejected() {
        let mut msg = GridMessage::filled(2, 2, 0.05, 0);
        msg.info.resolution = 0.0;
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
        msg.info.resolution = f32::NAN;
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_out_of_range_value_rejected() {
        let mut msg = GridMessage::filled(2, 2, 1.0, 0);
        msg.data[3] = -7;
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
        msg.data[3] = 101;
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
        msg.data[3] = UNKNOWN_CELL;
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_non_finite_origin_rejected() {
        let mut msg = GridMessage::filled(2, 2, 1.0, 0);
        msg.info.origin.position.y = f64::INFINITY;
        assert!(matches!(msg.validate(), Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_quaternion_copied_verbatim() {
        let q = Quaternion::new(0.0, 0.0, 2.0, 0.0);
        let quat = q.to_quat();
        assert_eq!(quat.z, 2.0);
        assert!((q.norm() - 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_from_json_ros_shape() {
        let json = r#"{
            "info": {
                "width": 2, "height": 1, "resolution": 0.5,
                "map_load_time": { "secs": 0, "nsecs": 0 },
                "origin": {
                    "position": { "x": 1.0, "y": -2.0, "z": 0.0 },
                    "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 }
                }
            },
            "data": [-1, 100]
        }"#;
        let msg = GridMessage::from_json_str(json).unwrap();
        assert_eq!(msg.width(), 2);
        assert_eq!(msg.height(), 1);
        assert_eq!(msg.data, vec![-1, 100]);
        assert_eq!(msg.info.origin.position.y, -2.0);
        assert!(msg.validate().is_ok());
    }

    #[test]
    fn test_from_json_missing_field() {
        let json = r#"{
            "info": {
                "width": 1, "height": 1,
                "origin": {
                    "position": { "x": 0.0, "y": 0.0, "z": 0.0 },
                    "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 }
                }
            },
            "data": [0]
        }"#;
        let err = GridMessage::from_json_str(json).unwrap_err();
        assert!(matches!(err, Error::MalformedMessage(_)));
    }

    #[test]
    fn test_from_json_cell_out_of_i8_range() {
        let json = r#"{
            "info": { "width": 1, "height": 1, "resolution": 1.0,
                "origin": { "position": { "x": 0.0, "y": 0.0, "z": 0.0 },
                            "orientation": { "x": 0.0, "y": 0.0, "z": 0.0, "w": 1.0 } } },
            "data": [300]
        }"#;
        assert!(matches!(
            GridMessage::from_json_str(json),
            Err(Error::MalformedMessage(_))
        ));
    }

    #[test]
    fn test_from_json_file() {
        let msg = GridMessage::filled(3, 2, 0.1, 50);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(serde_json::to_string(&msg).unwrap().as_bytes()).unwrap();
        let loaded = GridMessage::from_json_file(file.path()).unwrap();
        assert_eq!(loaded, msg);
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = GridMessage::from_json_file("/nonexistent/grid.json").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
