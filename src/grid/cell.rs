//! Per-cell classification and color hooks.

use super::config::Rgba;
use super::message::UNKNOWN_CELL;

/// How a cell is drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum CellClass {
    /// Below the occupied threshold.
    Free,
    /// At or above the occupied threshold.
    Occupied,
    /// Never observed (`-1`).
    Unknown,
}

impl CellClass {
    pub fn classify(value: i8, occupied_threshold: i8) -> Self {
        if value == UNKNOWN_CELL {
            CellClass::Unknown
        } else if value >= occupied_threshold {
            CellClass::Occupied
        } else {
            CellClass::Free
        }
    }

    /// Occupied and unknown cells share transparent color, raised
    /// displacement and the alert marker.
    pub fn is_blocking(self) -> bool {
        !matches!(self, CellClass::Free)
    }
}

/// Base intensity of a cell: 255 when empty, 0 when certainly occupied.
#[inline]
pub fn shade(value: i8) -> f64 {
    255.0 - (value as f64 / 100.0) * 255.0
}

/// Alpha of a free cell, decreasing with occupancy.
#[inline]
pub fn free_alpha(value: i8) -> u8 {
    ((100.0 - value as f64) / 100.0 * 255.0) as u8
}

/// Location of a cell in source (message) space.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellRef {
    /// Index into the message data.
    pub index: usize,
    /// Source row, counted from the bottom of the grid.
    pub row: u32,
    pub col: u32,
}

/// Hooks for customizing how cell values are read and colored.
///
/// Classification, alpha and displacement are fixed; a style only decides
/// which value a cell carries and the RGB of free cells.
pub trait CellStyle: Send + Sync {
    /// Value of the cell. The default reads the message data directly.
    fn value(&self, cell: CellRef, data: &[i8]) -> i8 {
        data[cell.index]
    }

    /// RGB of a free cell given its [`shade`] in `0.0..=255.0`.
    fn color(&self, cell: CellRef, shade: f64) -> [u8; 3];
}

/// Scales a base color by the cell shade.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ScaledColor {
    pub color: Rgba,
}

impl ScaledColor {
    pub fn new(color: Rgba) -> Self {
        Self { color }
    }
}

impl CellStyle for ScaledColor {
    fn color(&self, _cell: CellRef, shade: f64) -> [u8; 3] {
        [
            (shade * self.color.r as f64 / 255.0) as u8,
            (shade * self.color.g as f64 / 255.0) as u8,
            (shade * self.color.b as f64 / 255.0) as u8,
        ]
    }
}
