//! Texture-space color and displacement buffers.
//!
//! Row 0 of these buffers is the top of the rendered surface, which is the
//! last row of the message data.

use super::cell::CellClass;
use super::config::PixelLayout;

/// Displacement texel written for free cells.
pub const FREE_DISPLACEMENT: u8 = 0;
/// Displacement texel written for occupied and unknown cells.
pub const BLOCKED_DISPLACEMENT: u8 = 255;

/// Packed per-cell color (RGBA) and displacement buffers.
#[derive(Clone, Debug, PartialEq)]
pub struct GridBuffers {
    width: u32,
    height: u32,
    color: Vec<u8>,
    displacement: Vec<u8>,
    displacement_layout: PixelLayout,
}

impl GridBuffers {
    /// Allocate zeroed buffers for a `width x height` grid.
    pub fn new(width: u32, height: u32, displacement_layout: PixelLayout) -> Self {
        let cells = width as usize * height as usize;
        Self {
            width,
            height,
            color: vec![0; cells * PixelLayout::Rgba8.bytes_per_pixel()],
            displacement: vec![0; cells * displacement_layout.bytes_per_pixel()],
            displacement_layout,
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color(&self) -> &[u8] {
        &self.color
    }

    pub fn displacement(&self) -> &[u8] {
        &self.displacement
    }

    pub fn displacement_layout(&self) -> PixelLayout {
        self.displacement_layout
    }

    /// Write one cell at texture-space index `row * width + col`.
    pub(crate) fn write_cell(&mut self, index: usize, class: CellClass, rgba: [u8; 4]) {
        let c = index * 4;
        self.color[c..c + 4].copy_from_slice(&rgba);

        let level = if class.is_blocking() {
            BLOCKED_DISPLACEMENT
        } else {
            FREE_DISPLACEMENT
        };
        let texel = [level, level, level, 255];
        let bpp = self.displacement_layout.bytes_per_pixel();
        let d = index * bpp;
        self.displacement[d..d + bpp].copy_from_slice(&texel[..bpp]);
    }

    /// RGBA of the texel at texture-space `(row, col)`.
    pub fn color_at(&self, row: u32, col: u32) -> [u8; 4] {
        let i = (col as usize + row as usize * self.width as usize) * 4;
        [self.color[i], self.color[i + 1], self.color[i + 2], self.color[i + 3]]
    }

    /// Displacement texel at texture-space `(row, col)`.
    pub fn displacement_at(&self, row: u32, col: u32) -> &[u8] {
        let bpp = self.displacement_layout.bytes_per_pixel();
        let i = (col as usize + row as usize * self.width as usize) * bpp;
        &self.displacement[i..i + bpp]
    }
}
