//! Buffer builder: occupancy values to texture and instance buffers.
//!
//! Message data is row-major with the bottom row first; texture buffers are
//! top row first. Each output row `row` therefore reads source row
//! `height - row - 1`, while writes use the un-flipped `row`.

use crate::core::error::Error;
use crate::core::types::Result;

use super::buffers::GridBuffers;
use super::cell::{free_alpha, shade, CellClass, CellRef, CellStyle};
use super::config::{GridConfig, Rgba};
use super::instances::InstancePool;

/// Number of cells per class written by the last pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CellCounts {
    pub free: usize,
    pub occupied: usize,
    pub unknown: usize,
}

impl CellCounts {
    fn record(&mut self, class: CellClass) {
        match class {
            CellClass::Free => self.free += 1,
            CellClass::Occupied => self.occupied += 1,
            CellClass::Unknown => self.unknown += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.free + self.occupied + self.unknown
    }
}

/// Fixed-dimension writer for [`GridBuffers`] and [`InstancePool`].
#[derive(Clone, Debug)]
pub struct BufferBuilder {
    width: u32,
    height: u32,
    config: GridConfig,
}

impl BufferBuilder {
    pub fn new(width: u32, height: u32, config: GridConfig) -> Self {
        Self {
            width,
            height,
            config,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Allocate fresh buffers and fill them from `data`.
    pub fn build(
        &self,
        data: &[i8],
        style: &dyn CellStyle,
    ) -> Result<(GridBuffers, InstancePool, CellCounts)> {
        let mut buffers =
            GridBuffers::new(self.width, self.height, self.config.displacement_layout);
        let mut pool = InstancePool::new(
            self.width,
            self.height,
            self.config.marker_z_offset,
            self.config.alert_color,
            self.config.neutral_color,
        );
        let counts = self.write_cells(data, style, &mut buffers, &mut pool)?;
        Ok((buffers, pool, counts))
    }

    /// Rewrite every cell of existing buffers in place.
    pub fn write_cells(
        &self,
        data: &[i8],
        style: &dyn CellStyle,
        buffers: &mut GridBuffers,
        pool: &mut InstancePool,
    ) -> Result<CellCounts> {
        if data.len() != self.cell_count() {
            return Err(Error::MalformedMessage(format!(
                "data has {} cells, builder expects {}",
                data.len(),
                self.cell_count()
            )));
        }
        if buffers.width() != self.width
            || buffers.height() != self.height
            || pool.width() != self.width
            || pool.height() != self.height
        {
            return Err(Error::DimensionMismatch {
                expected_width: self.width,
                expected_height: self.height,
                width: buffers.width(),
                height: buffers.height(),
            });
        }

        let width = self.width as usize;
        let threshold = self.config.occupied_threshold;
        let mut counts = CellCounts::default();

        for row in 0..self.height {
            let inv_row = self.height - row - 1;
            for col in 0..self.width {
                let cell = CellRef {
                    index: col as usize + inv_row as usize * width,
                    row: inv_row,
                    col,
                };
                let value = style.value(cell, data);
                let class = CellClass::classify(value, threshold);

                let rgba = if class.is_blocking() {
                    Rgba::TRANSPARENT.to_array()
                } else {
                    let [r, g, b] = style.color(cell, shade(value));
                    [r, g, b, free_alpha(value)]
                };

                buffers.write_cell(col as usize + row as usize * width, class, rgba);
                pool.set_cell(row, col, class);
                counts.record(class);
            }
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell::ScaledColor;
    use crate::grid::config::PixelLayout;

    fn white() -> ScaledColor {
        ScaledColor::new(Rgba::WHITE)
    }

    #[test]
    fn test_vertical_flip() {
        // 2x3 grid, bottom row first in data
        let data: Vec<i8> = vec![
            0, 100, // source row 0 (bottom)
            -1, 0, // source row 1
            0, 0, // source row 2 (top)
        ];
        let builder = BufferBuilder::new(2, 3, GridConfig::default());
        let (buffers, _, counts) = builder.build(&data, &white()).unwrap();

        // texture row 0 is the top source row
        assert_eq!(buffers.color_at(0, 0), [255, 255, 255, 255]);
        assert_eq!(buffers.color_at(0, 1), [255, 255, 255, 255]);
        assert_eq!(buffers.color_at(1, 0), [0, 0, 0, 0]);
        assert_eq!(buffers.color_at(2, 1), [0, 0, 0, 0]);
        assert_eq!(buffers.color_at(2, 0), [255, 255, 255, 255]);

        assert_eq!(counts, CellCounts { free: 4, occupied: 1, unknown: 1 });
    }

    #[test]
    fn test_flip_matches_source_classification_for_all_cells() {
        let (width, height) = (7u32, 5u32);
        let data: Vec<i8> = (0..width * height)
            .map(|i| match i % 4 {
                0 => -1,
                1 => 100,
                2 => 30,
                _ => 0,
            })
            .collect();
        let builder = BufferBuilder::new(width, height, GridConfig::default());
        let (buffers, pool, _) = builder.build(&data, &white()).unwrap();

        for row in 0..height {
            for col in 0..width {
                let source = data[(col + (height - row - 1) * width) as usize];
                let blocked = CellClass::classify(source, 100).is_blocking();
                let texel = buffers.color_at(row, col);
                assert_eq!(texel == [0, 0, 0, 0], blocked, "cell ({}, {})", row, col);
                assert_eq!(buffers.displacement_at(row, col)[0] == 255, blocked);
                assert_eq!(pool.class_at(pool.index(row, col)).is_blocking(), blocked);
            }
        }
    }

    #[test]
    fn test_classification_boundary_outputs() {
        let data: Vec<i8> = vec![100, -1, 0];
        let config = GridConfig::with_color(Rgba::new(200, 100, 50, 255));
        let builder = BufferBuilder::new(3, 1, config);
        let style = ScaledColor::new(Rgba::new(200, 100, 50, 255));
        let (buffers, pool, _) = builder.build(&data, &style).unwrap();

        assert_eq!(buffers.color_at(0, 0), [0, 0, 0, 0]);
        assert_eq!(buffers.displacement_at(0, 0), &[255, 255, 255, 255]);
        assert_eq!(buffers.color_at(0, 1), [0, 0, 0, 0]);
        assert_eq!(buffers.displacement_at(0, 1), &[255, 255, 255, 255]);
        assert_eq!(buffers.color_at(0, 2), [200, 100, 50, 255]);
        assert_eq!(buffers.displacement_at(0, 2), &[0, 0, 0, 255]);

        assert_eq!(pool.get(0, 0).color, GridConfig::default().alert_color);
        assert_eq!(pool.get(0, 2).color, GridConfig::default().neutral_color);
    }

    #[test]
    fn test_partial_occupancy_color_and_alpha() {
        let builder = BufferBuilder::new(1, 1, GridConfig::default());
        let (buffers, _, _) = builder.build(&[50], &white()).unwrap();
        assert_eq!(buffers.color_at(0, 0), [127, 127, 127, 127]);
    }

    #[test]
    fn test_configurable_threshold() {
        let config = GridConfig {
            occupied_threshold: 65,
            ..Default::default()
        };
        let builder = BufferBuilder::new(2, 1, config);
        let (buffers, _, counts) = builder.build(&[64, 65], &white()).unwrap();
        assert_ne!(buffers.color_at(0, 0), [0, 0, 0, 0]);
        assert_eq!(buffers.color_at(0, 1), [0, 0, 0, 0]);
        assert_eq!(counts.occupied, 1);
    }

    #[test]
    fn test_rgb_displacement_layout() {
        let config = GridConfig {
            displacement_layout: PixelLayout::Rgb8,
            ..Default::default()
        };
        let builder = BufferBuilder::new(2, 1, config);
        let (buffers, _, _) = builder.build(&[100, 0], &white()).unwrap();
        assert_eq!(buffers.displacement(), &[255, 255, 255, 0, 0, 0]);
    }

    #[test]
    fn test_length_mismatch() {
        let builder = BufferBuilder::new(2, 2, GridConfig::default());
        let result = builder.build(&[0, 0, 0], &white());
        assert!(matches!(result, Err(Error::MalformedMessage(_))));
    }

    #[test]
    fn test_write_cells_rejects_foreign_buffers() {
        let builder = BufferBuilder::new(2, 2, GridConfig::default());
        let other = BufferBuilder::new(3, 1, GridConfig::default());
        let (mut buffers, mut pool, _) = other.build(&[0, 0, 0], &white()).unwrap();
        let result = builder.write_cells(&[0; 4], &white(), &mut buffers, &mut pool);
        assert!(matches!(result, Err(Error::DimensionMismatch { .. })));
    }

    #[test]
    fn test_custom_value_hook() {
        struct Inverted;
        impl CellStyle for Inverted {
            fn value(&self, cell: CellRef, data: &[i8]) -> i8 {
                100 - data[cell.index]
            }
            fn color(&self, _cell: CellRef, shade: f64) -> [u8; 3] {
                [shade as u8, 0, 0]
            }
        }
        let builder = BufferBuilder::new(2, 1, GridConfig::default());
        let (buffers, _, _) = builder.build(&[0, 100], &Inverted).unwrap();
        assert_eq!(buffers.color_at(0, 0), [0, 0, 0, 0]);
        assert_eq!(buffers.color_at(0, 1), [255, 0, 0, 255]);
    }
}
