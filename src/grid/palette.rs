//! Color-map styles.
//!
//! [`ValueRamp`] interpolates keyframes over the occupancy range and
//! [`RampStyle`] plugs it into the cell coloring hooks, replacing the plain
//! shade scaling of [`ScaledColor`](super::cell::ScaledColor).

use super::cell::{CellRef, CellStyle};

// ---------------------------------------------------------------------------
// Lerp trait
// ---------------------------------------------------------------------------

/// Trait for types that can be linearly interpolated.
pub trait Lerp: Clone {
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

impl Lerp for f32 {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * t
    }
}

impl Lerp for [f32; 3] {
    #[inline]
    fn lerp(&self, other: &Self, t: f32) -> Self {
        [
            self[0] + (other[0] - self[0]) * t,
            self[1] + (other[1] - self[1]) * t,
            self[2] + (other[2] - self[2]) * t,
        ]
    }
}

// ---------------------------------------------------------------------------
// ValueRamp
// ---------------------------------------------------------------------------

/// Keyframe ramp over occupancy values, clamped at both ends.
#[derive(Clone, Debug)]
pub struct ValueRamp<T: Lerp> {
    keys: Vec<(f32, T)>,
}

impl<T: Lerp> ValueRamp<T> {
    /// Create a ramp from unsorted `(value, sample)` keys.
    ///
    /// Returns `None` if `keys` is empty.
    pub fn new(mut keys: Vec<(f32, T)>) -> Option<Self> {
        if keys.is_empty() {
            return None;
        }
        keys.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
        Some(Self { keys })
    }

    /// Ramp that always returns the same value.
    pub fn constant(value: T) -> Self {
        Self {
            keys: vec![(0.0, value)],
        }
    }

    pub fn sample(&self, v: f32) -> T {
        let first = &self.keys[0];
        if v <= first.0 {
            return first.1.clone();
        }
        let upper = match self.keys.iter().position(|k| k.0 > v) {
            Some(idx) => idx,
            None => return self.keys[self.keys.len() - 1].1.clone(),
        };
        let (v_a, ref a) = self.keys[upper - 1];
        let (v_b, ref b) = self.keys[upper];
        let span = v_b - v_a;
        if span < 1e-6 {
            return a.clone();
        }
        a.lerp(b, (v - v_a) / span)
    }
}

// ---------------------------------------------------------------------------
// RampStyle
// ---------------------------------------------------------------------------

/// Colors free cells by looking up their occupancy in a ramp of RGB colors
/// (channels in `0.0..=1.0`).
#[derive(Clone, Debug)]
pub struct RampStyle {
    ramp: ValueRamp<[f32; 3]>,
}

impl RampStyle {
    pub fn new(ramp: ValueRamp<[f32; 3]>) -> Self {
        Self { ramp }
    }

    /// Green for empty space fading to red near the occupied threshold.
    pub fn traffic_light() -> Self {
        let keys = vec![
            (0.0, [0.2, 0.8, 0.2]),
            (50.0, [0.9, 0.8, 0.1]),
            (100.0, [0.9, 0.1, 0.1]),
        ];
        match ValueRamp::new(keys) {
            Some(ramp) => Self::new(ramp),
            None => Self::new(ValueRamp::constant([1.0, 1.0, 1.0])),
        }
    }
}

impl CellStyle for RampStyle {
    fn color(&self, _cell: CellRef, shade: f64) -> [u8; 3] {
        let occupancy = (100.0 * (1.0 - shade / 255.0)) as f32;
        let rgb = self.ramp.sample(occupancy);
        [
            (rgb[0].clamp(0.0, 1.0) * 255.0) as u8,
            (rgb[1].clamp(0.0, 1.0) * 255.0) as u8,
            (rgb[2].clamp(0.0, 1.0) * 255.0) as u8,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::cell::shade;

    const CELL: CellRef = CellRef { index: 0, row: 0, col: 0 };

    #[test]
    fn test_empty_ramp_rejected() {
        assert!(ValueRamp::<f32>::new(vec![]).is_none());
    }

    #[test]
    fn test_sample_clamps_and_interpolates() {
        let ramp = ValueRamp::new(vec![(100.0, 10.0_f32), (0.0, 0.0)]).unwrap();
        assert_eq!(ramp.sample(-5.0), 0.0);
        assert_eq!(ramp.sample(150.0), 10.0);
        assert!((ramp.sample(50.0) - 5.0).abs() < 1e-5);
    }

    #[test]
    fn test_constant_ramp() {
        let ramp = ValueRamp::constant(3.0_f32);
        assert_eq!(ramp.sample(0.0), 3.0);
        assert_eq!(ramp.sample(99.0), 3.0);
    }

    #[test]
    fn test_ramp_style_endpoints() {
        let ramp = ValueRamp::new(vec![(0.0, [0.0, 0.0, 1.0]), (100.0, [1.0, 0.0, 0.0])]).unwrap();
        let style = RampStyle::new(ramp);
        assert_eq!(style.color(CELL, shade(0)), [0, 0, 255]);
        assert_eq!(style.color(CELL, shade(100)), [255, 0, 0]);
    }

    #[test]
    fn test_traffic_light_empty_is_green() {
        let style = RampStyle::traffic_light();
        let [r, g, b] = style.color(CELL, shade(0));
        assert!(g > r && g > b);
    }
}
