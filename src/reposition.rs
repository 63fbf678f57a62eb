//! Vertical drag on the panel's grip.
//!
//! The host window moves under the pointer while this drag runs, so every
//! sample is measured against the previous one rather than the drag start.
//! Sub-pixel remainders are carried forward instead of being lost.

use log::debug;

#[derive(Debug, Clone)]
pub struct RepositionDrag {
    last_y: f64,
}

impl RepositionDrag {
    pub fn begin(y: f64) -> Self {
        debug!("reposition begin y={:.1}", y);
        Self { last_y: y }
    }

    /// Whole-pixel move for the new sample.  Returns `None` when the pointer
    /// has not moved a full pixel yet.
    pub fn step(&mut self, y: f64) -> Option<i32> {
        let delta = (y - self.last_y).trunc();
        if delta == 0.0 || !delta.is_finite() {
            return None;
        }
        self.last_y += delta;
        Some(delta as i32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deltas_are_relative_to_the_previous_sample() {
        let mut d = RepositionDrag::begin(100.0);
        assert_eq!(d.step(110.0), Some(10));
        assert_eq!(d.step(115.0), Some(5));
        assert_eq!(d.step(105.0), Some(-10));
    }

    #[test]
    fn sub_pixel_motion_accumulates() {
        let mut d = RepositionDrag::begin(0.0);
        assert_eq!(d.step(0.4), None);
        assert_eq!(d.step(0.8), None);
        assert_eq!(d.step(1.3), Some(1));
        assert_eq!(d.step(1.9), None);
        assert_eq!(d.step(2.0), Some(1));
    }

    #[test]
    fn non_finite_samples_are_ignored() {
        let mut d = RepositionDrag::begin(10.0);
        assert_eq!(d.step(f64::NAN), None);
        assert_eq!(d.step(12.0), Some(2));
    }
}
