//! Panel and window geometry.
//!
//! The panel's visual size is a pure function of the expansion progress
//! `p ∈ [0, 1]`: width and height are both interpolated linearly between the
//! collapsed and expanded sizes, so they can never drift apart.
//!
//! The host window is always larger than the panel it contains (see
//! [`window_target`]) so the panel is never clipped while it grows or
//! shrinks.  Its vertical position glides from the configured resting
//! anchor toward a *safe* anchor that keeps the fully expanded panel on
//! screen, driven by the same progress scalar.

use crate::easing::lerp;
use serde::{Deserialize, Serialize};

/// Visual width of the collapsed strip (px).
pub const COLLAPSED_WIDTH: f64 = 4.0;
/// Extra window size around the panel while it is (partially) expanded.
pub const WINDOW_PADDING: f64 = 100.0;
/// Width of the host window while fully collapsed.
pub const STRIP_WINDOW_WIDTH: f64 = 20.0;
/// Extra height of the host window while fully collapsed.
pub const STRIP_WINDOW_EXTRA_HEIGHT: f64 = 40.0;
/// Minimum distance between the expanded panel and the display edges.
pub const SAFE_MARGIN: f64 = 20.0;

/// A point in some coordinate space (screen or window-local).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    /// Inclusive containment test, matching how a DOM bounding rect is
    /// hit-tested (edges count as inside).
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Collapsed and expanded panel sizes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelMetrics {
    pub collapsed_width: f64,
    pub collapsed_height: f64,
    pub expanded_width: f64,
    pub expanded_height: f64,
}

impl Default for PanelMetrics {
    fn default() -> Self {
        Self {
            collapsed_width: COLLAPSED_WIDTH,
            collapsed_height: 64.0,
            expanded_width: 400.0,
            expanded_height: 450.0,
        }
    }
}

impl PanelMetrics {
    /// Panel `(width, height)` at `progress`.
    ///
    /// The boundaries return the configured sizes verbatim rather than the
    /// result of the interpolation so resting states are exact.
    pub fn size_at(&self, progress: f64) -> (f64, f64) {
        let p = progress.clamp(0.0, 1.0);
        if p <= 0.0 {
            return (self.collapsed_width, self.collapsed_height);
        }
        if p >= 1.0 {
            return (self.expanded_width, self.expanded_height);
        }
        (
            lerp(self.collapsed_width, self.expanded_width, p),
            lerp(self.collapsed_height, self.expanded_height, p),
        )
    }
}

/// Window bounds the engine asks the Geometry Host for.
///
/// The horizontal position is left to the host (the window is docked to the
/// display's left edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeometryTarget {
    pub width: u32,
    pub height: u32,
    pub y: i32,
}

/// Vertical center of the panel when it rests at `anchor_offset`.
///
/// An offset of `0` centers the panel on the display.
pub fn resting_center_y(display: Rect, anchor_offset: f64) -> f64 {
    display.y + display.height / 2.0 + anchor_offset
}

/// Closest center to `resting` at which a fully expanded panel of
/// `expanded_height` fits on the display with [`SAFE_MARGIN`] to spare.
///
/// On displays too short to fit the panel at all the top edge wins.
pub fn safe_center_y(display: Rect, expanded_height: f64, resting: f64) -> f64 {
    let lo = display.y + expanded_height / 2.0 + SAFE_MARGIN;
    let hi = display.bottom() - expanded_height / 2.0 - SAFE_MARGIN;
    lo.max(hi.min(resting))
}

/// Compute the host window bounds for the panel at `progress`.
pub fn window_target(
    metrics: &PanelMetrics,
    display: Rect,
    anchor_offset: f64,
    progress: f64,
) -> GeometryTarget {
    let p = progress.clamp(0.0, 1.0);
    let (width, height) = if p <= 0.0 {
        (
            STRIP_WINDOW_WIDTH,
            metrics.collapsed_height + STRIP_WINDOW_EXTRA_HEIGHT,
        )
    } else {
        let (w, h) = metrics.size_at(p);
        ((w + WINDOW_PADDING).floor(), (h + WINDOW_PADDING).floor())
    };

    let resting = resting_center_y(display, anchor_offset);
    let safe = safe_center_y(display, metrics.expanded_height, resting);
    let center = lerp(resting, safe, p);

    GeometryTarget {
        width: width.max(1.0) as u32,
        height: height.max(1.0) as u32,
        y: (center - height / 2.0).floor() as i32,
    }
}

//  Tests

#[cfg(test)]
mod tests {
    use super::*;

    fn display() -> Rect {
        Rect::new(0.0, 0.0, 1920.0, 1080.0)
    }

    #[test]
    fn size_is_exact_at_boundaries() {
        let m = PanelMetrics::default();
        assert_eq!(m.size_at(0.0), (4.0, 64.0));
        assert_eq!(m.size_at(1.0), (400.0, 450.0));
        assert_eq!(m.size_at(-3.0), (4.0, 64.0));
        assert_eq!(m.size_at(7.0), (400.0, 450.0));
    }

    #[test]
    fn width_and_height_share_progress() {
        let m = PanelMetrics::default();
        let (w, h) = m.size_at(0.5);
        assert_eq!(w, 202.0);
        assert_eq!(h, 257.0);
    }

    #[test]
    fn collapsed_window_is_a_thin_strip() {
        let t = window_target(&PanelMetrics::default(), display(), 0.0, 0.0);
        assert_eq!(t.width, 20);
        assert_eq!(t.height, 104);
        // Centered on the display.
        assert_eq!(t.y, 540 - 52);
    }

    #[test]
    fn expanded_window_is_padded() {
        let t = window_target(&PanelMetrics::default(), display(), 0.0, 1.0);
        assert_eq!(t.width, 500);
        assert_eq!(t.height, 550);
        assert_eq!(t.y, 540 - 275);
    }

    #[test]
    fn anchor_near_the_top_glides_into_safe_zone() {
        let m = PanelMetrics::default();
        // Resting center 40px below the top edge of the display.
        let offset = 40.0 - 540.0;
        let collapsed = window_target(&m, display(), offset, 0.0);
        assert_eq!(collapsed.y, 40 - 52);

        // Fully expanded: center is pushed to 450/2 + 20 = 245.
        let expanded = window_target(&m, display(), offset, 1.0);
        assert_eq!(expanded.y, 245 - 275);

        // Half way: center halfway between 40 and 245.
        let half = window_target(&m, display(), offset, 0.5);
        let (_, h) = m.size_at(0.5);
        let height = (h + WINDOW_PADDING).floor();
        assert_eq!(half.y, (142.5 - height / 2.0).floor() as i32);
    }

    #[test]
    fn anchor_near_the_bottom_glides_up() {
        let m = PanelMetrics::default();
        let offset = 500.0; // center at 1040
        let expanded = window_target(&m, display(), offset, 1.0);
        let safe = 1080.0 - 225.0 - 20.0;
        assert_eq!(expanded.y, (safe - 275.0) as i32);
    }

    #[test]
    fn safe_center_on_tiny_display_prefers_top() {
        let tiny = Rect::new(0.0, 100.0, 800.0, 300.0);
        let c = safe_center_y(tiny, 450.0, 250.0);
        assert_eq!(c, 100.0 + 225.0 + 20.0);
    }

    #[test]
    fn rect_contains_is_inclusive() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        assert!(r.contains(Point::new(10.0, 10.0)));
        assert!(r.contains(Point::new(30.0, 30.0)));
        assert!(!r.contains(Point::new(30.1, 20.0)));
        assert!(!r.contains(Point::new(9.9, 20.0)));
    }
}
