//! Panel state, derived style, and window-local layout.

use crate::easing::lerp;
use crate::event::PointerTarget;
use crate::geometry::{GeometryTarget, PanelMetrics, Point, Rect};

/// Height of the reposition grip at the top of the expanded panel.
pub const HANDLE_HEIGHT: f64 = 24.0;

/// The long-lived panel model owned by the engine.
///
/// Only `progress` is stored; width and height are derived from it through
/// [`PanelMetrics::size_at`] so they always move together.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelState {
    expanded: bool,
    progress: f64,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            expanded: false,
            progress: 0.0,
        }
    }
}

impl PanelState {
    /// Committed (non-transitional) state.
    pub fn is_expanded(&self) -> bool {
        self.expanded
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn commit(&mut self, expanded: bool) {
        self.expanded = expanded;
    }

    /// Whether the panel sits exactly at `target` with a matching committed
    /// state.
    pub fn rests_at(&self, target: f64) -> bool {
        self.progress == target && self.expanded == (target >= 1.0)
    }

    pub fn dimensions(&self, metrics: &PanelMetrics) -> (f64, f64) {
        metrics.size_at(self.progress)
    }
}

/// Visual style of the panel at a given progress.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelStyle {
    pub corner_radius: f64,
    pub margin_left: f64,
    /// Gray level of the background, `156..=255`.
    pub gray: u8,
    /// Background alpha, blending from `0.8` toward the configured opacity.
    pub alpha: f64,
    /// Style transitions are disabled while code drives the size.
    pub transitions: bool,
}

impl PanelStyle {
    pub fn at(progress: f64, opacity: f64, transitions: bool) -> Self {
        let p = progress.clamp(0.0, 1.0);
        Self {
            corner_radius: lerp(4.0, 16.0, p),
            margin_left: lerp(6.0, 12.0, p),
            gray: lerp(156.0, 255.0, p).floor() as u8,
            alpha: lerp(0.8, opacity, p),
            transitions,
        }
    }
}

/// Window-local rectangles of everything the pointer can hit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PanelLayout {
    /// The whole host window, at the origin.
    pub window: Rect,
    /// The visible panel.
    pub panel: Rect,
    /// The reposition grip; empty while collapsed.
    pub handle: Rect,
    pub expanded: bool,
}

impl PanelLayout {
    pub fn compute(
        metrics: &PanelMetrics,
        state: &PanelState,
        style: &PanelStyle,
        target: GeometryTarget,
    ) -> Self {
        let window = Rect::new(0.0, 0.0, target.width as f64, target.height as f64);
        let (w, h) = state.dimensions(metrics);
        let panel = Rect::new(style.margin_left, (window.height - h) / 2.0, w, h);
        let handle = if state.is_expanded() {
            Rect::new(panel.x, panel.y, panel.width, HANDLE_HEIGHT.min(panel.height))
        } else {
            Rect::new(panel.x, panel.y, 0.0, 0.0)
        };
        Self {
            window,
            panel,
            handle,
            expanded: state.is_expanded(),
        }
    }

    /// Area in which the window must capture the pointer.
    ///
    /// Expanded: the panel itself.  Collapsed: the whole thin strip window,
    /// which is larger than the 4px visual strip and easier to hit.
    pub fn hit_area(&self) -> Rect {
        if self.expanded {
            self.panel
        } else {
            self.window
        }
    }

    /// Classify a window-local point.
    pub fn target_at(&self, p: Point) -> PointerTarget {
        if self.expanded && self.handle.width > 0.0 && self.handle.contains(p) {
            PointerTarget::Handle
        } else if self.hit_area().contains(p) {
            PointerTarget::Panel
        } else {
            PointerTarget::Outside
        }
    }
}
