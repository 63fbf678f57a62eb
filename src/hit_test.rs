//! Mouse-transparency gate.
//!
//! The host window is deliberately larger than the panel it shows, so
//! clicks outside the visible panel must fall through to whatever lies
//! beneath.  [`TransparencyGate`] remembers the last flag sent to the host
//! and only reports a request when the value actually changes; toggling
//! click-through is not free on any compositor.

use crate::geometry::Point;
use crate::panel::PanelLayout;

/// Pass-through flag sent to the host.  `forward` is always requested so
/// the window keeps receiving motion while ignoring clicks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IgnoreMouse {
    pub ignore: bool,
    pub forward: bool,
}

#[derive(Debug, Default)]
pub struct TransparencyGate {
    current: Option<bool>,
}

impl TransparencyGate {
    pub fn new() -> Self {
        Self::default()
    }

    /// Request `ignore`.  Returns the message to send, or `None` if the host
    /// already has this value.
    pub fn set(&mut self, ignore: bool) -> Option<IgnoreMouse> {
        if self.current == Some(ignore) {
            return None;
        }
        self.current = Some(ignore);
        Some(IgnoreMouse {
            ignore,
            forward: true,
        })
    }

    /// Recompute the flag from a window-local pointer position.
    pub fn hover(&mut self, layout: &PanelLayout, local: Point) -> Option<IgnoreMouse> {
        self.set(!layout.hit_area().contains(local))
    }

    /// Capture everything (gesture or animation in progress).
    pub fn capture(&mut self) -> Option<IgnoreMouse> {
        self.set(false)
    }

    /// Pass everything through (pointer left the window).
    pub fn release(&mut self) -> Option<IgnoreMouse> {
        self.set(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{window_target, PanelMetrics, Rect};
    use crate::panel::{PanelState, PanelStyle};

    fn expanded_layout() -> PanelLayout {
        let m = PanelMetrics::default();
        let mut s = PanelState::default();
        s.set_progress(1.0);
        s.commit(true);
        let display = Rect::new(0.0, 0.0, 1920.0, 1080.0);
        PanelLayout::compute(
            &m,
            &s,
            &PanelStyle::at(1.0, 0.95, true),
            window_target(&m, display, 0.0, 1.0),
        )
    }

    #[test]
    fn first_request_always_goes_out() {
        let mut g = TransparencyGate::new();
        assert_eq!(g.current, None);
        assert_eq!(
            g.set(true),
            Some(IgnoreMouse {
                ignore: true,
                forward: true
            })
        );
    }

    #[test]
    fn repeated_values_are_deduplicated() {
        let mut g = TransparencyGate::new();
        assert!(g.release().is_some());
        assert!(g.release().is_none());
        assert!(g.capture().is_some());
        assert!(g.capture().is_none());
        assert_eq!(g.current, Some(false));
    }

    #[test]
    fn hover_follows_the_panel_rect() {
        let layout = expanded_layout();
        let mut g = TransparencyGate::new();
        let inside = g.hover(&layout, Point::new(100.0, 300.0)).unwrap();
        assert!(!inside.ignore);
        // Still inside, nothing to send.
        assert!(g.hover(&layout, Point::new(120.0, 310.0)).is_none());
        // Into the window padding.
        let outside = g.hover(&layout, Point::new(460.0, 300.0)).unwrap();
        assert!(outside.ignore);
    }
}
