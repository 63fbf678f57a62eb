//! Window placement on the host side.
//!
//! [`HostWindow`] is the authority on where the window is.  The engine only
//! asks for sizes and a top edge; this type docks the window to the left
//! edge of its display, keeps it on screen, and can tell how far the
//! window's center sits from the display's center (the anchor offset).

use super::HostRequest;
use crate::geometry::{Rect, STRIP_WINDOW_EXTRA_HEIGHT, STRIP_WINDOW_WIDTH};
use log::{debug, info};

/// Integer window bounds in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowBounds {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct HostWindow {
    display: Rect,
    anchor_offset: f64,
    bounds: WindowBounds,
    ignore_mouse: bool,
    forward_motion: bool,
    on_top: bool,
}

impl HostWindow {
    /// A collapsed strip window for a panel whose strip is
    /// `collapsed_height` tall, centered on `anchor_offset`.
    pub fn new(display: Rect, anchor_offset: f64, collapsed_height: f64) -> Self {
        let mut window = Self {
            display,
            anchor_offset,
            bounds: WindowBounds {
                x: display.x as i32,
                y: display.y as i32,
                width: STRIP_WINDOW_WIDTH as u32,
                height: (collapsed_height + STRIP_WINDOW_EXTRA_HEIGHT).max(1.0) as u32,
            },
            ignore_mouse: false,
            forward_motion: false,
            on_top: false,
        };
        let WindowBounds { width, height, .. } = window.bounds;
        window.resize(width, height, None);
        window
    }

    pub fn bounds(&self) -> WindowBounds {
        self.bounds
    }

    pub fn display(&self) -> Rect {
        self.display
    }

    pub fn ignores_mouse(&self) -> bool {
        self.ignore_mouse
    }

    pub fn forwards_motion(&self) -> bool {
        self.forward_motion
    }

    pub fn is_on_top(&self) -> bool {
        self.on_top
    }

    /// Move to another display (or pick up a new configured anchor).  The
    /// current size is kept.
    pub fn set_display(&mut self, display: Rect, anchor_offset: f64) {
        self.display = display;
        self.anchor_offset = anchor_offset;
        let WindowBounds { width, height, .. } = self.bounds;
        self.resize(width, height, None);
    }

    /// Apply one request.  Anchor queries are answered on the spot.
    pub fn apply(&mut self, request: HostRequest) {
        match request {
            HostRequest::Resize { width, height, y } => self.resize(width, height, y),
            HostRequest::SetIgnoreMouse { ignore, forward } => {
                self.ignore_mouse = ignore;
                self.forward_motion = forward;
            }
            HostRequest::MoveBy { delta_y } => self.move_by(delta_y),
            HostRequest::KeepOnTop(on) => {
                info!("keep on top: {}", on);
                self.on_top = on;
            }
            HostRequest::QueryAnchorOffset { reply } => {
                let _ = reply.send(self.anchor_offset());
            }
        }
    }

    /// Resize; `y` of `None` centers the window on the stored anchor.
    pub fn resize(&mut self, width: u32, height: u32, y: Option<i32>) {
        let width = width.max(1);
        let height = height.max(1);
        let y = y.unwrap_or_else(|| {
            let center = self.display.y + self.display.height / 2.0 + self.anchor_offset;
            (center - height as f64 / 2.0).floor() as i32
        });
        self.bounds = WindowBounds {
            x: self.clamp_x(width),
            y: self.clamp_y(y, height),
            width,
            height,
        };
        debug!("window bounds {:?}", self.bounds);
    }

    pub fn move_by(&mut self, delta_y: i32) {
        self.bounds.y = self.clamp_y(self.bounds.y.saturating_add(delta_y), self.bounds.height);
    }

    /// Distance of the window's center from the display's center.
    pub fn anchor_offset(&self) -> i32 {
        let b = self.bounds;
        (b.y as f64 - self.display.y - self.display.height / 2.0 + b.height as f64 / 2.0).round()
            as i32
    }

    /// Docked to the left edge; shifted left only if the window is wider
    /// than the space to the display's right edge.
    fn clamp_x(&self, width: u32) -> i32 {
        let left = self.display.x as i32;
        let max = (self.display.right() - width as f64) as i32;
        left.min(max.max(left))
    }

    fn clamp_y(&self, y: i32, height: u32) -> i32 {
        let top = self.display.y as i32;
        let bottom = (self.display.bottom() - height as f64) as i32;
        y.min(bottom).max(top)
    }
}

//  Tests
