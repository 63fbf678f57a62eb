//! The host side of the geometry contract.
//!
//! * [`channel::ChannelHost`] is the [`GeometryHost`](crate::traits::GeometryHost)
//!   the engine talks to: it turns every call into a [`HostRequest`] on an
//!   `mpsc` channel and never blocks.
//! * [`window::HostWindow`] sits on the other end of that channel and
//!   decides where the window actually goes.

pub mod channel;
pub mod window;

use std::sync::mpsc;

/// One request from the engine to the window host.
#[derive(Debug, Clone)]
pub enum HostRequest {
    Resize {
        width: u32,
        height: u32,
        y: Option<i32>,
    },
    SetIgnoreMouse {
        ignore: bool,
        forward: bool,
    },
    MoveBy {
        delta_y: i32,
    },
    KeepOnTop(bool),
    /// Answer with the anchor offset implied by the current bounds.
    QueryAnchorOffset {
        reply: mpsc::Sender<i32>,
    },
}
