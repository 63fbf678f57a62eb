//! **edgebar**: a gesture-driven launcher sidebar docked to the screen edge.
//!
//! At rest the panel is a thin strip on the left edge of a display.  A
//! horizontal drag, a toggle command or an external file drag unfolds it
//! into a full panel; a release decides (by distance and velocity) whether
//! it settles open or closed, and an eased animation carries it there.
//! While the panel is resting the window lets clicks fall through
//! everywhere except the strip or panel itself.
//!
//! # Architecture
//!
//! All decisions are made by the single-threaded [`engine::InteractionEngine`].
//! It is driven by [`event::InputEvent`]s plus a periodic
//! [`on_frame`](engine::InteractionEngine::on_frame) tick, and talks to the
//! outside world through two traits:
//!
//! * [`traits::GeometryHost`]: resizes and moves the native window, toggles
//!   click-through and reports where the window sits.
//! * [`traits::ConfigStore`]: loads the JSON config and persists the anchor
//!   offset after the user drags the panel by its handle.
//!
//! [`traits::InputSource`] abstracts background transports that deliver
//! events, such as the [`ipc`] Unix socket.  Concrete hosts live in
//! [`host`]; the on-screen GTK layer-shell window is in `frontend`.

pub mod animator;
pub mod config;
pub mod drop_target;
pub mod easing;
pub mod engine;
pub mod event;
#[cfg(feature = "frontend-gtk")]
pub mod frontend;
pub mod geometry;
pub mod gesture;
pub mod hit_test;
pub mod host;
pub mod ipc;
pub mod panel;
pub mod reposition;
pub mod store;
pub mod sync;
pub mod traits;
