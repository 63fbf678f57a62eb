//! Core traits that decouple the interaction engine from the window it
//! drives, the file its settings come from, and the transport its input
//! arrives on.
//!
//! The [`InteractionEngine`](crate::engine::InteractionEngine) only depends
//! on these abstractions.  Concrete implementations live in [`host`]
//! (window placement and the channel bridge to the UI thread), [`store`]
//! (JSON config file) and [`ipc`] (Unix-socket input).
//!
//! [`host`]: crate::host
//! [`store`]: crate::store
//! [`ipc`]: crate::ipc

use crate::config::Config;
use crate::event::TimedEvent;
use std::sync::mpsc;

//  Geometry Host

/// The on-screen window that hosts the panel.
///
/// Every call is fire-and-forget: implementations must not block the
/// caller, and a request that cannot be delivered is simply lost.  The
/// anchor query is the one round trip; its answer arrives later through an
/// [`AnchorReply`].
pub trait GeometryHost {
    /// Resize the window.  `y` is the new top edge in screen coordinates;
    /// `None` lets the host place the window from the stored anchor offset.
    fn resize(&self, width: u32, height: u32, y: Option<i32>);

    /// Let clicks fall through the window (`ignore`).  With `forward` the
    /// window still receives pointer motion while ignoring clicks.
    fn set_ignore_mouse(&self, ignore: bool, forward: bool);

    /// Move the window vertically by `delta_y` pixels.
    fn move_window_by(&self, delta_y: i32);

    fn keep_on_top(&self, on: bool);

    /// Ask for the anchor offset implied by the window's current bounds.
    fn query_anchor_offset(&self) -> AnchorReply;
}

/// State of a pending [`AnchorReply`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnchorPoll {
    Ready(i32),
    Pending,
    /// The host went away without answering.
    Lost,
}

/// A not-yet-answered anchor-offset query.
#[derive(Debug)]
pub struct AnchorReply {
    rx: mpsc::Receiver<i32>,
}

impl AnchorReply {
    /// A reply slot and the sender the host answers through.
    pub fn channel() -> (mpsc::Sender<i32>, Self) {
        let (tx, rx) = mpsc::channel();
        (tx, Self { rx })
    }

    /// An already answered query, for hosts that live on the caller's
    /// thread.
    pub fn ready(offset: i32) -> Self {
        let (tx, reply) = Self::channel();
        let _ = tx.send(offset);
        reply
    }

    pub fn poll(&self) -> AnchorPoll {
        match self.rx.try_recv() {
            Ok(offset) => AnchorPoll::Ready(offset),
            Err(mpsc::TryRecvError::Empty) => AnchorPoll::Pending,
            Err(mpsc::TryRecvError::Disconnected) => AnchorPoll::Lost,
        }
    }
}

//  Config Store

/// Where settings come from and where the anchor offset is written back.
pub trait ConfigStore {
    /// The error type produced by this store.
    type Error: std::error::Error + 'static;

    /// Read the current configuration, including the selected display's
    /// bounds.
    fn load(&self) -> Result<Config, Self::Error>;

    /// Defaults to run with when [`load`](Self::load) fails.  Stores that
    /// know the display layout attach the selected display here too.
    fn fallback(&self) -> Config {
        Config::default()
    }

    /// Persist a new anchor offset, leaving every other setting untouched.
    /// Subscribers are notified with the updated configuration.
    fn save_anchor_offset(&self, offset: i32) -> Result<(), Self::Error>;

    /// Receive every configuration written through this store.
    fn subscribe(&self) -> mpsc::Receiver<Config>;
}

//  Input Source

/// A source of [`TimedEvent`]s.
///
/// Implementations listen on some transport (a Unix socket, a replay
/// script, a test harness) and forward parsed events into the provided
/// [`mpsc::Sender`].
///
/// # Contract
///
/// * [`run`](InputSource::run) **blocks** until the source is exhausted or
///   an unrecoverable error occurs.
/// * Each received event must be sent through `sink` exactly once, stamped
///   with its arrival time.
/// * Implementations must be [`Send`] so they can run on a dedicated thread.
pub trait InputSource: Send {
    /// The error type produced by this source.
    type Error: std::error::Error + Send + 'static;

    /// Start listening and forward every incoming event into `sink`.
    fn run(&mut self, sink: mpsc::Sender<TimedEvent>) -> Result<(), Self::Error>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::InputEvent;

    #[derive(Debug, thiserror::Error)]
    #[error("mock error")]
    struct MockError;

    /// A test double that emits a fixed sequence of events.
    struct MockSource {
        events: Vec<InputEvent>,
    }

    impl InputSource for MockSource {
        type Error = MockError;

        fn run(&mut self, sink: mpsc::Sender<TimedEvent>) -> Result<(), MockError> {
            for event in self.events.drain(..) {
                let _ = sink.send(TimedEvent::now(event));
            }
            Ok(())
        }
    }

    #[test]
    fn mock_source_emits_events() {
        let mut src = MockSource {
            events: vec![InputEvent::FocusLost, InputEvent::Toggle],
        };
        let (tx, rx) = mpsc::channel();
        src.run(tx).unwrap();
        let events: Vec<InputEvent> = rx.try_iter().map(|e| e.event).collect();
        assert_eq!(events, vec![InputEvent::FocusLost, InputEvent::Toggle]);
    }

    #[test]
    fn anchor_reply_states() {
        let (tx, reply) = AnchorReply::channel();
        assert_eq!(reply.poll(), AnchorPoll::Pending);
        tx.send(-40).unwrap();
        assert_eq!(reply.poll(), AnchorPoll::Ready(-40));
        drop(tx);
        assert_eq!(reply.poll(), AnchorPoll::Lost);
    }

    #[test]
    fn ready_reply_answers_immediately() {
        assert_eq!(AnchorReply::ready(12).poll(), AnchorPoll::Ready(12));
    }
}
