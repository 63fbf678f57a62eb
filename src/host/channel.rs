//! [`GeometryHost`] that forwards every call over an `mpsc` channel.

use super::HostRequest;
use crate::traits::{AnchorReply, GeometryHost};
use log::trace;
use std::sync::mpsc;

/// Fire-and-forget bridge to whoever owns the real window.
///
/// If the receiving end is gone the request is dropped silently; the engine
/// never retries.
pub struct ChannelHost {
    tx: mpsc::Sender<HostRequest>,
}

impl ChannelHost {
    pub fn new(tx: mpsc::Sender<HostRequest>) -> Self {
        Self { tx }
    }

    /// A host and the receiver its requests arrive on.
    pub fn pair() -> (Self, mpsc::Receiver<HostRequest>) {
        let (tx, rx) = mpsc::channel();
        (Self::new(tx), rx)
    }

    fn send(&self, request: HostRequest) {
        trace!("host request {:?}", request);
        let _ = self.tx.send(request);
    }
}

impl GeometryHost for ChannelHost {
    fn resize(&self, width: u32, height: u32, y: Option<i32>) {
        self.send(HostRequest::Resize { width, height, y });
    }

    fn set_ignore_mouse(&self, ignore: bool, forward: bool) {
        self.send(HostRequest::SetIgnoreMouse { ignore, forward });
    }

    fn move_window_by(&self, delta_y: i32) {
        self.send(HostRequest::MoveBy { delta_y });
    }

    fn keep_on_top(&self, on: bool) {
        self.send(HostRequest::KeepOnTop(on));
    }

    fn query_anchor_offset(&self) -> AnchorReply {
        let (reply, pending) = AnchorReply::channel();
        self.send(HostRequest::QueryAnchorOffset { reply });
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::AnchorPoll;

    #[test]
    fn calls_become_requests_in_order() {
        let (host, rx) = ChannelHost::pair();
        host.resize(500, 550, Some(265));
        host.set_ignore_mouse(true, true);
        host.move_window_by(-8);
        host.keep_on_top(true);

        let got: Vec<HostRequest> = rx.try_iter().collect();
        assert_eq!(got.len(), 4);
        assert!(matches!(
            got[0],
            HostRequest::Resize {
                width: 500,
                height: 550,
                y: Some(265)
            }
        ));
        assert!(matches!(
            got[1],
            HostRequest::SetIgnoreMouse {
                ignore: true,
                forward: true
            }
        ));
        assert!(matches!(got[2], HostRequest::MoveBy { delta_y: -8 }));
        assert!(matches!(got[3], HostRequest::KeepOnTop(true)));
    }

    #[test]
    fn anchor_query_round_trip() {
        let (host, rx) = ChannelHost::pair();
        let pending = host.query_anchor_offset();
        assert_eq!(pending.poll(), AnchorPoll::Pending);
        match rx.try_recv().unwrap() {
            HostRequest::QueryAnchorOffset { reply } => reply.send(-30).unwrap(),
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(pending.poll(), AnchorPoll::Ready(-30));
    }

    #[test]
    fn closed_receiver_loses_requests_quietly() {
        let (host, rx) = ChannelHost::pair();
        drop(rx);
        host.resize(20, 104, None);
        assert_eq!(host.query_anchor_offset().poll(), AnchorPoll::Lost);
    }
}
