//! Visibility of the drag-to-launch drop zone.
//!
//! Toolkits deliver enter/leave pairs for every child widget an external
//! drag crosses, so a single boolean flickers.  [`DropTargetVisibility`]
//! counts nested enters and only publishes the edges: `true` when the first
//! drag enters, `false` when the last one leaves or the drag ends.
//!
//! The service is owned by the engine; any number of widgets subscribe to
//! it over channels.

use log::debug;
use std::sync::mpsc;

#[derive(Debug, Default)]
pub struct DropTargetVisibility {
    depth: u32,
    subscribers: Vec<mpsc::Sender<bool>>,
}

impl DropTargetVisibility {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receive `true`/`false` whenever the drop zone shows or hides.
    pub fn subscribe(&mut self) -> mpsc::Receiver<bool> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn is_visible(&self) -> bool {
        self.depth > 0
    }

    pub fn enter(&mut self) {
        self.depth += 1;
        if self.depth == 1 {
            self.publish(true);
        }
    }

    pub fn leave(&mut self) {
        match self.depth {
            0 => {}
            1 => {
                self.depth = 0;
                self.publish(false);
            }
            _ => self.depth -= 1,
        }
    }

    /// The drag finished (dropped or cancelled): hide regardless of depth.
    pub fn reset(&mut self) {
        if self.depth > 0 {
            self.depth = 0;
            self.publish(false);
        }
    }

    fn publish(&mut self, visible: bool) {
        debug!("drop target visible={}", visible);
        // Forget subscribers whose receiver is gone.
        self.subscribers.retain(|tx| tx.send(visible).is_ok());
    }
}
