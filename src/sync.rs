//! Rate limiting of geometry requests sent to the host.
//!
//! Resting states (progress exactly `0.0` or `1.0`) always go out
//! immediately.  Intermediate states are limited to one request per frame
//! interval; a request that arrives too early replaces any previously held
//! one and is carried by the next eligible [`flush`](GeometrySync::flush).
//! Nothing is ever queued, so the host can only see the most recent value.

use crate::geometry::GeometryTarget;
use std::time::{Duration, Instant};

/// One frame at 60 Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(16);

/// Throttle state for outgoing resize requests.
#[derive(Debug)]
pub struct GeometrySync {
    interval: Duration,
    last_sent_at: Option<Instant>,
    last_sent: Option<GeometryTarget>,
    held: Option<GeometryTarget>,
}

impl Default for GeometrySync {
    fn default() -> Self {
        Self::new(FRAME_INTERVAL)
    }
}

impl GeometrySync {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_sent_at: None,
            last_sent: None,
            held: None,
        }
    }

    fn is_due(&self, now: Instant) -> bool {
        match self.last_sent_at {
            Some(at) => now.saturating_duration_since(at) >= self.interval,
            None => true,
        }
    }

    fn mark_sent(&mut self, target: GeometryTarget, now: Instant) -> GeometryTarget {
        self.last_sent_at = Some(now);
        self.last_sent = Some(target);
        self.held = None;
        target
    }

    /// Offer the target for `progress`.  Returns the request to send now, if
    /// any.
    ///
    /// Identical consecutive targets are swallowed.
    pub fn offer(
        &mut self,
        progress: f64,
        target: GeometryTarget,
        now: Instant,
    ) -> Option<GeometryTarget> {
        let boundary = progress <= 0.0 || progress >= 1.0;
        if self.last_sent == Some(target) {
            // Whatever was held is older than what the host already shows.
            self.held = None;
            return None;
        }
        if boundary || self.is_due(now) {
            return Some(self.mark_sent(target, now));
        }
        self.held = Some(target);
        None
    }

    /// Release the held request if the frame interval has elapsed.
    pub fn flush(&mut self, now: Instant) -> Option<GeometryTarget> {
        if self.held.is_some() && self.is_due(now) {
            let target = self.held.take()?;
            return Some(self.mark_sent(target, now));
        }
        None
    }

    /// Send unconditionally (settle, snap after reposition, config resync).
    pub fn force(&mut self, target: GeometryTarget, now: Instant) -> GeometryTarget {
        self.mark_sent(target, now)
    }

    /// The last request handed out.
    pub fn last_sent(&self) -> Option<GeometryTarget> {
        self.last_sent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn target(w: u32) -> GeometryTarget {
        GeometryTarget {
            width: w,
            height: w + 50,
            y: 10,
        }
    }

    #[test]
    fn first_intermediate_request_is_sent() {
        let t0 = Instant::now();
        let mut s = GeometrySync::default();
        assert_eq!(s.offer(0.5, target(200), t0), Some(target(200)));
    }

    #[test]
    fn requests_inside_the_interval_are_held_latest_wins() {
        let t0 = Instant::now();
        let mut s = GeometrySync::default();
        s.offer(0.2, target(100), t0);
        assert_eq!(s.offer(0.3, target(120), t0 + ms(4)), None);
        assert_eq!(s.offer(0.4, target(140), t0 + ms(8)), None);
        assert!(s.held.is_some());
        assert_eq!(s.flush(t0 + ms(12)), None);
        assert_eq!(s.flush(t0 + ms(16)), Some(target(140)));
        assert!(s.held.is_none());
        assert_eq!(s.flush(t0 + ms(40)), None);
    }

    #[test]
    fn boundaries_bypass_the_throttle_and_drop_held_values() {
        let t0 = Instant::now();
        let mut s = GeometrySync::default();
        s.offer(0.9, target(400), t0);
        assert_eq!(s.offer(0.95, target(450), t0 + ms(2)), None);
        assert_eq!(s.offer(1.0, target(500), t0 + ms(3)), Some(target(500)));
        // The held 0.95 value must never follow the resting state.
        assert_eq!(s.flush(t0 + ms(100)), None);
    }

    #[test]
    fn duplicates_are_swallowed() {
        let t0 = Instant::now();
        let mut s = GeometrySync::default();
        assert!(s.offer(1.0, target(500), t0).is_some());
        assert_eq!(s.offer(1.0, target(500), t0 + ms(50)), None);
    }

    #[test]
    fn force_always_sends() {
        let t0 = Instant::now();
        let mut s = GeometrySync::default();
        s.offer(0.0, target(20), t0);
        assert_eq!(s.force(target(20), t0), target(20));
        assert_eq!(s.last_sent(), Some(target(20)));
    }
}
