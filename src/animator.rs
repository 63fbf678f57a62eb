//! Time-based expand/collapse animation.
//!
//! An [`Animation`] interpolates progress from wherever the panel currently
//! is toward `0.0` (collapse) or `1.0` (expand).  It holds no timer of its
//! own: the owner samples it once per frame and drops it to cancel, which
//! makes cancellation synchronous.

use crate::easing::Easing;
use log::debug;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

/// Where an animation is headed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Transition {
    Expand,
    Collapse,
}

impl Transition {
    /// Target progress of this transition.
    pub fn target(self) -> f64 {
        match self {
            Transition::Expand => 1.0,
            Transition::Collapse => 0.0,
        }
    }

    pub fn is_expand(self) -> bool {
        self == Transition::Expand
    }
}

/// Animation timing settings.
///
/// `base_duration_ms` is divided by the configured animation speed
/// multiplier to get the actual duration (see [`animation_duration`]).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
    /// Duration at speed `1.0` (ms).  Default: `300`.
    pub base_duration_ms: u64,
    /// Easing curve.  Default: ease-out quartic.
    pub easing: Easing,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            base_duration_ms: 300,
            easing: Easing::EaseOutQuart,
        }
    }
}

/// `base / speed`, treating a non-positive or non-finite speed as `1.0`.
pub fn animation_duration(base_ms: u64, speed: f64) -> Duration {
    let speed = if speed.is_finite() && speed > 0.0 { speed } else { 1.0 };
    Duration::from_micros((base_ms as f64 * 1000.0 / speed).round() as u64)
}

/// One sampled frame of an animation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frame {
    pub progress: f64,
    pub finished: bool,
}

/// An in-flight progress animation.
#[derive(Debug, Clone)]
pub struct Animation {
    transition: Transition,
    start_progress: f64,
    started_at: Instant,
    duration: Duration,
    easing: Easing,
}

impl Animation {
    pub fn new(
        transition: Transition,
        start_progress: f64,
        now: Instant,
        duration: Duration,
        easing: Easing,
    ) -> Self {
        debug!(
            "animation {:?} from {:.3} over {}ms",
            transition,
            start_progress,
            duration.as_millis()
        );
        Self {
            transition,
            start_progress: start_progress.clamp(0.0, 1.0),
            started_at: now,
            duration,
            easing,
        }
    }

    pub fn transition(&self) -> Transition {
        self.transition
    }

    /// Progress at `now`.
    ///
    /// The final frame (`elapsed >= duration`) reports the target exactly.
    pub fn sample(&self, now: Instant) -> Frame {
        let elapsed = now.saturating_duration_since(self.started_at);
        let target = self.transition.target();
        if self.duration.is_zero() || elapsed >= self.duration {
            return Frame {
                progress: target,
                finished: true,
            };
        }
        let t = elapsed.as_secs_f64() / self.duration.as_secs_f64();
        let eased = self.easing.apply(t);
        Frame {
            progress: (self.start_progress + (target - self.start_progress) * eased).clamp(0.0, 1.0),
            finished: false,
        }
    }
}
