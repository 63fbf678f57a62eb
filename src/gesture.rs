//! Horizontal swipe tracking for the expand/collapse axis.
//!
//! # From pointer samples to a release decision
//!
//! A [`GestureSession`] is opened on pointer-down and fed every pointer-move
//! until pointer-up:
//!
//! 1. **Begin**: the session's `origin` is chosen so that the current panel
//!    progress maps onto the pointer position.  A collapsed panel starts at
//!    `origin = x`; an expanded one at `origin = x - travel`; a panel caught
//!    mid-animation at `origin = x - progress * travel`.
//! 2. **Track**: each sample updates the instantaneous velocity (last
//!    sample only, px/ms) and, once the session is *armed*, yields a new
//!    progress `clamp((x - origin) / travel, 0, 1)`.
//! 3. **Finish**: the release is classified by [`decide`]:
//!
//! | Order | Condition                                              | Result   |
//! |-------|--------------------------------------------------------|----------|
//! | 1     | `velocity < -velocity_threshold`                       | collapse |
//! | 2     | `delta > expand_distance` or `velocity > threshold` or quick flick | expand |
//! | 3     | tap while collapsed                                    | expand   |
//! | 4     | anything else                                          | collapse |
//!
//! Sessions started on an idle, expanded panel are **unarmed**: they do not
//! move the panel until a fast leftward flick (`velocity < -arm_velocity`)
//! is observed.  This keeps slow drags across an open panel from collapsing
//! it by accident.

use log::debug;
use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Tuning knobs for the horizontal gesture.
///
/// Distances are in pixels, velocities in pixels per millisecond, windows in
/// milliseconds.  The decision rule's shape is fixed; only these numbers
/// move.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Pointer travel mapped to full progress.  Default: `250.0`.
    pub travel_distance: f64,
    /// Net rightward travel that expands on release.  Default: `60.0`.
    pub expand_distance: f64,
    /// Release velocity that forces expand (positive) or collapse
    /// (negative).  Default: `0.3`.
    pub velocity_threshold: f64,
    /// Leftward speed that arms a session started on an expanded panel.
    /// Default: `0.5`.
    pub arm_velocity: f64,
    /// A release within this window...  Default: `200`.
    pub flick_window_ms: f64,
    /// ...that travelled further than this expands.  Default: `20.0`.
    pub flick_distance: f64,
    /// Maximum displacement of a tap.  Default: `5.0`.
    pub tap_distance: f64,
    /// Maximum duration of a tap.  Default: `300`.
    pub tap_window_ms: f64,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            travel_distance: 250.0,
            expand_distance: 60.0,
            velocity_threshold: 0.3,
            arm_velocity: 0.5,
            flick_window_ms: 200.0,
            flick_distance: 20.0,
            tap_distance: 5.0,
            tap_window_ms: 300.0,
        }
    }
}

impl GestureConfig {
    /// Replace nonsensical values with the defaults.
    pub fn sanitized(self) -> Self {
        let d = Self::default();
        let pick = |v: f64, fallback: f64| if v.is_finite() && v > 0.0 { v } else { fallback };
        Self {
            travel_distance: pick(self.travel_distance, d.travel_distance),
            expand_distance: pick(self.expand_distance, d.expand_distance),
            velocity_threshold: pick(self.velocity_threshold, d.velocity_threshold),
            arm_velocity: pick(self.arm_velocity, d.arm_velocity),
            flick_window_ms: pick(self.flick_window_ms, d.flick_window_ms),
            flick_distance: pick(self.flick_distance, d.flick_distance),
            tap_distance: pick(self.tap_distance, d.tap_distance),
            tap_window_ms: pick(self.tap_window_ms, d.tap_window_ms),
        }
    }
}

/// How the panel was found when the session began.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StartState {
    /// Idle and collapsed.
    Collapsed,
    /// Idle and expanded.
    Expanded,
    /// An animation was running at this progress and has been taken over.
    Animating(f64),
}

/// Outcome of a finished session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    Expand,
    Collapse,
    /// The session never armed; nothing happens.
    Discard,
}

/// Velocity and displacement at release, fed to [`decide`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReleaseSample {
    /// Net travel since `origin`-adjusted start (px).
    pub delta: f64,
    /// Last instantaneous velocity (px/ms).
    pub velocity: f64,
    /// Time since pointer-down (ms).
    pub duration_ms: f64,
}

/// Classify a release.  See the module docs for the table.
pub fn decide(sample: ReleaseSample, was_expanded: bool, cfg: &GestureConfig) -> Release {
    let ReleaseSample {
        delta,
        velocity,
        duration_ms,
    } = sample;

    if velocity < -cfg.velocity_threshold {
        return Release::Collapse;
    }

    let quick_flick = duration_ms < cfg.flick_window_ms && delta > cfg.flick_distance;
    if delta > cfg.expand_distance || velocity > cfg.velocity_threshold || quick_flick {
        return Release::Expand;
    }

    let is_tap = delta.abs() < cfg.tap_distance && duration_ms < cfg.tap_window_ms;
    if is_tap && !was_expanded {
        return Release::Expand;
    }

    Release::Collapse
}

fn millis_between(earlier: Instant, later: Instant) -> f64 {
    later.saturating_duration_since(earlier).as_secs_f64() * 1000.0
}

/// An in-flight horizontal gesture.
#[derive(Debug, Clone)]
pub struct GestureSession {
    cfg: GestureConfig,
    origin: f64,
    last_coordinate: f64,
    last_timestamp: Instant,
    started_at: Instant,
    velocity: f64,
    armed: bool,
}

impl GestureSession {
    /// Open a session at pointer coordinate `x`.
    ///
    /// The config is copied so a reload mid-gesture cannot change the rules
    /// under the user's finger.
    pub fn begin(x: f64, now: Instant, start: StartState, cfg: GestureConfig) -> Self {
        let travel = cfg.travel_distance;
        let (origin, armed) = match start {
            StartState::Collapsed => (x, true),
            StartState::Expanded => (x - travel, false),
            StartState::Animating(progress) => (x - progress.clamp(0.0, 1.0) * travel, true),
        };
        debug!(
            "gesture begin x={:.1} origin={:.1} armed={} ({:?})",
            x, origin, armed, start
        );
        Self {
            cfg,
            origin,
            last_coordinate: x,
            last_timestamp: now,
            started_at: now,
            velocity: 0.0,
            armed,
        }
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    /// Progress corresponding to pointer coordinate `x`.
    pub fn progress_at(&self, x: f64) -> f64 {
        ((x - self.origin) / self.cfg.travel_distance).clamp(0.0, 1.0)
    }

    /// Feed a pointer sample.  Returns the new progress once armed.
    pub fn track(&mut self, x: f64, now: Instant) -> Option<f64> {
        let dt = millis_between(self.last_timestamp, now);
        if dt > 0.0 {
            self.velocity = (x - self.last_coordinate) / dt;
        }
        self.last_coordinate = x;
        self.last_timestamp = now;

        if !self.armed {
            if self.velocity < -self.cfg.arm_velocity {
                debug!("gesture armed at v={:.2}", self.velocity);
                self.armed = true;
            } else {
                return None;
            }
        }

        Some(self.progress_at(x))
    }

    /// Close the session and classify the release.
    ///
    /// `x` is `None` when the platform gave no release coordinate (a touch
    /// that ended without a changed-touch point); the delta is then zero.
    pub fn finish(self, x: Option<f64>, now: Instant, was_expanded: bool) -> Release {
        if !self.armed {
            debug!("gesture discarded (never armed)");
            return Release::Discard;
        }
        let sample = ReleaseSample {
            delta: x.map(|x| x - self.origin).unwrap_or(0.0),
            velocity: self.velocity,
            duration_ms: millis_between(self.started_at, now),
        };
        let release = decide(sample, was_expanded, &self.cfg);
        debug!(
            "gesture end delta={:.1} v={:.2} dur={:.0}ms -> {:?}",
            sample.delta, sample.velocity, sample.duration_ms, release
        );
        release
    }
}

//  Tests
