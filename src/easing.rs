//! Easing curves for the expand/collapse animation.
//!
//! The default curve is ease-out quartic.  A CSS-like cubic Bézier can be
//! configured instead; it is solved numerically for `x(t) = u`.

use log::warn;
use serde::{Deserialize, Serialize};

/// `1 - (1 - x)^4`, clamped to the unit interval.
pub fn ease_out_quart(x: f64) -> f64 {
    let x = x.clamp(0.0, 1.0);
    1.0 - (1.0 - x).powi(4)
}

/// Linear interpolation between `a` and `b`.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Evaluate a CSS-like `cubic-bezier(x1, y1, x2, y2)` at normalized time `u`.
///
/// Control points are (0,0), (x1,y1), (x2,y2), (1,1).
pub fn cubic_bezier(u: f64, x1: f64, y1: f64, x2: f64, y2: f64) -> f64 {
    // Polynomial coefficients with endpoints fixed at (0,0) and (1,1):
    // B(t) = ((a*t + b)*t + c)*t
    let cx = 3.0 * x1;
    let bx = 3.0 * (x2 - x1) - cx;
    let ax = 1.0 - cx - bx;

    let cy = 3.0 * y1;
    let by = 3.0 * (y2 - y1) - cy;
    let ay = 1.0 - cy - by;

    let sample = |a: f64, b: f64, c: f64, t: f64| ((a * t + b) * t + c) * t;

    let u = u.clamp(0.0, 1.0);
    let t = solve_t_for_x(u, ax, bx, cx);
    sample(ay, by, cy, t)
}

/// Solve `x(t) = u` for `t` in `[0, 1]`.
fn solve_t_for_x(u: f64, ax: f64, bx: f64, cx: f64) -> f64 {
    // Newton-Raphson first; u is a good initial guess.
    let mut t = u;
    for _ in 0..8 {
        let x = ((ax * t + bx) * t + cx) * t - u;
        if x.abs() < 1e-9 {
            return t;
        }
        let dx = (3.0 * ax * t + 2.0 * bx) * t + cx;
        if dx.abs() < 1e-9 {
            break;
        }
        t -= x / dx;
        if !(0.0..=1.0).contains(&t) {
            break;
        }
    }

    // Bisection fallback
    let mut lo = 0.0;
    let mut hi = 1.0;
    t = u;
    for _ in 0..40 {
        let x = ((ax * t + bx) * t + cx) * t;
        if (x - u).abs() < 1e-10 {
            return t;
        }
        if x < u {
            lo = t;
        } else {
            hi = t;
        }
        t = 0.5 * (lo + hi);
    }
    t
}

/// Selectable easing curve.
///
/// On the wire this is either the string `"ease-out-quart"` or an object
/// `{"cubic-bezier": [x1, y1, x2, y2]}`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Easing {
    #[default]
    EaseOutQuart,
    CubicBezier([f64; 4]),
}

/// `(1-t)^2 a + 2t(1-t) b + t^2 c >= 0` for every `t` in `[0, 1]`.
fn bernstein_quadratic_nonnegative(a: f64, b: f64, c: f64) -> bool {
    a >= 0.0 && c >= 0.0 && (b >= 0.0 || b * b <= a * c)
}

impl Easing {
    /// Whether progress never moves backwards over time.
    ///
    /// A cubic Bézier qualifies when both `x(t)` and `y(t)` are
    /// non-decreasing on `[0, 1]`, i.e. when the derivative, a quadratic
    /// in Bernstein form over the control point differences, never dips
    /// below zero.
    pub fn is_monotonic(&self) -> bool {
        match *self {
            Easing::EaseOutQuart => true,
            Easing::CubicBezier(p @ [x1, y1, x2, y2]) => {
                p.iter().all(|v| v.is_finite())
                    && (0.0..=1.0).contains(&x1)
                    && (0.0..=1.0).contains(&x2)
                    && bernstein_quadratic_nonnegative(x1, x2 - x1, 1.0 - x2)
                    && bernstein_quadratic_nonnegative(y1, y2 - y1, 1.0 - y2)
            }
        }
    }

    /// `self` if it is monotonic, otherwise the default curve.
    pub fn sanitized(self) -> Self {
        if self.is_monotonic() {
            self
        } else {
            warn!("easing {:?} overshoots or runs backwards, using ease-out-quart", self);
            Easing::EaseOutQuart
        }
    }

    /// Map normalized time to normalized progress.
    ///
    /// Always returns exactly `0.0` at `t <= 0` and `1.0` at `t >= 1`.
    pub fn apply(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return 0.0;
        }
        if t >= 1.0 {
            return 1.0;
        }
        match *self {
            Easing::EaseOutQuart => ease_out_quart(t),
            Easing::CubicBezier([x1, y1, x2, y2]) => cubic_bezier(t, x1, y1, x2, y2),
        }
    }
}
