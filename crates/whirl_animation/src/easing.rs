//! Easing functions
//!
//! An easing maps an elapsed-time fraction `t` in `[0, 1]` to a progress
//! fraction. Inputs outside `[0, 1]` are clamped before the curve is applied.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Easing curve for timed animations
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Easing {
    /// Constant speed
    Linear,
    /// Cubic ease-in
    EaseIn,
    /// Cubic ease-out
    EaseOut,
    /// Cubic ease-in-out
    EaseInOut,
    /// Quartic ease-out, `1 - (1 - t)^4`
    #[default]
    EaseOutQuart,
    /// Quartic ease-in-out
    EaseInOutQuart,
    /// CSS-style cubic bezier with control points (x1, y1) and (x2, y2)
    CubicBezier(f32, f32, f32, f32),
    /// Arbitrary curve
    #[serde(skip)]
    Custom(fn(f32) -> f32),
}

impl Easing {
    /// Apply the curve to `t`, clamped to `[0, 1]`
    pub fn apply(&self, t: f32) -> f32 {
        let t = if t.is_nan() { 1.0 } else { t.clamp(0.0, 1.0) };

        match *self {
            Easing::Linear => t,
            Easing::EaseIn => t * t * t,
            Easing::EaseOut => 1.0 - (1.0 - t).powi(3),
            Easing::EaseInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
                }
            }
            Easing::EaseOutQuart => 1.0 - (1.0 - t).powi(4),
            Easing::EaseInOutQuart => {
                if t < 0.5 {
                    8.0 * t.powi(4)
                } else {
                    1.0 - (-2.0 * t + 2.0).powi(4) / 2.0
                }
            }
            Easing::CubicBezier(x1, y1, x2, y2) => cubic_bezier(t, x1, y1, x2, y2),
            Easing::Custom(f) => f(t),
        }
    }

    /// Progress after `elapsed` of an animation lasting `duration`
    ///
    /// A zero duration is already complete, so it samples `t = 1`.
    pub fn sample(&self, elapsed: Duration, duration: Duration) -> f32 {
        if duration.is_zero() {
            return self.apply(1.0);
        }
        self.apply(elapsed.as_secs_f32() / duration.as_secs_f32())
    }
}

/// Solve a cubic bezier timing curve for progress at time `t`
fn cubic_bezier(t: f32, x1: f32, y1: f32, x2: f32, y2: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }

    let bezier = |p1: f32, p2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * s * p1 + 3.0 * inv * s * s * p2 + s * s * s
    };
    let slope = |p1: f32, p2: f32, s: f32| {
        let inv = 1.0 - s;
        3.0 * inv * inv * p1 + 6.0 * inv * s * (p2 - p1) + 3.0 * s * s * (1.0 - p2)
    };

    // Newton-Raphson on x(s) = t, falling back to bisection on flat slopes.
    let mut s = t;
    for _ in 0..8 {
        let x = bezier(x1, x2, s) - t;
        if x.abs() < 1e-6 {
            return bezier(y1, y2, s);
        }
        let d = slope(x1, x2, s);
        if d.abs() < 1e-6 {
            break;
        }
        s -= x / d;
    }

    let (mut lo, mut hi) = (0.0_f32, 1.0_f32);
    s = t;
    for _ in 0..32 {
        let x = bezier(x1, x2, s);
        if (x - t).abs() < 1e-6 {
            break;
        }
        if x < t {
            lo = s;
        } else {
            hi = s;
        }
        s = (lo + hi) / 2.0;
    }
    bezier(y1, y2, s)
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 7] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::EaseOutQuart,
        Easing::EaseInOutQuart,
        Easing::CubicBezier(0.25, 0.1, 0.25, 1.0),
    ];

    #[test]
    fn test_endpoints() {
        for easing in ALL {
            assert!(easing.apply(0.0).abs() < 1e-4, "{easing:?} at 0");
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-4, "{easing:?} at 1");
        }
    }

    #[test]
    fn test_default_is_quartic_ease_out() {
        let easing = Easing::default();
        assert_eq!(easing.apply(1.0), 1.0);
        assert!((easing.apply(0.5) - 0.9375).abs() < 1e-6);
    }

    #[test]
    fn test_input_is_clamped() {
        assert_eq!(Easing::Linear.apply(-3.0), 0.0);
        assert_eq!(Easing::Linear.apply(7.0), 1.0);
        assert_eq!(Easing::EaseOutQuart.apply(f32::NAN), 1.0);
    }

    #[test]
    fn test_sample_zero_duration_is_complete() {
        assert_eq!(
            Easing::EaseOutQuart.sample(Duration::ZERO, Duration::ZERO),
            1.0
        );
        assert!(
            (Easing::Linear.sample(Duration::from_millis(250), Duration::from_secs(1)) - 0.25)
                .abs()
                < 1e-6
        );
    }

    #[test]
    fn test_monotonic_ease_out() {
        let mut prev = 0.0;
        for i in 0..=100 {
            let v = Easing::EaseOutQuart.apply(i as f32 / 100.0);
            assert!(v >= prev);
            prev = v;
        }
    }

    #[test]
    fn test_custom_easing() {
        fn half(t: f32) -> f32 {
            t / 2.0
        }
        assert_eq!(Easing::Custom(half).apply(1.0), 0.5);
    }

    #[test]
    fn test_deserialize_named_easing() {
        #[derive(Deserialize)]
        struct Cfg {
            easing: Easing,
        }

        let cfg: Cfg = toml::from_str("easing = \"ease_in_out\"").unwrap();
        assert!(matches!(cfg.easing, Easing::EaseInOut));
    }
}
