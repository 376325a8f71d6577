//! Easing and interpolation helpers.
//!
//! Pure functions over a normalized progress value. Travel moves use
//! [`smoothstep`] so the mirrors start and stop with zero velocity.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Hermite S-curve `t²(3 − 2t)`, with `t` clamped to `[0, 1]`.
///
/// Zero first derivative at both ends.
#[inline]
pub fn smoothstep(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

/// Linear interpolation between `a` and `b`.
///
/// `t` is not clamped; callers clamp when they need to.
#[inline]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

/// Progress curve applied to travel moves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Easing {
    Linear,
    #[default]
    SmoothStep,
}

impl Easing {
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Easing::Linear => t.clamp(0.0, 1.0),
            Easing::SmoothStep => smoothstep(t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 1e-12;

    #[test]
    fn test_smoothstep_endpoints() {
        assert_eq!(smoothstep(0.0), 0.0);
        assert_eq!(smoothstep(1.0), 1.0);
        assert_eq!(smoothstep(0.5), 0.5);
    }

    #[test]
    fn test_smoothstep_is_monotonic() {
        let mut prev = smoothstep(0.0);
        for i in 1..=1000 {
            let v = smoothstep(i as f64 / 1000.0);
            assert!(v >= prev, "not monotonic at step {}", i);
            prev = v;
        }
    }

    #[test]
    fn test_smoothstep_symmetry() {
        for i in 0..=100 {
            let t = i as f64 / 100.0;
            let diff = smoothstep(t) - (1.0 - smoothstep(1.0 - t));
            assert!(diff.abs() < EPS, "asymmetric at t={}", t);
        }
    }

    #[test]
    fn test_smoothstep_flat_at_ends() {
        // Finite difference slope near the ends tends to zero
        let h = 1e-6;
        assert!(smoothstep(h) / h < 1e-5);
        assert!((1.0 - smoothstep(1.0 - h)) / h < 1e-5);
    }

    #[test]
    fn test_smoothstep_clamps_outside_unit_interval() {
        assert_eq!(smoothstep(-3.0), 0.0);
        assert_eq!(smoothstep(7.5), 1.0);
    }

    #[test]
    fn test_lerp() {
        assert_eq!(lerp(10.0, 20.0, 0.0), 10.0);
        assert_eq!(lerp(10.0, 20.0, 1.0), 20.0);
        assert_eq!(lerp(10.0, 20.0, 0.25), 12.5);
        assert_eq!(lerp(20.0, 10.0, 0.5), 15.0);
    }

    #[test]
    fn test_easing_apply() {
        assert_eq!(Easing::Linear.apply(0.25), 0.25);
        assert_eq!(Easing::SmoothStep.apply(0.25), smoothstep(0.25));
        assert_eq!(Easing::default(), Easing::SmoothStep);
    }
}
