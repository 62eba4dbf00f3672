//! Animatable value types
//!
//! Provides the interpolation trait used by [`ValueAnimator`](crate::ValueAnimator).

/// Trait for values that can be linearly interpolated
pub trait Interpolate: Clone + 'static {
    /// Linearly interpolate between self and other by factor t (0.0 to 1.0)
    fn lerp(&self, other: &Self, t: f32) -> Self;
}

/// Scroll offsets
impl Interpolate for f64 {
    fn lerp(&self, other: &Self, t: f32) -> Self {
        self + (other - self) * f64::from(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_interpolation() {
        assert_eq!(0.0_f64.lerp(&1.0, 0.5), 0.5);
        assert_eq!(10.0_f64.lerp(&20.0, 0.25), 12.5);
    }

    #[test]
    fn test_interpolation_far_from_origin() {
        let from = 4_200_000.0_f64;
        let mid = from.lerp(&(from + 1.0), 0.5);
        assert_eq!(mid - from, 0.5);
    }
}
