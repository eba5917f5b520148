//! Easing curves shared by the idle controllers.

/// Cubic ease-in-out over `t ∈ [0, 1]`; input is clamped.
#[must_use]
pub fn ease_in_out_cubic(t: f64) -> f64 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

/// Linear interpolation from `a` to `b`.
#[must_use]
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_exact() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert!((ease_in_out_cubic(0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn curve_is_monotonic_and_clamped() {
        let mut prev = ease_in_out_cubic(-1.0);
        assert_eq!(prev, 0.0);
        for i in 1..=100 {
            let v = ease_in_out_cubic(f64::from(i) / 100.0);
            assert!(v >= prev);
            prev = v;
        }
        assert_eq!(ease_in_out_cubic(2.0), 1.0);
    }

    #[test]
    fn curve_is_symmetric() {
        for i in 0..=10 {
            let t = f64::from(i) / 10.0;
            let a = ease_in_out_cubic(t);
            let b = 1.0 - ease_in_out_cubic(1.0 - t);
            assert!((a - b).abs() < 1e-12);
        }
    }
}
