//! Scalar helpers shared by the distortion formulas.
//!
//! Every helper has a host form (plain Rust) and a WGSL form. Both perform
//! the same operations in the same order.

/// Sine remapped to [0, 1]: `sin(x) * 0.5 + 0.5`
pub fn nsin(x: f32) -> f32 {
    x.sin() * 0.5 + 0.5
}

/// Power curve over the magnitude of `x`, defined for any finite input
pub fn pow_abs(x: f32, exponent: f32) -> f32 {
    x.abs().powf(exponent)
}

/// WGSL twin of [`nsin`]
pub const NSIN_WGSL: &str = "fn nsin(val: f32) -> f32 {
    return sin(val) * 0.5 + 0.5;
}
";

#[cfg(test)]
mod tests {
    use super::*;
    use std::f32::consts::PI;

    #[test]
    fn test_nsin_is_half_at_zero() {
        assert_eq!(nsin(0.0), 0.5);
    }

    #[test]
    fn test_nsin_stays_in_unit_interval() {
        for i in -2000..2000 {
            let x = i as f32 * 0.037;
            let v = nsin(x);
            assert!((0.0..=1.0).contains(&v), "nsin({}) = {} out of range", x, v);
        }

        assert!((nsin(PI / 2.0) - 1.0).abs() < 1e-6);
        assert!(nsin(-PI / 2.0).abs() < 1e-6);
    }

    #[test]
    fn test_pow_abs_ignores_sign() {
        assert_eq!(pow_abs(-3.0, 2.0), 9.0);
        assert_eq!(pow_abs(3.0, 2.0), 9.0);
        assert!((pow_abs(-0.25, 0.5) - 0.5).abs() < 1e-6);
        assert_eq!(pow_abs(0.0, 2.0), 0.0);
    }
}
