//! Common

use num_traits::Num;
use std::ops::{Add, Mul, Neg};

/// Use 32-bit precision for floating point numbers.
pub type Float = f32;

/// Default signed integer to 32-bit.
pub type Int = i32;

/// Infinty (∞)
pub const INFINITY: Float = Float::INFINITY;

/// PI (π)
pub const PI: Float = std::f32::consts::PI;

/// 1/PI (1/π)
pub const INV_PI: Float = 1.0 / PI;

/// 2*PI (2π)
pub const TWO_PI: Float = PI * 2.0;

/// 4*PI (4π)
pub const FOUR_PI: Float = PI * 4.0;

/// 1/4*PI (1/4π)
pub const INV_FOUR_PI: Float = 1.0 / FOUR_PI;

/// Relative offset used to keep connection segments from re-hitting their endpoints.
pub const SHADOW_EPSILON: Float = 0.0001;

/// Largest representable `Float` strictly below 1.
pub const ONE_MINUS_EPSILON: Float = hexf32!("0x1.fffffep-1");

/// Returns the absolute value of a number.
///
/// * `n` - The number.
#[inline(always)]
pub fn abs<T>(n: T) -> T
where
    T: Num + Neg<Output = T> + PartialOrd + Copy,
{
    if n < T::zero() {
        -n
    } else {
        n
    }
}

/// Returns the smaller of two values. `NaN` in `b` is never selected.
///
/// * `a` - First value.
/// * `b` - Second value.
#[inline(always)]
pub fn min<T: PartialOrd>(a: T, b: T) -> T {
    if b < a {
        b
    } else {
        a
    }
}

/// Returns the larger of two values. `NaN` in `b` is never selected.
///
/// * `a` - First value.
/// * `b` - Second value.
#[inline(always)]
pub fn max<T: PartialOrd>(a: T, b: T) -> T {
    if b > a {
        b
    } else {
        a
    }
}

/// Clamps a value to the closed interval `[low, high]`.
///
/// * `val`  - Value to clamp.
/// * `low`  - Lower bound.
/// * `high` - Upper bound.
#[inline(always)]
pub fn clamp<T: PartialOrd>(val: T, low: T, high: T) -> T {
    if val < low {
        low
    } else if val > high {
        high
    } else {
        val
    }
}

/// Linearly interpolate between two values.
///
/// * `t`  - Parameter in `[0, 1]`.
/// * `v1` - Value at `t = 0`.
/// * `v2` - Value at `t = 1`.
#[inline(always)]
pub fn lerp<P, T>(t: P, v1: T, v2: T) -> T
where
    P: Num + Copy,
    T: Add<T, Output = T> + Mul<P, Output = T>,
{
    v1 * (P::one() - t) + v2 * t
}

/// Square root that maps small negative round-off to zero.
///
/// * `x` - The value.
#[inline(always)]
pub fn safe_sqrt(x: Float) -> Float {
    debug_assert!(x >= -1e-3);
    max(x, 0.0).sqrt()
}

/// Returns `x * x`.
///
/// * `x` - The value.
#[inline(always)]
pub fn sqr<T: Mul<T, Output = T> + Copy>(x: T) -> T {
    x * x
}

/// Returns the inverse of the error function.
///
/// * `x` - Value in `(-1, 1)`; clamped to `[-0.99999, 0.99999]`.
#[inline(always)]
pub fn erf_inv(x: Float) -> Float {
    let x = clamp(x, -0.99999, 0.99999);
    let mut w = -((1.0 - x) * (1.0 + x)).ln();
    if w < 5.0 {
        w -= 2.5;

        let mut p = 2.81022636e-08;
        p = 3.43273939e-07 + p * w;
        p = -3.5233877e-06 + p * w;
        p = -4.39150654e-06 + p * w;
        p = 0.00021858087 + p * w;
        p = -0.00125372503 + p * w;
        p = -0.00417768164 + p * w;
        p = 0.246640727 + p * w;
        p = 1.50140941 + p * w;
        p * x
    } else {
        w = w.sqrt() - 3.0;

        let mut p = -0.000200214257;
        p = 0.000100950558 + p * w;
        p = 0.00134934322 + p * w;
        p = -0.00367342844 + p * w;
        p = 0.00573950773 + p * w;
        p = -0.0076224613 + p * w;
        p = 0.00943887047 + p * w;
        p = 1.00167406 + p * w;
        p = 2.83297682 + p * w;
        p * x
    }
}

/// Returns the quantile of the standard normal distribution.
///
/// * `p` - Probability in `(0, 1)`.
pub fn normal_quantile(p: Float) -> Float {
    std::f32::consts::SQRT_2 * erf_inv(2.0 * p - 1.0)
}

// ---- Tests ----

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn normal_quantiles() {
        assert!(normal_quantile(0.5).abs() < 1e-6);
        assert!((normal_quantile(0.975) - 1.959964).abs() < 1e-4);
        assert!((normal_quantile(0.995) - 2.575829).abs() < 1e-4);
        assert!((normal_quantile(0.025) + 1.959964).abs() < 1e-4);
    }

    #[test]
    fn one_minus_epsilon_is_below_one() {
        assert!(ONE_MINUS_EPSILON < 1.0);
        assert!(ONE_MINUS_EPSILON > 0.9999);
    }

    proptest! {
        #[test]
        fn clamp_stays_in_range(v in -100.0f32..100.0f32, lo in -10.0f32..0.0f32, hi in 0.0f32..10.0f32) {
            let c = clamp(v, lo, hi);
            prop_assert!(c >= lo && c <= hi);
        }

        #[test]
        fn lerp_hits_endpoints(a in -100.0f32..100.0f32, b in -100.0f32..100.0f32) {
            prop_assert_eq!(lerp(0.0 as Float, a, b), a);
            prop_assert_eq!(lerp(1.0 as Float, a, b), b);
        }

        #[test]
        fn min_max_are_ordered(a in -100i32..100i32, b in -100i32..100i32) {
            prop_assert!(min(a, b) <= max(a, b));
            prop_assert_eq!(abs(a - b), max(a, b) - min(a, b));
        }
    }
}
