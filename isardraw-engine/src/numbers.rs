//! Numeric helpers centralizing the quota arithmetic rules.

use num_traits::cast::cast;

/// Round half away from zero and clamp into the i64 range.
///
/// This is the rounding rule fixed for the modality quota split; half-integer
/// shares always move away from zero, never to the nearest even value.
#[must_use]
pub fn round_half_away(value: f64) -> i64 {
    if !value.is_finite() {
        return 0;
    }
    let min = cast::<i64, f64>(i64::MIN).unwrap_or(f64::MIN);
    let max = cast::<i64, f64>(i64::MAX).unwrap_or(f64::MAX);
    let clamped = value.clamp(min, max).round();
    cast::<f64, i64>(clamped).unwrap_or(0)
}

/// Ceiling division over non-negative integers. A zero divisor yields zero.
#[must_use]
pub const fn ceil_div(numerator: u64, divisor: u64) -> u64 {
    if divisor == 0 {
        return 0;
    }
    numerator.div_ceil(divisor)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}
