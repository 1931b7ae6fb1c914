//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// 2^63, the first f64 past `i64::MAX`.
const I64_UPPER_BOUND: f64 = 9_223_372_036_854_775_808.0;
/// -2^63, exactly `i64::MIN`.
const I64_LOWER_BOUND: f64 = -9_223_372_036_854_775_808.0;
/// 2^64, the first f64 past `u64::MAX`.
const U64_UPPER_BOUND: f64 = 18_446_744_073_709_551_616.0;

/// Round a f64 half away from zero and clamp it to the i64 range, returning 0 for NaN values.
#[must_use]
pub fn round_f64_to_i64(value: f64) -> i64 {
    if value.is_nan() {
        return 0;
    }
    let rounded = value.round();
    if rounded >= I64_UPPER_BOUND {
        return i64::MAX;
    }
    if rounded <= I64_LOWER_BOUND {
        return i64::MIN;
    }
    cast::<f64, i64>(rounded).unwrap_or(0)
}

/// Ceil a f64 and clamp it to the u64 range, returning 0 for non-finite or negative values.
#[must_use]
pub fn ceil_f64_to_u64(value: f64) -> u64 {
    if !value.is_finite() || value <= 0.0 {
        return 0;
    }
    let ceiled = value.ceil();
    if ceiled >= U64_UPPER_BOUND {
        return u64::MAX;
    }
    cast::<f64, u64>(ceiled).unwrap_or(0)
}

/// Convert i64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn i64_to_f64(value: i64) -> f64 {
    cast::<i64, f64>(value).unwrap_or(0.0)
}

/// Convert u64 to f64 while allowing precision loss in a single location.
#[must_use]
pub fn u64_to_f64(value: u64) -> f64 {
    cast::<u64, f64>(value).unwrap_or(0.0)
}

/// Percentage of `value`, rounded half-up for non-negative inputs.
#[must_use]
pub fn percent_of(value: i64, pct: i64) -> i64 {
    round_f64_to_i64(i64_to_f64(value) * i64_to_f64(pct) / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounders_cover_ranges() {
        assert_eq!(round_f64_to_i64(1.5), 2);
        assert_eq!(round_f64_to_i64(2.49), 2);
        assert_eq!(round_f64_to_i64(f64::NAN), 0);
        assert_eq!(round_f64_to_i64(f64::MAX), i64::MAX);
        assert_eq!(round_f64_to_i64(f64::MIN), i64::MIN);
        assert_eq!(round_f64_to_i64(f64::INFINITY), i64::MAX);
    }

    #[test]
    fn rounding_saturates_near_the_i64_edges() {
        assert_eq!(round_f64_to_i64(9_223_372_036_854_775_807.0), i64::MAX);
        assert_eq!(
            round_f64_to_i64(9_223_372_036_854_774_784.0),
            9_223_372_036_854_774_784
        );
        assert_eq!(round_f64_to_i64(-1.0e19), i64::MIN);
    }

    #[test]
    fn ceil_clamps_and_handles_nan() {
        assert_eq!(ceil_f64_to_u64(1.2), 2);
        assert_eq!(ceil_f64_to_u64(f64::NAN), 0);
        assert_eq!(ceil_f64_to_u64(-4.0), 0);
        assert_eq!(ceil_f64_to_u64(1.0e30), u64::MAX);
    }

    #[test]
    fn percent_rounds_half_up() {
        assert_eq!(percent_of(15, 30), 5);
        assert_eq!(percent_of(25, 30), 8);
        assert_eq!(percent_of(17, 120), 20);
        assert_eq!(percent_of(0, 150), 0);
    }
}
