//! Exact decimal rounding of `f64` values.
//!
//! The obvious implementation, `(x * 1e6).round() / 1e6`, rounds the *product*
//! rather than `x`.  The multiplication itself rounds, so a value whose exact
//! binary expansion is `0.12345649999…` can become `123456.5` and round up.
//! Snapshot comparisons must not depend on that accident.
//!
//! Instead the value is split into its integer mantissa and binary exponent,
//! scaled by `10^places` in 128-bit integer arithmetic, and the remainder is
//! compared against one half exactly.

/// Largest supported number of decimal places.
///
/// `2^53 * 10^15` still fits in a `u128` with room to spare.
pub const MAX_DECIMAL_PLACES: u32 = 15;

/// Rounds `value` to `places` decimal digits, ties away from zero.
///
/// The decision is made on the exact binary value of `value`.  Non-finite
/// inputs are returned unchanged, and results that round to zero are returned
/// as positive zero so `-0.0` never leaks into canonical output.
///
/// `places` is clamped to [`MAX_DECIMAL_PLACES`].
///
/// # Examples
///
/// ```rust
/// use viewbridge_core::snapshot::rounding::round_half_away_from_zero;
///
/// assert_eq!(round_half_away_from_zero(1.23456789, 6), 1.234568);
/// assert_eq!(round_half_away_from_zero(-0.0078125, 6), -0.007813);
/// ```
pub fn round_half_away_from_zero(value: f64, places: u32) -> f64 {
    if !value.is_finite() || value == 0.0 {
        return if value == 0.0 { 0.0 } else { value };
    }

    let places = places.min(MAX_DECIMAL_PLACES);
    let bits = value.to_bits();
    let negative = bits >> 63 == 1;
    let biased_exponent = ((bits >> 52) & 0x7ff) as i32;
    let fraction = bits & ((1u64 << 52) - 1);

    // value = mantissa * 2^exponent
    let (mantissa, exponent) = if biased_exponent == 0 {
        (fraction, -1074)
    } else {
        (fraction | (1u64 << 52), biased_exponent - 1075)
    };

    if exponent >= 0 {
        // Already an integer; nothing after the decimal point.
        return value;
    }

    let shift = exponent.unsigned_abs();
    let scale = 10u128.pow(places);
    let scaled = u128::from(mantissa) * scale;

    let rounded = if shift >= 128 {
        // scaled < 2^103, so scaled / 2^shift < 0.5.
        0
    } else {
        let quotient = scaled >> shift;
        let remainder = scaled - (quotient << shift);
        let half = 1u128 << (shift - 1);
        if remainder >= half {
            quotient + 1
        } else {
            quotient
        }
    };

    if rounded == 0 {
        return 0.0;
    }

    let magnitude = rounded as f64 / scale as f64;
    if negative {
        -magnitude
    } else {
        magnitude
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rounds_down_below_half() {
        assert_eq!(round_half_away_from_zero(0.1234561, 6), 0.123456);
    }

    #[test]
    fn test_uses_exact_binary_value_not_the_literal() {
        // The double nearest 0.1234565 is 0.12345649999999999679…
        assert_eq!(round_half_away_from_zero(0.1234565, 6), 0.123456);
    }

    #[test]
    fn test_exact_tie_rounds_away_from_zero() {
        // 2^-7 = 0.0078125 is exactly representable, so this is a true tie.
        assert_eq!(round_half_away_from_zero(0.0078125, 6), 0.007813);
        assert_eq!(round_half_away_from_zero(-0.0078125, 6), -0.007813);
    }

    #[test]
    fn test_half_at_zero_places_rounds_away() {
        assert_eq!(round_half_away_from_zero(2.5, 0), 3.0);
        assert_eq!(round_half_away_from_zero(-2.5, 0), -3.0);
    }

    #[test]
    fn test_integers_and_large_values_pass_through() {
        assert_eq!(round_half_away_from_zero(42.0, 6), 42.0);
        assert_eq!(round_half_away_from_zero(1.0e20, 6), 1.0e20);
    }

    #[test]
    fn test_tiny_values_collapse_to_positive_zero() {
        let r = round_half_away_from_zero(-1.0e-12, 6);
        assert_eq!(r, 0.0);
        assert!(r.is_sign_positive());
    }

    #[test]
    fn test_negative_zero_becomes_positive_zero() {
        assert!(round_half_away_from_zero(-0.0, 6).is_sign_positive());
    }

    #[test]
    fn test_subnormal_values_round_to_zero() {
        assert_eq!(round_half_away_from_zero(f64::MIN_POSITIVE / 4.0, 6), 0.0);
    }

    #[test]
    fn test_non_finite_values_are_unchanged() {
        assert!(round_half_away_from_zero(f64::NAN, 6).is_nan());
        assert_eq!(round_half_away_from_zero(f64::INFINITY, 6), f64::INFINITY);
    }

    #[test]
    fn test_rounding_is_idempotent() {
        for v in [0.1, 1.0 / 3.0, -2.718281828, 123.4567895, 0.30000000000000004] {
            let once = round_half_away_from_zero(v, 6);
            assert_eq!(round_half_away_from_zero(once, 6), once, "value {v}");
        }
    }

    #[test]
    fn test_places_are_clamped() {
        let v = 0.1;
        assert_eq!(round_half_away_from_zero(v, 99), round_half_away_from_zero(v, 15));
    }
}
