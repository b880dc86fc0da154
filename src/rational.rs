//! Conversion between decimal prices and the exact bounded fraction form
//! required by the on-chain trading-function format.
//!
//! All arithmetic is integer (`u128` over the decimal mantissa/scale); no
//! floating-point value is ever produced, so the same input always yields
//! the same fraction. Both fraction terms are bounded by
//! 10^`PRECISION_DECIMALS`, and the round-trip error of
//! `from_fraction(to_fraction(x))` is at most 10^-`PRECISION_DECIMALS`
//! relative to `x`.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EncodeError, EncodeResult};

/// Number of decimal digits of precision carried by the fraction.
pub const PRECISION_DECIMALS: u32 = 6;

/// Ceiling on both fraction terms: 10^PRECISION_DECIMALS.
const TERM_BOUND: u128 = 1_000_000;

/// Cap on the exact fraction terms fed to the approximation loop, so that
/// cross-multiplied error comparisons stay inside u128.
const CMP_LIMIT: u128 = 1_000_000_000_000_000_000;

/// An exact price fraction: `p` base subunits exchange for `q` quote
/// subunits, so the subunit price of the base asset is `q / p`.
/// Both terms are at most 10^PRECISION_DECIMALS and never both zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RationalPrice {
    pub p: u64,
    pub q: u64,
}

/// Encode a decimal display price as a bounded fraction.
///
/// `price` is quoted in quote display units per base display unit; the
/// asset exponents shift it into subunit terms
/// (`price * 10^(quote_exponent - base_exponent)`) before approximation.
///
/// A zero price encodes as `{p: 1, q: 0}`. Subunit prices outside
/// `[10^-6, 10^6]` are rejected with a precision error rather than
/// silently clamped or wrapped.
pub fn to_fraction(
    price: Decimal,
    base_exponent: u8,
    quote_exponent: u8,
) -> EncodeResult<RationalPrice> {
    if price.is_sign_negative() && !price.is_zero() {
        return Err(EncodeError::NegativePrice(price));
    }

    let normalized = price.normalize();
    let mantissa = normalized.mantissa().unsigned_abs();
    if mantissa == 0 {
        return Ok(RationalPrice { p: 1, q: 0 });
    }

    // Subunit price as an exact fraction num/den.
    let mut num = mantissa;
    let mut den = pow10(normalized.scale())?;
    let delta = quote_exponent as i32 - base_exponent as i32;
    if delta >= 0 {
        num = num
            .checked_mul(pow10(delta as u32)?)
            .ok_or(EncodeError::Overflow("applying asset exponents"))?;
    } else {
        den = den
            .checked_mul(pow10(delta.unsigned_abs())?)
            .ok_or(EncodeError::Overflow("applying asset exponents"))?;
    }

    let g = gcd(num, den);
    num /= g;
    den /= g;

    // Subunit prices above 10^6 or below 10^-6 have no usable
    // representation under the term bound.
    match den.checked_mul(TERM_BOUND) {
        Some(upper) if num > upper => return Err(EncodeError::PriceOutOfRange(price)),
        _ => {}
    }
    if let Some(scaled) = num.checked_mul(TERM_BOUND) {
        if scaled < den {
            return Err(EncodeError::PriceOutOfRange(price));
        }
    }

    // Shrink oversized exact terms so the error comparisons below cannot
    // overflow. The loss is below 10^-12 relative, far inside the bound.
    let largest = num.max(den);
    if largest > CMP_LIMIT {
        let shrink = largest / CMP_LIMIT + 1;
        num = (num + shrink / 2) / shrink;
        den = (den + shrink / 2) / shrink;
    }

    let (q, p) = best_bounded(num, den, TERM_BOUND);
    Ok(RationalPrice {
        p: p as u64,
        q: q as u64,
    })
}

/// Decode a fraction back into a decimal display price. Used for display
/// and round-trip testing only; the chain consumes the fraction itself.
pub fn from_fraction(
    fraction: RationalPrice,
    base_exponent: u8,
    quote_exponent: u8,
) -> EncodeResult<Decimal> {
    if fraction.p == 0 {
        return Err(EncodeError::ZeroDenominator);
    }
    if fraction.q == 0 {
        return Ok(Decimal::ZERO);
    }

    let subunit = Decimal::from(fraction.q) / Decimal::from(fraction.p);
    let delta = base_exponent as i32 - quote_exponent as i32;
    let shift = pow10_decimal(delta.unsigned_abs())?;
    if delta >= 0 {
        subunit
            .checked_mul(shift)
            .ok_or(EncodeError::Overflow("applying asset exponents"))
    } else {
        subunit
            .checked_div(shift)
            .ok_or(EncodeError::Overflow("applying asset exponents"))
    }
}

fn pow10(exp: u32) -> EncodeResult<u128> {
    10u128
        .checked_pow(exp)
        .ok_or(EncodeError::Overflow("raising 10 to the asset exponent"))
}

/// Power of ten as a `Decimal`. The 96-bit mantissa holds at most 10^28,
/// so larger exponents are an overflow, not a panic.
pub(crate) fn pow10_decimal(exp: u32) -> EncodeResult<Decimal> {
    if exp > 28 {
        return Err(EncodeError::Overflow("raising 10 to the asset exponent"));
    }
    Ok(Decimal::from_i128_with_scale(10i128.pow(exp), 0))
}

fn gcd(mut a: u128, mut b: u128) -> u128 {
    while b != 0 {
        let r = a % b;
        a = b;
        b = r;
    }
    a.max(1)
}

/// Best rational approximation of `num/den` with both terms bounded.
///
/// Walks the continued-fraction convergents of `num/den`; once the next
/// convergent would breach `bound`, takes the largest admissible
/// semiconvergent and keeps whichever of it and the last full convergent
/// is closer to the target (ties go to the convergent, which has the
/// smaller denominator).
///
/// Caller guarantees `num/den` lies in `[1/bound, bound]` and that both
/// inputs are at most `CMP_LIMIT`, which keeps every intermediate product
/// within u128.
fn best_bounded(num: u128, den: u128, bound: u128) -> (u128, u128) {
    let (mut n, mut d) = (num, den);
    let (mut p_prev2, mut q_prev2) = (0u128, 1u128);
    let (mut p_prev, mut q_prev) = (1u128, 0u128);

    loop {
        if d == 0 {
            // Terminated: num/den itself is within bound.
            return (p_prev, q_prev);
        }
        let a = n / d;
        let r = n % d;

        let p_next = a.checked_mul(p_prev).and_then(|v| v.checked_add(p_prev2));
        let q_next = a.checked_mul(q_prev).and_then(|v| v.checked_add(q_prev2));
        let (p_next, q_next) = match (p_next, q_next) {
            (Some(p), Some(q)) if p <= bound && q <= bound => (p, q),
            _ => {
                // Largest t with t*prev + prev2 staying under bound on
                // both terms.
                let t_p = if p_prev == 0 {
                    u128::MAX
                } else {
                    (bound - p_prev2.min(bound)) / p_prev
                };
                let t_q = if q_prev == 0 {
                    u128::MAX
                } else {
                    (bound - q_prev2.min(bound)) / q_prev
                };
                let t = t_p.min(t_q);
                if t == 0 {
                    return (p_prev, q_prev);
                }
                let p_semi = t * p_prev + p_prev2;
                let q_semi = t * q_prev + q_prev2;
                if strictly_closer(num, den, (p_semi, q_semi), (p_prev, q_prev)) {
                    return (p_semi, q_semi);
                }
                return (p_prev, q_prev);
            }
        };

        p_prev2 = p_prev;
        q_prev2 = q_prev;
        p_prev = p_next;
        q_prev = q_next;
        n = d;
        d = r;
    }
}

/// True when `a` approximates `num/den` strictly better than `b`.
/// |num/den - p/q| comparison by cross multiplication, no division.
fn strictly_closer(num: u128, den: u128, a: (u128, u128), b: (u128, u128)) -> bool {
    let abs_a = (num * a.1).abs_diff(a.0 * den);
    let abs_b = (num * b.1).abs_diff(b.0 * den);
    // err(a) < err(b)  <=>  abs_a * q_b < abs_b * q_a
    abs_a * b.1 < abs_b * a.1
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_one_point_five_equal_exponents() {
        let fraction = to_fraction(dec!(1.5), 6, 6).unwrap();
        assert_eq!(fraction, RationalPrice { p: 2, q: 3 });
        let back = from_fraction(fraction, 6, 6).unwrap();
        assert_eq!(back.round_dp(6), dec!(1.500000).round_dp(6));
    }

    #[test]
    fn test_zero_price_never_both_zero() {
        let fraction = to_fraction(Decimal::ZERO, 6, 0).unwrap();
        assert_eq!(fraction, RationalPrice { p: 1, q: 0 });
        assert_eq!(from_fraction(fraction, 6, 0).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_exponent_shift() {
        // 1.5 quote/base with quote carrying two extra decimals:
        // subunit price 150, an exact integer fraction.
        let fraction = to_fraction(dec!(1.5), 6, 8).unwrap();
        assert_eq!(fraction, RationalPrice { p: 1, q: 150 });
    }

    #[test]
    fn test_exact_fraction_within_bound_is_kept() {
        let fraction = to_fraction(dec!(0.333333), 0, 0).unwrap();
        assert_eq!(
            fraction,
            RationalPrice {
                p: 1_000_000,
                q: 333_333
            }
        );
    }

    #[test]
    fn test_deterministic() {
        let a = to_fraction(dec!(3.141592653589793), 6, 6).unwrap();
        let b = to_fraction(dec!(3.141592653589793), 6, 6).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_round_trip_relative_error_bound() {
        let cases = [
            (dec!(0.000123), 6u8, 6u8),
            (dec!(0.5), 6, 6),
            (dec!(1.0), 0, 0),
            (dec!(3.141592653589793), 6, 6),
            (dec!(42.424242), 6, 6),
            (dec!(999983.0), 6, 6),
            (dec!(0.07), 8, 6),
            (dec!(17.35), 6, 8),
        ];
        let tolerance = dec!(0.000001);
        for (price, base, quote) in cases {
            let fraction = to_fraction(price, base, quote).unwrap();
            assert!(u128::from(fraction.p) <= 1_000_000);
            assert!(u128::from(fraction.q) <= 1_000_000);
            assert!(fraction.p != 0 || fraction.q != 0);
            let back = from_fraction(fraction, base, quote).unwrap();
            let relative = ((back - price) / price).abs();
            assert!(
                relative <= tolerance,
                "price {} (exp {}/{}) round-tripped to {} (relative error {})",
                price,
                base,
                quote,
                back,
                relative
            );
        }
    }

    #[test]
    fn test_subunit_price_too_large() {
        let err = to_fraction(dec!(10000000), 0, 0).unwrap_err();
        assert!(err.is_precision());
        // Magnitude injected by exponent shift alone, e.g. price * 10^12.
        let err = to_fraction(dec!(5), 0, 12).unwrap_err();
        assert!(err.is_precision());
    }

    #[test]
    fn test_subunit_price_too_small() {
        let err = to_fraction(dec!(0.0000001), 0, 0).unwrap_err();
        assert!(err.is_precision());
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = to_fraction(dec!(-1.5), 6, 6).unwrap_err();
        assert!(!err.is_precision());
    }

    #[test]
    fn test_from_fraction_exponent_beyond_decimal_range() {
        // An exponent delta of 30 would need 10^30 as a Decimal, which
        // does not exist; expect an overflow error, not a panic.
        let err = from_fraction(RationalPrice { p: 1, q: 1 }, 30, 0).unwrap_err();
        assert!(err.is_precision());
        let err = from_fraction(RationalPrice { p: 1, q: 1 }, 0, 30).unwrap_err();
        assert!(err.is_precision());
    }

    #[test]
    fn test_from_fraction_zero_denominator() {
        let err = from_fraction(RationalPrice { p: 0, q: 5 }, 6, 6).unwrap_err();
        assert!(matches!(err, EncodeError::ZeroDenominator));
    }
}
