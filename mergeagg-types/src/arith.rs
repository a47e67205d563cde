//! Exact arithmetic over [`DecimalValue`].
//!
//! Intermediate results are computed in `i256` and checked back into the
//! Decimal128 range, so every operation either returns an exact (or
//! explicitly rounded) value or a [`DecimalError`].

use std::cmp::Ordering;

use arrow_buffer::i256;

use crate::decimal::{
    DecimalError, DecimalValue, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE, POW10_BASE,
    scale_within_bounds,
};

fn pow10(exp: u32) -> Result<i256, DecimalError> {
    let max = u32::from(MAX_DECIMAL_PRECISION) * 2;
    if exp > max {
        return Err(DecimalError::ScaleOutOfRange {
            scale: i16::try_from(exp).unwrap_or(i16::MAX),
        });
    }
    Ok(POW10_BASE.wrapping_pow(exp))
}

fn check_scale(scale: i8) -> Result<(), DecimalError> {
    if scale_within_bounds(i16::from(scale)) {
        Ok(())
    } else {
        Err(DecimalError::ScaleOutOfRange {
            scale: i16::from(scale),
        })
    }
}

fn into_decimal(value: i256, scale: i8) -> Result<DecimalValue, DecimalError> {
    let value = value.to_i128().ok_or(DecimalError::Overflow)?;
    DecimalValue::new(value, scale)
}

/// Rescale to a different exponent, preserving the numeric value when possible.
pub fn rescale(value: DecimalValue, target_scale: i8) -> Result<DecimalValue, DecimalError> {
    check_scale(target_scale)?;
    if target_scale == value.scale() {
        return Ok(value);
    }

    if target_scale > value.scale() {
        let diff = (i16::from(target_scale) - i16::from(value.scale())) as u32;
        let scaled = i256::from_i128(value.raw_value())
            .checked_mul(pow10(diff)?)
            .ok_or(DecimalError::Overflow)?;
        return into_decimal(scaled, target_scale);
    }

    // Lowering the scale must divide exactly.
    let diff = (i16::from(value.scale()) - i16::from(target_scale)) as u32;
    let factor = pow10(diff)?;
    let val_i256 = i256::from_i128(value.raw_value());
    let quotient = val_i256.checked_div(factor).ok_or(DecimalError::Overflow)?;
    let remainder = val_i256.checked_rem(factor).ok_or(DecimalError::Overflow)?;
    if remainder != i256::ZERO {
        return Err(DecimalError::InexactRescale {
            from: value.scale(),
            to: target_scale,
        });
    }
    into_decimal(quotient, target_scale)
}

/// Rescale to a different exponent, rounding half away from zero if necessary.
pub fn rescale_with_rounding(
    value: DecimalValue,
    target_scale: i8,
) -> Result<DecimalValue, DecimalError> {
    check_scale(target_scale)?;
    if target_scale >= value.scale() {
        return rescale(value, target_scale);
    }

    let diff = (i16::from(value.scale()) - i16::from(target_scale)) as u32;
    let factor = pow10(diff)?;
    let rounded = div_round_half_away(i256::from_i128(value.raw_value()), factor)?;
    into_decimal(rounded, target_scale)
}

/// Add two decimals, aligning scales as needed.
pub fn add(lhs: DecimalValue, rhs: DecimalValue) -> Result<DecimalValue, DecimalError> {
    let target_scale = lhs.scale().max(rhs.scale());
    let l = rescale(lhs, target_scale)?;
    let r = rescale(rhs, target_scale)?;
    let sum = i256::from_i128(l.raw_value())
        .checked_add(i256::from_i128(r.raw_value()))
        .ok_or(DecimalError::Overflow)?;
    into_decimal(sum, target_scale)
}

/// Divide `lhs` by `rhs`, producing a value with the requested scale.
///
/// The quotient is rounded half away from zero at `target_scale`.
pub fn div(
    lhs: DecimalValue,
    rhs: DecimalValue,
    target_scale: i8,
) -> Result<DecimalValue, DecimalError> {
    if rhs.is_zero() {
        return Err(DecimalError::DivisionByZero);
    }
    check_scale(target_scale)?;
    let numerator = i256::from_i128(lhs.raw_value());
    let denominator = i256::from_i128(rhs.raw_value());

    let scale_adjust =
        i32::from(target_scale) + i32::from(rhs.scale()) - i32::from(lhs.scale());
    // Scale the numerator up, or the denominator up when the target scale is
    // below the operands' combined scale.
    let (numerator, denominator) = match scale_adjust.cmp(&0) {
        Ordering::Greater => (
            numerator
                .checked_mul(pow10(scale_adjust as u32)?)
                .ok_or(DecimalError::Overflow)?,
            denominator,
        ),
        Ordering::Less => (
            numerator,
            denominator
                .checked_mul(pow10(scale_adjust.unsigned_abs())?)
                .ok_or(DecimalError::Overflow)?,
        ),
        Ordering::Equal => (numerator, denominator),
    };

    let rounded = div_round_half_away(numerator, denominator)?;
    into_decimal(rounded, target_scale)
}

/// Divide with the fractional-increment convention used by SQL `AVG`.
///
/// The quotient keeps `lhs.scale() + frac_incr` fractional digits, capped at
/// `max_scale` and at [`MAX_DECIMAL_SCALE`]. Callers pass the scale of the
/// column the quotient is written to as `max_scale`.
pub fn div_frac_incr(
    lhs: DecimalValue,
    rhs: DecimalValue,
    frac_incr: u8,
    max_scale: i8,
) -> Result<DecimalValue, DecimalError> {
    let target = (i16::from(lhs.scale().max(0)) + i16::from(frac_incr))
        .min(i16::from(max_scale))
        .min(i16::from(MAX_DECIMAL_SCALE)) as i8;
    div(lhs, rhs, target)
}

/// Align a decimal to a specific precision and scale, with rounding.
pub fn align_decimal_to_scale(
    value: DecimalValue,
    precision: u8,
    scale: i8,
) -> Result<DecimalValue, DecimalError> {
    let rescaled = rescale_with_rounding(value, scale)?;
    if rescaled.precision() > precision {
        return Err(DecimalError::PrecisionOverflow {
            value: rescaled.raw_value(),
            scale: rescaled.scale(),
        });
    }
    Ok(rescaled)
}

fn div_round_half_away(numerator: i256, denominator: i256) -> Result<i256, DecimalError> {
    let quotient = numerator
        .checked_div(denominator)
        .ok_or(DecimalError::Overflow)?;
    let remainder = numerator
        .checked_rem(denominator)
        .ok_or(DecimalError::Overflow)?;
    if remainder == i256::ZERO {
        return Ok(quotient);
    }

    let double_rem = remainder
        .wrapping_abs()
        .checked_mul(i256::from_i128(2))
        .ok_or(DecimalError::Overflow)?;
    if double_rem < denominator.wrapping_abs() {
        return Ok(quotient);
    }

    let negative = (numerator < i256::ZERO) != (denominator < i256::ZERO);
    let step = if negative {
        i256::MINUS_ONE
    } else {
        i256::ONE
    };
    quotient.checked_add(step).ok_or(DecimalError::Overflow)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(text: &str) -> DecimalValue {
        text.parse().unwrap()
    }

    fn frac_div(sum: &str, count: i64, incr: u8) -> DecimalValue {
        div_frac_incr(dec(sum), DecimalValue::from_i64(count), incr, MAX_DECIMAL_SCALE).unwrap()
    }

    #[test]
    fn add_aligns_scales() {
        let sum = add(dec("1.5"), dec("2.25")).unwrap();
        assert_eq!(sum.scale(), 2);
        assert_eq!(sum.raw_value(), 375);
    }

    #[test]
    fn add_reports_overflow() {
        let max = DecimalValue::new(10_i128.pow(38) - 1, 0).unwrap();
        assert!(matches!(
            add(max, DecimalValue::from_i64(1)),
            Err(DecimalError::PrecisionOverflow { .. })
        ));
    }

    #[test]
    fn div_frac_incr_widens_scale() {
        let avg = frac_div("12", 3, 4);
        assert_eq!(avg.scale(), 4);
        assert_eq!(avg, dec("4"));

        let avg = frac_div("21.03", 2, 4);
        assert_eq!(avg.scale(), 6);
        assert_eq!(avg.to_string(), "10.515000");
    }

    #[test]
    fn div_rounds_half_away_from_zero() {
        let third = frac_div("1", 3, 4);
        assert_eq!(third.to_string(), "0.3333");

        let two_thirds = frac_div("2", 3, 4);
        assert_eq!(two_thirds.to_string(), "0.6667");

        let negative = frac_div("-2", 3, 4);
        assert_eq!(negative.to_string(), "-0.6667");

        let small_negative = frac_div("-1", 3, 0);
        assert_eq!(small_negative, DecimalValue::ZERO);
    }

    #[test]
    fn div_scale_is_capped() {
        let lhs = DecimalValue::new(1, 28).unwrap();
        let avg = div_frac_incr(lhs, DecimalValue::from_i64(1), 4, MAX_DECIMAL_SCALE).unwrap();
        assert_eq!(avg.scale(), MAX_DECIMAL_SCALE);
    }

    #[test]
    fn div_frac_incr_respects_column_scale() {
        let avg = div_frac_incr(dec("7"), DecimalValue::from_i64(2), 4, 1).unwrap();
        assert_eq!(avg.to_string(), "3.5");

        let big = DecimalValue::new(10_i128.pow(35), 0).unwrap();
        let avg = div_frac_incr(big, DecimalValue::from_i64(1), 4, 0).unwrap();
        assert_eq!(avg, big);
        assert_eq!(avg.scale(), 0);
    }

    #[test]
    fn div_below_operand_scale_rounds() {
        // 0.125 / 1 at scale 2 rounds instead of failing.
        let avg = div(dec("0.125"), DecimalValue::from_i64(1), 2).unwrap();
        assert_eq!(avg.to_string(), "0.13");
        let avg = div(dec("-0.125"), DecimalValue::from_i64(1), 2).unwrap();
        assert_eq!(avg.to_string(), "-0.13");
    }

    #[test]
    fn div_by_zero_is_an_error() {
        assert_eq!(
            div(dec("1"), DecimalValue::ZERO, 4),
            Err(DecimalError::DivisionByZero)
        );
    }

    #[test]
    fn rescale_with_rounding_rounds_half_up() {
        assert_eq!(
            rescale_with_rounding(dec("10.515"), 2).unwrap().raw_value(),
            1052
        );
        assert_eq!(
            rescale_with_rounding(dec("-10.515"), 2).unwrap().raw_value(),
            -1052
        );
        assert_eq!(
            rescale_with_rounding(dec("10.514"), 2).unwrap().raw_value(),
            1051
        );
        assert!(matches!(
            rescale(dec("10.515"), 2),
            Err(DecimalError::InexactRescale { .. })
        ));
    }

    #[test]
    fn align_checks_precision() {
        assert!(align_decimal_to_scale(dec("123.456"), 5, 2).is_ok());
        assert!(matches!(
            align_decimal_to_scale(dec("1234.5"), 5, 2),
            Err(DecimalError::PrecisionOverflow { .. })
        ));
    }
}
