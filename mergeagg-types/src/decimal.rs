//! Runtime representation of `Decimal128` values.
//!
//! Equality and hashing are numeric: `1.5` stored with scale 1 and `1.500`
//! stored with scale 3 compare equal and hash identically.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use arrow::datatypes::DECIMAL128_MAX_PRECISION;
use arrow_buffer::i256;

/// Maximum precision supported by `DecimalValue` (aligns with Arrow's Decimal128).
pub const MAX_DECIMAL_PRECISION: u8 = DECIMAL128_MAX_PRECISION;

/// Maximum number of fractional digits an arithmetic result may carry.
pub const MAX_DECIMAL_SCALE: i8 = 30;

pub(crate) const POW10_BASE: i256 = i256::from_i128(10);

/// Errors that can occur while manipulating decimal values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecimalError {
    /// Requested scale falls outside the supported range.
    ScaleOutOfRange { scale: i16 },
    /// Result exceeded the maximum representable precision.
    PrecisionOverflow { value: i128, scale: i8 },
    /// Arithmetic operation overflowed the Decimal128 range.
    Overflow,
    /// Attempted to divide by zero.
    DivisionByZero,
    /// Rescale operation attempted to lower scale without exact divisibility.
    InexactRescale { from: i8, to: i8 },
    /// Text could not be parsed as a decimal literal.
    InvalidLiteral(String),
}

impl fmt::Display for DecimalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DecimalError::ScaleOutOfRange { scale } => {
                write!(f, "decimal scale {scale} outside supported range")
            }
            DecimalError::PrecisionOverflow { value, scale } => {
                write!(
                    f,
                    "decimal value {value} with scale {scale} exceeds maximum precision"
                )
            }
            DecimalError::Overflow => write!(f, "decimal arithmetic overflow"),
            DecimalError::DivisionByZero => write!(f, "decimal division by zero"),
            DecimalError::InexactRescale { from, to } => {
                write!(
                    f,
                    "cannot rescale decimal from scale {from} to {to} without losing precision"
                )
            }
            DecimalError::InvalidLiteral(text) => write!(f, "invalid decimal literal '{text}'"),
        }
    }
}

impl std::error::Error for DecimalError {}

impl From<DecimalError> for mergeagg_result::Error {
    fn from(err: DecimalError) -> Self {
        mergeagg_result::Error::arithmetic(err)
    }
}

/// Runtime representation of a Decimal128 value.
#[derive(Clone, Copy, Debug)]
pub struct DecimalValue {
    value: i128,
    scale: i8,
}

impl DecimalValue {
    pub const ZERO: DecimalValue = DecimalValue { value: 0, scale: 0 };

    /// Create a decimal from its raw parts, validating precision bounds.
    pub fn new(value: i128, scale: i8) -> Result<Self, DecimalError> {
        if !scale_within_bounds(i16::from(scale)) {
            return Err(DecimalError::ScaleOutOfRange {
                scale: i16::from(scale),
            });
        }
        let precision = digit_count_i256(i256::from_i128(value));
        if precision > MAX_DECIMAL_PRECISION {
            return Err(DecimalError::PrecisionOverflow { value, scale });
        }
        Ok(Self { value, scale })
    }

    /// Construct a decimal from an integer with zero scale.
    ///
    /// Every `i64` has at most 19 digits, well inside Decimal128 precision.
    pub fn from_i64(value: i64) -> Self {
        Self {
            value: i128::from(value),
            scale: 0,
        }
    }

    /// Return the scaled integer backing this decimal.
    #[inline]
    pub fn raw_value(self) -> i128 {
        self.value
    }

    /// Return the scale (number of fractional digits).
    #[inline]
    pub fn scale(self) -> i8 {
        self.scale
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.value == 0
    }

    /// Return the decimal precision (total digit count).
    #[inline]
    pub fn precision(self) -> u8 {
        digit_count_i256(i256::from_i128(self.value))
    }

    /// Convert the decimal into an `f64` (lossy for high precision inputs).
    pub fn to_f64(self) -> f64 {
        if self.value == 0 {
            return 0.0;
        }
        let denominator = 10_f64.powi(i32::from(self.scale));
        (self.value as f64) / denominator
    }

    /// Canonical representation: the smallest mantissa that keeps the value.
    ///
    /// Two decimals are numerically equal exactly when their normalized forms
    /// have identical parts.
    pub fn normalize(self) -> Self {
        if self.value == 0 {
            return Self::ZERO;
        }
        let min_scale = -(MAX_DECIMAL_PRECISION as i8);
        let mut value = self.value;
        let mut scale = self.scale;
        while scale > min_scale && value % 10 == 0 {
            value /= 10;
            scale -= 1;
        }
        Self { value, scale }
    }

    /// Mantissa aligned to `target_scale`, if that does not overflow `i256`.
    fn aligned_mantissa(self, target_scale: i8) -> Option<i256> {
        let diff = u32::try_from(i16::from(target_scale) - i16::from(self.scale)).ok()?;
        let factor = POW10_BASE.checked_pow(diff)?;
        i256::from_i128(self.value).checked_mul(factor)
    }
}

impl PartialEq for DecimalValue {
    fn eq(&self, other: &Self) -> bool {
        let (l, r) = (self.normalize(), other.normalize());
        l.value == r.value && l.scale == r.scale
    }
}

impl Eq for DecimalValue {}

impl Hash for DecimalValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        let canonical = self.normalize();
        canonical.value.hash(state);
        canonical.scale.hash(state);
    }
}

impl PartialOrd for DecimalValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DecimalValue {
    fn cmp(&self, other: &Self) -> Ordering {
        if self.scale == other.scale {
            return self.value.cmp(&other.value);
        }

        let max_scale = self.scale.max(other.scale);
        match (
            self.aligned_mantissa(max_scale),
            other.aligned_mantissa(max_scale),
        ) {
            (Some(l), Some(r)) => l.cmp(&r),
            // Only the side with the smaller scale is multiplied, so an
            // overflow means its magnitude dominates the other operand.
            (None, _) => self.value.signum().cmp(&0),
            (_, None) => 0.cmp(&other.value.signum()),
        }
    }
}

impl fmt::Display for DecimalValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.scale <= 0 {
            write!(f, "{}", self.value)?;
            if self.value != 0 {
                for _ in 0..self.scale.unsigned_abs() {
                    f.write_str("0")?;
                }
            }
            return Ok(());
        }
        let scale = self.scale as usize;
        let negative = self.value < 0;
        let digits = digit_buffer(i256::from_i128(self.value));
        if digits.len() <= scale {
            let mut result = String::with_capacity(scale + 3);
            if negative {
                result.push('-');
            }
            result.push_str("0.");
            for _ in digits.len()..scale {
                result.push('0');
            }
            result.push_str(&digits);
            return f.write_str(&result);
        }
        let split = digits.len() - scale;
        if negative {
            f.write_str("-")?;
        }
        f.write_str(&digits[..split])?;
        f.write_str(".")?;
        f.write_str(&digits[split..])
    }
}

impl FromStr for DecimalValue {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (int_part, frac_part) = match s.split_once('.') {
            Some((i, f)) => (i, f),
            None => (s, ""),
        };

        let digits_only = |part: &str| part.bytes().all(|b| b.is_ascii_digit());
        let unsigned_int = int_part
            .strip_prefix('-')
            .or_else(|| int_part.strip_prefix('+'))
            .unwrap_or(int_part);
        if (unsigned_int.is_empty() && frac_part.is_empty())
            || !digits_only(unsigned_int)
            || !digits_only(frac_part)
        {
            return Err(DecimalError::InvalidLiteral(s.to_owned()));
        }

        let scale = frac_part.len();
        if scale > MAX_DECIMAL_PRECISION as usize {
            return Err(DecimalError::ScaleOutOfRange {
                scale: scale as i16,
            });
        }

        let combined = format!("{int_part}{frac_part}");
        let value = combined
            .parse::<i128>()
            .map_err(|_| DecimalError::Overflow)?;

        Self::new(value, scale as i8)
    }
}

fn digit_count_i256(mut value: i256) -> u8 {
    if value == i256::ZERO {
        return 1;
    }
    if value < i256::ZERO {
        value = value.wrapping_neg();
    }
    let mut count: u8 = 0;
    while value != i256::ZERO {
        value = value.wrapping_div(POW10_BASE);
        count += 1;
    }
    count
}

fn digit_buffer(mut value: i256) -> String {
    if value == i256::ZERO {
        return "0".to_owned();
    }
    if value < i256::ZERO {
        value = value.wrapping_neg();
    }
    let mut buf = Vec::new();
    let mut current = value;
    while current != i256::ZERO {
        let rem = current.wrapping_rem(POW10_BASE).as_i128();
        buf.push(char::from(b'0' + rem as u8));
        current = current.wrapping_div(POW10_BASE);
    }
    buf.iter().rev().collect()
}

pub(crate) fn scale_within_bounds(scale: i16) -> bool {
    let max = i16::from(MAX_DECIMAL_PRECISION);
    (-max..=max).contains(&scale)
}
