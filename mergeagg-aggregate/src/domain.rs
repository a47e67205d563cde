//! Numeric domain adapters.
//!
//! A domain fixes the value type an aggregate accumulates, how a row is
//! evaluated into it, and the add/divide policy. The decimal domain is exact
//! and can fail; the float domain never fails on arithmetic.

use std::fmt;

use arrow::datatypes::DataType;
use mergeagg_expr::{EvalContext, Row, ScalarExpr};
use mergeagg_result::{Error, Result};
use mergeagg_types::{DecimalValue, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE, arith};

use crate::output::OutputChunk;
use crate::partial::{Accumulator, PartialResult};
use crate::value_set::{DecimalSet, FloatSet, ValueSet};

/// Digits needed for any 64-bit integer input.
const INTEGER_INPUT_PRECISION: u8 = 20;

/// The numeric domain an aggregate computes in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AggDomain {
    Decimal,
    Float,
}

impl AggDomain {
    /// Domain an `AVG` over `input` computes in.
    ///
    /// Exact inputs (decimals and integers) stay exact; floating inputs and
    /// untyped NULL use doubles.
    pub fn for_input(input: &DataType) -> Result<Self> {
        match input {
            DataType::Decimal128(_, _) => Ok(AggDomain::Decimal),
            t if t.is_integer() => Ok(AggDomain::Decimal),
            DataType::Float32 | DataType::Float64 | DataType::Null => Ok(AggDomain::Float),
            other => Err(Error::InvalidArgumentError(format!(
                "AVG does not support input type {other:?}"
            ))),
        }
    }
}

/// Arithmetic and storage policy for one numeric domain.
pub trait NumericDomain: fmt::Debug + Sized + Send + Sync + 'static {
    type Value: Copy + fmt::Debug + Send + Sync;
    type Set: ValueSet<Self::Value>;

    const NAME: &'static str;

    fn zero() -> Self::Value;

    /// Evaluate `expr` for `row` in this domain; `None` is SQL NULL.
    fn eval(expr: &ScalarExpr, ctx: &EvalContext, row: &Row<'_>) -> Result<Option<Self::Value>>;

    fn add(sum: Self::Value, value: Self::Value) -> Result<Self::Value>;

    /// `sum / count` for a strictly positive `count`, shaped for a column of
    /// type `result_type`.
    fn divide(
        ctx: &EvalContext,
        result_type: &DataType,
        sum: Self::Value,
        count: i64,
    ) -> Result<Self::Value>;

    fn append(output: &mut OutputChunk, ordinal: usize, value: Self::Value) -> Result<()>;

    /// Output type of the final average for an input of type `input`.
    fn result_type(ctx: &EvalContext, input: &DataType) -> DataType;

    /// Output type of the pre-aggregated sum column.
    fn partial_sum_type(input: &DataType) -> DataType;

    fn wrap(acc: Accumulator<Self>) -> PartialResult;

    fn accumulator(pr: &PartialResult) -> Option<&Accumulator<Self>>;

    fn accumulator_mut(pr: &mut PartialResult) -> Option<&mut Accumulator<Self>>;
}

/// Exact `Decimal128` arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct DecimalDomain;

fn decimal_parts(input: &DataType) -> (u8, i8) {
    match input {
        DataType::Decimal128(precision, scale) => (*precision, (*scale).max(0)),
        _ => (INTEGER_INPUT_PRECISION, 0),
    }
}

impl NumericDomain for DecimalDomain {
    type Value = DecimalValue;
    type Set = DecimalSet;

    const NAME: &'static str = "decimal";

    #[inline]
    fn zero() -> DecimalValue {
        DecimalValue::ZERO
    }

    #[inline]
    fn eval(expr: &ScalarExpr, ctx: &EvalContext, row: &Row<'_>) -> Result<Option<DecimalValue>> {
        expr.eval_decimal(ctx, row)
    }

    #[inline]
    fn add(sum: DecimalValue, value: DecimalValue) -> Result<DecimalValue> {
        Ok(arith::add(sum, value)?)
    }

    fn divide(
        ctx: &EvalContext,
        result_type: &DataType,
        sum: DecimalValue,
        count: i64,
    ) -> Result<DecimalValue> {
        let column_scale = match result_type {
            DataType::Decimal128(_, scale) => *scale,
            _ => MAX_DECIMAL_SCALE,
        };
        let count = DecimalValue::from_i64(count);
        Ok(arith::div_frac_incr(
            sum,
            count,
            ctx.div_precision_increment(),
            column_scale,
        )?)
    }

    fn append(output: &mut OutputChunk, ordinal: usize, value: DecimalValue) -> Result<()> {
        output.append_decimal(ordinal, value)
    }

    /// Widen the scale by the division increment. Past 38 digits the
    /// fractional digits give way so the input's integer digits still fit.
    fn result_type(ctx: &EvalContext, input: &DataType) -> DataType {
        let (precision, scale) = decimal_parts(input);
        let (precision, scale) = (i16::from(precision), i16::from(scale));
        let incr = i16::from(ctx.div_precision_increment());
        let max_precision = i16::from(MAX_DECIMAL_PRECISION);
        let integer_digits = (precision - scale).max(0);

        let result_scale = (scale + incr)
            .min(max_precision - integer_digits)
            .max(scale)
            .min(i16::from(MAX_DECIMAL_SCALE));
        let result_precision = (precision + incr).min(max_precision).max(result_scale);
        DataType::Decimal128(result_precision as u8, result_scale as i8)
    }

    fn partial_sum_type(input: &DataType) -> DataType {
        let (_, scale) = decimal_parts(input);
        DataType::Decimal128(MAX_DECIMAL_PRECISION, scale)
    }

    fn wrap(acc: Accumulator<Self>) -> PartialResult {
        PartialResult::Decimal(acc)
    }

    fn accumulator(pr: &PartialResult) -> Option<&Accumulator<Self>> {
        match pr {
            PartialResult::Decimal(acc) => Some(acc),
            PartialResult::Float(_) => None,
        }
    }

    fn accumulator_mut(pr: &mut PartialResult) -> Option<&mut Accumulator<Self>> {
        match pr {
            PartialResult::Decimal(acc) => Some(acc),
            PartialResult::Float(_) => None,
        }
    }
}

/// IEEE-754 double arithmetic.
#[derive(Debug, Clone, Copy)]
pub struct FloatDomain;

impl NumericDomain for FloatDomain {
    type Value = f64;
    type Set = FloatSet;

    const NAME: &'static str = "float";

    #[inline]
    fn zero() -> f64 {
        0.0
    }

    #[inline]
    fn eval(expr: &ScalarExpr, ctx: &EvalContext, row: &Row<'_>) -> Result<Option<f64>> {
        expr.eval_real(ctx, row)
    }

    #[inline]
    fn add(sum: f64, value: f64) -> Result<f64> {
        Ok(sum + value)
    }

    fn divide(_ctx: &EvalContext, _result_type: &DataType, sum: f64, count: i64) -> Result<f64> {
        Ok(sum / count as f64)
    }

    fn append(output: &mut OutputChunk, ordinal: usize, value: f64) -> Result<()> {
        output.append_float(ordinal, value)
    }

    fn result_type(_ctx: &EvalContext, _input: &DataType) -> DataType {
        DataType::Float64
    }

    fn partial_sum_type(_input: &DataType) -> DataType {
        DataType::Float64
    }

    fn wrap(acc: Accumulator<Self>) -> PartialResult {
        PartialResult::Float(acc)
    }

    fn accumulator(pr: &PartialResult) -> Option<&Accumulator<Self>> {
        match pr {
            PartialResult::Float(acc) => Some(acc),
            PartialResult::Decimal(_) => None,
        }
    }

    fn accumulator_mut(pr: &mut PartialResult) -> Option<&mut Accumulator<Self>> {
        match pr {
            PartialResult::Float(acc) => Some(acc),
            PartialResult::Decimal(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn domain_follows_input_type() {
        assert_eq!(
            AggDomain::for_input(&DataType::Decimal128(10, 2)).unwrap(),
            AggDomain::Decimal
        );
        assert_eq!(
            AggDomain::for_input(&DataType::Int32).unwrap(),
            AggDomain::Decimal
        );
        assert_eq!(
            AggDomain::for_input(&DataType::Float32).unwrap(),
            AggDomain::Float
        );
        assert!(AggDomain::for_input(&DataType::Utf8).is_err());
    }

    #[test]
    fn decimal_result_type_widens_by_increment() {
        let ctx = EvalContext::new();
        assert_eq!(
            DecimalDomain::result_type(&ctx, &DataType::Decimal128(10, 2)),
            DataType::Decimal128(14, 6)
        );
        assert_eq!(
            DecimalDomain::result_type(&ctx, &DataType::Decimal128(30, 2)),
            DataType::Decimal128(34, 6)
        );
        assert_eq!(
            DecimalDomain::result_type(&ctx, &DataType::Int64),
            DataType::Decimal128(24, 4)
        );
    }

    #[test]
    fn float_divide_is_plain_division() {
        let ctx = EvalContext::new();
        assert_eq!(
            FloatDomain::divide(&ctx, &DataType::Float64, 3.0, 2).unwrap(),
            1.5
        );
    }

    #[test]
    fn wide_decimal_result_gives_up_fractional_digits() {
        let ctx = EvalContext::new();
        assert_eq!(
            DecimalDomain::result_type(&ctx, &DataType::Decimal128(38, 0)),
            DataType::Decimal128(38, 0)
        );
        assert_eq!(
            DecimalDomain::result_type(&ctx, &DataType::Decimal128(36, 2)),
            DataType::Decimal128(38, 4)
        );
        assert_eq!(
            DecimalDomain::result_type(&ctx, &DataType::Decimal128(38, 28)),
            DataType::Decimal128(38, 28)
        );
    }

    #[test]
    fn decimal_divide_matches_column_scale() {
        let ctx = EvalContext::new();
        let big = DecimalValue::new(10_i128.pow(35), 0).unwrap();
        let avg = DecimalDomain::divide(&ctx, &DataType::Decimal128(38, 0), big, 1).unwrap();
        assert_eq!(avg.scale(), 0);
        assert_eq!(avg, big);

        let third = DecimalDomain::divide(
            &ctx,
            &DataType::Decimal128(24, 4),
            DecimalValue::from_i64(1),
            3,
        )
        .unwrap();
        assert_eq!(third.to_string(), "0.3333");
    }
}
