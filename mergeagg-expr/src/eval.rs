//! Typed evaluation of [`ScalarExpr`] against a [`Row`].
//!
//! Each entry point returns `Ok(None)` for NULL and `Err(Error::Evaluation)`
//! when the value cannot be represented in the requested domain.

use arrow::array::{
    Array, ArrayRef, Decimal128Array, Float32Array, Float64Array, Int8Array, Int16Array,
    Int32Array, Int64Array, UInt8Array, UInt16Array, UInt32Array, UInt64Array,
};
use arrow::datatypes::DataType;
use mergeagg_result::{Error, Result};
use mergeagg_types::DecimalValue;

use crate::context::EvalContext;
use crate::expr::{Literal, ScalarExpr};
use crate::row::Row;

macro_rules! downcast {
    ($array:expr, $ty:ty) => {
        $array.as_any().downcast_ref::<$ty>().ok_or_else(|| {
            Error::Evaluation(format!(
                "column type {:?} does not match its array implementation",
                $array.data_type()
            ))
        })?
    };
}

/// Integer value of `array[idx]` widened to `i128`, if the column is integral.
fn integer_at(array: &ArrayRef, idx: usize) -> Result<Option<i128>> {
    let value = match array.data_type() {
        DataType::Int8 => i128::from(downcast!(array, Int8Array).value(idx)),
        DataType::Int16 => i128::from(downcast!(array, Int16Array).value(idx)),
        DataType::Int32 => i128::from(downcast!(array, Int32Array).value(idx)),
        DataType::Int64 => i128::from(downcast!(array, Int64Array).value(idx)),
        DataType::UInt8 => i128::from(downcast!(array, UInt8Array).value(idx)),
        DataType::UInt16 => i128::from(downcast!(array, UInt16Array).value(idx)),
        DataType::UInt32 => i128::from(downcast!(array, UInt32Array).value(idx)),
        DataType::UInt64 => i128::from(downcast!(array, UInt64Array).value(idx)),
        _ => return Ok(None),
    };
    Ok(Some(value))
}

fn column_at<'a>(row: &Row<'a>, ordinal: usize) -> Result<&'a ArrayRef> {
    let array = row.column(ordinal).ok_or_else(|| {
        Error::Evaluation(format!(
            "column {ordinal} out of range for batch with {} columns",
            row.batch().num_columns()
        ))
    })?;
    if row.index() >= array.len() {
        return Err(Error::Evaluation(format!(
            "row {} out of range for column of length {}",
            row.index(),
            array.len()
        )));
    }
    Ok(array)
}

fn is_null_at(array: &ArrayRef, idx: usize) -> bool {
    matches!(array.data_type(), DataType::Null) || array.is_null(idx)
}

fn unsupported(kind: &str, data_type: &DataType) -> Error {
    Error::Evaluation(format!("cannot evaluate {data_type:?} value as {kind}"))
}

impl ScalarExpr {
    /// Evaluate as an exact decimal. Integer inputs are widened losslessly.
    pub fn eval_decimal(&self, _ctx: &EvalContext, row: &Row<'_>) -> Result<Option<DecimalValue>> {
        let (array, idx) = match self {
            ScalarExpr::Literal(lit) => {
                return match lit {
                    Literal::Null => Ok(None),
                    Literal::Decimal(value) => Ok(Some(*value)),
                    Literal::Integer(value) => Ok(Some(DecimalValue::from_i64(*value))),
                    Literal::Float(_) => Err(unsupported("DECIMAL", &DataType::Float64)),
                };
            }
            ScalarExpr::Column(ordinal) => (column_at(row, *ordinal)?, row.index()),
        };
        if is_null_at(array, idx) {
            return Ok(None);
        }
        if let DataType::Decimal128(_, scale) = array.data_type() {
            let raw = downcast!(array, Decimal128Array).value(idx);
            return DecimalValue::new(raw, *scale)
                .map(Some)
                .map_err(Error::evaluation);
        }
        match integer_at(array, idx)? {
            Some(value) => DecimalValue::new(value, 0)
                .map(Some)
                .map_err(Error::evaluation),
            None => Err(unsupported("DECIMAL", array.data_type())),
        }
    }

    /// Evaluate as an IEEE-754 double.
    pub fn eval_real(&self, _ctx: &EvalContext, row: &Row<'_>) -> Result<Option<f64>> {
        let (array, idx) = match self {
            ScalarExpr::Literal(lit) => {
                return Ok(match lit {
                    Literal::Null => None,
                    Literal::Float(value) => Some(*value),
                    Literal::Integer(value) => Some(*value as f64),
                    Literal::Decimal(value) => Some(value.to_f64()),
                });
            }
            ScalarExpr::Column(ordinal) => (column_at(row, *ordinal)?, row.index()),
        };
        if is_null_at(array, idx) {
            return Ok(None);
        }
        let value = match array.data_type() {
            DataType::Float64 => downcast!(array, Float64Array).value(idx),
            DataType::Float32 => f64::from(downcast!(array, Float32Array).value(idx)),
            DataType::Decimal128(_, scale) => {
                let raw = downcast!(array, Decimal128Array).value(idx);
                DecimalValue::new(raw, *scale)
                    .map_err(Error::evaluation)?
                    .to_f64()
            }
            other => match integer_at(array, idx)? {
                Some(value) => value as f64,
                None => return Err(unsupported("DOUBLE", other)),
            },
        };
        Ok(Some(value))
    }

    /// Evaluate as a 64-bit signed integer. Only integral inputs qualify.
    pub fn eval_int(&self, _ctx: &EvalContext, row: &Row<'_>) -> Result<Option<i64>> {
        let (array, idx) = match self {
            ScalarExpr::Literal(lit) => {
                return match lit {
                    Literal::Null => Ok(None),
                    Literal::Integer(value) => Ok(Some(*value)),
                    Literal::Float(_) => Err(unsupported("BIGINT", &DataType::Float64)),
                    Literal::Decimal(value) => {
                        let (precision, scale) = (value.precision(), value.scale().max(0));
                        Err(unsupported("BIGINT", &DataType::Decimal128(precision, scale)))
                    }
                };
            }
            ScalarExpr::Column(ordinal) => (column_at(row, *ordinal)?, row.index()),
        };
        if is_null_at(array, idx) {
            return Ok(None);
        }
        match integer_at(array, idx)? {
            Some(value) => i64::try_from(value).map(Some).map_err(|_| {
                Error::Evaluation(format!("integer value {value} exceeds BIGINT range"))
            }),
            None => Err(unsupported("BIGINT", array.data_type())),
        }
    }
}
