//! Output batch written by aggregate finalization.
//!
//! Each aggregate owns a fixed column slot (its ordinal) and appends exactly
//! one value per finalized group. [`OutputChunk::finish`] assembles the
//! columns into a `RecordBatch`, which fails if any slot was skipped.

use std::sync::Arc;

use arrow::array::{ArrayRef, Decimal128Builder, Float64Builder, Int64Builder, RecordBatch};
use arrow::datatypes::{DataType, SchemaRef};
use mergeagg_result::{Error, Result};
use mergeagg_types::{DecimalValue, arith};

enum ColumnBuilder {
    Decimal {
        builder: Decimal128Builder,
        precision: u8,
        scale: i8,
    },
    Float(Float64Builder),
    Int(Int64Builder),
}

impl ColumnBuilder {
    fn for_type(data_type: &DataType, capacity: usize) -> Result<Self> {
        match data_type {
            DataType::Decimal128(precision, scale) => Ok(ColumnBuilder::Decimal {
                builder: Decimal128Builder::with_capacity(capacity)
                    .with_precision_and_scale(*precision, *scale)?,
                precision: *precision,
                scale: *scale,
            }),
            DataType::Float64 => Ok(ColumnBuilder::Float(Float64Builder::with_capacity(
                capacity,
            ))),
            DataType::Int64 => Ok(ColumnBuilder::Int(Int64Builder::with_capacity(capacity))),
            other => Err(Error::InvalidArgumentError(format!(
                "aggregate output column type {other:?} is not supported"
            ))),
        }
    }

    fn kind(&self) -> &'static str {
        match self {
            ColumnBuilder::Decimal { .. } => "DECIMAL",
            ColumnBuilder::Float(_) => "DOUBLE",
            ColumnBuilder::Int(_) => "BIGINT",
        }
    }

    fn finish(&mut self) -> ArrayRef {
        match self {
            ColumnBuilder::Decimal { builder, .. } => Arc::new(builder.finish()),
            ColumnBuilder::Float(builder) => Arc::new(builder.finish()),
            ColumnBuilder::Int(builder) => Arc::new(builder.finish()),
        }
    }
}

/// Column-slotted output batch for finalized (or partial) aggregate values.
pub struct OutputChunk {
    schema: SchemaRef,
    columns: Vec<ColumnBuilder>,
}

impl std::fmt::Debug for OutputChunk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputChunk")
            .field("schema", &self.schema)
            .finish_non_exhaustive()
    }
}

impl OutputChunk {
    /// Create an empty chunk for `schema`.
    ///
    /// Supported column types are `Decimal128`, `Float64` and `Int64`.
    pub fn try_new(schema: SchemaRef) -> Result<Self> {
        Self::with_capacity(schema, 0)
    }

    pub fn with_capacity(schema: SchemaRef, capacity: usize) -> Result<Self> {
        let columns = schema
            .fields()
            .iter()
            .map(|field| ColumnBuilder::for_type(field.data_type(), capacity))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { schema, columns })
    }

    pub fn schema(&self) -> SchemaRef {
        Arc::clone(&self.schema)
    }

    fn column_mut(&mut self, ordinal: usize) -> Result<&mut ColumnBuilder> {
        let width = self.columns.len();
        self.columns.get_mut(ordinal).ok_or_else(|| {
            Error::Internal(format!(
                "output ordinal {ordinal} out of range for chunk with {width} columns"
            ))
        })
    }

    fn mismatch(ordinal: usize, expected: &str, column: &ColumnBuilder) -> Error {
        Error::Internal(format!(
            "cannot append {expected} to {} output column {ordinal}",
            column.kind()
        ))
    }

    pub fn append_null(&mut self, ordinal: usize) -> Result<()> {
        match self.column_mut(ordinal)? {
            ColumnBuilder::Decimal { builder, .. } => builder.append_null(),
            ColumnBuilder::Float(builder) => builder.append_null(),
            ColumnBuilder::Int(builder) => builder.append_null(),
        }
        Ok(())
    }

    /// Append a decimal, rounding half away from zero to the column's declared scale.
    ///
    /// Fails with [`Error::Arithmetic`] when the value does not fit the
    /// column's precision.
    pub fn append_decimal(&mut self, ordinal: usize, value: DecimalValue) -> Result<()> {
        match self.column_mut(ordinal)? {
            ColumnBuilder::Decimal {
                builder,
                precision,
                scale,
            } => {
                let aligned = arith::align_decimal_to_scale(value, *precision, *scale)?;
                builder.append_value(aligned.raw_value());
                Ok(())
            }
            other => Err(Self::mismatch(ordinal, "DECIMAL", other)),
        }
    }

    pub fn append_float(&mut self, ordinal: usize, value: f64) -> Result<()> {
        match self.column_mut(ordinal)? {
            ColumnBuilder::Float(builder) => {
                builder.append_value(value);
                Ok(())
            }
            other => Err(Self::mismatch(ordinal, "DOUBLE", other)),
        }
    }

    pub fn append_int(&mut self, ordinal: usize, value: i64) -> Result<()> {
        match self.column_mut(ordinal)? {
            ColumnBuilder::Int(builder) => {
                builder.append_value(value);
                Ok(())
            }
            other => Err(Self::mismatch(ordinal, "BIGINT", other)),
        }
    }

    /// Assemble the appended values into a batch and reset the builders.
    pub fn finish(&mut self) -> Result<RecordBatch> {
        let arrays: Vec<ArrayRef> = self.columns.iter_mut().map(ColumnBuilder::finish).collect();
        Ok(RecordBatch::try_new(Arc::clone(&self.schema), arrays)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::{Array, Decimal128Array, Float64Array, Int64Array};
    use arrow::datatypes::{Field, Schema};

    fn schema() -> SchemaRef {
        Arc::new(Schema::new(vec![
            Field::new("avg_dec", DataType::Decimal128(10, 4), true),
            Field::new("avg_f", DataType::Float64, true),
            Field::new("cnt", DataType::Int64, true),
        ]))
    }

    #[test]
    fn appends_land_in_their_slots() {
        let mut chunk = OutputChunk::try_new(schema()).unwrap();
        chunk
            .append_decimal(0, "1.23456".parse().unwrap())
            .unwrap();
        chunk.append_float(1, 2.5).unwrap();
        chunk.append_int(2, 3).unwrap();
        chunk.append_null(0).unwrap();
        chunk.append_null(1).unwrap();
        chunk.append_null(2).unwrap();

        let batch = chunk.finish().unwrap();
        assert_eq!(batch.num_rows(), 2);

        let dec = batch
            .column(0)
            .as_any()
            .downcast_ref::<Decimal128Array>()
            .unwrap();
        assert_eq!(dec.value(0), 12346);
        assert!(dec.is_null(1));

        let f = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(f.value(0), 2.5);

        let c = batch
            .column(2)
            .as_any()
            .downcast_ref::<Int64Array>()
            .unwrap();
        assert_eq!(c.value(0), 3);
        assert!(c.is_null(1));
    }

    #[test]
    fn type_mismatch_and_bad_ordinal_are_internal_errors() {
        let mut chunk = OutputChunk::try_new(schema()).unwrap();
        assert!(matches!(chunk.append_float(0, 1.0), Err(Error::Internal(_))));
        assert!(matches!(chunk.append_null(9), Err(Error::Internal(_))));
    }

    #[test]
    fn decimal_precision_overflow_is_arithmetic() {
        let mut chunk = OutputChunk::try_new(schema()).unwrap();
        let err = chunk
            .append_decimal(0, "1234567.1".parse().unwrap())
            .unwrap_err();
        assert!(matches!(err, Error::Arithmetic(_)));
    }

    #[test]
    fn ragged_columns_fail_to_finish() {
        let mut chunk = OutputChunk::try_new(schema()).unwrap();
        chunk.append_float(1, 1.0).unwrap();
        assert!(matches!(chunk.finish(), Err(Error::Arrow(_))));
    }

    #[test]
    fn unsupported_column_type_is_rejected() {
        let schema = Arc::new(Schema::new(vec![Field::new("s", DataType::Utf8, true)]));
        assert!(matches!(
            OutputChunk::try_new(schema),
            Err(Error::InvalidArgumentError(_))
        ));
    }
}
