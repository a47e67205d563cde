use arrow::datatypes::{DataType, Schema};
use mergeagg_result::{Error, Result};
use mergeagg_types::{DecimalValue, MAX_DECIMAL_PRECISION};

/// A literal value usable as an aggregate argument.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Integer(i64),
    Float(f64),
    Decimal(DecimalValue),
    Null,
}

macro_rules! impl_from_for_literal {
    ($variant:ident, $($t:ty),*) => {
        $(
            impl From<$t> for Literal {
                fn from(v: $t) -> Self {
                    Literal::$variant(v.into())
                }
            }
        )*
    };
}

impl_from_for_literal!(Integer, i8, i16, i32, i64, u8, u16, u32);
impl_from_for_literal!(Float, f32, f64);
impl_from_for_literal!(Decimal, DecimalValue);

/// Scalar expression evaluated once per input row.
#[derive(Debug, Clone, PartialEq)]
pub enum ScalarExpr {
    /// Reference to a column of the input batch by position.
    Column(usize),
    Literal(Literal),
}

impl ScalarExpr {
    pub fn column(ordinal: usize) -> Self {
        ScalarExpr::Column(ordinal)
    }

    pub fn literal(lit: impl Into<Literal>) -> Self {
        ScalarExpr::Literal(lit.into())
    }

    pub fn null() -> Self {
        ScalarExpr::Literal(Literal::Null)
    }

    /// Arrow type this expression produces against `schema`.
    pub fn data_type(&self, schema: &Schema) -> Result<DataType> {
        match self {
            ScalarExpr::Column(ordinal) => schema
                .fields()
                .get(*ordinal)
                .map(|field| field.data_type().clone())
                .ok_or_else(|| {
                    Error::InvalidArgumentError(format!(
                        "column {ordinal} out of range for schema with {} fields",
                        schema.fields().len()
                    ))
                }),
            ScalarExpr::Literal(Literal::Integer(_)) => Ok(DataType::Int64),
            ScalarExpr::Literal(Literal::Float(_)) => Ok(DataType::Float64),
            ScalarExpr::Literal(Literal::Decimal(value)) => {
                let scale = value.scale().max(0);
                let precision = value
                    .precision()
                    .max(scale as u8)
                    .min(MAX_DECIMAL_PRECISION);
                Ok(DataType::Decimal128(precision, scale))
            }
            ScalarExpr::Literal(Literal::Null) => Ok(DataType::Null),
        }
    }
}
