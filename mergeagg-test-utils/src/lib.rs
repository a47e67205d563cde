use std::sync::{Arc, Once};

use arrow::array::{ArrayRef, Decimal128Array, Float64Array, Int64Array, RecordBatch};
use arrow::datatypes::{DataType, Field, Schema};
use mergeagg_types::{DecimalValue, arith};

static INIT: Once = Once::new();

/// Initialize tracing for test binaries. Safe to call multiple times.
pub fn init_tracing_for_tests() {
    INIT.call_once(|| {
        use tracing_subscriber::filter::EnvFilter;
        use tracing_subscriber::fmt;
        let env = std::env::var("RUST_LOG").ok();
        let filter = match env {
            Some(_) => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
            None => EnvFilter::new("info"),
        };
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_test_writer()
            .try_init();
    });
}

/// Parse a decimal literal, panicking on malformed test input.
pub fn dec(text: &str) -> DecimalValue {
    text.parse()
        .unwrap_or_else(|err| panic!("bad decimal literal {text:?}: {err}"))
}

/// Build a `Decimal128(precision, scale)` array from optional literals.
pub fn decimal_array(values: &[Option<&str>], precision: u8, scale: i8) -> ArrayRef {
    let raw: Vec<Option<i128>> = values
        .iter()
        .map(|value| {
            value.map(|text| {
                arith::rescale(dec(text), scale)
                    .unwrap_or_else(|err| panic!("cannot fit {text} into scale {scale}: {err}"))
                    .raw_value()
            })
        })
        .collect();
    Arc::new(
        Decimal128Array::from(raw)
            .with_precision_and_scale(precision, scale)
            .expect("valid decimal precision and scale"),
    )
}

/// Single nullable `Decimal128(precision, scale)` column named `v`.
pub fn decimal_batch(values: &[Option<&str>], precision: u8, scale: i8) -> RecordBatch {
    let schema = Schema::new(vec![Field::new(
        "v",
        DataType::Decimal128(precision, scale),
        true,
    )]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![decimal_array(values, precision, scale)],
    )
    .expect("decimal batch")
}

/// Single nullable `Float64` column named `v`.
pub fn float_batch(values: &[Option<f64>]) -> RecordBatch {
    let schema = Schema::new(vec![Field::new("v", DataType::Float64, true)]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![Arc::new(Float64Array::from(values.to_vec())) as ArrayRef],
    )
    .expect("float batch")
}

/// Single nullable `Int64` column named `v`.
pub fn int_batch(values: &[Option<i64>]) -> RecordBatch {
    let schema = Schema::new(vec![Field::new("v", DataType::Int64, true)]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![Arc::new(Int64Array::from(values.to_vec())) as ArrayRef],
    )
    .expect("int batch")
}

/// Pre-aggregated `(count, sum)` columns in the layout the merge phase reads:
/// column 0 holds the partial count, column 1 the partial decimal sum.
pub fn decimal_partial_batch(
    pairs: &[(Option<i64>, Option<&str>)],
    precision: u8,
    scale: i8,
) -> RecordBatch {
    let counts: Vec<Option<i64>> = pairs.iter().map(|(count, _)| *count).collect();
    let sums: Vec<Option<&str>> = pairs.iter().map(|(_, sum)| *sum).collect();
    let schema = Schema::new(vec![
        Field::new("pre_count", DataType::Int64, true),
        Field::new("pre_sum", DataType::Decimal128(precision, scale), true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(counts)) as ArrayRef,
            decimal_array(&sums, precision, scale),
        ],
    )
    .expect("decimal partial batch")
}

/// Float counterpart of [`decimal_partial_batch`].
pub fn float_partial_batch(pairs: &[(Option<i64>, Option<f64>)]) -> RecordBatch {
    let counts: Vec<Option<i64>> = pairs.iter().map(|(count, _)| *count).collect();
    let sums: Vec<Option<f64>> = pairs.iter().map(|(_, sum)| *sum).collect();
    let schema = Schema::new(vec![
        Field::new("pre_count", DataType::Int64, true),
        Field::new("pre_sum", DataType::Float64, true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(counts)) as ArrayRef,
            Arc::new(Float64Array::from(sums)) as ArrayRef,
        ],
    )
    .expect("float partial batch")
}
