use arrow::array::{Array, AsArray, Decimal128Array, RecordBatch};
use arrow::datatypes::{DataType, Decimal128Type, Field, Schema};
use mergeagg_aggregate::{AggregateExecutor, AggregateOptions, AvgDescriptor, OutputMode, build_avg};
use mergeagg_expr::{EvalContext, ScalarExpr};
use std::sync::Arc;

fn avg_of(raw: Vec<Option<i128>>, precision: u8, scale: i8) -> (DataType, Option<i128>) {
    let array = Decimal128Array::from(raw)
        .with_precision_and_scale(precision, scale)
        .unwrap();
    let schema = Arc::new(Schema::new(vec![Field::new(
        "a",
        DataType::Decimal128(precision, scale),
        true,
    )]));
    let batch = RecordBatch::try_new(schema, vec![Arc::new(array)]).unwrap();

    let ctx = EvalContext::new();
    let func = build_avg(
        &ctx,
        batch.schema_ref(),
        AvgDescriptor::original(ScalarExpr::column(0), 0),
    )
    .unwrap();
    let mut executor = AggregateExecutor::new(vec![func], AggregateOptions::default());
    executor.update_batch(&ctx, 0, &batch).unwrap();
    let out = executor.finalize(&ctx, OutputMode::Final).unwrap();

    let column = out.column(0).as_primitive::<Decimal128Type>();
    let value = (!column.is_null(0)).then(|| column.value(0));
    (out.schema().field(0).data_type().clone(), value)
}

#[test]
fn test_avg_decimal128_keeps_fraction() {
    // 10.51 + 10.52 = 21.03, / 2 = 10.515 at scale 2 + 4.
    let (data_type, value) = avg_of(vec![Some(1051), Some(1052)], 10, 2);
    assert_eq!(data_type, DataType::Decimal128(14, 6));
    assert_eq!(value, Some(10_515_000), "Expected 10.515000, got {:?}", value);
}

#[test]
fn test_avg_decimal128_rounds_half_away_from_zero() {
    // 0.01 + 0.01 + 0.00 = 0.02, / 3 = 0.0066666.. -> 0.006667
    let (_, value) = avg_of(vec![Some(1), Some(1), Some(0)], 10, 2);
    assert_eq!(value, Some(6_667));

    let (_, value) = avg_of(vec![Some(-1), Some(-1), Some(0)], 10, 2);
    assert_eq!(value, Some(-6_667));
}

#[test]
fn test_avg_decimal128_scale_is_capped() {
    let (data_type, value) = avg_of(vec![Some(1), Some(2)], 30, 28);
    assert_eq!(data_type, DataType::Decimal128(34, 30));
    // (1e-28 + 2e-28) / 2 = 1.5e-28 = 150 at scale 30
    assert_eq!(value, Some(150));
}

#[test]
fn test_avg_decimal128_keeps_integer_digits_at_max_precision() {
    let (data_type, value) = avg_of(vec![Some(1), Some(2)], 38, 28);
    assert_eq!(data_type, DataType::Decimal128(38, 28));
    // 1.5e-28 rounds half away from zero at scale 28
    assert_eq!(value, Some(2));

    let (data_type, value) = avg_of(vec![Some(-1), Some(-2)], 38, 28);
    assert_eq!(data_type, DataType::Decimal128(38, 28));
    assert_eq!(value, Some(-2));
}
