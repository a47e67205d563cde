use arrow::array::{Array, AsArray};
use arrow::datatypes::{DataType, Decimal128Type};
use mergeagg::{
    AggregateExecutor, AggregateOptions, AvgDescriptor, EvalContext, OutputMode, ScalarExpr,
    build_avg,
};
use mergeagg_test_utils::{decimal_batch, init_tracing_for_tests};

#[test]
fn two_phase_average_over_decimal_shards() {
    init_tracing_for_tests();
    let ctx = EvalContext::new().with_label("two_phase_smoke");
    let shards = [
        decimal_batch(&[Some("1.50"), Some("2.25"), None], 10, 2),
        decimal_batch(&[Some("-0.75")], 10, 2),
        decimal_batch(&[], 10, 2),
    ];

    let mut partials = Vec::new();
    for shard in &shards {
        let avg = build_avg(
            &ctx,
            shard.schema_ref(),
            AvgDescriptor::original(ScalarExpr::column(0), 0),
        )
        .unwrap();
        let mut executor = AggregateExecutor::new(vec![avg], AggregateOptions::default());
        executor.ensure_group(0);
        executor.update_batch(&ctx, 0, shard).unwrap();
        partials.push(executor.finalize(&ctx, OutputMode::Partial).unwrap());
    }

    let merge = build_avg(
        &ctx,
        partials[0].schema_ref(),
        AvgDescriptor::merge(ScalarExpr::column(0), ScalarExpr::column(1), 0),
    )
    .unwrap();
    let mut executor = AggregateExecutor::new(vec![merge], AggregateOptions::default());
    for partial in &partials {
        executor.update_batch(&ctx, 0, partial).unwrap();
    }
    let out = executor.finalize(&ctx, OutputMode::Final).unwrap();

    assert_eq!(out.schema().field(0).data_type(), &DataType::Decimal128(14, 6));
    let column = out.column(0).as_primitive::<Decimal128Type>();
    assert!(!column.is_null(0));
    // (1.50 + 2.25 - 0.75) / 3
    assert_eq!(column.value(0), 1_000_000);
}
