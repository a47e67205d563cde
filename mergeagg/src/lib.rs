//! mergeagg: mergeable two-phase aggregates over Arrow record batches
//!
//! This crate is the entrypoint for the `mergeagg` workspace. It re-exports
//! the aggregate functions, the expression layer they evaluate against and
//! the shared error type.
//!
//! # Quick Start
//!
//! Average a column in one pass:
//!
//! ```rust
//! use std::sync::Arc;
//! use arrow::array::{Float64Array, RecordBatch};
//! use arrow::datatypes::{DataType, Field, Schema};
//! use mergeagg::{AggregateExecutor, AggregateOptions, AvgDescriptor, EvalContext, OutputMode, ScalarExpr, build_avg};
//!
//! let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Float64, true)]));
//! let batch = RecordBatch::try_new(
//!     schema.clone(),
//!     vec![Arc::new(Float64Array::from(vec![Some(2.0), None, Some(4.0)]))],
//! )
//! .unwrap();
//!
//! let ctx = EvalContext::new();
//! let avg = build_avg(&ctx, &schema, AvgDescriptor::original(ScalarExpr::column(0), 0)).unwrap();
//! let mut executor = AggregateExecutor::new(vec![avg], AggregateOptions::default());
//! executor.update_batch(&ctx, 0, &batch).unwrap();
//! let out = executor.finalize(&ctx, OutputMode::Final).unwrap();
//! assert_eq!(out.num_rows(), 1);
//! ```
//!
//! # Architecture
//!
//! - **Values** (`mergeagg-types`): `DecimalValue` and exact decimal arithmetic.
//! - **Expressions** (`mergeagg-expr`): row views, scalar expressions and the
//!   per-query `EvalContext`.
//! - **Aggregates** (`mergeagg-aggregate`): the `AVG` family, its accumulator
//!   state and the executor that drives it.
//! - **Errors** (`mergeagg-result`): the shared `Error` and `Result` types.
//!
//! For two-phase execution, finalize the first stage with
//! [`OutputMode::Partial`] and feed the resulting `(count, sum)` batch to an
//! executor built from [`AvgDescriptor::merge`].

pub use mergeagg_aggregate::{
    AggDomain, AggFunc, AggPhase, AggregateExecutor, AggregateOptions, AggregateStream,
    AvgDescriptor, AvgFunc, DEFAULT_AGG_BATCH_SIZE, OutputChunk, OutputMode, PartialResult,
    build_avg,
};

pub use mergeagg_expr::{DEFAULT_DIV_PRECISION_INCREMENT, EvalContext, Literal, Row, ScalarExpr};

// Re-export result types for error handling
pub use mergeagg_result::{Error, Result};

pub use mergeagg_types::{DecimalError, DecimalValue};

pub mod aggregate {
    //! Lower-level aggregate building blocks.
    //!
    //! Numeric domains, accumulator internals and distinct value sets, for
    //! callers implementing their own [`AggFunc`](crate::AggFunc) variants.

    pub use mergeagg_aggregate::{
        Accumulator, DecimalDomain, DecimalSet, FloatDomain, FloatSet, NumericDomain, ValueSet,
    };
}
