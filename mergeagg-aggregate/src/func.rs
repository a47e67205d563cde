use std::fmt;

use arrow::datatypes::{DataType, Field};
use mergeagg_expr::{EvalContext, Row};
use mergeagg_result::Result;

use crate::output::OutputChunk;
use crate::partial::PartialResult;

/// Which stage of a two-phase aggregation a function runs in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum AggPhase {
    /// Fold raw input values.
    Original,
    /// Combine pre-aggregated `(count, sum)` pairs produced by an earlier stage.
    Merge,
}

impl AggPhase {
    pub fn name(self) -> &'static str {
        match self {
            AggPhase::Original => "original",
            AggPhase::Merge => "merge",
        }
    }
}

/// What an executor writes for each group when it finalizes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputMode {
    /// One final value per aggregate at its ordinal.
    Final,
    /// The `(count, sum)` pair per aggregate at `ordinal` and `ordinal + 1`,
    /// ready to feed a merge-phase aggregate.
    Partial,
}

/// Lifecycle every aggregate function exposes to the executor.
///
/// Per group the executor calls [`allocate`](Self::allocate) once, then any
/// number of [`update`](Self::update) calls, then one
/// [`finalize`](Self::finalize). A failed update leaves the rows processed so
/// far applied; the group's result must be treated as failed.
pub trait AggFunc: fmt::Debug + Send + Sync {
    /// Variant name, e.g. `avg_original_distinct_decimal`.
    fn name(&self) -> &str;

    /// Output column slot this aggregate writes its final value to.
    fn ordinal(&self) -> usize;

    fn phase(&self) -> AggPhase;

    fn is_distinct(&self) -> bool;

    /// Arrow type of the finalized value.
    fn result_type(&self) -> &DataType;

    /// Fields this aggregate contributes to an output batch, keyed by ordinal.
    fn output_fields(&self, mode: OutputMode) -> Vec<(usize, Field)>;

    /// Fresh zero-state accumulator.
    fn allocate(&self) -> PartialResult;

    /// Return `pr` to the zero state in place.
    fn reset(&self, pr: &mut PartialResult);

    /// Fold `rows`, in order, into `pr`.
    fn update(&self, ctx: &EvalContext, rows: &[Row<'_>], pr: &mut PartialResult) -> Result<()>;

    /// Write the final value for `pr`, or NULL when nothing was counted.
    fn finalize(&self, ctx: &EvalContext, pr: &PartialResult, output: &mut OutputChunk)
    -> Result<()>;

    /// Write the mergeable `(count, sum)` pair for `pr`.
    fn append_partial_result(&self, pr: &PartialResult, output: &mut OutputChunk) -> Result<()>;

    /// Fold the state of `src` into `dst`. Both must come from this aggregate.
    fn merge_partial_result(&self, src: &PartialResult, dst: &mut PartialResult) -> Result<()>;
}
