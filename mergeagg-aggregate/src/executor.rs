//! Grouped driver for aggregate functions.

use std::sync::Arc;

use arrow::array::RecordBatch;
use arrow::datatypes::{Field, Schema, SchemaRef};
use mergeagg_expr::{EvalContext, Row};
use mergeagg_result::{Error, Result};

use crate::func::{AggFunc, OutputMode};
use crate::options::AggregateOptions;
use crate::output::OutputChunk;
use crate::partial::PartialResult;

/// Owns a set of aggregate functions and one accumulator per function per
/// group.
///
/// Groups are dense indexes assigned by the caller. Every error raised by a
/// function is wrapped in [`Error::Aggregate`] naming the variant and group.
#[derive(Debug)]
pub struct AggregateExecutor {
    funcs: Vec<Box<dyn AggFunc>>,
    groups: Vec<Vec<PartialResult>>,
    options: AggregateOptions,
}

impl AggregateExecutor {
    pub fn new(funcs: Vec<Box<dyn AggFunc>>, options: AggregateOptions) -> Self {
        Self {
            funcs,
            groups: Vec::new(),
            options,
        }
    }

    pub fn funcs(&self) -> &[Box<dyn AggFunc>] {
        &self.funcs
    }

    pub fn num_groups(&self) -> usize {
        self.groups.len()
    }

    pub fn options(&self) -> AggregateOptions {
        self.options
    }

    /// Schema of the batch [`finalize`](Self::finalize) produces in `mode`.
    ///
    /// Output ordinals must tile `0..n` exactly.
    pub fn output_schema(&self, mode: OutputMode) -> Result<SchemaRef> {
        let mut slots: Vec<(usize, Field)> = self
            .funcs
            .iter()
            .flat_map(|func| func.output_fields(mode))
            .collect();
        slots.sort_by_key(|(ordinal, _)| *ordinal);

        for (expected, (ordinal, field)) in slots.iter().enumerate() {
            if *ordinal != expected {
                return Err(Error::InvalidArgumentError(format!(
                    "aggregate output column {} claims ordinal {ordinal}, expected {expected}",
                    field.name()
                )));
            }
        }

        let fields: Vec<Field> = slots.into_iter().map(|(_, field)| field).collect();
        Ok(Arc::new(Schema::new(fields)))
    }

    /// Allocate accumulators for every group up to and including `group`.
    pub fn ensure_group(&mut self, group: usize) {
        if self.groups.len() <= group {
            tracing::debug!(
                from = self.groups.len(),
                to = group + 1,
                funcs = self.funcs.len(),
                "allocating aggregate group slots"
            );
        }
        while self.groups.len() <= group {
            let states = self.funcs.iter().map(|func| func.allocate()).collect();
            self.groups.push(states);
        }
    }

    /// Accumulator of function `func` for `group`, if allocated.
    pub fn partial_result(&self, group: usize, func: usize) -> Option<&PartialResult> {
        self.groups.get(group).and_then(|states| states.get(func))
    }

    /// Feed `rows` to every function for `group`.
    ///
    /// Stops at the first failing function; functions before it keep the rows.
    pub fn update(&mut self, ctx: &EvalContext, group: usize, rows: &[Row<'_>]) -> Result<()> {
        self.ensure_group(group);
        let states = &mut self.groups[group];
        for (func, state) in self.funcs.iter().zip(states.iter_mut()) {
            func.update(ctx, rows, state).map_err(|err| {
                tracing::debug!(
                    function = func.name(),
                    group,
                    label = ctx.label(),
                    error = %err,
                    "aggregate update failed"
                );
                err.with_aggregate_context(func.name(), group)
            })?;
        }
        tracing::trace!(group, rows = rows.len(), "aggregate update");
        Ok(())
    }

    /// Feed every row of `batch` to `group`, in slices of the configured batch size.
    pub fn update_batch(
        &mut self,
        ctx: &EvalContext,
        group: usize,
        batch: &RecordBatch,
    ) -> Result<()> {
        let num_rows = batch.num_rows();
        let step = self.options.batch_size();
        let mut start = 0;
        while start < num_rows {
            let end = (start + step).min(num_rows);
            let rows = Row::range(batch, start..end);
            self.update(ctx, group, &rows)?;
            start = end;
        }
        Ok(())
    }

    /// Emit one row per group.
    ///
    /// [`OutputMode::Final`] writes each function's result;
    /// [`OutputMode::Partial`] writes the `(count, sum)` pairs a merge-phase
    /// executor consumes.
    pub fn finalize(&self, ctx: &EvalContext, mode: OutputMode) -> Result<RecordBatch> {
        let schema = self.output_schema(mode)?;
        let mut output = OutputChunk::with_capacity(schema, self.groups.len())?;
        for (group, states) in self.groups.iter().enumerate() {
            for (func, state) in self.funcs.iter().zip(states) {
                let written = match mode {
                    OutputMode::Final => func.finalize(ctx, state, &mut output),
                    OutputMode::Partial => func.append_partial_result(state, &mut output),
                };
                written.map_err(|err| {
                    tracing::debug!(
                        function = func.name(),
                        group,
                        ?mode,
                        label = ctx.label(),
                        error = %err,
                        "aggregate finalize failed"
                    );
                    err.with_aggregate_context(func.name(), group)
                })?;
            }
        }
        let batch = output.finish()?;
        tracing::debug!(
            groups = self.groups.len(),
            ?mode,
            label = ctx.label(),
            "finalized aggregates"
        );
        Ok(batch)
    }

    /// Return every allocated accumulator to its zero state.
    pub fn reset(&mut self) {
        tracing::debug!(groups = self.groups.len(), "resetting aggregate group slots");
        for states in &mut self.groups {
            for (func, state) in self.funcs.iter().zip(states.iter_mut()) {
                func.reset(state);
            }
        }
    }

    /// Fold the accumulators of `other` into this executor, group by group.
    ///
    /// Both executors must have been built from the same descriptors.
    pub fn merge(&mut self, other: &AggregateExecutor) -> Result<()> {
        let compatible = self.funcs.len() == other.funcs.len()
            && self
                .funcs
                .iter()
                .zip(&other.funcs)
                .all(|(lhs, rhs)| lhs.name() == rhs.name() && lhs.ordinal() == rhs.ordinal());
        if !compatible {
            return Err(Error::InvalidArgumentError(
                "cannot merge executors built from different aggregates".into(),
            ));
        }

        if let Some(last) = other.groups.len().checked_sub(1) {
            self.ensure_group(last);
        }
        for (group, (src_states, dst_states)) in
            other.groups.iter().zip(self.groups.iter_mut()).enumerate()
        {
            for ((func, src), dst) in self.funcs.iter().zip(src_states).zip(dst_states) {
                func.merge_partial_result(src, dst)
                    .map_err(|err| err.with_aggregate_context(func.name(), group))?;
            }
        }
        Ok(())
    }
}
