use arrow::array::RecordBatch;
use arrow::datatypes::SchemaRef;
use mergeagg_expr::EvalContext;
use mergeagg_result::Result;

use crate::executor::AggregateExecutor;
use crate::func::{AggFunc, OutputMode};
use crate::options::AggregateOptions;

/// Ungrouped aggregation over a stream of batches.
///
/// Drains the input on the first call to `next` and yields exactly one batch
/// with one row. An empty input still produces that row, with NULL for every
/// average.
pub struct AggregateStream<I> {
    executor: AggregateExecutor,
    ctx: EvalContext,
    mode: OutputMode,
    input: I,
    done: bool,
    schema: SchemaRef,
}

impl<I> AggregateStream<I>
where
    I: Iterator<Item = Result<RecordBatch>>,
{
    pub fn new(
        input: I,
        ctx: EvalContext,
        funcs: Vec<Box<dyn AggFunc>>,
        options: AggregateOptions,
        mode: OutputMode,
    ) -> Result<Self> {
        let mut executor = AggregateExecutor::new(funcs, options);
        let schema = executor.output_schema(mode)?;
        executor.ensure_group(0);

        Ok(Self {
            executor,
            ctx,
            mode,
            input,
            done: false,
            schema,
        })
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    fn drain(&mut self) -> Result<RecordBatch> {
        for batch in self.input.by_ref() {
            self.executor.update_batch(&self.ctx, 0, &batch?)?;
        }
        self.executor.finalize(&self.ctx, self.mode)
    }
}

impl<I> Iterator for AggregateStream<I>
where
    I: Iterator<Item = Result<RecordBatch>>,
{
    type Item = Result<RecordBatch>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        self.done = true;
        Some(self.drain())
    }
}
