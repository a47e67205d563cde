use std::ops::Range;

use arrow::array::{ArrayRef, RecordBatch};

/// A borrowed view of one row inside a `RecordBatch`.
#[derive(Clone, Copy, Debug)]
pub struct Row<'a> {
    batch: &'a RecordBatch,
    index: usize,
}

impl<'a> Row<'a> {
    pub fn new(batch: &'a RecordBatch, index: usize) -> Self {
        Self { batch, index }
    }

    /// Every row of `batch`, in order.
    pub fn all(batch: &'a RecordBatch) -> Vec<Row<'a>> {
        Self::range(batch, 0..batch.num_rows())
    }

    /// Rows `range` of `batch`, clamped to the batch length.
    pub fn range(batch: &'a RecordBatch, range: Range<usize>) -> Vec<Row<'a>> {
        let end = range.end.min(batch.num_rows());
        (range.start.min(end)..end)
            .map(|index| Row { batch, index })
            .collect()
    }

    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn batch(&self) -> &'a RecordBatch {
        self.batch
    }

    /// Column `ordinal` of the underlying batch, if present.
    pub fn column(&self, ordinal: usize) -> Option<&'a ArrayRef> {
        self.batch.columns().get(ordinal)
    }
}
