use mergeagg_result::{Error, Result};

/// Rows handed to [`AggFunc::update`](crate::AggFunc::update) per call when
/// the executor slices a batch.
pub const DEFAULT_AGG_BATCH_SIZE: usize = 1024;

/// Tuning knobs for [`AggregateExecutor`](crate::AggregateExecutor).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct AggregateOptions {
    batch_size: usize,
}

impl Default for AggregateOptions {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_AGG_BATCH_SIZE,
        }
    }
}

impl AggregateOptions {
    pub fn with_batch_size(mut self, batch_size: usize) -> Result<Self> {
        if batch_size == 0 {
            return Err(Error::InvalidArgumentError(
                "aggregate batch size must be greater than zero".into(),
            ));
        }
        self.batch_size = batch_size;
        Ok(self)
    }

    #[inline]
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(matches!(
            AggregateOptions::default().with_batch_size(0),
            Err(Error::InvalidArgumentError(_))
        ));
        let options = AggregateOptions::default().with_batch_size(7).unwrap();
        assert_eq!(options.batch_size(), 7);
    }
}
