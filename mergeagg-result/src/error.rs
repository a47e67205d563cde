use std::fmt;
use thiserror::Error;

/// Unified error type for aggregate evaluation.
///
/// Errors propagate with `?` from the row evaluator through the aggregate
/// functions up to the driver, which attaches the failing variant and group
/// via [`Error::with_aggregate_context`]. A failed update or finalize is fatal
/// for that group's result; the caller decides what happens to the query.
#[derive(Error, Debug)]
pub enum Error {
    /// A source expression failed to evaluate against a row.
    ///
    /// Raised for unsupported column types, out-of-range column references and
    /// values that cannot be coerced into the requested numeric domain.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Exact decimal arithmetic failed.
    ///
    /// Covers overflow of the Decimal128 range, results exceeding the maximum
    /// precision, scales outside the supported range and division by zero.
    /// Count overflow while merging partial counts is reported here as well.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// Arrow library error while building output columns.
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Invalid construction argument or configuration value.
    ///
    /// These errors are recoverable: fix the input and retry.
    #[error("Invalid argument: {0}")]
    InvalidArgumentError(String),

    /// Internal error indicating a bug or unexpected state.
    ///
    /// Accumulator shape mismatches and the distinct + merge-phase
    /// combination land here; neither should be reachable from a valid plan.
    #[error("An internal operation failed: {0}")]
    Internal(String),

    /// An aggregate update or finalize failed for a specific group.
    #[error("aggregate {function} failed for group {group}: {source}")]
    Aggregate {
        function: String,
        group: usize,
        #[source]
        source: Box<Error>,
    },
}

impl Error {
    /// Create an evaluation error from any displayable error.
    ///
    /// # Examples
    ///
    /// ```
    /// use mergeagg_result::Error;
    ///
    /// fn parse_count(input: &str) -> Result<i64, Error> {
    ///     input.parse::<i64>().map_err(Error::evaluation)
    /// }
    ///
    /// assert_eq!(parse_count("42").unwrap(), 42);
    /// assert!(matches!(parse_count("abc"), Err(Error::Evaluation(_))));
    /// ```
    #[inline]
    pub fn evaluation<E: fmt::Display>(err: E) -> Self {
        Error::Evaluation(err.to_string())
    }

    /// Create an arithmetic error from any displayable error.
    #[inline]
    pub fn arithmetic<E: fmt::Display>(err: E) -> Self {
        Error::Arithmetic(err.to_string())
    }

    /// Wrap this error with the aggregate variant and group that produced it.
    pub fn with_aggregate_context(self, function: impl Into<String>, group: usize) -> Self {
        Error::Aggregate {
            function: function.into(),
            group,
            source: Box::new(self),
        }
    }

    /// Return the innermost error, looking through [`Error::Aggregate`] wrappers.
    pub fn root(&self) -> &Error {
        match self {
            Error::Aggregate { source, .. } => source.root(),
            other => other,
        }
    }
}
