//! Mergeable aggregate functions over Arrow record batches.
//!
//! The `AVG` family is built from three independent choices:
//!
//! - numeric domain: exact decimal ([`DecimalDomain`]) or double ([`FloatDomain`]),
//! - phase: fold raw values ([`AggPhase::Original`]) or combine pre-aggregated
//!   `(count, sum)` pairs ([`AggPhase::Merge`]),
//! - uniqueness: every value, or each distinct value once.
//!
//! [`build_avg`] picks the variant from an [`AvgDescriptor`] and the input
//! schema. Each variant implements [`AggFunc`]; the accumulator state it hands
//! out is a [`PartialResult`] that only that variant reads.
//!
//! [`AggregateExecutor`] drives a set of functions over dense groups, and
//! [`AggregateStream`] wraps it for a single ungrouped result.

pub mod avg;
pub mod domain;
pub mod executor;
pub mod func;
pub mod options;
pub mod output;
pub mod partial;
pub mod stream;
pub mod value_set;

pub use avg::{AvgDescriptor, AvgFunc, SOURCE_TYPE_METADATA_KEY, build_avg};
pub use domain::{AggDomain, DecimalDomain, FloatDomain, NumericDomain};
pub use executor::AggregateExecutor;
pub use func::{AggFunc, AggPhase, OutputMode};
pub use options::{AggregateOptions, DEFAULT_AGG_BATCH_SIZE};
pub use output::OutputChunk;
pub use partial::{Accumulator, PartialResult};
pub use stream::AggregateStream;
pub use value_set::{DecimalSet, FloatSet, ValueSet};
