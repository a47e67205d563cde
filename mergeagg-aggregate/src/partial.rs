//! Per-group accumulator state.

use std::fmt;

use mergeagg_types::DecimalValue;

use crate::domain::{DecimalDomain, FloatDomain, NumericDomain};
use crate::value_set::ValueSet;

/// Running `(sum, count)` for one group, plus the distinct value set when the
/// owning aggregate deduplicates.
pub struct Accumulator<D: NumericDomain> {
    pub(crate) sum: D::Value,
    pub(crate) count: i64,
    pub(crate) dedup: Option<D::Set>,
}

impl<D: NumericDomain> Accumulator<D> {
    pub(crate) fn new(distinct: bool) -> Self {
        Self {
            sum: D::zero(),
            count: 0,
            dedup: distinct.then(D::Set::default),
        }
    }

    /// Return to the zero state without giving up the set's allocation.
    pub(crate) fn reset(&mut self) {
        self.sum = D::zero();
        self.count = 0;
        if let Some(set) = self.dedup.as_mut() {
            set.clear();
        }
    }

    pub fn sum(&self) -> D::Value {
        self.sum
    }

    pub fn count(&self) -> i64 {
        self.count
    }

    pub fn is_distinct(&self) -> bool {
        self.dedup.is_some()
    }

    /// Number of distinct members observed, if this accumulator deduplicates.
    pub fn distinct_len(&self) -> Option<usize> {
        self.dedup.as_ref().map(|set| set.len())
    }
}

impl<D: NumericDomain> fmt::Debug for Accumulator<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Accumulator")
            .field("domain", &D::NAME)
            .field("sum", &self.sum)
            .field("count", &self.count)
            .field("distinct_len", &self.distinct_len())
            .finish()
    }
}

/// Opaque per-group state handed out by [`AggFunc::allocate`].
///
/// The variant is fixed by the aggregate that allocated it; an aggregate
/// handed a state of the other domain reports an internal error instead of
/// reinterpreting it.
///
/// [`AggFunc::allocate`]: crate::AggFunc::allocate
#[derive(Debug)]
pub enum PartialResult {
    Decimal(Accumulator<DecimalDomain>),
    Float(Accumulator<FloatDomain>),
}

impl PartialResult {
    pub fn count(&self) -> i64 {
        match self {
            PartialResult::Decimal(acc) => acc.count,
            PartialResult::Float(acc) => acc.count,
        }
    }

    pub fn is_distinct(&self) -> bool {
        match self {
            PartialResult::Decimal(acc) => acc.is_distinct(),
            PartialResult::Float(acc) => acc.is_distinct(),
        }
    }

    pub fn decimal_sum(&self) -> Option<DecimalValue> {
        match self {
            PartialResult::Decimal(acc) => Some(acc.sum),
            PartialResult::Float(_) => None,
        }
    }

    pub fn float_sum(&self) -> Option<f64> {
        match self {
            PartialResult::Float(acc) => Some(acc.sum),
            PartialResult::Decimal(_) => None,
        }
    }

    pub fn domain_name(&self) -> &'static str {
        match self {
            PartialResult::Decimal(_) => DecimalDomain::NAME,
            PartialResult::Float(_) => FloatDomain::NAME,
        }
    }
}
