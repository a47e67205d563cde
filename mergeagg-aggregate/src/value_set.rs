//! Per-accumulator membership sets backing `DISTINCT` aggregation.

use mergeagg_types::DecimalValue;
use rustc_hash::FxHashSet;

/// Set of values already folded into a distinct accumulator.
pub trait ValueSet<T: Copy>: Default + Send + Sync {
    fn exist(&self, value: &T) -> bool;

    /// Insert `value`; returns `false` when an equal member was present.
    fn insert(&mut self, value: T) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every member while keeping the allocation.
    fn clear(&mut self);

    fn values(&self) -> impl Iterator<Item = T> + '_;
}

/// Decimal members compared by numeric value.
///
/// `DecimalValue` hashes and compares its normalized form, so `2.5` and
/// `2.50` land on the same member. The first representation seen is kept.
#[derive(Debug, Default, Clone)]
pub struct DecimalSet {
    inner: FxHashSet<DecimalValue>,
}

impl ValueSet<DecimalValue> for DecimalSet {
    #[inline]
    fn exist(&self, value: &DecimalValue) -> bool {
        self.inner.contains(value)
    }

    #[inline]
    fn insert(&mut self, value: DecimalValue) -> bool {
        self.inner.insert(value)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn values(&self) -> impl Iterator<Item = DecimalValue> + '_ {
        self.inner.iter().copied()
    }
}

/// Float members compared with IEEE equality (`-0.0 == 0.0`).
#[derive(Debug, Default, Clone)]
pub struct FloatSet {
    inner: FxHashSet<u64>,
}

#[inline]
fn canonical_bits(value: f64) -> u64 {
    if value == 0.0 {
        0.0_f64.to_bits()
    } else {
        value.to_bits()
    }
}

impl ValueSet<f64> for FloatSet {
    #[inline]
    fn exist(&self, value: &f64) -> bool {
        self.inner.contains(&canonical_bits(*value))
    }

    #[inline]
    fn insert(&mut self, value: f64) -> bool {
        self.inner.insert(canonical_bits(value))
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn clear(&mut self) {
        self.inner.clear();
    }

    fn values(&self) -> impl Iterator<Item = f64> + '_ {
        self.inner.iter().map(|bits| f64::from_bits(*bits))
    }
}
