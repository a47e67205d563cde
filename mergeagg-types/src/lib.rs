//! Value types shared across the mergeagg crates.
//!
//! [`DecimalValue`] follows Arrow's `Decimal128` layout (an `i128` mantissa
//! plus a signed scale). The [`arith`] module holds the exact operations the
//! aggregate functions rely on, including division with a fractional
//! increment.

pub mod arith;
pub mod decimal;

pub use decimal::{DecimalError, DecimalValue, MAX_DECIMAL_PRECISION, MAX_DECIMAL_SCALE};
