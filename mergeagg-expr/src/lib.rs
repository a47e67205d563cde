//! Row-at-a-time expression evaluation for aggregate inputs.
//!
//! Aggregate functions never touch Arrow arrays directly. They hand a
//! [`ScalarExpr`] and a [`Row`] to one of the typed evaluation entry points
//! ([`ScalarExpr::eval_decimal`], [`ScalarExpr::eval_real`],
//! [`ScalarExpr::eval_int`]), each of which returns `Ok(None)` for SQL NULL.

pub mod context;
pub mod eval;
pub mod expr;
pub mod row;

pub use context::{DEFAULT_DIV_PRECISION_INCREMENT, EvalContext};
pub use expr::{Literal, ScalarExpr};
pub use row::Row;
