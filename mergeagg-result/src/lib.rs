//! Error types and result definitions for the mergeagg crates.
//!
//! Every crate in the workspace returns [`Result<T>`] and surfaces failures as
//! the single [`Error`] enum so errors cross crate boundaries with `?` and keep
//! their category intact.
//!
//! # Error Categories
//!
//! - **Evaluation errors** ([`Error::Evaluation`]): a source expression could
//!   not be evaluated against a row.
//! - **Arithmetic errors** ([`Error::Arithmetic`]): exact decimal overflow,
//!   precision loss or division failures.
//! - **Data format errors** ([`Error::Arrow`]): output batch assembly.
//! - **User input errors** ([`Error::InvalidArgumentError`]): bad construction
//!   arguments or configuration values.
//! - **Internal errors** ([`Error::Internal`]): violated invariants.
//! - **Context** ([`Error::Aggregate`]): wraps any of the above with the
//!   aggregate variant and group that failed.

pub mod error;
pub mod result;

pub use error::Error;
pub use result::Result;
