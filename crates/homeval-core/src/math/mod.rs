//! Small dense matrix type used throughout the crate.
//!
//! `Array2` is a row-major container with helpers for column selection and
//! row splitting.
pub mod matrix;

pub use matrix::{Array2, ShapeError};
