//! Missing-value aware reductions over one axis of an `f64` array
//!
//! These are the numerical kernels behind [`crate::field::Field`]'s time and
//! horizontal averages. NaN marks a missing sample (masked land, decoded
//! `_FillValue`) and is skipped, never propagated, unless every sample of a
//! lane is missing.
//!
//! # Organization
//!
//! - [`operations`]: the [`Reduction`] kinds and the [`NanReduction`] trait
//! - [`parallel`]: rayon-backed lane reductions

pub mod operations;
pub mod parallel;

pub use operations::{NanReduction, Reduction};
pub use parallel::{parallel_nan_mean_axis, parallel_nan_weighted_mean_axis};
