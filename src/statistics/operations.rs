//! Core reduction kinds and the reduction trait

use crate::errors::Result;
use ndarray::ArrayD;

/// Supported reductions along an axis
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Reduction<'w> {
    /// Arithmetic mean of the non-missing samples
    Mean,
    /// `Σ wᵢxᵢ / Σ wᵢ` over the non-missing samples
    WeightedMean(&'w [f64]),
}

impl Reduction<'_> {
    /// Get the string representation of the reduction
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Mean => "mean",
            Self::WeightedMean(_) => "weighted mean",
        }
    }
}

/// Trait for arrays that can be reduced along one axis while skipping NaN
pub trait NanReduction {
    /// Reduce along `axis`, removing it from the result
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The axis is out of bounds for the array
    /// - A weight vector does not match the axis length
    fn reduce_along_axis(&self, axis: usize, reduction: Reduction<'_>) -> Result<ArrayD<f64>>;
}

impl NanReduction for ArrayD<f64> {
    fn reduce_along_axis(&self, axis: usize, reduction: Reduction<'_>) -> Result<ArrayD<f64>> {
        match reduction {
            Reduction::Mean => super::parallel::parallel_nan_mean_axis(self, axis),
            Reduction::WeightedMean(weights) => {
                super::parallel::parallel_nan_weighted_mean_axis(self, axis, weights)
            }
        }
    }
}
