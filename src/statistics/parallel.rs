//! Parallel lane reductions
//!
//! Each output element is the reduction of one lane along the reduced axis;
//! lanes are independent, so `Zip::par_map_collect` spreads them over the
//! rayon pool and keeps the remaining axes in their original order.

use crate::errors::{Result, RuFeDiagError};
use ndarray::{ArrayD, Axis, Zip};

/// Computes the NaN-skipping mean along an axis using parallel processing
///
/// A lane whose samples are all missing (or which is empty) reduces to NaN.
///
/// # Errors
///
/// Returns an error if the axis is invalid.
pub fn parallel_nan_mean_axis(data: &ArrayD<f64>, axis: usize) -> Result<ArrayD<f64>> {
    check_axis(data, axis)?;

    log::trace!(
        "⚡ Averaging {} lanes of length {} across {} threads",
        data.len() / data.len_of(Axis(axis)).max(1),
        data.len_of(Axis(axis)),
        rayon::current_num_threads()
    );

    let result = Zip::from(data.lanes(Axis(axis))).par_map_collect(|lane| {
        let mut sum = 0.0_f64;
        let mut count = 0_usize;
        for &value in lane.iter() {
            if !value.is_nan() {
                sum += value;
                count += 1;
            }
        }

        if count > 0 {
            sum / count as f64
        } else {
            f64::NAN
        }
    });

    Ok(result)
}

/// Computes the NaN-skipping weighted mean along an axis using parallel processing
///
/// Weights of missing samples are left out of the denominator; when no
/// weight remains the lane reduces to NaN.
///
/// # Errors
///
/// Returns an error if the axis is invalid or `weights` does not have one
/// entry per position along the axis.
pub fn parallel_nan_weighted_mean_axis(
    data: &ArrayD<f64>,
    axis: usize,
    weights: &[f64],
) -> Result<ArrayD<f64>> {
    check_axis(data, axis)?;

    let axis_len = data.len_of(Axis(axis));
    if weights.len() != axis_len {
        return Err(RuFeDiagError::WeightLengthMismatch {
            axis: format!("#{axis}"),
            weights: weights.len(),
            axis_len,
        });
    }

    let result = Zip::from(data.lanes(Axis(axis))).par_map_collect(|lane| {
        let mut weighted_sum = 0.0_f64;
        let mut weight_sum = 0.0_f64;
        for (&value, &weight) in lane.iter().zip(weights) {
            if !value.is_nan() {
                weighted_sum += weight * value;
                weight_sum += weight;
            }
        }

        if weight_sum == 0.0 {
            f64::NAN
        } else {
            weighted_sum / weight_sum
        }
    });

    Ok(result)
}

fn check_axis(data: &ArrayD<f64>, axis: usize) -> Result<()> {
    if axis >= data.ndim() {
        return Err(RuFeDiagError::Generic(format!(
            "Axis {axis} is out of bounds for array with {} dimensions",
            data.ndim()
        )));
    }
    Ok(())
}
