//! Vertical turbulence diagnostics
//!
//! Each function reduces full `(time, depth, horizontal)` fields to a single
//! depth profile. Inputs may store their axes in any order; they are checked
//! and transposed to `(time, depth, horizontal)` before any arithmetic, so a
//! missing axis, an extra axis or a length disagreement is reported as a named
//! error rather than silently broadcast.
//!
//! Horizontal means are area-weighted and skip missing samples; time means
//! skip missing samples.

use crate::errors::{Result, RuFeDiagError};
use crate::field::{Dim, Field};
use log::debug;
use serde::{Deserialize, Serialize};

/// Gravitational acceleration, negative (downward)
pub const GRAVITY: f64 = -9.81;

/// Linear equation-of-state parameters for buoyancy
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuoyancyParams {
    /// Thermal expansion coefficient (1/K)
    pub alpha: f64,
    /// Reference density (kg/m³), recorded with the result only
    pub density_0: f64,
    /// Reference temperature (°C)
    pub temp_0: f64,
}

impl Default for BuoyancyParams {
    fn default() -> Self {
        Self {
            alpha: 0.00025,
            density_0: 1030.0,
            temp_0: 10.0,
        }
    }
}

impl BuoyancyParams {
    /// `b = −g·α·(T − T₀) + g`
    #[must_use]
    pub fn buoyancy(&self, temp: f64) -> f64 {
        -GRAVITY * self.alpha * (temp - self.temp_0) + GRAVITY
    }
}

/// Time-mean, area-weighted eddy kinetic energy profile on `nz1`
///
/// `EKE = ½[(u − ū)² + (v − v̄)²]` with `ū`, `v̄` the time means, averaged
/// over `elem` with `elem_area` weights and then over `time`.
///
/// # Errors
///
/// Returns an axis error unless `u` and `v` both span exactly
/// `{time, nz1, elem}` with equal lengths, or a
/// [`RuFeDiagError::WeightLengthMismatch`] if `elem_area` does not match
/// `elem`.
pub fn mean_eke(u: &Field, v: &Field, elem_area: &[f64]) -> Result<Field> {
    let order = [Dim::Time, Dim::Nz1, Dim::Elem];
    let u = canonical(u, "mean_eke", &order)?;
    let v = canonical(v, "mean_eke", &order)?;
    check_same_lengths("mean_eke", &u, &v)?;
    check_weights(&u, &Dim::Elem, elem_area)?;

    debug!("EKE over {:?}", u.shape());
    let u_dash = u.anomaly(&Dim::Time)?;
    let v_dash = v.anomaly(&Dim::Time)?;
    let eke = u_dash.zip_with(&v_dash, "mean_eke", |du, dv| 0.5 * (du * du + dv * dv))?;

    Ok(eke
        .weighted_mean_over(&Dim::Elem, elem_area)?
        .mean_over(&Dim::Time)?
        .with_name("eke"))
}

/// Root of the time-mean, area-weighted `w²` profile on `nz`
///
/// The time mean of `w` is not removed first, so this is the RMS of the full
/// vertical velocity, not of its anomaly.
///
/// # Errors
///
/// Returns an axis error unless `w` spans exactly `{time, nz, nod2}`, or a
/// [`RuFeDiagError::WeightLengthMismatch`] if `nod_area` does not match `nod2`.
pub fn rms_vertical_velocity(w: &Field, nod_area: &[f64]) -> Result<Field> {
    let w = canonical(w, "rms_vertical_velocity", &[Dim::Time, Dim::Nz, Dim::Nod2])?;
    check_weights(&w, &Dim::Nod2, nod_area)?;

    debug!("w_rms over {:?}", w.shape());
    Ok(w
        .map(|x| x * x)
        .weighted_mean_over(&Dim::Nod2, nod_area)?
        .mean_over(&Dim::Time)?
        .map(f64::sqrt)
        .with_name("w_rms"))
}

/// Time-mean, area-weighted turbulent buoyancy flux `w′b′` on `nz1`
///
/// Buoyancy comes from temperature through [`BuoyancyParams::buoyancy`]. The
/// vertical-velocity anomaly lives on the `nz` interfaces and is linearly
/// interpolated onto the `nz1` depths of `temp` before the product is formed;
/// `nz1` depths outside the `nz` range yield NaN and drop out of the means.
///
/// # Errors
///
/// Returns an axis error unless `w` spans `{time, nz, nod2}` and `temp` spans
/// `{time, nz1, nod2}` with matching `time` and `nod2` lengths,
/// [`RuFeDiagError::CoordinateNotFound`] if either depth axis has no
/// coordinate values, or [`RuFeDiagError::WeightLengthMismatch`] if
/// `nod_area` does not match `nod2`.
pub fn mean_buoyancy_flux(
    w: &Field,
    temp: &Field,
    nod_area: &[f64],
    params: &BuoyancyParams,
) -> Result<Field> {
    let operation = "mean_buoyancy_flux";
    let w = canonical(w, operation, &[Dim::Time, Dim::Nz, Dim::Nod2])?;
    let temp = canonical(temp, operation, &[Dim::Time, Dim::Nz1, Dim::Nod2])?;

    for dim in [Dim::Time, Dim::Nod2] {
        let (left, right) = (w.len_of(&dim)?, temp.len_of(&dim)?);
        if left != right {
            return Err(RuFeDiagError::AxisLengthMismatch {
                operation: operation.to_string(),
                axis: dim.name().to_string(),
                left,
                right,
            });
        }
    }
    check_weights(&temp, &Dim::Nod2, nod_area)?;

    let targets = temp
        .coords(&Dim::Nz1)
        .ok_or_else(|| RuFeDiagError::CoordinateNotFound {
            field: temp.name().to_string(),
            axis: Dim::Nz1.name().to_string(),
        })?
        .to_vec();

    debug!(
        "Buoyancy flux: w {:?} onto {} mid-layer depths",
        w.shape(),
        targets.len()
    );

    let params = *params;
    let buoy_dash = temp.map(|t| params.buoyancy(t)).anomaly(&Dim::Time)?;
    let w_dash = w
        .anomaly(&Dim::Time)?
        .interp_axis(&Dim::Nz, &targets)?
        .rename_axis(&Dim::Nz, Dim::Nz1)?;

    let flux = w_dash.zip_with(&buoy_dash, operation, |wd, bd| wd * bd)?;

    Ok(flux
        .weighted_mean_over(&Dim::Nod2, nod_area)?
        .mean_over(&Dim::Time)?
        .with_name("buoy_flux"))
}

fn canonical(field: &Field, operation: &str, order: &[Dim]) -> Result<Field> {
    field.expect_dims(operation, order)?;
    field.transposed(order)
}

fn check_same_lengths(operation: &str, a: &Field, b: &Field) -> Result<()> {
    for (axis, (&left, &right)) in a.dims().iter().zip(a.shape().iter().zip(b.shape())) {
        if left != right {
            return Err(RuFeDiagError::AxisLengthMismatch {
                operation: operation.to_string(),
                axis: axis.name().to_string(),
                left,
                right,
            });
        }
    }
    Ok(())
}

fn check_weights(field: &Field, dim: &Dim, weights: &[f64]) -> Result<()> {
    let axis_len = field.len_of(dim)?;
    if weights.len() != axis_len {
        return Err(RuFeDiagError::WeightLengthMismatch {
            axis: dim.name().to_string(),
            weights: weights.len(),
            axis_len,
        });
    }
    Ok(())
}
