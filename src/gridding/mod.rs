//! Regridding of unstructured fields onto a regular lon/lat grid
//!
//! A [`Regridder`] triangulates the source coordinates once and then
//! interpolates any number of `(day, level)` slices against that
//! triangulation. Three methods are available:
//!
//! - **nearest**: value of the closest source point, defined everywhere
//! - **linear**: barycentric interpolation on the Delaunay triangle
//! - **cubic**: Clough–Tocher C¹ interpolation with estimated gradients
//!
//! Linear and cubic give NaN outside the convex hull of the source points.
//!
//! # Organization
//!
//! - [`triangulation`]: Delaunay triangulation and point location
//! - [`clough_tocher`]: the cubic patch

pub mod clough_tocher;
pub mod triangulation;

use crate::errors::{Result, RuFeDiagError};
use crate::parallel::ParallelConfig;
use log::{debug, info};
use ndarray::{s, Array1, Array2, Array3, Array4, ArrayView2, ArrayView3, Axis};
use rayon::prelude::*;
use std::fmt;
use std::str::FromStr;

pub use triangulation::{Location, Triangulation};

/// Scattered-data interpolation method
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InterpolationMethod {
    Nearest,
    #[default]
    Linear,
    Cubic,
}

impl InterpolationMethod {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Nearest => "nearest",
            Self::Linear => "linear",
            Self::Cubic => "cubic",
        }
    }
}

impl fmt::Display for InterpolationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InterpolationMethod {
    type Err = RuFeDiagError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nearest" => Ok(Self::Nearest),
            "linear" => Ok(Self::Linear),
            "cubic" => Ok(Self::Cubic),
            other => Err(RuFeDiagError::InterpolationError(format!(
                "Unknown interpolation method '{other}', expected nearest, linear or cubic"
            ))),
        }
    }
}

/// Regular target grid: rows follow latitude, columns follow longitude
#[derive(Debug, Clone, PartialEq)]
pub struct TargetGrid {
    lon: Vec<f64>,
    lat: Vec<f64>,
}

impl TargetGrid {
    /// Grid from its two axes
    ///
    /// # Errors
    ///
    /// Returns an error if either axis is empty or holds a non-finite value.
    pub fn from_axes(lon: Vec<f64>, lat: Vec<f64>) -> Result<Self> {
        if lon.is_empty() || lat.is_empty() {
            return Err(RuFeDiagError::InterpolationError(
                "target grid axes must not be empty".to_string(),
            ));
        }
        if lon.iter().chain(&lat).any(|v| !v.is_finite()) {
            return Err(RuFeDiagError::InterpolationError(
                "target grid coordinates must be finite".to_string(),
            ));
        }
        Ok(Self { lon, lat })
    }

    /// Evenly spaced grid over `[lon_min, lon_max] x [lat_min, lat_max]`
    ///
    /// # Errors
    ///
    /// As for [`TargetGrid::from_axes`].
    pub fn linspace(lon: (f64, f64, usize), lat: (f64, f64, usize)) -> Result<Self> {
        Self::from_axes(
            Array1::linspace(lon.0, lon.1, lon.2).to_vec(),
            Array1::linspace(lat.0, lat.1, lat.2).to_vec(),
        )
    }

    #[must_use]
    pub fn lon(&self) -> &[f64] {
        &self.lon
    }

    #[must_use]
    pub fn lat(&self) -> &[f64] {
        &self.lat
    }

    /// `(rows, cols)`
    #[must_use]
    pub fn shape(&self) -> (usize, usize) {
        (self.lat.len(), self.lon.len())
    }

    /// 2-D longitude and latitude arrays of shape `(rows, cols)`
    #[must_use]
    pub fn meshgrid(&self) -> (Array2<f64>, Array2<f64>) {
        let shape = self.shape();
        (
            Array2::from_shape_fn(shape, |(_, c)| self.lon[c]),
            Array2::from_shape_fn(shape, |(r, _)| self.lat[r]),
        )
    }
}

/// Interpolator bound to one set of source coordinates
pub struct Regridder {
    method: InterpolationMethod,
    triangulation: Triangulation,
}

impl Regridder {
    /// Triangulate the source points `(xs[i], ys[i])`
    ///
    /// # Errors
    ///
    /// Returns an error if the coordinates cannot be triangulated.
    pub fn new(xs: &[f64], ys: &[f64], method: InterpolationMethod) -> Result<Self> {
        let triangulation = Triangulation::new(xs, ys)?;
        if method != InterpolationMethod::Nearest && triangulation.triangles().is_empty() {
            return Err(RuFeDiagError::InterpolationError(format!(
                "{method} interpolation needs at least three non-collinear source points"
            )));
        }
        Ok(Self {
            method,
            triangulation,
        })
    }

    #[must_use]
    pub fn method(&self) -> InterpolationMethod {
        self.method
    }

    /// Number of source points
    #[must_use]
    pub fn n_points(&self) -> usize {
        self.triangulation.points().len()
    }

    /// Interpolate one slice of source values onto `grid`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::AxisLengthMismatch`] unless there is one
    /// value per source point.
    pub fn interpolate_slice(&self, values: &[f64], grid: &TargetGrid) -> Result<Array2<f64>> {
        if values.len() != self.n_points() {
            return Err(RuFeDiagError::AxisLengthMismatch {
                operation: "interpolating a slice".to_string(),
                axis: "points".to_string(),
                left: self.n_points(),
                right: values.len(),
            });
        }

        let gradients = match self.method {
            InterpolationMethod::Cubic => {
                clough_tocher::vertex_gradients(&self.triangulation, values)
            }
            _ => Vec::new(),
        };

        Ok(Array2::from_shape_fn(grid.shape(), |(r, c)| {
            self.value_at([grid.lon[c], grid.lat[r]], values, &gradients)
        }))
    }

    fn value_at(&self, p: [f64; 2], values: &[f64], gradients: &[[f64; 2]]) -> f64 {
        let tri = &self.triangulation;
        match self.method {
            InterpolationMethod::Nearest => tri.nearest(p).map_or(f64::NAN, |i| values[i]),
            InterpolationMethod::Linear => tri.locate(p).map_or(f64::NAN, |loc| {
                let ids = tri.triangles()[loc.triangle];
                (0..3).map(|k| loc.barycentric[k] * values[ids[k]]).sum()
            }),
            InterpolationMethod::Cubic => tri.locate(p).map_or(f64::NAN, |loc| {
                let ids = tri.triangles()[loc.triangle];
                clough_tocher::evaluate(
                    tri.corners(loc.triangle),
                    ids.map(|i| values[i]),
                    ids.map(|i| gradients[i]),
                    loc.barycentric,
                )
            }),
        }
    }

    /// Interpolate every `(day, level)` slice of `field`
    ///
    /// `field` is `(days, levels, points)`; the result is
    /// `(days, rows, cols, levels)`. Wrap-around elements of a periodic
    /// channel must be removed beforehand with [`trim_points`].
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::AxisLengthMismatch`] if `field` does not have
    /// exactly one point per source coordinate.
    pub fn regrid(&self, field: ArrayView3<'_, f64>, grid: &TargetGrid) -> Result<Array4<f64>> {
        check_points(&field, self.n_points())?;
        let days = field.len_of(Axis(0));
        info!(
            "🗺️  Regridding {days} day(s) x {} level(s) with {} interpolation",
            field.len_of(Axis(1)),
            self.method
        );

        let per_day = (0..days)
            .map(|day| self.regrid_day(field.index_axis(Axis(0), day), grid))
            .collect::<Result<Vec<_>>>()?;
        Ok(stack_days(&per_day, grid, field.len_of(Axis(1))))
    }

    /// [`Regridder::regrid`] with days spread over a thread pool
    ///
    /// Days are interpolated independently and collected in day order. The
    /// first failing day aborts the run.
    ///
    /// # Errors
    ///
    /// As for [`Regridder::regrid`], plus thread pool errors.
    pub fn regrid_parallel(
        &self,
        field: ArrayView3<'_, f64>,
        grid: &TargetGrid,
        config: &ParallelConfig,
    ) -> Result<Array4<f64>> {
        check_points(&field, self.n_points())?;
        let (days, levels) = (field.len_of(Axis(0)), field.len_of(Axis(1)));
        info!(
            "🗺️  Regridding {days} day(s) x {levels} level(s) with {} interpolation on {} threads",
            self.method,
            config.current_threads()
        );

        let per_day = config.install(|| {
            (0..days)
                .into_par_iter()
                .map(|day| self.regrid_day(field.index_axis(Axis(0), day), grid))
                .collect::<Result<Vec<_>>>()
        })??;
        Ok(stack_days(&per_day, grid, levels))
    }

    /// One day `(levels, points)` → `(rows, cols, levels)`
    fn regrid_day(&self, day: ArrayView2<'_, f64>, grid: &TargetGrid) -> Result<Array3<f64>> {
        let (rows, cols) = grid.shape();
        let levels = day.len_of(Axis(0));
        let mut out = Array3::from_elem((rows, cols, levels), f64::NAN);

        for (level, values) in day.outer_iter().enumerate() {
            let slice = self.interpolate_slice(&values.to_vec(), grid)?;
            out.slice_mut(s![.., .., level]).assign(&slice);
        }
        debug!("Regridded one day of {levels} level(s)");
        Ok(out)
    }
}

/// Rebuild the interpolator for every `(day, level)` slice
///
/// Slower than [`Regridder::regrid`] but independent of any previous slice;
/// kept as the reference the cached variant is checked against.
///
/// # Errors
///
/// As for [`Regridder::new`] and [`Regridder::regrid`].
pub fn interpolate_to_grid_naive(
    field: ArrayView3<'_, f64>,
    xs: &[f64],
    ys: &[f64],
    grid: &TargetGrid,
    method: InterpolationMethod,
) -> Result<Array4<f64>> {
    check_points(&field, xs.len())?;
    let (days, levels, _) = field.dim();
    let (rows, cols) = grid.shape();
    let mut out = Array4::from_elem((days, rows, cols, levels), f64::NAN);

    for day in 0..days {
        for level in 0..levels {
            let values = field.slice(s![day, level, ..]).to_vec();
            let slice = Regridder::new(xs, ys, method)?.interpolate_slice(&values, grid)?;
            out.slice_mut(s![day, .., .., level]).assign(&slice);
        }
    }
    Ok(out)
}

/// Drop the last `n_dropped` points along the last axis
///
/// Periodic-channel element fields end with wrap-around elements whose
/// centroids are left out of the source coordinates; pass
/// [`PeriodicChannelTrim::dropped_elements`](crate::mesh::PeriodicChannelTrim).
///
/// # Errors
///
/// Returns [`RuFeDiagError::AxisLengthMismatch`] if the field has fewer than
/// `n_dropped` points.
pub fn trim_points(field: ArrayView3<'_, f64>, n_dropped: usize) -> Result<ArrayView3<'_, f64>> {
    let n_points = field.len_of(Axis(2));
    let kept = n_points.checked_sub(n_dropped).ok_or_else(|| RuFeDiagError::AxisLengthMismatch {
        operation: "trimming wrap-around points".to_string(),
        axis: "points".to_string(),
        left: n_dropped,
        right: n_points,
    })?;
    debug!("Dropping {n_dropped} trailing point(s) before regridding");
    Ok(field.slice_move(s![.., .., ..kept]))
}

fn check_points(field: &ArrayView3<'_, f64>, n_sources: usize) -> Result<()> {
    let n_points = field.len_of(Axis(2));
    if n_points != n_sources {
        return Err(RuFeDiagError::AxisLengthMismatch {
            operation: "regridding".to_string(),
            axis: "points".to_string(),
            left: n_sources,
            right: n_points,
        });
    }
    Ok(())
}

fn stack_days(per_day: &[Array3<f64>], grid: &TargetGrid, levels: usize) -> Array4<f64> {
    let (rows, cols) = grid.shape();
    let mut out = Array4::from_elem((per_day.len(), rows, cols, levels), f64::NAN);
    for (day, values) in per_day.iter().enumerate() {
        out.index_axis_mut(Axis(0), day).assign(values);
    }
    out
}
