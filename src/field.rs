//! Named-axis fields
//!
//! A [`Field`] is an `ArrayD<f64>` whose axes carry a [`Dim`] label and,
//! optionally, coordinate values. Every operation that combines or reduces
//! fields checks axis identity and length first and reports a named error
//! ([`RuFeDiagError::AxisNotFound`], [`RuFeDiagError::AxisMismatch`],
//! [`RuFeDiagError::AxisLengthMismatch`], [`RuFeDiagError::WeightLengthMismatch`])
//! instead of relying on broadcasting.
//!
//! Missing samples are NaN throughout.

use crate::errors::{Result, RuFeDiagError};
use crate::statistics::{NanReduction, Reduction};
use ndarray::{concatenate, ArrayD, ArrayView1, ArrayViewD, Axis, Ix1, Zip};
use std::fmt;

/// Axis identity of a FESOM field
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Dim {
    /// Output time steps
    Time,
    /// Layer interfaces (N levels)
    Nz,
    /// Layer mid-points (N − 1 levels)
    Nz1,
    /// Mesh vertices
    Nod2,
    /// Mesh triangles
    Elem,
    /// Any other dimension found in a file
    Other(String),
}

impl Dim {
    /// Map a NetCDF dimension name onto a [`Dim`]
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        match name {
            "time" => Self::Time,
            "nz" => Self::Nz,
            "nz1" => Self::Nz1,
            "nod2" => Self::Nod2,
            "elem" => Self::Elem,
            other => Self::Other(other.to_string()),
        }
    }

    /// NetCDF dimension name
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Time => "time",
            Self::Nz => "nz",
            Self::Nz1 => "nz1",
            Self::Nod2 => "nod2",
            Self::Elem => "elem",
            Self::Other(name) => name,
        }
    }

    /// True for the two vertical axes
    #[must_use]
    pub fn is_vertical(&self) -> bool {
        matches!(self, Self::Nz | Self::Nz1)
    }
}

impl fmt::Display for Dim {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One axis of a field: its identity and optional coordinate values
#[derive(Debug, Clone, PartialEq)]
pub struct LabeledAxis {
    pub dim: Dim,
    pub coords: Option<Vec<f64>>,
}

impl LabeledAxis {
    /// Axis without coordinate values
    #[must_use]
    pub fn new(dim: Dim) -> Self {
        Self { dim, coords: None }
    }

    /// Axis with coordinate values
    #[must_use]
    pub fn with_coords(dim: Dim, coords: Vec<f64>) -> Self {
        Self {
            dim,
            coords: Some(coords),
        }
    }
}

/// Labeled multi-dimensional array of `f64` samples
#[derive(Debug, Clone)]
pub struct Field {
    name: String,
    axes: Vec<LabeledAxis>,
    data: ArrayD<f64>,
}

impl Field {
    /// Create a field, checking that labels and coordinates fit the data
    ///
    /// # Errors
    ///
    /// Returns an error if the number of axes differs from the array rank,
    /// if two axes share a label, or if a coordinate vector has the wrong
    /// length.
    pub fn new(name: impl Into<String>, axes: Vec<LabeledAxis>, data: ArrayD<f64>) -> Result<Self> {
        let name = name.into();

        if axes.len() != data.ndim() {
            return Err(RuFeDiagError::AxisMismatch {
                operation: format!("building field '{name}'"),
                expected: axes.iter().map(|a| a.dim.name().to_string()).collect(),
                found: data.shape().iter().map(|n| format!("#{n}")).collect(),
            });
        }

        for (i, axis) in axes.iter().enumerate() {
            if axes[..i].iter().any(|other| other.dim == axis.dim) {
                return Err(RuFeDiagError::AxisMismatch {
                    operation: format!("building field '{name}'"),
                    expected: vec!["distinct axis labels".to_string()],
                    found: axes.iter().map(|a| a.dim.name().to_string()).collect(),
                });
            }
            if let Some(coords) = &axis.coords {
                if coords.len() != data.shape()[i] {
                    return Err(RuFeDiagError::AxisLengthMismatch {
                        operation: format!("coordinates of field '{name}'"),
                        axis: axis.dim.name().to_string(),
                        left: coords.len(),
                        right: data.shape()[i],
                    });
                }
            }
        }

        Ok(Self { name, axes, data })
    }

    /// Create a field from a flat, row-major vector of samples
    ///
    /// # Errors
    ///
    /// Returns an error if `values` does not fill `shape`, or for any reason
    /// listed on [`Field::new`].
    pub fn from_shape_vec(
        name: impl Into<String>,
        axes: Vec<LabeledAxis>,
        shape: Vec<usize>,
        values: Vec<f64>,
    ) -> Result<Self> {
        let data = ArrayD::from_shape_vec(shape, values)?;
        Self::new(name, axes, data)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Same field under another name
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn axes(&self) -> &[LabeledAxis] {
        &self.axes
    }

    #[must_use]
    pub fn data(&self) -> &ArrayD<f64> {
        &self.data
    }

    #[must_use]
    pub fn into_data(self) -> ArrayD<f64> {
        self.data
    }

    #[must_use]
    pub fn shape(&self) -> &[usize] {
        self.data.shape()
    }

    #[must_use]
    pub fn ndim(&self) -> usize {
        self.data.ndim()
    }

    /// Axis labels in storage order
    #[must_use]
    pub fn dims(&self) -> Vec<Dim> {
        self.axes.iter().map(|a| a.dim.clone()).collect()
    }

    /// Axis names in storage order
    #[must_use]
    pub fn dim_names(&self) -> Vec<String> {
        self.axes.iter().map(|a| a.dim.name().to_string()).collect()
    }

    #[must_use]
    pub fn has_axis(&self, dim: &Dim) -> bool {
        self.axes.iter().any(|a| &a.dim == dim)
    }

    /// Position of `dim` among the field's axes
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::AxisNotFound`] if the field lacks the axis.
    pub fn axis_index(&self, dim: &Dim) -> Result<usize> {
        self.axes
            .iter()
            .position(|a| &a.dim == dim)
            .ok_or_else(|| RuFeDiagError::AxisNotFound {
                field: self.name.clone(),
                axis: dim.name().to_string(),
            })
    }

    /// Length of axis `dim`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::AxisNotFound`] if the field lacks the axis.
    pub fn len_of(&self, dim: &Dim) -> Result<usize> {
        Ok(self.data.shape()[self.axis_index(dim)?])
    }

    /// Coordinate values of axis `dim`, if any
    #[must_use]
    pub fn coords(&self, dim: &Dim) -> Option<&[f64]> {
        self.axes
            .iter()
            .find(|a| &a.dim == dim)
            .and_then(|a| a.coords.as_deref())
    }

    /// Samples of a one-axis field
    ///
    /// # Errors
    ///
    /// Returns an error if the field has more than one axis.
    pub fn values_1d(&self) -> Result<ArrayView1<'_, f64>> {
        Ok(self.data.view().into_dimensionality::<Ix1>()?)
    }

    /// Require exactly the axes in `expected`, in any order
    ///
    /// # Errors
    ///
    /// [`RuFeDiagError::AxisNotFound`] for the first missing axis, or
    /// [`RuFeDiagError::AxisMismatch`] if the field carries extra axes.
    pub fn expect_dims(&self, operation: &str, expected: &[Dim]) -> Result<()> {
        for dim in expected {
            self.axis_index(dim)?;
        }
        if self.ndim() != expected.len() {
            return Err(RuFeDiagError::AxisMismatch {
                operation: format!("{operation} ('{}')", self.name),
                expected: expected.iter().map(|d| d.name().to_string()).collect(),
                found: self.dim_names(),
            });
        }
        Ok(())
    }

    /// Reorder axes to `order`, which must name exactly the field's axes
    ///
    /// # Errors
    ///
    /// Returns an error if `order` is not a permutation of the field's axes.
    pub fn transposed(&self, order: &[Dim]) -> Result<Field> {
        self.expect_dims("transpose", order)?;

        let perm = order
            .iter()
            .map(|d| self.axis_index(d))
            .collect::<Result<Vec<_>>>()?;

        if perm.iter().enumerate().all(|(i, &p)| i == p) {
            return Ok(self.clone());
        }

        let data = self
            .data
            .view()
            .permuted_axes(perm.as_slice())
            .as_standard_layout()
            .into_owned();
        let axes = perm.iter().map(|&p| self.axes[p].clone()).collect();

        Ok(Field {
            name: self.name.clone(),
            axes,
            data,
        })
    }

    /// Mean over `dim`, skipping missing samples
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::AxisNotFound`] if the field lacks the axis.
    pub fn mean_over(&self, dim: &Dim) -> Result<Field> {
        let idx = self.axis_index(dim)?;
        let data = self.data.reduce_along_axis(idx, Reduction::Mean)?;
        Ok(self.without_axis(idx, data))
    }

    /// Weighted mean over `dim`, skipping missing samples
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::WeightLengthMismatch`] unless `weights` has one
    /// entry per position along `dim`.
    pub fn weighted_mean_over(&self, dim: &Dim, weights: &[f64]) -> Result<Field> {
        let idx = self.axis_index(dim)?;
        let axis_len = self.data.shape()[idx];
        if weights.len() != axis_len {
            return Err(RuFeDiagError::WeightLengthMismatch {
                axis: dim.name().to_string(),
                weights: weights.len(),
                axis_len,
            });
        }
        let data = self
            .data
            .reduce_along_axis(idx, Reduction::WeightedMean(weights))?;
        Ok(self.without_axis(idx, data))
    }

    /// Departure from the mean over `dim`, same shape as `self`
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::AxisNotFound`] if the field lacks the axis.
    pub fn anomaly(&self, dim: &Dim) -> Result<Field> {
        let idx = self.axis_index(dim)?;
        let mean = self
            .data
            .reduce_along_axis(idx, Reduction::Mean)?
            .insert_axis(Axis(idx));
        let data = &self.data - &mean;
        Ok(Field {
            name: self.name.clone(),
            axes: self.axes.clone(),
            data,
        })
    }

    /// Apply `f` to every sample
    #[must_use]
    pub fn map(&self, f: impl Fn(f64) -> f64) -> Field {
        Field {
            name: self.name.clone(),
            axes: self.axes.clone(),
            data: self.data.mapv(f),
        }
    }

    /// Combine two fields sample by sample
    ///
    /// `other` may store its axes in a different order; it is transposed to
    /// `self`'s order first. The result keeps `self`'s labels and coordinates.
    ///
    /// # Errors
    ///
    /// Returns an error if the two fields do not have the same axes, or if
    /// an axis has different lengths on the two sides.
    pub fn zip_with(
        &self,
        other: &Field,
        operation: &str,
        f: impl Fn(f64, f64) -> f64 + Sync + Send,
    ) -> Result<Field> {
        let dims = self.dims();
        if other.ndim() != dims.len() || dims.iter().any(|d| !other.has_axis(d)) {
            return Err(RuFeDiagError::AxisMismatch {
                operation: format!("{operation} ('{}' with '{}')", self.name, other.name),
                expected: self.dim_names(),
                found: other.dim_names(),
            });
        }

        let other = other.transposed(&dims)?;
        for (axis, (&left, &right)) in dims.iter().zip(self.shape().iter().zip(other.shape())) {
            if left != right {
                return Err(RuFeDiagError::AxisLengthMismatch {
                    operation: operation.to_string(),
                    axis: axis.name().to_string(),
                    left,
                    right,
                });
            }
        }

        let data = Zip::from(&self.data)
            .and(&other.data)
            .par_map_collect(|&a, &b| f(a, b));

        Ok(Field {
            name: self.name.clone(),
            axes: self.axes.clone(),
            data,
        })
    }

    /// Relabel axis `from` as `to`, keeping samples and coordinates
    ///
    /// # Errors
    ///
    /// Returns an error if `from` is missing or `to` is already used by
    /// another axis.
    pub fn rename_axis(mut self, from: &Dim, to: Dim) -> Result<Field> {
        let idx = self.axis_index(from)?;
        if from != &to && self.has_axis(&to) {
            return Err(RuFeDiagError::AxisMismatch {
                operation: format!("renaming '{from}' to '{to}' in '{}'", self.name),
                expected: vec![format!("no existing '{to}' axis")],
                found: self.dim_names(),
            });
        }
        self.axes[idx].dim = to;
        Ok(self)
    }

    /// Linear interpolation along `dim` onto new coordinate values
    ///
    /// Targets outside the source coordinate range produce NaN. A target equal
    /// to a source coordinate reproduces that sample exactly. The resulting
    /// axis keeps the label `dim` and carries `targets` as coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::CoordinateNotFound`] if the field has no
    /// coordinate values along `dim`.
    pub fn interp_axis(&self, dim: &Dim, targets: &[f64]) -> Result<Field> {
        let idx = self.axis_index(dim)?;
        let source = self
            .coords(dim)
            .ok_or_else(|| RuFeDiagError::CoordinateNotFound {
                field: self.name.clone(),
                axis: dim.name().to_string(),
            })?;

        let stencils: Vec<Option<Stencil>> =
            targets.iter().map(|&t| Stencil::locate(source, t)).collect();

        let mut shape = self.shape().to_vec();
        shape[idx] = targets.len();
        let mut data = ArrayD::from_elem(shape, f64::NAN);

        Zip::from(data.lanes_mut(Axis(idx)))
            .and(self.data.lanes(Axis(idx)))
            .par_for_each(|mut out, lane| {
                for (o, stencil) in out.iter_mut().zip(&stencils) {
                    if let Some(s) = stencil {
                        *o = s.apply(&lane);
                    }
                }
            });

        let mut axes = self.axes.clone();
        axes[idx].coords = Some(targets.to_vec());

        Ok(Field {
            name: self.name.clone(),
            axes,
            data,
        })
    }

    /// Pick one position along `dim`, dropping that axis
    ///
    /// # Errors
    ///
    /// Returns an error if the axis is missing or `index` is out of range.
    pub fn select(&self, dim: &Dim, index: usize) -> Result<Field> {
        let idx = self.axis_index(dim)?;
        let len = self.data.shape()[idx];
        if index >= len {
            return Err(RuFeDiagError::Generic(format!(
                "Index {index} is out of range for axis '{dim}' of length {len} in '{}'",
                self.name
            )));
        }
        let data = self.data.index_axis(Axis(idx), index).to_owned();
        Ok(self.without_axis(idx, data))
    }

    /// Replace samples matching `predicate` with NaN
    #[must_use]
    pub fn mask_where(self, predicate: impl Fn(f64) -> bool) -> Field {
        let data = self.data.mapv(|x| if predicate(x) { f64::NAN } else { x });
        Field { data, ..self }
    }

    /// Join fields along `dim`
    ///
    /// All fields must have the same axes in the same order, with equal
    /// lengths on every axis but `dim`. Coordinates along `dim` are joined
    /// when every piece has them.
    ///
    /// # Errors
    ///
    /// Returns an error if `fields` is empty or the pieces disagree.
    pub fn concat(fields: &[Field], dim: &Dim) -> Result<Field> {
        let first = fields
            .first()
            .ok_or_else(|| RuFeDiagError::Generic("Cannot concatenate zero fields".to_string()))?;
        let idx = first.axis_index(dim)?;

        for piece in &fields[1..] {
            if piece.dims() != first.dims() {
                return Err(RuFeDiagError::AxisMismatch {
                    operation: format!("concatenating '{}' along '{dim}'", first.name),
                    expected: first.dim_names(),
                    found: piece.dim_names(),
                });
            }
            for (i, axis) in first.axes.iter().enumerate() {
                if i != idx && first.shape()[i] != piece.shape()[i] {
                    return Err(RuFeDiagError::AxisLengthMismatch {
                        operation: format!("concatenating '{}' along '{dim}'", first.name),
                        axis: axis.dim.name().to_string(),
                        left: first.shape()[i],
                        right: piece.shape()[i],
                    });
                }
            }
        }

        let views: Vec<ArrayViewD<'_, f64>> = fields.iter().map(|f| f.data.view()).collect();
        let data = concatenate(Axis(idx), &views)?;

        let coords = fields
            .iter()
            .map(|f| f.axes[idx].coords.clone())
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.concat());

        let mut axes = first.axes.clone();
        axes[idx].coords = coords;

        Ok(Field {
            name: first.name.clone(),
            axes,
            data,
        })
    }

    fn without_axis(&self, idx: usize, data: ArrayD<f64>) -> Field {
        let mut axes = self.axes.clone();
        axes.remove(idx);
        Field {
            name: self.name.clone(),
            axes,
            data,
        }
    }
}

/// Two-point linear stencil for one interpolation target
#[derive(Debug, Clone, Copy)]
struct Stencil {
    lo: usize,
    hi: usize,
    frac: f64,
}

impl Stencil {
    /// Bracket `target` within `coords`, which may increase or decrease
    fn locate(coords: &[f64], target: f64) -> Option<Stencil> {
        if target.is_nan() {
            return None;
        }

        let mut order: Vec<usize> = (0..coords.len()).collect();
        order.sort_by(|&a, &b| coords[a].total_cmp(&coords[b]));

        let first = *order.first()?;
        let last = *order.last()?;
        if target < coords[first] || target > coords[last] {
            return None;
        }

        if let Some(&exact) = order.iter().find(|&&i| coords[i] == target) {
            return Some(Stencil {
                lo: exact,
                hi: exact,
                frac: 0.0,
            });
        }

        order.windows(2).find_map(|pair| {
            let (lo, hi) = (pair[0], pair[1]);
            (coords[lo] < target && target < coords[hi]).then(|| Stencil {
                lo,
                hi,
                frac: (target - coords[lo]) / (coords[hi] - coords[lo]),
            })
        })
    }

    fn apply(&self, lane: &ArrayView1<'_, f64>) -> f64 {
        if self.frac == 0.0 {
            lane[self.lo]
        } else {
            (1.0 - self.frac) * lane[self.lo] + self.frac * lane[self.hi]
        }
    }
}
