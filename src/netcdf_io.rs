//! NetCDF reading into [`Field`]s and writing of result files
//!
//! Reading decodes `_FillValue` into NaN and attaches coordinate variables
//! (1-D variables named like their dimension) to the matching axes. Writing
//! goes through [`NetCDFWriter`], which applies the caller's
//! [`OverwritePolicy`] before touching the destination.

use crate::config::OverwritePolicy;
use crate::errors::{Result, RuFeDiagError};
use crate::field::{Dim, Field, LabeledAxis};
use chrono::Utc;
use ndarray::{ArrayD, ArrayView1};
use netcdf::{create, AttributeValue, File, FileMut, Variable, VariableMut};
use std::collections::HashMap;
use std::{fs, path::Path};

/// Names of the data variables in a file
///
/// A data variable is any variable whose name is not also a dimension name;
/// those are coordinate variables.
#[must_use]
pub fn data_variable_names(file: &File) -> Vec<String> {
    let dim_names: Vec<String> = file.dimensions().map(|d| d.name().to_string()).collect();

    let mut names: Vec<String> = file
        .variables()
        .map(|v| v.name().to_string())
        .filter(|name| !dim_names.contains(name))
        .collect();
    names.sort();
    names
}

/// Reads a variable as a [`Field`] of `f64`, fill values decoded to NaN
///
/// # Errors
///
/// Returns an error if the variable is missing or cannot be read.
pub fn read_field(file: &File, var_name: &str) -> Result<Field> {
    let var = file
        .variable(var_name)
        .ok_or_else(|| RuFeDiagError::VariableNotFound {
            var: var_name.to_string(),
        })?;

    let shape: Vec<usize> = var
        .dimensions()
        .iter()
        .map(netcdf::Dimension::len)
        .collect();

    let axes: Vec<LabeledAxis> = var
        .dimensions()
        .iter()
        .map(|d| {
            let name = d.name().to_string();
            let coords = if name == var_name {
                None
            } else {
                read_coordinate(file, &name, d.len())
            };
            LabeledAxis {
                dim: Dim::from_name(&name),
                coords,
            }
        })
        .collect();

    let mut values = var.get_values::<f64, _>(..)?;
    if let Some(fill) = fill_value(&var) {
        for value in values.iter_mut().filter(|v| **v == fill) {
            *value = f64::NAN;
        }
    }

    log::debug!("Read '{var_name}' with shape {shape:?}");
    let data = ArrayD::from_shape_vec(shape, values)?;
    Field::new(var_name, axes, data)
}

/// Values of the coordinate variable for dimension `dim_name`, if present
fn read_coordinate(file: &File, dim_name: &str, len: usize) -> Option<Vec<f64>> {
    let var = file.variable(dim_name)?;
    if var.dimensions().len() != 1 || var.dimensions()[0].name() != dim_name {
        return None;
    }
    let values = var.get_values::<f64, _>(..).ok()?;
    (values.len() == len).then_some(values)
}

fn fill_value(var: &Variable<'_>) -> Option<f64> {
    var.attribute("_FillValue")
        .and_then(|attr| match attr.value().ok()? {
            AttributeValue::Float(v) => Some(f64::from(v)),
            AttributeValue::Double(v) => Some(v),
            AttributeValue::Short(v) => Some(f64::from(v)),
            AttributeValue::Int(v) => Some(f64::from(v)),
            _ => None,
        })
}

/// Writer for fields sharing one set of dimensions
pub struct NetCDFWriter<'a> {
    output_path: &'a Path,
    policy: OverwritePolicy,
}

impl<'a> NetCDFWriter<'a> {
    /// Create a new NetCDF writer
    #[must_use]
    pub fn new(output_path: &'a Path, policy: OverwritePolicy) -> Self {
        Self {
            output_path,
            policy,
        }
    }

    /// Write `fields` into a fresh file
    ///
    /// Each distinct axis becomes one dimension; axes with coordinates also
    /// get a coordinate variable. `decorate` is called once per data variable
    /// to attach attributes. A global `history` attribute is always added.
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::OutputExists`] when the file exists and the
    /// policy is [`OverwritePolicy::Fail`], [`RuFeDiagError::AxisLengthMismatch`]
    /// when two fields disagree on a shared axis, or any NetCDF error.
    pub fn write_fields<F>(&self, fields: &[&Field], mut decorate: F) -> Result<()>
    where
        F: FnMut(&str, &mut VariableMut<'_>) -> Result<()>,
    {
        let dims = collect_dimensions(fields)?;
        let mut file = self.create_file()?;

        for (name, (len, _)) in &dims {
            file.add_dimension(name, *len)?;
        }

        for (name, (_, coords)) in &dims {
            if let Some(coords) = coords {
                let mut var = file.add_variable::<f64>(name, &[name.as_str()])?;
                var.put(ArrayView1::from(coords.as_slice()), ..)?;
            }
        }

        for field in fields {
            let dim_names = field.dim_names();
            let dim_refs: Vec<&str> = dim_names.iter().map(String::as_str).collect();
            let mut var = file.add_variable::<f64>(field.name(), &dim_refs)?;
            var.put_attribute("_FillValue", f64::NAN)?;
            decorate(field.name(), &mut var)?;
            var.put(field.data().view(), ..)?;
        }

        file.add_attribute(
            "history",
            format!("Created by RuFeDiag on {}", Utc::now().to_rfc3339()),
        )?;

        log::info!("✅ Wrote {} variable(s) to {}", fields.len(), self.output_path.display());
        Ok(())
    }

    fn create_file(&self) -> Result<FileMut> {
        self.policy.check(self.output_path)?;

        if let Some(parent) = self.output_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        if self.output_path.exists() {
            fs::remove_file(self.output_path)?;
        }

        Ok(create(self.output_path)?)
    }
}

/// Dimension name → (length, coordinates), in first-seen order
fn collect_dimensions(fields: &[&Field]) -> Result<Vec<(String, (usize, Option<Vec<f64>>))>> {
    let mut order: Vec<String> = Vec::new();
    let mut dims: HashMap<String, (usize, Option<Vec<f64>>)> = HashMap::new();

    for field in fields {
        for (axis, &len) in field.axes().iter().zip(field.shape()) {
            let name = axis.dim.name().to_string();
            match dims.get_mut(&name) {
                Some((known, coords)) => {
                    if *known != len {
                        return Err(RuFeDiagError::AxisLengthMismatch {
                            operation: format!("writing '{}'", field.name()),
                            axis: name,
                            left: *known,
                            right: len,
                        });
                    }
                    if coords.is_none() {
                        coords.clone_from(&axis.coords);
                    }
                }
                None => {
                    order.push(name.clone());
                    dims.insert(name, (len, axis.coords.clone()));
                }
            }
        }
    }

    Ok(order
        .into_iter()
        .filter_map(|name| dims.remove(&name).map(|entry| (name, entry)))
        .collect())
}
