//! Shared fixtures: synthetic FESOM-style output files and fields

#![allow(dead_code)]

use ndarray::{ArrayD, IxDyn};
use netcdf::create;
use ru_fe_diag::errors::Result;
use ru_fe_diag::field::{Dim, Field, LabeledAxis};
use std::path::Path;

/// Write one data variable plus the given coordinate variables
pub fn write_variable(
    path: &Path,
    var: &str,
    dims: &[(&str, usize)],
    coords: &[(&str, Vec<f64>)],
    values: Vec<f64>,
) -> Result<()> {
    let mut file = create(path)?;
    for (name, len) in dims {
        file.add_dimension(name, *len)?;
    }
    for (name, values) in coords {
        let mut coord = file.add_variable::<f64>(name, &[*name])?;
        coord.put(ndarray::ArrayView1::from(values.as_slice()), ..)?;
    }

    let shape: Vec<usize> = dims.iter().map(|(_, len)| *len).collect();
    let names: Vec<&str> = dims.iter().map(|(name, _)| *name).collect();
    let data = ArrayD::from_shape_vec(IxDyn(&shape), values)?;
    let mut data_var = file.add_variable::<f64>(var, &names)?;
    data_var.put(data.view(), ..)?;
    Ok(())
}

/// Write `fesom.mesh.diag.nc` with `elem_area(elem)` and `nod_area(nz, nod2)`
pub fn write_mesh_diag(dir: &Path, elem_area: &[f64], nod_area: &[f64], nz: usize) -> Result<()> {
    let mut file = create(dir.join("fesom.mesh.diag.nc"))?;
    file.add_dimension("elem", elem_area.len())?;
    file.add_dimension("nod2", nod_area.len())?;
    file.add_dimension("nz", nz)?;

    let mut elem = file.add_variable::<f64>("elem_area", &["elem"])?;
    elem.put(ndarray::ArrayView1::from(elem_area), ..)?;

    let layered: Vec<f64> = (0..nz).flat_map(|_| nod_area.iter().copied()).collect();
    let layered = ndarray::Array2::from_shape_vec((nz, nod_area.len()), layered)?;
    let mut nod = file.add_variable::<f64>("nod_area", &["nz", "nod2"])?;
    nod.put(layered.view(), ..)?;
    Ok(())
}

/// In-memory `(time, depth, horizontal)` field filled by `f(t, k, h)`
pub fn field3(
    name: &str,
    dims: [Dim; 3],
    depth_coords: Option<Vec<f64>>,
    shape: [usize; 3],
    f: impl Fn(usize, usize, usize) -> f64,
) -> Field {
    let data = ndarray::Array3::from_shape_fn((shape[0], shape[1], shape[2]), |(t, k, h)| f(t, k, h));
    let [time, depth, horizontal] = dims;
    let depth_axis = match depth_coords {
        Some(coords) => LabeledAxis::with_coords(depth, coords),
        None => LabeledAxis::new(depth),
    };
    Field::new(
        name,
        vec![LabeledAxis::new(time), depth_axis, LabeledAxis::new(horizontal)],
        data.into_dyn(),
    )
    .expect("valid synthetic field")
}

pub fn assert_close(actual: f64, expected: f64, tol: f64) {
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual} (tolerance {tol})"
    );
}
