//! End-to-end runs: profile diagnostics and regridding
//!
//! Fields are loaded in stages and dropped as soon as their diagnostic is
//! done, so at most two full `(time, depth, horizontal)` variables are held
//! at once.

use crate::bundle::DiagnosticsBundle;
use crate::config::{OverwritePolicy, RunConfig};
use crate::diagnostics::{mean_buoyancy_flux, mean_eke, rms_vertical_velocity};
use crate::errors::{Result, RuFeDiagError};
use crate::field::{Dim, Field, LabeledAxis};
use crate::gridding::{trim_points, InterpolationMethod, Regridder, TargetGrid};
use crate::loader::{load_variable, LoadOptions};
use crate::mesh::{Mesh2D, PeriodicChannelTrim};
use crate::mesh_diag::MeshDiagnostics;
use crate::netcdf_io::NetCDFWriter;
use crate::parallel::ParallelConfig;
use log::info;
use ndarray::{Axis, Ix3};
use std::path::PathBuf;

/// Compute `eke`, `w_rms` and `buoy_flux` for the run in `config`
///
/// # Errors
///
/// Returns the first loading, axis or NetCDF error encountered.
pub fn vertical_diagnostics_all(config: &RunConfig) -> Result<DiagnosticsBundle> {
    let dir = config.results_path.as_path();
    let options = config.load_options();

    let weights = MeshDiagnostics::open(dir)?.area_weights()?;

    let u = load_variable(dir, "u", &options)?;
    let v = load_variable(dir, "v", &options)?;
    info!("Computing eke...");
    let eke = mean_eke(&u, &v, &weights.elem_area)?;
    drop((u, v));

    let temp = load_variable(dir, "temp", &options)?;
    let w = load_variable(dir, "w", &options)?;
    info!("Computing buoy_flux...");
    let buoy_flux = mean_buoyancy_flux(&w, &temp, &weights.nod_area, &config.buoyancy)?;
    drop(temp);

    info!("Computing w_rms...");
    let w_rms = rms_vertical_velocity(&w, &weights.nod_area)?;
    drop(w);

    DiagnosticsBundle::new(eke, w_rms, buoy_flux, config.buoyancy)
}

/// Validate `config`, compute the profiles and save or print them
///
/// Without an output path the bundle is printed as JSON on stdout.
///
/// # Errors
///
/// Returns configuration errors before any file is opened, then anything
/// [`vertical_diagnostics_all`] or the writer reports.
pub fn run_profiles(config: &RunConfig) -> Result<DiagnosticsBundle> {
    config.validate()?;
    let bundle = vertical_diagnostics_all(config)?;

    match &config.output_path {
        Some(path) => {
            info!("Saving results to {}", path.display());
            bundle.write_netcdf(path, config.overwrite)?;
        }
        None => println!("{:#}", bundle.to_json()),
    }
    Ok(bundle)
}

/// Inputs of a regridding run
#[derive(Debug, Clone)]
pub struct RegridRequest {
    pub results_path: PathBuf,
    /// Directory holding `nod2d.out` and `elem2d.out`
    pub mesh_path: PathBuf,
    pub variable: String,
    pub load: LoadOptions,
    /// Drop the periodic channel's wrap-around elements
    pub soufflet: bool,
    pub method: InterpolationMethod,
    pub grid: TargetGrid,
    pub output_path: PathBuf,
    pub overwrite: OverwritePolicy,
    pub parallel: ParallelConfig,
}

/// Regrid one variable onto a regular grid and write it out
///
/// The output variable has axes `(time, lat, lon, <depth>)`.
///
/// # Errors
///
/// - [`RuFeDiagError::AxisLengthMismatch`] if the horizontal axis does not
///   have one point per mesh node or element. With `soufflet`, element fields
///   must cover the full mesh including its wrap-around elements.
/// - any error if the variable is not `(time, depth, nod2|elem)` or an I/O
///   step fails
pub fn regrid_variable(request: &RegridRequest) -> Result<Field> {
    request.overwrite.check(&request.output_path)?;

    let field = load_variable(&request.results_path, &request.variable, &request.load)?;
    let mesh = Mesh2D::read(&request.mesh_path)?;
    let coords = mesh.coordinates(request.soufflet)?;

    let horizontal = if field.has_axis(&Dim::Elem) {
        Dim::Elem
    } else {
        Dim::Nod2
    };
    let depth = if field.has_axis(&Dim::Nz1) {
        Dim::Nz1
    } else {
        Dim::Nz
    };
    let (xs, ys) = match horizontal {
        Dim::Elem => (coords.lon_elems, coords.lat_elems),
        _ => (coords.lon_nodes, coords.lat_nodes),
    };

    let ordered = field.transposed(&[Dim::Time, depth.clone(), horizontal.clone()])?;
    let time_coords = ordered.coords(&Dim::Time).map(<[f64]>::to_vec);
    let depth_coords = ordered.coords(&depth).map(<[f64]>::to_vec);
    let data = ordered.into_data().into_dimensionality::<Ix3>()?;

    // Only element fields of a periodic channel carry wrap-around points
    let points = if horizontal == Dim::Elem && request.soufflet {
        let trim = PeriodicChannelTrim::from_mesh(&mesh)?;
        if data.len_of(Axis(2)) != mesh.elements.len() {
            return Err(RuFeDiagError::AxisLengthMismatch {
                operation: "matching the field to the mesh".to_string(),
                axis: Dim::Elem.name().to_string(),
                left: mesh.elements.len(),
                right: data.len_of(Axis(2)),
            });
        }
        trim_points(data.view(), trim.dropped_elements)?
    } else {
        data.view()
    };

    let regridder = Regridder::new(&xs, &ys, request.method)?;
    let gridded = regridder.regrid_parallel(points, &request.grid, &request.parallel)?;

    let axes = vec![
        axis_with(Dim::Time, time_coords),
        LabeledAxis::with_coords(Dim::Other("lat".to_string()), request.grid.lat().to_vec()),
        LabeledAxis::with_coords(Dim::Other("lon".to_string()), request.grid.lon().to_vec()),
        axis_with(depth, depth_coords),
    ];
    let result = Field::new(request.variable.clone(), axes, gridded.into_dyn())?;

    let method = request.method;
    NetCDFWriter::new(&request.output_path, request.overwrite).write_fields(&[&result], |_, var| {
        var.put_attribute("interpolation", method.as_str())?;
        var.put_attribute("source_mesh", request.mesh_path.display().to_string())?;
        Ok(())
    })?;

    Ok(result)
}

fn axis_with(dim: Dim, coords: Option<Vec<f64>>) -> LabeledAxis {
    match coords {
        Some(coords) => LabeledAxis::with_coords(dim, coords),
        None => LabeledAxis::new(dim),
    }
}
