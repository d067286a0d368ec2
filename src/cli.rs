//! Defines command-line interface options using `clap` for the RuFeDiag application.

use crate::config::{OverwritePolicy, RunConfig};
use crate::errors::Result;
use crate::gridding::{InterpolationMethod, TargetGrid};
use crate::loader::{LoadOptions, YearRange};
use crate::meshgen::{ChannelCorners, ChannelMeshBuilder};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Diagnostics and mesh tooling for FESOM2 periodic-channel runs
#[derive(Parser, Debug)]
#[command(
    author = "Sam Green",
    version,
    name = "RuFeDiag",
    about = "Vertical turbulence diagnostics, regridding and mesh tooling for FESOM2 output"
)]
pub struct Args {
    /// Enable verbose output.
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Number of threads to use for parallel processing. Defaults to number of CPU cores.
    #[arg(short = 't', long, global = true)]
    pub threads: Option<usize>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Compute the eke, w_rms and buoy_flux profiles of a run
    Profiles(ProfilesArgs),
    /// Interpolate one variable onto a regular lon/lat grid
    Regrid(RegridArgs),
    /// Generate the rotated periodic-channel mesh files
    GenerateMesh(GenerateMeshArgs),
    /// Print node and element counts of a mesh
    MeshInfo(MeshInfoArgs),
}

#[derive(clap::Args, Debug)]
pub struct ProfilesArgs {
    /// Results directory with the yearly output files and fesom.mesh.diag.nc
    #[arg(short, long, required_unless_present = "config")]
    pub results: Option<PathBuf>,

    /// JSON run configuration; flags given on the command line override it
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to save the profiles as NetCDF. If not set, prints JSON to the terminal.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// First year to load
    #[arg(long)]
    pub year_1: Option<i32>,

    /// Last year to load
    #[arg(long)]
    pub year_f: Option<i32>,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,

    /// Keep exact zeros instead of treating them as land
    #[arg(long)]
    pub keep_zeros: bool,

    /// Thermal expansion coefficient
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Reference density
    #[arg(long)]
    pub density_0: Option<f64>,

    /// Reference temperature
    #[arg(long)]
    pub temp_0: Option<f64>,
}

impl ProfilesArgs {
    /// Merge the flags with the optional JSON configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file cannot be read, or if
    /// neither it nor `--results` names a results directory.
    pub fn into_run_config(self) -> Result<RunConfig> {
        let mut config = match (&self.config, &self.results) {
            (Some(path), _) => RunConfig::from_json_file(path)?,
            (None, Some(results)) => RunConfig::new(results),
            (None, None) => {
                return Err(crate::errors::RuFeDiagError::InvalidConfig {
                    message: "either --results or --config is required".to_string(),
                })
            }
        };

        if let Some(results) = self.results {
            config.results_path = results;
        }
        if self.output.is_some() {
            config.output_path = self.output;
        }
        if self.year_1.is_some() {
            config.year_1 = self.year_1;
        }
        if self.year_f.is_some() {
            config.year_f = self.year_f;
        }
        if self.overwrite {
            config.overwrite = OverwritePolicy::Overwrite;
        }
        if self.keep_zeros {
            config.mask_zeros = false;
        }
        if let Some(alpha) = self.alpha {
            config.buoyancy.alpha = alpha;
        }
        if let Some(density_0) = self.density_0 {
            config.buoyancy.density_0 = density_0;
        }
        if let Some(temp_0) = self.temp_0 {
            config.buoyancy.temp_0 = temp_0;
        }
        Ok(config)
    }
}

#[derive(clap::Args, Debug)]
pub struct RegridArgs {
    /// Results directory with the yearly output files
    #[arg(short, long)]
    pub results: PathBuf,

    /// Directory holding nod2d.out and elem2d.out
    #[arg(short, long)]
    pub mesh: PathBuf,

    /// Variable to regrid
    #[arg(long)]
    pub var: String,

    /// Interpolation method: nearest, linear or cubic
    #[arg(long, default_value = "linear", value_parser = parse_method)]
    pub method: InterpolationMethod,

    /// Target longitudes, formatted as <min>:<max>:<count>
    #[arg(long, value_parser = parse_grid_axis)]
    pub lon: (f64, f64, usize),

    /// Target latitudes, formatted as <min>:<max>:<count>
    #[arg(long, value_parser = parse_grid_axis)]
    pub lat: (f64, f64, usize),

    /// Drop the wrap-around elements of a periodic channel mesh
    #[arg(long)]
    pub soufflet: bool,

    /// First year to load
    #[arg(long)]
    pub year_1: Option<i32>,

    /// Last year to load
    #[arg(long)]
    pub year_f: Option<i32>,

    /// Keep exact zeros instead of treating them as land
    #[arg(long)]
    pub keep_zeros: bool,

    /// Path to save the regridded variable as NetCDF
    #[arg(short, long)]
    pub output: PathBuf,

    /// Replace the output file if it exists
    #[arg(long)]
    pub overwrite: bool,
}

impl RegridArgs {
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            years: YearRange::new(self.year_1, self.year_f),
            mask_zeros: !self.keep_zeros,
        }
    }

    /// # Errors
    ///
    /// Returns an error if either axis is empty.
    pub fn target_grid(&self) -> Result<TargetGrid> {
        TargetGrid::linspace(self.lon, self.lat)
    }
}

#[derive(clap::Args, Debug)]
pub struct GenerateMeshArgs {
    /// Directory to write nod2d.out, elem2d.out and aux3d.out into
    #[arg(short, long)]
    pub output: PathBuf,

    /// Length of the triangle legs, in degrees
    #[arg(long, default_value_t = 0.2)]
    pub dx: f64,

    /// Western corner, formatted as <x>,<y>
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub left: Option<[f64; 2]>,

    /// Southern corner, formatted as <x>,<y>
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub bottom: Option<[f64; 2]>,

    /// Eastern corner, formatted as <x>,<y>
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub right: Option<[f64; 2]>,

    /// Northern corner, formatted as <x>,<y>
    #[arg(long, value_parser = parse_point, allow_hyphen_values = true)]
    pub top: Option<[f64; 2]>,

    /// Replace existing mesh files
    #[arg(long)]
    pub overwrite: bool,
}

impl GenerateMeshArgs {
    #[must_use]
    pub fn builder(&self) -> ChannelMeshBuilder {
        let defaults = ChannelCorners::default();
        let corners = ChannelCorners {
            left: self.left.unwrap_or(defaults.left),
            bottom: self.bottom.unwrap_or(defaults.bottom),
            right: self.right.unwrap_or(defaults.right),
            top: self.top.unwrap_or(defaults.top),
        };
        ChannelMeshBuilder::new().corners(corners).dx(self.dx)
    }
}

#[derive(clap::Args, Debug)]
pub struct MeshInfoArgs {
    /// Directory holding nod2d.out and elem2d.out
    #[arg(short, long)]
    pub mesh: PathBuf,

    /// Also report the periodic-channel trim
    #[arg(long)]
    pub soufflet: bool,
}

/// Converts a boolean flag into an [`OverwritePolicy`]
#[must_use]
pub fn overwrite_policy(overwrite: bool) -> OverwritePolicy {
    if overwrite {
        OverwritePolicy::Overwrite
    } else {
        OverwritePolicy::Fail
    }
}

pub fn parse_method(s: &str) -> std::result::Result<InterpolationMethod, String> {
    s.parse::<InterpolationMethod>().map_err(|e| e.to_string())
}

pub fn parse_grid_axis(s: &str) -> std::result::Result<(f64, f64, usize), String> {
    let parts: Vec<&str> = s.split(':').collect();
    match parts.as_slice() {
        [min, max, n] => {
            let min = min
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid minimum '{min}'"))?;
            let max = max
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid maximum '{max}'"))?;
            let n = n
                .trim()
                .parse::<usize>()
                .map_err(|_| format!("Invalid point count '{n}'"))?;
            if n == 0 {
                return Err("Point count must be at least 1".to_string());
            }
            Ok((min, max, n))
        }
        _ => Err("Invalid format: Expected '<min>:<max>:<count>'.".to_string()),
    }
}

pub fn parse_point(s: &str) -> std::result::Result<[f64; 2], String> {
    let parts: Vec<&str> = s.split(',').collect();
    match parts.as_slice() {
        [x, y] => {
            let x = x
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid x coordinate '{x}'"))?;
            let y = y
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("Invalid y coordinate '{y}'"))?;
            Ok([x, y])
        }
        _ => Err("Invalid format: Expected '<x>,<y>'.".to_string()),
    }
}
