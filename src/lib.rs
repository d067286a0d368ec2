//! RuFeDiag: vertical turbulence diagnostics for FESOM2 periodic-channel runs
//!
//! A Rust library for post-processing unstructured-mesh ocean model output.
//! RuFeDiag loads yearly output chunks into named-axis fields, reduces them to
//! depth profiles of eddy kinetic energy, RMS vertical velocity and turbulent
//! buoyancy flux, regrids fields onto regular lon/lat grids, and reads and
//! writes the ASCII mesh files of the model.
//!
//! ## Key Features
//!
//! - **Named axes**: every combination of fields checks axis identity and
//!   length; `nz` and `nz1` are never confused
//! - **Missing-value aware reductions**: NaN-skipping weighted means, computed
//!   in parallel with Rayon
//! - **Regridding**: nearest, linear and Clough–Tocher cubic interpolation on a
//!   cached Delaunay triangulation
//! - **Mesh tooling**: `nod2d.out` / `elem2d.out` / `aux3d.out` I/O and a
//!   periodic-channel mesh generator
//!
//! ## Module Organization
//!
//! - [`field`]: the named-axis [`field::Field`] container
//! - [`loader`]: discovery and loading of `<var>.*.<year>.nc` chunks
//! - [`mesh_diag`]: access to `fesom.mesh.diag.nc`
//! - [`diagnostics`]: the three profile diagnostics
//! - [`bundle`]: the profiles of one run and their NetCDF / JSON output
//! - [`pipeline`]: end-to-end profile and regridding runs
//! - [`gridding`]: scattered-data interpolation onto regular grids
//! - [`mesh`], [`meshgen`]: mesh files and mesh generation
//! - [`statistics`]: NaN-aware parallel axis reductions
//! - [`netcdf_io`]: NetCDF reading and writing
//! - [`config`], [`parallel`], [`logging`], [`errors`]: ambient plumbing
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use ru_fe_diag::prelude::*;
//!
//! let mut config = RunConfig::new("/work/results/souff_20/");
//! config.year_1 = Some(1902);
//! config.output_path = Some("profile_diags.nc".into());
//!
//! let bundle = run_profiles(&config).unwrap();
//! println!("{:?}", bundle.eke().data());
//! ```

// Core modules
pub mod bundle;
pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod errors;
pub mod field;
pub mod gridding;
pub mod loader;
pub mod logging;
pub mod mesh;
pub mod mesh_diag;
pub mod meshgen;
pub mod netcdf_io;
pub mod parallel;
pub mod pipeline;
pub mod statistics;

pub use errors::{Result, RuFeDiagError};

// High-level convenience API
pub mod prelude {
    //! Commonly used imports for convenience
    pub use crate::bundle::DiagnosticsBundle;
    pub use crate::config::{OverwritePolicy, RunConfig};
    pub use crate::diagnostics::{
        mean_buoyancy_flux, mean_eke, rms_vertical_velocity, BuoyancyParams,
    };
    pub use crate::errors::{Result, RuFeDiagError};
    pub use crate::field::{Dim, Field, LabeledAxis};
    pub use crate::gridding::{InterpolationMethod, Regridder, TargetGrid};
    pub use crate::loader::{load_variable, LoadOptions, YearRange};
    pub use crate::mesh::{DepthLevels, Mesh2D, PeriodicChannelTrim};
    pub use crate::mesh_diag::MeshDiagnostics;
    pub use crate::meshgen::{ChannelCorners, ChannelMeshBuilder};
    pub use crate::parallel::ParallelConfig;
    pub use crate::pipeline::{run_profiles, vertical_diagnostics_all};
}
