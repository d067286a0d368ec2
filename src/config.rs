//! Run configuration for the profile diagnostics
//!
//! A [`RunConfig`] replaces the edit-the-constants-at-the-top workflow: it is
//! built from command-line flags or a JSON file and validated before any file
//! is opened.

use crate::diagnostics::BuoyancyParams;
use crate::errors::{Result, RuFeDiagError};
use crate::loader::{LoadOptions, YearRange};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// What to do when the output file already exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverwritePolicy {
    /// Refuse to touch an existing file
    #[default]
    Fail,
    /// Replace an existing file
    Overwrite,
}

impl OverwritePolicy {
    /// Check `path` against the policy
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::OutputExists`] if `path` exists and the policy
    /// is [`OverwritePolicy::Fail`].
    pub fn check(self, path: &Path) -> Result<()> {
        if self == Self::Fail && path.exists() {
            return Err(RuFeDiagError::OutputExists {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }
}

/// Inputs of one profile-diagnostics run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Results directory holding `<var>.*.<year>.nc` chunks and the mesh diagnostics file
    pub results_path: PathBuf,
    /// Destination NetCDF file; `None` prints the profiles instead
    #[serde(default)]
    pub output_path: Option<PathBuf>,
    /// First year to load (inclusive)
    #[serde(default)]
    pub year_1: Option<i32>,
    /// Last year to load (inclusive)
    #[serde(default)]
    pub year_f: Option<i32>,
    #[serde(default)]
    pub overwrite: OverwritePolicy,
    /// Treat exact zeros as missing (masks topography)
    #[serde(default = "default_mask_zeros")]
    pub mask_zeros: bool,
    #[serde(default)]
    pub buoyancy: BuoyancyParams,
}

fn default_mask_zeros() -> bool {
    true
}

impl RunConfig {
    /// Configuration with defaults for everything but the results directory
    #[must_use]
    pub fn new(results_path: impl Into<PathBuf>) -> Self {
        Self {
            results_path: results_path.into(),
            output_path: None,
            year_1: None,
            year_f: None,
            overwrite: OverwritePolicy::default(),
            mask_zeros: default_mask_zeros(),
            buoyancy: BuoyancyParams::default(),
        }
    }

    /// Read a configuration from a JSON file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// Reject configurations that cannot produce a result
    ///
    /// Checks the year bounds, the buoyancy parameters, the results directory
    /// and the overwrite policy, in that order.
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::InvalidConfig`] or
    /// [`RuFeDiagError::OutputExists`].
    pub fn validate(&self) -> Result<()> {
        if let (Some(first), Some(last)) = (self.year_1, self.year_f) {
            if first > last {
                return Err(RuFeDiagError::InvalidConfig {
                    message: format!("year_1 ({first}) is after year_f ({last})"),
                });
            }
        }

        let BuoyancyParams {
            alpha,
            density_0,
            temp_0,
        } = self.buoyancy;
        for (name, value) in [("alpha", alpha), ("density_0", density_0), ("temp_0", temp_0)] {
            if !value.is_finite() {
                return Err(RuFeDiagError::InvalidConfig {
                    message: format!("{name} must be finite, got {value}"),
                });
            }
        }

        if !self.results_path.is_dir() {
            return Err(RuFeDiagError::InvalidConfig {
                message: format!(
                    "results path {} is not a directory",
                    self.results_path.display()
                ),
            });
        }

        if let Some(output) = &self.output_path {
            if output.is_dir() {
                return Err(RuFeDiagError::InvalidConfig {
                    message: format!("output path {} is a directory", output.display()),
                });
            }
            self.overwrite.check(output)?;
        }

        Ok(())
    }

    /// Loader options derived from this configuration
    #[must_use]
    pub fn load_options(&self) -> LoadOptions {
        LoadOptions {
            years: YearRange::new(self.year_1, self.year_f),
            mask_zeros: self.mask_zeros,
        }
    }
}
