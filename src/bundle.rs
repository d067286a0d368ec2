//! The three profiles of a run, kept together for output

use crate::config::OverwritePolicy;
use crate::diagnostics::BuoyancyParams;
use crate::errors::{Result, RuFeDiagError};
use crate::field::{Dim, Field};
use crate::netcdf_io::{read_field, NetCDFWriter};
use serde_json::{json, Value};
use std::path::Path;

/// Output variable names, in file order
pub const BUNDLE_VARIABLES: [&str; 3] = ["w_rms", "eke", "buoy_flux"];

/// `eke(nz1)`, `w_rms(nz)` and `buoy_flux(nz1)` of one run
#[derive(Debug, Clone)]
pub struct DiagnosticsBundle {
    eke: Field,
    w_rms: Field,
    buoy_flux: Field,
    buoyancy: BuoyancyParams,
}

impl DiagnosticsBundle {
    /// Assemble a bundle, checking every profile's depth axis
    ///
    /// # Errors
    ///
    /// Returns an axis error if a profile is not one-dimensional on its
    /// expected depth axis, or if `eke` and `buoy_flux` differ in `nz1`
    /// length.
    pub fn new(eke: Field, w_rms: Field, buoy_flux: Field, buoyancy: BuoyancyParams) -> Result<Self> {
        eke.expect_dims("eke profile", &[Dim::Nz1])?;
        w_rms.expect_dims("w_rms profile", &[Dim::Nz])?;
        buoy_flux.expect_dims("buoy_flux profile", &[Dim::Nz1])?;

        let (left, right) = (eke.len_of(&Dim::Nz1)?, buoy_flux.len_of(&Dim::Nz1)?);
        if left != right {
            return Err(RuFeDiagError::AxisLengthMismatch {
                operation: "merging eke and buoy_flux".to_string(),
                axis: Dim::Nz1.name().to_string(),
                left,
                right,
            });
        }

        Ok(Self {
            eke: eke.with_name("eke"),
            w_rms: w_rms.with_name("w_rms"),
            buoy_flux: buoy_flux.with_name("buoy_flux"),
            buoyancy,
        })
    }

    #[must_use]
    pub fn eke(&self) -> &Field {
        &self.eke
    }

    #[must_use]
    pub fn w_rms(&self) -> &Field {
        &self.w_rms
    }

    #[must_use]
    pub fn buoy_flux(&self) -> &Field {
        &self.buoy_flux
    }

    #[must_use]
    pub fn buoyancy(&self) -> &BuoyancyParams {
        &self.buoyancy
    }

    /// Profile by variable name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Field> {
        match name {
            "eke" => Some(&self.eke),
            "w_rms" => Some(&self.w_rms),
            "buoy_flux" => Some(&self.buoy_flux),
            _ => None,
        }
    }

    /// All profiles, in file order
    #[must_use]
    pub fn variables(&self) -> [&Field; 3] {
        [&self.w_rms, &self.eke, &self.buoy_flux]
    }

    /// JSON rendering: one object per profile with its depth axis and values
    ///
    /// Missing samples become `null`.
    #[must_use]
    pub fn to_json(&self) -> Value {
        let mut root = serde_json::Map::new();
        for field in self.variables() {
            let dim = &field.axes()[0].dim;
            let values: Vec<Option<f64>> = field
                .data()
                .iter()
                .map(|&x| (!x.is_nan()).then_some(x))
                .collect();
            root.insert(
                field.name().to_string(),
                json!({
                    "dim": dim.name(),
                    "coords": field.coords(dim),
                    "values": values,
                }),
            );
        }
        root.insert(
            "buoyancy".to_string(),
            serde_json::to_value(self.buoyancy).unwrap_or(Value::Null),
        );
        Value::Object(root)
    }

    /// Write the three profiles into one NetCDF file
    ///
    /// # Errors
    ///
    /// Returns [`RuFeDiagError::OutputExists`] if `path` exists and `policy` is
    /// [`OverwritePolicy::Fail`], or any NetCDF error.
    pub fn write_netcdf(&self, path: &Path, policy: OverwritePolicy) -> Result<()> {
        let params = self.buoyancy;
        NetCDFWriter::new(path, policy).write_fields(&self.variables(), |name, var| {
            let (long_name, units) = describe(name);
            var.put_attribute("long_name", long_name)?;
            var.put_attribute("units", units)?;
            if name == "buoy_flux" {
                var.put_attribute("alpha", params.alpha)?;
                var.put_attribute("density_0", params.density_0)?;
                var.put_attribute("temp_0", params.temp_0)?;
            }
            Ok(())
        })
    }

    /// Read a bundle back from a file written by [`DiagnosticsBundle::write_netcdf`]
    ///
    /// Buoyancy parameters missing from the file fall back to their defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or a profile is missing.
    pub fn read_netcdf(path: &Path) -> Result<Self> {
        let file = netcdf::open(path)?;
        let eke = read_field(&file, "eke")?;
        let w_rms = read_field(&file, "w_rms")?;
        let buoy_flux = read_field(&file, "buoy_flux")?;

        let mut buoyancy = BuoyancyParams::default();
        if let Some(var) = file.variable("buoy_flux") {
            let read = |name: &str| -> Option<f64> {
                match var.attribute(name)?.value().ok()? {
                    netcdf::AttributeValue::Double(v) => Some(v),
                    netcdf::AttributeValue::Float(v) => Some(f64::from(v)),
                    _ => None,
                }
            };
            buoyancy.alpha = read("alpha").unwrap_or(buoyancy.alpha);
            buoyancy.density_0 = read("density_0").unwrap_or(buoyancy.density_0);
            buoyancy.temp_0 = read("temp_0").unwrap_or(buoyancy.temp_0);
        }

        Self::new(eke, w_rms, buoy_flux, buoyancy)
    }
}

fn describe(name: &str) -> (&'static str, &'static str) {
    match name {
        "eke" => ("Time and area mean eddy kinetic energy", "m2 s-2"),
        "w_rms" => ("RMS vertical velocity", "m s-1"),
        "buoy_flux" => ("Time and area mean turbulent buoyancy flux", "m2 s-3"),
        _ => ("", ""),
    }
}
