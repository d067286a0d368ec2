//! Access to the static mesh diagnostics file (`fesom.mesh.diag.nc`)

use crate::errors::{Result, RuFeDiagError};
use crate::field::{Dim, Field};
use crate::netcdf_io::{data_variable_names, read_field};
use log::debug;
use std::path::{Path, PathBuf};

/// Name of the mesh diagnostics file inside a results directory
pub const MESH_DIAG_FILE: &str = "fesom.mesh.diag.nc";

/// One variable or an ordered list of variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MeshDiagRequest {
    One(String),
    Many(Vec<String>),
}

impl MeshDiagRequest {
    fn names(&self) -> Result<Vec<&str>> {
        let names: Vec<&str> = match self {
            Self::One(name) => vec![name.as_str()],
            Self::Many(names) if names.is_empty() => {
                return Err(RuFeDiagError::InvalidMeshRequest {
                    message: "the list of variables is empty".to_string(),
                })
            }
            Self::Many(names) => names.iter().map(String::as_str).collect(),
        };

        if names.iter().any(|name| name.trim().is_empty()) {
            return Err(RuFeDiagError::InvalidMeshRequest {
                message: "variable names must not be empty".to_string(),
            });
        }
        Ok(names)
    }
}

impl From<&str> for MeshDiagRequest {
    fn from(name: &str) -> Self {
        Self::One(name.to_string())
    }
}

impl From<String> for MeshDiagRequest {
    fn from(name: String) -> Self {
        Self::One(name)
    }
}

impl From<Vec<String>> for MeshDiagRequest {
    fn from(names: Vec<String>) -> Self {
        Self::Many(names)
    }
}

impl From<&[&str]> for MeshDiagRequest {
    fn from(names: &[&str]) -> Self {
        Self::Many(names.iter().map(|s| (*s).to_string()).collect())
    }
}

impl<const N: usize> From<[&str; N]> for MeshDiagRequest {
    fn from(names: [&str; N]) -> Self {
        Self::Many(names.iter().map(|s| (*s).to_string()).collect())
    }
}

/// Horizontal area weights of a mesh
#[derive(Debug, Clone)]
pub struct AreaWeights {
    /// One weight per element
    pub elem_area: Vec<f64>,
    /// One weight per node, taken from the top layer
    pub nod_area: Vec<f64>,
}

/// Open handle on a mesh diagnostics file
pub struct MeshDiagnostics {
    path: PathBuf,
    file: netcdf::File,
}

impl MeshDiagnostics {
    /// Open `fesom.mesh.diag.nc` inside `results_path`
    ///
    /// # Errors
    ///
    /// Returns a NetCDF error if the file is missing or unreadable.
    pub fn open(results_path: &Path) -> Result<Self> {
        let path = results_path.join(MESH_DIAG_FILE);
        let file = netcdf::open(&path)?;
        debug!("Opened mesh diagnostics {}", path.display());
        Ok(Self { path, file })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Data variables available in the file
    #[must_use]
    pub fn variable_names(&self) -> Vec<String> {
        data_variable_names(&self.file)
    }

    /// Fetch the requested variables, in request order
    ///
    /// # Errors
    ///
    /// [`RuFeDiagError::InvalidMeshRequest`] for an empty name or list,
    /// [`RuFeDiagError::VariableNotFound`] for an unknown name.
    pub fn get(&self, request: impl Into<MeshDiagRequest>) -> Result<Vec<Field>> {
        let request = request.into();
        request
            .names()?
            .into_iter()
            .map(|name| read_field(&self.file, name))
            .collect()
    }

    /// Fetch a single variable
    ///
    /// # Errors
    ///
    /// As for [`MeshDiagnostics::get`].
    pub fn get_one(&self, name: &str) -> Result<Field> {
        let mut fields = self.get(name)?;
        fields
            .pop()
            .ok_or_else(|| RuFeDiagError::VariableNotFound {
                var: name.to_string(),
            })
    }

    /// `elem_area` and the top layer of `nod_area`
    ///
    /// FESOM stores `nod_area` per layer; in the periodic channel every layer
    /// has the same areas, so layer 0 stands for all of them.
    ///
    /// # Errors
    ///
    /// Returns an error if either variable is missing or has unexpected axes.
    pub fn area_weights(&self) -> Result<AreaWeights> {
        let mut fields = self.get(["elem_area", "nod_area"])?.into_iter();
        let (Some(elem_area), Some(nod_area)) = (fields.next(), fields.next()) else {
            return Err(RuFeDiagError::Generic(
                "Mesh diagnostics returned fewer fields than requested".to_string(),
            ));
        };

        let nod_area = if nod_area.has_axis(&Dim::Nz) {
            nod_area.select(&Dim::Nz, 0)?
        } else {
            nod_area
        };

        elem_area.expect_dims("elem_area weights", &[Dim::Elem])?;
        nod_area.expect_dims("nod_area weights", &[Dim::Nod2])?;

        Ok(AreaWeights {
            elem_area: elem_area.values_1d()?.to_vec(),
            nod_area: nod_area.values_1d()?.to_vec(),
        })
    }
}
