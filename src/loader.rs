//! Discovery and loading of per-variable, per-year output chunks
//!
//! A results directory holds one file per variable and year, named
//! `<var>.<anything>.<year>.nc`. [`load_variable`] gathers the chunks of one
//! variable inside a [`YearRange`], reads each as a [`Field`] and joins them
//! along `time`.

use crate::errors::{Result, RuFeDiagError};
use crate::field::{Dim, Field};
use crate::netcdf_io::{data_variable_names, read_field};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Inclusive range of simulation years; a missing bound is unbounded
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct YearRange {
    pub first: Option<i32>,
    pub last: Option<i32>,
}

impl YearRange {
    #[must_use]
    pub fn new(first: Option<i32>, last: Option<i32>) -> Self {
        Self { first, last }
    }

    /// Every year
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn contains(&self, year: i32) -> bool {
        self.first.map_or(true, |first| year >= first) && self.last.map_or(true, |last| year <= last)
    }
}

/// How a variable is loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadOptions {
    pub years: YearRange,
    /// Replace exact zeros with NaN (FESOM writes zeros below the topography)
    pub mask_zeros: bool,
}

impl Default for LoadOptions {
    fn default() -> Self {
        Self {
            years: YearRange::all(),
            mask_zeros: true,
        }
    }
}

/// One year of output for a variable
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkFile {
    pub path: PathBuf,
    pub year: i32,
}

/// The last dot-separated token of the file stem, e.g. `1902` for `u.fesom.1902.nc`
#[must_use]
pub fn year_token(path: &Path) -> Option<&str> {
    path.file_stem()?.to_str()?.rsplit('.').next()
}

/// Files of `variable` in `dir` whose year lies in `years`, oldest first
///
/// # Errors
///
/// Returns [`RuFeDiagError::InvalidYearToken`] if a matching file name does not
/// end in an integer year, or an I/O error if `dir` cannot be listed.
pub fn discover_chunks(dir: &Path, variable: &str, years: YearRange) -> Result<Vec<ChunkFile>> {
    let prefix = format!("{variable}.");
    let mut chunks = Vec::new();

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        // `is_file` follows symlinks, so linked chunks count as files
        if !path.is_file() {
            continue;
        }
        let matches = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with(&prefix));
        if !matches {
            continue;
        }

        let token = year_token(&path).unwrap_or_default().to_string();
        let year = token
            .parse::<i32>()
            .map_err(|_| RuFeDiagError::InvalidYearToken {
                file: path.clone(),
                token,
            })?;

        if years.contains(year) {
            chunks.push(ChunkFile { path, year });
        }
    }

    chunks.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.path.cmp(&b.path)));
    Ok(chunks)
}

/// Load `variable` from the chunks in `dir`, concatenated along `time`
///
/// # Errors
///
/// - [`RuFeDiagError::NoMatchingFiles`] if no chunk falls in the year range
/// - [`RuFeDiagError::AmbiguousVariable`] if a chunk lacks `variable` and holds
///   more than one data variable
/// - axis errors if the chunks disagree on their non-time axes
pub fn load_variable(dir: &Path, variable: &str, options: &LoadOptions) -> Result<Field> {
    let chunks = discover_chunks(dir, variable, options.years)?;
    if chunks.is_empty() {
        return Err(RuFeDiagError::NoMatchingFiles {
            var: variable.to_string(),
            dir: dir.to_path_buf(),
        });
    }

    info!(
        "📂 Loading '{variable}' from {} file(s) ({}..={})",
        chunks.len(),
        chunks[0].year,
        chunks[chunks.len() - 1].year
    );

    let pieces = chunks
        .iter()
        .map(|chunk| read_chunk(chunk, variable))
        .collect::<Result<Vec<_>>>()?;

    let field = Field::concat(&pieces, &Dim::Time)?.with_name(variable);

    Ok(if options.mask_zeros {
        field.mask_where(|x| x == 0.0)
    } else {
        field
    })
}

fn read_chunk(chunk: &ChunkFile, variable: &str) -> Result<Field> {
    let file = netcdf::open(&chunk.path)?;
    let name = resolve_variable(&file, variable)?;
    debug!("Reading '{name}' from {}", chunk.path.display());

    let field = read_field(&file, &name)?;
    field.axis_index(&Dim::Time)?;
    Ok(field)
}

/// The requested variable, or the only data variable of the file
fn resolve_variable(file: &netcdf::File, variable: &str) -> Result<String> {
    if file.variable(variable).is_some() {
        return Ok(variable.to_string());
    }

    let mut candidates = data_variable_names(file);
    match candidates.len() {
        0 => Err(RuFeDiagError::VariableNotFound {
            var: variable.to_string(),
        }),
        1 => Ok(candidates.remove(0)),
        _ => Err(RuFeDiagError::AmbiguousVariable {
            var: variable.to_string(),
            candidates,
        }),
    }
}
