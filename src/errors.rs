//! Centralized error handling for RuFeDiag
//!
//! Every fallible operation in the crate returns [`RuFeDiagError`]. Axis and
//! weight problems are reported before any numerical reduction runs, so a
//! mismatched `nz`/`nz1` pair surfaces as a named precondition error instead
//! of a shape failure deep inside `ndarray`.

use std::fmt;
use std::path::PathBuf;

/// Main error type for RuFeDiag operations
#[derive(Debug)]
pub enum RuFeDiagError {
    /// NetCDF file operation errors
    NetCDFError(netcdf::Error),

    /// I/O operation errors
    IoError(std::io::Error),

    /// Array shape or dimension error
    ArrayError(ndarray::ShapeError),

    /// Configuration file could not be parsed
    JsonError(serde_json::Error),

    /// Variable not found in a NetCDF file
    VariableNotFound { var: String },

    /// More than one data variable and none of them carries the requested name
    AmbiguousVariable { var: String, candidates: Vec<String> },

    /// No output chunk matched the variable / year range
    NoMatchingFiles { var: String, dir: PathBuf },

    /// Final dot-separated token of a file stem is not an integer year
    InvalidYearToken { file: PathBuf, token: String },

    /// Empty name or empty list passed to the mesh diagnostics accessor
    InvalidMeshRequest { message: String },

    /// A required named axis is missing from a field
    AxisNotFound { field: String, axis: String },

    /// Axis identities do not match what an operation requires
    AxisMismatch {
        operation: String,
        expected: Vec<String>,
        found: Vec<String>,
    },

    /// Two fields share an axis name but not its length
    AxisLengthMismatch {
        operation: String,
        axis: String,
        left: usize,
        right: usize,
    },

    /// Weight vector does not match the horizontal axis it averages over
    WeightLengthMismatch {
        axis: String,
        weights: usize,
        axis_len: usize,
    },

    /// Interpolation along an axis needs coordinate values that are absent
    CoordinateNotFound { field: String, axis: String },

    /// Malformed `nod2d.out` / `elem2d.out` / `aux3d.out`
    MeshParseError {
        file: PathBuf,
        line: usize,
        message: String,
    },

    /// Run configuration rejected before any I/O
    InvalidConfig { message: String },

    /// Output file exists and the overwrite policy forbids replacing it
    OutputExists { path: PathBuf },

    /// Thread pool configuration error
    ThreadPoolError(String),

    /// Triangulation or regridding failure
    InterpolationError(String),

    /// Generic error
    Generic(String),
}

impl fmt::Display for RuFeDiagError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuFeDiagError::NetCDFError(e) => write!(f, "NetCDF error: {e}"),
            RuFeDiagError::IoError(e) => write!(f, "I/O error: {e}"),
            RuFeDiagError::ArrayError(e) => write!(f, "Array error: {e}"),
            RuFeDiagError::JsonError(e) => write!(f, "Configuration parse error: {e}"),
            RuFeDiagError::VariableNotFound { var } => {
                write!(f, "Variable '{var}' not found in file")
            }
            RuFeDiagError::AmbiguousVariable { var, candidates } => write!(
                f,
                "Variable '{var}' not found and the files hold more than one data variable: [{}]",
                candidates.join(", ")
            ),
            RuFeDiagError::NoMatchingFiles { var, dir } => write!(
                f,
                "No files for variable '{var}' in {} match the requested years",
                dir.display()
            ),
            RuFeDiagError::InvalidYearToken { file, token } => write!(
                f,
                "Cannot parse year token '{token}' of {}",
                file.display()
            ),
            RuFeDiagError::InvalidMeshRequest { message } => {
                write!(f, "Invalid mesh diagnostics request: {message}")
            }
            RuFeDiagError::AxisNotFound { field, axis } => {
                write!(f, "Axis '{axis}' not found in field '{field}'")
            }
            RuFeDiagError::AxisMismatch {
                operation,
                expected,
                found,
            } => write!(
                f,
                "{operation}: expected axes [{}], found [{}]",
                expected.join(", "),
                found.join(", ")
            ),
            RuFeDiagError::AxisLengthMismatch {
                operation,
                axis,
                left,
                right,
            } => write!(
                f,
                "{operation}: axis '{axis}' has length {left} on one operand and {right} on the other"
            ),
            RuFeDiagError::WeightLengthMismatch {
                axis,
                weights,
                axis_len,
            } => write!(
                f,
                "Weight vector of length {weights} cannot average axis '{axis}' of length {axis_len}"
            ),
            RuFeDiagError::CoordinateNotFound { field, axis } => write!(
                f,
                "Field '{field}' has no coordinate values for axis '{axis}'"
            ),
            RuFeDiagError::MeshParseError {
                file,
                line,
                message,
            } => write!(f, "{}:{line}: {message}", file.display()),
            RuFeDiagError::InvalidConfig { message } => {
                write!(f, "Invalid run configuration: {message}")
            }
            RuFeDiagError::OutputExists { path } => write!(
                f,
                "Output file {} already exists (pass --overwrite to replace it)",
                path.display()
            ),
            RuFeDiagError::ThreadPoolError(msg) => write!(f, "Thread pool error: {msg}"),
            RuFeDiagError::InterpolationError(msg) => write!(f, "Interpolation error: {msg}"),
            RuFeDiagError::Generic(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for RuFeDiagError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuFeDiagError::NetCDFError(e) => Some(e),
            RuFeDiagError::IoError(e) => Some(e),
            RuFeDiagError::ArrayError(e) => Some(e),
            RuFeDiagError::JsonError(e) => Some(e),
            _ => None,
        }
    }
}

impl From<netcdf::Error> for RuFeDiagError {
    fn from(error: netcdf::Error) -> Self {
        RuFeDiagError::NetCDFError(error)
    }
}

impl From<std::io::Error> for RuFeDiagError {
    fn from(error: std::io::Error) -> Self {
        RuFeDiagError::IoError(error)
    }
}

impl From<ndarray::ShapeError> for RuFeDiagError {
    fn from(error: ndarray::ShapeError) -> Self {
        RuFeDiagError::ArrayError(error)
    }
}

impl From<serde_json::Error> for RuFeDiagError {
    fn from(error: serde_json::Error) -> Self {
        RuFeDiagError::JsonError(error)
    }
}

impl From<String> for RuFeDiagError {
    fn from(error: String) -> Self {
        RuFeDiagError::Generic(error)
    }
}

impl From<&str> for RuFeDiagError {
    fn from(error: &str) -> Self {
        RuFeDiagError::Generic(error.to_string())
    }
}

/// Result type alias for RuFeDiag operations
pub type Result<T> = std::result::Result<T, RuFeDiagError>;
