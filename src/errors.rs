//! Centralized error handling for ww3vis
//!
//! Every failure the plotting pipelines can hit (missing files, unmatched
//! patterns, wrong variable names, paired datasets that do not line up)
//! is a variant here, so callers get context instead of a bare stoppage.

use thiserror::Error;

/// Main error type for ww3vis operations
#[derive(Error, Debug)]
pub enum Ww3VisError {
    /// NetCDF file operation errors
    #[error("NetCDF error: {0}")]
    NetCDF(#[from] netcdf::Error),

    /// I/O operation errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG encoding / image errors
    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),

    /// Malformed glob pattern
    #[error("Invalid file pattern: {0}")]
    Pattern(#[from] glob::PatternError),

    /// A pattern matched nothing on disk
    #[error("No files match pattern '{pattern}'")]
    NoMatchingFiles { pattern: String },

    /// Variable not found in NetCDF file
    #[error("Variable '{var}' not found in file")]
    VariableNotFound { var: String },

    /// Array lengths or paired datasets disagree
    #[error("Shape mismatch in {context}: expected {expected}, found {found}")]
    ShapeMismatch {
        context: String,
        expected: String,
        found: String,
    },

    /// Time variable carries a `units` attribute we cannot interpret
    #[error("Unsupported time units '{units}'")]
    InvalidTimeUnits { units: String },

    /// Bad line in an observation-location file
    #[error("Station file line {line}: {message}")]
    StationFile { line: usize, message: String },

    /// Mesh cannot be triangulated
    #[error("Triangulation error: {0}")]
    Triangulation(String),

    /// Thread pool configuration error
    #[error("Thread pool error: {0}")]
    ThreadPool(String),

    /// Array shape or dimension error
    #[error("Array error: {0}")]
    Array(#[from] ndarray::ShapeError),

    /// Anything else
    #[error("{0}")]
    Generic(String),
}

impl Ww3VisError {
    /// Shorthand for a [`Ww3VisError::ShapeMismatch`]
    pub fn shape_mismatch(
        context: impl Into<String>,
        expected: impl ToString,
        found: impl ToString,
    ) -> Self {
        Ww3VisError::ShapeMismatch {
            context: context.into(),
            expected: expected.to_string(),
            found: found.to_string(),
        }
    }
}

impl From<String> for Ww3VisError {
    fn from(error: String) -> Self {
        Ww3VisError::Generic(error)
    }
}

impl From<&str> for Ww3VisError {
    fn from(error: &str) -> Self {
        Ww3VisError::Generic(error.to_string())
    }
}

/// Result type alias for ww3vis operations
pub type Result<T> = std::result::Result<T, Ww3VisError>;
