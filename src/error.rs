//! Error types for ms-scope
//!
//! Every fallible operation in the viewer returns [`ViewerError`]. Errors are
//! recovered at the boundary of the operation that raised them and surfaced to
//! the user through [`ViewerError::user_message`].

use thiserror::Error;

/// Main error type for ms-scope operations
#[derive(Error, Debug)]
pub enum ViewerError {
    /// Required columns are missing from the peak table
    #[error("Missing required columns: {}", missing.join(", "))]
    Schema { missing: Vec<String> },

    /// A filter left no rows to work with
    #[error("No {what} rows in dataset")]
    EmptyDataset { what: String },

    /// File unreadable, corrupt, or holding invalid values
    #[error("Invalid peak table: {0}")]
    Format(String),

    /// Instrument file could not be converted
    #[error("Conversion failed: {0}")]
    Conversion(String),

    /// An operation needed a dataset but none was set
    #[error("No dataset loaded")]
    NoData,

    /// File I/O error
    #[error("Failed to access file: {0}")]
    FileIo(#[from] std::io::Error),

    /// Polars data processing error
    #[error("Data processing error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Configuration file error
    #[error("Configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type alias for ms-scope operations
pub type Result<T> = std::result::Result<T, ViewerError>;

impl ViewerError {
    pub fn schema<I, S>(missing: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ViewerError::Schema {
            missing: missing.into_iter().map(Into::into).collect(),
        }
    }

    pub fn empty(what: impl Into<String>) -> Self {
        ViewerError::EmptyDataset { what: what.into() }
    }

    /// Get a user-friendly error message suitable for displaying in UI
    pub fn user_message(&self) -> String {
        match self {
            ViewerError::Schema { missing } => {
                format!("Required columns not found: {}", missing.join(", "))
            }
            ViewerError::EmptyDataset { what } => format!("No {} data found", what),
            ViewerError::Format(msg) => format!("Could not read peak table: {}", msg),
            ViewerError::Conversion(msg) => format!("Conversion error: {}", msg),
            ViewerError::NoData => "No data has been loaded yet".to_string(),
            ViewerError::FileIo(e) => format!("File error: {}", e),
            ViewerError::Polars(e) => format!("Data error: {}", e),
            ViewerError::Config(msg) => format!("Config error: {}", msg),
            ViewerError::Json(e) => format!("JSON error: {}", e),
        }
    }

    /// Get a short title for the error (for the error window)
    pub fn title(&self) -> &'static str {
        match self {
            ViewerError::Schema { .. } => "Missing Columns",
            ViewerError::EmptyDataset { .. } => "Empty Dataset",
            ViewerError::Format(_) => "Format Error",
            ViewerError::Conversion(_) => "Conversion Failed",
            ViewerError::NoData => "No Data",
            ViewerError::FileIo(_) => "File Error",
            ViewerError::Polars(_) => "Data Error",
            ViewerError::Config(_) => "Configuration Error",
            ViewerError::Json(_) => "JSON Error",
        }
    }
}
