//! Error types for the roster cleaning pipeline.
//!
//! Fatal conditions (unreadable input, a column the classifier cannot live
//! without, invalid configuration) surface as [`RosterError`]. Malformed
//! individual field values are never errors: the normalizer turns them into
//! missing values and the filter chain accounts for them.
//!
//! Errors are serializable so that a JSON run report can carry them.

use serde::Serialize;
use serde::ser::SerializeStruct;
use std::path::PathBuf;
use thiserror::Error;

/// The main error type for the roster pipeline.
#[derive(Error, Debug)]
pub enum RosterError {
    /// The input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    InputNotFound(PathBuf),

    /// A required column could not be located in the input header.
    #[error("Required column '{0}' not found in input")]
    ColumnNotFound(String),

    /// Invalid configuration provided.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The input file contained a header but no usable rows or columns.
    #[error("Input table is empty: {0}")]
    EmptyInput(String),

    /// Writing an output artifact failed.
    #[error("Failed to write output: {0}")]
    OutputFailed(String),

    /// IO error wrapper.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Polars error wrapper.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error with context.
    #[error("{context}: {source}")]
    WithContext {
        context: String,
        #[source]
        source: Box<RosterError>,
    },
}

impl RosterError {
    /// Add context to an error.
    pub fn with_context(self, context: impl Into<String>) -> Self {
        RosterError::WithContext {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// Stable error code, independent of the message text.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InputNotFound(_) => "INPUT_NOT_FOUND",
            Self::ColumnNotFound(_) => "COLUMN_NOT_FOUND",
            Self::InvalidConfig(_) => "INVALID_CONFIG",
            Self::EmptyInput(_) => "EMPTY_INPUT",
            Self::OutputFailed(_) => "OUTPUT_FAILED",
            Self::Io(_) => "IO_ERROR",
            Self::Polars(_) => "POLARS_ERROR",
            Self::Json(_) => "JSON_ERROR",
            Self::WithContext { source, .. } => source.error_code(),
        }
    }

    /// Whether the error was caused by the input file rather than by the
    /// pipeline itself.
    pub fn is_input_error(&self) -> bool {
        match self {
            Self::InputNotFound(_) | Self::ColumnNotFound(_) | Self::EmptyInput(_) => true,
            Self::WithContext { source, .. } => source.is_input_error(),
            _ => false,
        }
    }
}

impl From<crate::config::ConfigValidationError> for RosterError {
    fn from(err: crate::config::ConfigValidationError) -> Self {
        RosterError::InvalidConfig(err.to_string())
    }
}

/// Errors are serialized as a struct with `code` and `message` fields.
impl Serialize for RosterError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut state = serializer.serialize_struct("RosterError", 2)?;
        state.serialize_field("code", &self.error_code())?;
        state.serialize_field("message", &self.to_string())?;
        state.end()
    }
}

/// Result type alias for roster operations.
pub type Result<T> = std::result::Result<T, RosterError>;

/// Extension trait for adding context to Results.
pub trait ResultExt<T> {
    /// Add context to an error result.
    fn context(self, context: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, polars::error::PolarsError> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| RosterError::Polars(e).with_context(context))
    }
}

impl<T> ResultExt<T> for std::result::Result<T, std::io::Error> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| RosterError::Io(e).with_context(context))
    }
}
