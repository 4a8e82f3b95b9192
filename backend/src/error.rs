//! Error types for the csv-tokens pipeline.
//!
//! One enum per layer:
//!
//! - [`CsvError`] - CSV reading and decoding errors
//! - [`TransformError`] - Token transformation errors
//! - [`ArchiveError`] - Bundle / file output errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP surface errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use thiserror::Error;

// =============================================================================
// CSV Parsing Errors
// =============================================================================

/// Errors during CSV parsing.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Failed to decode the raw bytes.
    #[error("Failed to decode content: {0}")]
    EncodingError(String),

    /// Invalid CSV format.
    #[error("Invalid CSV format at line {line}: {message}")]
    ParseError { line: u64, message: String },

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// No headers found.
    #[error("No headers found in CSV")]
    NoHeaders,
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        let line = err.position().map(|p| p.line()).unwrap_or(0);
        match err.into_kind() {
            csv::ErrorKind::Io(io) => CsvError::IoError(io),
            csv::ErrorKind::Utf8 { err, .. } => CsvError::EncodingError(err.to_string()),
            other => CsvError::ParseError {
                line,
                message: format!("{:?}", other),
            },
        }
    }
}

// =============================================================================
// Transformation Errors
// =============================================================================

/// Fatal errors of the token transformer. No partial result accompanies them.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TransformError {
    /// No rows after parsing.
    #[error("No rows to transform")]
    EmptyInput,

    /// Selected mode column is not one of the CSV headers.
    #[error("Mode key column '{column}' not found (available: {})", .available.join(", "))]
    InvalidModeKey {
        column: String,
        available: Vec<String>,
    },

    /// No mode column was selected at all.
    #[error("No mode key column selected")]
    NoModeKey,
}

// =============================================================================
// Archive Errors
// =============================================================================

/// Errors while serializing or bundling the generated files.
#[derive(Debug, Error)]
pub enum ArchiveError {
    /// Zip writer failure.
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    /// IO error.
    #[error("Archive IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// JSON error.
    #[error("Archive JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    /// Requested file is not part of the result.
    #[error("File not found in result: {0}")]
    UnknownFile(String),

    /// File name would leave the output directory.
    #[error("Refusing to write '{0}': file name contains a path separator")]
    UnsafePath(String),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the main error type returned by [`crate::transform::pipeline::process_bytes`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// CSV parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Transformation error.
    #[error("Transform error: {0}")]
    Transform(#[from] TransformError),

    /// Archive error.
    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for CSV operations.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for transformation operations.
pub type TransformResult<T> = Result<T, TransformError>;

/// Result type for archive operations.
pub type ArchiveResult<T> = Result<T, ArchiveError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        // CsvError -> PipelineError
        let csv_err = CsvError::EmptyFile;
        let pipeline_err: PipelineError = csv_err.into();
        assert!(pipeline_err.to_string().contains("empty"));

        // TransformError -> PipelineError
        let transform_err = TransformError::InvalidModeKey {
            column: "Theme".into(),
            available: vec!["Name".into(), "Color".into()],
        };
        let pipeline_err: PipelineError = transform_err.into();
        assert!(pipeline_err.to_string().contains("Theme"));
    }

    #[test]
    fn test_invalid_mode_key_lists_columns() {
        let err = TransformError::InvalidModeKey {
            column: "Theme".into(),
            available: vec!["Name".into(), "Color".into()],
        };
        let msg = err.to_string();
        assert!(msg.contains("'Theme'"));
        assert!(msg.contains("Name, Color"));
    }

    #[test]
    fn test_server_error_wraps_pipeline() {
        let err: ServerError = PipelineError::from(TransformError::EmptyInput).into();
        assert!(err.to_string().contains("No rows"));
    }
}
