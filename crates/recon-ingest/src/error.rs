//! Error types for order dataset ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while loading or preparing a dataset.
#[derive(Debug, Error)]
pub enum IngestError {
    /// CSV file not found.
    #[error("CSV file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read or write a file.
    #[error("failed to {operation} {path}: {source}")]
    Io {
        operation: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed CSV content.
    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    /// CSV file is empty or has no valid rows.
    #[error("CSV file is empty: {path}")]
    EmptyCsv { path: PathBuf },

    /// Required column not found in the header row.
    #[error("required column '{column}' not found in {path}")]
    MissingColumn { column: String, path: PathBuf },

    /// A cell could not be parsed as the column's type.
    #[error("invalid {column} value '{value}' at line {line} of {path}")]
    InvalidValue {
        column: String,
        value: String,
        line: usize,
        path: PathBuf,
    },
}

impl IngestError {
    pub(crate) fn csv(path: impl Into<PathBuf>, source: csv::Error) -> Self {
        let path = path.into();
        let not_found = matches!(
            source.kind(),
            csv::ErrorKind::Io(err) if err.kind() == std::io::ErrorKind::NotFound
        );
        if not_found {
            Self::FileNotFound { path }
        } else {
            Self::Csv { path, source }
        }
    }
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
