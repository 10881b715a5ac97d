//! Error types and user-facing error message formatting.
//!
//! Missing values in the data are never errors: they are excluded from the
//! aggregate they would feed. Only the conditions below stop the dashboard.

use chrono::NaiveDate;
use polars::prelude::PolarsError;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for dashboard computations.
pub type Result<T> = std::result::Result<T, DashboardError>;

/// Errors that stop the dashboard from rendering.
#[derive(Debug, Error)]
pub enum DashboardError {
    /// The dataset file does not exist. Fatal for the session.
    #[error("data file not found: {}", path.display())]
    DataNotFound { path: PathBuf },

    /// Start date after end date. Recoverable by fixing the range.
    #[error("start date {start} is after end date {end}")]
    InvalidRange { start: NaiveDate, end: NaiveDate },

    /// The dataset lacks a column the dashboard needs.
    #[error("required column missing from dataset: {0}")]
    MissingColumn(String),

    #[error("polars error: {0}")]
    Polars(#[from] PolarsError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl DashboardError {
    /// True when nothing can be shown for the rest of the session.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, DashboardError::InvalidRange { .. })
    }

    /// One-line message suitable for the error banner.
    pub fn user_message(&self) -> String {
        match self {
            DashboardError::DataNotFound { path } => format!(
                "Data file '{}' not found. Make sure the merged dataset has been generated.",
                path.display()
            ),
            DashboardError::InvalidRange { start, end } => format!(
                "Start date ({}) must not be later than end date ({}).",
                start, end
            ),
            DashboardError::MissingColumn(name) => format!(
                "Column not found: {}. The dataset must be the merged order table.",
                name
            ),
            DashboardError::Polars(e) => user_message_from_polars(e),
            DashboardError::Io(e) => user_message_from_io(e),
        }
    }
}

/// Format a PolarsError as a user-facing message by matching on its variant.
pub fn user_message_from_polars(err: &PolarsError) -> String {
    use polars::prelude::PolarsError as PE;

    match err {
        PE::ColumnNotFound(msg) => format!("Column not found: {}", msg),
        PE::IO { error, .. } => user_message_from_io(error.as_ref()),
        PE::NoData(msg) => format!("No data: {}", msg),
        PE::SchemaMismatch(msg) => format!("Schema mismatch: {}", msg),
        PE::ComputeError(msg) => {
            let first = msg.lines().next().unwrap_or_default().trim();
            format!("Could not read data: {}", first)
        }
        PE::Context { error, msg } => {
            let inner = user_message_from_polars(error);
            format!("{}: {}", msg, inner)
        }
        #[allow(unreachable_patterns)]
        _ => err.to_string(),
    }
}

/// Format an io::Error as a user-facing message by matching on ErrorKind.
pub fn user_message_from_io(err: &io::Error) -> String {
    use std::io::ErrorKind;

    match err.kind() {
        ErrorKind::NotFound => "File or directory not found.".to_string(),
        ErrorKind::PermissionDenied => "Permission denied. Check read access.".to_string(),
        ErrorKind::InvalidData | ErrorKind::InvalidInput => {
            "Invalid or corrupted data.".to_string()
        }
        ErrorKind::UnexpectedEof => "Unexpected end of file.".to_string(),
        _ => err.to_string(),
    }
}
