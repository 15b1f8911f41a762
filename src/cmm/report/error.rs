use std::path::PathBuf;

use thiserror::Error;

/// Convenient alias for fallible results returned throughout the crate.
pub type Result<T> = std::result::Result<T, ReportError>;

/// Error type covering the fatal preconditions of a report run. Data anomalies
/// inside the workbooks never surface here; they degrade to defaults.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Wrapper for IO failures such as reading or writing files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Raised when the run summary cannot be serialised.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Errors raised while loading, editing or saving the template document.
    #[error("template workbook error: {0}")]
    Template(String),

    /// Errors bubbled up from the Excel reader implementation.
    #[error("Excel read error: {0}")]
    ExcelRead(#[from] calamine::XlsxError),

    /// Raised when the user provides a path that does not exist.
    #[error("input file not found: {0}")]
    MissingInput(PathBuf),

    /// Raised when a workbook lacks a sheet the run depends on.
    #[error("{workbook} workbook has no sheet named '{sheet}'")]
    MissingSheet { workbook: String, sheet: String },

    /// Raised when the target workbook was not signed off by a known inspector.
    #[error("inspector check failed: cell {cell} holds {found:?}")]
    InspectorNotAllowed { cell: String, found: String },

    /// Raised when a sheet name is added twice to the same workbook.
    #[error("duplicate sheet name '{0}'")]
    DuplicateSheet(String),

    /// Raised when a workbook does not follow the expected conventions.
    #[error("invalid workbook structure: {0}")]
    InvalidWorkbook(String),

    /// Raised when the tracing subscriber fails to initialise.
    #[error("failed to initialise logging: {0}")]
    Logging(String),
}

impl ReportError {
    pub(crate) fn missing_sheet(workbook: &str, sheet: &str) -> Self {
        ReportError::MissingSheet {
            workbook: workbook.to_string(),
            sheet: sheet.to_string(),
        }
    }
}
