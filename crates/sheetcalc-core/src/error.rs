//! Error types for sheetcalc core.

use thiserror::Error;

/// Errors that can occur while editing or loading a sheet.
///
/// Formula failures are not errors here: they are stored in the cell.
#[derive(Error, Debug)]
pub enum SheetError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Invalid cell reference: {0}")]
    InvalidReference(String),

    #[error("CSV file is empty")]
    EmptyCsv,

    #[error("No file path set")]
    NoFilePath,
}

pub type Result<T> = std::result::Result<T, SheetError>;
