use thiserror::Error;

pub mod batch;
pub mod board;
pub mod format;
pub mod solver;

#[derive(Debug, Error)]
pub enum SudokuError {
    #[error("Board must be exactly 9x9")]
    InvalidShape,
    #[error("Invalid value at position ({row}, {col}): {value}")]
    InvalidValue { row: usize, col: usize, value: i32 },
    #[error("Duplicate digit {digit} in {unit} {index}")]
    DuplicateDigit {
        digit: i32,
        unit: &'static str,
        index: usize,
    },
    #[error("Format error: {0}")]
    FormatError(String),
    #[error("Unsupported format: {0} (supported formats: grid, flat)")]
    UnsupportedFormat(String),
    #[error("Unknown strategy: {0} (supported strategies: first-empty, most-constrained)")]
    UnknownStrategy(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Batch error: {0}")]
    BatchError(String),
}

pub type Result<T> = std::result::Result<T, SudokuError>;
