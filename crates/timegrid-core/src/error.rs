use thiserror::Error;

/// Errors raised while building or editing a grid
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Unknown cell: {0}")]
    UnknownCell(String),

    #[error("Row already exists: {0}")]
    DuplicateRow(String),

    #[error("Malformed field identifier: {0}")]
    MalformedField(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Row {row} has {actual} cells, expected {expected}")]
    RowWidth {
        row: String,
        expected: usize,
        actual: usize,
    },
}
