use std::io;
use thiserror::Error;

/// A parse fault detected while assembling a row.
///
/// Faults are handed to the installed [`ErrorPolicy`](crate::ErrorPolicy),
/// which decides whether they abort the fetch. Row indices count the rows
/// consumed before the offending one (header included), starting at 0.
/// Column indices are 1-based.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// A row holds a different number of cells than the established count.
    #[error("incorrect number of columns: {provided} provided, {expected} expected in row {row}")]
    IncorrectColumns {
        provided: usize,
        expected: usize,
        row: usize,
    },

    /// The input ended before a row (or a quoted cell) was complete.
    #[error("unexpected end in row {row}")]
    UnexpectedEnd { row: usize },

    /// A cell has malformed quoting.
    #[error("bad cell in column {column} of row {row}")]
    BadCell { column: usize, row: usize },
}

impl Fault {
    /// Row index the fault refers to.
    pub fn row(&self) -> usize {
        match *self {
            Fault::IncorrectColumns { row, .. }
            | Fault::UnexpectedEnd { row }
            | Fault::BadCell { row, .. } => row,
        }
    }
}

/// Error type for CSV reading operations.
#[derive(Error, Debug)]
pub enum CsvError {
    /// A parse fault escalated by the error policy.
    #[error("CSV fault: {0}")]
    Fault(#[from] Fault),

    /// The delimiter matcher accepts a reserved byte.
    #[error("Invalid delimiter: byte {0:#04x} is reserved")]
    InvalidDelimiter(u8),

    /// IO error from the input stream or a diagnostic sink.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// A cell could not be converted to the requested type.
    #[error("Cannot convert {value:?} in column {column} ({name}) of row {row}: {reason}")]
    Conversion {
        row: usize,
        column: usize,
        name: String,
        value: String,
        reason: String,
    },

    /// Conversion asked for more cells than the row holds.
    #[error("Row {row} has no column {column}")]
    MissingCell { row: usize, column: usize },
}

/// Result type alias for CSV reading operations.
pub type Result<T> = std::result::Result<T, CsvError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fault_messages() {
        let fault = Fault::IncorrectColumns {
            provided: 3,
            expected: 2,
            row: 2,
        };
        assert_eq!(
            fault.to_string(),
            "incorrect number of columns: 3 provided, 2 expected in row 2"
        );
        assert_eq!(
            Fault::UnexpectedEnd { row: 4 }.to_string(),
            "unexpected end in row 4"
        );
        assert_eq!(
            Fault::BadCell { column: 1, row: 0 }.to_string(),
            "bad cell in column 1 of row 0"
        );
    }

    #[test]
    fn test_fault_row() {
        assert_eq!(Fault::BadCell { column: 3, row: 7 }.row(), 7);
        assert_eq!(Fault::UnexpectedEnd { row: 1 }.row(), 1);
    }

    #[test]
    fn test_invalid_delimiter_message() {
        let err = CsvError::InvalidDelimiter(b'"');
        assert_eq!(err.to_string(), "Invalid delimiter: byte 0x22 is reserved");
    }
}
