//! Error policies deciding what a parse fault means to the caller.
//!
//! The reader reports every fault exactly once, after the offending row has
//! been fully consumed. A policy that returns `Err` aborts the current fetch;
//! the reader stays positioned at the start of the next row either way.

use std::io::{self, Write};

use crate::error::{CsvError, Fault, Result};

/// Receives parse faults from a reader.
pub trait ErrorPolicy {
    /// A row holds `provided` cells where `expected` were required.
    fn incorrect_columns(&mut self, provided: usize, expected: usize, row: usize) -> Result<()>;

    /// The input ended before row `row` was complete.
    fn unexpected_end(&mut self, row: usize) -> Result<()>;

    /// Cell `column` (1-based) of row `row` has malformed quoting.
    fn bad_cell(&mut self, column: usize, row: usize) -> Result<()>;
}

impl<P: ErrorPolicy + ?Sized> ErrorPolicy for &mut P {
    fn incorrect_columns(&mut self, provided: usize, expected: usize, row: usize) -> Result<()> {
        (**self).incorrect_columns(provided, expected, row)
    }

    fn unexpected_end(&mut self, row: usize) -> Result<()> {
        (**self).unexpected_end(row)
    }

    fn bad_cell(&mut self, column: usize, row: usize) -> Result<()> {
        (**self).bad_cell(column, row)
    }
}

impl Fault {
    /// Hand this fault to `policy`.
    pub fn report<P: ErrorPolicy + ?Sized>(self, policy: &mut P) -> Result<()> {
        match self {
            Fault::IncorrectColumns {
                provided,
                expected,
                row,
            } => policy.incorrect_columns(provided, expected, row),
            Fault::UnexpectedEnd { row } => policy.unexpected_end(row),
            Fault::BadCell { column, row } => policy.bad_cell(column, row),
        }
    }
}

/// Drops every fault. Failed rows are still skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorIgnore;

impl ErrorPolicy for ErrorIgnore {
    fn incorrect_columns(&mut self, _provided: usize, _expected: usize, _row: usize) -> Result<()> {
        Ok(())
    }

    fn unexpected_end(&mut self, _row: usize) -> Result<()> {
        Ok(())
    }

    fn bad_cell(&mut self, _column: usize, _row: usize) -> Result<()> {
        Ok(())
    }
}

/// Records one sticky flag per fault kind.
///
/// Flags stay set until [`ErrorFlags::clear`] is called.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ErrorFlags {
    incorrect_columns: bool,
    unexpected_end: bool,
    bad_cell: bool,
}

impl ErrorFlags {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn has_incorrect_columns(&self) -> bool {
        self.incorrect_columns
    }

    #[inline]
    pub fn has_unexpected_end(&self) -> bool {
        self.unexpected_end
    }

    #[inline]
    pub fn has_bad_cell(&self) -> bool {
        self.bad_cell
    }

    /// True when no flag is set.
    #[inline]
    pub fn good(&self) -> bool {
        !self.incorrect_columns && !self.unexpected_end && !self.bad_cell
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

impl ErrorPolicy for ErrorFlags {
    fn incorrect_columns(&mut self, _provided: usize, _expected: usize, _row: usize) -> Result<()> {
        self.incorrect_columns = true;
        Ok(())
    }

    fn unexpected_end(&mut self, _row: usize) -> Result<()> {
        self.unexpected_end = true;
        Ok(())
    }

    fn bad_cell(&mut self, _column: usize, _row: usize) -> Result<()> {
        self.bad_cell = true;
        Ok(())
    }
}

/// Turns every fault into `Err(CsvError::Fault(..))`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorRaise;

impl ErrorPolicy for ErrorRaise {
    fn incorrect_columns(&mut self, provided: usize, expected: usize, row: usize) -> Result<()> {
        Err(Fault::IncorrectColumns {
            provided,
            expected,
            row,
        }
        .into())
    }

    fn unexpected_end(&mut self, row: usize) -> Result<()> {
        Err(Fault::UnexpectedEnd { row }.into())
    }

    fn bad_cell(&mut self, column: usize, row: usize) -> Result<()> {
        Err(Fault::BadCell { column, row }.into())
    }
}

/// Writes one line per fault to a sink and carries on.
#[derive(Debug)]
pub struct ErrorLog<W = io::Stderr> {
    sink: W,
}

impl ErrorLog<io::Stderr> {
    /// Log to standard error.
    pub fn stderr() -> Self {
        Self { sink: io::stderr() }
    }
}

impl Default for ErrorLog<io::Stderr> {
    fn default() -> Self {
        Self::stderr()
    }
}

impl<W: Write> ErrorLog<W> {
    pub fn new(sink: W) -> Self {
        Self { sink }
    }

    pub fn sink(&self) -> &W {
        &self.sink
    }

    pub fn into_sink(self) -> W {
        self.sink
    }

    fn log(&mut self, fault: Fault) -> Result<()> {
        writeln!(self.sink, "csvtok: {fault}").map_err(CsvError::Io)
    }
}

impl<W: Write> ErrorPolicy for ErrorLog<W> {
    fn incorrect_columns(&mut self, provided: usize, expected: usize, row: usize) -> Result<()> {
        self.log(Fault::IncorrectColumns {
            provided,
            expected,
            row,
        })
    }

    fn unexpected_end(&mut self, row: usize) -> Result<()> {
        self.log(Fault::UnexpectedEnd { row })
    }

    fn bad_cell(&mut self, column: usize, row: usize) -> Result<()> {
        self.log(Fault::BadCell { column, row })
    }
}

/// Emits a `tracing` warning per fault and carries on.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorTrace;

impl ErrorPolicy for ErrorTrace {
    fn incorrect_columns(&mut self, provided: usize, expected: usize, row: usize) -> Result<()> {
        tracing::warn!(provided, expected, row, "incorrect number of columns");
        Ok(())
    }

    fn unexpected_end(&mut self, row: usize) -> Result<()> {
        tracing::warn!(row, "unexpected end of input");
        Ok(())
    }

    fn bad_cell(&mut self, column: usize, row: usize) -> Result<()> {
        tracing::warn!(column, row, "bad cell");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::ReaderBuilder;
    use std::sync::{Arc, Mutex};

    /// Shared buffer the fmt subscriber writes into.
    #[derive(Clone, Default)]
    struct Captured(Arc<Mutex<Vec<u8>>>);

    impl Write for Captured {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_ignore() {
        let mut policy = ErrorIgnore;
        assert!(policy.incorrect_columns(1, 2, 3).is_ok());
        assert!(policy.unexpected_end(0).is_ok());
        assert!(policy.bad_cell(1, 0).is_ok());
    }

    #[test]
    fn test_flags_are_sticky_and_independent() {
        let mut flags = ErrorFlags::new();
        assert!(flags.good());

        flags.bad_cell(2, 1).unwrap();
        assert!(flags.has_bad_cell());
        assert!(!flags.has_incorrect_columns());
        assert!(!flags.has_unexpected_end());
        assert!(!flags.good());

        flags.unexpected_end(4).unwrap();
        assert!(flags.has_bad_cell());
        assert!(flags.has_unexpected_end());

        flags.clear();
        assert!(flags.good());
        assert!(!flags.has_bad_cell());
        assert!(!flags.has_unexpected_end());

        flags.incorrect_columns(3, 2, 1).unwrap();
        assert!(flags.has_incorrect_columns());
        flags.clear();
        assert!(flags.good());
    }

    #[test]
    fn test_raise() {
        let err = ErrorRaise.incorrect_columns(3, 2, 2).unwrap_err();
        assert!(matches!(
            err,
            CsvError::Fault(Fault::IncorrectColumns {
                provided: 3,
                expected: 2,
                row: 2
            })
        ));
        assert_eq!(
            err.to_string(),
            "CSV fault: incorrect number of columns: 3 provided, 2 expected in row 2"
        );
        assert!(ErrorRaise.unexpected_end(0).is_err());
        assert!(ErrorRaise.bad_cell(1, 1).is_err());
    }

    #[test]
    fn test_log_writes_lines() {
        let mut log = ErrorLog::new(Vec::new());
        log.incorrect_columns(0, 2, 3).unwrap();
        log.unexpected_end(5).unwrap();
        log.bad_cell(2, 6).unwrap();
        let text = String::from_utf8(log.into_sink()).unwrap();
        assert_eq!(
            text,
            "csvtok: incorrect number of columns: 0 provided, 2 expected in row 3\n\
             csvtok: unexpected end in row 5\n\
             csvtok: bad cell in column 2 of row 6\n"
        );
    }

    #[test]
    fn test_trace_warns_and_reader_resyncs() {
        let captured = Captured::default();
        let writer = captured.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .with_max_level(tracing::Level::WARN)
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let mut reader = ReaderBuilder::new()
                .error_policy(ErrorTrace)
                .from_slice(b"a,b\n\"x\"y,z\nc,d,e\nf,g\n")
                .unwrap();
            assert!(reader.fetch().unwrap().is_some());
            assert!(reader.fetch().unwrap().is_none());
            assert!(reader.fetch().unwrap().is_none());
            let row = reader.fetch().unwrap().unwrap();
            assert_eq!(row.get(1), Some(&b"g"[..]));
            assert!(reader.done());
        });

        let text = String::from_utf8(captured.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2, "{text}");
        assert!(lines[0].contains("WARN"));
        assert!(lines[0].contains("bad cell"));
        assert!(lines[0].contains("column=1"));
        assert!(lines[0].contains("row=1"));
        assert!(lines[1].contains("incorrect number of columns"));
        assert!(lines[1].contains("provided=3"));
        assert!(lines[1].contains("expected=2"));
    }

    #[test]
    fn test_fault_report_dispatch() {
        let mut flags = ErrorFlags::new();
        Fault::BadCell { column: 1, row: 0 }.report(&mut flags).unwrap();
        assert!(flags.has_bad_cell());
        Fault::UnexpectedEnd { row: 0 }.report(&mut &mut flags).unwrap();
        assert!(flags.has_unexpected_end());
        assert!(!flags.has_incorrect_columns());
    }
}
