//! Row assembly on top of the cell tokenizer.

use std::io::{BufReader, Read};
use std::marker::PhantomData;
use std::ops::Range;

use crate::de::{Cells, FromRow};
use crate::delimiter::{self, Delimiter, DelimiterMatcher};
use crate::error::{CsvError, Fault, Result};
use crate::header::Header;
use crate::input::{Input, SliceInput, StreamInput};
use crate::policy::{ErrorIgnore, ErrorPolicy};
use crate::tokenizer::{self, CellEnd, CellOutcome};

/// Configures and builds a [`Reader`].
///
/// # Example
///
/// ```
/// use csvtok::{Delimiter, ErrorFlags, ReaderBuilder};
///
/// let mut reader = ReaderBuilder::new()
///     .delimiter(Delimiter::new(b";").unwrap())
///     .error_policy(ErrorFlags::new())
///     .has_header(true)
///     .from_slice(b"id;name\n1;ann\n")
///     .unwrap();
///
/// let row = reader.fetch().unwrap().unwrap();
/// assert_eq!(row.by_name("name"), Some(&b"ann"[..]));
/// ```
#[derive(Debug, Clone)]
pub struct ReaderBuilder<P = ErrorIgnore, D = Delimiter> {
    policy: P,
    delimiter: D,
    has_header: bool,
}

impl Default for ReaderBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ReaderBuilder {
    /// Comma delimiter, faults ignored, no header.
    pub fn new() -> Self {
        Self {
            policy: ErrorIgnore,
            delimiter: Delimiter::default(),
            has_header: false,
        }
    }
}

impl<P: ErrorPolicy, D: DelimiterMatcher> ReaderBuilder<P, D> {
    /// Treat the first row as column names.
    pub fn has_header(mut self, yes: bool) -> Self {
        self.has_header = yes;
        self
    }

    /// Install the policy that receives parse faults.
    pub fn error_policy<Q: ErrorPolicy>(self, policy: Q) -> ReaderBuilder<Q, D> {
        ReaderBuilder {
            policy,
            delimiter: self.delimiter,
            has_header: self.has_header,
        }
    }

    /// Set the delimiter matcher.
    pub fn delimiter<E: DelimiterMatcher>(self, delimiter: E) -> ReaderBuilder<P, E> {
        ReaderBuilder {
            policy: self.policy,
            delimiter,
            has_header: self.has_header,
        }
    }

    /// Build a reader over `input`.
    ///
    /// Fails if the delimiter matches a reserved byte, or if the header row
    /// faults and the policy escalates it.
    pub fn build<I: Input>(self, input: I) -> Result<Reader<I, P, D>> {
        delimiter::validate(&self.delimiter)?;
        let mut reader = Reader::with_parts(input, self.policy, self.delimiter);
        if self.has_header {
            reader.read_header()?;
        }
        Ok(reader)
    }

    /// Build a reader over an in-memory slice.
    pub fn from_slice(self, data: &[u8]) -> Result<Reader<SliceInput<'_>, P, D>> {
        self.build(SliceInput::new(data))
    }

    /// Build a reader over a byte stream, buffering it internally.
    pub fn from_reader<R: Read>(self, reader: R) -> Result<Reader<StreamInput<BufReader<R>>, P, D>> {
        self.build(StreamInput::new(BufReader::new(reader)))
    }
}

/// Streaming CSV reader.
///
/// Each [`fetch`](Reader::fetch) assembles one row into a buffer that is
/// reused for the next row, so the returned [`Row`] borrows the reader.
/// The first successful row fixes the column count for the whole stream.
#[derive(Debug)]
pub struct Reader<I, P = ErrorIgnore, D = Delimiter> {
    input: I,
    policy: P,
    delimiter: D,
    header: Header,
    /// Rows that consumed input so far, header included.
    rows: usize,
    /// Established column count, 0 until the first successful row.
    columns: usize,
    done: bool,
    buffer: Vec<u8>,
    spans: Vec<Range<usize>>,
}

impl<'a> Reader<SliceInput<'a>> {
    /// Comma-delimited reader over `data` with faults ignored and no header.
    pub fn from_slice(data: &'a [u8]) -> Self {
        Self::with_parts(SliceInput::new(data), ErrorIgnore, Delimiter::default())
    }
}

impl<R: Read> Reader<StreamInput<BufReader<R>>> {
    /// Comma-delimited reader over a byte stream with faults ignored and no header.
    pub fn from_reader(reader: R) -> Self {
        Self::with_parts(
            StreamInput::new(BufReader::new(reader)),
            ErrorIgnore,
            Delimiter::default(),
        )
    }
}

impl<I: Input, P: ErrorPolicy, D: DelimiterMatcher> Reader<I, P, D> {
    fn with_parts(mut input: I, policy: P, delimiter: D) -> Self {
        let done = input.peek_byte().is_none();
        Self {
            input,
            policy,
            delimiter,
            header: Header::default(),
            rows: 0,
            columns: 0,
            done,
            buffer: Vec::new(),
            spans: Vec::new(),
        }
    }

    /// Established column count; 0 before the first successful row.
    #[inline]
    pub fn columns(&self) -> usize {
        self.columns
    }

    #[inline]
    pub fn has_header(&self) -> bool {
        !self.header.is_empty()
    }

    /// Header name of column `index`, or `""` without a header.
    #[inline]
    pub fn header(&self, index: usize) -> &str {
        self.header.name(index)
    }

    pub fn header_row(&self) -> &Header {
        &self.header
    }

    /// Position of the column named `name` in the header.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.position(name)
    }

    /// True once the input is exhausted.
    #[inline]
    pub fn done(&self) -> bool {
        self.done
    }

    /// Rows consumed so far, successful or not, header included.
    #[inline]
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn error_policy(&self) -> &P {
        &self.policy
    }

    pub fn error_policy_mut(&mut self) -> &mut P {
        &mut self.policy
    }

    pub fn delimiter(&self) -> &D {
        &self.delimiter
    }

    pub fn input(&self) -> &I {
        &self.input
    }

    pub fn input_mut(&mut self) -> &mut I {
        &mut self.input
    }

    /// Read the next row.
    ///
    /// Returns `Ok(None)` when the row faulted and the policy let it pass;
    /// the reader is then positioned at the next row. Returns `Err` when the
    /// policy escalated the fault, again with the faulty row consumed, or
    /// when the input failed, in which case the reader is done.
    pub fn fetch(&mut self) -> Result<Option<Row<'_>>> {
        if self.read_row()? {
            Ok(Some(self.current_row()))
        } else {
            Ok(None)
        }
    }

    /// Read the next row and convert it to `T`.
    pub fn fetch_into<T: FromRow>(&mut self) -> Result<Option<T>> {
        match self.fetch()? {
            Some(row) => row.deserialize().map(Some),
            None => Ok(None),
        }
    }

    /// Fill `out` front to back. Stops at end of input or at the first
    /// failed row; returns the number of slots written.
    pub fn fetch_up_to<T: FromRow>(&mut self, out: &mut [T]) -> Result<usize> {
        let mut stored = 0;
        for slot in out.iter_mut() {
            if self.done {
                break;
            }
            match self.fetch_into()? {
                Some(value) => *slot = value,
                None => break,
            }
            stored += 1;
        }
        Ok(stored)
    }

    /// Append up to `n` rows to `out`. Stops at end of input or at the first
    /// failed row; returns the number of rows appended.
    pub fn fetch_n<T: FromRow>(&mut self, n: usize, out: &mut Vec<T>) -> Result<usize> {
        let mut stored = 0;
        while stored < n && !self.done {
            match self.fetch_into()? {
                Some(value) => out.push(value),
                None => break,
            }
            stored += 1;
        }
        Ok(stored)
    }

    /// Append every remaining row to `out`, stopping early at the first failed row.
    pub fn fetch_all<T: FromRow>(&mut self, out: &mut Vec<T>) -> Result<usize> {
        self.fetch_n(usize::MAX, out)
    }

    /// Iterate over the remaining rows converted to `T`.
    ///
    /// Failed rows the policy lets pass are skipped; escalated faults and
    /// conversion errors are yielded as `Err`.
    pub fn rows_as<T: FromRow>(&mut self) -> RowsAs<'_, I, P, D, T> {
        RowsAs {
            reader: self,
            _marker: PhantomData,
        }
    }

    fn current_row(&self) -> Row<'_> {
        Row {
            buffer: &self.buffer,
            spans: &self.spans,
            header: &self.header,
            index: self.rows - 1,
        }
    }

    fn read_header(&mut self) -> Result<()> {
        if self.read_row()? {
            self.header = Header::from_cells(self.spans.iter().map(|s| &self.buffer[s.clone()]));
            tracing::trace!(columns = self.columns, "read header row");
        }
        Ok(())
    }

    /// Assemble one row into the buffer. Faults are reported to the policy
    /// only after the row has been consumed up to its terminator.
    fn read_row(&mut self) -> Result<bool> {
        self.buffer.clear();
        self.spans.clear();

        let row = self.rows;
        let outcome = match self.input.next_byte() {
            Some(first) => {
                self.rows += 1;
                self.assemble(first, row)
            }
            None => Err(Fault::UnexpectedEnd { row }),
        };
        self.done = self.input.peek_byte().is_none();

        if let Some(err) = self.input.take_error() {
            self.buffer.clear();
            self.spans.clear();
            self.done = true;
            tracing::debug!(error = %err, row, "input failed, row discarded");
            return Err(CsvError::Io(err));
        }

        match outcome {
            Ok(()) => Ok(true),
            Err(fault) => {
                self.buffer.clear();
                self.spans.clear();
                tracing::debug!(%fault, "row discarded");
                fault.report(&mut self.policy)?;
                Ok(false)
            }
        }
    }

    fn assemble(&mut self, first: u8, row: usize) -> std::result::Result<(), Fault> {
        let expected = self.columns;

        if tokenizer::is_newline(first) {
            self.finish_line(CellEnd::Newline(first));
            return Err(Fault::IncorrectColumns {
                provided: 0,
                expected: expected.max(1),
                row,
            });
        }

        let mut column = 1;
        let mut byte = first;
        loop {
            let start = self.buffer.len();
            match tokenizer::read_cell(byte, &mut self.input, &self.delimiter, &mut self.buffer) {
                CellOutcome::UnexpectedEnd => return Err(Fault::UnexpectedEnd { row }),
                CellOutcome::Bad(end) => {
                    if !end.continues() {
                        self.finish_line(end);
                        return Err(Fault::BadCell { column, row });
                    }
                    // a column count mismatch takes precedence over the bad cell
                    let provided = column + self.skip_rest_of_row();
                    if expected != 0 && provided != expected {
                        return Err(Fault::IncorrectColumns {
                            provided,
                            expected,
                            row,
                        });
                    }
                    return Err(Fault::BadCell { column, row });
                }
                CellOutcome::Complete(end) => {
                    self.spans.push(start..self.buffer.len());
                    if !end.continues() {
                        self.finish_line(end);
                        break;
                    }
                }
            }

            if expected != 0 && column >= expected {
                let provided = column + self.skip_rest_of_row();
                tracing::debug!(provided, expected, row, "skipped excess columns");
                return Err(Fault::IncorrectColumns {
                    provided,
                    expected,
                    row,
                });
            }

            column += 1;
            match self.input.next_byte() {
                Some(next) => byte = next,
                None => {
                    // trailing delimiter at end of input: one more empty cell
                    let end = self.buffer.len();
                    self.spans.push(end..end);
                    break;
                }
            }
        }

        if expected == 0 {
            self.columns = column;
        } else if column < expected {
            return Err(Fault::IncorrectColumns {
                provided: column,
                expected,
                row,
            });
        }
        Ok(())
    }

    /// Skip the cells after a delimiter up to the end of the row.
    /// Returns how many cells were skipped.
    fn skip_rest_of_row(&mut self) -> usize {
        let mut skipped = 0;
        loop {
            skipped += 1;
            let Some(byte) = self.input.next_byte() else {
                return skipped;
            };
            let end = tokenizer::skip_cell(byte, &mut self.input, &self.delimiter);
            if !end.continues() {
                self.finish_line(end);
                return skipped;
            }
        }
    }

    /// Consume the `\n` of a `\r\n` terminator.
    fn finish_line(&mut self, end: CellEnd) {
        if end == CellEnd::Newline(b'\r') && self.input.peek_byte() == Some(b'\n') {
            self.input.next_byte();
        }
    }
}

/// Iterator returned by [`Reader::rows_as`].
#[derive(Debug)]
pub struct RowsAs<'a, I, P, D, T> {
    reader: &'a mut Reader<I, P, D>,
    _marker: PhantomData<fn() -> T>,
}

impl<I: Input, P: ErrorPolicy, D: DelimiterMatcher, T: FromRow> Iterator for RowsAs<'_, I, P, D, T> {
    type Item = Result<T>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.reader.done {
            match self.reader.fetch_into() {
                Ok(Some(value)) => return Some(Ok(value)),
                Ok(None) => continue,
                Err(e) => return Some(Err(e)),
            }
        }
        None
    }
}

/// One row of cells, borrowed from the reader's row buffer.
#[derive(Debug, Clone, Copy)]
pub struct Row<'r> {
    buffer: &'r [u8],
    spans: &'r [Range<usize>],
    header: &'r Header,
    index: usize,
}

impl<'r> Row<'r> {
    /// Index of this row in the stream, header included.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.spans.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    /// Cell `column` (0-based).
    #[inline]
    pub fn get(&self, column: usize) -> Option<&'r [u8]> {
        let span = self.spans.get(column)?;
        Some(&self.buffer[span.clone()])
    }

    /// Cell in the column named `name`.
    pub fn by_name(&self, name: &str) -> Option<&'r [u8]> {
        self.get(self.header.position(name)?)
    }

    /// Header name of column `column`, or `""`.
    #[inline]
    pub fn name(&self, column: usize) -> &'r str {
        self.header.name(column)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'r [u8]> + use<'r> {
        let buffer = self.buffer;
        self.spans.iter().map(move |span| &buffer[span.clone()])
    }

    /// Sequential cursor over the cells, for conversion.
    pub fn cells(&self) -> Cells<'r> {
        Cells::new(*self)
    }

    /// Convert the row to `T`.
    pub fn deserialize<T: FromRow>(&self) -> Result<T> {
        T::from_cells(&mut self.cells())
    }
}
