//! Single-cell tokenizer.
//!
//! Reads one cell from an [`Input`], appending its unescaped bytes to the row
//! buffer, and reports how the cell ended. Malformed cells are skip-scanned to
//! the next genuine boundary so the row assembler can resynchronize.

use crate::delimiter::DelimiterMatcher;
use crate::input::Input;

pub(crate) const QUOTE: u8 = b'"';

#[inline]
pub(crate) const fn is_newline(byte: u8) -> bool {
    byte == b'\n' || byte == b'\r'
}

/// What follows a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellEnd {
    /// A delimiter; the row continues.
    Delimiter,
    /// A newline byte; the row ends. A `\r` may still be followed by `\n`.
    Newline(u8),
    /// The input is exhausted; the row ends.
    EndOfInput,
}

impl CellEnd {
    #[inline]
    pub(crate) fn continues(self) -> bool {
        matches!(self, CellEnd::Delimiter)
    }
}

/// Result of reading one cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CellOutcome {
    /// The cell is well formed.
    Complete(CellEnd),
    /// The cell's quoting is malformed; its remainder was skipped.
    Bad(CellEnd),
    /// The input ended inside a quoted cell.
    UnexpectedEnd,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SkipState {
    /// Inside a quoted run, looking for the closing quote.
    InQuotedBody,
    /// Just read a quote inside a quoted run.
    AfterClosingQuote,
    /// Outside quotes, looking for a delimiter or newline. Holds the byte to examine.
    Resyncing(u8),
}

/// Read one cell starting at `first`, which has already been consumed.
pub(crate) fn read_cell<I, D>(first: u8, input: &mut I, delimiter: &D, buf: &mut Vec<u8>) -> CellOutcome
where
    I: Input + ?Sized,
    D: DelimiterMatcher + ?Sized,
{
    if first == QUOTE {
        read_quoted(input, delimiter, buf)
    } else {
        read_unquoted(first, input, delimiter, buf)
    }
}

fn read_quoted<I, D>(input: &mut I, delimiter: &D, buf: &mut Vec<u8>) -> CellOutcome
where
    I: Input + ?Sized,
    D: DelimiterMatcher + ?Sized,
{
    loop {
        let Some(byte) = input.next_byte() else {
            return CellOutcome::UnexpectedEnd;
        };
        if byte != QUOTE {
            buf.push(byte);
            continue;
        }
        let Some(after) = input.next_byte() else {
            return CellOutcome::Complete(CellEnd::EndOfInput);
        };
        if after == QUOTE {
            buf.push(QUOTE);
        } else if delimiter.is_delimiter(after) {
            return CellOutcome::Complete(CellEnd::Delimiter);
        } else if is_newline(after) {
            return CellOutcome::Complete(CellEnd::Newline(after));
        } else {
            return CellOutcome::Bad(skip_from(SkipState::Resyncing(after), input, delimiter));
        }
    }
}

fn read_unquoted<I, D>(first: u8, input: &mut I, delimiter: &D, buf: &mut Vec<u8>) -> CellOutcome
where
    I: Input + ?Sized,
    D: DelimiterMatcher + ?Sized,
{
    let mut byte = first;
    loop {
        if byte == QUOTE {
            // the stray quote opens a quoted run for the skip
            return CellOutcome::Bad(skip_from(SkipState::InQuotedBody, input, delimiter));
        }
        if delimiter.is_delimiter(byte) {
            return CellOutcome::Complete(CellEnd::Delimiter);
        }
        if is_newline(byte) {
            return CellOutcome::Complete(CellEnd::Newline(byte));
        }
        buf.push(byte);
        match input.next_byte() {
            Some(next) => byte = next,
            None => return CellOutcome::Complete(CellEnd::EndOfInput),
        }
    }
}

/// Skip one cell starting at `first` (already consumed) without buffering it.
pub(crate) fn skip_cell<I, D>(first: u8, input: &mut I, delimiter: &D) -> CellEnd
where
    I: Input + ?Sized,
    D: DelimiterMatcher + ?Sized,
{
    let state = if first == QUOTE {
        SkipState::InQuotedBody
    } else {
        SkipState::Resyncing(first)
    };
    skip_from(state, input, delimiter)
}

fn skip_from<I, D>(mut state: SkipState, input: &mut I, delimiter: &D) -> CellEnd
where
    I: Input + ?Sized,
    D: DelimiterMatcher + ?Sized,
{
    loop {
        state = match state {
            SkipState::InQuotedBody => match input.next_byte() {
                None => return CellEnd::EndOfInput,
                Some(QUOTE) => SkipState::AfterClosingQuote,
                Some(_) => SkipState::InQuotedBody,
            },
            SkipState::AfterClosingQuote => match input.next_byte() {
                None => return CellEnd::EndOfInput,
                Some(QUOTE) => SkipState::InQuotedBody,
                Some(b) if delimiter.is_delimiter(b) => return CellEnd::Delimiter,
                Some(b) if is_newline(b) => return CellEnd::Newline(b),
                Some(b) => SkipState::Resyncing(b),
            },
            SkipState::Resyncing(b) => {
                if delimiter.is_delimiter(b) {
                    return CellEnd::Delimiter;
                }
                if is_newline(b) {
                    return CellEnd::Newline(b);
                }
                match input.next_byte() {
                    None => return CellEnd::EndOfInput,
                    Some(next) => SkipState::Resyncing(next),
                }
            }
        };
    }
}
