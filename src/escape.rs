//! Quoting for output, the inverse of the tokenizer.

use std::io::{self, Write};

use crate::delimiter::DelimiterMatcher;
use crate::tokenizer::{QUOTE, is_newline};

/// True if `field` must be quoted in comma-delimited output.
pub fn needs_escaping(field: &[u8]) -> bool {
    needs_escaping_with(field, &b',')
}

/// True if `field` must be quoted for the given delimiter.
pub fn needs_escaping_with<D: DelimiterMatcher + ?Sized>(field: &[u8], delimiter: &D) -> bool {
    field
        .iter()
        .any(|&b| b == QUOTE || is_newline(b) || delimiter.is_delimiter(b))
}

/// Wrap `field` in quotes, doubling any inner quote.
pub fn escape(field: &[u8]) -> Vec<u8> {
    let quotes = count_quotes(field);
    let mut out = Vec::with_capacity(field.len() + quotes + 2);
    out.push(QUOTE);
    for &b in field {
        if b == QUOTE {
            out.push(QUOTE);
        }
        out.push(b);
    }
    out.push(QUOTE);
    out
}

/// [`escape`] for text.
pub fn escape_str(field: &str) -> String {
    let mut out = String::with_capacity(field.len() + count_quotes(field.as_bytes()) + 2);
    out.push('"');
    for c in field.chars() {
        if c == '"' {
            out.push('"');
        }
        out.push(c);
    }
    out.push('"');
    out
}

/// Write `field` quoted.
pub fn write_escaped<W: Write + ?Sized>(writer: &mut W, field: &[u8]) -> io::Result<()> {
    writer.write_all(&[QUOTE])?;
    for (i, chunk) in field.split(|&b| b == QUOTE).enumerate() {
        if i > 0 {
            writer.write_all(&[QUOTE, QUOTE])?;
        }
        writer.write_all(chunk)?;
    }
    writer.write_all(&[QUOTE])
}

/// Write one row terminated by `\n`, quoting only the cells that need it.
///
/// A row made of a single empty cell is written as `""`, since a bare empty
/// line reads back as a row without columns.
pub fn write_row<'a, W, I>(writer: &mut W, cells: I, delimiter: u8) -> io::Result<()>
where
    W: Write + ?Sized,
    I: IntoIterator<Item = &'a [u8]>,
{
    let mut cells = cells.into_iter().peekable();
    let mut first = true;
    while let Some(cell) = cells.next() {
        if !first {
            writer.write_all(&[delimiter])?;
        }
        let lone_empty = first && cell.is_empty() && cells.peek().is_none();
        if lone_empty || needs_escaping_with(cell, &delimiter) {
            write_escaped(writer, cell)?;
        } else {
            writer.write_all(cell)?;
        }
        first = false;
    }
    writer.write_all(b"\n")
}

#[inline]
fn count_quotes(field: &[u8]) -> usize {
    bytecount::count(field, QUOTE)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_needs_escaping() {
        assert!(!needs_escaping(b"a"));
        assert!(needs_escaping(b"\""));
        assert!(needs_escaping(b"a\"a"));
        assert!(needs_escaping(b","));
        assert!(needs_escaping(b"\r"));
        assert!(needs_escaping(b"\n"));
        assert!(needs_escaping(b"\r\n"));
        assert!(!needs_escaping_with(b"a,b", &b';'));
        assert!(needs_escaping_with(b"a;b", &b';'));
    }

    #[test]
    fn test_escape() {
        assert_eq!(escape(b"a"), b"\"a\"");
        assert_eq!(escape(b"\""), b"\"\"\"\"");
        assert_eq!(escape(b"a\"a"), b"\"a\"\"a\"");
        assert_eq!(escape(b","), b"\",\"");
        assert_eq!(escape(b"\r\n"), b"\"\r\n\"");
        assert_eq!(escape_str("a\"a"), "\"a\"\"a\"");
        assert_eq!(escape_str(""), "\"\"");
    }

    #[test]
    fn test_count_quotes() {
        assert_eq!(count_quotes(b""), 0);
        assert_eq!(count_quotes(b"plain"), 0);
        assert_eq!(count_quotes(b"\"a\"\"b\""), 4);
        assert_eq!(escape(b"\"\"").len(), 2 + 2 * 2);
    }

    #[test]
    fn test_write_escaped_matches_escape() {
        for field in [&b""[..], b"x", b"\"", b"\"\"a\"", b"no quotes"] {
            let mut out = Vec::new();
            write_escaped(&mut out, field).unwrap();
            assert_eq!(out, escape(field));
        }
    }

    #[test]
    fn test_write_row() {
        let mut out = Vec::new();
        let cells: [&[u8]; 3] = [b"plain", b"a,b", b"say \"hi\""];
        write_row(&mut out, cells, b',').unwrap();
        assert_eq!(out, b"plain,\"a,b\",\"say \"\"hi\"\"\"\n");
    }

    #[test]
    fn test_write_row_lone_empty_cell() {
        let mut out = Vec::new();
        write_row(&mut out, [&b""[..]], b',').unwrap();
        write_row(&mut out, [&b""[..], b""], b',').unwrap();
        assert_eq!(out, b"\"\"\n,\n");
    }
}
