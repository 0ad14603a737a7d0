//! Delimiter matching.

use crate::error::{CsvError, Result};

/// Decides which bytes separate cells.
///
/// A matcher must never accept `"`, `\r` or `\n`; readers refuse to build
/// with one that does.
pub trait DelimiterMatcher {
    fn is_delimiter(&self, byte: u8) -> bool;
}

/// Bytes no delimiter may match.
pub(crate) const RESERVED: [u8; 3] = [b'"', b'\r', b'\n'];

/// Check a matcher against the reserved bytes.
pub(crate) fn validate<D: DelimiterMatcher + ?Sized>(matcher: &D) -> Result<()> {
    match RESERVED.iter().find(|&&b| matcher.is_delimiter(b)) {
        Some(&b) => Err(CsvError::InvalidDelimiter(b)),
        None => Ok(()),
    }
}

/// A set of delimiter bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delimiter {
    table: [bool; 256],
}

impl Delimiter {
    /// Build a delimiter set. Fails if the set is empty or holds a reserved byte.
    pub fn new(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(CsvError::InvalidDelimiter(0));
        }
        let mut table = [false; 256];
        for &b in bytes {
            if RESERVED.contains(&b) {
                return Err(CsvError::InvalidDelimiter(b));
            }
            table[b as usize] = true;
        }
        Ok(Self { table })
    }

    /// The bytes in this set, in ascending order.
    pub fn bytes(&self) -> Vec<u8> {
        (0..=255u8).filter(|&b| self.table[b as usize]).collect()
    }
}

impl Default for Delimiter {
    fn default() -> Self {
        let mut table = [false; 256];
        table[b',' as usize] = true;
        Self { table }
    }
}

impl DelimiterMatcher for Delimiter {
    #[inline]
    fn is_delimiter(&self, byte: u8) -> bool {
        self.table[byte as usize]
    }
}

impl DelimiterMatcher for u8 {
    #[inline]
    fn is_delimiter(&self, byte: u8) -> bool {
        *self == byte
    }
}

impl<F: Fn(u8) -> bool> DelimiterMatcher for F {
    #[inline]
    fn is_delimiter(&self, byte: u8) -> bool {
        self(byte)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_comma() {
        let d = Delimiter::default();
        assert!(d.is_delimiter(b','));
        assert!(!d.is_delimiter(b';'));
        assert_eq!(d.bytes(), vec![b',']);
    }

    #[test]
    fn test_set() {
        let d = Delimiter::new(b";\t").unwrap();
        assert!(d.is_delimiter(b';'));
        assert!(d.is_delimiter(b'\t'));
        assert!(!d.is_delimiter(b','));
        assert_eq!(d.bytes(), vec![b'\t', b';']);
    }

    #[test]
    fn test_reserved_rejected() {
        assert!(matches!(
            Delimiter::new(b",\""),
            Err(CsvError::InvalidDelimiter(b'"'))
        ));
        assert!(matches!(
            Delimiter::new(b"\r"),
            Err(CsvError::InvalidDelimiter(b'\r'))
        ));
        assert!(Delimiter::new(b"").is_err());
    }

    #[test]
    fn test_validate_closure() {
        assert!(validate(&|b: u8| b == b'|').is_ok());
        assert!(matches!(
            validate(&|b: u8| b.is_ascii_whitespace()),
            Err(CsvError::InvalidDelimiter(b'\r'))
        ));
        assert!(validate(&b'\n').is_err());
    }
}
