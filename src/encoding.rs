//! Preparing raw file bytes for the reader.
//!
//! The tokenizer works on bytes and only cares about `"`, `\r`, `\n` and the
//! delimiter, all ASCII. Input in an encoding where those bytes mean something
//! else (UTF-16, for one) must be transcoded to UTF-8 first.

use std::borrow::Cow;

use chardetng::EncodingDetector;
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE};

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// Check if `data` is valid UTF-8.
#[inline]
pub fn is_utf8(data: &[u8]) -> bool {
    simdutf8::basic::from_utf8(data).is_ok()
}

/// Strip a leading UTF-8 byte order mark.
pub fn skip_bom(data: &[u8]) -> &[u8] {
    data.strip_prefix(UTF8_BOM).unwrap_or(data)
}

/// Input bytes converted to UTF-8.
#[derive(Debug, Clone)]
pub struct Decoded<'a> {
    /// UTF-8 bytes, without a byte order mark.
    pub data: Cow<'a, [u8]>,
    /// The encoding the input was read as.
    pub encoding: &'static Encoding,
    /// Whether any byte sequence was malformed and replaced.
    pub had_errors: bool,
}

impl Decoded<'_> {
    /// True if the input was already UTF-8 and is borrowed unchanged.
    pub fn is_borrowed(&self) -> bool {
        matches!(self.data, Cow::Borrowed(_))
    }
}

/// Convert `data` to UTF-8.
///
/// A UTF-16 byte order mark wins; otherwise valid UTF-8 is borrowed as is
/// and anything else is guessed with chardetng and transcoded.
pub fn decode_to_utf8(data: &[u8]) -> Decoded<'_> {
    if let Some((encoding, _)) = Encoding::for_bom(data) {
        if encoding == UTF_16LE || encoding == UTF_16BE {
            return transcode(data, encoding);
        }
    }

    let data = skip_bom(data);
    if is_utf8(data) {
        return Decoded {
            data: Cow::Borrowed(data),
            encoding: UTF_8,
            had_errors: false,
        };
    }

    let mut detector = EncodingDetector::new();
    detector.feed(data, true);
    let encoding = detector.guess(None, true);
    tracing::debug!(encoding = encoding.name(), "input is not UTF-8, transcoding");
    transcode(data, encoding)
}

fn transcode<'a>(data: &'a [u8], encoding: &'static Encoding) -> Decoded<'a> {
    // decode() strips any BOM and falls back to the BOM's encoding
    let (text, used, had_errors) = encoding.decode(data);
    let data = match text {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    };
    Decoded {
        data,
        encoding: used,
        had_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_utf8() {
        assert!(is_utf8(b"a,b\n"));
        assert!(is_utf8("名前,値".as_bytes()));
        assert!(!is_utf8(&[0xFF, 0xFE, 0x00]));
    }

    #[test]
    fn test_skip_bom() {
        assert_eq!(skip_bom(&[0xEF, 0xBB, 0xBF, b'a']), b"a");
        assert_eq!(skip_bom(b"a"), b"a");
    }

    #[test]
    fn test_utf8_is_borrowed() {
        let decoded = decode_to_utf8(b"\xEF\xBB\xBFa,b\n");
        assert!(decoded.is_borrowed());
        assert_eq!(decoded.encoding, UTF_8);
        assert_eq!(&decoded.data[..], b"a,b\n");
    }

    #[test]
    fn test_utf16le_bom() {
        let data: &[u8] = &[0xFF, 0xFE, b'a', 0, b',', 0, b'b', 0, b'\n', 0];
        let decoded = decode_to_utf8(data);
        assert_eq!(decoded.encoding, UTF_16LE);
        assert_eq!(&decoded.data[..], b"a,b\n");
        assert!(!decoded.had_errors);
    }

    #[test]
    fn test_legacy_single_byte() {
        // "café,1\n" in windows-1252
        let data: &[u8] = &[b'c', b'a', b'f', 0xE9, b',', b'1', b'\n'];
        let decoded = decode_to_utf8(data);
        assert!(!decoded.is_borrowed());
        assert!(is_utf8(&decoded.data));
        assert!(decoded.data.ends_with(b",1\n"));
    }
}
