//! csvtok: a streaming CSV tokenizer with column-count enforcement.
//!
//! The reader pulls bytes one at a time from an [`Input`], assembles one row
//! per [`Reader::fetch`] into a reused buffer, and hands back a [`Row`] of
//! borrowed cells. The first row fixes the column count; rows that disagree,
//! malformed quoting and truncated input are reported to a pluggable
//! [`ErrorPolicy`] and the reader resynchronizes on the next row.
//!
//! # Quick Start
//!
//! ```
//! use csvtok::{ErrorFlags, ReaderBuilder};
//!
//! let data = b"name,qty\n\"Smith, J\",3\nbad,row,here\nLee,7\n";
//! let mut reader = ReaderBuilder::new()
//!     .has_header(true)
//!     .error_policy(ErrorFlags::new())
//!     .from_slice(data)
//!     .unwrap();
//!
//! let (name, qty): (String, u32) = reader.fetch_into().unwrap().unwrap();
//! assert_eq!((name.as_str(), qty), ("Smith, J", 3));
//!
//! // three cells where two are expected: the row is skipped and flagged
//! assert!(reader.fetch().unwrap().is_none());
//! assert!(reader.error_policy().has_incorrect_columns());
//! reader.error_policy_mut().clear();
//!
//! let row = reader.fetch().unwrap().unwrap();
//! assert_eq!(row.by_name("qty"), Some(&b"7"[..]));
//! assert!(reader.done());
//! ```
//!
//! # Dialect
//!
//! Cells are separated by any byte the [`DelimiterMatcher`] accepts (comma by
//! default) and may be quoted with `"`, a doubled `""` standing for one quote.
//! Rows end at `\n`, `\r` or `\r\n`, and the last row may omit its terminator.

mod de;
mod delimiter;
pub mod encoding;
mod error;
pub mod escape;
mod header;
mod input;
mod policy;
mod reader;
mod tokenizer;

pub use de::{Cells, FromRow};
pub use delimiter::{Delimiter, DelimiterMatcher};
pub use error::{CsvError, Fault, Result};
pub use header::Header;
pub use input::{Input, SliceInput, StreamInput};
pub use policy::{ErrorFlags, ErrorIgnore, ErrorLog, ErrorPolicy, ErrorRaise, ErrorTrace};
pub use reader::{Reader, ReaderBuilder, Row, RowsAs};
