//! Conversion of rows into typed values.
//!
//! A [`Cells`] cursor walks a row left to right; each [`FromRow`] impl takes
//! as many cells as it needs. Scalars take one cell, `Vec<T>` takes the rest
//! of the row and tuples take one value per element.

use std::fmt::Display;
use std::str::FromStr;

use crate::error::{CsvError, Result};
use crate::reader::Row;

/// Sequential cursor over the cells of a [`Row`].
#[derive(Debug, Clone)]
pub struct Cells<'r> {
    row: Row<'r>,
    index: usize,
}

impl<'r> Cells<'r> {
    pub fn new(row: Row<'r>) -> Self {
        Self { row, index: 0 }
    }

    /// Number of cells consumed so far.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    #[inline]
    pub fn total(&self) -> usize {
        self.row.len()
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.total() - self.index
    }

    /// Header name of the next cell, or `""`.
    #[inline]
    pub fn name(&self) -> &'r str {
        self.row.name(self.index)
    }

    /// The next cell, without consuming it.
    #[inline]
    pub fn peek(&self) -> Option<&'r [u8]> {
        self.row.get(self.index)
    }

    pub fn next_cell(&mut self) -> Result<&'r [u8]> {
        let cell = self.peek().ok_or(CsvError::MissingCell {
            row: self.row.index(),
            column: self.index + 1,
        })?;
        self.index += 1;
        Ok(cell)
    }

    /// The next cell as UTF-8 text.
    pub fn next_str(&mut self) -> Result<&'r str> {
        let cell = self.next_cell()?;
        simdutf8::basic::from_utf8(cell)
            .map_err(|_| self.conversion_error(cell, "invalid UTF-8"))
    }

    /// Parse the next cell with [`FromStr`].
    pub fn parse<T>(&mut self) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        let text = self.next_str()?;
        text.parse()
            .map_err(|e: T::Err| self.conversion_error(text.as_bytes(), e))
    }

    /// Error for the cell just consumed.
    fn conversion_error(&self, value: &[u8], reason: impl Display) -> CsvError {
        let column = self.index.saturating_sub(1);
        CsvError::Conversion {
            row: self.row.index(),
            column: column + 1,
            name: self.row.name(column).to_owned(),
            value: String::from_utf8_lossy(value).into_owned(),
            reason: reason.to_string(),
        }
    }
}

/// Types that can be built from the cells of a row.
pub trait FromRow: Sized {
    fn from_cells(cells: &mut Cells<'_>) -> Result<Self>;
}

impl FromRow for String {
    fn from_cells(cells: &mut Cells<'_>) -> Result<Self> {
        cells.next_str().map(str::to_owned)
    }
}

macro_rules! from_row_via_parse {
    ($($ty:ty),* $(,)?) => {
        $(
            impl FromRow for $ty {
                fn from_cells(cells: &mut Cells<'_>) -> Result<Self> {
                    cells.parse()
                }
            }
        )*
    };
}

from_row_via_parse!(
    i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, bool, char,
);

/// An empty cell reads as `None`.
impl<T: FromRow> FromRow for Option<T> {
    fn from_cells(cells: &mut Cells<'_>) -> Result<Self> {
        if cells.peek().is_some_and(<[u8]>::is_empty) {
            cells.next_cell()?;
            return Ok(None);
        }
        T::from_cells(cells).map(Some)
    }
}

/// Takes every remaining cell.
impl<T: FromRow> FromRow for Vec<T> {
    fn from_cells(cells: &mut Cells<'_>) -> Result<Self> {
        let mut out = Vec::with_capacity(cells.remaining());
        while cells.remaining() > 0 {
            out.push(T::from_cells(cells)?);
        }
        Ok(out)
    }
}

macro_rules! from_row_tuple {
    ($($name:ident),+) => {
        impl<$($name: FromRow),+> FromRow for ($($name,)+) {
            fn from_cells(cells: &mut Cells<'_>) -> Result<Self> {
                Ok(($($name::from_cells(cells)?,)+))
            }
        }
    };
}

from_row_tuple!(A);
from_row_tuple!(A, B);
from_row_tuple!(A, B, C);
from_row_tuple!(A, B, C, D);
from_row_tuple!(A, B, C, D, E);
from_row_tuple!(A, B, C, D, E, F);
from_row_tuple!(A, B, C, D, E, F, G);
from_row_tuple!(A, B, C, D, E, F, G, H);
