use foldhash::{HashMap, HashMapExt};

/// Column names taken from the first row of a stream.
#[derive(Debug, Clone, Default)]
pub struct Header {
    names: Vec<String>,
    index: HashMap<String, usize>,
}

impl Header {
    /// Build a header from owned names. Duplicate names resolve to the first column.
    pub fn new(names: Vec<String>) -> Self {
        let mut index = HashMap::with_capacity(names.len());
        for (i, name) in names.iter().enumerate() {
            index.entry(name.clone()).or_insert(i);
        }
        Self { names, index }
    }

    /// Build a header from raw cell bytes. Invalid UTF-8 is replaced lossily.
    pub(crate) fn from_cells<'a>(cells: impl Iterator<Item = &'a [u8]>) -> Self {
        let names = cells
            .map(|cell| match simdutf8::basic::from_utf8(cell) {
                Ok(s) => s.to_owned(),
                Err(_) => String::from_utf8_lossy(cell).into_owned(),
            })
            .collect();
        Self::new(names)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Name of column `index` (0-based), or `""` when there is none.
    #[inline]
    pub fn name(&self, index: usize) -> &str {
        self.names.get(index).map_or("", String::as_str)
    }

    /// Position of the column called `name`.
    pub fn position(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        let header = Header::new(vec!["id".into(), "name".into(), "id".into()]);
        assert_eq!(header.len(), 3);
        assert_eq!(header.name(1), "name");
        assert_eq!(header.name(9), "");
        assert_eq!(header.position("name"), Some(1));
        assert_eq!(header.position("id"), Some(0));
        assert_eq!(header.position("missing"), None);
    }

    #[test]
    fn test_from_cells_lossy() {
        let cells: [&[u8]; 2] = [b"ok", &[0x66, 0xFF]];
        let header = Header::from_cells(cells.into_iter());
        assert_eq!(header.name(0), "ok");
        assert_eq!(header.name(1), "f\u{FFFD}");
    }

    #[test]
    fn test_empty() {
        let header = Header::default();
        assert!(header.is_empty());
        assert_eq!(header.name(0), "");
    }
}
