//! # Read-Only Viewer
//!
//! Forwards reads to the base and refuses every mutation. Lookup narrows
//! the whole base to the run of rows matching the key, which assumes the
//! base is sorted on the key's properties.

use eyre::Result;

use crate::store::{CellBuf, Cursor, View};

use super::{Lookup, Viewer};

/// Viewer that exposes the base for reading only.
#[derive(Debug, Clone)]
pub struct ReadOnlyViewer {
    base: View,
}

impl ReadOnlyViewer {
    pub(crate) fn new(base: View) -> ReadOnlyViewer {
        ReadOnlyViewer { base }
    }
}

impl Viewer for ReadOnlyViewer {
    fn template(&self) -> Result<View> {
        Ok(self.base.template())
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn lookup(&self, key: &Cursor) -> Result<Lookup> {
        match self.base.restrict_search(key)? {
            None => Ok(Lookup::Unusable),
            Some((pos, count)) if count > 0 => Ok(Lookup::Hit { row: pos }),
            Some((pos, _)) => Ok(Lookup::Miss { pos }),
        }
    }

    fn get(&self, row: usize, col: usize) -> Result<CellBuf> {
        self.base.cell(row, col)
    }

    fn set(&mut self, _row: usize, _col: usize, _image: &[u8]) -> Result<()> {
        eyre::bail!("read-only view refuses mutation")
    }

    fn insert(&mut self, _pos: usize, _value: &Cursor, _count: usize) -> Result<()> {
        eyre::bail!("read-only view refuses mutation")
    }

    fn remove(&mut self, _pos: usize, _count: usize) -> Result<()> {
        eyre::bail!("read-only view refuses mutation")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::Row;
    use crate::types::{Property, Value};

    fn sorted_base() -> View {
        let v = View::with_properties(vec![Property::int("k")]);
        for (i, k) in [2, 4, 4, 6].iter().enumerate() {
            v.insert_rows(i, &Row::new().with(Property::int("k"), Value::Int(*k)), 1)
                .unwrap();
        }
        v
    }

    fn key(k: i64) -> Cursor {
        Row::new()
            .with(Property::int("k"), Value::Int(k))
            .into_cursor()
    }

    #[test]
    fn reads_forward_to_base() {
        let ro = ReadOnlyViewer::new(sorted_base());
        assert_eq!(ro.size(), 4);
        assert_eq!(&ro.get(1, 0).unwrap()[..], &4i64.to_le_bytes());
    }

    #[test]
    fn lookup_narrows_to_first_match() {
        let ro = ReadOnlyViewer::new(sorted_base());
        assert_eq!(ro.lookup(&key(4)).unwrap(), Lookup::Hit { row: 1 });
        assert_eq!(ro.lookup(&key(5)).unwrap(), Lookup::Miss { pos: 3 });
    }

    #[test]
    fn mutation_is_refused() {
        let mut ro = ReadOnlyViewer::new(sorted_base());
        assert!(ro.set(0, 0, &1i64.to_le_bytes()).is_err());
        assert!(ro.remove(0, 1).is_err());
        let value = Row::new().with(Property::int("k"), Value::Int(9));
        assert!(ro.insert(0, &value.into_cursor(), 1).is_err());
    }
}
