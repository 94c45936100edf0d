//! # Ordered Viewer
//!
//! Keeps the base sorted on its leading `num_keys` columns. Lookup is a
//! binary search for the key's lower bound; insert replaces on an exact
//! key match and otherwise lands at the lower bound; writing a key column
//! relocates the row to its new sorted position.

use std::cmp::Ordering;

use eyre::Result;

use crate::store::{CellBuf, Cursor, View};

use super::{key_usable, Lookup, Viewer};

/// Viewer that maintains a sorted-by-key-prefix base.
#[derive(Debug, Clone)]
pub struct OrderedViewer {
    base: View,
    num_keys: usize,
}

impl OrderedViewer {
    pub(crate) fn new(base: View, num_keys: usize) -> OrderedViewer {
        OrderedViewer { base, num_keys }
    }

    /// Orders `key` relative to base row `row` on the key columns.
    fn key_compare(&self, row: usize, key: &Cursor) -> Result<Ordering> {
        for i in 0..self.num_keys {
            let image = self.base.cell(row, i)?;
            let ord = key.container().handler(i)?.compare(key.row(), &image)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }
}

impl Viewer for OrderedViewer {
    fn template(&self) -> Result<View> {
        Ok(self.base.template())
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn lookup(&self, key: &Cursor) -> Result<Lookup> {
        if !key_usable(&self.base, key, self.num_keys)? {
            return Ok(Lookup::Unusable);
        }
        let pos = self.base.search(key, self.num_keys)?;
        if pos < self.base.size() && self.key_compare(pos, key)? == Ordering::Equal {
            Ok(Lookup::Hit { row: pos })
        } else {
            Ok(Lookup::Miss { pos })
        }
    }

    fn get(&self, row: usize, col: usize) -> Result<CellBuf> {
        self.base.cell(row, col)
    }

    /// Writing a key column moves the row: the row is copied, removed, and
    /// re-inserted at its new sorted position.
    fn set(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()> {
        if col < self.num_keys {
            let old = self.base.cell(row, col)?;
            if old[..] == *image {
                return Ok(());
            }
        }

        self.base.set_cell(row, col, image)?;

        if col < self.num_keys {
            // Searching around a mis-sorted row is unreliable, so relocate
            // it wholesale.
            let copy = self.base.fetch_row(row)?;
            self.remove(row, 1)?;
            self.insert(0, &copy.into_cursor(), 1)?; // position is ignored
        }

        Ok(())
    }

    /// The caller's `pos` is ignored; the key decides the position.
    /// Duplicate keys replace, so multi-row inserts collapse to one row.
    fn insert(&mut self, _pos: usize, value: &Cursor, count: usize) -> Result<()> {
        eyre::ensure!(count > 0, "insert count must be positive");

        match self.lookup(value)? {
            Lookup::Unusable => {
                eyre::bail!("insert value lacks the key columns of the ordered view")
            }
            Lookup::Hit { row } => self.base.set_row(row, &value.fetch_row()?),
            Lookup::Miss { pos } => self.base.insert_rows(pos, &value.fetch_row()?, 1),
        }
    }

    fn remove(&mut self, pos: usize, count: usize) -> Result<()> {
        self.base.remove_rows(pos, count)
    }
}
