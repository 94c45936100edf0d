//! # Indexed Viewer
//!
//! Maintains a secondary sorted index: a persisted permutation map whose
//! `i`-th entry is the base row index of the `i`-th row under the index
//! properties. Construction rebuilds the map whenever its size disagrees
//! with the base; `remove` maintains it eagerly.
//!
//! Lookup binary-searches the base itself and is therefore only meaningful
//! when the base is sorted on the index properties, the same restriction
//! the ordered viewer formalizes.

use std::cmp::Ordering;

use eyre::Result;

use crate::store::{CellBuf, Cursor, View};
use crate::types::{DataType, Property, Value};

use super::{Lookup, Viewer};

/// Viewer that keeps a sorted permutation of the base in a map sequence.
#[derive(Debug, Clone)]
pub struct IndexedViewer {
    base: View,
    map: View,
    props: Vec<String>,
    unique: bool,
}

impl IndexedViewer {
    pub(crate) fn new(base: View, map: View, props: &[&str], unique: bool) -> Result<IndexedViewer> {
        eyre::ensure!(!props.is_empty(), "indexed view needs at least one index property");
        eyre::ensure!(
            map.num_properties() == 1 && map.nth_property(0)?.data_type() == DataType::Int,
            "permutation map must have exactly one integer property"
        );

        let viewer = IndexedViewer {
            base,
            map,
            props: props.iter().map(|s| s.to_string()).collect(),
            unique,
        };

        if viewer.map.size() != viewer.base.size() {
            viewer.rebuild_map()?;
        }

        Ok(viewer)
    }

    /// Empty sequence with the permutation-map schema.
    pub fn map_template() -> View {
        View::with_properties(vec![Property::int("_X")])
    }

    fn rebuild_map(&self) -> Result<()> {
        let names: Vec<&str> = self.props.iter().map(|s| s.as_str()).collect();
        let perm = self.base.sort_permutation(&names)?;
        self.map.set_size(perm.len())?;
        for (i, &orig) in perm.iter().enumerate() {
            self.map.set_value(i, 0, Value::Int(orig as i64))?;
        }
        Ok(())
    }

    /// Orders `key` relative to base row `row` on the index columns.
    fn key_compare(&self, row: usize, key: &Cursor) -> Result<Ordering> {
        for i in 0..self.props.len() {
            let image = self.base.cell(row, i)?;
            let ord = key.container().handler(i)?.compare(key.row(), &image)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }
}

impl Viewer for IndexedViewer {
    fn template(&self) -> Result<View> {
        Ok(self.base.template())
    }

    fn size(&self) -> usize {
        self.base.size()
    }

    fn lookup(&self, key: &Cursor) -> Result<Lookup> {
        let container = key.container();
        for name in &self.props {
            if container.find_property(name).is_none() {
                return Ok(Lookup::Unusable);
            }
        }
        let pos = self.base.search(key, self.props.len())?;
        if pos < self.base.size() && self.key_compare(pos, key)? == Ordering::Equal {
            Ok(Lookup::Hit { row: pos })
        } else {
            Ok(Lookup::Miss { pos })
        }
    }

    fn get(&self, row: usize, col: usize) -> Result<CellBuf> {
        self.base.cell(row, col)
    }

    fn set(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()> {
        let prop = self.base.nth_property(col)?;
        let key_mod = self.props.iter().any(|p| p == prop.name());

        if key_mod {
            let old = self.base.cell(row, col)?;
            if old[..] == *image {
                return Ok(());
            }
        }

        self.base.set_cell(row, col, image)?;

        if key_mod {
            // TODO: relocate this row's map entry when a key column changes
        }

        Ok(())
    }

    /// In unique mode at most one row is inserted; in both modes an exact
    /// key match replaces the existing row. The permutation map is
    /// reconciled at construction, not here.
    fn insert(&mut self, _pos: usize, value: &Cursor, count: usize) -> Result<()> {
        eyre::ensure!(count > 0, "insert count must be positive");

        match self.lookup(value)? {
            Lookup::Unusable => {
                eyre::bail!("insert value lacks the index columns of the indexed view")
            }
            Lookup::Hit { row } => self.base.set_row(row, &value.fetch_row()?),
            Lookup::Miss { pos } => self.base.insert_rows(pos, &value.fetch_row()?, 1),
        }
    }

    fn remove(&mut self, pos: usize, count: usize) -> Result<()> {
        self.base.remove_rows(pos, count)?;

        let lo = pos as i64;
        let hi = (pos + count) as i64;
        let mut n = self.map.size();
        while n > 0 {
            n -= 1;
            let v = self
                .map
                .value(n, 0)?
                .as_int()
                .ok_or_else(|| eyre::eyre!("permutation entry is not an integer"))?;
            if v >= lo {
                if v < hi {
                    self.map.remove_rows(n, 1)?;
                } else {
                    self.map.set_value(n, 0, Value::Int(v - count as i64))?;
                }
            }
        }

        Ok(())
    }
}
