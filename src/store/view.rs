//! # Shared Sequence Handle
//!
//! `View` is the handle through which the host and every viewer reach a
//! sequence. Clones are cheap and alias the same storage, so two viewers
//! over the same base observe each other's mutations; all rows and cells
//! are owned by the sequence behind the handle.
//!
//! Besides forwarding the `Sequence` contract, `View` carries the generic
//! algorithms the viewers compose: binary lower-bound `search` on a sorted
//! base, exact-match narrowing `restrict_search`, `sort_permutation`, and
//! row-range `slice`.

use std::cell::RefCell;
use std::cmp::Ordering;
use std::fmt;
use std::rc::Rc;

use eyre::Result;

use crate::types::{Property, Value};

use super::{CellBuf, Cursor, Handler, MemSequence, Row, Sequence};

/// Cheap clonable handle to a shared row sequence.
#[derive(Clone)]
pub struct View {
    seq: Rc<RefCell<dyn Sequence>>,
}

impl View {
    /// Creates an empty in-memory sequence with the given schema.
    pub fn with_properties(props: Vec<Property>) -> View {
        View {
            seq: Rc::new(RefCell::new(MemSequence::new(props))),
        }
    }

    /// Wraps an existing sequence.
    pub fn from_sequence(seq: Rc<RefCell<dyn Sequence>>) -> View {
        View { seq }
    }

    /// Returns true if both handles alias the same sequence.
    pub fn same_sequence(&self, other: &View) -> bool {
        Rc::ptr_eq(&self.seq, &other.seq)
    }

    /// Number of rows.
    pub fn size(&self) -> usize {
        self.seq.borrow().size()
    }

    /// Grows (with default cells) or truncates to exactly `n` rows.
    pub fn set_size(&self, n: usize) -> Result<()> {
        self.seq.borrow_mut().set_size(n)
    }

    /// Number of properties.
    pub fn num_properties(&self) -> usize {
        self.seq.borrow().num_properties()
    }

    /// Property at column `col`.
    pub fn nth_property(&self, col: usize) -> Result<Property> {
        self.seq.borrow().nth_property(col)
    }

    /// Column index of the named property.
    pub fn find_property(&self, name: &str) -> Option<usize> {
        self.seq.borrow().find_property(name)
    }

    /// Full schema of the sequence.
    pub fn properties(&self) -> Vec<Property> {
        let seq = self.seq.borrow();
        (0..seq.num_properties())
            .map(|c| seq.nth_property(c).expect("column within bounds"))
            .collect()
    }

    /// Empty view with the same schema.
    pub fn template(&self) -> View {
        View::with_properties(self.properties())
    }

    /// Byte image of the cell at (`row`, `col`).
    pub fn cell(&self, row: usize, col: usize) -> Result<CellBuf> {
        self.seq.borrow().cell(row, col)
    }

    /// Overwrites the cell at (`row`, `col`) from a byte image.
    pub fn set_cell(&self, row: usize, col: usize, image: &[u8]) -> Result<()> {
        self.seq.borrow_mut().set_cell(row, col, image)
    }

    /// Typed value of the cell at (`row`, `col`).
    pub fn value(&self, row: usize, col: usize) -> Result<Value> {
        self.seq.borrow().value(row, col)
    }

    /// Overwrites the cell at (`row`, `col`) with a typed value.
    pub fn set_value(&self, row: usize, col: usize, value: Value) -> Result<()> {
        self.seq.borrow_mut().set_value(row, col, value)
    }

    /// Nested view stored in the cell at (`row`, `col`).
    pub fn subview(&self, row: usize, col: usize) -> Result<View> {
        match self.value(row, col)? {
            Value::View(v) => Ok(v),
            other => eyre::bail!("cell holds a {:?}, not a view", other.data_type()),
        }
    }

    /// Inserts `count` copies of `row` at `pos`.
    pub fn insert_rows(&self, pos: usize, row: &Row, count: usize) -> Result<()> {
        self.seq.borrow_mut().insert_rows(pos, row, count)
    }

    /// Removes `count` rows starting at `pos`.
    pub fn remove_rows(&self, pos: usize, count: usize) -> Result<()> {
        self.seq.borrow_mut().remove_rows(pos, count)
    }

    /// Overwrites the cells of row `pos` with the payload's cells.
    pub fn set_row(&self, pos: usize, row: &Row) -> Result<()> {
        self.seq.borrow_mut().set_row(pos, row)
    }

    /// Cursor naming row `row` of this view.
    pub fn cursor(&self, row: usize) -> Cursor {
        Cursor::new(self.clone(), row)
    }

    /// Per-column comparator for column `col`.
    pub fn handler(&self, col: usize) -> Result<Handler> {
        Handler::new(self.clone(), col)
    }

    /// Detached copy of row `row`.
    pub fn fetch_row(&self, row: usize) -> Result<Row> {
        let props = self.properties();
        let mut out = Row::new();
        for (col, prop) in props.into_iter().enumerate() {
            let value = self.value(row, col)?;
            out = out.with(prop, value);
        }
        Ok(out)
    }

    /// New sequence holding copies of rows `start..end`.
    ///
    /// Scalar cells are copied; view cells are shared handles.
    pub fn slice(&self, start: usize, end: usize) -> Result<View> {
        eyre::ensure!(
            start <= end && end <= self.size(),
            "slice {}..{} out of bounds (size {})",
            start,
            end,
            self.size()
        );
        let out = self.template();
        for r in start..end {
            let row = self.fetch_row(r)?;
            out.insert_rows(out.size(), &row, 1)?;
        }
        Ok(out)
    }

    /// Appends copies of every row of `other` to this view.
    pub fn append_from(&self, other: &View) -> Result<()> {
        for r in 0..other.size() {
            let row = other.fetch_row(r)?;
            self.insert_rows(self.size(), &row, 1)?;
        }
        Ok(())
    }

    /// Orders `key` relative to row `row`, comparing the given
    /// (key column, base column) pairs in order.
    fn cmp_key_row(&self, key: &Cursor, pairs: &[(usize, usize)], row: usize) -> Result<Ordering> {
        for &(k_col, b_col) in pairs {
            let image = self.cell(row, b_col)?;
            let ord = key.container().handler(k_col)?.compare(key.row(), &image)?;
            if ord != Ordering::Equal {
                return Ok(ord);
            }
        }
        Ok(Ordering::Equal)
    }

    fn lower_bound(&self, key: &Cursor, pairs: &[(usize, usize)]) -> Result<usize> {
        let mut lo = 0;
        let mut hi = self.size();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.cmp_key_row(key, pairs, mid)? == Ordering::Greater {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        Ok(lo)
    }

    fn upper_bound(&self, key: &Cursor, pairs: &[(usize, usize)]) -> Result<usize> {
        let mut lo = 0;
        let mut hi = self.size();
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if self.cmp_key_row(key, pairs, mid)? == Ordering::Less {
                hi = mid;
            } else {
                lo = mid + 1;
            }
        }
        Ok(lo)
    }

    /// Lower bound of `key` on a base sorted by its leading `num_keys`
    /// columns. The key container's leading columns must be the key
    /// columns, in base order.
    pub fn search(&self, key: &Cursor, num_keys: usize) -> Result<usize> {
        let pairs: Vec<(usize, usize)> = (0..num_keys).map(|i| (i, i)).collect();
        self.lower_bound(key, &pairs)
    }

    /// Narrows a sorted base to the run of rows matching `key` on every
    /// property of the key's container. Returns `None` when the base lacks
    /// one of the key's properties, `(pos, count)` otherwise.
    pub fn restrict_search(&self, key: &Cursor) -> Result<Option<(usize, usize)>> {
        let key_props = key.container().properties();
        let mut pairs = Vec::with_capacity(key_props.len());
        for (k_col, prop) in key_props.iter().enumerate() {
            match self.find_property(prop.name()) {
                Some(b_col) => pairs.push((k_col, b_col)),
                None => return Ok(None),
            }
        }
        let lo = self.lower_bound(key, &pairs)?;
        let hi = self.upper_bound(key, &pairs)?;
        Ok(Some((lo, hi - lo)))
    }

    /// Row indices in ascending order of the named sort columns.
    ///
    /// The sort is stable: rows with equal keys keep their base order.
    pub fn sort_permutation(&self, props: &[&str]) -> Result<Vec<usize>> {
        #[derive(PartialEq, Eq, PartialOrd, Ord)]
        enum SortKey {
            Int(i64),
            Bytes(Vec<u8>),
        }

        let mut cols = Vec::with_capacity(props.len());
        for name in props {
            let col = self
                .find_property(name)
                .ok_or_else(|| eyre::eyre!("sort property {} not in sequence", name))?;
            cols.push(col);
        }

        let n = self.size();
        let mut keys: Vec<Vec<SortKey>> = Vec::with_capacity(n);
        for row in 0..n {
            let mut key = Vec::with_capacity(cols.len());
            for &col in &cols {
                key.push(match self.value(row, col)? {
                    Value::Int(v) => SortKey::Int(v),
                    Value::Bytes(b) => SortKey::Bytes(b),
                    Value::View(_) => eyre::bail!("cannot sort on a view column"),
                });
            }
            keys.push(key);
        }

        let mut perm: Vec<usize> = (0..n).collect();
        perm.sort_by(|&a, &b| keys[a].cmp(&keys[b]));
        Ok(perm)
    }
}

impl fmt::Debug for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.seq.try_borrow() {
            Ok(seq) => f
                .debug_struct("View")
                .field("rows", &seq.size())
                .field("columns", &seq.num_properties())
                .finish(),
            Err(_) => f.write_str("View { <borrowed> }"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DataType;

    fn int_view(keys: &[i64]) -> View {
        let v = View::with_properties(vec![Property::int("k")]);
        for (i, &k) in keys.iter().enumerate() {
            v.insert_rows(i, &Row::new().with(Property::int("k"), Value::Int(k)), 1)
                .unwrap();
        }
        v
    }

    fn key_cursor(k: i64) -> Cursor {
        Row::new()
            .with(Property::int("k"), Value::Int(k))
            .into_cursor()
    }

    #[test]
    fn clones_alias_storage() {
        let a = int_view(&[1, 2]);
        let b = a.clone();
        b.remove_rows(0, 1).unwrap();
        assert_eq!(a.size(), 1);
        assert!(a.same_sequence(&b));
    }

    #[test]
    fn template_is_schema_only() {
        let v = int_view(&[1, 2, 3]);
        let t = v.template();
        assert_eq!(t.size(), 0);
        assert_eq!(t.num_properties(), 1);
        assert_eq!(t.nth_property(0).unwrap().data_type(), DataType::Int);
    }

    #[test]
    fn search_finds_lower_bound() {
        let v = int_view(&[1, 3, 5, 7, 9]);
        assert_eq!(v.search(&key_cursor(5), 1).unwrap(), 2);
        assert_eq!(v.search(&key_cursor(4), 1).unwrap(), 2);
        assert_eq!(v.search(&key_cursor(0), 1).unwrap(), 0);
        assert_eq!(v.search(&key_cursor(10), 1).unwrap(), 5);
    }

    #[test]
    fn restrict_search_narrows_to_match_run() {
        let v = int_view(&[1, 3, 3, 3, 7]);
        let (pos, count) = v.restrict_search(&key_cursor(3)).unwrap().unwrap();
        assert_eq!((pos, count), (1, 3));
        let (_, count) = v.restrict_search(&key_cursor(4)).unwrap().unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn restrict_search_rejects_foreign_properties() {
        let v = int_view(&[1]);
        let key = Row::new()
            .with(Property::int("other"), Value::Int(1))
            .into_cursor();
        assert!(v.restrict_search(&key).unwrap().is_none());
    }

    #[test]
    fn slice_copies_rows() {
        let v = int_view(&[1, 2, 3, 4]);
        let s = v.slice(1, 3).unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(s.value(0, 0).unwrap().as_int(), Some(2));
        s.set_value(0, 0, Value::Int(99)).unwrap();
        assert_eq!(v.value(1, 0).unwrap().as_int(), Some(2));
    }

    #[test]
    fn sort_permutation_orders_rows() {
        let v = int_view(&[7, 3, 9, 1, 5]);
        let perm = v.sort_permutation(&["k"]).unwrap();
        assert_eq!(perm, vec![3, 1, 4, 0, 2]);
    }

    #[test]
    fn sort_permutation_is_stable() {
        let v = View::with_properties(vec![Property::int("k"), Property::int("tag")]);
        for (i, (k, tag)) in [(2, 0), (1, 1), (2, 2), (1, 3)].iter().enumerate() {
            let row = Row::new()
                .with(Property::int("k"), Value::Int(*k))
                .with(Property::int("tag"), Value::Int(*tag));
            v.insert_rows(i, &row, 1).unwrap();
        }
        assert_eq!(v.sort_permutation(&["k"]).unwrap(), vec![1, 3, 0, 2]);
    }
}
