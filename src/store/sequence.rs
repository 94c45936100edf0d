//! # Sequence Contract and In-Memory Implementation
//!
//! `Sequence` is the storage contract the view layer consumes; everything a
//! viewer does reduces to these operations. `MemSequence` is the in-memory,
//! column-oriented implementation: one typed vector per property.
//!
//! ## Dynamic Properties
//!
//! Inserting a row that carries a property the sequence does not yet have
//! adds that column, back-filled with defaults for existing rows. A freshly
//! grown block base starts with empty-schema subviews and acquires its data
//! schema from the first inserted row.

use eyre::Result;

use crate::types::{DataType, Property, Value};

use super::{decode_int, CellBuf, Row, View};

/// Storage contract for an ordered sequence of typed rows.
pub trait Sequence {
    /// Number of properties (columns).
    fn num_properties(&self) -> usize;

    /// Property at column `col`.
    fn nth_property(&self, col: usize) -> Result<Property>;

    /// Column index of the property with the given name.
    fn find_property(&self, name: &str) -> Option<usize>;

    /// Number of rows.
    fn size(&self) -> usize;

    /// Grows (with default cells) or truncates to exactly `n` rows.
    fn set_size(&mut self, n: usize) -> Result<()>;

    /// Byte image of the cell at (`row`, `col`).
    fn cell(&self, row: usize, col: usize) -> Result<CellBuf>;

    /// Overwrites the cell at (`row`, `col`) from a byte image.
    fn set_cell(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()>;

    /// Typed value of the cell at (`row`, `col`).
    fn value(&self, row: usize, col: usize) -> Result<Value>;

    /// Overwrites the cell at (`row`, `col`) with a typed value.
    fn set_value(&mut self, row: usize, col: usize, value: Value) -> Result<()>;

    /// Inserts `count` copies of `row` at `pos`.
    fn insert_rows(&mut self, pos: usize, row: &Row, count: usize) -> Result<()>;

    /// Removes `count` rows starting at `pos`.
    fn remove_rows(&mut self, pos: usize, count: usize) -> Result<()>;

    /// Overwrites the cells of row `pos` with the payload's cells.
    /// Schema columns absent from the payload keep their old values.
    fn set_row(&mut self, pos: usize, row: &Row) -> Result<()>;
}

/// One typed column vector.
#[derive(Debug)]
enum Column {
    Int(Vec<i64>),
    Bytes(Vec<Vec<u8>>),
    View(Vec<View>),
}

impl Column {
    fn empty(data_type: DataType) -> Column {
        match data_type {
            DataType::Int => Column::Int(Vec::new()),
            DataType::Bytes => Column::Bytes(Vec::new()),
            DataType::View => Column::View(Vec::new()),
        }
    }

    fn data_type(&self) -> DataType {
        match self {
            Column::Int(_) => DataType::Int,
            Column::Bytes(_) => DataType::Bytes,
            Column::View(_) => DataType::View,
        }
    }

    fn truncate(&mut self, n: usize) {
        match self {
            Column::Int(v) => v.truncate(n),
            Column::Bytes(v) => v.truncate(n),
            Column::View(v) => v.truncate(n),
        }
    }

    fn push_default(&mut self) {
        match self {
            Column::Int(v) => v.push(0),
            Column::Bytes(v) => v.push(Vec::new()),
            Column::View(v) => v.push(View::with_properties(Vec::new())),
        }
    }

    fn insert(&mut self, pos: usize, value: &Value) -> Result<()> {
        match (self, value) {
            (Column::Int(v), Value::Int(x)) => v.insert(pos, *x),
            (Column::Bytes(v), Value::Bytes(b)) => v.insert(pos, b.clone()),
            (Column::View(v), Value::View(sub)) => v.insert(pos, sub.clone()),
            (col, value) => eyre::bail!(
                "cell type mismatch: column is {:?}, value is {:?}",
                col.data_type(),
                value.data_type()
            ),
        }
        Ok(())
    }

    fn insert_default(&mut self, pos: usize) {
        match self {
            Column::Int(v) => v.insert(pos, 0),
            Column::Bytes(v) => v.insert(pos, Vec::new()),
            Column::View(v) => v.insert(pos, View::with_properties(Vec::new())),
        }
    }

    fn remove(&mut self, pos: usize, count: usize) {
        match self {
            Column::Int(v) => drop(v.drain(pos..pos + count)),
            Column::Bytes(v) => drop(v.drain(pos..pos + count)),
            Column::View(v) => drop(v.drain(pos..pos + count)),
        }
    }

    fn get(&self, row: usize) -> Value {
        match self {
            Column::Int(v) => Value::Int(v[row]),
            Column::Bytes(v) => Value::Bytes(v[row].clone()),
            Column::View(v) => Value::View(v[row].clone()),
        }
    }

    fn set(&mut self, row: usize, value: Value) -> Result<()> {
        match (self, value) {
            (Column::Int(v), Value::Int(x)) => v[row] = x,
            (Column::Bytes(v), Value::Bytes(b)) => v[row] = b,
            (Column::View(v), Value::View(sub)) => v[row] = sub,
            (col, value) => eyre::bail!(
                "cell type mismatch: column is {:?}, value is {:?}",
                col.data_type(),
                value.data_type()
            ),
        }
        Ok(())
    }
}

/// In-memory column-oriented row sequence.
#[derive(Debug, Default)]
pub struct MemSequence {
    props: Vec<Property>,
    cols: Vec<Column>,
    rows: usize,
}

impl MemSequence {
    /// Creates an empty sequence with the given schema.
    pub fn new(props: Vec<Property>) -> Self {
        let cols = props.iter().map(|p| Column::empty(p.data_type())).collect();
        Self {
            props,
            cols,
            rows: 0,
        }
    }

    fn check_row(&self, row: usize) -> Result<()> {
        eyre::ensure!(
            row < self.rows,
            "row {} out of bounds (size {})",
            row,
            self.rows
        );
        Ok(())
    }

    fn check_col(&self, col: usize) -> Result<()> {
        eyre::ensure!(
            col < self.cols.len(),
            "column {} out of bounds ({} properties)",
            col,
            self.cols.len()
        );
        Ok(())
    }

    /// Adds any payload properties missing from the schema, back-filling
    /// existing rows with defaults.
    fn adopt_properties(&mut self, row: &Row) {
        for (prop, _) in row.cells() {
            if self.find_property(prop.name()).is_none() {
                let mut col = Column::empty(prop.data_type());
                for _ in 0..self.rows {
                    col.push_default();
                }
                self.props.push(prop.clone());
                self.cols.push(col);
            }
        }
    }
}

impl Sequence for MemSequence {
    fn num_properties(&self) -> usize {
        self.props.len()
    }

    fn nth_property(&self, col: usize) -> Result<Property> {
        self.check_col(col)?;
        Ok(self.props[col].clone())
    }

    fn find_property(&self, name: &str) -> Option<usize> {
        self.props.iter().position(|p| p.name() == name)
    }

    fn size(&self) -> usize {
        self.rows
    }

    fn set_size(&mut self, n: usize) -> Result<()> {
        if n < self.rows {
            for col in &mut self.cols {
                col.truncate(n);
            }
        } else {
            for col in &mut self.cols {
                for _ in self.rows..n {
                    col.push_default();
                }
            }
        }
        self.rows = n;
        Ok(())
    }

    fn cell(&self, row: usize, col: usize) -> Result<CellBuf> {
        self.check_row(row)?;
        self.check_col(col)?;
        match &self.cols[col] {
            Column::Int(v) => Ok(CellBuf::from_slice(&v[row].to_le_bytes())),
            Column::Bytes(v) => Ok(CellBuf::from_slice(&v[row])),
            Column::View(_) => eyre::bail!("view cells have no byte image"),
        }
    }

    fn set_cell(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()> {
        self.check_row(row)?;
        self.check_col(col)?;
        match &mut self.cols[col] {
            Column::Int(v) => v[row] = decode_int(image)?,
            Column::Bytes(v) => v[row] = image.to_vec(),
            Column::View(_) => eyre::bail!("view cells cannot be set from a byte image"),
        }
        Ok(())
    }

    fn value(&self, row: usize, col: usize) -> Result<Value> {
        self.check_row(row)?;
        self.check_col(col)?;
        Ok(self.cols[col].get(row))
    }

    fn set_value(&mut self, row: usize, col: usize, value: Value) -> Result<()> {
        self.check_row(row)?;
        self.check_col(col)?;
        self.cols[col].set(row, value)
    }

    fn insert_rows(&mut self, pos: usize, row: &Row, count: usize) -> Result<()> {
        eyre::ensure!(
            pos <= self.rows,
            "insert position {} out of bounds (size {})",
            pos,
            self.rows
        );
        self.adopt_properties(row);
        for (ci, prop) in self.props.iter().enumerate() {
            match row.get(prop.name()) {
                Some(value) => {
                    for _ in 0..count {
                        self.cols[ci].insert(pos, value)?;
                    }
                }
                None => {
                    for _ in 0..count {
                        self.cols[ci].insert_default(pos);
                    }
                }
            }
        }
        self.rows += count;
        Ok(())
    }

    fn remove_rows(&mut self, pos: usize, count: usize) -> Result<()> {
        eyre::ensure!(
            pos + count <= self.rows,
            "remove range {}..{} out of bounds (size {})",
            pos,
            pos + count,
            self.rows
        );
        for col in &mut self.cols {
            col.remove(pos, count);
        }
        self.rows -= count;
        Ok(())
    }

    fn set_row(&mut self, pos: usize, row: &Row) -> Result<()> {
        self.check_row(pos)?;
        self.adopt_properties(row);
        for (prop, value) in row.cells() {
            let col = self
                .find_property(prop.name())
                .ok_or_else(|| eyre::eyre!("property {} vanished during set_row", prop.name()))?;
            self.cols[col].set(pos, value.clone())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq() -> MemSequence {
        MemSequence::new(vec![Property::int("k"), Property::bytes("v")])
    }

    fn kv(k: i64, v: &[u8]) -> Row {
        Row::new()
            .with(Property::int("k"), Value::Int(k))
            .with(Property::bytes("v"), Value::Bytes(v.to_vec()))
    }

    #[test]
    fn insert_and_read_back() {
        let mut s = seq();
        s.insert_rows(0, &kv(7, b"seven"), 1).unwrap();
        s.insert_rows(1, &kv(8, b"eight"), 1).unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(s.value(0, 0).unwrap().as_int(), Some(7));
        assert_eq!(s.value(1, 1).unwrap().as_bytes(), Some(&b"eight"[..]));
    }

    #[test]
    fn insert_count_replicates() {
        let mut s = seq();
        s.insert_rows(0, &kv(1, b"x"), 3).unwrap();
        assert_eq!(s.size(), 3);
        for r in 0..3 {
            assert_eq!(s.value(r, 0).unwrap().as_int(), Some(1));
        }
    }

    #[test]
    fn missing_payload_gets_defaults() {
        let mut s = seq();
        let partial = Row::new().with(Property::int("k"), Value::Int(9));
        s.insert_rows(0, &partial, 1).unwrap();
        assert_eq!(s.value(0, 1).unwrap().as_bytes(), Some(&[][..]));
    }

    #[test]
    fn unknown_property_adds_column() {
        let mut s = seq();
        s.insert_rows(0, &kv(1, b"a"), 1).unwrap();
        let wider = kv(2, b"b").with(Property::int("extra"), Value::Int(42));
        s.insert_rows(1, &wider, 1).unwrap();
        assert_eq!(s.num_properties(), 3);
        let extra = s.find_property("extra").unwrap();
        assert_eq!(s.value(0, extra).unwrap().as_int(), Some(0));
        assert_eq!(s.value(1, extra).unwrap().as_int(), Some(42));
    }

    #[test]
    fn cell_images_round_trip() {
        let mut s = seq();
        s.insert_rows(0, &kv(-5, b"neg"), 1).unwrap();
        let img = s.cell(0, 0).unwrap();
        assert_eq!(img.len(), 8);
        let mut other = seq();
        other.insert_rows(0, &kv(0, b""), 1).unwrap();
        other.set_cell(0, 0, &img).unwrap();
        assert_eq!(other.value(0, 0).unwrap().as_int(), Some(-5));
    }

    #[test]
    fn remove_range() {
        let mut s = seq();
        for i in 0..5 {
            s.insert_rows(i as usize, &kv(i, b"r"), 1).unwrap();
        }
        s.remove_rows(1, 3).unwrap();
        assert_eq!(s.size(), 2);
        assert_eq!(s.value(0, 0).unwrap().as_int(), Some(0));
        assert_eq!(s.value(1, 0).unwrap().as_int(), Some(4));
    }

    #[test]
    fn set_size_grows_and_truncates() {
        let mut s = seq();
        s.set_size(3).unwrap();
        assert_eq!(s.size(), 3);
        assert_eq!(s.value(2, 0).unwrap().as_int(), Some(0));
        s.set_size(1).unwrap();
        assert_eq!(s.size(), 1);
    }

    #[test]
    fn type_mismatch_is_error() {
        let mut s = seq();
        s.set_size(1).unwrap();
        assert!(s.set_value(0, 0, Value::Bytes(b"no".to_vec())).is_err());
    }

    #[test]
    fn set_row_keeps_unlisted_columns() {
        let mut s = seq();
        s.insert_rows(0, &kv(1, b"keep"), 1).unwrap();
        let partial = Row::new().with(Property::int("k"), Value::Int(2));
        s.set_row(0, &partial).unwrap();
        assert_eq!(s.value(0, 0).unwrap().as_int(), Some(2));
        assert_eq!(s.value(0, 1).unwrap().as_bytes(), Some(&b"keep"[..]));
    }
}
