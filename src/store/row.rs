//! # Detached Rows
//!
//! A `Row` is an owned set of property/value pairs detached from any
//! sequence. Rows are the insert/update payload, and `into_cursor` turns
//! one into a single-row view so it can serve as a lookup key.

use crate::types::{Property, Value};

use super::{Cursor, View};

/// Owned row: ordered property/value pairs.
#[derive(Debug, Clone, Default)]
pub struct Row {
    cells: Vec<(Property, Value)>,
}

impl Row {
    /// Creates an empty row.
    pub fn new() -> Row {
        Row::default()
    }

    /// Adds or replaces a cell, builder-style.
    pub fn with(mut self, prop: Property, value: Value) -> Row {
        self.set(prop, value);
        self
    }

    /// Adds or replaces a cell.
    pub fn set(&mut self, prop: Property, value: Value) {
        match self.cells.iter_mut().find(|(p, _)| p.name() == prop.name()) {
            Some(slot) => *slot = (prop, value),
            None => self.cells.push((prop, value)),
        }
    }

    /// Value of the named cell.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.cells
            .iter()
            .find(|(p, _)| p.name() == name)
            .map(|(_, v)| v)
    }

    /// All cells in insertion order.
    pub fn cells(&self) -> &[(Property, Value)] {
        &self.cells
    }

    /// The row's properties in insertion order.
    pub fn properties(&self) -> Vec<Property> {
        self.cells.iter().map(|(p, _)| p.clone()).collect()
    }

    /// Materializes this row as a one-row view and returns a cursor to it.
    pub fn into_cursor(self) -> Cursor {
        let view = View::with_properties(self.properties());
        view.insert_rows(0, &self, 1)
            .expect("fresh one-row view accepts its own schema");
        view.cursor(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_replaces_by_name() {
        let mut row = Row::new().with(Property::int("k"), Value::Int(1));
        row.set(Property::int("k"), Value::Int(2));
        assert_eq!(row.cells().len(), 1);
        assert_eq!(row.get("k").unwrap().as_int(), Some(2));
    }

    #[test]
    fn into_cursor_builds_single_row_container() {
        let c = Row::new()
            .with(Property::int("k"), Value::Int(5))
            .with(Property::bytes("v"), Value::Bytes(b"five".to_vec()))
            .into_cursor();
        assert_eq!(c.container().size(), 1);
        assert_eq!(c.container().num_properties(), 2);
        assert_eq!(c.cell(0).unwrap()[0], 5);
    }
}
