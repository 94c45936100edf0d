//! # Row Cursor
//!
//! A `Cursor` is a `(view, row index)` pair naming one row. It is not a row
//! by value: hash and compare operations dereference the cursor repeatedly
//! against its own container's handlers, which lets a lookup key live in a
//! schema different from the indexed view, as long as its leading columns
//! are the key columns in base order.

use eyre::Result;

use super::{CellBuf, Row, View};

/// Names one row of a view; the key carrier of the view layer.
#[derive(Debug, Clone)]
pub struct Cursor {
    view: View,
    row: usize,
}

impl Cursor {
    /// Creates a cursor over `row` of `view`.
    pub fn new(view: View, row: usize) -> Cursor {
        Cursor { view, row }
    }

    /// The view containing the named row.
    pub fn container(&self) -> &View {
        &self.view
    }

    /// The row index within the container.
    pub fn row(&self) -> usize {
        self.row
    }

    /// Byte image of the named row's cell in column `col`.
    pub fn cell(&self, col: usize) -> Result<CellBuf> {
        self.view.cell(self.row, col)
    }

    /// Detached copy of the named row.
    pub fn fetch_row(&self) -> Result<Row> {
        self.view.fetch_row(self.row)
    }
}
