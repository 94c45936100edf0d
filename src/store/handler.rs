//! # Per-Column Comparator
//!
//! A `Handler` knows how to order one column's cell in a given row against
//! a foreign byte image: `Int` cells decode and compare numerically,
//! `Bytes` cells compare lexicographically. Handlers come from the view a
//! cursor lives in, so keys are always compared with the semantics of
//! their own container.

use std::cmp::Ordering;

use eyre::Result;

use crate::types::{DataType, Property};

use super::{decode_int, View};

/// Comparator for one column of one view.
#[derive(Debug, Clone)]
pub struct Handler {
    view: View,
    col: usize,
    prop: Property,
}

impl Handler {
    pub(crate) fn new(view: View, col: usize) -> Result<Handler> {
        let prop = view.nth_property(col)?;
        Ok(Handler { view, col, prop })
    }

    /// The property this handler compares.
    pub fn property(&self) -> &Property {
        &self.prop
    }

    /// Orders the cell at `row` of this handler's column against a foreign
    /// byte image.
    pub fn compare(&self, row: usize, other: &[u8]) -> Result<Ordering> {
        match self.prop.data_type() {
            DataType::Int => {
                let own = decode_int(&self.view.cell(row, self.col)?)?;
                Ok(own.cmp(&decode_int(other)?))
            }
            DataType::Bytes => {
                let own = self.view.cell(row, self.col)?;
                Ok(own[..].cmp(other))
            }
            DataType::View => eyre::bail!("view cells are not comparable"),
        }
    }
}
