//! # Remapping Viewers
//!
//! Five virtual views over a base row sequence, all implementing one
//! contract (`Viewer`): size, cell get/set, row insert/remove, and
//! key lookup. They compose and are interchangeable from the caller's
//! standpoint.
//!
//! | Viewer | Structure imposed |
//! |--------|-------------------|
//! | `ReadOnlyViewer` | none; mutation refused |
//! | `HashViewer` | key uniqueness + O(1) lookup via persisted open-addressed dict |
//! | `BlockedViewer` | two-level block segmentation with split/merge |
//! | `OrderedViewer` | base kept sorted on a key prefix |
//! | `IndexedViewer` | secondary sorted permutation map |
//!
//! ## Keys
//!
//! A key is the leading `num_keys` columns of a row, carried by a
//! [`Cursor`] whose container's leading columns must be the key columns in
//! base order. Lookup keys may otherwise live in any schema; they are
//! compared with their own container's handlers.

mod blocked;
mod hash;
mod indexed;
mod ordered;
mod read_only;

use eyre::Result;

use crate::store::{CellBuf, Cursor, View};

pub use blocked::BlockedViewer;
pub use hash::HashViewer;
pub use indexed::IndexedViewer;
pub use ordered::OrderedViewer;
pub use read_only::ReadOnlyViewer;

/// Outcome of a key lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// The key container lacks one of the key properties; the viewer
    /// cannot use its index and the caller falls back to scanning.
    Unusable,
    /// Exactly one row matches the key.
    Hit { row: usize },
    /// No row matches; `pos` is the insertion point for viewers with an
    /// order, 0 for the hash viewer.
    Miss { pos: usize },
}

impl Lookup {
    /// Row index of a hit, if any.
    pub fn hit(self) -> Option<usize> {
        match self {
            Lookup::Hit { row } => Some(row),
            _ => None,
        }
    }
}

/// Common contract of the remapping viewers.
pub trait Viewer {
    /// Empty view matching the schema of the rows this viewer exposes.
    fn template(&self) -> Result<View>;

    /// Number of visible rows.
    fn size(&self) -> usize;

    /// Locates the row matching `key`, if the viewer indexes one.
    ///
    /// The default is `Unusable`: a viewer that imposes no key structure
    /// leaves lookup to the caller.
    fn lookup(&self, key: &Cursor) -> Result<Lookup> {
        let _ = key;
        Ok(Lookup::Unusable)
    }

    /// Byte image of the cell at (`row`, `col`).
    fn get(&self, row: usize, col: usize) -> Result<CellBuf>;

    /// Overwrites the cell at (`row`, `col`) from a byte image.
    fn set(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()>;

    /// Inserts `count` rows with the cursor's value at `pos`.
    fn insert(&mut self, pos: usize, value: &Cursor, count: usize) -> Result<()>;

    /// Removes `count` rows starting at `pos`.
    fn remove(&mut self, pos: usize, count: usize) -> Result<()>;
}

/// Returns true when the key container carries the base's leading
/// `num_keys` properties, i.e. the viewer's index applies to this key.
fn key_usable(base: &View, key: &Cursor, num_keys: usize) -> Result<bool> {
    let container = key.container();
    for col in 0..num_keys {
        let prop = base.nth_property(col)?;
        if container.find_property(prop.name()).is_none() {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Read-only viewer over `base`.
pub fn read_only(base: View) -> ReadOnlyViewer {
    ReadOnlyViewer::new(base)
}

/// Hash viewer enforcing uniqueness of the leading `num_keys` columns.
///
/// `map` is the persisted slot table (schema `_H`, `_R`); pass `None` for
/// a fresh in-memory map.
pub fn hash(base: View, num_keys: usize, map: Option<View>) -> Result<HashViewer> {
    HashViewer::new(base, num_keys, map)
}

/// Blocked viewer over a base of `_B`-valued block rows.
pub fn blocked(base: View) -> Result<BlockedViewer> {
    BlockedViewer::new(base)
}

/// Ordered viewer keeping `base` sorted on its leading `num_keys` columns.
pub fn ordered(base: View, num_keys: usize) -> OrderedViewer {
    OrderedViewer::new(base, num_keys)
}

/// Indexed viewer maintaining a sorted permutation of `base` in `map`.
pub fn indexed(base: View, map: View, props: &[&str], unique: bool) -> Result<IndexedViewer> {
    IndexedViewer::new(base, map, props, unique)
}
