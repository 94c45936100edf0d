//! # Base Row-Sequence Layer
//!
//! This module provides the row-sequence substrate the remapping viewers
//! wrap: an ordered sequence of rows, each row a fixed set of typed cells
//! identified by property name.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────────────────────────────┐
//! │   View (shared handle, Rc<RefCell>)   │  search / slice / sort
//! ├───────────────────────────────────────┤
//! │   Sequence trait (storage contract)   │
//! ├───────────────────────────────────────┤
//! │   MemSequence (column vectors)        │  Vec<i64> / Vec<Vec<u8>> / Vec<View>
//! └───────────────────────────────────────┘
//! ```
//!
//! - `Sequence`: object-safe storage contract covering property
//!   enumeration, positional cell access (byte image and typed), and row
//!   mutation.
//! - `MemSequence`: in-memory column-oriented implementation.
//! - `View`: cheap clonable handle through which host and viewers share
//!   one sequence; carries the generic algorithms (`search`,
//!   `restrict_search`, `sort_permutation`, `slice`).
//! - `Cursor`: a `(view, row)` pair naming one row; the key carrier.
//! - `Handler`: per-column comparator.
//! - `Row`: detached owned row used as insert payload.
//!
//! ## Cell Byte Images
//!
//! `Int` cells expose an 8-byte little-endian image, `Bytes` cells their
//! contents verbatim. The byte image is the unit handlers compare and the
//! hash viewer hashes, and is part of the stable format. `View` cells have
//! no byte image.

mod cursor;
mod handler;
mod row;
mod sequence;
mod view;

use smallvec::SmallVec;

pub use cursor::Cursor;
pub use handler::Handler;
pub use row::Row;
pub use sequence::{MemSequence, Sequence};
pub use view::View;

/// Byte image of one cell. Integer cells (8 bytes) stay inline.
pub type CellBuf = SmallVec<[u8; 16]>;

/// Decodes the 8-byte little-endian image of an integer cell.
pub(crate) fn decode_int(image: &[u8]) -> eyre::Result<i64> {
    let bytes: [u8; 8] = image
        .try_into()
        .map_err(|_| eyre::eyre!("integer cell image must be 8 bytes, got {}", image.len()))?;
    Ok(i64::from_le_bytes(bytes))
}
