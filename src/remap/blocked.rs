//! # Blocked Viewer
//!
//! A two-level segmented sequence for scalability: the base holds `z`
//! data-block rows plus one separator-block row, each block a subview
//! under the `_B` property. The separator at index `i` is the single
//! record that logically sits between block `i` and block `i+1`.
//!
//! ## Layout
//!
//! ```text
//! base row 0   _B = [block 0 rows]
//! base row 1   _B = [block 1 rows]
//! ...
//! base row z   _B = [separator 0, separator 1, ...]   (z-1 entries)
//! ```
//!
//! An in-memory `offsets` array, rebuilt on construction by one pass over
//! the blocks, records cumulative logical sizes: `offsets[i]` is the
//! logical index of the separator between block `i` and `i+1`. Blocks are
//! kept between `kLimit / 2` and `kLimit` rows by splitting and merging,
//! except transiently during a mutation and for a last block with no
//! successor to merge into.

use eyre::Result;

use crate::store::{CellBuf, Cursor, Row, View};
use crate::types::{Property, Value};

use super::Viewer;

/// Name of the view-valued block property.
const BLOCK_PROP: &str = "_B";

/// Target maximum rows per block.
const K_LIMIT: usize = 1000;

/// Viewer that segments its rows into bounded blocks.
#[derive(Debug)]
pub struct BlockedViewer {
    base: View,
    col: usize,
    offsets: Vec<usize>,
}

impl BlockedViewer {
    pub(crate) fn new(base: View) -> Result<BlockedViewer> {
        let col = base
            .find_property(BLOCK_PROP)
            .ok_or_else(|| eyre::eyre!("blocked base needs a view property {}", BLOCK_PROP))?;

        if base.size() < 2 {
            base.set_size(2)?;
        }

        let n = base.size() - 1;
        let mut offsets = Vec::with_capacity(n);
        let mut total = 0;
        for i in 0..n {
            total += base.subview(i, col)?.size();
            offsets.push(total);
            total += 1;
        }

        Ok(BlockedViewer { base, col, offsets })
    }

    fn block(&self, bno: usize) -> Result<View> {
        self.base.subview(bno, self.col)
    }

    /// Smallest block index whose cumulative offset reaches `pos`, and the
    /// block-local index of `pos`. When `offsets[bno] == pos` the position
    /// names the separator after block `bno`, not a block row.
    fn slot(&self, pos: usize) -> (usize, usize) {
        let mut i = 0;
        while i < self.offsets.len() && self.offsets[i] < pos {
            i += 1;
        }
        let local = if i > 0 {
            pos - (self.offsets[i - 1] + 1)
        } else {
            pos
        };
        (i, local)
    }

    /// Resolves a logical row to (base block row, block-local row),
    /// redirecting separator positions into the separator block.
    fn locate(&self, row: usize) -> Result<(usize, usize)> {
        let (i, local) = self.slot(row);
        let z = self.base.size() - 1;
        eyre::ensure!(i < z, "row {} out of bounds (size {})", row, self.size());
        if self.offsets[i] == row {
            Ok((z, i))
        } else {
            Ok((i, local))
        }
    }

    /// Promotes `block[bno][row]` to the separator at `bno` and moves the
    /// rows above it into a new successor block.
    fn split(&mut self, bno: usize, row: usize) -> Result<()> {
        let z = self.base.size() - 1;
        let bz = self.block(z)?;
        let bv = self.block(bno)?;
        let bv_size = bv.size();

        bz.insert_rows(bno, &bv.fetch_row(row)?, 1)?;

        let upper = bv.slice(row + 1, bv_size)?;
        let successor = Row::new().with(Property::view(BLOCK_PROP), Value::View(upper));
        self.base.insert_rows(bno + 1, &successor, 1)?;

        self.offsets.insert(bno, self.offsets[bno] - bv_size + row);
        bv.remove_rows(row, bv_size - row)?;
        Ok(())
    }

    /// Folds the separator after `bno` and the whole successor block onto
    /// the end of `block[bno]`.
    fn merge(&mut self, bno: usize) -> Result<()> {
        let z = self.base.size() - 1;
        let bz = self.block(z)?;
        let bv1 = self.block(bno)?;
        let bv2 = self.block(bno + 1)?;

        bv1.insert_rows(bv1.size(), &bz.fetch_row(bno)?, 1)?;
        bv1.append_from(&bv2)?;

        bz.remove_rows(bno, 1)?;
        self.base.remove_rows(bno + 1, 1)?;
        self.offsets.remove(bno);
        Ok(())
    }
}

impl Viewer for BlockedViewer {
    fn template(&self) -> Result<View> {
        Ok(self.block(0)?.template())
    }

    fn size(&self) -> usize {
        self.offsets.last().copied().unwrap_or(0)
    }

    fn get(&self, row: usize, col: usize) -> Result<CellBuf> {
        let (bno, local) = self.locate(row)?;
        self.block(bno)?.cell(local, col)
    }

    fn set(&mut self, row: usize, col: usize, image: &[u8]) -> Result<()> {
        let (bno, local) = self.locate(row)?;
        self.block(bno)?.set_cell(local, col, image)
    }

    fn insert(&mut self, pos: usize, value: &Cursor, count: usize) -> Result<()> {
        eyre::ensure!(count > 0, "insert count must be positive");

        let z = self.base.size() - 1;
        let (i, local) = self.slot(pos);
        eyre::ensure!(
            i < z,
            "insert position {} out of bounds (size {})",
            pos,
            self.size()
        );

        let bv = self.block(i)?;
        eyre::ensure!(local <= bv.size(), "position resolves past block end");

        bv.insert_rows(local, &value.fetch_row()?, count)?;
        for off in &mut self.offsets[i..] {
            *off += count;
        }

        // massive insertions are first split off as full tail blocks
        while bv.size() >= 2 * K_LIMIT {
            self.split(i, bv.size() - K_LIMIT - 2)?;
        }

        if bv.size() > K_LIMIT {
            self.split(i, bv.size() / 2)?;
        }

        Ok(())
    }

    fn remove(&mut self, pos: usize, count: usize) -> Result<()> {
        eyre::ensure!(count > 0, "remove count must be positive");
        eyre::ensure!(
            pos + count < self.size(),
            "remove range {}..{} out of bounds (size {})",
            pos,
            pos + count,
            self.size()
        );

        let mut z = self.base.size() - 1;
        let (mut i, local) = self.slot(pos);
        eyre::ensure!(i < z, "remove position resolves past the last block");

        let mut bv = self.block(i)?;

        // pull the range into one block (inefficient but safe)
        while local + count > bv.size() {
            eyre::ensure!(i < z - 1, "remove range exceeds the final block");
            self.merge(i)?;
            z -= 1;
        }

        bv.remove_rows(local, count)?;
        for off in &mut self.offsets[i..] {
            *off -= count;
        }

        // if the block underflows, merge it
        if bv.size() < K_LIMIT / 2 {
            if i > 0 {
                // merge with the predecessor, preferably
                i -= 1;
                bv = self.block(i)?;
            }

            if i >= z - 1 {
                // no successor to merge with; tolerate the underflow
                return Ok(());
            }

            self.merge(i)?;

            // if the merged block overflows, split it
            if bv.size() > K_LIMIT {
                self.split(i, bv.size() / 2)?;
            }
        }

        Ok(())
    }
}
