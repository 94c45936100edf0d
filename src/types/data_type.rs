//! # Cell Shape Discriminant
//!
//! `DataType` is metadata-free: a cell is an integer, a byte string, or a
//! nested view. Everything the remapping layer stores or compares reduces
//! to one of these three shapes.

/// Storage-level type of a column's cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataType {
    /// 64-bit signed integer. Byte image: 8 bytes little-endian.
    Int,
    /// Arbitrary byte string. Byte image: the contents verbatim.
    Bytes,
    /// Nested row sequence. Has no byte image.
    View,
}

impl DataType {
    /// Returns true if cells of this type expose a byte image.
    pub fn has_byte_image(self) -> bool {
        !matches!(self, DataType::View)
    }
}
