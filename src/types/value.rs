//! # Owned Cell Values
//!
//! `Value` is the owned form a cell takes when it travels outside its
//! sequence: in insert/update payloads, detached rows, and the auxiliary
//! map schemas. `View` cells hold a handle to a nested sequence; the two
//! scalar shapes own their data outright.

use eyre::Result;

use crate::store::{CellBuf, View};

use super::DataType;

/// Owned cell value.
#[derive(Debug, Clone)]
pub enum Value {
    Int(i64),
    Bytes(Vec<u8>),
    View(View),
}

impl Value {
    /// Returns the data type of this value.
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Bytes(_) => DataType::Bytes,
            Value::View(_) => DataType::View,
        }
    }

    /// Returns the default value for a column of the given type.
    ///
    /// `View` columns default to an empty sequence with no properties;
    /// the host seeds the schema when it stores the first real subview.
    pub fn default_for(data_type: DataType) -> Value {
        match data_type {
            DataType::Int => Value::Int(0),
            DataType::Bytes => Value::Bytes(Vec::new()),
            DataType::View => Value::View(View::with_properties(Vec::new())),
        }
    }

    /// Returns the stable byte image of this value.
    ///
    /// `Int` cells serialize as 8 bytes little-endian, `Bytes` cells as
    /// their contents. `View` cells have no byte image.
    pub fn byte_image(&self) -> Result<CellBuf> {
        match self {
            Value::Int(v) => Ok(CellBuf::from_slice(&v.to_le_bytes())),
            Value::Bytes(b) => Ok(CellBuf::from_slice(b)),
            Value::View(_) => eyre::bail!("view cells have no byte image"),
        }
    }

    /// Returns the integer payload, if this is an `Int` value.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the byte payload, if this is a `Bytes` value.
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Value::Bytes(b) => Some(b),
            _ => None,
        }
    }

    /// Returns the nested view handle, if this is a `View` value.
    pub fn as_view(&self) -> Option<&View> {
        match self {
            Value::View(v) => Some(v),
            _ => None,
        }
    }
}
