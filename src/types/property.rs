//! # Column Identity
//!
//! A `Property` pairs a column name with its `DataType`. Sequences carry an
//! ordered list of properties; viewers address columns positionally and
//! resolve foreign key carriers by property name.

use super::DataType;

/// Column definition: a name plus the type of its cells.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Property {
    name: String,
    data_type: DataType,
}

impl Property {
    /// Creates a new property with the given name and type.
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
        }
    }

    /// Creates an integer property.
    pub fn int(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Int)
    }

    /// Creates a byte-string property.
    pub fn bytes(name: impl Into<String>) -> Self {
        Self::new(name, DataType::Bytes)
    }

    /// Creates a view-valued property.
    pub fn view(name: impl Into<String>) -> Self {
        Self::new(name, DataType::View)
    }

    /// Returns the property name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the data type.
    pub fn data_type(&self) -> DataType {
        self.data_type
    }
}
