//! # Cell Types for the View Layer
//!
//! This module provides the small type system the remapping layer needs:
//!
//! - `data_type`: canonical `DataType` discriminant for the three cell shapes
//! - `property`: `Property`, a named typed column
//! - `value`: owned `Value` for insert/update payloads
//!
//! ## Key Types
//!
//! | Type | Purpose |
//! |------|---------|
//! | `DataType` | Storage-level cell shape discriminant |
//! | `Property` | Column identity (name + type) |
//! | `Value` | Owned cell value |
//!
//! Property identity is the property *name*. The auxiliary map schemas
//! (`_H`/`_R` hash slots, `_B` block cells) are name-normative and part of
//! the persisted format.

mod data_type;
mod property;
mod value;

pub use data_type::DataType;
pub use property::Property;
pub use value::Value;
