//! # rowmap - Virtual Views for an Embedded Column Store
//!
//! rowmap is the view-remapping layer of an embedded, column-oriented
//! record store: a family of *virtual views* that wrap an underlying row
//! sequence and impose additional structure (uniqueness by hash, sorted
//! order, secondary index, block segmentation, or read-only access)
//! without copying the underlying data.
//!
//! ## Quick Start
//!
//! ```ignore
//! use rowmap::{hash, Property, Row, Value, View, Viewer};
//!
//! let base = View::with_properties(vec![Property::int("id"), Property::bytes("name")]);
//! let mut by_id = hash(base.clone(), 1, None)?;
//!
//! let alice = Row::new()
//!     .with(Property::int("id"), Value::Int(1))
//!     .with(Property::bytes("name"), Value::Bytes(b"alice".to_vec()));
//! by_id.insert(by_id.size(), &alice.into_cursor(), 1)?;
//!
//! let key = Row::new().with(Property::int("id"), Value::Int(1));
//! let hit = by_id.lookup(&key.into_cursor())?;
//! ```
//!
//! ## Architecture
//!
//! Every viewer implements one contract and composes over the same base
//! abstraction, so viewers are interchangeable from the caller's
//! standpoint:
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                host query layer             │
//! ├─────────────────────────────────────────────┤
//! │  remap: ReadOnly │ Hash │ Blocked │ Ordered │
//! │         │ Indexed   (Viewer contract)       │
//! ├─────────────────────────────────────────────┤
//! │  store: View handles over shared sequences  │
//! ├─────────────────────────────────────────────┤
//! │  MemSequence (typed column vectors)         │
//! └─────────────────────────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`types`]: `DataType`, `Property`, `Value`: the cell type system
//! - [`store`]: sequences, shared `View` handles, cursors, handlers
//! - [`remap`]: the five viewers and their factory functions
//!
//! ## Sharing Model
//!
//! The layer is single-threaded. A viewer borrows its base (and, where it
//! has one, its auxiliary map) through clonable `View` handles; two viewers
//! over the same base observe each other's mutations. Mutation discipline
//! is the caller's. Every operation is synchronous and either completes or
//! returns an error with the documented invariants intact.

pub mod remap;
pub mod store;
pub mod types;

pub use remap::{
    blocked, hash, indexed, ordered, read_only, BlockedViewer, HashViewer, IndexedViewer, Lookup,
    OrderedViewer, ReadOnlyViewer, Viewer,
};
pub use store::{CellBuf, Cursor, Handler, MemSequence, Row, Sequence, View};
pub use types::{DataType, Property, Value};
