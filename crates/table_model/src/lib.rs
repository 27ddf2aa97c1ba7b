//! Table Model - span-aware table tree
//!
//! This crate provides the structural model behind editable tables: an arena
//! of typed nodes (table, column group, column, body, row, cell, cell line),
//! the attribute storage that carries row/cell identity and spans, and the
//! identity generator used to tag rows and logical cells.

mod error;
mod formats;
mod grid;
mod identity;
mod node;
mod snapshot;
mod tree;
mod validate;

pub use error::*;
pub use formats::*;
pub use grid::*;
pub use identity::*;
pub use node::*;
pub use snapshot::*;
pub use tree::*;
