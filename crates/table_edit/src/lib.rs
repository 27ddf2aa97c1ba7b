//! Table Edit - geometry-driven table mutations
//!
//! Row and column edits are expressed as a comparison rectangle measured
//! against the rendered table rather than as row/column indices. This crate
//! provides:
//! - Hit-testing of cell rectangles against a comparison rectangle
//! - Insert/delete row and column, merge/unmerge cells and insert empty row
//!   commands that keep spans and identities consistent
//! - Editor settings and the editor surface notified on table destruction

mod column_commands;
mod command;
mod error;
mod merge_commands;
mod row_commands;
mod settings;
mod surface;

pub use column_commands::*;
pub use command::*;
pub use error::*;
pub use hit_test::*;
pub use merge_commands::*;
pub use row_commands::*;
pub use settings::*;
pub use surface::*;
