//! Table Layout - geometry and width resolution
//!
//! This crate connects the table model to a rendered view:
//! - Rectangles and the [`RenderGeometry`] capability through which cell and
//!   row rectangles are read
//! - A map-backed geometry snapshot that can be measured from stored column
//!   widths and row heights
//! - Points/pixels conversion
//! - Table width, margin and alignment resolution, column width
//!   redistribution on insert, and the post-commit layout hook

mod geometry;
mod units;
mod width;

pub use geometry::*;
pub use units::*;
pub use width::*;
