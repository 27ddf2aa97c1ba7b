//! Rectangles and rendered geometry
//!
//! Mutations are driven by rectangles measured from a rendered view. All
//! rectangles are expressed relative to one stable origin (usually the
//! editor container), so they can be compared with each other directly.

use crate::points_to_pixels;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use table_model::{keys, NodeId, TableDocument};

/// Axis-aligned rectangle in pixels, given by its two corners
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, x1: f64, y1: f64) -> Self {
        Self { x, y, x1, y1 }
    }

    pub fn from_origin_size(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y
    }

    /// Express this rectangle relative to the origin `(origin_x, origin_y)`
    pub fn relative_to(&self, origin_x: f64, origin_y: f64) -> Self {
        Self::new(
            self.x - origin_x,
            self.y - origin_y,
            self.x1 - origin_x,
            self.y1 - origin_y,
        )
    }

    /// Smallest rectangle covering both
    pub fn union(&self, other: &Rect) -> Self {
        Self::new(
            self.x.min(other.x),
            self.y.min(other.y),
            self.x1.max(other.x1),
            self.y1.max(other.y1),
        )
    }

    /// Leading edge on an axis (`x` or `y`)
    pub fn start(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }

    /// Trailing edge on an axis (`x1` or `y1`)
    pub fn end(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x1,
            Axis::Y => self.y1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Axis {
    /// Horizontal; column operations
    X,
    /// Vertical; row operations
    Y,
}

/// Read access to the rendered rectangles of cells and rows
pub trait RenderGeometry {
    fn cell_rect(&self, cell: NodeId) -> Option<Rect>;

    fn row_rect(&self, row: NodeId) -> Option<Rect>;
}

/// Settings for measuring a table without a renderer
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridMetrics {
    /// Left edge of the table
    pub origin_x: f64,
    /// Top edge of the table
    pub origin_y: f64,
    /// Height of rows without a `row_height`
    pub default_row_height_px: f64,
}

impl Default for GridMetrics {
    fn default() -> Self {
        Self {
            origin_x: 0.0,
            origin_y: 0.0,
            default_row_height_px: 30.0,
        }
    }
}

/// Map-backed [`RenderGeometry`]
#[derive(Debug, Clone, Default)]
pub struct GeometrySnapshot {
    cells: HashMap<NodeId, Rect>,
    rows: HashMap<NodeId, Rect>,
}

impl GeometrySnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_cell(&mut self, cell: NodeId, rect: Rect) {
        self.cells.insert(cell, rect);
    }

    pub fn insert_row(&mut self, row: NodeId, rect: Rect) {
        self.rows.insert(row, rect);
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Lay a table out on a grid built from its column widths and row
    /// heights.
    ///
    /// Cells are placed left to right into the first column slot not
    /// covered by a rowspan from an earlier row; spans running past the
    /// grid are clipped. Returns `None` for a table without columns.
    pub fn measure(document: &TableDocument, table: NodeId, metrics: &GridMetrics) -> Option<Self> {
        let columns = document.columns(table);
        if columns.is_empty() {
            return None;
        }
        let slot_count = columns.len();

        let mut edges = Vec::with_capacity(slot_count + 1);
        let mut x = metrics.origin_x;
        edges.push(x);
        for &column in &columns {
            x += points_to_pixels(document.column_width(column));
            edges.push(x);
        }

        let rows = document.rows(table);
        let mut tops = Vec::with_capacity(rows.len() + 1);
        let mut y = metrics.origin_y;
        tops.push(y);
        for &row in &rows {
            y += document
                .format(row, keys::ROW_HEIGHT)
                .and_then(|value| value.as_f64())
                .filter(|height| *height > 0.0)
                .map(points_to_pixels)
                .unwrap_or(metrics.default_row_height_px);
            tops.push(y);
        }

        let mut snapshot = Self::new();
        for (index, &row) in rows.iter().enumerate() {
            snapshot.insert_row(
                row,
                Rect::new(edges[0], tops[index], edges[slot_count], tops[index + 1]),
            );
        }

        let placements = document.placements(table);
        for (&cell, placement) in &placements {
            let columns = placement.columns();
            let covered = placement.rows();
            snapshot.insert_cell(
                cell,
                Rect::new(
                    edges[columns.start],
                    tops[covered.start],
                    edges[columns.end],
                    tops[covered.end],
                ),
            );
        }

        let unplaced = document.cells(table).len().saturating_sub(placements.len());
        if unplaced > 0 {
            tracing::warn!("{} cells do not fit the column slots of table {}", unplaced, table);
        }

        Some(snapshot)
    }
}

impl RenderGeometry for GeometrySnapshot {
    fn cell_rect(&self, cell: NodeId) -> Option<Rect> {
        self.cells.get(&cell).copied()
    }

    fn row_rect(&self, row: NodeId) -> Option<Rect> {
        self.rows.get(&row).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use table_model::{FormatValue, IdentityStrategy};

    #[test]
    fn test_rect_edges() {
        let rect = Rect::from_origin_size(10.0, 20.0, 100.0, 50.0);
        assert_eq!(rect.end(Axis::X), 110.0);
        assert_eq!(rect.end(Axis::Y), 70.0);
        assert_eq!(rect.start(Axis::Y), 20.0);
        assert_eq!(rect.width(), 100.0);

        let relative = rect.relative_to(10.0, 10.0);
        assert_eq!(relative, Rect::new(0.0, 10.0, 100.0, 60.0));
    }

    #[test]
    fn test_union() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(5.0, 20.0, 30.0, 40.0);
        assert_eq!(a.union(&b), Rect::new(0.0, 0.0, 30.0, 40.0));
    }

    #[test]
    fn test_rect_json() {
        let rect = Rect::new(12.5, 0.0, 112.5, 30.0);
        let json = serde_json::to_string(&rect).unwrap();
        assert_eq!(json, r#"{"x":12.5,"y":0.0,"x1":112.5,"y1":30.0}"#);
        assert_eq!(serde_json::from_str::<Rect>(&json).unwrap(), rect);
    }

    #[test]
    fn test_grid_metrics_from_partial_json() {
        let metrics: GridMetrics = serde_json::from_str(r#"{"origin_y": 40}"#).unwrap();
        assert_eq!(metrics.origin_y, 40.0);
        assert_eq!(metrics.default_row_height_px, 30.0);
    }

    #[test]
    fn test_measure_plain_grid() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(2, 2, 75.0).unwrap();
        let geometry = GeometrySnapshot::measure(&doc, table, &GridMetrics::default()).unwrap();

        let rows = doc.rows(table);
        let second = doc.children(rows[1])[1];
        assert_eq!(
            geometry.cell_rect(second),
            Some(Rect::new(100.0, 30.0, 200.0, 60.0))
        );
        assert_eq!(
            geometry.row_rect(rows[0]),
            Some(Rect::new(0.0, 0.0, 200.0, 30.0))
        );
    }

    #[test]
    fn test_measure_skips_rowspan_slots() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(2, 2, 75.0).unwrap();
        let rows = doc.rows(table);
        let spanning = doc.children(rows[0])[0];
        let covered = doc.children(rows[1])[0];
        doc.remove(covered).unwrap();
        doc.set_spans(spanning, 2, 1).unwrap();
        let remaining = doc.children(rows[1])[0];
        doc.set_format(remaining, keys::ROW_HEIGHT, Some(FormatValue::from(30.0)))
            .unwrap();

        let geometry = GeometrySnapshot::measure(&doc, table, &GridMetrics::default()).unwrap();

        assert_eq!(
            geometry.cell_rect(spanning),
            Some(Rect::new(0.0, 0.0, 100.0, 70.0))
        );
        assert_eq!(
            geometry.cell_rect(remaining),
            Some(Rect::new(100.0, 30.0, 200.0, 70.0))
        );
    }

    #[test]
    fn test_measure_needs_columns() {
        let doc = TableDocument::new();
        let missing = {
            let mut other = TableDocument::new();
            other.create_table(1, 1, 100.0).unwrap()
        };
        assert!(GeometrySnapshot::measure(&doc, missing, &GridMetrics::default()).is_none());
    }

    proptest! {
        #[test]
        fn measured_plain_grid_covers_every_cell(rows in 1usize..6, cols in 1usize..6) {
            let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
            let table = doc.create_table(rows, cols, 50.0).unwrap();
            let geometry = GeometrySnapshot::measure(&doc, table, &GridMetrics::default()).unwrap();
            prop_assert_eq!(geometry.cell_count(), rows * cols);
        }
    }
}
