//! Row insertion and deletion

use crate::command::editable_body;
use crate::hit_test::first_at_or_right_of;
use crate::{
    classify, classify_boundary, destroy_table, falling_cells, placed_cells, DeleteOutcome, Edge,
    EditContext, EditError, Result, Side, TableCommand,
};
use serde::{Deserialize, Serialize};
use table_layout::{Axis, Rect};
use table_model::{keys, NodeId, NodeKind, TableModelError};

// =============================================================================
// InsertRow Command
// =============================================================================

/// Insert a row above or below the rows covered by `compare_rect`.
///
/// The rectangle's bottom edge (or top edge when inserting above) is the
/// insertion line. Each cell whose matching edge lies on the line gets a new
/// cell of the same colspan in the new row; each cell crossing the line
/// grows by one row. Returns the new and lengthened cells, left to right.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRow {
    pub table_id: NodeId,
    pub compare_rect: Rect,
    pub side: Side,
}

impl TableCommand for InsertRow {
    type Output = Vec<NodeId>;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<Vec<NodeId>> {
        let Some(body) = editable_body(ctx.document, self.table_id)? else {
            return Ok(Vec::new());
        };

        let tolerance = ctx.tolerance();
        let cells = placed_cells(ctx.document, ctx.geometry, self.table_id);
        let (edge, line) = match self.side {
            Side::After => (Edge::End, self.compare_rect.y1),
            Side::Before => (Edge::Start, self.compare_rect.y),
        };
        let boundary = classify_boundary(&cells, line, Axis::Y, edge, tolerance);
        if boundary.aligned.is_empty() && boundary.interior.is_empty() {
            return Err(EditError::GeometryMismatch(format!(
                "no cell edge or cell crosses y = {}",
                line
            )));
        }

        // The new row goes before the row starting on the line; below the
        // last row it is appended
        let rows = ctx.document.rows(self.table_id);
        let reference = rows.iter().copied().find(|&row| {
            ctx.geometry
                .row_rect(row)
                .is_some_and(|rect| (rect.y - line).abs() < tolerance)
        });
        if reference.is_none() {
            let at_bottom = rows
                .last()
                .and_then(|&row| ctx.geometry.row_rect(row))
                .is_some_and(|rect| (rect.y1 - line).abs() < tolerance);
            if self.side == Side::Before || !at_bottom {
                return Err(EditError::GeometryMismatch(format!(
                    "no row boundary at y = {}",
                    line
                )));
            }
        }

        let identity = ctx.document.next_row_id();
        let row = ctx.document.create_row(&identity)?;
        ctx.document.insert_child(body, row, reference)?;

        let mut aligned = boundary.aligned.clone();
        aligned.sort_by(|a, b| a.rect.x.total_cmp(&b.rect.x));

        let mut affected = Vec::new();
        for placed in &aligned {
            let colspan = ctx.document.colspan(placed.id);
            let cell = ctx.document.create_cell(&identity, 1, colspan)?;
            ctx.document.append_child(row, cell)?;
            affected.push((cell, placed.rect.x));
        }
        for placed in &boundary.interior {
            let rowspan = ctx.document.rowspan(placed.id) + 1;
            ctx.document
                .set_format(placed.id, keys::ROWSPAN, Some(rowspan.into()))?;
            affected.push((placed.id, placed.rect.x));
        }

        tracing::debug!(
            "Inserted row into table {}: {} new cells, {} lengthened",
            self.table_id,
            aligned.len(),
            boundary.interior.len()
        );

        affected.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(affected.into_iter().map(|(cell, _)| cell).collect())
    }

    fn display_name(&self) -> &str {
        match self.side {
            Side::Before => "Insert Row Above",
            Side::After => "Insert Row Below",
        }
    }
}

// =============================================================================
// DeleteRow Command
// =============================================================================

/// Delete the rows whose rendered extent lies inside `compare_rect`.
///
/// Cells inside the rectangle are removed. Cells spanning across it lose one
/// row per deleted row; those that started in a deleted row move down into
/// the next surviving row and take its identity.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRow {
    pub table_id: NodeId,
    pub compare_rect: Rect,
}

impl TableCommand for DeleteRow {
    type Output = DeleteOutcome;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<DeleteOutcome> {
        if editable_body(ctx.document, self.table_id)?.is_none() {
            return Ok(DeleteOutcome::Unchanged);
        }

        let tolerance = ctx.tolerance();
        let compare = self.compare_rect;
        let total = ctx.document.cells(self.table_id).len();
        let cells = placed_cells(ctx.document, ctx.geometry, self.table_id);
        let classification = classify(&cells, &compare, Axis::Y, tolerance);

        // Count consumed rows before the layout changes
        let rows = ctx.document.rows(self.table_id);
        let consumed: Vec<(usize, NodeId)> = rows
            .iter()
            .copied()
            .enumerate()
            .filter(|&(_, row)| {
                ctx.geometry.row_rect(row).is_some_and(|rect| {
                    rect.y + tolerance > compare.y && rect.y1 - tolerance < compare.y1
                })
            })
            .collect();
        if classification.is_empty() && consumed.is_empty() {
            return Ok(DeleteOutcome::Unchanged);
        }

        if classification.removed.len() == total {
            destroy_table(ctx, self.table_id)?;
            return Ok(DeleteOutcome::Destroyed);
        }

        let consumed_rows: Vec<NodeId> = consumed.iter().map(|&(_, row)| row).collect();
        let is_consumed = |index: &usize| {
            consumed
                .iter()
                .any(|&(row_index, _)| row_index == *index)
        };

        // A surviving cell loses one row per consumed row it covers
        let removed_rows = consumed.len() as u32;
        let placements = ctx.document.placements(self.table_id);
        let shortened: Vec<(NodeId, u32)> = classification
            .shrinking()
            .map(|placed| {
                let lost = placements
                    .get(&placed.id)
                    .map(|placement| placement.rows().filter(is_consumed).count() as u32)
                    .unwrap_or(removed_rows);
                let rowspan = ctx.document.rowspan(placed.id).saturating_sub(lost).max(1);
                (placed.id, rowspan)
            })
            .collect();

        // Cells starting in a consumed row move down with their content
        let mut falling = falling_cells(&classification.modified, &compare, tolerance);
        falling.extend(classification.clipped.iter().copied().filter(|placed| {
            ctx.document
                .parent(placed.id)
                .is_some_and(|row| consumed_rows.contains(&row))
        }));
        falling.sort_by(|a, b| a.rect.x.total_cmp(&b.rect.x));

        for placed in &falling {
            let mut target = ctx
                .document
                .parent(placed.id)
                .and_then(|row| ctx.document.next_sibling(row));
            while let Some(row) = target.filter(|row| consumed_rows.contains(row)) {
                target = ctx.document.next_sibling(row);
            }
            let Some(target) = target else {
                tracing::warn!("No surviving row below cell {}, leaving it in place", placed.id);
                continue;
            };

            let siblings = ctx.document.children(target).to_vec();
            let before = first_at_or_right_of(ctx.geometry, &siblings, placed.rect.x1, tolerance);
            ctx.document.insert_child(target, placed.id, before)?;
            let identity = ctx
                .document
                .row_identity(target)
                .ok_or_else(|| TableModelError::Structure(format!("row {} has no identity", target)))?;
            ctx.document
                .set_format(placed.id, keys::ROW, Some(identity.into()))?;
        }

        for placed in &classification.removed {
            ctx.document.remove(placed.id)?;
        }
        for &(cell, rowspan) in &shortened {
            ctx.document
                .set_format(cell, keys::ROWSPAN, Some(rowspan.into()))?;
        }
        for &row in &consumed_rows {
            ctx.document.remove(row)?;
        }

        tracing::debug!(
            "Deleted {} rows from table {}: {} cells removed, {} shortened, {} moved down",
            removed_rows,
            self.table_id,
            classification.removed.len(),
            shortened.len(),
            falling.len()
        );
        Ok(DeleteOutcome::Updated)
    }

    fn display_name(&self) -> &str {
        "Delete Row"
    }
}

// =============================================================================
// InsertEmptyRow Command
// =============================================================================

/// Insert a row holding one cell that spans every column, next to
/// `reference_row`. Returns the new row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertEmptyRow {
    pub table_id: NodeId,
    pub reference_row: NodeId,
    pub side: Side,
}

impl TableCommand for InsertEmptyRow {
    type Output = Option<NodeId>;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<Option<NodeId>> {
        let Some(body) = editable_body(ctx.document, self.table_id)? else {
            return Ok(None);
        };
        ctx.document.expect_kind(self.reference_row, NodeKind::Row)?;
        if ctx.document.parent(self.reference_row) != Some(body) {
            return Err(EditError::InvalidCommand(format!(
                "row {} is not part of table {}",
                self.reference_row, self.table_id
            )));
        }

        let columns = ctx.document.column_count(self.table_id) as u32;
        let identity = ctx.document.next_row_id();
        let row = ctx.document.create_row(&identity)?;
        let cell = ctx.document.create_cell(&identity, 1, columns)?;
        ctx.document.append_child(row, cell)?;

        let before = match self.side {
            Side::Before => Some(self.reference_row),
            Side::After => ctx.document.next_sibling(self.reference_row),
        };
        ctx.document.insert_child(body, row, before)?;

        tracing::debug!("Inserted empty row {} into table {}", row, self.table_id);
        Ok(Some(row))
    }

    fn display_name(&self) -> &str {
        "Insert Empty Row"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{EditorSettings, NoopSurface};
    use table_layout::{GeometrySnapshot, GridMetrics};
    use table_model::{IdentityStrategy, TableDocument};

    fn grid(rows: usize, cols: usize) -> (TableDocument, NodeId) {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(rows, cols, 75.0).unwrap();
        (doc, table)
    }

    fn run<C: TableCommand>(doc: &mut TableDocument, command: &C) -> Result<C::Output> {
        let table = doc.tables()[0];
        let geometry = GeometrySnapshot::measure(doc, table, &GridMetrics::default())
            .unwrap_or_default();
        let settings = EditorSettings::default();
        let mut surface = NoopSurface;
        let mut ctx = EditContext::new(doc, &geometry, &mut surface, &settings);
        command.apply(&mut ctx)
    }

    #[test]
    fn test_insert_row_above_first() {
        let (mut doc, table) = grid(2, 3);
        let old_first = doc.rows(table)[0];

        let command = InsertRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 0.0, 300.0, 30.0),
            side: Side::Before,
        };
        let affected = run(&mut doc, &command).unwrap();

        let rows = doc.rows(table);
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], old_first);
        assert_eq!(doc.children(rows[0]), affected.as_slice());
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_insert_row_below_last_appends() {
        let (mut doc, table) = grid(2, 2);
        let command = InsertRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 30.0, 200.0, 60.0),
            side: Side::After,
        };
        let affected = run(&mut doc, &command).unwrap();

        let rows = doc.rows(table);
        assert_eq!(rows.len(), 3);
        assert_eq!(doc.children(rows[2]), affected.as_slice());
        let identity = doc.row_identity(rows[2]).unwrap();
        for &cell in &affected {
            assert_eq!(doc.row_identity(cell).unwrap(), identity);
        }
    }

    #[test]
    fn test_insert_row_inherits_colspan() {
        let (mut doc, table) = grid(1, 3);
        let cells = doc.cells(table);
        doc.remove(cells[1]).unwrap();
        doc.set_spans(cells[0], 1, 2).unwrap();

        let command = InsertRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 0.0, 300.0, 30.0),
            side: Side::After,
        };
        let affected = run(&mut doc, &command).unwrap();

        assert_eq!(affected.len(), 2);
        assert_eq!(doc.colspan(affected[0]), 2);
        assert_eq!(doc.colspan(affected[1]), 1);
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_insert_row_rejects_line_between_rows() {
        let (mut doc, table) = grid(2, 2);
        let command = InsertRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 0.0, 200.0, 45.0),
            side: Side::After,
        };
        assert!(matches!(
            run(&mut doc, &command),
            Err(EditError::GeometryMismatch(_))
        ));
        assert_eq!(doc.rows(table).len(), 2);
    }

    #[test]
    fn test_delete_middle_row() {
        let (mut doc, table) = grid(3, 2);
        let rows = doc.rows(table);

        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 30.0, 200.0, 60.0),
        };
        assert_eq!(run(&mut doc, &command).unwrap(), DeleteOutcome::Updated);

        assert_eq!(doc.rows(table), vec![rows[0], rows[2]]);
        assert_eq!(doc.cells(table).len(), 4);
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_delete_row_shortens_spanning_cell() {
        let (mut doc, table) = grid(3, 2);
        let rows = doc.rows(table);
        let spanning = doc.children(rows[0])[0];
        let covered: Vec<NodeId> = [rows[1], rows[2]]
            .iter()
            .map(|&row| doc.children(row)[0])
            .collect();
        for cell in covered {
            doc.remove(cell).unwrap();
        }
        doc.set_spans(spanning, 3, 1).unwrap();

        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 30.0, 200.0, 60.0),
        };
        run(&mut doc, &command).unwrap();

        assert_eq!(doc.rowspan(spanning), 2);
        assert_eq!(doc.parent(spanning), Some(rows[0]));
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_delete_row_moves_spanning_cell_down() {
        let (mut doc, table) = grid(3, 2);
        let rows = doc.rows(table);
        let spanning = doc.children(rows[0])[0];
        let covered = doc.children(rows[1])[0];
        let right = doc.children(rows[1])[1];
        doc.remove(covered).unwrap();
        doc.set_spans(spanning, 2, 1).unwrap();

        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 0.0, 200.0, 30.0),
        };
        run(&mut doc, &command).unwrap();

        assert_eq!(doc.rows(table), vec![rows[1], rows[2]]);
        assert_eq!(doc.children(rows[1]), &[spanning, right]);
        assert_eq!(doc.rowspan(spanning), 1);
        let identity = doc.row_identity(rows[1]);
        assert_eq!(doc.row_identity(spanning), identity);
        let line = doc.children(spanning)[0];
        assert_eq!(doc.row_identity(line), identity);
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_delete_rows_moves_cell_reaching_below_them() {
        let (mut doc, table) = grid(3, 2);
        let rows = doc.rows(table);
        let spanning = doc.children(rows[1])[0];
        let covered = doc.children(rows[2])[0];
        let last = doc.children(rows[2])[1];
        doc.remove(covered).unwrap();
        doc.set_spans(spanning, 2, 1).unwrap();
        let line = doc.children(spanning)[0];
        doc.set_text(line, "keep me").unwrap();

        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 0.0, 200.0, 60.0),
        };
        assert_eq!(run(&mut doc, &command).unwrap(), DeleteOutcome::Updated);

        assert_eq!(doc.rows(table), vec![rows[2]]);
        assert_eq!(doc.children(rows[2]), &[spanning, last]);
        assert_eq!(doc.rowspan(spanning), 1);
        assert_eq!(doc.row_identity(spanning), doc.row_identity(rows[2]));
        assert_eq!(doc.cell_text(spanning), "keep me");
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_delete_rows_shortens_cell_reaching_into_them() {
        let (mut doc, table) = grid(4, 2);
        let rows = doc.rows(table);
        let spanning = doc.children(rows[0])[0];
        let covered = doc.children(rows[1])[0];
        doc.remove(covered).unwrap();
        doc.set_spans(spanning, 2, 1).unwrap();

        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 30.0, 200.0, 90.0),
        };
        assert_eq!(run(&mut doc, &command).unwrap(), DeleteOutcome::Updated);

        assert_eq!(doc.rows(table), vec![rows[0], rows[3]]);
        assert_eq!(doc.parent(spanning), Some(rows[0]));
        assert_eq!(doc.rowspan(spanning), 1);
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_delete_row_missing_the_table_is_unchanged() {
        let (mut doc, table) = grid(2, 2);
        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 200.0, 200.0, 230.0),
        };
        assert_eq!(run(&mut doc, &command).unwrap(), DeleteOutcome::Unchanged);
        assert_eq!(doc.rows(table).len(), 2);
        assert_eq!(doc.cells(table).len(), 4);
    }

    #[test]
    fn test_delete_every_row_destroys_table() {
        let (mut doc, table) = grid(2, 2);
        let command = DeleteRow {
            table_id: table,
            compare_rect: Rect::new(0.0, 0.0, 200.0, 60.0),
        };
        assert_eq!(run(&mut doc, &command).unwrap(), DeleteOutcome::Destroyed);
        assert!(!doc.is_attached(table));
    }

    #[test]
    fn test_insert_empty_row() {
        let (mut doc, table) = grid(2, 3);
        let rows = doc.rows(table);

        let command = InsertEmptyRow {
            table_id: table,
            reference_row: rows[0],
            side: Side::After,
        };
        let row = run(&mut doc, &command).unwrap().unwrap();

        assert_eq!(doc.rows(table), vec![rows[0], row, rows[1]]);
        let cell = doc.children(row)[0];
        assert_eq!(doc.colspan(cell), 3);
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_insert_empty_row_rejects_foreign_row() {
        let (mut doc, table) = grid(1, 1);
        let cell = doc.cells(table)[0];
        let command = InsertEmptyRow {
            table_id: table,
            reference_row: cell,
            side: Side::Before,
        };
        assert!(matches!(
            run(&mut doc, &command),
            Err(EditError::Model(TableModelError::WrongKind { .. }))
        ));
    }
}
