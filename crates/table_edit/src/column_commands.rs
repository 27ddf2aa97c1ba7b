//! Column insertion and deletion

use crate::command::editable_body;
use crate::{
    classify, classify_boundary, destroy_table, placed_cells, DeleteOutcome, Edge, EditContext,
    EditError, Result, Side, TableCommand,
};
use serde::{Deserialize, Serialize};
use table_layout::{column_attributes_for_insert, columns_width_pt, sync_preferred_width, Axis, Rect};
use table_model::{keys, NodeId, TableModelError};

// =============================================================================
// InsertColumn Command
// =============================================================================

/// Insert a column next to the column at `column_index`.
///
/// `compare_rect` is the rendered extent of the compared column; its right
/// edge (or left edge when inserting before) is the insertion line. Cells
/// whose edge lies on the line get a new neighbour, cells crossing it grow
/// by one column. Returns the new and widened cells, top to bottom.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertColumn {
    pub table_id: NodeId,
    pub compare_rect: Rect,
    pub column_index: usize,
    pub side: Side,
}

impl TableCommand for InsertColumn {
    type Output = Vec<NodeId>;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<Vec<NodeId>> {
        if editable_body(ctx.document, self.table_id)?.is_none() {
            return Ok(Vec::new());
        }

        let columns = ctx.document.columns(self.table_id);
        let reference = *columns.get(self.column_index).ok_or_else(|| {
            EditError::InvalidCommand(format!(
                "column index {} out of range for {} columns",
                self.column_index,
                columns.len()
            ))
        })?;
        let group = ctx
            .document
            .column_group(self.table_id)
            .ok_or_else(|| TableModelError::Structure("table has no column group".to_string()))?;

        let tolerance = ctx.tolerance();
        let cells = placed_cells(ctx.document, ctx.geometry, self.table_id);
        let (edge, line) = match self.side {
            Side::After => (Edge::End, self.compare_rect.x1),
            Side::Before => (Edge::Start, self.compare_rect.x),
        };
        let boundary = classify_boundary(&cells, line, Axis::X, edge, tolerance);
        if boundary.aligned.is_empty() && boundary.interior.is_empty() {
            return Err(EditError::GeometryMismatch(format!(
                "no cell edge or cell crosses x = {}",
                line
            )));
        }

        let mut affected = Vec::new();

        for placed in &boundary.aligned {
            let row = ctx
                .document
                .parent(placed.id)
                .ok_or(TableModelError::NodeNotFound(placed.id))?;
            let identity = ctx.document.row_identity(row).unwrap_or_default();
            let rowspan = ctx.document.rowspan(placed.id);

            let cell = ctx.document.create_cell(&identity, rowspan, 1)?;
            let before = match self.side {
                Side::After => ctx.document.next_sibling(placed.id),
                Side::Before => Some(placed.id),
            };
            ctx.document.insert_child(row, cell, before)?;
            affected.push((cell, placed.rect.y));
        }

        for placed in &boundary.interior {
            let colspan = ctx.document.colspan(placed.id) + 1;
            ctx.document
                .set_format(placed.id, keys::COLSPAN, Some(colspan.into()))?;
            affected.push((placed.id, placed.rect.y));
        }

        let attributes = column_attributes_for_insert(
            ctx.document,
            self.table_id,
            Some(reference),
            &ctx.settings.page,
        )?;
        let column = ctx.document.create_column(attributes)?;
        let before = match self.side {
            Side::After => ctx.document.next_sibling(reference),
            Side::Before => Some(reference),
        };
        ctx.document.insert_child(group, column, before)?;

        tracing::debug!(
            "Inserted column into table {}: {} new cells, {} widened, width {}pt",
            self.table_id,
            boundary.aligned.len(),
            boundary.interior.len(),
            columns_width_pt(ctx.document, self.table_id)
        );

        affected.sort_by(|a, b| a.1.total_cmp(&b.1));
        Ok(affected.into_iter().map(|(cell, _)| cell).collect())
    }

    fn display_name(&self) -> &str {
        match self.side {
            Side::Before => "Insert Column Left",
            Side::After => "Insert Column Right",
        }
    }
}

// =============================================================================
// DeleteColumns Command
// =============================================================================

/// Delete the columns at `column_indexes`, whose rendered extent is
/// `compare_rect`.
///
/// Cells inside the rectangle are removed and cells spanning across it lose
/// one column per deleted column. When every cell (or every column) goes,
/// the table is destroyed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteColumns {
    pub table_id: NodeId,
    pub compare_rect: Rect,
    pub column_indexes: Vec<usize>,
}

impl TableCommand for DeleteColumns {
    type Output = DeleteOutcome;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<DeleteOutcome> {
        if editable_body(ctx.document, self.table_id)?.is_none() {
            return Ok(DeleteOutcome::Unchanged);
        }

        let columns = ctx.document.columns(self.table_id);
        let mut indexes = self.column_indexes.clone();
        indexes.sort_unstable_by(|a, b| b.cmp(a));
        indexes.dedup();
        if let Some(&out_of_range) = indexes.iter().find(|&&index| index >= columns.len()) {
            return Err(EditError::InvalidCommand(format!(
                "column index {} out of range for {} columns",
                out_of_range,
                columns.len()
            )));
        }
        if indexes.is_empty() {
            return Ok(DeleteOutcome::Unchanged);
        }

        let total = ctx.document.cells(self.table_id).len();
        let cells = placed_cells(ctx.document, ctx.geometry, self.table_id);
        let classification = classify(&cells, &self.compare_rect, Axis::X, ctx.tolerance());
        if classification.is_empty() {
            return Ok(DeleteOutcome::Unchanged);
        }

        if classification.removed.len() == total || indexes.len() == columns.len() {
            destroy_table(ctx, self.table_id)?;
            return Ok(DeleteOutcome::Destroyed);
        }

        // A surviving cell loses one column per deleted slot it covers
        let deleted = indexes.len() as u32;
        let placements = ctx.document.placements(self.table_id);
        let narrowed: Vec<(NodeId, u32)> = classification
            .shrinking()
            .map(|placed| {
                let lost = placements
                    .get(&placed.id)
                    .map(|placement| {
                        placement
                            .columns()
                            .filter(|column| indexes.contains(column))
                            .count() as u32
                    })
                    .unwrap_or(deleted);
                let colspan = ctx.document.colspan(placed.id).saturating_sub(lost).max(1);
                (placed.id, colspan)
            })
            .collect();

        for &index in &indexes {
            ctx.document.remove(columns[index])?;
        }
        for placed in &classification.removed {
            ctx.document.remove(placed.id)?;
        }
        for &(cell, colspan) in &narrowed {
            ctx.document
                .set_format(cell, keys::COLSPAN, Some(colspan.into()))?;
        }

        let width_pt = columns_width_pt(ctx.document, self.table_id);
        sync_preferred_width(ctx.document, self.table_id, width_pt)?;

        tracing::debug!(
            "Deleted {} columns from table {}: {} cells removed, {} narrowed",
            deleted,
            self.table_id,
            classification.removed.len(),
            narrowed.len()
        );
        Ok(DeleteOutcome::Updated)
    }

    fn display_name(&self) -> &str {
        "Delete Column"
    }
}
