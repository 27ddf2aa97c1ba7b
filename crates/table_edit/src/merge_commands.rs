//! Merging and splitting of cells

use crate::{EditContext, EditError, Result, TableCommand};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use table_layout::{Rect, RenderGeometry};
use table_model::{keys, NodeId, NodeKind, TableDocument, TableModelError};

// =============================================================================
// MergeCells Command
// =============================================================================

/// Merge `cells` into the first of them.
///
/// The lines of the other cells move into the surviving cell in the given
/// order and the emptied cells are removed. Every line then carries the
/// survivor's row identity, the cell identity of its first line and the new
/// spans. Rows left without cells are kept; the merged cell covers them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergeCells {
    pub cells: Vec<NodeId>,
    pub rowspan: u32,
    pub colspan: u32,
}

impl TableCommand for MergeCells {
    type Output = Option<NodeId>;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<Option<NodeId>> {
        let Some((&survivor, others)) = self.cells.split_first() else {
            return Ok(None);
        };
        let mut seen = HashSet::new();
        for &cell in &self.cells {
            ctx.document.expect_kind(cell, NodeKind::Cell)?;
            if !seen.insert(cell) {
                return Err(EditError::InvalidCommand(format!(
                    "cell {} is listed more than once",
                    cell
                )));
            }
        }

        let document = &mut *ctx.document;
        for &cell in others {
            document.move_children(cell, survivor)?;
            document.remove(cell)?;
        }

        let row_identity = document
            .parent(survivor)
            .and_then(|row| document.row_identity(row))
            .ok_or_else(|| {
                TableModelError::Structure(format!("cell {} is not inside a row", survivor))
            })?;
        let lines = document.children(survivor).to_vec();
        let cell_identity = lines
            .first()
            .and_then(|&line| document.cell_identity(line))
            .unwrap_or_else(|| document.next_cell_id());

        document.set_format(survivor, keys::ROW, Some(row_identity.into()))?;
        document.set_spans(survivor, self.rowspan, self.colspan)?;
        for &line in &lines {
            document.set_format(line, keys::CELL, Some(cell_identity.as_str().into()))?;
        }

        tracing::debug!(
            "Merged {} cells into {} ({}x{})",
            self.cells.len(),
            survivor,
            self.rowspan.max(1),
            self.colspan.max(1)
        );
        Ok(Some(survivor))
    }

    fn display_name(&self) -> &str {
        "Merge Cells"
    }
}

// =============================================================================
// UnmergeCells Command
// =============================================================================

/// Split each of `cells` back into single-slot cells.
///
/// A cell spanning several columns gets empty neighbours to its right; a cell
/// spanning several rows gets empty cells in each covered row, placed by the
/// cell's rendered rectangle. Returns the new cells.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnmergeCells {
    pub cells: Vec<NodeId>,
}

impl TableCommand for UnmergeCells {
    type Output = Vec<NodeId>;

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<Vec<NodeId>> {
        let tolerance = ctx.tolerance();
        let mut placed = PlacementOverlay::new(ctx.geometry);

        let mut rects = HashMap::new();
        for &cell in &self.cells {
            ctx.document.expect_kind(cell, NodeKind::Cell)?;
            match ctx.geometry.cell_rect(cell) {
                Some(rect) => {
                    rects.insert(cell, rect);
                }
                None if ctx.document.rowspan(cell) > 1 => {
                    return Err(EditError::GeometryMismatch(format!(
                        "cell {} spans rows but has no rendered geometry",
                        cell
                    )));
                }
                None => {}
            }
        }

        let document = &mut *ctx.document;
        let mut created = Vec::new();
        for &cell in &self.cells {
            let rowspan = document.rowspan(cell);
            let colspan = document.colspan(cell);
            let Some(row) = document.parent(cell) else {
                continue;
            };
            let rect = rects.get(&cell).copied();

            if colspan > 1 {
                let next = document.next_sibling(cell);
                document.set_format(cell, keys::COLSPAN, Some(1u32.into()))?;
                for slot in 1..colspan {
                    let new_cell = insert_cell(document, row, next)?;
                    if let Some(rect) = rect {
                        let width = rect.width() / colspan as f64;
                        let x = rect.x + width * slot as f64;
                        placed.add(new_cell, Rect::new(x, rect.y, x + width, rect.y1));
                    }
                    created.push(new_cell);
                }
            }

            if rowspan > 1 {
                let Some(rect) = rect else {
                    continue;
                };
                let mut target = document.next_sibling(row);
                for _ in 1..rowspan {
                    let Some(current) = target else {
                        tracing::warn!("Cell {} spans past the last row", cell);
                        break;
                    };
                    let siblings = document.children(current).to_vec();
                    let before = placed.first_at_or_right_of(&siblings, rect.x1, tolerance);
                    for _ in 0..colspan {
                        let new_cell = insert_cell(document, current, before)?;
                        placed.add(new_cell, rect);
                        created.push(new_cell);
                    }
                    target = document.next_sibling(current);
                }
                document.set_format(cell, keys::ROWSPAN, Some(1u32.into()))?;
            }
        }

        tracing::debug!(
            "Unmerged {} cells, created {}",
            self.cells.len(),
            created.len()
        );
        Ok(created)
    }

    fn display_name(&self) -> &str {
        "Unmerge Cells"
    }
}

/// Insert an empty single-slot cell carrying the identity of `row`
fn insert_cell(document: &mut TableDocument, row: NodeId, before: Option<NodeId>) -> Result<NodeId> {
    let identity = document
        .row_identity(row)
        .ok_or_else(|| TableModelError::Structure(format!("row {} has no identity", row)))?;
    let cell = document.create_cell(&identity, 1, 1)?;
    document.insert_child(row, cell, before)?;
    Ok(cell)
}

/// Rendered geometry plus the positions of cells created during the edit
struct PlacementOverlay<'a> {
    base: &'a dyn RenderGeometry,
    added: HashMap<NodeId, Rect>,
}

impl<'a> PlacementOverlay<'a> {
    fn new(base: &'a dyn RenderGeometry) -> Self {
        Self {
            base,
            added: HashMap::new(),
        }
    }

    fn add(&mut self, cell: NodeId, rect: Rect) {
        self.added.insert(cell, rect);
    }

    fn first_at_or_right_of(&self, candidates: &[NodeId], x: f64, tolerance: f64) -> Option<NodeId> {
        crate::hit_test::first_at_or_right_of(self, candidates, x, tolerance)
    }
}

impl RenderGeometry for PlacementOverlay<'_> {
    fn cell_rect(&self, cell: NodeId) -> Option<Rect> {
        self.added
            .get(&cell)
            .copied()
            .or_else(|| self.base.cell_rect(cell))
    }

    fn row_rect(&self, row: NodeId) -> Option<Rect> {
        self.base.row_rect(row)
    }
}
