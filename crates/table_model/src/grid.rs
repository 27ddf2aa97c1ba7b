//! Placement of cells on the row/column slot grid

use crate::{NodeId, TableDocument};
use std::collections::HashMap;
use std::ops::Range;

/// Slots a cell occupies: its first row and column index plus its spans,
/// clipped to the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GridPlacement {
    pub row: usize,
    pub column: usize,
    pub rowspan: usize,
    pub colspan: usize,
}

impl GridPlacement {
    pub fn rows(&self) -> Range<usize> {
        self.row..self.row + self.rowspan
    }

    pub fn columns(&self) -> Range<usize> {
        self.column..self.column + self.colspan
    }
}

impl TableDocument {
    /// Place every cell of a table on the slot grid.
    ///
    /// Cells fill the free column slots of their row left to right, skipping
    /// slots held by rowspans from earlier rows. Cells that find no free slot
    /// are left out.
    pub fn placements(&self, table: NodeId) -> HashMap<NodeId, GridPlacement> {
        let slot_count = self.column_count(table);
        let rows = self.rows(table);
        let mut placements = HashMap::new();
        // Row index up to which each column slot is held by a rowspan
        let mut busy_until = vec![0usize; slot_count];

        for (index, &row) in rows.iter().enumerate() {
            let mut slot = 0;
            for &cell in self.children(row) {
                while slot < slot_count && busy_until[slot] > index {
                    slot += 1;
                }
                if slot >= slot_count {
                    break;
                }

                let colspan = (self.colspan(cell) as usize).min(slot_count - slot);
                let rowspan = (self.rowspan(cell) as usize).min(rows.len() - index);
                for held in &mut busy_until[slot..slot + colspan] {
                    *held = index + rowspan;
                }

                placements.insert(
                    cell,
                    GridPlacement {
                        row: index,
                        column: slot,
                        rowspan,
                        colspan,
                    },
                );
                slot += colspan;
            }
        }

        placements
    }
}

#[cfg(test)]
mod tests {
    use crate::{IdentityStrategy, TableDocument};

    #[test]
    fn test_plain_grid_placements() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(2, 3, 100.0).unwrap();
        let placements = doc.placements(table);

        let last = doc.children(doc.rows(table)[1])[2];
        assert_eq!(placements.len(), 6);
        assert_eq!(placements[&last].row, 1);
        assert_eq!(placements[&last].column, 2);
    }

    #[test]
    fn test_rowspan_pushes_later_cells_right() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(2, 2, 100.0).unwrap();
        let rows = doc.rows(table);
        let spanning = doc.children(rows[0])[0];
        let covered = doc.children(rows[1])[0];
        doc.remove(covered).unwrap();
        doc.set_spans(spanning, 2, 1).unwrap();

        let placements = doc.placements(table);
        let remaining = doc.children(rows[1])[0];

        assert_eq!(placements[&spanning].rows(), 0..2);
        assert_eq!(placements[&remaining].columns(), 1..2);
    }

    #[test]
    fn test_spans_are_clipped_to_grid() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(1, 2, 100.0).unwrap();
        let row = doc.rows(table)[0];
        let cells = doc.children(row).to_vec();
        doc.remove(cells[1]).unwrap();
        doc.set_spans(cells[0], 4, 5).unwrap();

        let placement = doc.placements(table)[&cells[0]];
        assert_eq!(placement.rowspan, 1);
        assert_eq!(placement.colspan, 2);
    }
}
