//! Structural checks for a table

use crate::{keys, NodeId, NodeKind, Result, TableDocument, TableModelError};

impl TableDocument {
    /// Check the structural invariants of a table and report the first
    /// violation: every cell and line carries its row's identity, stored
    /// spans are at least 1, and each row's own column slots plus the slots
    /// carried in by rowspans from earlier rows equal the column count.
    pub fn validate(&self, table: NodeId) -> Result<()> {
        self.expect_kind(table, NodeKind::Table)?;

        let columns = self.column_count(table);
        if columns == 0 {
            return Err(violation("table has no columns".to_string()));
        }

        let rows = self.rows(table);
        let mut carried = vec![0u32; rows.len()];

        for (index, &row) in rows.iter().enumerate() {
            let identity = self.row_identity(row);
            let mut own = 0u32;

            for &cell in self.children(row) {
                if self.row_identity(cell) != identity {
                    return Err(violation(format!(
                        "cell {} does not carry the identity of row {}",
                        cell, index
                    )));
                }
                for &line in self.children(cell) {
                    if self.row_identity(line) != identity {
                        return Err(violation(format!(
                            "a line of cell {} does not carry the identity of row {}",
                            cell, index
                        )));
                    }
                }
                for key in [keys::ROWSPAN, keys::COLSPAN] {
                    let stored = self.format(cell, key).and_then(|value| value.as_f64());
                    if stored.is_some_and(|span| span < 1.0) {
                        return Err(violation(format!("cell {} has {} below 1", cell, key)));
                    }
                }

                let colspan = self.colspan(cell);
                own += colspan;
                let rowspan = self.rowspan(cell) as usize;
                for slots in carried.iter_mut().skip(index + 1).take(rowspan - 1) {
                    *slots += colspan;
                }
            }

            let occupied = own + carried[index];
            if occupied as usize != columns {
                return Err(violation(format!(
                    "row {} covers {} column slots, expected {}",
                    index, occupied, columns
                )));
            }
        }

        Ok(())
    }
}

fn violation(message: String) -> TableModelError {
    TableModelError::Structure(message)
}

#[cfg(test)]
mod tests {
    use crate::{keys, FormatValue, IdentityStrategy, TableDocument, TableModelError};

    #[test]
    fn test_plain_grid_is_valid() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(3, 4, 100.0).unwrap();
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_rowspan_carries_slots() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(2, 2, 100.0).unwrap();
        let rows = doc.rows(table);

        let spanning = doc.children(rows[0])[0];
        let covered = doc.children(rows[1])[0];
        doc.remove(covered).unwrap();
        doc.set_spans(spanning, 2, 1).unwrap();

        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_slot_mismatch_is_reported() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(2, 2, 100.0).unwrap();
        let cell = doc.cells(table)[0];
        doc.set_spans(cell, 1, 2).unwrap();

        assert!(matches!(
            doc.validate(table),
            Err(TableModelError::Structure(message)) if message.contains("row 0")
        ));
    }

    #[test]
    fn test_identity_mismatch_is_reported() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.create_table(1, 2, 100.0).unwrap();
        let cell = doc.cells(table)[1];
        doc.set_format(cell, keys::ROW, Some(FormatValue::from("row-other")))
            .unwrap();

        assert!(doc.validate(table).is_err());
    }
}
