//! Flat line snapshot of a table
//!
//! A snapshot lists a table's column attributes and, in document order, the
//! attributes and text of every cell line. Rows and cells are implied by the
//! `row` and `cell` identities on the lines.

use crate::{
    accepts_key, canonical_key, keys, FormatValue, Formats, NodeKind, NodeId, Result,
    TableDocument, TableModelError,
};
use serde::{Deserialize, Serialize};

/// One cell line: its attributes and text
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LineRecord {
    pub formats: Formats,
    #[serde(default)]
    pub text: String,
}

impl LineRecord {
    pub fn new(formats: Formats, text: impl Into<String>) -> Self {
        Self {
            formats,
            text: text.into(),
        }
    }
}

/// Column attributes plus the lines of a table, in document order
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub columns: Vec<Formats>,
    pub lines: Vec<LineRecord>,
}

impl TableDocument {
    /// Build and attach a table from a snapshot.
    ///
    /// Every line is wrapped in its own cell and row; adjacent rows and
    /// cells sharing an identity are then merged. Lines without a `row` or
    /// `cell` identity get fresh ones.
    pub fn import(&mut self, snapshot: &TableSnapshot) -> Result<NodeId> {
        if snapshot.columns.is_empty() {
            return Err(TableModelError::Structure(
                "a table snapshot needs at least one column".to_string(),
            ));
        }

        let table = self.create_node(NodeKind::Table, Formats::new())?;
        let group = self.create_node(NodeKind::ColumnGroup, Formats::new())?;
        let body = self.create_node(NodeKind::Body, Formats::new())?;
        self.append_child(table, group)?;
        self.append_child(table, body)?;

        for formats in &snapshot.columns {
            let column = self.create_column(formats.clone())?;
            self.append_child(group, column)?;
        }

        for record in &snapshot.lines {
            let mut formats: Formats = record
                .formats
                .iter()
                .map(|(key, value)| (canonical_key(key).to_string(), value.clone()))
                .collect();
            if !formats.contains_key(keys::ROW) {
                formats.insert(keys::ROW.to_string(), self.next_row_id().into());
            }
            if !formats.contains_key(keys::CELL) {
                formats.insert(keys::CELL.to_string(), self.next_cell_id().into());
            }
            for key in [keys::ROWSPAN, keys::COLSPAN] {
                formats
                    .entry(key.to_string())
                    .or_insert(FormatValue::Number(1.0));
            }

            let cell_formats = filtered(&formats, NodeKind::Cell);
            let row_formats = filtered(&formats, NodeKind::Row);

            let line = self.create_node(NodeKind::CellLine, formats)?;
            self.set_text(line, record.text.as_str())?;
            let cell = self.create_node(NodeKind::Cell, cell_formats)?;
            self.append_child(cell, line)?;
            let row = self.create_node(NodeKind::Row, row_formats)?;
            self.append_child(row, cell)?;
            self.append_child(body, row)?;
        }

        self.attach_table(table)?;
        self.optimize(table)?;
        Ok(table)
    }

    /// Flatten a table into a snapshot
    pub fn export(&self, table: NodeId) -> Result<TableSnapshot> {
        self.expect_kind(table, NodeKind::Table)?;

        let columns = self
            .columns(table)
            .into_iter()
            .map(|column| self.formats(column))
            .collect::<Result<Vec<_>>>()?;

        let mut lines = Vec::new();
        for cell in self.cells(table) {
            for &line in self.children(cell) {
                lines.push(LineRecord::new(
                    self.formats(line)?,
                    self.text(line).unwrap_or_default(),
                ));
            }
        }

        Ok(TableSnapshot { columns, lines })
    }
}

fn filtered(formats: &Formats, kind: NodeKind) -> Formats {
    formats
        .iter()
        .filter(|(key, _)| accepts_key(kind, key))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::IdentityStrategy;

    fn line(row: &str, cell: &str, text: &str) -> LineRecord {
        let formats = Formats::from([
            (keys::ROW.to_string(), FormatValue::from(row)),
            (keys::CELL.to_string(), FormatValue::from(cell)),
            (keys::ROWSPAN.to_string(), FormatValue::from(1u32)),
            (keys::COLSPAN.to_string(), FormatValue::from(1u32)),
        ]);
        LineRecord::new(formats, text)
    }

    fn two_by_two() -> TableSnapshot {
        TableSnapshot {
            columns: vec![Formats::new(), Formats::new()],
            lines: vec![
                line("row-a", "cell-1", "A1"),
                line("row-a", "cell-1", "A1 second line"),
                line("row-a", "cell-2", "A2"),
                line("row-b", "cell-3", "B1"),
                line("row-b", "cell-4", "B2"),
            ],
        }
    }

    #[test]
    fn test_import_groups_lines() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let table = doc.import(&two_by_two()).unwrap();

        let rows = doc.rows(table);
        assert_eq!(rows.len(), 2);
        assert_eq!(doc.row_identity(rows[0]).as_deref(), Some("row-a"));
        assert_eq!(doc.children(rows[0]).len(), 2);
        assert_eq!(doc.children(rows[1]).len(), 2);

        let first = doc.children(rows[0])[0];
        assert_eq!(doc.cell_text(first), "A1\nA1 second line");
        assert_eq!(doc.column_count(table), 2);
        assert!(doc.validate(table).is_ok());
    }

    #[test]
    fn test_export_round_trip() {
        let mut doc = TableDocument::new();
        let snapshot = two_by_two();
        let table = doc.import(&snapshot).unwrap();
        let exported = doc.export(table).unwrap();

        assert_eq!(exported.lines, snapshot.lines);
        assert_eq!(exported.columns.len(), 2);
        assert_eq!(exported.columns[0][keys::WIDTH], FormatValue::from(100.0));

        let mut other = TableDocument::new();
        let copy = other.import(&exported).unwrap();
        assert_eq!(other.export(copy).unwrap(), exported);
    }

    #[test]
    fn test_import_fills_missing_identities() {
        let mut doc = TableDocument::with_identities(IdentityStrategy::Sequential);
        let snapshot = TableSnapshot {
            columns: vec![Formats::new()],
            lines: vec![LineRecord::new(Formats::new(), "plain")],
        };
        let table = doc.import(&snapshot).unwrap();
        let cell = doc.cells(table)[0];
        let line = doc.children(cell)[0];

        assert!(doc.row_identity(cell).unwrap().starts_with("row-"));
        assert!(doc.cell_identity(line).unwrap().starts_with("cell-"));
        assert_eq!(doc.colspan(cell), 1);
    }

    #[test]
    fn test_import_rejects_missing_columns() {
        let mut doc = TableDocument::new();
        assert!(doc.import(&TableSnapshot::default()).is_err());
        assert!(doc.tables().is_empty());
    }

    #[test]
    fn test_snapshot_serde() {
        let json = r#"{
            "columns": [{"width": 150}],
            "lines": [{"formats": {"row": "row-x", "cell": "cell-y", "cell-bg": "blue"}, "text": "hi"}]
        }"#;
        let snapshot: TableSnapshot = serde_json::from_str(json).unwrap();
        let mut doc = TableDocument::new();
        let table = doc.import(&snapshot).unwrap();
        let cell = doc.cells(table)[0];

        assert_eq!(doc.format(cell, keys::CELL_BG), Some(FormatValue::from("blue")));
        assert_eq!(doc.column_width(doc.columns(table)[0]), 150.0);
    }
}
