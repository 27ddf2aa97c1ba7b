//! Table tree operations and storage

use crate::{
    accepts_key, canonical_key, column_default, column_defaults, keys, FormatValue, Formats,
    IdentityGenerator, IdentityStrategy, Node, NodeId, NodeKind, Result, TableModelError,
    TableNode, DEFAULT_COLUMN_WIDTH,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Arena of table nodes plus the list of attached tables.
///
/// Parent/child links are stored as ordered child id vectors; siblings are
/// derived from the parent's list and are only valid until it changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TableDocument {
    nodes: HashMap<NodeId, TableNode>,
    tables: Vec<NodeId>,
    #[serde(default)]
    identities: IdentityGenerator,
}

impl TableDocument {
    /// Create an empty document with random identities
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identities(strategy: IdentityStrategy) -> Self {
        Self {
            identities: IdentityGenerator::new(strategy),
            ..Self::default()
        }
    }

    /// Issue a fresh `row-…` identity
    pub fn next_row_id(&mut self) -> String {
        self.identities.row_id()
    }

    /// Issue a fresh `cell-…` identity
    pub fn next_cell_id(&mut self) -> String {
        self.identities.cell_id()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    pub fn node(&self, id: NodeId) -> Option<&TableNode> {
        self.nodes.get(&id)
    }

    fn get(&self, id: NodeId) -> Result<&TableNode> {
        self.nodes.get(&id).ok_or(TableModelError::NodeNotFound(id))
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut TableNode> {
        self.nodes
            .get_mut(&id)
            .ok_or(TableModelError::NodeNotFound(id))
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    /// Number of live nodes in the arena
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn kind(&self, id: NodeId) -> Option<NodeKind> {
        self.nodes.get(&id).map(|node| node.kind())
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes.get(&id).and_then(|node| node.parent())
    }

    /// Ordered children of a node (empty for unknown ids)
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes
            .get(&id)
            .map(|node| node.children())
            .unwrap_or(&[])
    }

    /// Fail unless `id` names a live node of the `expected` kind
    pub fn expect_kind(&self, id: NodeId, expected: NodeKind) -> Result<()> {
        let found = self.get(id)?.kind();
        if found == expected {
            Ok(())
        } else {
            Err(TableModelError::WrongKind { expected, found })
        }
    }

    /// Attached tables in insertion order
    pub fn tables(&self) -> &[NodeId] {
        &self.tables
    }

    pub fn is_attached(&self, table: NodeId) -> bool {
        self.tables.contains(&table)
    }

    // =========================================================================
    // Navigation
    // =========================================================================

    pub fn index_in_parent(&self, id: NodeId) -> Option<usize> {
        let parent = self.parent(id)?;
        self.children(parent).iter().position(|&child| child == id)
    }

    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?;
        self.children(parent).get(index + 1).copied()
    }

    pub fn previous_sibling(&self, id: NodeId) -> Option<NodeId> {
        let parent = self.parent(id)?;
        let index = self.index_in_parent(id)?.checked_sub(1)?;
        self.children(parent).get(index).copied()
    }

    /// Position of a row within its body
    pub fn row_offset(&self, row: NodeId) -> Option<usize> {
        match self.kind(row)? {
            NodeKind::Row => self.index_in_parent(row),
            _ => None,
        }
    }

    /// Position of a cell within its row
    pub fn cell_offset(&self, cell: NodeId) -> Option<usize> {
        match self.kind(cell)? {
            NodeKind::Cell => self.index_in_parent(cell),
            _ => None,
        }
    }

    /// Nearest enclosing table (a table is its own table)
    pub fn table_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        loop {
            if self.kind(current)? == NodeKind::Table {
                return Some(current);
            }
            current = self.parent(current)?;
        }
    }

    fn child_of_kind(&self, parent: NodeId, kind: NodeKind) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .copied()
            .find(|&child| self.kind(child) == Some(kind))
    }

    pub fn column_group(&self, table: NodeId) -> Option<NodeId> {
        self.child_of_kind(table, NodeKind::ColumnGroup)
    }

    pub fn body(&self, table: NodeId) -> Option<NodeId> {
        self.child_of_kind(table, NodeKind::Body)
    }

    pub fn columns(&self, table: NodeId) -> Vec<NodeId> {
        self.column_group(table)
            .map(|group| self.children(group).to_vec())
            .unwrap_or_default()
    }

    pub fn rows(&self, table: NodeId) -> Vec<NodeId> {
        self.body(table)
            .map(|body| self.children(body).to_vec())
            .unwrap_or_default()
    }

    /// All cells of a table in document order
    pub fn cells(&self, table: NodeId) -> Vec<NodeId> {
        self.rows(table)
            .iter()
            .flat_map(|&row| self.children(row).iter().copied())
            .collect()
    }

    /// The cell at child index `column` of every row that has one.
    ///
    /// This is a positional lookup; with spans the result is not the set of
    /// cells covering a visual column.
    pub fn cells_in_column(&self, table: NodeId, column: usize) -> Vec<NodeId> {
        self.rows(table)
            .iter()
            .filter_map(|&row| self.children(row).get(column).copied())
            .collect()
    }

    /// Number of columns, always taken from the column group
    pub fn column_count(&self, table: NodeId) -> usize {
        self.column_group(table)
            .map(|group| self.children(group).len())
            .unwrap_or(0)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    /// Create a detached node. Falsy values are dropped; keys the kind does
    /// not accept are rejected.
    pub fn create_node(&mut self, kind: NodeKind, formats: Formats) -> Result<NodeId> {
        let mut stored = Formats::new();
        for (name, value) in formats {
            let key = canonical_key(&name);
            if !accepts_key(kind, key) {
                return Err(TableModelError::UnsupportedFormat {
                    kind,
                    key: key.to_string(),
                });
            }
            if !value.is_falsy() {
                stored.insert(key.to_string(), value);
            }
        }

        let node = TableNode::new(kind, stored);
        let id = node.id();
        self.nodes.insert(id, node);
        Ok(id)
    }

    /// Insert `child` under `parent`, before `before` or at the end.
    ///
    /// An attached child is moved: it is detached from its old parent first.
    pub fn insert_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        before: Option<NodeId>,
    ) -> Result<()> {
        let parent_kind = self.get(parent)?.kind();
        let child_kind = self.get(child)?.kind();
        if !parent_kind.can_contain(child_kind) {
            return Err(TableModelError::InvalidChild {
                parent: parent_kind,
                child: child_kind,
            });
        }
        if let Some(reference) = before {
            if reference == child || self.parent(reference) != Some(parent) {
                return Err(TableModelError::InvalidReference(reference));
            }
        }

        self.detach(child)?;

        let siblings = self.get_mut(parent)?.children_mut();
        let index = before
            .and_then(|reference| siblings.iter().position(|&id| id == reference))
            .unwrap_or(siblings.len());
        siblings.insert(index, child);

        self.get_mut(child)?.set_parent(Some(parent));
        Ok(())
    }

    pub fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<()> {
        self.insert_child(parent, child, None)
    }

    /// Unlink a node from its parent (or from the attached tables), keeping
    /// its subtree in the arena
    pub fn detach(&mut self, id: NodeId) -> Result<()> {
        if let Some(parent) = self.get(id)?.parent() {
            if let Some(node) = self.nodes.get_mut(&parent) {
                node.children_mut().retain(|&child| child != id);
            }
            self.get_mut(id)?.set_parent(None);
        }
        self.tables.retain(|&table| table != id);
        Ok(())
    }

    /// Detach a node and drop it together with its whole subtree
    pub fn remove(&mut self, id: NodeId) -> Result<()> {
        self.detach(id)?;

        let mut pending = vec![id];
        while let Some(current) = pending.pop() {
            if let Some(node) = self.nodes.remove(&current) {
                pending.extend_from_slice(node.children());
            }
        }
        Ok(())
    }

    /// Move every child of `from` to the end of `to`
    pub fn move_children(&mut self, from: NodeId, to: NodeId) -> Result<()> {
        let moved = self.get(from)?.children().to_vec();
        for child in moved {
            self.insert_child(to, child, None)?;
        }
        Ok(())
    }

    /// Register a table as part of the document
    pub fn attach_table(&mut self, table: NodeId) -> Result<()> {
        self.expect_kind(table, NodeKind::Table)?;
        if !self.tables.contains(&table) {
            self.tables.push(table);
        }
        Ok(())
    }

    // =========================================================================
    // Builders
    // =========================================================================

    /// Create a detached row carrying `identity`
    pub fn create_row(&mut self, identity: &str) -> Result<NodeId> {
        let formats = Formats::from([(keys::ROW.to_string(), FormatValue::from(identity))]);
        self.create_node(NodeKind::Row, formats)
    }

    /// Create a detached cell with one empty line under a fresh cell identity
    pub fn create_cell(&mut self, row_identity: &str, rowspan: u32, colspan: u32) -> Result<NodeId> {
        let mut formats = Formats::new();
        formats.insert(keys::ROW.to_string(), row_identity.into());
        formats.insert(keys::ROWSPAN.to_string(), rowspan.max(1).into());
        formats.insert(keys::COLSPAN.to_string(), colspan.max(1).into());

        let cell = self.create_node(NodeKind::Cell, formats.clone())?;
        formats.insert(keys::CELL.to_string(), self.next_cell_id().into());
        let line = self.create_node(NodeKind::CellLine, formats)?;
        self.append_child(cell, line)?;
        Ok(cell)
    }

    pub fn create_column(&mut self, formats: Formats) -> Result<NodeId> {
        self.create_node(NodeKind::Column, formats)
    }

    /// Build and attach a plain `rows` x `cols` grid
    pub fn create_table(&mut self, rows: usize, cols: usize, column_width_pt: f64) -> Result<NodeId> {
        if rows == 0 || cols == 0 {
            return Err(TableModelError::Structure(
                "a table needs at least one row and one column".to_string(),
            ));
        }

        let table = self.create_node(NodeKind::Table, Formats::new())?;
        let group = self.create_node(NodeKind::ColumnGroup, Formats::new())?;
        let body = self.create_node(NodeKind::Body, Formats::new())?;
        self.append_child(table, group)?;
        self.append_child(table, body)?;

        for _ in 0..cols {
            let width = Formats::from([(keys::WIDTH.to_string(), FormatValue::from(column_width_pt))]);
            let column = self.create_column(width)?;
            self.append_child(group, column)?;
        }

        for _ in 0..rows {
            let identity = self.next_row_id();
            let row = self.create_row(&identity)?;
            self.append_child(body, row)?;
            for _ in 0..cols {
                let cell = self.create_cell(&identity, 1, 1)?;
                self.append_child(row, cell)?;
            }
        }

        self.attach_table(table)?;
        Ok(table)
    }

    // =========================================================================
    // Formats
    // =========================================================================

    /// Attributes of a node; columns report defaults for absent keys
    pub fn formats(&self, id: NodeId) -> Result<Formats> {
        let node = self.get(id)?;
        let mut formats = match node.kind() {
            NodeKind::Column => column_defaults(),
            _ => Formats::new(),
        };
        formats.extend(
            node.stored_formats()
                .iter()
                .map(|(key, value)| (key.clone(), value.clone())),
        );
        Ok(formats)
    }

    pub fn format(&self, id: NodeId, key: &str) -> Option<FormatValue> {
        let node = self.nodes.get(&id)?;
        let key = canonical_key(key);
        node.stored_formats()
            .get(key)
            .cloned()
            .or_else(|| match node.kind() {
                NodeKind::Column => column_default(key),
                _ => None,
            })
    }

    /// Set or clear (`None` or a falsy value) one attribute.
    ///
    /// On a cell the value is written through to every line, and
    /// `row_height` is also written to the parent row.
    pub fn set_format(&mut self, id: NodeId, name: &str, value: Option<FormatValue>) -> Result<()> {
        let kind = self.get(id)?.kind();
        let key = canonical_key(name);
        if !accepts_key(kind, key) {
            return Err(TableModelError::UnsupportedFormat {
                kind,
                key: key.to_string(),
            });
        }
        let value = value.filter(|value| !value.is_falsy());

        match kind {
            NodeKind::CellLine if key == keys::HEADER && value.is_none() => {}
            NodeKind::Cell => {
                self.get_mut(id)?.toggle(key, value.clone());
                for line in self.children(id).to_vec() {
                    self.get_mut(line)?.toggle(key, value.clone());
                }
                if key == keys::ROW_HEIGHT {
                    if let Some(row) = self.parent(id) {
                        self.get_mut(row)?.toggle(key, value);
                    }
                }
            }
            _ => self.get_mut(id)?.toggle(key, value),
        }
        Ok(())
    }

    pub fn row_identity(&self, id: NodeId) -> Option<String> {
        self.format(id, keys::ROW).map(|value| value.to_string())
    }

    pub fn cell_identity(&self, line: NodeId) -> Option<String> {
        self.format(line, keys::CELL).map(|value| value.to_string())
    }

    pub fn rowspan(&self, id: NodeId) -> u32 {
        self.span(id, keys::ROWSPAN)
    }

    pub fn colspan(&self, id: NodeId) -> u32 {
        self.span(id, keys::COLSPAN)
    }

    fn span(&self, id: NodeId, key: &str) -> u32 {
        self.format(id, key)
            .and_then(|value| value.as_f64())
            .filter(|span| span.is_finite() && *span >= 1.0)
            .map(|span| span.floor() as u32)
            .unwrap_or(1)
    }

    /// Set both spans of a cell (and its lines), flooring each at 1
    pub fn set_spans(&mut self, cell: NodeId, rowspan: u32, colspan: u32) -> Result<()> {
        self.set_format(cell, keys::ROWSPAN, Some(rowspan.max(1).into()))?;
        self.set_format(cell, keys::COLSPAN, Some(colspan.max(1).into()))
    }

    /// Column width in points
    pub fn column_width(&self, column: NodeId) -> f64 {
        self.format(column, keys::WIDTH)
            .and_then(|value| value.as_f64())
            .filter(|width| width.is_finite() && *width > 0.0)
            .unwrap_or(DEFAULT_COLUMN_WIDTH)
    }

    pub fn text(&self, line: NodeId) -> Option<&str> {
        self.nodes.get(&line)?.text_content()
    }

    pub fn set_text(&mut self, line: NodeId, text: impl Into<String>) -> Result<()> {
        self.expect_kind(line, NodeKind::CellLine)?;
        self.get_mut(line)?.set_text(text.into());
        Ok(())
    }

    /// Text of all lines of a cell joined by newlines
    pub fn cell_text(&self, cell: NodeId) -> String {
        self.children(cell)
            .iter()
            .filter_map(|&line| self.text(line))
            .collect::<Vec<_>>()
            .join("\n")
    }

    // =========================================================================
    // Normalization
    // =========================================================================

    /// Merge adjacent rows that share a row identity, then adjacent cells
    /// that share a cell identity. Rows are never removed for being empty.
    pub fn optimize(&mut self, table: NodeId) -> Result<()> {
        self.expect_kind(table, NodeKind::Table)?;
        let Some(body) = self.body(table) else {
            return Ok(());
        };

        self.merge_adjacent(body, keys::ROW)?;
        for row in self.children(body).to_vec() {
            self.merge_adjacent(row, keys::CELL)?;
        }
        Ok(())
    }

    /// Merge each pair of siblings under `parent` whose touching children
    /// (tail of the first, head of the second) carry the same `key`
    fn merge_adjacent(&mut self, parent: NodeId, key: &str) -> Result<()> {
        let mut index = 0;
        while let (Some(&first), Some(&second)) = (
            self.children(parent).get(index),
            self.children(parent).get(index + 1),
        ) {
            let tail = self
                .children(first)
                .last()
                .and_then(|&child| self.format(child, key));
            let head = self
                .children(second)
                .first()
                .and_then(|&child| self.format(child, key));

            if tail.is_some() && tail == head {
                self.move_children(second, first)?;
                self.remove(second)?;
            } else {
                index += 1;
            }
        }
        Ok(())
    }
}
