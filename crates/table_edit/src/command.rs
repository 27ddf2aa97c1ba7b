//! Command system for table editing

use crate::{EditorSettings, EditorSurface, Result};
use serde::{Deserialize, Serialize};
use table_layout::RenderGeometry;
use table_model::{NodeId, NodeKind, TableDocument};

/// Everything a table command works against
pub struct EditContext<'a> {
    /// The document being edited
    pub document: &'a mut TableDocument,
    /// Rendered rectangles of the document's cells and rows, taken before
    /// the command runs
    pub geometry: &'a dyn RenderGeometry,
    /// Host editor, notified when a table is destroyed
    pub surface: &'a mut dyn EditorSurface,
    pub settings: &'a EditorSettings,
}

impl<'a> EditContext<'a> {
    pub fn new(
        document: &'a mut TableDocument,
        geometry: &'a dyn RenderGeometry,
        surface: &'a mut dyn EditorSurface,
        settings: &'a EditorSettings,
    ) -> Self {
        Self {
            document,
            geometry,
            surface,
            settings,
        }
    }

    /// Hit-test tolerance in pixels
    pub fn tolerance(&self) -> f64 {
        self.settings.tolerance()
    }
}

/// Trait for all table editing commands
pub trait TableCommand: std::fmt::Debug {
    /// What the command reports back (affected cells, outcome, ...)
    type Output;

    /// Apply this command. Commands validate their input before touching
    /// the document, so an error leaves it unchanged.
    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<Self::Output>;

    /// Get a display name for this command
    fn display_name(&self) -> &str;
}

/// Placement of a new row or column relative to the compared one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    /// Left of a column, above a row
    Before,
    /// Right of a column, below a row
    After,
}

/// Result of a deletion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// Nothing to delete from
    Unchanged,
    Updated,
    /// Every cell was hit; the whole table was removed
    Destroyed,
}

/// Remove a whole table and notify the editor surface
pub fn destroy_table(ctx: &mut EditContext<'_>, table: NodeId) -> Result<()> {
    ctx.document.expect_kind(table, NodeKind::Table)?;
    ctx.document.remove(table)?;
    ctx.surface.refresh_table_tools();
    ctx.surface.commit();
    tracing::info!("Destroyed table {}", table);
    Ok(())
}

/// Body of a table, or `None` when the table has no rows to edit
pub(crate) fn editable_body(document: &TableDocument, table: NodeId) -> Result<Option<NodeId>> {
    document.expect_kind(table, NodeKind::Table)?;
    Ok(document
        .body(table)
        .filter(|&body| !document.children(body).is_empty()))
}

// =============================================================================
// DestroyTable Command
// =============================================================================

/// Remove a table from the document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DestroyTable {
    pub table_id: NodeId,
}

impl TableCommand for DestroyTable {
    type Output = ();

    fn apply(&self, ctx: &mut EditContext<'_>) -> Result<()> {
        destroy_table(ctx, self.table_id)
    }

    fn display_name(&self) -> &str {
        "Delete Table"
    }
}
