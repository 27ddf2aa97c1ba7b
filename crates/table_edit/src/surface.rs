//! Notifications to the hosting editor

/// The editor hosting a table.
///
/// Only whole-table destruction notifies the surface; other edits leave
/// re-rendering to the host.
pub trait EditorSurface {
    /// Hide or refresh selection and table tooling that pointed at the table
    fn refresh_table_tools(&mut self);

    /// Flush the change to the host document
    fn commit(&mut self);
}

/// Surface that ignores every notification
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSurface;

impl EditorSurface for NoopSurface {
    fn refresh_table_tools(&mut self) {}

    fn commit(&mut self) {}
}
